//! Caller-side `int 0x80` wrappers.
//!
//! The gate is callable from ring 3 and ring 0 alike. Every general-purpose
//! register except `rax` is restored by the kernel before `iretq`.

use crate::syscall_abi::{Errno, Sysno, decode_result};

#[inline(always)]
#[allow(clippy::inline_always)]
unsafe fn int80(sysno: Sysno, a0: u64, a1: u64, a2: u64) -> i64 {
    let ret: i64;
    unsafe {
        core::arch::asm!(
            "int 0x80",
            inlateout("rax") sysno as u64 => ret,
            in("rdi") a0,
            in("rsi") a1,
            in("rdx") a2,
            options(nostack)
        );
    }
    ret
}

/// Writes `buf` to `fd`, returning the number of bytes written.
#[inline]
pub fn write(fd: u64, buf: &[u8]) -> Result<u64, Errno> {
    let ret = unsafe { int80(Sysno::Write, fd, buf.as_ptr() as u64, buf.len() as u64) };
    decode_result(ret)
}

/// Reads from `fd` into `buf`.
#[inline]
pub fn read(fd: u64, buf: &mut [u8]) -> Result<u64, Errno> {
    let ret = unsafe { int80(Sysno::Read, fd, buf.as_mut_ptr() as u64, buf.len() as u64) };
    decode_result(ret)
}

#[inline]
pub fn getpid() -> Result<u64, Errno> {
    let ret = unsafe { int80(Sysno::GetPid, 0, 0, 0) };
    decode_result(ret)
}

/// Moves the program break by `increment` and returns the new break.
///
/// An increment of zero queries the current break.
#[inline]
#[allow(clippy::cast_sign_loss)]
pub fn brk(increment: i64) -> Result<u64, Errno> {
    let ret = unsafe { int80(Sysno::Brk, increment as u64, 0, 0) };
    decode_result(ret)
}

/// Terminates the calling process.
#[inline]
pub fn exit(status: i64) -> ! {
    unsafe {
        core::arch::asm!(
            "int 0x80",
            in("rax") Sysno::Exit as u64,
            in("rdi") status,
            options(noreturn)
        );
    }
}
