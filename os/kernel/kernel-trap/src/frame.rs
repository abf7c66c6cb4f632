//! # Trap frame
//!
//! The single register snapshot every entry stub builds, for exceptions,
//! hardware interrupts and syscalls alike. Its field order is the stack
//! image left behind by the stub and the CPU:
//!
//! ```text
//!   high  ss, rsp, rflags, cs, rip   pushed by the CPU
//!         error_code                 pushed by the CPU, or 0 by the stub
//!         vector                     pushed by the stub
//!         rax rbx rcx rdx rbp rsi rdi r8 .. r15   pushed by the stub
//!   low   <- frame pointer handed to Rust (points at r15)
//! ```
//!
//! The stub restores the general-purpose registers in reverse push order,
//! drops `vector` and `error_code`, and returns with `iretq`. Reordering a
//! field here silently swaps registers in the resumed program.

use crate::privilege::Ring;
use core::mem::offset_of;

/// General-purpose registers saved by the stub.
pub const SAVED_GPRS: usize = 15;

/// Bytes in a [`TrapFrame`].
pub const TRAP_FRAME_SIZE: usize = size_of::<TrapFrame>();

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rbp: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,

    pub vector: u64,
    pub error_code: u64,

    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

const _: () = {
    assert!(TRAP_FRAME_SIZE == 22 * 8);
    // Keeps `rsp` 16-byte aligned at the `call` into Rust.
    assert!(TRAP_FRAME_SIZE % 16 == 0);
    assert!(offset_of!(TrapFrame, r15) == 0);
    assert!(offset_of!(TrapFrame, r8) == 7 * 8);
    assert!(offset_of!(TrapFrame, rdi) == 8 * 8);
    assert!(offset_of!(TrapFrame, rax) == (SAVED_GPRS - 1) * 8);
    assert!(offset_of!(TrapFrame, vector) == SAVED_GPRS * 8);
    assert!(offset_of!(TrapFrame, error_code) == (SAVED_GPRS + 1) * 8);
    assert!(offset_of!(TrapFrame, rip) == (SAVED_GPRS + 2) * 8);
    assert!(offset_of!(TrapFrame, ss) == TRAP_FRAME_SIZE - 8);
};

impl TrapFrame {
    /// A kernel-mode frame carrying a syscall request in `rax`, `rdi`,
    /// `rsi` and `rdx`.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn for_syscall(number: u64, args: [u64; 3]) -> Self {
        Self {
            r15: 0,
            r14: 0,
            r13: 0,
            r12: 0,
            r11: 0,
            r10: 0,
            r9: 0,
            r8: 0,
            rdi: args[0],
            rsi: args[1],
            rdx: args[2],
            rbp: 0,
            rcx: 0,
            rbx: 0,
            rax: number,
            vector: stdlib::syscall_abi::SYSCALL_VECTOR as u64,
            error_code: 0,
            rip: 0,
            cs: crate::gdt::KERNEL_CS as u64,
            rflags: 0,
            rsp: 0,
            ss: crate::gdt::KERNEL_DS as u64,
        }
    }

    /// Privilege level of the interrupted code.
    #[must_use]
    pub const fn privilege(&self) -> Ring {
        Ring::of_selector(self.cs)
    }

    #[must_use]
    pub const fn came_from_user(&self) -> bool {
        self.privilege().is_user()
    }

    #[must_use]
    pub const fn syscall_number(&self) -> u64 {
        self.rax
    }

    /// The three argument slots, in ABI order.
    #[must_use]
    pub const fn syscall_args(&self) -> [u64; 3] {
        [self.rdi, self.rsi, self.rdx]
    }

    /// Stores a syscall result where the caller reads its return value.
    #[allow(clippy::cast_sign_loss)]
    pub const fn set_syscall_result(&mut self, result: i64) {
        self.rax = result as u64;
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn syscall_result(&self) -> i64 {
        self.rax as i64
    }

    /// General-purpose registers in diagnostic order, with the interrupted
    /// stack pointer in place of the stub's own.
    #[must_use]
    pub const fn registers(&self) -> [(&'static str, u64); 16] {
        [
            ("RAX", self.rax),
            ("RBX", self.rbx),
            ("RCX", self.rcx),
            ("RDX", self.rdx),
            ("RSI", self.rsi),
            ("RDI", self.rdi),
            ("RBP", self.rbp),
            ("RSP", self.rsp),
            ("R8", self.r8),
            ("R9", self.r9),
            ("R10", self.r10),
            ("R11", self.r11),
            ("R12", self.r12),
            ("R13", self.r13),
            ("R14", self.r14),
            ("R15", self.r15),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays the stub's push sequence onto a fake stack and reads it back
    /// through the frame layout.
    #[test]
    fn push_order_matches_layout() {
        // CPU frame, then error code and vector, then the GPR pushes.
        let mut stack: Vec<u64> = vec![0x10, 0x7000, 0x202, 0x08, 0xdead, 0x0e00, 14];
        let pushes = [
            ("rax", 1u64),
            ("rbx", 2),
            ("rcx", 3),
            ("rdx", 4),
            ("rbp", 5),
            ("rsi", 6),
            ("rdi", 7),
            ("r8", 8),
            ("r9", 9),
            ("r10", 10),
            ("r11", 11),
            ("r12", 12),
            ("r13", 13),
            ("r14", 14),
            ("r15", 15),
        ];
        stack.extend(pushes.iter().map(|&(_, v)| v));
        stack.reverse();

        let frame = unsafe { stack.as_ptr().cast::<TrapFrame>().read() };
        assert_eq!(frame.rax, 1);
        assert_eq!(frame.rbx, 2);
        assert_eq!(frame.rdi, 7);
        assert_eq!(frame.r8, 8);
        assert_eq!(frame.r15, 15);
        assert_eq!(frame.vector, 14);
        assert_eq!(frame.error_code, 0x0e00);
        assert_eq!(frame.rip, 0xdead);
        assert_eq!(frame.cs, 0x08);
        assert_eq!(frame.rflags, 0x202);
        assert_eq!(frame.rsp, 0x7000);
        assert_eq!(frame.ss, 0x10);
    }

    #[test]
    fn syscall_slots() {
        let mut f = TrapFrame::for_syscall(2, [1, 0x1000, 5]);
        assert_eq!(f.syscall_number(), 2);
        assert_eq!(f.syscall_args(), [1, 0x1000, 5]);
        assert!(!f.came_from_user());

        f.set_syscall_result(-3);
        assert_eq!(f.rax, u64::MAX - 2);
        assert_eq!(f.syscall_result(), -3);
        assert_eq!(f.syscall_args(), [1, 0x1000, 5]);
    }

    #[test]
    fn user_mode_detection() {
        let f = TrapFrame {
            cs: 0x1b,
            ..TrapFrame::default()
        };
        assert!(f.came_from_user());
        assert_eq!(f.privilege(), Ring::Ring3);
    }
}
