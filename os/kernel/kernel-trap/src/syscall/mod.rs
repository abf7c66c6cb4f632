//! # Syscall dispatcher
//!
//! Services `int 0x80`. The caller puts the number in `rax` and up to three
//! arguments in `rdi`, `rsi` and `rdx`; the result replaces `rax` in the
//! trap frame so the caller sees it as an ordinary return value after
//! `iretq`. Every call runs to completion: decode, execute exactly one
//! operation, store the result (or halt, for `exit`).
//!
//! | no | name   | args               | result                        |
//! |----|--------|--------------------|-------------------------------|
//! | 1  | exit   | status             | does not return               |
//! | 2  | write  | fd, buf, count     | bytes written                 |
//! | 3  | read   | fd, buf, count     | always "not implemented"      |
//! | 4  | getpid | -                  | constant pid                  |
//! | 5  | brk    | signed increment   | new break                     |

pub mod process;
mod request;

use crate::display::{Color, Display, print_signed};
use crate::frame::TrapFrame;
use crate::platform::{PageAllocator, Platform};
use log::{info, trace, warn};
use stdlib::syscall_abi::{Errno, STDERR, STDOUT, encode_result};

pub use process::{ProcessConfig, ProcessState};
pub use request::{Syscall, SyscallRequest};

/// Collaborators a syscall may touch.
///
/// Borrowed for a single dispatch. The entry path builds it from the locked
/// console and frame allocator, tests from recording doubles.
pub struct SyscallEnv<'a> {
    /// Target of `write` and of the `exit` banner.
    pub display: &'a mut dyn Display,
    /// Only used to halt after `exit`.
    pub platform: &'a dyn Platform,
    /// Backs the heap frames `brk` reserves and releases.
    pub pages: &'a mut dyn PageAllocator,
}

/// Executes syscalls on behalf of the single user process.
///
/// Owns the [`ProcessState`]; the entry stub holds it behind a lock and
/// calls [`dispatch`](Self::dispatch) with the saved [`TrapFrame`]. Calls
/// are serialized, one at a time, with interrupts masked by the gate.
pub struct SyscallDispatcher {
    process: ProcessState,
}

impl SyscallDispatcher {
    #[must_use]
    pub const fn new(config: ProcessConfig) -> Self {
        Self {
            process: ProcessState::new(config),
        }
    }

    #[must_use]
    pub const fn process(&self) -> &ProcessState {
        &self.process
    }

    /// Services the request held in `frame` and stores the result in its
    /// `rax` slot. Nothing else in the frame changes.
    pub fn dispatch(&mut self, frame: &mut TrapFrame, env: &mut SyscallEnv<'_>) {
        let result = self.execute(SyscallRequest::from_frame(frame), env);
        frame.set_syscall_result(result);
    }

    /// Services `request` and returns the raw result value.
    pub fn execute(&mut self, request: SyscallRequest, env: &mut SyscallEnv<'_>) -> i64 {
        let result = match request.decode() {
            Ok(call) => {
                trace!("{}{:x?}", call.sysno().name(), request.args);
                self.run(call, env)
            }
            Err(e) => {
                warn!("unknown syscall number {:#x}", request.number);
                Err(e)
            }
        };
        encode_result(result)
    }

    fn run(&mut self, call: Syscall, env: &mut SyscallEnv<'_>) -> Result<u64, Errno> {
        match call {
            Syscall::Exit { status } => sys_exit(status, env),
            Syscall::Write { fd, buf, count } => sys_write(&mut *env.display, fd, buf, count),
            Syscall::Read { .. } => Err(Errno::NotImplemented),
            Syscall::GetPid => Ok(self.process.pid()),
            Syscall::Brk { increment } => self.process.brk(increment, &mut *env.pages),
        }
    }
}

/// Forwards `count` bytes at `buf` to the display.
///
/// Checked in order: null buffer, empty write, descriptor, count range,
/// address wrap-around.
fn sys_write(display: &mut dyn Display, fd: u64, buf: u64, count: u64) -> Result<u64, Errno> {
    if buf == 0 {
        return Err(Errno::InvalidBuffer);
    }
    if count == 0 {
        return Ok(0);
    }
    if fd != STDOUT && fd != STDERR {
        return Err(Errno::InvalidFd);
    }
    let len = usize::try_from(count)
        .ok()
        .filter(|&len| isize::try_from(len).is_ok())
        .ok_or(Errno::InvalidCount)?;
    if buf.checked_add(count).is_none() {
        return Err(Errno::InvalidBuffer);
    }

    // SAFETY: without address-space isolation every mapped address is
    // readable from ring 0; the range is non-null and does not wrap.
    let bytes = unsafe { core::slice::from_raw_parts(buf as *const u8, len) };
    display.print_string(bytes);
    Ok(count)
}

fn sys_exit(status: i64, env: &mut SyscallEnv<'_>) -> ! {
    info!("process exited with status {status}");

    let display = &mut *env.display;
    display.set_color(Color::Yellow, Color::Black);
    display.print_string(b"\nProcess exited with status: ");
    print_signed(display, status);
    let outcome: &[u8] = if status == 0 {
        b" (success)\n"
    } else {
        b" (error)\n"
    };
    display.print_string(outcome);
    display.set_color(Color::White, Color::Black);
    display.print_string(b"System halted.\n");

    env.platform.halt()
}
