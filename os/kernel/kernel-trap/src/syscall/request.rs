use crate::frame::TrapFrame;
use stdlib::syscall_abi::{Errno, Sysno};

/// The raw request as found in the trap frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SyscallRequest {
    pub number: u64,
    pub args: [u64; 3],
}

/// A decoded request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Syscall {
    /// `status` is the full signed `rdi`.
    Exit { status: i64 },
    Write { fd: u64, buf: u64, count: u64 },
    Read { fd: u64, buf: u64, count: u64 },
    GetPid,
    Brk { increment: i64 },
}

impl SyscallRequest {
    #[must_use]
    pub const fn new(number: u64, args: [u64; 3]) -> Self {
        Self { number, args }
    }

    #[must_use]
    pub const fn from_frame(frame: &TrapFrame) -> Self {
        Self::new(frame.syscall_number(), frame.syscall_args())
    }

    /// # Errors
    /// [`Errno::InvalidSyscall`] for numbers outside the syscall table.
    #[allow(clippy::cast_possible_wrap)]
    pub fn decode(&self) -> Result<Syscall, Errno> {
        let [a0, a1, a2] = self.args;
        Ok(match Sysno::try_from(self.number)? {
            Sysno::Exit => Syscall::Exit { status: a0 as i64 },
            Sysno::Write => Syscall::Write {
                fd: a0,
                buf: a1,
                count: a2,
            },
            Sysno::Read => Syscall::Read {
                fd: a0,
                buf: a1,
                count: a2,
            },
            Sysno::GetPid => Syscall::GetPid,
            Sysno::Brk => Syscall::Brk {
                increment: a0 as i64,
            },
        })
    }
}

impl Syscall {
    #[must_use]
    pub const fn sysno(&self) -> Sysno {
        match self {
            Self::Exit { .. } => Sysno::Exit,
            Self::Write { .. } => Sysno::Write,
            Self::Read { .. } => Sysno::Read,
            Self::GetPid => Sysno::GetPid,
            Self::Brk { .. } => Sysno::Brk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_argument_slots() {
        let frame = TrapFrame::for_syscall(2, [1, 0xB000, 3]);
        let req = SyscallRequest::from_frame(&frame);
        assert_eq!(
            req.decode(),
            Ok(Syscall::Write {
                fd: 1,
                buf: 0xB000,
                count: 3
            })
        );
    }

    #[test]
    fn brk_increment_is_signed() {
        let req = SyscallRequest::new(5, [(-4096_i64) as u64, 0, 0]);
        assert_eq!(req.decode(), Ok(Syscall::Brk { increment: -4096 }));
    }

    #[test]
    fn exit_status_is_signed() {
        let req = SyscallRequest::new(1, [(-1_i64) as u64, 0, 0]);
        assert_eq!(req.decode(), Ok(Syscall::Exit { status: -1 }));
    }

    #[test]
    fn unknown_number() {
        assert_eq!(
            SyscallRequest::new(255, [0; 3]).decode(),
            Err(Errno::InvalidSyscall)
        );
        assert_eq!(
            SyscallRequest::new(0, [0; 3]).decode(),
            Err(Errno::InvalidSyscall)
        );
    }
}
