//! Syscall numbers, file descriptors and error codes.
//!
//! Arguments travel in `rdi`, `rsi`, `rdx`; the number goes in `rax` and the
//! result comes back in `rax` as a signed 64-bit value. Non-negative results
//! are payloads, negative results are one of the [`Errno`] codes.

/// The software interrupt vector used for syscalls.
pub const SYSCALL_VECTOR: u8 = 0x80;

pub const STDIN: u64 = 0;
pub const STDOUT: u64 = 1;
pub const STDERR: u64 = 2;

#[repr(u64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sysno {
    /// Terminate the calling process. Never returns.
    Exit = 1,
    /// Write `count` bytes from `buf` to `fd`.
    Write = 2,
    /// Read from `fd`. Not implemented.
    Read = 3,
    /// Return the calling process id.
    GetPid = 4,
    /// Move the program break by a signed increment.
    Brk = 5,
}

impl Sysno {
    /// Every implemented call, in number order.
    pub const ALL: [Self; 5] = [Self::Exit, Self::Write, Self::Read, Self::GetPid, Self::Brk];

    #[must_use]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            1 => Some(Self::Exit),
            2 => Some(Self::Write),
            3 => Some(Self::Read),
            4 => Some(Self::GetPid),
            5 => Some(Self::Brk),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::Write => "write",
            Self::Read => "read",
            Self::GetPid => "getpid",
            Self::Brk => "brk",
        }
    }
}

impl TryFrom<u64> for Sysno {
    type Error = Errno;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_raw(value).ok_or(Errno::InvalidSyscall)
    }
}

/// Errors a syscall can report to its caller.
#[repr(i64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Errno {
    #[error("invalid syscall")]
    InvalidSyscall = -1,
    #[error("invalid file descriptor")]
    InvalidFd = -2,
    #[error("invalid buffer")]
    InvalidBuffer = -3,
    #[error("invalid count")]
    InvalidCount = -4,
    #[error("out of memory")]
    NoMemory = -5,
    #[error("permission denied")]
    Permission = -6,
    #[error("not implemented")]
    NotImplemented = -99,
}

impl Errno {
    /// The negative value placed into the result register.
    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Self::InvalidSyscall),
            -2 => Some(Self::InvalidFd),
            -3 => Some(Self::InvalidBuffer),
            -4 => Some(Self::InvalidCount),
            -5 => Some(Self::NoMemory),
            -6 => Some(Self::Permission),
            -99 => Some(Self::NotImplemented),
            _ => None,
        }
    }
}

/// Encodes a handler outcome into the raw result register value.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn encode_result(result: Result<u64, Errno>) -> i64 {
    match result {
        Ok(value) => value as i64,
        Err(e) => e.code(),
    }
}

/// Splits a raw result register value back into payload or error.
///
/// Negative values that are not a known [`Errno`] are reported as
/// [`Errno::InvalidSyscall`].
#[allow(clippy::cast_sign_loss)]
pub const fn decode_result(raw: i64) -> Result<u64, Errno> {
    if raw >= 0 {
        Ok(raw as u64)
    } else {
        match Errno::from_code(raw) {
            Some(e) => Err(e),
            None => Err(Errno::InvalidSyscall),
        }
    }
}
