use crate::syscall::write;
use crate::syscall_abi::STDOUT;
use core::fmt::{self, Write};

/// Formatting sink that forwards to `write(STDOUT, ..)`.
pub struct SyscallSink;

impl Write for SyscallSink {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if s.is_empty() {
            return Ok(());
        }
        write(STDOUT, s.as_bytes()).map(|_| ()).map_err(|_| fmt::Error)
    }
}

#[doc(hidden)]
#[inline(always)]
#[allow(clippy::inline_always)]
pub fn syscall_write(args: fmt::Arguments) {
    // Best-effort; a rejected write has nowhere else to go.
    fmt::write(&mut SyscallSink, args).ok();
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {{
        $crate::stdlib::fmt::syscall_write(core::format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! println {
    () => {{
        $crate::print!("\n");
    }};
    ($($arg:tt)*) => {{
        $crate::stdlib::fmt::syscall_write(core::format_args!($($arg)*));
        $crate::print!("\n");
    }};
}
