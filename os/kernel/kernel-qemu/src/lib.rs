//! # QEMU debug console
//!
//! Kernel-to-host text output through QEMU's debug console port `0x402`.
//! Run the guest with `-debugcon stdio` (or `-debugcon file:debug.log`) to
//! see it. On real hardware the port is normally unused and writes vanish.
//!
//! * [`qemu_trace!`] formats straight to the port without allocating and
//!   works before any logger exists, which makes it usable on fatal paths.
//! * [`QemuLogger`] plugs the same sink into the `log` facade.
//!
//! Without the `enabled` feature both compile to no-ops.
//!
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::{LevelFilter, info};
//!
//! QemuLogger::new(LevelFilter::Debug).init().ok();
//! info!("descriptor tables loaded");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::QemuLogger;

/// QEMU's debug console I/O port.
pub const QEMU_DEBUG_PORT: u16 = 0x402;

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod qemu_fmt {
    use super::QEMU_DEBUG_PORT;
    use core::fmt::{self, Write};

    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") QEMU_DEBUG_PORT,
                in("al") c,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            s.bytes().for_each(dbg_putc);
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best-effort; the sink itself cannot fail.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub const fn dbg_putc(_: u8) {}

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(_: fmt::Arguments) {}
}

#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
