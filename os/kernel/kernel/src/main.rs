//! # Kernel Entry Point
//!
//! Boots on a static stack, brings up the descriptor tables, the timer and
//! the `int 0x80` gate, proves the syscall path once and then idles.

#![no_std]
#![no_main]
#![allow(unsafe_code)]

mod entry;
mod init;
mod pit;
mod pmm;
mod vga;
mod x86;

use core::fmt::Write;
use kernel_trap::display::{Color, Display, DisplayWriter};
use kernel_trap::platform::Platform;
use log::error;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    x86::X86.disable_interrupts();
    error!("{info}");

    let mut display = vga::steal();
    display.set_color(Color::White, Color::Red);
    // Nothing left to report a formatting failure to.
    writeln!(DisplayWriter(&mut *display), "\nKERNEL PANIC: {info}").ok();
    display.set_color(Color::DEFAULT_FOREGROUND, Color::DEFAULT_BACKGROUND);

    x86::X86.halt()
}

/// The idle loop. Interrupts stay enabled so the timer keeps ticking.
pub fn kernel_main() -> ! {
    loop {
        x86::wait_for_interrupt();
    }
}
