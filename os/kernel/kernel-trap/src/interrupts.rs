//! Generic handling for vectors `32..=255` that no collaborator claimed.

use crate::display::{Color, Display, print_hex8};
use crate::frame::TrapFrame;
use crate::platform::Platform;
use log::debug;

pub const PIC1_COMMAND: u16 = 0x20;
pub const PIC1_DATA: u16 = 0x21;
pub const PIC2_COMMAND: u16 = 0xA0;
pub const PIC2_DATA: u16 = 0xA1;

/// Non-specific end of interrupt.
pub const PIC_EOI: u8 = 0x20;

/// Vector base of the master PIC after remapping.
pub const PIC1_VECTOR_BASE: u8 = 32;
/// Vector base of the slave PIC after remapping.
pub const PIC2_VECTOR_BASE: u8 = 40;
const PIC_VECTOR_END: u8 = 48;

/// Sends end-of-interrupt for a legacy PIC vector. Other vectors are left
/// alone.
pub fn acknowledge<P: Platform + ?Sized>(platform: &P, vector: u8) {
    if !(PIC1_VECTOR_BASE..PIC_VECTOR_END).contains(&vector) {
        return;
    }

    unsafe {
        if vector >= PIC2_VECTOR_BASE {
            platform.write_port(PIC2_COMMAND, PIC_EOI);
        }
        platform.write_port(PIC1_COMMAND, PIC_EOI);
    }
}

/// Reports an unclaimed interrupt and returns to the interrupted code.
#[allow(clippy::cast_possible_truncation)]
pub fn handle_interrupt<D, P>(frame: &TrapFrame, display: &mut D, platform: &P)
where
    D: Display + ?Sized,
    P: Platform + ?Sized,
{
    let vector = frame.vector as u8;
    debug!("unhandled interrupt {vector:#04x}");

    display.set_color(Color::Green, Color::Black);
    display.print_string(b"Interrupt received: ");
    print_hex8(display, vector);
    display.print_char(b'\n');
    display.set_color(Color::DEFAULT_FOREGROUND, Color::DEFAULT_BACKGROUND);

    acknowledge(platform, vector);
}
