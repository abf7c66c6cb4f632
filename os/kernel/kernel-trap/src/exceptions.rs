//! # CPU exceptions
//!
//! Vectors `0..32` are reserved by the architecture. Every one of them is
//! fatal here: there is no fault containment or process isolation to
//! recover into, so a divide error, a general-protection fault and a page
//! fault all end in the same diagnostic screen followed by a halt.

use crate::display::{Color, Display, print_hex64};
use crate::frame::TrapFrame;
use crate::platform::Platform;
use log::error;

pub const EXCEPTION_COUNT: usize = 32;

pub const UNKNOWN_EXCEPTION: &str = "Unknown Exception";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ExceptionDescriptor {
    pub vector: u8,
    /// `None` for vectors the architecture reserves.
    pub name: Option<&'static str>,
    /// Whether the CPU pushes an error code for this vector.
    pub has_error_code: bool,
}

impl ExceptionDescriptor {
    const fn named(vector: u8, name: &'static str, has_error_code: bool) -> Self {
        Self {
            vector,
            name: Some(name),
            has_error_code,
        }
    }

    const fn reserved(vector: u8, has_error_code: bool) -> Self {
        Self {
            vector,
            name: None,
            has_error_code,
        }
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self.name {
            Some(name) => name,
            None => UNKNOWN_EXCEPTION,
        }
    }
}

#[rustfmt::skip]
pub const EXCEPTIONS: [ExceptionDescriptor; EXCEPTION_COUNT] = [
    ExceptionDescriptor::named(0, "Division by Zero", false),
    ExceptionDescriptor::named(1, "Debug", false),
    ExceptionDescriptor::named(2, "Non-Maskable Interrupt", false),
    ExceptionDescriptor::named(3, "Breakpoint", false),
    ExceptionDescriptor::named(4, "Overflow", false),
    ExceptionDescriptor::named(5, "Bound Range Exceeded", false),
    ExceptionDescriptor::named(6, "Invalid Opcode", false),
    ExceptionDescriptor::named(7, "Device Not Available", false),
    ExceptionDescriptor::named(8, "Double Fault", true),
    ExceptionDescriptor::named(9, "Coprocessor Segment Overrun", false),
    ExceptionDescriptor::named(10, "Invalid TSS", true),
    ExceptionDescriptor::named(11, "Segment Not Present", true),
    ExceptionDescriptor::named(12, "Stack Segment Fault", true),
    ExceptionDescriptor::named(13, "General Protection Fault", true),
    ExceptionDescriptor::named(14, "Page Fault", true),
    ExceptionDescriptor::reserved(15, false),
    ExceptionDescriptor::named(16, "x87 Floating Point Exception", false),
    ExceptionDescriptor::named(17, "Alignment Check", true),
    ExceptionDescriptor::named(18, "Machine Check", false),
    ExceptionDescriptor::named(19, "SIMD Floating Point Exception", false),
    ExceptionDescriptor::named(20, "Virtualization Exception", false),
    // Control protection
    ExceptionDescriptor::reserved(21, true),
    ExceptionDescriptor::reserved(22, false),
    ExceptionDescriptor::reserved(23, false),
    ExceptionDescriptor::reserved(24, false),
    ExceptionDescriptor::reserved(25, false),
    ExceptionDescriptor::reserved(26, false),
    ExceptionDescriptor::reserved(27, false),
    ExceptionDescriptor::reserved(28, false),
    // VMM communication
    ExceptionDescriptor::reserved(29, true),
    // Security
    ExceptionDescriptor::reserved(30, true),
    ExceptionDescriptor::reserved(31, false),
];

/// Bit `n` is set when the CPU pushes an error code for vector `n`.
///
/// The entry stubs push a zero in its place for every other vector.
pub const ERROR_CODE_VECTORS: u32 = {
    let mut mask = 0u32;
    let mut i = 0;
    while i < EXCEPTION_COUNT {
        if EXCEPTIONS[i].has_error_code {
            mask |= 1 << i;
        }
        i += 1;
    }
    mask
};

const _: () = {
    let mut i = 0;
    while i < EXCEPTION_COUNT {
        assert!(EXCEPTIONS[i].vector as usize == i);
        i += 1;
    }
};

#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn descriptor(vector: u64) -> Option<&'static ExceptionDescriptor> {
    if vector < EXCEPTION_COUNT as u64 {
        Some(&EXCEPTIONS[vector as usize])
    } else {
        None
    }
}

/// The name shown for `vector`; reserved and out-of-range vectors are
/// "Unknown Exception".
#[must_use]
pub const fn exception_name(vector: u64) -> &'static str {
    match descriptor(vector) {
        Some(d) => d.display_name(),
        None => UNKNOWN_EXCEPTION,
    }
}

#[must_use]
pub const fn has_error_code(vector: u8) -> bool {
    (vector as usize) < EXCEPTION_COUNT && ERROR_CODE_VECTORS & (1 << vector) != 0
}

fn label<D: Display + ?Sized>(display: &mut D, text: &[u8], value: u64) {
    display.set_color(Color::Yellow, Color::Black);
    display.print_string(text);
    display.set_color(Color::White, Color::Black);
    print_hex64(display, value);
    display.print_char(b'\n');
}

/// Draws the fatal-exception screen for `frame`.
pub fn render_exception<D: Display + ?Sized>(frame: &TrapFrame, display: &mut D) {
    display.clear();

    display.set_color(Color::White, Color::Red);
    display.print_string(b"=== KERNEL PANIC ===\n\n");

    display.set_color(Color::Yellow, Color::Black);
    display.print_string(b"Exception: ");
    display.set_color(Color::Red, Color::Black);
    display.print_string(exception_name(frame.vector).as_bytes());
    display.print_string(b" (");
    print_hex64(display, frame.vector);
    display.print_string(b")\n");

    label(display, b"Error Code: ", frame.error_code);
    label(display, b"Instruction Pointer: ", frame.rip);
    label(display, b"CPU Flags: ", frame.rflags);
    label(display, b"Code Segment: ", frame.cs);
    let mode: &[u8] = if frame.came_from_user() {
        b"user (ring 3)\n"
    } else {
        b"kernel (ring 0)\n"
    };
    display.set_color(Color::Yellow, Color::Black);
    display.print_string(b"Mode: ");
    display.set_color(Color::White, Color::Black);
    display.print_string(mode);

    display.set_color(Color::Cyan, Color::Black);
    display.print_string(b"\n=== CPU REGISTERS ===\n");
    display.set_color(Color::White, Color::Black);
    for pair in frame.registers().chunks_exact(2) {
        for (i, &(name, value)) in pair.iter().enumerate() {
            if i > 0 {
                display.print_string(b"  ");
            }
            display.print_string(name.as_bytes());
            display.print_string(b": ");
            print_hex64(display, value);
        }
        display.print_char(b'\n');
    }

    display.set_color(Color::Red, Color::Black);
    display.print_string(b"\nSystem halted. Press reset to restart.\n");
}

/// Reports a CPU exception and stops the machine.
pub fn handle_exception<D, P>(frame: &TrapFrame, display: &mut D, platform: &P) -> !
where
    D: Display + ?Sized,
    P: Platform + ?Sized,
{
    error!(
        "{} ({:#x}) error={:#x} rip={:#018x} cs={:#x} rflags={:#x}",
        exception_name(frame.vector),
        frame.vector,
        frame.error_code,
        frame.rip,
        frame.cs,
        frame.rflags
    );
    render_exception(frame, display);
    platform.disable_interrupts();
    platform.halt()
}
