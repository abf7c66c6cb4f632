//! Text output used by the diagnostic paths.

use core::fmt;

/// VGA text-mode palette.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

impl Color {
    pub const DEFAULT_FOREGROUND: Self = Self::White;
    pub const DEFAULT_BACKGROUND: Self = Self::Black;
}

/// A character display, such as the VGA text buffer.
pub trait Display {
    fn print_char(&mut self, byte: u8);

    fn print_string(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.print_char(b);
        }
    }

    fn set_color(&mut self, foreground: Color, background: Color);

    /// Blanks the screen and moves the cursor home.
    fn clear(&mut self);
}

impl<D: Display + ?Sized> Display for &mut D {
    fn print_char(&mut self, byte: u8) {
        (**self).print_char(byte);
    }

    fn print_string(&mut self, bytes: &[u8]) {
        (**self).print_string(bytes);
    }

    fn set_color(&mut self, foreground: Color, background: Color) {
        (**self).set_color(foreground, background);
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// `0x` followed by 16 uppercase hex digits.
#[allow(clippy::cast_possible_truncation)]
pub fn print_hex64<D: Display + ?Sized>(display: &mut D, value: u64) {
    display.print_string(b"0x");
    for shift in (0..16).rev() {
        display.print_char(HEX_DIGITS[((value >> (shift * 4)) & 0xF) as usize]);
    }
}

/// `0x` followed by 2 uppercase hex digits.
pub fn print_hex8<D: Display + ?Sized>(display: &mut D, value: u8) {
    display.print_string(b"0x");
    display.print_char(HEX_DIGITS[usize::from(value >> 4)]);
    display.print_char(HEX_DIGITS[usize::from(value & 0xF)]);
}

#[allow(clippy::cast_possible_truncation)]
pub fn print_dec<D: Display + ?Sized>(display: &mut D, mut value: u64) {
    let mut buf = [0u8; 20];
    let mut i = buf.len();
    loop {
        i -= 1;
        buf[i] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    display.print_string(&buf[i..]);
}

/// Decimal with a leading `-` for negative values.
pub fn print_signed<D: Display + ?Sized>(display: &mut D, value: i64) {
    if value < 0 {
        display.print_char(b'-');
    }
    print_dec(display, value.unsigned_abs());
}

/// Adapts a [`Display`] to `core::fmt::Write`.
pub struct DisplayWriter<'a, D: Display + ?Sized>(pub &'a mut D);

impl<D: Display + ?Sized> fmt::Write for DisplayWriter<'_, D> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.print_string(s.as_bytes());
        Ok(())
    }
}
