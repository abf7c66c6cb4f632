//! 80x25 text console.
//!
//! Cells are 16 bits: the character in the low byte, the attribute
//! (background in bits 4..8, foreground in bits 0..4) in the high byte.
//! Where the cells live is up to the [`CellBuffer`]; on hardware that is
//! the VGA memory at `0xB8000`.

use kernel_trap::display::{Color, Display};

pub const WIDTH: usize = 80;
pub const HEIGHT: usize = 25;

/// Shown for bytes outside printable ASCII.
pub const REPLACEMENT: u8 = 0xFE;

/// Storage for `WIDTH * HEIGHT` cells.
pub trait CellBuffer {
    fn write(&mut self, row: usize, column: usize, cell: u16);
    fn read(&self, row: usize, column: usize) -> u16;
}

#[must_use]
pub const fn attribute(foreground: Color, background: Color) -> u8 {
    ((background as u8) << 4) | foreground as u8
}

#[must_use]
pub const fn cell(byte: u8, attribute: u8) -> u16 {
    ((attribute as u16) << 8) | byte as u16
}

/// Cursor, color and wrapping on top of a [`CellBuffer`].
pub struct TextConsole<B> {
    buffer: B,
    row: usize,
    column: usize,
    attribute: u8,
}

impl<B: CellBuffer> TextConsole<B> {
    /// Starts at the top-left corner in the default colors. The buffer is
    /// not cleared.
    #[must_use]
    pub const fn new(buffer: B) -> Self {
        Self {
            buffer,
            row: 0,
            column: 0,
            attribute: attribute(Color::DEFAULT_FOREGROUND, Color::DEFAULT_BACKGROUND),
        }
    }

    /// `(row, column)` of the next character.
    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    #[must_use]
    pub const fn buffer(&self) -> &B {
        &self.buffer
    }

    fn blank_row(&mut self, row: usize) {
        let blank = cell(b' ', self.attribute);
        for column in 0..WIDTH {
            self.buffer.write(row, column, blank);
        }
    }

    fn new_line(&mut self) {
        self.column = 0;
        if self.row + 1 < HEIGHT {
            self.row += 1;
        } else {
            self.scroll();
        }
    }

    fn scroll(&mut self) {
        for row in 1..HEIGHT {
            for column in 0..WIDTH {
                let moved = self.buffer.read(row, column);
                self.buffer.write(row - 1, column, moved);
            }
        }
        self.blank_row(HEIGHT - 1);
    }
}

impl<B: CellBuffer> Display for TextConsole<B> {
    fn print_char(&mut self, byte: u8) {
        match byte {
            b'\n' => self.new_line(),
            b'\r' => self.column = 0,
            byte => {
                if self.column >= WIDTH {
                    self.new_line();
                }
                let byte = if matches!(byte, 0x20..=0x7E) {
                    byte
                } else {
                    REPLACEMENT
                };
                self.buffer
                    .write(self.row, self.column, cell(byte, self.attribute));
                self.column += 1;
            }
        }
    }

    fn set_color(&mut self, foreground: Color, background: Color) {
        self.attribute = attribute(foreground, background);
    }

    fn clear(&mut self) {
        for row in 0..HEIGHT {
            self.blank_row(row);
        }
        self.row = 0;
        self.column = 0;
    }
}
