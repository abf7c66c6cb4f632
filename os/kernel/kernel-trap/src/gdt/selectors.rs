//! Segment selectors.
//!
//! ```text
//!  15            3 2  1  0
//! +----------------+--+----+
//! |   Index[12:0]  |TI| RPL|
//! +----------------+--+----+
//! ```

use crate::privilege::Ring;
use bitfield_struct::bitfield;

/// Which descriptor table a selector addresses. Only the GDT is used.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Table {
    Gdt = 0,
    Ldt = 1,
}

impl Table {
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        if bits == 0 { Self::Gdt } else { Self::Ldt }
    }

    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[bitfield(u16)]
#[derive(Eq, PartialEq)]
pub struct SegmentSelector {
    #[bits(2)]
    pub rpl: Ring,
    #[bits(1)]
    pub table: Table,
    #[bits(13)]
    pub index: u16,
}

impl SegmentSelector {
    /// A GDT selector for `index` requested at `rpl`.
    #[inline]
    #[must_use]
    pub const fn gdt(index: u16, rpl: Ring) -> Self {
        Self::new()
            .with_index(index)
            .with_table(Table::Gdt)
            .with_rpl(rpl)
    }

    /// Byte offset of the referenced descriptor within its table.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.index() as usize * 8
    }
}
