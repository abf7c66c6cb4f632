//! # Global Descriptor Table
//!
//! Long mode ignores segment base and limit for code and data, but the CPU
//! still takes the code-segment bitness (`L`) and the privilege level of
//! every loaded selector from this table, and every gate in the IDT names a
//! code selector here.
//!
//! Index | Selector | Meaning
//! ------|----------|--------
//! 0     | 0x00     | Null (mandatory, all zero)
//! 1     | 0x08     | Kernel code (64-bit, DPL=0; [`KERNEL_CODE_SELECTOR`])
//! 2     | 0x10     | Kernel data (DPL=0; [`KERNEL_DATA_SELECTOR`])
//!
//! The table is built once, validated entry by entry, and then handed to the
//! platform for `lgdt` and the segment-register reload. See
//! [`crate::bringup`].

pub mod descriptor;
pub mod selectors;

use crate::error::DescriptorError;
use crate::pointer::DescriptorTablePointer;
use crate::privilege::Ring;
use core::ops::Index;
use descriptor::{AccessByte, MAX_LIMIT, SegmentDescriptor, SegmentFlags};
use selectors::SegmentSelector;

pub const GDT_ENTRIES: usize = 3;

pub const KERNEL_CODE_INDEX: u16 = 1;
pub const KERNEL_DATA_INDEX: u16 = 2;

pub const KERNEL_CODE_SELECTOR: SegmentSelector =
    SegmentSelector::gdt(KERNEL_CODE_INDEX, Ring::Ring0);
pub const KERNEL_DATA_SELECTOR: SegmentSelector =
    SegmentSelector::gdt(KERNEL_DATA_INDEX, Ring::Ring0);

/// Encoded selector values, as loaded into `CS`/`DS` and stored in gates.
pub const KERNEL_CS: u16 = KERNEL_CODE_SELECTOR.into_bits();
pub const KERNEL_DS: u16 = KERNEL_DATA_SELECTOR.into_bits();

const _: () = {
    assert!(KERNEL_CS == 0x08);
    assert!(KERNEL_DS == 0x10);
    assert!(size_of::<Gdt>() == GDT_ENTRIES * 8);
};

/// Flat 4 GiB, page granular, 64-bit.
const KERNEL_CODE_FLAGS: SegmentFlags = SegmentFlags::new()
    .with_granularity(true)
    .with_long_mode(true);
const KERNEL_DATA_FLAGS: SegmentFlags = SegmentFlags::new().with_granularity(true);

#[repr(C, align(8))]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Gdt {
    entries: [SegmentDescriptor; GDT_ENTRIES],
}

impl Gdt {
    /// Builds the null, kernel code and kernel data descriptors.
    ///
    /// # Errors
    /// Fails if any descriptor does not pass validation. With the fixed
    /// layout above this cannot happen, but the check runs before every load.
    pub const fn build() -> Result<Self, DescriptorError> {
        let kcode = match SegmentDescriptor::new(
            0,
            MAX_LIMIT,
            AccessByte::code(Ring::Ring0),
            KERNEL_CODE_FLAGS,
        ) {
            Ok(d) => d,
            Err(e) => return Err(e),
        };
        let kdata = match SegmentDescriptor::new(
            0,
            MAX_LIMIT,
            AccessByte::data(Ring::Ring0),
            KERNEL_DATA_FLAGS,
        ) {
            Ok(d) => d,
            Err(e) => return Err(e),
        };

        Ok(Self {
            entries: [SegmentDescriptor::NULL, kcode, kdata],
        })
    }

    #[must_use]
    pub const fn entries(&self) -> &[SegmentDescriptor; GDT_ENTRIES] {
        &self.entries
    }

    /// Looks up the descriptor a selector refers to.
    #[must_use]
    pub fn descriptor(&self, selector: SegmentSelector) -> Option<&SegmentDescriptor> {
        self.entries.get(selector.index() as usize)
    }

    /// The `lgdt` operand for this table at its current address.
    #[must_use]
    pub fn pointer(&self) -> DescriptorTablePointer {
        DescriptorTablePointer::for_table(&raw const *self)
    }

    /// The raw table image, 8 bytes per entry.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; GDT_ENTRIES * 8] {
        let mut out = [0u8; GDT_ENTRIES * 8];
        for (chunk, d) in out.chunks_exact_mut(8).zip(self.entries.iter()) {
            chunk.copy_from_slice(d.as_bytes());
        }
        out
    }
}

impl Index<usize> for Gdt {
    type Output = SegmentDescriptor;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}
