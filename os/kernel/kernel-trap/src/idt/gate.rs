//! 16-byte interrupt and trap gates.
//!
//! ```text
//!  byte  0..2       2..4       4     5          6..8        8..12       12..16
//!      +----------+----------+-----+----------+-----------+-----------+----------+
//!      | off_lo   | selector | ist | type/attr| off_mid   | off_hi    | reserved |
//!      +----------+----------+-----+----------+-----------+-----------+----------+
//! ```

use crate::error::DescriptorError;
use crate::gdt::selectors::SegmentSelector;
use crate::privilege::Ring;
use bitfield_struct::bitfield;

/// Highest interrupt-stack-table slot. 0 means "no stack switch".
pub const MAX_IST: u8 = 7;

/// The 64-bit gate types. The other encodings are invalid in long mode.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum GateType {
    /// Clears `IF` on entry.
    Interrupt = 0xE,
    /// Leaves `IF` untouched.
    Trap = 0xF,
}

impl GateType {
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        if bits == Self::Trap as u8 {
            Self::Trap
        } else {
            Self::Interrupt
        }
    }

    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// The type/attribute byte: `| P | DPL(2) | 0 | Type(4) |`.
#[bitfield(u8)]
#[derive(Eq, PartialEq)]
pub struct GateAttr {
    #[bits(4)]
    pub gate_type: GateType,
    /// Must stay clear for gates.
    pub code_or_data: bool,
    /// Minimum privilege allowed to raise the vector with `int n`.
    #[bits(2)]
    pub dpl: Ring,
    pub present: bool,
}

impl GateAttr {
    /// A present interrupt gate callable from `dpl` and below.
    #[must_use]
    pub const fn interrupt(dpl: Ring) -> Self {
        Self::new()
            .with_gate_type(GateType::Interrupt)
            .with_dpl(dpl)
            .with_present(true)
    }

    /// A present trap gate callable from `dpl` and below.
    #[must_use]
    pub const fn trap(dpl: Ring) -> Self {
        Self::new()
            .with_gate_type(GateType::Trap)
            .with_dpl(dpl)
            .with_present(true)
    }
}

/// Whether bits 63..48 are a sign extension of bit 47.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub const fn is_canonical(addr: u64) -> bool {
    (((addr as i64) << 16) >> 16) as u64 == addr
}

/// One IDT entry in its hardware layout.
///
/// The handler offset is split over three fields and joined again by
/// [`handler`](Self::handler). `selector` must name a ring 0 code segment;
/// the CPU loads it into `CS` on delivery. A descriptor built with
/// [`new`](Self::new) is always present, canonical and non-null, so only
/// [`MISSING`](Self::MISSING) describes an empty slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct GateDescriptor([u8; 16]);

const _: () = assert!(size_of::<GateDescriptor>() == 16);

impl GateDescriptor {
    /// A non-present gate. Raising its vector faults with `#NP`.
    pub const MISSING: Self = Self([0; 16]);

    /// # Errors
    /// Rejects a null or non-canonical handler, an IST slot above 7, a
    /// non-present attribute and an attribute with the code/data bit set.
    pub const fn new(
        handler: u64,
        selector: SegmentSelector,
        ist: u8,
        attr: GateAttr,
    ) -> Result<Self, DescriptorError> {
        if handler == 0 {
            return Err(DescriptorError::NullHandler);
        }
        if !is_canonical(handler) {
            return Err(DescriptorError::NonCanonicalHandler(handler));
        }
        if ist > MAX_IST {
            return Err(DescriptorError::IstOutOfRange(ist));
        }
        if !attr.present() {
            return Err(DescriptorError::NotPresent);
        }
        if attr.code_or_data() {
            return Err(DescriptorError::NotAGate);
        }

        let h = handler.to_le_bytes();
        let s = selector.into_bits().to_le_bytes();
        Ok(Self([
            h[0],
            h[1],
            s[0],
            s[1],
            ist,
            attr.into_bits(),
            h[2],
            h[3],
            h[4],
            h[5],
            h[6],
            h[7],
            0,
            0,
            0,
            0,
        ]))
    }

    /// Joins offset bytes 0..2, 6..8 and 8..12.
    #[must_use]
    pub const fn handler(&self) -> u64 {
        let b = &self.0;
        u64::from_le_bytes([b[0], b[1], b[6], b[7], b[8], b[9], b[10], b[11]])
    }

    #[must_use]
    pub const fn selector(&self) -> SegmentSelector {
        SegmentSelector::from_bits(u16::from_le_bytes([self.0[2], self.0[3]]))
    }

    /// Interrupt stack table slot, 0 when the current stack is kept.
    #[must_use]
    pub const fn ist(&self) -> u8 {
        self.0[4]
    }

    #[must_use]
    pub const fn attr(&self) -> GateAttr {
        GateAttr::from_bits(self.0[5])
    }

    #[must_use]
    pub const fn dpl(&self) -> Ring {
        self.attr().dpl()
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.attr().present()
    }

    /// Bytes 12..16, which must read as zero.
    #[must_use]
    pub const fn reserved(&self) -> u32 {
        u32::from_le_bytes([self.0[12], self.0[13], self.0[14], self.0[15]])
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}
