//! CPU privilege rings.
//!
//! The same two-bit value shows up as the DPL of a descriptor or gate, as the
//! RPL in the low bits of a selector, and as the CPL in the low bits of `CS`.
//! Gates check `CPL <= DPL` for software-issued `int n`; a gate with DPL 3 is
//! therefore reachable from user mode, a gate with DPL 0 raises `#GP` instead.

/// Low two bits of a segment selector.
pub const RPL_MASK: u64 = 0b11;

/// A privilege level.
///
/// Only rings 0 and 3 are used: the kernel runs in ring 0 and the single
/// user process in ring 3. Rings 1 and 2 decode so that arbitrary selector
/// bits can be represented, but nothing should produce them.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
#[repr(u8)]
pub enum Ring {
    /// Kernel.
    #[default]
    Ring0 = 0,
    #[deprecated]
    Ring1 = 1,
    #[deprecated]
    Ring2 = 2,
    /// User mode.
    Ring3 = 3,
}

impl Ring {
    /// Decodes the two low bits of `bits`.
    #[inline]
    #[must_use]
    #[allow(deprecated)]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Ring0,
            1 => Self::Ring1,
            2 => Self::Ring2,
            _ => Self::Ring3,
        }
    }

    /// The two-bit encoding used in descriptors and selectors.
    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// The requested privilege level carried by a selector value.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn of_selector(selector: u64) -> Self {
        Self::from_bits((selector & RPL_MASK) as u8)
    }

    /// Ring 3.
    #[inline]
    #[must_use]
    pub const fn is_user(self) -> bool {
        matches!(self, Self::Ring3)
    }
}

impl From<Ring> for u8 {
    #[inline]
    fn from(r: Ring) -> Self {
        r.into_bits()
    }
}

/// Fails with the input for anything above 3.
impl TryFrom<u8> for Ring {
    type Error = u8;

    #[inline]
    fn try_from(r: u8) -> Result<Self, Self::Error> {
        if r <= 3 { Ok(Self::from_bits(r)) } else { Err(r) }
    }
}
