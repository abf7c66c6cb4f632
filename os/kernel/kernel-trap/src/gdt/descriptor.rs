//! 8-byte code/data segment descriptors.
//!
//! ```text
//!  byte   0..2       2..4      4         5        6                 7
//!       +----------+---------+---------+--------+-----------------+---------+
//!       | limit_lo | base_lo | base_mid| access | flags | limit_hi| base_hi |
//!       +----------+---------+---------+--------+-----------------+---------+
//! ```
//!
//! The fields are split across the record, so the descriptor is kept as a
//! plain byte array and every accessor splits or joins explicitly.

use crate::error::DescriptorError;
use crate::privilege::Ring;
use bitfield_struct::bitfield;

/// Largest value the 20-bit limit can hold.
pub const MAX_LIMIT: u32 = 0xF_FFFF;

/// The access byte: `| P | DPL(2) | S | E | DC | RW | A |`.
#[bitfield(u8)]
#[derive(Eq, PartialEq)]
pub struct AccessByte {
    /// Set by the CPU on first use.
    pub accessed: bool,
    /// Readable (code) or writable (data).
    pub read_write: bool,
    /// Conforming (code) or expand-down (data).
    pub direction_conforming: bool,
    /// Code segment.
    pub executable: bool,
    /// 1 for code/data, 0 for system descriptors.
    pub code_or_data: bool,
    #[bits(2)]
    pub dpl: Ring,
    pub present: bool,
}

impl AccessByte {
    /// Present, readable code segment at `dpl`.
    #[must_use]
    pub const fn code(dpl: Ring) -> Self {
        Self::new()
            .with_present(true)
            .with_dpl(dpl)
            .with_code_or_data(true)
            .with_executable(true)
            .with_read_write(true)
    }

    /// Present, writable data segment at `dpl`.
    #[must_use]
    pub const fn data(dpl: Ring) -> Self {
        Self::new()
            .with_present(true)
            .with_dpl(dpl)
            .with_code_or_data(true)
            .with_read_write(true)
    }
}

/// The upper nibble of byte 6: `| G | D/B | L | AVL |`.
#[bitfield(u8)]
#[derive(Eq, PartialEq)]
pub struct SegmentFlags {
    pub available: bool,
    /// 64-bit code segment.
    pub long_mode: bool,
    /// 32-bit default operand size. Must be clear when `long_mode` is set.
    pub default_size: bool,
    /// Limit counts 4 KiB pages instead of bytes.
    pub granularity: bool,
    #[bits(4)]
    __reserved: u8,
}

/// One GDT entry in its hardware layout.
///
/// In long mode the CPU ignores base and limit for code and data segments;
/// what still matters is the access byte (presence, DPL, code vs. data) and
/// the `L` flag on code segments. Base and limit are still encoded so the
/// table reads back sensibly in a debugger.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct SegmentDescriptor([u8; 8]);

const _: () = assert!(size_of::<SegmentDescriptor>() == 8);

impl SegmentDescriptor {
    /// The mandatory all-zero entry at index 0.
    pub const NULL: Self = Self([0; 8]);

    /// Builds a code or data descriptor, rejecting anything the CPU would
    /// misinterpret.
    ///
    /// # Errors
    /// See [`DescriptorError`].
    pub const fn new(
        base: u32,
        limit: u32,
        access: AccessByte,
        flags: SegmentFlags,
    ) -> Result<Self, DescriptorError> {
        if limit > MAX_LIMIT {
            return Err(DescriptorError::LimitTooLarge(limit));
        }
        if !access.present() {
            return Err(DescriptorError::NotPresent);
        }
        if !access.code_or_data() {
            return Err(DescriptorError::SystemSegment);
        }
        if flags.long_mode() {
            if !access.executable() {
                return Err(DescriptorError::LongModeData);
            }
            if flags.default_size() {
                return Err(DescriptorError::LongModeWithDefaultSize);
            }
        }

        let b = base.to_le_bytes();
        let l = limit.to_le_bytes();
        Ok(Self([
            l[0],
            l[1],
            b[0],
            b[1],
            b[2],
            access.into_bits(),
            (flags.into_bits() << 4) | (l[2] & 0x0F),
            b[3],
        ]))
    }

    /// Reassembles the 32-bit base from bytes 2, 3, 4 and 7.
    #[must_use]
    pub const fn base(&self) -> u32 {
        u32::from_le_bytes([self.0[2], self.0[3], self.0[4], self.0[7]])
    }

    /// Reassembles the 20-bit limit from bytes 0, 1 and the low nibble of 6.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[6] & 0x0F, 0])
    }

    #[must_use]
    pub const fn access(&self) -> AccessByte {
        AccessByte::from_bits(self.0[5])
    }

    #[must_use]
    pub const fn flags(&self) -> SegmentFlags {
        SegmentFlags::from_bits(self.0[6] >> 4)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// The descriptor as one little-endian quadword.
    #[must_use]
    pub const fn to_u64(self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.to_u64() == 0
    }
}
