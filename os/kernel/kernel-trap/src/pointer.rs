//! The 10-byte operand of `lgdt` and `lidt`.

use core::mem::size_of;

/// `{ limit, base }` as read by `lgdt`/`lidt`.
///
/// `limit` is the table size in bytes minus one. The CPU keeps using `base`
/// after the load instruction retires, so the table it points at has to live
/// (and stay mapped) for as long as it is installed.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DescriptorTablePointer {
    limit: u16,
    base: u64,
}

const _: () = assert!(size_of::<DescriptorTablePointer>() == 10);

impl DescriptorTablePointer {
    #[must_use]
    pub const fn new(limit: u16, base: u64) -> Self {
        Self { limit, base }
    }

    /// Describes the table at `table`, sized after `T`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn for_table<T>(table: *const T) -> Self {
        const { assert!(size_of::<T>() > 0 && size_of::<T>() <= 0x1_0000) };
        Self::new((size_of::<T>() - 1) as u16, table as u64)
    }

    #[must_use]
    pub const fn limit(&self) -> u16 {
        self.limit
    }

    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Number of bytes covered, i.e. `limit + 1`.
    #[must_use]
    pub const fn table_size(&self) -> usize {
        self.limit as usize + 1
    }

    /// The exact little-endian memory image.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 10] {
        let l = self.limit.to_le_bytes();
        let b = self.base.to_le_bytes();
        [l[0], l[1], b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
    }
}
