//! The hardware seam.
//!
//! Everything in this crate above these traits is plain data manipulation
//! and runs under the host test harness. Only the implementations (in the
//! kernel binary) execute privileged instructions.

use crate::gdt::selectors::SegmentSelector;
use crate::pointer::DescriptorTablePointer;

pub const PAGE_SIZE: u64 = 4096;

/// Privileged CPU operations.
pub trait Platform {
    /// `sti`
    fn enable_interrupts(&self);

    /// `cli`
    fn disable_interrupts(&self);

    /// `RFLAGS.IF`.
    fn interrupts_enabled(&self) -> bool;

    /// Loads the GDT and reloads `CS` with `code` and the data segment
    /// registers with `data`.
    ///
    /// # Safety
    /// `pointer` must describe a valid table that outlives its installation,
    /// and both selectors must index descriptors of the right kind in it.
    unsafe fn load_gdt(
        &self,
        pointer: &DescriptorTablePointer,
        code: SegmentSelector,
        data: SegmentSelector,
    );

    /// Loads the IDT.
    ///
    /// # Safety
    /// `pointer` must describe a fully populated table that outlives its
    /// installation.
    unsafe fn load_idt(&self, pointer: &DescriptorTablePointer);

    /// # Safety
    /// Port reads can have device side effects.
    unsafe fn read_port(&self, port: u16) -> u8;

    /// # Safety
    /// Port writes reprogram hardware.
    unsafe fn write_port(&self, port: u16, value: u8);

    /// Stops executing for good.
    fn halt(&self) -> !;
}

/// Physical page frames, one [`PAGE_SIZE`] page at a time.
pub trait PageAllocator {
    /// Returns the physical address of a free page, or 0 if none is left.
    fn allocate_page(&mut self) -> u64;

    /// Returns a page obtained from [`allocate_page`](Self::allocate_page).
    fn free_page(&mut self, address: u64);
}
