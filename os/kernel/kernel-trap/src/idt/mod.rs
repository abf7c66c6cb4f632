//! # Interrupt Descriptor Table
//!
//! All 256 gates are present interrupt gates in the kernel code segment.
//! Vectors `0..32` point at the exception entry stub of their vector and
//! `32..=255` at the generic interrupt stub. Every gate requires ring 0
//! except [`SYSCALL_VECTOR`], which user code may raise with `int 0x80`.
//!
//! The privilege policy is a property of the vector, not of the caller: both
//! [`Idt::build`] and [`Idt::install`] derive the DPL from
//! [`vector_dpl`], so a collaborator replacing a handler cannot widen access
//! to its vector.

pub mod gate;

use crate::error::DescriptorError;
use crate::gdt::KERNEL_CODE_SELECTOR;
use crate::pointer::DescriptorTablePointer;
use crate::privilege::Ring;
use core::ops::Index;
use gate::{GateAttr, GateDescriptor};

pub use stdlib::syscall_abi::SYSCALL_VECTOR;

pub const IDT_ENTRIES: usize = 256;

/// First vector not reserved for CPU exceptions.
pub const FIRST_INTERRUPT_VECTOR: u8 = 32;

/// PIT channel 0 after the legacy PIC has been remapped.
pub const TIMER_VECTOR: u8 = FIRST_INTERRUPT_VECTOR;

const _: () = assert!(size_of::<Idt>() == IDT_ENTRIES * 16);
const _: () = assert!(align_of::<Idt>() == 16);

#[inline]
#[must_use]
pub const fn is_exception_vector(vector: u8) -> bool {
    vector < FIRST_INTERRUPT_VECTOR
}

/// Minimum privilege allowed to raise `vector` in software.
#[inline]
#[must_use]
pub const fn vector_dpl(vector: u8) -> Ring {
    if vector == SYSCALL_VECTOR {
        Ring::Ring3
    } else {
        Ring::Ring0
    }
}

/// Address of a low-level entry stub.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryPoint(u64);

impl EntryPoint {
    #[must_use]
    pub const fn from_addr(addr: u64) -> Self {
        Self(addr)
    }

    #[must_use]
    pub fn from_fn(stub: unsafe extern "C" fn()) -> Self {
        Self(stub as usize as u64)
    }

    #[must_use]
    pub const fn addr(self) -> u64 {
        self.0
    }
}

/// The per-vector entry stubs the table points at.
///
/// Implementations hand out the assembly trampolines that build a
/// [`TrapFrame`](crate::frame::TrapFrame) and call into the dispatchers.
pub trait EntryStubs {
    /// Stub for a CPU exception vector (`0..32`).
    fn exception_entry(&self, vector: u8) -> EntryPoint;

    /// Stub for any other vector (`32..=255`).
    fn interrupt_entry(&self, vector: u8) -> EntryPoint;

    /// The class-appropriate stub for `vector`.
    fn entry_for(&self, vector: u8) -> EntryPoint {
        if is_exception_vector(vector) {
            self.exception_entry(vector)
        } else {
            self.interrupt_entry(vector)
        }
    }
}

#[repr(C, align(16))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Idt {
    gates: [GateDescriptor; IDT_ENTRIES],
}

impl Default for Idt {
    fn default() -> Self {
        Self::new()
    }
}

impl Idt {
    /// A table with every gate missing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gates: [GateDescriptor::MISSING; IDT_ENTRIES],
        }
    }

    /// Populates all 256 gates from `stubs`.
    ///
    /// # Errors
    /// Fails on the first stub address that does not make a valid gate.
    pub fn build<S: EntryStubs + ?Sized>(stubs: &S) -> Result<Self, DescriptorError> {
        let mut idt = Self::new();
        for vector in 0..=u8::MAX {
            idt.install(vector, stubs.entry_for(vector))?;
        }
        Ok(idt)
    }

    /// Points `vector` at `entry`, keeping the vector's privilege policy.
    ///
    /// Writing the same entry twice leaves the table unchanged. On error the
    /// gate is left as it was.
    ///
    /// # Errors
    /// See [`GateDescriptor::new`].
    pub fn install(&mut self, vector: u8, entry: EntryPoint) -> Result<(), DescriptorError> {
        let gate = GateDescriptor::new(
            entry.addr(),
            KERNEL_CODE_SELECTOR,
            0,
            GateAttr::interrupt(vector_dpl(vector)),
        )?;
        self.gates[usize::from(vector)] = gate;
        Ok(())
    }

    #[must_use]
    pub const fn gate(&self, vector: u8) -> &GateDescriptor {
        &self.gates[vector as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &GateDescriptor)> {
        (0..=u8::MAX).zip(self.gates.iter())
    }

    /// The `lidt` operand for this table at its current address.
    #[must_use]
    pub fn pointer(&self) -> DescriptorTablePointer {
        DescriptorTablePointer::for_table(&raw const *self)
    }
}

impl Index<u8> for Idt {
    type Output = GateDescriptor;

    fn index(&self, vector: u8) -> &Self::Output {
        self.gate(vector)
    }
}
