//! # Bring-up
//!
//! Order matters and is fixed:
//!
//! 1. build, validate and load the GDT, reload the segment registers;
//! 2. build, validate and load the IDT, then enable interrupts;
//! 3. let each [`Collaborator`] overwrite its own gate and unmask its source;
//! 4. install the syscall gate, the only one callable from ring 3.
//!
//! Both tables live in a [`DescriptorTables`] with `'static` lifetime, since
//! the CPU keeps reading them after `lgdt`/`lidt`. Each table is written
//! once; afterwards only single-gate overwrites through
//! [`DescriptorTables::install_gate`] are possible.

use crate::error::DescriptorError;
use crate::gdt::{Gdt, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR};
use crate::idt::{EntryPoint, EntryStubs, Idt, SYSCALL_VECTOR, is_exception_vector};
use crate::platform::Platform;
use core::sync::atomic::{Ordering, fence};
use kernel_sync::{SpinMutex, SyncOnceCell};
use log::{debug, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BringUpError {
    #[error("segment table already loaded")]
    GdtAlreadyLoaded,
    #[error("vector table already loaded")]
    IdtAlreadyLoaded,
    #[error("segment table must be loaded before the vector table")]
    GdtNotLoaded,
    #[error("vector table not loaded")]
    IdtNotLoaded,
    #[error("vector {0:#x} is reserved for syscalls")]
    SyscallVectorReserved(u8),
    #[error("vector {0:#x} is reserved for CPU exceptions")]
    ExceptionVectorReserved(u8),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// The process-wide GDT and IDT.
pub struct DescriptorTables {
    gdt: SyncOnceCell<Gdt>,
    idt: SyncOnceCell<SpinMutex<Idt>>,
}

impl Default for DescriptorTables {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorTables {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gdt: SyncOnceCell::new(),
            idt: SyncOnceCell::new(),
        }
    }

    #[must_use]
    pub fn gdt(&self) -> Option<&Gdt> {
        self.gdt.get()
    }

    #[must_use]
    pub fn idt(&self) -> Option<&SpinMutex<Idt>> {
        self.idt.get()
    }

    /// Step 1: builds and loads the GDT.
    ///
    /// # Errors
    /// [`BringUpError::GdtAlreadyLoaded`] on a second call, or a descriptor
    /// validation error.
    pub fn load_gdt(&'static self, platform: &dyn Platform) -> Result<&'static Gdt, BringUpError> {
        let gdt = Gdt::build()?;
        let gdt = self
            .gdt
            .try_init(gdt)
            .map_err(|_| BringUpError::GdtAlreadyLoaded)?;

        let pointer = gdt.pointer();
        unsafe { platform.load_gdt(&pointer, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR) };
        info!(
            "GDT loaded at {:#x} (limit {:#x}), cs={:#x} ds={:#x}",
            pointer.base(),
            pointer.limit(),
            KERNEL_CODE_SELECTOR.into_bits(),
            KERNEL_DATA_SELECTOR.into_bits()
        );
        Ok(gdt)
    }

    /// Step 2: builds the IDT from `stubs`, loads it and enables interrupts.
    ///
    /// # Errors
    /// [`BringUpError::GdtNotLoaded`] before step 1,
    /// [`BringUpError::IdtAlreadyLoaded`] on a second call, or a gate
    /// validation error.
    pub fn load_idt(
        &'static self,
        platform: &dyn Platform,
        stubs: &dyn EntryStubs,
    ) -> Result<(), BringUpError> {
        if !self.gdt.is_initialized() {
            return Err(BringUpError::GdtNotLoaded);
        }

        let idt = Idt::build(stubs)?;
        let idt = self
            .idt
            .try_init(SpinMutex::new(idt))
            .map_err(|_| BringUpError::IdtAlreadyLoaded)?;

        let pointer = idt.lock().pointer();
        unsafe { platform.load_idt(&pointer) };
        info!(
            "IDT loaded at {:#x} (limit {:#x})",
            pointer.base(),
            pointer.limit()
        );

        platform.enable_interrupts();
        Ok(())
    }

    /// Overwrites a single gate in the loaded IDT.
    ///
    /// Interrupts are masked while the 16 bytes are rewritten, so the CPU
    /// never dispatches through a half-written gate. The interrupt flag is
    /// left as it was found.
    ///
    /// # Errors
    /// [`BringUpError::IdtNotLoaded`] before step 2, or a gate validation
    /// error (the gate is left untouched).
    pub fn install_gate(
        &'static self,
        platform: &dyn Platform,
        vector: u8,
        entry: EntryPoint,
    ) -> Result<(), BringUpError> {
        let idt = self.idt.get().ok_or(BringUpError::IdtNotLoaded)?;

        let were_enabled = platform.interrupts_enabled();
        platform.disable_interrupts();
        let result = idt.lock().install(vector, entry);
        fence(Ordering::SeqCst);
        if were_enabled {
            platform.enable_interrupts();
        }

        result?;
        debug!("gate {vector:#04x} -> {:#x}", entry.addr());
        Ok(())
    }
}

/// Restricted gate access handed to collaborators in step 3.
pub struct GateInstaller<'a> {
    tables: &'static DescriptorTables,
    platform: &'a dyn Platform,
}

impl<'a> GateInstaller<'a> {
    #[must_use]
    pub const fn new(tables: &'static DescriptorTables, platform: &'a dyn Platform) -> Self {
        Self { tables, platform }
    }

    /// The platform, for programming the collaborator's device.
    #[must_use]
    pub const fn platform(&self) -> &'a dyn Platform {
        self.platform
    }

    /// Points `vector` at `entry`.
    ///
    /// # Errors
    /// Exception vectors and the syscall vector are not available to
    /// collaborators.
    pub fn install(&self, vector: u8, entry: EntryPoint) -> Result<(), BringUpError> {
        if vector == SYSCALL_VECTOR {
            return Err(BringUpError::SyscallVectorReserved(vector));
        }
        if is_exception_vector(vector) {
            return Err(BringUpError::ExceptionVectorReserved(vector));
        }
        self.tables.install_gate(self.platform, vector, entry)
    }
}

/// A device driver that owns one or more interrupt vectors.
pub trait Collaborator {
    fn name(&self) -> &'static str;

    /// Installs the collaborator's gates. The device must not be unmasked
    /// before its gate is in place.
    ///
    /// # Errors
    /// Propagates gate installation failures.
    fn install(&self, gates: &GateInstaller<'_>) -> Result<(), BringUpError>;
}

/// Runs the full bring-up sequence.
///
/// # Errors
/// Stops at the first failing step; the machine is not usable afterwards.
pub fn bring_up(
    tables: &'static DescriptorTables,
    platform: &dyn Platform,
    stubs: &dyn EntryStubs,
    collaborators: &[&dyn Collaborator],
    syscall_entry: EntryPoint,
) -> Result<(), BringUpError> {
    tables.load_gdt(platform)?;
    tables.load_idt(platform, stubs)?;

    let gates = GateInstaller::new(tables, platform);
    for collaborator in collaborators {
        info!("installing {}", collaborator.name());
        collaborator.install(&gates)?;
    }

    tables.install_gate(platform, SYSCALL_VECTOR, syscall_entry)?;
    info!("syscall gate {SYSCALL_VECTOR:#x} installed");
    Ok(())
}
