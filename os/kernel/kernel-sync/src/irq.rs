//! Interrupt-flag control.
//!
//! All of these execute `cli`, `sti` or `pushfq` and are only legal at
//! ring 0 on `x86_64`.

use crate::{Mutex, MutexGuard, RawLock, RawUnlock};

/// `IF`, bit 9 of `RFLAGS`.
pub const RFLAGS_IF: u64 = 1 << 9;

/// A mutex guard that also keeps interrupts masked while held.
///
/// Interrupts are masked before the lock is taken and restored after it is
/// released, so an interrupt handler can never spin on a lock held by the
/// code it interrupted.
pub struct IrqMutex<'a, T, R: RawLock + RawUnlock> {
    // Field order is drop order: unlock first, then restore IF.
    _g: MutexGuard<'a, T, R>,
    _irq: IrqGuard,
}

impl<T, R: RawLock + RawUnlock> core::ops::Deref for IrqMutex<'_, T, R> {
    type Target = T;

    fn deref(&self) -> &T {
        &self._g
    }
}

impl<T, R: RawLock + RawUnlock> core::ops::DerefMut for IrqMutex<'_, T, R> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self._g
    }
}

impl<T, R: RawLock + RawUnlock> Mutex<T, R> {
    /// Acquires the mutex with interrupts masked for the guard's lifetime.
    #[inline]
    pub fn lock_irq(&self) -> IrqMutex<'_, T, R> {
        let irq = IrqGuard::new();
        let g = self.lock();
        IrqMutex { _g: g, _irq: irq }
    }
}

/// Masks maskable interrupts (`cli`).
///
/// Not `nomem`: memory accesses stay on their side of the instruction.
#[inline]
pub fn cli_stop_interrupts() {
    unsafe { core::arch::asm!("cli", options(nostack, preserves_flags)) }
}

/// Unmasks maskable interrupts (`sti`). A compiler barrier like
/// [`cli_stop_interrupts`].
#[inline]
pub fn sti_enable_interrupts() {
    unsafe { core::arch::asm!("sti", options(nostack, preserves_flags)) }
}

/// Current `RFLAGS` (via `pushfq; pop`).
#[inline]
#[must_use]
pub fn rflags() -> u64 {
    let r: u64;
    unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(nostack, preserves_flags)) }
    r
}

#[inline]
#[must_use]
pub fn interrupts_enabled() -> bool {
    rflags() & RFLAGS_IF != 0
}

/// Runs `f` with interrupts masked, restoring the previous state afterwards.
#[inline]
pub fn without_interrupts<U>(f: impl FnOnce() -> U) -> U {
    let _g = IrqGuard::new();
    f()
}

/// Masks interrupts on creation and restores the previous `IF` on drop.
pub struct IrqGuard {
    were_enabled: bool,
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqGuard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        let enabled = interrupts_enabled();
        if enabled {
            cli_stop_interrupts();
        }
        Self {
            were_enabled: enabled,
        }
    }

    #[inline]
    #[must_use]
    pub const fn were_enabled(&self) -> bool {
        self.were_enabled
    }
}

impl Drop for IrqGuard {
    fn drop(&mut self) {
        if self.were_enabled {
            sti_enable_interrupts();
        }
    }
}
