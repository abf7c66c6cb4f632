//! A mutex generic over its raw lock.

use crate::{RawLock, RawUnlock};
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

/// Data guarded by a raw lock `R`.
///
/// Kernel globals touched from both normal code and trap handlers live in
/// one of these; see [`Mutex::lock_irq`] for the variant that also masks
/// interrupts.
pub struct Mutex<T, R> {
    lock: R,
    data: UnsafeCell<T>,
}

// The raw lock serializes every access to `data`.
unsafe impl<T: Send, R: Sync> Sync for Mutex<T, R> {}

impl<T, R> Mutex<T, R> {
    pub const fn from_raw(lock: R, value: T) -> Self {
        Self {
            lock,
            data: UnsafeCell::new(value),
        }
    }

    /// Exclusive access without locking; the borrow proves nobody else has it.
    #[inline]
    pub const fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T, R> Mutex<T, R>
where
    R: RawLock + RawUnlock,
{
    /// Spins until the lock is free.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T, R> {
        self.lock.raw_lock();
        MutexGuard { mutex: self }
    }

    #[inline]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T, R>> {
        if self.lock.raw_try_lock() {
            Some(MutexGuard { mutex: self })
        } else {
            None
        }
    }

    /// Runs `f` with the lock held.
    #[inline]
    pub fn with_lock<U>(&self, f: impl FnOnce(&mut T) -> U) -> U {
        f(&mut self.lock())
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lock.raw_is_locked()
    }

    /// Releases the lock regardless of who holds it.
    ///
    /// Only for terminal paths (fatal exception, panic) that interrupted the
    /// holder and will never return to it.
    ///
    /// # Safety
    /// The interrupted holder must never run again, or must not touch the
    /// protected data after this call.
    #[inline]
    pub unsafe fn force_unlock(&self) {
        unsafe { self.lock.raw_unlock() }
    }
}

/// Proof of holding the lock. Unlocks on drop.
pub struct MutexGuard<'a, T, R>
where
    R: RawUnlock,
{
    mutex: &'a Mutex<T, R>,
}

impl<T, R: RawUnlock> Deref for MutexGuard<'_, T, R> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T, R: RawUnlock> DerefMut for MutexGuard<'_, T, R> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T, R: RawUnlock> Drop for MutexGuard<'_, T, R> {
    fn drop(&mut self) {
        unsafe { self.mutex.lock.raw_unlock() }
    }
}
