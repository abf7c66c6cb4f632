//! # Kernel synchronization primitives
//!
//! Single-core kernel state is either written once during bring-up and then
//! read (see [`SyncOnceCell`]) or mutated under a short spin lock that may
//! also mask interrupts (see [`SpinMutex`] and [`irq::IrqGuard`]).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod irq;
mod mutex;
mod raw_spin;
mod sync_once_cell;

pub use irq::{IrqGuard, IrqMutex};
pub use mutex::{Mutex, MutexGuard};
pub use raw_spin::RawSpin;
pub use sync_once_cell::SyncOnceCell;

pub type SpinMutex<T> = Mutex<T, RawSpin>;

impl<T> SpinMutex<T> {
    pub const fn new(value: T) -> Self {
        Self::from_raw(RawSpin::new(), value)
    }
}

pub trait RawLock {
    fn raw_lock(&self);
    fn raw_try_lock(&self) -> bool;
    fn raw_is_locked(&self) -> bool;
}

pub trait RawUnlock {
    /// # Safety
    /// The lock must be held, and no guard may outlive this call.
    unsafe fn raw_unlock(&self);
}
