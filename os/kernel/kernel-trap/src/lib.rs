//! # Trap and privilege-transition subsystem
//!
//! How the kernel gets control back from the CPU: the segment table that
//! defines ring 0, the 256-gate vector table, the trap frame every entry
//! stub builds, and the two dispatchers behind it.
//!
//! - [`gdt`]: null, kernel code and kernel data descriptors.
//! - [`idt`]: gates for all 256 vectors and their privilege policy.
//! - [`frame`]: the register snapshot shared by exceptions and syscalls.
//! - [`exceptions`]: fatal diagnostics for vectors `0..32`.
//! - [`interrupts`]: fallback for unclaimed hardware vectors.
//! - [`syscall`]: the `int 0x80` service table.
//! - [`bringup`]: construction and installation order at boot.
//!
//! Privileged instructions and devices sit behind [`platform::Platform`],
//! [`platform::PageAllocator`] and [`display::Display`], so everything here
//! runs under the host test harness.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod bringup;
pub mod display;
mod error;
pub mod exceptions;
pub mod frame;
pub mod gdt;
pub mod idt;
pub mod interrupts;
pub mod platform;
pub mod pointer;
pub mod privilege;
pub mod syscall;

pub use bringup::{BringUpError, Collaborator, DescriptorTables, GateInstaller, bring_up};
pub use error::DescriptorError;
pub use frame::TrapFrame;
