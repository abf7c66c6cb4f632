//! # Legacy PC devices
//!
//! The collaborators the trap subsystem is wired to on a PC:
//!
//! - [`frames`]: bitmap frame allocator behind [`PageAllocator`](kernel_trap::platform::PageAllocator).
//! - [`vga`]: 80x25 text console behind [`Display`](kernel_trap::display::Display).
//! - [`pit`]: 8259 PIC remap and 8254 PIT programming, installed as a
//!   [`Collaborator`](kernel_trap::Collaborator).
//!
//! Memory-mapped and port I/O go through [`vga::CellBuffer`] and
//! [`Platform`](kernel_trap::platform::Platform), so all of it runs under
//! the host test harness.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod frames;
pub mod pit;
pub mod vga;
