//! # Shared syscall ABI
//!
//! The `int 0x80` contract between the kernel's syscall dispatcher and its
//! callers: syscall numbers, standard file descriptors and error codes
//! (`syscall-abi`), plus the caller-side trap wrappers (`syscall`) and
//! `print!`-style helpers built on them (`stdlib`).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![cfg_attr(not(feature = "syscall"), forbid(unsafe_code))]
#![cfg_attr(feature = "syscall", allow(unsafe_code))]

#[cfg(feature = "stdlib")]
#[macro_use]
pub mod stdlib;

#[cfg(feature = "syscall")]
pub mod syscall;

#[cfg(feature = "syscall-abi")]
pub mod syscall_abi;
