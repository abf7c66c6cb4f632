//! Bookkeeping for the single running process.

use crate::platform::{PAGE_SIZE, PageAllocator};
use core::ops::RangeInclusive;
use log::debug;
use stdlib::syscall_abi::Errno;

/// Frames the program break can have outstanding at once.
pub const MAX_HEAP_PAGES: usize = 1024;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ProcessConfig {
    pid: u64,
    break_start: u64,
    break_limit: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ProcessConfig {
    /// pid 1, break window `[0x40_0000, 0x80_0000]`.
    pub const DEFAULT: Self = Self {
        pid: 1,
        break_start: 0x40_0000,
        break_limit: 0x80_0000,
    };

    /// A custom configuration. The window must be page aligned and small
    /// enough for [`MAX_HEAP_PAGES`].
    #[must_use]
    pub const fn new(pid: u64, break_start: u64, break_limit: u64) -> Option<Self> {
        if break_start % PAGE_SIZE != 0 || break_limit % PAGE_SIZE != 0 {
            return None;
        }
        if break_limit < break_start {
            return None;
        }
        if (break_limit - break_start) / PAGE_SIZE > MAX_HEAP_PAGES as u64 {
            return None;
        }
        Some(Self {
            pid,
            break_start,
            break_limit,
        })
    }

    #[must_use]
    pub const fn pid(&self) -> u64 {
        self.pid
    }

    /// Inclusive range of legal break values.
    #[must_use]
    pub const fn break_window(&self) -> RangeInclusive<u64> {
        self.break_start..=self.break_limit
    }

    /// Pages needed to back everything below `program_break`.
    #[allow(clippy::cast_possible_truncation)]
    const fn pages_for(&self, program_break: u64) -> usize {
        (program_break - self.break_start).div_ceil(PAGE_SIZE) as usize
    }
}

/// Frames currently backing the heap, in allocation order.
struct HeapFrames {
    frames: [u64; MAX_HEAP_PAGES],
    len: usize,
}

impl HeapFrames {
    const fn new() -> Self {
        Self {
            frames: [0; MAX_HEAP_PAGES],
            len: 0,
        }
    }

    /// Grows or shrinks to exactly `target` frames. Growth is all or
    /// nothing.
    fn resize(&mut self, target: usize, pages: &mut dyn PageAllocator) -> Result<(), Errno> {
        let before = self.len;
        while self.len < target {
            let frame = pages.allocate_page();
            if frame == 0 {
                debug!("brk: out of frames after {} of {}", self.len - before, target - before);
                self.truncate(before, pages);
                return Err(Errno::NoMemory);
            }
            self.frames[self.len] = frame;
            self.len += 1;
        }
        self.truncate(target, pages);
        Ok(())
    }

    fn truncate(&mut self, target: usize, pages: &mut dyn PageAllocator) {
        while self.len > target {
            self.len -= 1;
            pages.free_page(self.frames[self.len]);
        }
    }
}

/// Per-process bookkeeping: the pid and the program break.
///
/// The break starts at [`ProcessConfig::break_start`] and only ever moves
/// inside the configured window. Every page the break covers has a backing
/// frame recorded in the heap list, so shrinking returns exactly the frames
/// growing took.
pub struct ProcessState {
    config: ProcessConfig,
    program_break: u64,
    heap: HeapFrames,
}

impl ProcessState {
    #[must_use]
    pub const fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            program_break: config.break_start,
            heap: HeapFrames::new(),
        }
    }

    #[must_use]
    pub const fn pid(&self) -> u64 {
        self.config.pid
    }

    #[must_use]
    pub const fn program_break(&self) -> u64 {
        self.program_break
    }

    #[must_use]
    pub const fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Frames currently charged to the heap.
    #[must_use]
    pub const fn heap_pages(&self) -> usize {
        self.heap.len
    }

    /// Moves the program break by `increment` and returns the new break.
    ///
    /// # Errors
    /// [`Errno::NoMemory`] if the new break leaves the legal window or the
    /// allocator runs dry; the break is unchanged in both cases.
    pub fn brk(&mut self, increment: i64, pages: &mut dyn PageAllocator) -> Result<u64, Errno> {
        if increment == 0 {
            return Ok(self.program_break);
        }

        let new_break = self
            .program_break
            .checked_add_signed(increment)
            .ok_or(Errno::NoMemory)?;
        if !self.config.break_window().contains(&new_break) {
            return Err(Errno::NoMemory);
        }

        self.heap.resize(self.config.pages_for(new_break), pages)?;
        self.program_break = new_break;
        Ok(new_break)
    }
}
