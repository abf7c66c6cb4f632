//! Bitmap frame allocator over the identity-mapped low 16 MiB.
//!
//! One bit per 4 KiB frame, set when the frame is in use. Allocation is
//! first fit starting at a next-free hint; freeing below the hint moves
//! the hint back.

use core::ops::Range;
use kernel_trap::platform::{PAGE_SIZE, PageAllocator};
use kernel_trap::syscall::ProcessConfig;

/// End of managed physical memory.
pub const MANAGED_END: u64 = 16 * 1024 * 1024;

/// Kernel image, boot stack, VGA memory and firmware areas.
pub const RESERVED_LOW: Range<u64> = 0..3 * 1024 * 1024;

/// Bytes the program break may cover. User code addresses them directly
/// under the identity map, so they are never handed out as frames.
pub const RESERVED_HEAP: Range<u64> = {
    let window = ProcessConfig::DEFAULT.break_window();
    *window.start()..*window.end()
};

#[allow(clippy::cast_possible_truncation)]
pub const FRAMES: usize = (MANAGED_END / PAGE_SIZE) as usize;
const WORDS: usize = FRAMES / 64;

const fn is_reserved(address: u64) -> bool {
    (address >= RESERVED_LOW.start && address < RESERVED_LOW.end)
        || (address >= RESERVED_HEAP.start && address < RESERVED_HEAP.end)
}

pub struct BitmapFrames {
    bitmap: [u64; WORDS],
    next_free: usize,
    free: usize,
}

impl Default for BitmapFrames {
    fn default() -> Self {
        Self::new()
    }
}

impl BitmapFrames {
    /// Every frame free except [`RESERVED_LOW`] and [`RESERVED_HEAP`].
    #[must_use]
    pub const fn new() -> Self {
        let mut frames = Self {
            bitmap: [0; WORDS],
            next_free: 0,
            free: FRAMES,
        };
        let mut frame = 0;
        while frame < FRAMES {
            if is_reserved(frame as u64 * PAGE_SIZE) {
                frames.mark_used(frame);
            }
            frame += 1;
        }
        frames
    }

    const fn mark_used(&mut self, frame: usize) {
        self.bitmap[frame / 64] |= 1 << (frame % 64);
        self.free -= 1;
    }

    const fn mark_free(&mut self, frame: usize) {
        self.bitmap[frame / 64] &= !(1 << (frame % 64));
        self.free += 1;
    }

    #[must_use]
    pub const fn is_used(&self, frame: usize) -> bool {
        self.bitmap[frame / 64] & (1 << (frame % 64)) != 0
    }

    #[must_use]
    pub const fn free_frames(&self) -> usize {
        self.free
    }

    #[must_use]
    pub const fn managed_bytes(&self) -> u64 {
        MANAGED_END
    }
}

impl PageAllocator for BitmapFrames {
    /// Returns 0 once every frame is taken; frame 0 is reserved, so 0 is
    /// never a valid allocation.
    fn allocate_page(&mut self) -> u64 {
        for offset in 0..FRAMES {
            let frame = (self.next_free + offset) % FRAMES;
            if self.is_used(frame) {
                continue;
            }
            self.mark_used(frame);
            self.next_free = (frame + 1) % FRAMES;
            return frame as u64 * PAGE_SIZE;
        }
        0
    }

    /// Unaligned, out-of-range, reserved and already free addresses are
    /// ignored.
    #[allow(clippy::cast_possible_truncation)]
    fn free_page(&mut self, address: u64) {
        if address % PAGE_SIZE != 0 || address >= MANAGED_END || is_reserved(address) {
            return;
        }
        let frame = (address / PAGE_SIZE) as usize;
        if !self.is_used(frame) {
            return;
        }
        self.mark_free(frame);
        if frame < self.next_free {
            self.next_free = frame;
        }
    }
}
