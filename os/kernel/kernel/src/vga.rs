//! 80x25 VGA text console at `0xB8000`.

use kernel_devices::vga::{CellBuffer, HEIGHT, TextConsole, WIDTH};
use kernel_sync::{MutexGuard, RawSpin, SpinMutex};

const VGA_BUFFER: usize = 0xB_8000;

/// The console.
///
/// Normal code takes it with [`lock_irq`](kernel_sync::Mutex::lock_irq);
/// trap handlers already run with interrupts masked and use `lock`; paths
/// that never return use [`steal`].
pub static VGA: SpinMutex<TextConsole<VgaBuffer>> =
    SpinMutex::new(TextConsole::new(VgaBuffer));

/// Takes the console even if the interrupted code was holding it.
#[must_use]
pub fn steal() -> MutexGuard<'static, TextConsole<VgaBuffer>, RawSpin> {
    if let Some(guard) = VGA.try_lock() {
        return guard;
    }
    // The holder was interrupted and will never run again.
    unsafe { VGA.force_unlock() };
    VGA.lock()
}

/// Identity-mapped text mode memory.
pub struct VgaBuffer;

impl CellBuffer for VgaBuffer {
    fn write(&mut self, row: usize, column: usize, cell: u16) {
        debug_assert!(row < HEIGHT && column < WIDTH);
        unsafe {
            (VGA_BUFFER as *mut u16)
                .add(row * WIDTH + column)
                .write_volatile(cell);
        }
    }

    fn read(&self, row: usize, column: usize) -> u16 {
        debug_assert!(row < HEIGHT && column < WIDTH);
        unsafe {
            (VGA_BUFFER as *const u16)
                .add(row * WIDTH + column)
                .read_volatile()
        }
    }
}
