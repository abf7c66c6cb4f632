//! The physical frame allocator backing `brk`.

use kernel_devices::frames::BitmapFrames;
use kernel_sync::SpinMutex;

pub static FRAME_ALLOCATOR: SpinMutex<BitmapFrames> = SpinMutex::new(BitmapFrames::new());
