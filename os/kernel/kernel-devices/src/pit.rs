//! Legacy 8259 PIC and 8254 PIT, driving the periodic timer on IRQ0.

use core::sync::atomic::{AtomicU64, Ordering};
use kernel_trap::bringup::{BringUpError, Collaborator, GateInstaller};
use kernel_trap::idt::{EntryPoint, TIMER_VECTOR};
use kernel_trap::interrupts::{
    PIC1_COMMAND, PIC1_DATA, PIC1_VECTOR_BASE, PIC2_COMMAND, PIC2_DATA, PIC2_VECTOR_BASE,
    acknowledge,
};
use kernel_trap::platform::Platform;
use log::info;

/// PIT input clock.
pub const PIT_BASE_HZ: u32 = 1_193_182;
pub const PIT_CHANNEL0: u16 = 0x40;
pub const PIT_COMMAND: u16 = 0x43;

/// Channel 0, low byte then high byte, mode 3 (square wave), binary.
pub const PIT_MODE3_CH0: u8 = 0x36;

/// ICW1: edge triggered, cascade, ICW4 follows.
const ICW1_INIT: u8 = 0x11;
/// ICW4: 8086 mode.
const ICW4_8086: u8 = 0x01;
/// Slave sits on master IRQ2.
const CASCADE_IRQ: u8 = 2;

static TICKS: AtomicU64 = AtomicU64::new(0);

/// Timer interrupts seen since the PIT was started.
#[must_use]
pub fn ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

/// Body of the timer interrupt: count, then end-of-interrupt.
pub fn on_tick<P: Platform + ?Sized>(platform: &P) {
    TICKS.fetch_add(1, Ordering::Relaxed);
    acknowledge(platform, TIMER_VECTOR);
}

/// Moves IRQ 0..16 to vectors 32..48 and masks every line but the cascade.
///
/// # Safety
/// Reprograms both PICs; interrupts from them must not be in flight.
pub unsafe fn remap_pic(platform: &dyn Platform) {
    unsafe {
        platform.write_port(PIC1_COMMAND, ICW1_INIT);
        platform.write_port(PIC2_COMMAND, ICW1_INIT);
        platform.write_port(PIC1_DATA, PIC1_VECTOR_BASE);
        platform.write_port(PIC2_DATA, PIC2_VECTOR_BASE);
        platform.write_port(PIC1_DATA, 1 << CASCADE_IRQ);
        platform.write_port(PIC2_DATA, CASCADE_IRQ);
        platform.write_port(PIC1_DATA, ICW4_8086);
        platform.write_port(PIC2_DATA, ICW4_8086);

        platform.write_port(PIC1_DATA, !(1 << CASCADE_IRQ));
        platform.write_port(PIC2_DATA, 0xFF);
    }
}

/// The periodic timer.
///
/// `stub` is the entry stub installed on [`TIMER_VECTOR`]; it must build a
/// trap frame and end up in [`on_tick`].
pub struct PitTimer {
    hz: u32,
    stub: unsafe extern "C" fn(),
}

impl PitTimer {
    #[must_use]
    pub const fn new(hz: u32, stub: unsafe extern "C" fn()) -> Self {
        Self { hz, stub }
    }

    #[must_use]
    pub const fn hz(&self) -> u32 {
        self.hz
    }

    /// Channel 0 reload value, saturated to the 16-bit counter.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn divisor(&self) -> u16 {
        if self.hz == 0 {
            return u16::MAX;
        }
        let divisor = PIT_BASE_HZ / self.hz;
        if divisor > u16::MAX as u32 {
            u16::MAX
        } else {
            divisor as u16
        }
    }
}

impl Collaborator for PitTimer {
    fn name(&self) -> &'static str {
        "pit"
    }

    fn install(&self, gates: &GateInstaller<'_>) -> Result<(), BringUpError> {
        let platform = gates.platform();
        let [lo, hi] = self.divisor().to_le_bytes();

        unsafe {
            remap_pic(platform);
            platform.write_port(PIT_COMMAND, PIT_MODE3_CH0);
            platform.write_port(PIT_CHANNEL0, lo);
            platform.write_port(PIT_CHANNEL0, hi);
        }

        gates.install(TIMER_VECTOR, EntryPoint::from_fn(self.stub))?;

        // IRQ0 only once its gate points at us.
        unsafe {
            let mask = platform.read_port(PIC1_DATA);
            platform.write_port(PIC1_DATA, mask & !1);
        }

        info!("PIT running at {} Hz (divisor {})", self.hz, self.divisor());
        Ok(())
    }
}
