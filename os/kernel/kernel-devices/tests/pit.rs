use kernel_devices::pit::{PitTimer, on_tick, ticks};
use kernel_trap::gdt::selectors::SegmentSelector;
use kernel_trap::idt::{EntryPoint, EntryStubs, TIMER_VECTOR};
use kernel_trap::platform::Platform;
use kernel_trap::pointer::DescriptorTablePointer;
use kernel_trap::{Collaborator, DescriptorTables, GateInstaller};
use std::cell::{Cell, RefCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Io {
    Cli,
    Sti,
    In(u16),
    Out(u16, u8),
}

/// Records port traffic and interrupt-flag changes. The master PIC data
/// port reads back the last value written to it.
#[derive(Default)]
struct PortLog {
    io: RefCell<Vec<Io>>,
    master_mask: Cell<u8>,
    interrupts: Cell<bool>,
}

impl PortLog {
    fn io(&self) -> Vec<Io> {
        self.io.borrow().clone()
    }

    fn outs(&self) -> Vec<(u16, u8)> {
        self.io()
            .into_iter()
            .filter_map(|io| match io {
                Io::Out(port, value) => Some((port, value)),
                _ => None,
            })
            .collect()
    }
}

impl Platform for PortLog {
    fn enable_interrupts(&self) {
        self.interrupts.set(true);
        self.io.borrow_mut().push(Io::Sti);
    }

    fn disable_interrupts(&self) {
        self.interrupts.set(false);
        self.io.borrow_mut().push(Io::Cli);
    }

    fn interrupts_enabled(&self) -> bool {
        self.interrupts.get()
    }

    unsafe fn load_gdt(&self, _: &DescriptorTablePointer, _: SegmentSelector, _: SegmentSelector) {}

    unsafe fn load_idt(&self, _: &DescriptorTablePointer) {}

    unsafe fn read_port(&self, port: u16) -> u8 {
        self.io.borrow_mut().push(Io::In(port));
        if port == 0x21 { self.master_mask.get() } else { 0 }
    }

    unsafe fn write_port(&self, port: u16, value: u8) {
        if port == 0x21 {
            self.master_mask.set(value);
        }
        self.io.borrow_mut().push(Io::Out(port, value));
    }

    fn halt(&self) -> ! {
        panic!("halted");
    }
}

struct Trampolines;

impl EntryStubs for Trampolines {
    fn exception_entry(&self, vector: u8) -> EntryPoint {
        EntryPoint::from_addr(0xFFFF_FFFF_8010_0000 + u64::from(vector) * 16)
    }

    fn interrupt_entry(&self, vector: u8) -> EntryPoint {
        EntryPoint::from_addr(0xFFFF_FFFF_8020_0000 + u64::from(vector) * 16)
    }
}

unsafe extern "C" fn timer_stub() {}

fn loaded_tables(platform: &PortLog) -> &'static DescriptorTables {
    let tables = Box::leak(Box::new(DescriptorTables::new()));
    tables.load_gdt(platform).expect("gdt");
    tables.load_idt(platform, &Trampolines).expect("idt");
    platform.io.borrow_mut().clear();
    tables
}

#[test]
fn divisor_for_common_rates() {
    assert_eq!(PitTimer::new(1000, timer_stub).divisor(), 1193);
    assert_eq!(PitTimer::new(100, timer_stub).divisor(), 11931);
    // Too slow for a 16-bit counter.
    assert_eq!(PitTimer::new(10, timer_stub).divisor(), u16::MAX);
    assert_eq!(PitTimer::new(0, timer_stub).divisor(), u16::MAX);
}

#[test]
fn install_programs_pic_and_pit_then_unmasks_irq0_after_the_gate() {
    let platform = PortLog::default();
    let tables = loaded_tables(&platform);
    let timer = PitTimer::new(1000, timer_stub);

    timer
        .install(&GateInstaller::new(tables, &platform))
        .expect("timer installs");

    assert_eq!(
        platform.io(),
        [
            // ICW1..ICW4: master at 32, slave at 40, cascade on IRQ2
            Io::Out(0x20, 0x11),
            Io::Out(0xA0, 0x11),
            Io::Out(0x21, 32),
            Io::Out(0xA1, 40),
            Io::Out(0x21, 0x04),
            Io::Out(0xA1, 0x02),
            Io::Out(0x21, 0x01),
            Io::Out(0xA1, 0x01),
            // everything masked but the cascade
            Io::Out(0x21, 0xFB),
            Io::Out(0xA1, 0xFF),
            // channel 0, mode 3, divisor 1193 = 0x04A9
            Io::Out(0x43, 0x36),
            Io::Out(0x40, 0xA9),
            Io::Out(0x40, 0x04),
            // gate overwrite
            Io::Cli,
            Io::Sti,
            // IRQ0 unmasked last
            Io::In(0x21),
            Io::Out(0x21, 0xFA),
        ]
    );

    let idt = tables.idt().expect("idt").lock();
    assert_eq!(
        idt[TIMER_VECTOR].handler(),
        EntryPoint::from_fn(timer_stub).addr()
    );
}

#[test]
fn tick_counts_and_acknowledges_the_master_pic() {
    let platform = PortLog::default();
    let before = ticks();
    on_tick(&platform);
    on_tick(&platform);
    assert!(ticks() >= before + 2);
    assert_eq!(platform.outs(), [(0x20, 0x20), (0x20, 0x20)]);
}
