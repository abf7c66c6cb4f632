#![allow(dead_code)]

use kernel_trap::display::{Color, Display};
use kernel_trap::gdt::selectors::SegmentSelector;
use kernel_trap::idt::{EntryPoint, EntryStubs};
use kernel_trap::platform::{PAGE_SIZE, PageAllocator, Platform};
use kernel_trap::pointer::DescriptorTablePointer;
use kernel_trap::syscall::SyscallEnv;
use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};

pub const EXCEPTION_STUB_BASE: u64 = 0xFFFF_FFFF_8010_0000;
pub const INTERRUPT_STUB_BASE: u64 = 0xFFFF_FFFF_8020_0000;
pub const SYSCALL_STUB: u64 = 0xFFFF_FFFF_8030_0000;
pub const TIMER_STUB: u64 = 0xFFFF_FFFF_8030_0100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    EnableInterrupts,
    DisableInterrupts,
    LoadGdt {
        base: u64,
        limit: u16,
        code: u16,
        data: u16,
    },
    LoadIdt {
        base: u64,
        limit: u16,
    },
    ReadPort(u16),
    WritePort(u16, u8),
    Halt,
}

/// Records every seam call. `halt` panics so tests can observe it.
#[derive(Default)]
pub struct RecordingPlatform {
    events: RefCell<Vec<Event>>,
    interrupts: Cell<bool>,
}

impl RecordingPlatform {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn port_writes(&self) -> Vec<(u16, u8)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::WritePort(port, value) => Some((port, value)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, e: Event) {
        self.events.borrow_mut().push(e);
    }
}

impl Platform for RecordingPlatform {
    fn enable_interrupts(&self) {
        self.interrupts.set(true);
        self.record(Event::EnableInterrupts);
    }

    fn disable_interrupts(&self) {
        self.interrupts.set(false);
        self.record(Event::DisableInterrupts);
    }

    fn interrupts_enabled(&self) -> bool {
        self.interrupts.get()
    }

    unsafe fn load_gdt(
        &self,
        pointer: &DescriptorTablePointer,
        code: SegmentSelector,
        data: SegmentSelector,
    ) {
        self.record(Event::LoadGdt {
            base: pointer.base(),
            limit: pointer.limit(),
            code: code.into_bits(),
            data: data.into_bits(),
        });
    }

    unsafe fn load_idt(&self, pointer: &DescriptorTablePointer) {
        self.record(Event::LoadIdt {
            base: pointer.base(),
            limit: pointer.limit(),
        });
    }

    unsafe fn read_port(&self, port: u16) -> u8 {
        self.record(Event::ReadPort(port));
        0
    }

    unsafe fn write_port(&self, port: u16, value: u8) {
        self.record(Event::WritePort(port, value));
    }

    fn halt(&self) -> ! {
        self.record(Event::Halt);
        panic!("halted");
    }
}

/// Runs `f`, expecting it to end in [`Platform::halt`].
pub fn expect_halt(f: impl FnOnce()) {
    let outcome = catch_unwind(AssertUnwindSafe(f));
    let payload = outcome.expect_err("expected the platform to halt");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"halted"));
}

/// Captures output together with the foreground color of every byte.
pub struct Screen {
    pub cells: Vec<(u8, Color, Color)>,
    pub clears: usize,
    color: (Color, Color),
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            clears: 0,
            color: (Color::White, Color::Black),
        }
    }
}

impl Screen {
    pub fn text(&self) -> String {
        self.cells.iter().map(|&(b, _, _)| char::from(b)).collect()
    }

    pub fn text_in(&self, fg: Color) -> String {
        self.cells
            .iter()
            .filter(|&&(_, f, _)| f == fg)
            .map(|&(b, _, _)| char::from(b))
            .collect()
    }

    pub fn color(&self) -> (Color, Color) {
        self.color
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Display for Screen {
    fn print_char(&mut self, byte: u8) {
        self.cells.push((byte, self.color.0, self.color.1));
    }

    fn set_color(&mut self, foreground: Color, background: Color) {
        self.color = (foreground, background);
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.clears += 1;
    }
}

/// A finite pool of page frames.
pub struct FramePool {
    free: Vec<u64>,
    pub freed: Vec<u64>,
    pub allocations: usize,
}

impl FramePool {
    pub fn with_frames(n: u64) -> Self {
        Self {
            free: (0..n).rev().map(|i| 0x100_0000 + i * PAGE_SIZE).collect(),
            freed: Vec::new(),
            allocations: 0,
        }
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

impl PageAllocator for FramePool {
    fn allocate_page(&mut self) -> u64 {
        self.allocations += 1;
        self.free.pop().unwrap_or(0)
    }

    fn free_page(&mut self, address: u64) {
        self.freed.push(address);
        self.free.push(address);
    }
}

/// Everything a syscall can touch, owned in one place.
pub struct Harness {
    pub screen: Screen,
    pub platform: RecordingPlatform,
    pub pages: FramePool,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_frames(2048)
    }

    pub fn with_frames(n: u64) -> Self {
        Self {
            screen: Screen::default(),
            platform: RecordingPlatform::default(),
            pages: FramePool::with_frames(n),
        }
    }

    pub fn env(&mut self) -> SyscallEnv<'_> {
        SyscallEnv {
            display: &mut self.screen,
            platform: &self.platform,
            pages: &mut self.pages,
        }
    }
}

/// 16-byte spaced fake trampolines, one region per class.
pub struct FakeStubs;

impl EntryStubs for FakeStubs {
    fn exception_entry(&self, vector: u8) -> EntryPoint {
        EntryPoint::from_addr(EXCEPTION_STUB_BASE + u64::from(vector) * 16)
    }

    fn interrupt_entry(&self, vector: u8) -> EntryPoint {
        EntryPoint::from_addr(INTERRUPT_STUB_BASE + u64::from(vector) * 16)
    }
}
