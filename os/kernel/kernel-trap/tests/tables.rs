mod common;

use common::{
    EXCEPTION_STUB_BASE, Event, FakeStubs, INTERRUPT_STUB_BASE, RecordingPlatform, SYSCALL_STUB,
    TIMER_STUB,
};
use kernel_trap::gdt::{KERNEL_CODE_SELECTOR, KERNEL_CS, KERNEL_DS};
use kernel_trap::idt::gate::GateType;
use kernel_trap::idt::{EntryPoint, Idt, SYSCALL_VECTOR, TIMER_VECTOR};
use kernel_trap::platform::Platform;
use kernel_trap::privilege::Ring;
use kernel_trap::{
    BringUpError, Collaborator, DescriptorError, DescriptorTables, GateInstaller, bring_up,
};

fn leak_tables() -> &'static DescriptorTables {
    Box::leak(Box::new(DescriptorTables::new()))
}

struct Timer;

impl Collaborator for Timer {
    fn name(&self) -> &'static str {
        "timer"
    }

    fn install(&self, gates: &GateInstaller<'_>) -> Result<(), BringUpError> {
        gates.install(TIMER_VECTOR, EntryPoint::from_addr(TIMER_STUB))?;
        unsafe { gates.platform().write_port(0x21, 0xFE) };
        Ok(())
    }
}

struct Greedy(u8);

impl Collaborator for Greedy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn install(&self, gates: &GateInstaller<'_>) -> Result<(), BringUpError> {
        gates.install(self.0, EntryPoint::from_addr(TIMER_STUB))
    }
}

#[test]
fn every_gate_targets_its_class_stub_in_kernel_code() {
    let idt = Idt::build(&FakeStubs).expect("valid table");
    for (vector, gate) in idt.iter() {
        assert_eq!(gate.selector(), KERNEL_CODE_SELECTOR, "vector {vector}");
        assert_eq!(gate.selector().into_bits(), KERNEL_CS);
        assert_eq!(gate.ist(), 0);
        assert_eq!(gate.reserved(), 0);
        assert_eq!(gate.attr().gate_type(), GateType::Interrupt);

        let base = if vector < 32 {
            EXCEPTION_STUB_BASE
        } else {
            INTERRUPT_STUB_BASE
        };
        assert_eq!(gate.handler(), base + u64::from(vector) * 16, "vector {vector}");
    }
}

#[test]
fn only_the_syscall_gate_admits_ring3() {
    let idt = Idt::build(&FakeStubs).expect("valid table");
    let user: Vec<u8> = idt
        .iter()
        .filter(|(_, g)| g.dpl() == Ring::Ring3)
        .map(|(v, _)| v)
        .collect();
    assert_eq!(user, [SYSCALL_VECTOR]);
    assert_eq!(idt[SYSCALL_VECTOR].attr().into_bits(), 0xEE);
    assert_eq!(idt[0].attr().into_bits(), 0x8E);
}

#[test]
fn bring_up_runs_in_fixed_order() {
    let tables = leak_tables();
    let platform = RecordingPlatform::default();

    bring_up(
        tables,
        &platform,
        &FakeStubs,
        &[&Timer],
        EntryPoint::from_addr(SYSCALL_STUB),
    )
    .expect("bring-up succeeds");

    let gdt = tables.gdt().expect("gdt loaded");
    let idt = tables.idt().expect("idt loaded");
    let idt_base = std::ptr::from_ref::<Idt>(&idt.lock()) as u64;

    assert_eq!(
        platform.events(),
        [
            Event::LoadGdt {
                base: (&raw const *gdt) as u64,
                limit: 23,
                code: KERNEL_CS,
                data: KERNEL_DS,
            },
            Event::LoadIdt {
                base: idt_base,
                limit: 4095,
            },
            Event::EnableInterrupts,
            // timer gate, then its device unmasked
            Event::DisableInterrupts,
            Event::EnableInterrupts,
            Event::WritePort(0x21, 0xFE),
            // syscall gate last
            Event::DisableInterrupts,
            Event::EnableInterrupts,
        ]
    );

    let idt = idt.lock();
    assert_eq!(idt[TIMER_VECTOR].handler(), TIMER_STUB);
    assert_eq!(idt[TIMER_VECTOR].dpl(), Ring::Ring0);
    assert_eq!(idt[SYSCALL_VECTOR].handler(), SYSCALL_STUB);
    assert_eq!(idt[SYSCALL_VECTOR].dpl(), Ring::Ring3);
    assert_eq!(idt[33].handler(), INTERRUPT_STUB_BASE + 33 * 16);
}

#[test]
fn gdt_null_entry_is_zero_once_loaded() {
    let tables = leak_tables();
    let platform = RecordingPlatform::default();
    let gdt = tables.load_gdt(&platform).expect("gdt loads");
    assert_eq!(gdt[0].as_bytes(), &[0; 8]);
}

#[test]
fn tables_load_only_once() {
    let tables = leak_tables();
    let platform = RecordingPlatform::default();

    tables.load_gdt(&platform).expect("first load");
    assert_eq!(
        tables.load_gdt(&platform).map(|_| ()),
        Err(BringUpError::GdtAlreadyLoaded)
    );

    tables.load_idt(&platform, &FakeStubs).expect("first load");
    assert_eq!(
        tables.load_idt(&platform, &FakeStubs),
        Err(BringUpError::IdtAlreadyLoaded)
    );
}

#[test]
fn idt_requires_gdt() {
    let tables = leak_tables();
    let platform = RecordingPlatform::default();
    assert_eq!(
        tables.load_idt(&platform, &FakeStubs),
        Err(BringUpError::GdtNotLoaded)
    );
    assert!(platform.events().is_empty());
}

#[test]
fn gate_install_requires_loaded_idt() {
    let tables = leak_tables();
    let platform = RecordingPlatform::default();
    assert_eq!(
        tables.install_gate(&platform, TIMER_VECTOR, EntryPoint::from_addr(TIMER_STUB)),
        Err(BringUpError::IdtNotLoaded)
    );
}

#[test]
fn collaborators_cannot_claim_reserved_vectors() {
    for (vector, expected) in [
        (SYSCALL_VECTOR, BringUpError::SyscallVectorReserved(SYSCALL_VECTOR)),
        (14, BringUpError::ExceptionVectorReserved(14)),
    ] {
        let tables = leak_tables();
        let platform = RecordingPlatform::default();
        let result = bring_up(
            tables,
            &platform,
            &FakeStubs,
            &[&Greedy(vector)],
            EntryPoint::from_addr(SYSCALL_STUB),
        );
        assert_eq!(result, Err(expected));

        let idt = tables.idt().expect("idt loaded").lock();
        assert_ne!(idt[vector].handler(), TIMER_STUB);
    }
}

#[test]
fn invalid_gate_is_rejected_and_interrupts_restored() {
    let tables = leak_tables();
    let platform = RecordingPlatform::default();
    tables.load_gdt(&platform).expect("gdt");
    tables.load_idt(&platform, &FakeStubs).expect("idt");
    platform.clear();

    let result = tables.install_gate(
        &platform,
        TIMER_VECTOR,
        EntryPoint::from_addr(0x0000_8000_0000_0000),
    );
    assert_eq!(
        result,
        Err(BringUpError::Descriptor(
            DescriptorError::NonCanonicalHandler(0x0000_8000_0000_0000)
        ))
    );
    assert_eq!(
        platform.events(),
        [Event::DisableInterrupts, Event::EnableInterrupts]
    );
    let idt = tables.idt().expect("idt").lock();
    assert_eq!(
        idt[TIMER_VECTOR].handler(),
        INTERRUPT_STUB_BASE + u64::from(TIMER_VECTOR) * 16
    );
}

#[test]
fn gate_install_keeps_interrupts_masked_if_they_were() {
    let tables = leak_tables();
    let platform = RecordingPlatform::default();
    tables.load_gdt(&platform).expect("gdt");
    tables.load_idt(&platform, &FakeStubs).expect("idt");
    platform.disable_interrupts();
    platform.clear();

    tables
        .install_gate(&platform, TIMER_VECTOR, EntryPoint::from_addr(TIMER_STUB))
        .expect("valid gate");

    assert_eq!(platform.events(), [Event::DisableInterrupts]);
    assert!(!platform.interrupts_enabled());
    let idt = tables.idt().expect("idt").lock();
    assert_eq!(idt[TIMER_VECTOR].handler(), TIMER_STUB);
}
