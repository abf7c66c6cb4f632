use crate::entry::{TrapStubs, trap_syscall_entry};
use crate::kernel_main;
use crate::pit::PIT;
use crate::pmm::FRAME_ALLOCATOR;
use crate::vga::VGA;
use crate::x86::X86;
use kernel_devices::pit;
use kernel_qemu::{QemuLogger, qemu_trace};
use kernel_trap::display::Display;
use kernel_trap::idt::EntryPoint;
use kernel_trap::{DescriptorTables, bring_up};
use log::{LevelFilter, info, warn};
use stdlib::syscall::{brk, getpid};

/// Early boot stack size.
pub const BOOT_STACK_SIZE: usize = 64 * 1024;

/// A byte buffer with a guaranteed 16-byte alignment, backing the boot
/// stack so `RSP` starts out ABI aligned.
#[repr(align(16))]
struct Aligned16<const N: usize>([u8; N]);

/// The only kernel stack. Lives in `.bss.boot` and is addressed by name
/// from [`_start`].
#[unsafe(link_section = ".bss.boot")]
#[unsafe(no_mangle)]
static mut BOOT_STACK: Aligned16<BOOT_STACK_SIZE> = Aligned16([0; BOOT_STACK_SIZE]);

const _: () = assert!(
    BOOT_STACK_SIZE.is_multiple_of(16),
    "BOOT_STACK_SIZE should be 16-byte aligned"
);

/// Segment and vector tables. Never moved or freed once loaded.
static TABLES: DescriptorTables = DescriptorTables::new();

/// The kernel entry point.
///
/// Entered by the loader in 64-bit long mode with the low 16 MiB identity
/// mapped and interrupts disabled.
///
/// # Naked function & Stack
/// This is a naked function in order to set up the stack ourselves. Without
/// the `naked` attribute (and the [`naked_asm`](core::arch::naked_asm) instruction), Rust
/// compiler would apply its own assumptions based on the C ABI. Since we're replacing
/// the stack here, this would cause UB.
#[unsafe(no_mangle)]
#[unsafe(naked)]
#[unsafe(link_section = ".text._start")]
pub extern "C" fn _start() {
    core::arch::naked_asm!(
        "cli",
        // Build our own kernel stack and establish a valid call frame for kernel_entry
        "lea rax, [rip + {stack_sym}]",
        "add rax, {stack_size}",
        // Align down to 16
        "and rax, -16",
        // Set RSP to the prepared value
        "mov rsp, rax",
        // Emulate a CALL by pushing a dummy return address (so RSP % 16 == 8 at entry)
        "push 0",
        "xor rbp, rbp",
        // Jump to Rust entry and never return
        "jmp {rust_entry}",
        stack_sym = sym BOOT_STACK,
        stack_size = const BOOT_STACK_SIZE,
        rust_entry = sym kernel_entry_on_boot_stack,
    );
}

/// Kernel entry running on [`BOOT_STACK`].
extern "C" fn kernel_entry_on_boot_stack() -> ! {
    let logger = QemuLogger::new(LevelFilter::Debug);
    if logger.init().is_err() {
        qemu_trace!("a logger was already installed\n");
    }

    info!("Kernel reporting to QEMU! Bringing up trap handling ...");
    VGA.lock_irq().clear();
    {
        let frames = FRAME_ALLOCATOR.lock_irq();
        info!(
            "{} KiB of {} MiB physical memory free",
            frames.free_frames() * 4,
            frames.managed_bytes() / 1024 / 1024
        );
    }

    if let Err(e) = bring_up(
        &TABLES,
        &X86,
        &TrapStubs,
        &[&PIT],
        EntryPoint::from_fn(trap_syscall_entry),
    ) {
        panic!("bring-up failed: {e}");
    }

    syscall_self_check();

    info!(
        "Kernel early init is done ({} timer ticks so far), jumping into kernel main loop ...",
        pit::ticks()
    );
    kernel_main()
}

/// Runs one round trip through each non-exiting syscall from ring 0.
fn syscall_self_check() {
    stdlib::println!("Syscall interface ready.");

    match getpid() {
        Ok(pid) => info!("getpid() = {pid}"),
        Err(e) => warn!("getpid() failed: {e}"),
    }
    match brk(0) {
        Ok(brk) => info!("brk(0) = {brk:#x}"),
        Err(e) => warn!("brk(0) failed: {e}"),
    }
}
