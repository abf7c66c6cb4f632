//! Trap entry stubs.
//!
//! Every vector gets a 16-byte trampoline in `trap_entry_table` that pushes
//! a zero error code (unless the CPU pushes one for that vector) and the
//! vector number, then jumps to the common save path for its class. The
//! save path pushes the general purpose registers in the order that makes
//! the stack image a [`TrapFrame`] and calls the Rust dispatcher with a
//! pointer to it.
//!
//! On entry the CPU aligns `RSP` to 16 before pushing its five-word frame.
//! Adding the error code, the vector and 15 registers leaves `RSP` 16-byte
//! aligned again at the `call`, as the System V ABI requires.

use crate::pmm::FRAME_ALLOCATOR;
use crate::vga::{self, VGA};
use crate::x86::X86;
use kernel_sync::SpinMutex;
use kernel_trap::TrapFrame;
use kernel_trap::exceptions::{ERROR_CODE_VECTORS, handle_exception};
use kernel_trap::idt::{EntryPoint, EntryStubs, SYSCALL_VECTOR};
use kernel_trap::interrupts::handle_interrupt;
use kernel_trap::syscall::{ProcessConfig, SyscallDispatcher, SyscallEnv};

/// Distance between two trampolines in `trap_entry_table`.
const STUB_STRIDE: u64 = 16;

/// Syscall state of the single process.
static DISPATCHER: SpinMutex<SyscallDispatcher> =
    SpinMutex::new(SyscallDispatcher::new(ProcessConfig::DEFAULT));

core::arch::global_asm!(
    ".macro trap_save_registers",
    "push rax", "push rbx", "push rcx", "push rdx", "push rbp", "push rsi", "push rdi",
    "push r8", "push r9", "push r10", "push r11", "push r12", "push r13", "push r14", "push r15",
    ".endm",

    ".macro trap_restore_registers",
    "pop r15", "pop r14", "pop r13", "pop r12", "pop r11", "pop r10", "pop r9", "pop r8",
    "pop rdi", "pop rsi", "pop rbp", "pop rdx", "pop rcx", "pop rbx", "pop rax",
    ".endm",

    // One trampoline; the error-code bit is looked up for vectors 0..32.
    ".macro trap_stub vector",
    ".p2align 4",
    ".if \\vector < 32",
    ".if (({error_mask} >> \\vector) & 1) == 0",
    "push 0",
    ".endif",
    "push \\vector",
    "jmp trap_exception_common",
    ".else",
    "push 0",
    "push \\vector",
    "jmp trap_interrupt_common",
    ".endif",
    ".endm",

    ".pushsection .text.trap_entry, \"ax\", @progbits",
    ".p2align 4",
    ".global trap_entry_table",
    "trap_entry_table:",
    ".altmacro",
    ".set trap_vector, 0",
    ".rept 256",
    "trap_stub %trap_vector",
    ".set trap_vector, trap_vector + 1",
    ".endr",
    ".noaltmacro",

    "trap_exception_common:",
    "trap_save_registers",
    "cld",
    "mov rdi, rsp",
    "call {exception_dispatch}",
    "ud2",

    "trap_interrupt_common:",
    "trap_save_registers",
    "cld",
    "mov rdi, rsp",
    "call {interrupt_dispatch}",
    "trap_restore_registers",
    // Drop vector and error code.
    "add rsp, 16",
    "iretq",

    ".global trap_syscall_entry",
    ".p2align 4",
    "trap_syscall_entry:",
    "push 0",
    "push {syscall_vector}",
    "trap_save_registers",
    "cld",
    "mov rdi, rsp",
    "call {syscall_dispatch}",
    "trap_restore_registers",
    "add rsp, 16",
    "iretq",
    ".popsection",

    error_mask = const ERROR_CODE_VECTORS,
    syscall_vector = const SYSCALL_VECTOR,
    exception_dispatch = sym exception_dispatch,
    interrupt_dispatch = sym interrupt_dispatch,
    syscall_dispatch = sym syscall_dispatch,
);

unsafe extern "C" {
    /// Start of the 256 trampolines.
    fn trap_entry_table();

    /// `int 0x80` entry; installed over the syscall vector's trampoline.
    pub fn trap_syscall_entry();
}

/// The trampolines in `trap_entry_table`.
pub struct TrapStubs;

impl TrapStubs {
    fn trampoline(vector: u8) -> EntryPoint {
        let base = EntryPoint::from_fn(trap_entry_table).addr();
        EntryPoint::from_addr(base + STUB_STRIDE * u64::from(vector))
    }
}

impl EntryStubs for TrapStubs {
    fn exception_entry(&self, vector: u8) -> EntryPoint {
        Self::trampoline(vector)
    }

    fn interrupt_entry(&self, vector: u8) -> EntryPoint {
        Self::trampoline(vector)
    }
}

/// Vectors `0..32`. Never returns.
extern "C" fn exception_dispatch(frame: *const TrapFrame) -> ! {
    let frame = unsafe { &*frame };
    let mut display = vga::steal();
    handle_exception(frame, &mut *display, &X86)
}

/// Vectors `32..=255` with no dedicated stub.
extern "C" fn interrupt_dispatch(frame: *const TrapFrame) {
    let frame = unsafe { &*frame };
    let mut display = VGA.lock();
    handle_interrupt(frame, &mut *display, &X86);
}

/// `int 0x80`. The result is written back into the saved `rax`.
extern "C" fn syscall_dispatch(frame: *mut TrapFrame) {
    let frame = unsafe { &mut *frame };
    let mut display = VGA.lock();
    let mut frames = FRAME_ALLOCATOR.lock();
    let mut env = SyscallEnv {
        display: &mut *display,
        platform: &X86,
        pages: &mut *frames,
    };
    DISPATCHER.lock().dispatch(frame, &mut env);
}
