//! Entry stub for the timer on IRQ0. Programming lives in
//! [`kernel_devices::pit`].

use crate::x86::X86;
use kernel_devices::pit::{PitTimer, on_tick};
use kernel_trap::frame::TrapFrame;
use kernel_trap::idt::TIMER_VECTOR;

/// Timer frequency.
const TIMER_HZ: u32 = 1000;

pub static PIT: PitTimer = PitTimer::new(TIMER_HZ, pit_timer_entry);

#[unsafe(naked)]
unsafe extern "C" fn pit_timer_entry() {
    core::arch::naked_asm!(
        "push 0",
        "push {vector}",
        // Same layout as every other stub: the handler sees a TrapFrame.
        "push rax","push rbx","push rcx","push rdx","push rbp","push rsi","push rdi",
        "push r8","push r9","push r10","push r11","push r12","push r13","push r14","push r15",
        "cld",
        "mov rdi, rsp",
        "call {rust_handler}",
        "pop r15","pop r14","pop r13","pop r12","pop r11","pop r10","pop r9","pop r8",
        "pop rdi","pop rsi","pop rbp","pop rdx","pop rcx","pop rbx","pop rax",
        "add rsp, 16",
        "iretq",
        vector = const TIMER_VECTOR,
        rust_handler = sym pit_timer_handler,
    )
}

extern "C" fn pit_timer_handler(_frame: *mut TrapFrame) {
    on_tick(&X86);
}
