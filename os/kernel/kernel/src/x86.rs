//! [`Platform`] for the bootstrap processor.

use kernel_sync::irq::{cli_stop_interrupts, interrupts_enabled, sti_enable_interrupts};
use kernel_trap::gdt::selectors::SegmentSelector;
use kernel_trap::platform::Platform;
use kernel_trap::pointer::DescriptorTablePointer;

/// The running CPU.
pub struct X86;

impl Platform for X86 {
    #[inline]
    fn enable_interrupts(&self) {
        sti_enable_interrupts();
    }

    #[inline]
    fn disable_interrupts(&self) {
        cli_stop_interrupts();
    }

    #[inline]
    fn interrupts_enabled(&self) -> bool {
        interrupts_enabled()
    }

    unsafe fn load_gdt(
        &self,
        pointer: &DescriptorTablePointer,
        code: SegmentSelector,
        data: SegmentSelector,
    ) {
        unsafe {
            core::arch::asm!(
                "lgdt [{}]",
                in(reg) core::ptr::from_ref(pointer),
                options(readonly, nostack, preserves_flags)
            );

            // Refresh data segments to kernel data
            core::arch::asm!(
                "mov ds, {0:x}",
                "mov es, {0:x}",
                "mov fs, {0:x}",
                "mov gs, {0:x}",
                "mov ss, {0:x}",
                in(reg) data.into_bits(),
                options(nostack, preserves_flags)
            );

            // Far reload of CS. Use retfq trick in long mode.
            core::arch::asm!(
                // push target CS and RIP, then far return
                "push {cs}",
                "lea rax, [rip + 2f]",
                "push rax",
                "retfq",
                "2:",
                cs = in(reg) u64::from(code.into_bits()),
                out("rax") _,
            );
        }
    }

    unsafe fn load_idt(&self, pointer: &DescriptorTablePointer) {
        unsafe {
            core::arch::asm!(
                "lidt [{}]",
                in(reg) core::ptr::from_ref(pointer),
                options(readonly, nostack, preserves_flags)
            );
        }
    }

    unsafe fn read_port(&self, port: u16) -> u8 {
        let value: u8;
        unsafe {
            core::arch::asm!(
                "in al, dx",
                in("dx") port,
                out("al") value,
                options(nomem, nostack, preserves_flags)
            );
        }
        value
    }

    unsafe fn write_port(&self, port: u16, value: u8) {
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") port,
                in("al") value,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    fn halt(&self) -> ! {
        loop {
            unsafe {
                core::arch::asm!("cli", "hlt", options(nostack));
            }
        }
    }
}

/// `sti; hlt`: sleeps until the next interrupt with `IF` set.
#[inline]
pub fn wait_for_interrupt() {
    unsafe {
        core::arch::asm!("sti", "hlt", options(nostack));
    }
}
