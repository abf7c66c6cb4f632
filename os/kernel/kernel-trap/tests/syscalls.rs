mod common;

use common::{Event, Harness, expect_halt};
use kernel_trap::TrapFrame;
use kernel_trap::display::Color;
use kernel_trap::syscall::process::MAX_HEAP_PAGES;
use kernel_trap::syscall::{ProcessConfig, SyscallDispatcher, SyscallRequest};
use stdlib::syscall_abi::{Errno, STDERR, STDIN, STDOUT, Sysno};

const BREAK_START: u64 = 0x40_0000;
const BREAK_LIMIT: u64 = 0x80_0000;

fn dispatcher() -> SyscallDispatcher {
    SyscallDispatcher::new(ProcessConfig::DEFAULT)
}

/// Loads a request into a frame, dispatches it and reads the result back.
fn trap(d: &mut SyscallDispatcher, h: &mut Harness, number: u64, args: [u64; 3]) -> i64 {
    let mut frame = TrapFrame::for_syscall(number, args);
    d.dispatch(&mut frame, &mut h.env());
    frame.syscall_result()
}

fn write(d: &mut SyscallDispatcher, h: &mut Harness, fd: u64, buf: &[u8], count: u64) -> i64 {
    trap(d, h, Sysno::Write as u64, [fd, buf.as_ptr() as u64, count])
}

#[allow(clippy::cast_sign_loss)]
fn brk(d: &mut SyscallDispatcher, h: &mut Harness, increment: i64) -> i64 {
    trap(d, h, Sysno::Brk as u64, [increment as u64, 0, 0])
}

#[test]
fn write_forwards_bytes_in_order() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    assert_eq!(write(&mut d, &mut h, STDOUT, b"AB", 2), 2);
    assert_eq!(h.screen.text(), "AB");
}

#[test]
fn write_to_stderr_is_accepted() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    assert_eq!(write(&mut d, &mut h, STDERR, b"oops!", 4), 4);
    assert_eq!(h.screen.text(), "oops");
}

#[test]
fn write_rejects_other_descriptors() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    for fd in [STDIN, 5, 1 << 32 | STDOUT, u64::MAX] {
        assert_eq!(write(&mut d, &mut h, fd, b"X", 1), Errno::InvalidFd.code());
    }
    assert!(h.screen.is_empty());
}

#[test]
fn write_null_buffer_fails_regardless_of_count() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    for count in [0, 1, 5, u64::MAX] {
        let r = trap(&mut d, &mut h, Sysno::Write as u64, [STDOUT, 0, count]);
        assert_eq!(r, -3, "count {count}");
    }
    // null buffer wins over a bad descriptor too
    let r = trap(&mut d, &mut h, Sysno::Write as u64, [9, 0, 5]);
    assert_eq!(r, -3);
    assert!(h.screen.is_empty());
}

#[test]
fn zero_length_write_succeeds_without_output() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    assert_eq!(write(&mut d, &mut h, STDOUT, b"AB", 0), 0);
    assert!(h.screen.is_empty());
}

#[test]
fn write_rejects_impossible_ranges() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    let r = trap(&mut d, &mut h, Sysno::Write as u64, [STDOUT, 0x1000, u64::MAX]);
    assert_eq!(r, Errno::InvalidCount.code());
    let r = trap(
        &mut d,
        &mut h,
        Sysno::Write as u64,
        [STDOUT, u64::MAX - 1, 16],
    );
    assert_eq!(r, Errno::InvalidBuffer.code());
    assert!(h.screen.is_empty());
}

#[test]
fn read_is_not_implemented() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    let mut buf = [0u8; 4];
    let r = trap(
        &mut d,
        &mut h,
        Sysno::Read as u64,
        [STDIN, buf.as_mut_ptr() as u64, 4],
    );
    assert_eq!(r, -99);
    assert_eq!(buf, [0; 4]);
}

#[test]
fn getpid_is_constant() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    let first = trap(&mut d, &mut h, Sysno::GetPid as u64, [0; 3]);
    assert_eq!(first, 1);
    for _ in 0..3 {
        assert_eq!(trap(&mut d, &mut h, Sysno::GetPid as u64, [7, 8, 9]), first);
    }
}

#[test]
fn brk_zero_is_idempotent() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    let b = brk(&mut d, &mut h, 0);
    assert_eq!(b, 0x40_0000);
    assert_eq!(brk(&mut d, &mut h, 0), b);
    assert_eq!(brk(&mut d, &mut h, 0), b);
    assert_eq!(h.pages.allocations, 0);
}

#[test]
fn brk_moves_within_window() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    assert_eq!(brk(&mut d, &mut h, 0x2000), 0x40_2000);
    assert_eq!(brk(&mut d, &mut h, 0x10), 0x40_2010);
    assert_eq!(d.process().heap_pages(), 3);
    assert_eq!(brk(&mut d, &mut h, -0x2010), 0x40_0000);
    assert_eq!(d.process().heap_pages(), 0);
    assert_eq!(h.pages.freed.len(), 3);
}

#[test]
fn brk_reaches_both_window_edges() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    let span = i64::try_from(BREAK_LIMIT - BREAK_START).expect("fits");
    assert_eq!(brk(&mut d, &mut h, span), 0x80_0000);
    assert_eq!(d.process().heap_pages(), MAX_HEAP_PAGES);
    assert_eq!(brk(&mut d, &mut h, -span), 0x40_0000);
}

#[test]
fn brk_outside_window_fails_without_moving() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    assert_eq!(brk(&mut d, &mut h, 0x1000), 0x40_1000);

    for increment in [-0x2000, 0x40_0000, i64::MAX, i64::MIN] {
        assert_eq!(brk(&mut d, &mut h, increment), -5, "increment {increment:#x}");
        assert_eq!(brk(&mut d, &mut h, 0), 0x40_1000);
    }
    assert_eq!(d.process().heap_pages(), 1);
}

#[test]
fn brk_out_of_frames_rolls_back() {
    let (mut d, mut h) = (dispatcher(), Harness::with_frames(2));
    assert_eq!(brk(&mut d, &mut h, 0x1000), 0x40_1000);

    assert_eq!(brk(&mut d, &mut h, 0x3000), Errno::NoMemory.code());
    assert_eq!(brk(&mut d, &mut h, 0), 0x40_1000);
    assert_eq!(d.process().heap_pages(), 1);
    assert_eq!(h.pages.available(), 1);
}

#[test]
fn unknown_syscall_only_touches_rax() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    let mut frame = TrapFrame::for_syscall(255, [1, 2, 3]);
    frame.rbx = 0x1111;
    frame.rip = 0x2222;
    let before = frame;

    d.dispatch(&mut frame, &mut h.env());

    assert_eq!(frame.syscall_result(), -1);
    assert_eq!(
        TrapFrame {
            rax: before.rax,
            ..frame
        },
        before
    );
    assert!(h.screen.is_empty());
    assert!(h.platform.events().is_empty());
    assert_eq!(brk(&mut d, &mut h, 0), 0x40_0000);
}

#[test]
fn frame_dispatch_matches_direct_execution() {
    let text = b"hello";
    let requests = [
        (Sysno::Write as u64, [STDOUT, text.as_ptr() as u64, 5]),
        (Sysno::Write as u64, [7, text.as_ptr() as u64, 5]),
        (Sysno::Write as u64, [STDOUT, 0, 5]),
        (Sysno::Read as u64, [STDIN, text.as_ptr() as u64, 5]),
        (Sysno::GetPid as u64, [0, 0, 0]),
        (Sysno::Brk as u64, [0x1800, 0, 0]),
        (Sysno::Brk as u64, [0, 0, 0]),
        (Sysno::Brk as u64, [0x100_0000, 0, 0]),
        (Sysno::Brk as u64, [(-0x1800_i64).cast_unsigned(), 0, 0]),
        (0, [0, 0, 0]),
        (99, [1, 2, 3]),
    ];

    let (mut via_frame, mut h1) = (dispatcher(), Harness::new());
    let (mut direct, mut h2) = (dispatcher(), Harness::new());
    for (number, args) in requests {
        let a = trap(&mut via_frame, &mut h1, number, args);
        let b = direct.execute(SyscallRequest::new(number, args), &mut h2.env());
        assert_eq!(a, b, "syscall {number} {args:x?}");
    }
    assert_eq!(h1.screen.text(), h2.screen.text());
}

#[test]
fn exit_renders_status_and_halts() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    expect_halt(|| {
        trap(&mut d, &mut h, Sysno::Exit as u64, [0, 0, 0]);
    });
    assert_eq!(h.platform.events(), [Event::Halt]);
    assert_eq!(
        h.screen.text_in(Color::Yellow),
        "\nProcess exited with status: 0 (success)\n"
    );
    assert_eq!(h.screen.text_in(Color::White), "System halted.\n");
}

#[test]
fn exit_with_error_status() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    expect_halt(|| {
        trap(&mut d, &mut h, Sysno::Exit as u64, [42, 0, 0]);
    });
    assert!(h.screen.text().contains("status: 42 (error)"));
}

#[test]
fn exit_with_negative_status() {
    let (mut d, mut h) = (dispatcher(), Harness::new());
    expect_halt(|| {
        trap(&mut d, &mut h, Sysno::Exit as u64, [(-1_i64) as u64, 0, 0]);
    });
    assert_eq!(
        h.screen.text_in(Color::Yellow),
        "\nProcess exited with status: -1 (error)\n"
    );
    assert_eq!(h.screen.text_in(Color::White), "System halted.\n");
}
