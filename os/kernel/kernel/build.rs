use std::{env, path::PathBuf};

/// Load address of the kernel image; the loader identity maps the low 16 MiB.
const KERNEL_LOAD: u64 = 0x10_0000;

fn main() {
    // Point to the linker script
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR"));
    let ld = manifest_dir.join("kernel.ld");

    // Sanity check (fail fast during build)
    assert_eq!(
        KERNEL_LOAD & 0xfff,
        0,
        "KERNEL_LOAD must be 4 KiB aligned (got {KERNEL_LOAD:#x})"
    );

    // Rebuild when inputs change
    println!("cargo:rerun-if-changed={}", ld.display());

    // Only the bare-metal build is linked with our script; host builds
    // (clippy, docs) keep the default layout.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        println!("cargo:rustc-link-arg-bins=-T{}", ld.display());
        println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_LOAD={KERNEL_LOAD:#x}");
    }
}
