/// A descriptor or gate rejected at construction time.
///
/// The CPU does not validate table entries until it uses them, and a bad
/// entry then surfaces as a triple fault. Everything below is checked before
/// a table is ever loaded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("segment limit {0:#x} does not fit in 20 bits")]
    LimitTooLarge(u32),
    #[error("descriptor is not marked present")]
    NotPresent,
    #[error("code/data descriptor has the system bit cleared")]
    SystemSegment,
    #[error("long-mode flag set on a data segment")]
    LongModeData,
    #[error("long-mode flag combined with 32-bit default operand size")]
    LongModeWithDefaultSize,
    #[error("gate has the code/data bit set")]
    NotAGate,
    #[error("interrupt stack table index {0} out of range (0..=7)")]
    IstOutOfRange(u8),
    #[error("gate handler address is null")]
    NullHandler,
    #[error("gate handler address {0:#018x} is not canonical")]
    NonCanonicalHandler(u64),
}
