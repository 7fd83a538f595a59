use std::fmt;

/// Reason a memory access was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemoryErrorKind {
    /// The address is lower than the base address of the memory window.
    BelowBase,
    /// The address is not a multiple of the word size away from the base address.
    Unaligned,
    /// The address is past the last word of the memory window.
    OutOfRange,
}

/// Error returned by [Memory](crate::emulator::Memory) implementations.
///
/// The emulator never aborts on these. A failed read leaves the destination register untouched
/// and a failed write is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryError {
    pub address: u32,
    pub kind: MemoryErrorKind,
}

impl fmt::Display for MemoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemoryErrorKind::BelowBase => write!(f, "below the memory base"),
            MemoryErrorKind::Unaligned => write!(f, "not word aligned"),
            MemoryErrorKind::OutOfRange => write!(f, "past the end of memory"),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid address 0x{:x}: {}", self.address, self.kind)
    }
}

impl std::error::Error for MemoryError {}
