//! Pluggable memory operator for codec engines.

/// Allocation capability injected into engines and sessions.
///
/// Buffers handed out by `allocate` are zero-filled and exactly `len` bytes
/// long. Whatever is allocated should be handed back through `release` once
/// the owner is done with it.
pub trait MemoryOperator: Send + Sync {
    fn allocate(&self, len: usize) -> Vec<u8>;

    fn release(&self, buffer: Vec<u8>) {
        drop(buffer);
    }
}

/// Default operator backed by the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemory;

impl MemoryOperator for SystemMemory {
    fn allocate(&self, len: usize) -> Vec<u8> {
        vec![0u8; len]
    }
}
