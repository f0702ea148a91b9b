//! Per-store id allocation.

use std::cell::Cell;

/// Monotonic id source owned by a single store.
///
/// Every store carries its own generator, so ids never leak between stores
/// or between tests.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: Cell<u64>,
}

impl IdGenerator {
    /// Generator whose first id is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next unique id.
    pub fn next_id(&self) -> u64 {
        let id = self.next.get();
        self.next.set(id + 1);
        id
    }
}
