//! Stack pool for reusing Stack allocations across task lifetimes.
//!
//! When a task completes, its Stack (which may have grown to hold hundreds of
//! values) is returned to the pool. The next spawned task acquires a recycled
//! Stack, reusing the existing Vec capacity and avoiding re-allocation.

use crate::vm::stack::Stack;
use parking_lot::Mutex;

/// Pool of reusable Stack objects.
///
/// Stacks retain their allocated Vec capacity when returned to the pool,
/// so subsequent tasks reuse the memory without re-allocating.
pub struct StackPool {
    stacks: Mutex<Vec<Stack>>,
    max_size: usize,
}

impl StackPool {
    /// Create a new pool that holds up to `max_size` stacks.
    pub fn new(max_size: usize) -> Self {
        Self {
            stacks: Mutex::new(Vec::with_capacity(max_size)),
            max_size,
        }
    }

    /// Get a stack from the pool, or create a new one.
    pub fn acquire(&self) -> Stack {
        self.stacks.lock().pop().unwrap_or_else(Stack::new)
    }

    /// Return a stack to the pool for reuse.
    pub fn release(&self, mut stack: Stack) {
        stack.reset();
        let mut pool = self.stacks.lock();
        if pool.len() < self.max_size {
            pool.push(stack);
        }
        // else: drop — pool is full
    }
}
