//! Assumption tracking & invalidation (§4.G).
//!
//! Every emitter that relies on a speculative fact about the runtime
//! (a method hasn't been redefined, a basic op hasn't been redefined,
//! tracing is off, ...) registers that fact here against the block it
//! compiled. When the class subsystem (component A) or the host signals
//! that a fact no longer holds, this module walks the dependency sets and
//! patches every dependent block's entry point to force a side-exit.

mod assumptions;
mod patch;

pub use assumptions::{AssumptionKey, AssumptionTable, BasicOp};
pub use patch::{Invalidator, PatchPoint};

/// Receives notifications from component A when a mutation could violate a
/// registered assumption. Kept as a trait (rather than a concrete type)
/// so the class registry doesn't need to depend on this module's locking
/// strategy to compile and test in isolation.
pub trait InvalidationSink {
    fn notify(&mut self, key: AssumptionKey);
}

/// A sink that drops every notification; used by class-registry unit
/// tests that don't care about invalidation bookkeeping.
pub struct NullSink;

impl InvalidationSink for NullSink {
    fn notify(&mut self, _key: AssumptionKey) {}
}
