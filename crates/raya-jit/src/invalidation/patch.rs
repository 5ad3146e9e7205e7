//! The three-step invalidation procedure (§4.G): patch the entry point,
//! unlink from the version registry, defer reclamation.

use super::{AssumptionKey, AssumptionTable, InvalidationSink};
use crate::version::BlockHandle;
use crate::version::registry::BlockRegistry;

/// Records that one block went through steps 1 and 2 of invalidation.
/// Step 3 (actually freeing the `CompiledBlock`) is a separate, later
/// call to [`BlockRegistry::reclaim`] — a block that's still on some
/// thread's native call stack must not be freed out from under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchPoint {
    pub block: BlockHandle,
    pub unlinked: bool,
}

/// Owns the assumption table and turns invalidation notifications into
/// patched, unlinked blocks. Kept separate from [`BlockRegistry`] so the
/// class subsystem (component A) can hold an `Invalidator` (via the
/// [`InvalidationSink`] trait) without also holding the code cache.
pub struct Invalidator {
    table: AssumptionTable,
    pending: Vec<AssumptionKey>,
}

impl Invalidator {
    pub fn new() -> Self {
        Invalidator { table: AssumptionTable::new(), pending: Vec::new() }
    }

    pub fn register(&mut self, key: AssumptionKey, block: BlockHandle) {
        self.table.register(key, block);
    }

    /// Apply steps 1-2 for every block depending on `key`.
    pub fn invalidate(&mut self, key: AssumptionKey, registry: &BlockRegistry) -> Vec<PatchPoint> {
        self.table
            .take_dependents(key)
            .into_iter()
            .map(|block| {
                registry.invalidate_block(block);
                PatchPoint { block, unlinked: true }
            })
            .collect()
    }

    /// Tracing activation invalidates every compiled block regardless of
    /// which assumptions they registered (§4.G special case): once
    /// tracing is live, every block must route through the interpreter so
    /// trace hooks fire.
    pub fn invalidate_all(&mut self, registry: &BlockRegistry) -> Vec<PatchPoint> {
        self.table
            .all_dependents()
            .into_iter()
            .map(|block| {
                registry.invalidate_block(block);
                PatchPoint { block, unlinked: true }
            })
            .collect()
    }

    /// Drain notifications queued via [`InvalidationSink::notify`] and
    /// apply them against `registry`. `TracingOff` firing is treated as
    /// the global special case above rather than a per-key lookup.
    pub fn drain_pending(&mut self, registry: &BlockRegistry) -> Vec<PatchPoint> {
        let keys = std::mem::take(&mut self.pending);
        let mut patched = Vec::new();
        for key in keys {
            if matches!(key, AssumptionKey::TracingOff) {
                patched.extend(self.invalidate_all(registry));
            } else {
                patched.extend(self.invalidate(key, registry));
            }
        }
        patched
    }
}

impl Default for Invalidator {
    fn default() -> Self {
        Invalidator::new()
    }
}

impl InvalidationSink for Invalidator {
    fn notify(&mut self, key: AssumptionKey) {
        self.pending.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::BodyId;
    use crate::context::Context;

    #[test]
    fn invalidate_unlinks_and_marks_block() {
        let registry = BlockRegistry::new();
        let mut invalidator = Invalidator::new();
        let handle = registry.insert_block(BodyId(1), 0, Context::new(), Vec::new());
        let key = AssumptionKey::TracingOff;
        invalidator.register(key, handle);

        let patched = invalidator.invalidate(key, &registry);
        assert_eq!(patched, vec![PatchPoint { block: handle, unlinked: true }]);
        assert!(registry.is_invalidated(handle));
        assert!(registry.lookup(BodyId(1), 0, &Context::new()).is_none());
    }

    #[test]
    fn tracing_notification_invalidates_everything() {
        let registry = BlockRegistry::new();
        let mut invalidator = Invalidator::new();
        let a = registry.insert_block(BodyId(1), 0, Context::new(), Vec::new());
        let b = registry.insert_block(BodyId(2), 0, Context::new(), Vec::new());
        invalidator.register(AssumptionKey::SingleRactorMode, a);
        invalidator.register(AssumptionKey::ConstantTableGeneration, b);

        invalidator.notify(AssumptionKey::TracingOff);
        let patched = invalidator.drain_pending(&registry);
        assert_eq!(patched.len(), 2);
        assert!(registry.is_invalidated(a));
        assert!(registry.is_invalidated(b));
    }
}
