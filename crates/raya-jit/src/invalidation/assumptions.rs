//! The trackable assumption set and the table mapping each assumption to
//! the blocks that depend on it.

use crate::class::ClassId;
use crate::class::method::Symbol;
use crate::value::ValueKind;
use crate::version::BlockHandle;
use rustc_hash::FxHashMap;

/// A built-in operation the JIT assumes has not been redefined unless
/// told otherwise (e.g. integer `+`, array `[]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicOp {
    IntegerPlus,
    IntegerMinus,
    IntegerCompare,
    IntegerEquals,
    StringEquals,
    ArrayIndex,
    HashIndex,
}

/// One trackable fact a compiled block's correctness depends on (§4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssumptionKey {
    /// Method lookup for `(class_id, method)` resolves the same way.
    MethodLookup { class_id: ClassId, method: Symbol },
    /// No basic op of this (receiver kind, operation) pair has been
    /// redefined.
    BasicOpNotRedefined { kind: ValueKind, op: BasicOp },
    /// The host is running with a single ractor (constant inline caches
    /// demand this).
    SingleRactorMode,
    /// The constant-table generation counter is unchanged.
    ConstantTableGeneration,
    /// Tracing events are not enabled globally.
    TracingOff,
    /// A class's allocator function pointer is unchanged (affects the ivar
    /// embed-vs-extended fast path).
    AllocatorChanged { class_id: ClassId },
}

/// Maps each assumption to the set of blocks whose compiled code depends
/// on it still holding.
#[derive(Default)]
pub struct AssumptionTable {
    dependents: FxHashMap<AssumptionKey, Vec<BlockHandle>>,
}

impl AssumptionTable {
    pub fn new() -> Self {
        AssumptionTable::default()
    }

    /// Register that `block` depends on `key` still holding.
    pub fn register(&mut self, key: AssumptionKey, block: BlockHandle) {
        let deps = self.dependents.entry(key).or_default();
        if !deps.contains(&block) {
            deps.push(block);
        }
    }

    /// All blocks depending on `key`, removing the entry (the caller is
    /// about to invalidate every one of them; once invalidated a block is
    /// unlinked from the version registry and can't be re-invalidated).
    pub fn take_dependents(&mut self, key: AssumptionKey) -> Vec<BlockHandle> {
        self.dependents.remove(&key).unwrap_or_default()
    }

    /// Every block depending on any assumption at all — used for the
    /// "tracing activation invalidates everything" special case (§4.G).
    pub fn all_dependents(&mut self) -> Vec<BlockHandle> {
        let mut out = Vec::new();
        for (_, blocks) in self.dependents.drain() {
            out.extend(blocks);
        }
        out
    }

    #[cfg(test)]
    pub fn dependents_of(&self, key: AssumptionKey) -> &[BlockHandle] {
        self.dependents.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}
