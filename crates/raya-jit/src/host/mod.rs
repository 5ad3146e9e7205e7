//! External contracts (§2 component H): the interpreter, GC, and native
//! dispatch are out of scope, but every emitter still needs to call back
//! into them at specific, well-defined points. These traits are that
//! seam — the host implements them; this crate only ever calls through
//! them.

use crate::bytecode::BodyId;
use crate::value::Value;

/// Opaque handle to a native (non-bytecode) function, resolved to a real
/// address by the host at finalization time. The JIT never dereferences
/// this itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeFunctionId(pub u64);

/// Where a live heap reference sits at a safepoint, so the GC can find
/// and update it if the object it points to moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerLocation {
    Register(u8),
    StackOffset(i32),
}

/// The GC's side of the contract a compiled block must uphold (§3
/// "gc offsets", §4.E ivar/allocation emitters).
pub trait GcCooperation {
    /// Report every live heap pointer in a block's embedded data at the
    /// offsets the block itself records in `gc_offsets`, so the GC can
    /// rewrite them after a moving collection.
    fn report_references(&self, code: &[u8], offsets: &[usize]) -> Vec<PointerLocation>;

    /// A safepoint marker a compiled block must be willing to stop at
    /// before making a call that can trigger collection (allocation,
    /// calling into a method that might allocate).
    fn prepare_routine_call(&self);
}

/// What it takes to resume the interpreter at a specific bytecode offset
/// after a side-exit (§3 "Side-exit"): the bytecode body, the PC to
/// resume at, and the live locals/stack the interpreter's own frame
/// layout expects.
#[derive(Debug, Clone)]
pub struct ResumeState {
    pub body_id: BodyId,
    pub pc: usize,
    pub locals: Vec<Value>,
    pub stack: Vec<Value>,
}

/// The interpreter's side of the contract: given a [`ResumeState`]
/// reconstructed by a side-exit, actually resume execution there. This
/// crate never calls the interpreter directly — every emitted side-exit
/// branch target is, from this crate's point of view, just a label that
/// the host wires up to an implementation of this trait.
pub trait InterpreterExit {
    fn resume(&self, state: ResumeState) -> Value;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;

    /// Records every resume request instead of actually re-entering an
    /// interpreter, for tests that only need to observe which side-exits
    /// fired.
    #[derive(Default)]
    pub struct RecordingExit {
        pub resumes: RefCell<Vec<ResumeState>>,
    }

    impl InterpreterExit for RecordingExit {
        fn resume(&self, state: ResumeState) -> Value {
            self.resumes.borrow_mut().push(state);
            Value::NIL
        }
    }
}
