//! Thread-safe registry of compiled blocks and stubs, keyed by
//! `(bytecode body, offset)` with further disambiguation by context
//! (§4.C). Locking strategy mirrors the engine's own JIT code cache: one
//! `RwLock` around the maps, atomic counters for handle allocation.

use super::block::{CompiledBlock, OutEdge, Stub};
use super::{BlockHandle, StubHandle};
use crate::bytecode::BodyId;
use crate::context::Context;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

type VersionKey = (BodyId, usize);

struct Inner {
    blocks: FxHashMap<BlockHandle, CompiledBlock>,
    stubs: FxHashMap<StubHandle, Stub>,
    versions: FxHashMap<VersionKey, Vec<BlockHandle>>,
}

pub struct BlockRegistry {
    inner: RwLock<Inner>,
    next_block_id: AtomicU64,
    next_stub_id: AtomicU64,
}

impl BlockRegistry {
    pub fn new() -> Self {
        BlockRegistry {
            inner: RwLock::new(Inner {
                blocks: FxHashMap::default(),
                stubs: FxHashMap::default(),
                versions: FxHashMap::default(),
            }),
            next_block_id: AtomicU64::new(0),
            next_stub_id: AtomicU64::new(0),
        }
    }

    /// Register a freshly compiled block as a new version for
    /// `(body_id, offset)`.
    pub fn insert_block(&self, body_id: BodyId, offset: usize, entry_context: Context, code: Vec<u8>) -> BlockHandle {
        let handle = BlockHandle(self.next_block_id.fetch_add(1, Ordering::Relaxed));
        let start_offset = offset;
        let block = CompiledBlock::new(handle, body_id, start_offset, start_offset, entry_context, code);
        let mut inner = self.inner.write();
        inner.blocks.insert(handle, block);
        inner.versions.entry((body_id, offset)).or_default().push(handle);
        handle
    }

    /// Register a stub guarding `target_offset` under `target_context`
    /// (§3 "Stub") — created when a guard's chain-depth limit hasn't been
    /// reached yet and the deeper version isn't compiled.
    pub fn insert_stub(&self, body_id: BodyId, target_offset: usize, target_context: Context) -> StubHandle {
        let handle = StubHandle(self.next_stub_id.fetch_add(1, Ordering::Relaxed));
        let stub = Stub::new(handle, body_id, target_offset, target_context);
        self.inner.write().stubs.insert(handle, stub);
        handle
    }

    /// §4.C lookup: an exact context match wins; otherwise the first
    /// live version whose entry context strictly generalizes `query`.
    /// Invalidated versions are skipped as if they didn't exist.
    pub fn lookup(&self, body_id: BodyId, offset: usize, query: &Context) -> Option<BlockHandle> {
        let inner = self.inner.read();
        let versions = inner.versions.get(&(body_id, offset))?;
        let live = |h: &&BlockHandle| inner.blocks.get(h).map(|b| !b.is_invalidated()).unwrap_or(false);

        if let Some(&exact) = versions.iter().filter(live).find(|h| inner.blocks[h].entry_context == *query) {
            return Some(exact);
        }
        versions
            .iter()
            .filter(live)
            .find(|h| inner.blocks[h].entry_context.generalizes(query))
            .copied()
    }

    /// Deepest chain depth among live versions at `(body_id, offset)`,
    /// used to enforce the per-guard-kind chain limit before compiling
    /// yet another version (§4.C).
    pub fn chain_depth_at(&self, body_id: BodyId, offset: usize) -> u8 {
        let inner = self.inner.read();
        inner
            .versions
            .get(&(body_id, offset))
            .into_iter()
            .flatten()
            .filter_map(|h| inner.blocks.get(h))
            .filter(|b| !b.is_invalidated())
            .map(|b| b.entry_context.chain_depth)
            .max()
            .unwrap_or(0)
    }

    pub fn is_invalidated(&self, handle: BlockHandle) -> bool {
        self.inner.read().blocks.get(&handle).map(CompiledBlock::is_invalidated).unwrap_or(true)
    }

    /// Steps 1-2 of §4.G invalidation: flip the block's invalidated flag
    /// and unlink it from its version list so future lookups skip it.
    /// The `CompiledBlock` itself stays in `blocks` until [`Self::reclaim`]
    /// runs — deferred reclamation, step 3.
    pub fn invalidate_block(&self, handle: BlockHandle) {
        let mut inner = self.inner.write();
        if let Some(block) = inner.blocks.get_mut(&handle) {
            block.mark_invalidated();
        }
        for versions in inner.versions.values_mut() {
            versions.retain(|h| *h != handle);
        }
    }

    /// Step 3: free every invalidated block's storage. Callers run this
    /// only once the host confirms no native frame is still executing the
    /// old code (the JIT's `host::GcCooperation` safepoint contract).
    pub fn reclaim(&self) -> usize {
        let mut inner = self.inner.write();
        let before = inner.blocks.len();
        inner.blocks.retain(|_, b| !b.is_invalidated());
        before - inner.blocks.len()
    }

    pub fn resolve_stub(&self, stub: StubHandle, block: BlockHandle) {
        if let Some(s) = self.inner.write().stubs.get_mut(&stub) {
            s.resolve(block);
        }
    }

    pub fn stub_target(&self, stub: StubHandle) -> Option<(BodyId, usize, Context)> {
        let inner = self.inner.read();
        let s = inner.stubs.get(&stub)?;
        Some((s.body_id, s.target_offset, s.target_context.clone()))
    }

    pub fn with_block<R>(&self, handle: BlockHandle, f: impl FnOnce(&CompiledBlock) -> R) -> Option<R> {
        self.inner.read().blocks.get(&handle).map(f)
    }

    pub fn with_block_mut<R>(&self, handle: BlockHandle, f: impl FnOnce(&mut CompiledBlock) -> R) -> Option<R> {
        self.inner.write().blocks.get_mut(&handle).map(f)
    }

    pub fn add_out_edge(&self, handle: BlockHandle, edge: OutEdge) {
        self.with_block_mut(handle, |b| b.out_edges.push(edge));
    }

    pub fn block_count(&self) -> usize {
        self.inner.read().blocks.len()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        BlockRegistry::new()
    }
}
