//! Tunable limits for the versioning/invalidation machinery (§4.C, §4.G
//! ambient supplement). A single `Default`-constructible, field-overridable
//! struct, the same shape the engine uses for its own prewarm/engine
//! configuration.

/// Chain-depth limits and emit-buffer sizing for the block compiler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitConfig {
    /// Maximum chain depth for a generic send guard before the JIT gives
    /// up specializing further and falls back to a megamorphic path
    /// (default: 5).
    pub max_chain_send: u8,
    /// Maximum chain depth for an instance-variable getter guard
    /// (default: 10).
    pub max_chain_ivar: u8,
    /// Maximum chain depth for an array/hash index guard (default: 2).
    pub max_chain_index: u8,
    /// Initial capacity (bytes) reserved for a block's recorded
    /// instruction stream (default: 256).
    pub emit_buffer_size: usize,
}

impl Default for JitConfig {
    fn default() -> Self {
        JitConfig {
            max_chain_send: 5,
            max_chain_ivar: 10,
            max_chain_index: 2,
            emit_buffer_size: 256,
        }
    }
}

impl JitConfig {
    pub fn max_chain_for(&self, kind: ChainGuardKind) -> u8 {
        match kind {
            ChainGuardKind::Send => self.max_chain_send,
            ChainGuardKind::Ivar => self.max_chain_ivar,
            ChainGuardKind::Index => self.max_chain_index,
        }
    }
}

/// Which chain-depth limit applies to a guard (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainGuardKind {
    Send,
    Ivar,
    Index,
}
