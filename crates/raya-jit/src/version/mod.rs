//! Block-version registry (§4.C): maps a `(bytecode body, offset)` pair to
//! the set of compiled versions that exist for it, keyed further by
//! compile-time context.

pub mod block;
pub mod registry;

pub use block::{BlockHandle, CompiledBlock, OutEdge, Stub, StubHandle};
pub use registry::BlockRegistry;
