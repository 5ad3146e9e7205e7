//! Bytecode ABI — the ambient, in-scope slice of the host's bytecode format.
//!
//! Parsing and bytecode generation are out of scope (§1); this module is
//! the read-only contract the JIT decodes against: opcode table, operand
//! encoding, and the branch-offset convention.

pub mod body;
pub mod opcode;
pub mod table;

pub use body::{Body, BodyId, CallInfo, OptArgTable};
pub use opcode::Opcode;
pub use table::BodyTable;
