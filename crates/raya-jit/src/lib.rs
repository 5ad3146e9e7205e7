//! Basic-block-versioning template JIT for the Raya bytecode VM.
//!
//! This crate is the code-generation engine that the interpreter calls into
//! when it executes a bytecode instruction for which no compiled version
//! matches the interpreter's current type context. It does not interpret
//! bytecode, collect garbage, parse source, or assemble real machine code —
//! those are external collaborators, represented here only as typed
//! contracts (see [`host`] and [`asm`]).

pub mod asm;
pub mod bytecode;
pub mod callsite;
pub mod class;
pub mod codegen;
pub mod config;
pub mod context;
pub mod error;
pub mod frame;
pub mod host;
pub mod invalidation;
pub mod value;
pub mod version;

pub use config::JitConfig;
pub use context::Context;
