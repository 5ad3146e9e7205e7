//! Class & method-table hierarchy (§4.A): the arena of classes, modules,
//! and their method tables that the rest of the JIT queries and guards
//! against.

pub mod class_obj;
pub mod error;
pub mod method;
pub mod registry;

pub use class_obj::{ClassId, ClassKind, ClassObj};
pub use error::ClassError;
pub use method::{CallableId, Definition, MethodEntry, NativeArity, Symbol, Visibility};
pub use registry::ClassRegistry;
