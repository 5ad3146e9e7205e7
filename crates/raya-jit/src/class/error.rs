//! Failure modes for class-subsystem mutations (§4.A).
//!
//! All "inheritance impossible" conditions are raised synchronously and
//! before any state mutation — every operation below validates first,
//! then mutates.

use super::class_obj::ClassId;
use super::method::Symbol;
use thiserror::Error;

/// Raised by the class subsystem. The JIT's call-site lowering (§4.F) never
/// constructs these itself; it only reads the class graph these operations
/// maintain and assumes its invariants hold.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassError {
    /// `define_class` found an existing binding that is not a class.
    #[error("{0} is not a class")]
    NotAClass(Symbol),

    /// `define_class` found an existing class whose real superclass (modules
    /// interposed in between ignored) differs from the one requested.
    #[error("superclass mismatch for {name}: existing {existing:?}, requested {requested:?}")]
    SuperclassMismatch {
        name: Symbol,
        existing: ClassId,
        requested: ClassId,
    },

    /// `include_module`/`prepend_module` found the module already present
    /// in the class's ancestor chain.
    #[error("cyclic include of {0:?}")]
    CyclicInclude(ClassId),

    /// `singleton_class_of` called on an object kind that cannot have one
    /// (fixnum, bignum, float, symbol, frozen interned string).
    #[error("can't define singleton class for {0}")]
    SingletonForbidden(&'static str),

    /// Attempted to subclass a singleton class, or to copy the root class.
    #[error("{0}")]
    InheritanceImpossible(&'static str),
}
