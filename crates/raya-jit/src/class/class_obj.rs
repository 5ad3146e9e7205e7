//! The class object (§3 "Class object") and its flags.
//!
//! Classes live in an arena (see [`super::registry::ClassRegistry`]); every
//! cross-reference (`super`, `origin`, subclass list, singleton's attached
//! object) is an index into that arena rather than a pointer, so the
//! cyclic parts of the graph (metaclass-of-metaclass, singleton <->
//! attached object) never need unsafe back-references (§9 design notes).

use super::method::{MethodEntry, Symbol};
use rustc_hash::FxHashMap;

/// Index into the [`super::registry::ClassRegistry`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

pub const SINGLETON: u16 = 1 << 0;
pub const CLONED: u16 = 1 << 1;
pub const REFINEMENT: u16 = 1 << 2;
pub const FROZEN: u16 = 1 << 3;
pub const INCLUDED_INTO_REFINEMENT: u16 = 1 << 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassFlags(pub u16);

impl ClassFlags {
    pub fn has(self, bit: u16) -> bool {
        self.0 & bit != 0
    }
    pub fn set(&mut self, bit: u16) {
        self.0 |= bit;
    }
}

/// Whether a class-arena entry is a full class/module or a lightweight
/// wrapper that shares another module's tables (§3 invariant: only iclass
/// wrappers appear between a class and its origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Module,
    /// Shares `shares`'s method/constant/ivar-index tables by reference;
    /// never has entries of its own.
    IClass { shares: ClassId },
}

/// Opaque handle to the allocator the host would call to instantiate this
/// class; the JIT only ever compares it against the "default" sentinel to
/// decide whether a class is plain-object-shaped (§4.E instance variable
/// get, step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocator {
    Default,
    Custom(u32),
}

#[derive(Debug, Clone)]
pub struct ClassObj {
    pub id: ClassId,
    pub name: Symbol,
    pub kind: ClassKind,
    pub super_id: Option<ClassId>,
    /// Anchor inserted the first time a module is prepended to this class;
    /// `None` until then. Ancestor-chain walks start here, not at `id`.
    pub origin: Option<ClassId>,
    pub method_table: FxHashMap<Symbol, MethodEntry>,
    pub constants: FxHashMap<Symbol, super::super::value::Value>,
    pub ivar_index: FxHashMap<Symbol, u32>,
    /// Weak back-references so invalidation (component G) can traverse
    /// subclasses when a method-lookup assumption is signaled.
    pub subclasses: Vec<ClassId>,
    /// Monotonic serial, bumped on every mutation that could invalidate an
    /// assumption; used as a cheap cache-validity key.
    pub serial: u64,
    pub allocator: Allocator,
    pub flags: ClassFlags,
    /// Set once `singleton_class_of` materializes a singleton attached to
    /// this class's own runtime identity (the class-of-a-class chain).
    pub metaclass: Option<ClassId>,
    /// For a singleton class: the one object it's attached to. `None` for
    /// ordinary classes and modules.
    pub attached: Option<super::super::value::Value>,
}

impl ClassObj {
    pub fn new(id: ClassId, name: Symbol, kind: ClassKind) -> Self {
        ClassObj {
            id,
            name,
            kind,
            super_id: None,
            origin: None,
            method_table: FxHashMap::default(),
            constants: FxHashMap::default(),
            ivar_index: FxHashMap::default(),
            subclasses: Vec::new(),
            serial: 0,
            allocator: Allocator::Default,
            flags: ClassFlags::default(),
            metaclass: None,
            attached: None,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.flags.has(SINGLETON)
    }

    /// The chain-walk start point: `origin` if materialized, else `id` itself.
    pub fn chain_start(&self) -> ClassId {
        self.origin.unwrap_or(self.id)
    }
}
