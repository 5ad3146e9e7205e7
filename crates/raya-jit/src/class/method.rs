//! Method entries (§3 "Method entry", §4.A lookup/lifecycle).

use super::class_obj::ClassId;

/// Interned name id — methods, instance variables, and constants are all
/// looked up by one of these. Produced by the host's symbol table; this
/// crate treats it as an opaque key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub u32);

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id for a method callable, stable across redefinition so the
/// JIT can still name "the method that used to be here" in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallableId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
    Undef,
}

/// Fixed-arity or variadic native function arity declaration (§4.F native
/// callee lowering consults this).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeArity {
    Fixed(u8),
    /// `(argc, argv, receiver)` form. Ruby-array variadic form is a
    /// separate, *cannot compile* shape and is not represented here.
    Variadic,
}

/// What a method entry actually does when invoked. Call-site lowering
/// (§4.F) dispatches on this tag; most variants other than `Bytecode` and
/// `Native` are *cannot compile* at a call site.
#[derive(Debug, Clone)]
pub enum Definition {
    Bytecode(crate::bytecode::BodyId),
    Native {
        arity: NativeArity,
        /// Opaque handle the backend resolves to a function pointer at
        /// finalization time (see `host::NativeFunctionId`).
        function: crate::host::NativeFunctionId,
    },
    /// Attribute accessor: reads/writes instance variable `field`.
    Accessor { field: Symbol, is_setter: bool },
    /// Refinement wrapper; resolves through `original` unless a refinement
    /// is active at the call site.
    Refined { original: Box<Definition> },
    Alias { target: CallableId },
    Undefined,
    NotImplemented,
    ZSuper,
    BMethod,
    Missing,
    Optimized,
}

impl Definition {
    /// Whether this is one of the marker kinds §4.F's call-site lowering
    /// refuses outright (attrset, bmethod, zsuper, undef, not-implemented,
    /// optimized, missing, refined-without-original-resolution).
    pub fn is_cannot_compile_kind(&self) -> bool {
        matches!(
            self,
            Definition::Undefined
                | Definition::NotImplemented
                | Definition::ZSuper
                | Definition::BMethod
                | Definition::Missing
                | Definition::Optimized
        )
    }
}

#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub visibility: Visibility,
    pub defined_in: ClassId,
    pub callable_id: CallableId,
    pub definition: Definition,
}

impl MethodEntry {
    pub fn new(visibility: Visibility, defined_in: ClassId, callable_id: CallableId, definition: Definition) -> Self {
        MethodEntry {
            visibility,
            defined_in,
            callable_id,
            definition,
        }
    }

    /// Resolve through `Alias`/`Refined` wrappers to the definition the
    /// call actually executes. `lookup` in the class table resolves
    /// `original` links on refined wrappers unless a refinement is active;
    /// this helper is the single-step version call sites use directly.
    pub fn resolve_alias<'a>(&'a self, table: &'a super::registry::ClassRegistry) -> Option<&'a MethodEntry> {
        match &self.definition {
            Definition::Alias { target } => table.method_by_callable_id(*target),
            _ => Some(self),
        }
    }
}
