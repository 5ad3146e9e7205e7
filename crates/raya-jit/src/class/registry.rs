//! The class arena and its mutating operations (§4.A).
//!
//! Classes are nodes in a `Vec`-backed arena; every edge (`super`,
//! `origin`, subclass list, singleton <-> attached object) is a
//! [`ClassId`] index rather than a pointer, so the cyclic parts of the
//! graph never need unsafe back-references (§9).

use super::class_obj::{Allocator, ClassFlags, ClassId, ClassKind, CLONED, FROZEN, SINGLETON};
use super::error::ClassError;
use super::method::{CallableId, MethodEntry, Symbol};
use crate::invalidation::{AssumptionKey, InvalidationSink};
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CALLABLE_ID: AtomicU64 = AtomicU64::new(1);

/// What a namespace constant is bound to, for `define_class`'s "binds to a
/// non-class" check.
#[derive(Debug, Clone, Copy)]
enum Binding {
    Class(ClassId),
    Other,
}

pub struct ClassRegistry {
    classes: Vec<super::class_obj::ClassObj>,
    name_to_id: FxHashMap<Symbol, ClassId>,
    bindings: FxHashMap<(ClassId, Symbol), Binding>,
    callable_index: FxHashMap<CallableId, (ClassId, Symbol)>,
    pub root: ClassId,
    /// Special singleton classes for the three immediate pseudo-objects
    /// that are allowed to have one (§4.A singleton_class_of).
    true_singleton: ClassId,
    false_singleton: ClassId,
    nil_singleton: ClassId,
}

impl ClassRegistry {
    /// Create a registry pre-seeded with a root class and the three
    /// special immediate singletons.
    pub fn new(root_name: Symbol) -> Self {
        let mut classes = Vec::new();
        let root_id = ClassId(0);
        classes.push(super::class_obj::ClassObj::new(root_id, root_name, ClassKind::Class));

        let mut reg = ClassRegistry {
            classes,
            name_to_id: FxHashMap::default(),
            bindings: FxHashMap::default(),
            callable_index: FxHashMap::default(),
            root: root_id,
            true_singleton: ClassId(0),
            false_singleton: ClassId(0),
            nil_singleton: ClassId(0),
        };
        reg.name_to_id.insert(root_name, root_id);

        reg.true_singleton = reg.alloc_raw(Symbol(u32::MAX - 1), ClassKind::Class);
        reg.false_singleton = reg.alloc_raw(Symbol(u32::MAX - 2), ClassKind::Class);
        reg.nil_singleton = reg.alloc_raw(Symbol(u32::MAX - 3), ClassKind::Class);
        for id in [reg.true_singleton, reg.false_singleton, reg.nil_singleton] {
            reg.classes[id.0 as usize].flags.set(SINGLETON);
        }
        reg
    }

    fn alloc_raw(&mut self, name: Symbol, kind: ClassKind) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(super::class_obj::ClassObj::new(id, name, kind));
        id
    }

    pub fn get(&self, id: ClassId) -> &super::class_obj::ClassObj {
        &self.classes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut super::class_obj::ClassObj {
        &mut self.classes[id.0 as usize]
    }

    pub fn method_by_callable_id(&self, id: CallableId) -> Option<&MethodEntry> {
        let (class_id, name) = *self.callable_index.get(&id)?;
        self.get(class_id).method_table.get(&name)
    }

    /// Real superclass of `class_id`: the nearest ancestor reached by
    /// walking `super_id` that is a plain `Class` (not an `IClass` wrapper
    /// and not an `Origin`). Used by `define_class` to compare "is this
    /// reopen compatible" while ignoring interposed modules.
    fn real_superclass(&self, class_id: ClassId) -> Option<ClassId> {
        let mut cur = self.get(class_id).super_id;
        while let Some(id) = cur {
            match self.get(id).kind {
                ClassKind::Class => return Some(id),
                ClassKind::Module => return Some(id),
                ClassKind::IClass { .. } => cur = self.get(id).super_id,
            }
        }
        cur
    }

    /// §4.A *define class*.
    pub fn define_class(
        &mut self,
        namespace: ClassId,
        name: Symbol,
        superclass: ClassId,
    ) -> Result<ClassId, ClassError> {
        if let Some(binding) = self.bindings.get(&(namespace, name)) {
            return match binding {
                Binding::Class(existing) => {
                    let existing = *existing;
                    if self.real_superclass(existing) != Some(superclass) {
                        return Err(ClassError::SuperclassMismatch {
                            name,
                            existing,
                            requested: superclass,
                        });
                    }
                    Ok(existing)
                }
                Binding::Other => Err(ClassError::NotAClass(name)),
            };
        }

        let id = self.alloc_raw(name, ClassKind::Class);
        self.get_mut(id).super_id = Some(superclass);
        self.get_mut(superclass).subclasses.push(id);
        self.bindings.insert((namespace, name), Binding::Class(id));
        self.name_to_id.insert(name, id);
        Ok(id)
    }

    /// Bind `name` in `namespace` to a non-class value, for exercising the
    /// `NotAClass` failure path in tests without a full constant table.
    pub fn bind_non_class(&mut self, namespace: ClassId, name: Symbol) {
        self.bindings.insert((namespace, name), Binding::Other);
    }

    fn ancestor_chain_contains(&self, start: ClassId, target_kind_match: impl Fn(ClassId) -> bool) -> bool {
        let mut cur = Some(start);
        let mut guard = 0usize;
        while let Some(id) = cur {
            guard += 1;
            if guard > self.classes.len() + 1 {
                // Defensive: a real cycle would mean component A itself is
                // broken (invariant 4 in §8); never spin forever.
                return false;
            }
            if target_kind_match(id) {
                return true;
            }
            cur = self.get(id).super_id;
        }
        false
    }

    /// Flatten `module_id`'s own transitive includes into the order they
    /// should be inserted, most-specific (the module itself) last so it
    /// ends up closest to the including class.
    fn flatten_module_chain(&self, module_id: ClassId) -> Vec<ClassId> {
        let mut order = Vec::new();
        let mut cur = Some(module_id);
        while let Some(id) = cur {
            match self.get(id).kind {
                ClassKind::IClass { shares } => order.push(shares),
                ClassKind::Module => order.push(id),
                // A real class is never part of a module's own chain —
                // modules aren't subclassed, so this is the boundary
                // where a stray `super_id` (left over from allocating the
                // module via the generic class constructor) must stop.
                ClassKind::Class => break,
            }
            cur = self.get(id).super_id;
        }
        order
    }

    /// §4.A *include module*, depth-first over the module's own transitive
    /// includes.
    pub fn include_module(&mut self, class_id: ClassId, module_id: ClassId) -> Result<(), ClassError> {
        let chain = self.flatten_module_chain(module_id);
        for shared in chain {
            if self.ancestor_chain_contains(class_id, |id| {
                matches!(self.get(id).kind, ClassKind::IClass { shares } if shares == shared)
            }) {
                return Err(ClassError::CyclicInclude(shared));
            }
            let iclass_id = self.alloc_raw(self.get(shared).name, ClassKind::IClass { shares: shared });
            let insertion_super = self.get(class_id).super_id;
            self.get_mut(iclass_id).super_id = insertion_super;
            self.get_mut(class_id).super_id = Some(iclass_id);
        }
        self.bump_serial(class_id);
        Ok(())
    }

    /// Every `IClass` node in the whole arena that shares `target`'s
    /// method table — i.e. every point where some other class already
    /// did `include_module(_, target)`.
    fn iclass_wrappers_sharing(&self, target: ClassId) -> Vec<ClassId> {
        (0..self.classes.len())
            .map(|i| ClassId(i as u32))
            .filter(|&id| matches!(self.get(id).kind, ClassKind::IClass { shares } if shares == target))
            .collect()
    }

    /// §4.A *prepend module*.
    pub fn prepend_module(&mut self, class_id: ClassId, module_id: ClassId) -> Result<(), ClassError> {
        if self.get(class_id).origin.is_none() {
            let origin_id = self.alloc_raw(self.get(class_id).name, ClassKind::Class);
            let moved_table = std::mem::take(&mut self.get_mut(class_id).method_table);
            self.get_mut(origin_id).method_table = moved_table;
            self.get_mut(origin_id).super_id = self.get(class_id).super_id;
            self.get_mut(class_id).origin = Some(origin_id);
            self.get_mut(class_id).super_id = Some(origin_id);

            // `class_id`'s method table, which other classes' existing
            // `IClass { shares: class_id }` wrappers were resolving
            // directly against, just moved to `origin_id`. Splice a
            // matching `IClass { shares: origin_id }` wrapper in below
            // each such node so those classes keep seeing the methods
            // that were there before the prepend.
            for wrapper in self.iclass_wrappers_sharing(class_id) {
                let old_super = self.get(wrapper).super_id;
                let origin_wrapper =
                    self.alloc_raw(self.get(origin_id).name, ClassKind::IClass { shares: origin_id });
                self.get_mut(origin_wrapper).super_id = old_super;
                self.get_mut(wrapper).super_id = Some(origin_wrapper);
            }
        }

        let chain = self.flatten_module_chain(module_id);
        for shared in chain {
            if self.ancestor_chain_contains(class_id, |id| {
                matches!(self.get(id).kind, ClassKind::IClass { shares } if shares == shared)
            }) {
                return Err(ClassError::CyclicInclude(shared));
            }
            let iclass_id = self.alloc_raw(self.get(shared).name, ClassKind::IClass { shares: shared });
            let insertion_super = self.get(class_id).super_id;
            self.get_mut(iclass_id).super_id = insertion_super;
            self.get_mut(class_id).super_id = Some(iclass_id);
        }
        self.bump_serial(class_id);
        Ok(())
    }

    /// §4.A *lookup*: walk `super` from `class_id`, returning the first
    /// non-refined, non-undef entry. `IClass` nodes are checked against
    /// the shared module's table.
    pub fn lookup(&self, class_id: ClassId, name: Symbol) -> Option<&MethodEntry> {
        let mut cur = Some(class_id);
        while let Some(id) = cur {
            let table_owner = match self.get(id).kind {
                ClassKind::IClass { shares } => shares,
                ClassKind::Class | ClassKind::Module => id,
            };
            if let Some(entry) = self.get(table_owner).method_table.get(&name) {
                if !matches!(entry.definition, super::method::Definition::Undefined) {
                    return Some(entry);
                }
                return None;
            }
            cur = self.get(id).super_id;
        }
        None
    }

    /// Install a method definition, bumping the owning class's serial and
    /// notifying `sink` so dependent compiled blocks are invalidated
    /// (§4.A mutation-notification contract).
    pub fn define_method(
        &mut self,
        class_id: ClassId,
        name: Symbol,
        visibility: super::method::Visibility,
        definition: super::method::Definition,
        sink: &mut dyn InvalidationSink,
    ) -> CallableId {
        let callable_id = CallableId(NEXT_CALLABLE_ID.fetch_add(1, Ordering::Relaxed));
        let entry = MethodEntry::new(visibility, class_id, callable_id, definition);
        self.get_mut(class_id).method_table.insert(name, entry);
        self.callable_index.insert(callable_id, (class_id, name));
        self.bump_serial(class_id);
        sink.notify(AssumptionKey::MethodLookup { class_id, method: name });
        for sub in self.transitive_subclasses(class_id) {
            sink.notify(AssumptionKey::MethodLookup { class_id: sub, method: name });
        }
        callable_id
    }

    fn transitive_subclasses(&self, class_id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut stack = self.get(class_id).subclasses.clone();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.get(id).subclasses.iter().copied());
        }
        out
    }

    fn bump_serial(&mut self, class_id: ClassId) {
        self.get_mut(class_id).serial += 1;
    }

    /// §4.A *singleton class of object*.
    ///
    /// `class_of` is the object's current runtime class id; `object` lets
    /// us compare "already a singleton attached to this exact object".
    pub fn singleton_class_of(
        &mut self,
        object: Value,
        class_of: ClassId,
    ) -> Result<ClassId, ClassError> {
        if object.is_true() {
            return Ok(self.true_singleton);
        }
        if object.is_false() {
            return Ok(self.false_singleton);
        }
        if object.is_nil() {
            return Ok(self.nil_singleton);
        }
        if object.is_fixnum() || object.is_flonum() || object.is_static_symbol() {
            return Err(ClassError::SingletonForbidden("immediate value"));
        }
        if self.get(class_of).flags.has(FROZEN) && !object.is_heap() {
            return Err(ClassError::SingletonForbidden("frozen interned value"));
        }

        if self.get(class_of).is_singleton() && self.get(class_of).attached == Some(object) {
            return Ok(class_of);
        }
        if class_of == self.root {
            return Err(ClassError::InheritanceImpossible("can't copy the root class"));
        }

        let singleton_id = self.alloc_raw(self.get(class_of).name, ClassKind::Class);
        self.get_mut(singleton_id).flags.set(SINGLETON);
        self.get_mut(singleton_id).super_id = Some(class_of);
        self.get_mut(singleton_id).attached = Some(object);
        self.get_mut(class_of).subclasses.push(singleton_id);
        Ok(singleton_id)
    }

    /// Materialize `class_id`'s metaclass: the class-of-a-class, itself a
    /// singleton whose attached object is `class_id`'s own value identity
    /// (represented here by a synthetic heap `Value` carrying the class
    /// id, since classes are Rust-side arena entries, not heap objects).
    pub fn ensure_metaclass(&mut self, class_id: ClassId) -> ClassId {
        if let Some(meta) = self.get(class_id).metaclass {
            return meta;
        }
        let super_meta = match self.get(class_id).super_id {
            Some(s) => self.ensure_metaclass(s),
            None => self.root,
        };
        let meta_id = self.alloc_raw(self.get(class_id).name, ClassKind::Class);
        self.get_mut(meta_id).flags.set(SINGLETON);
        self.get_mut(meta_id).super_id = Some(super_meta);
        self.get_mut(meta_id).attached = Some(Value::from_bits((class_id.0 as u64) << 3 | 0x5));
        self.get_mut(class_id).metaclass = Some(meta_id);
        meta_id
    }

    pub fn mark_frozen(&mut self, class_id: ClassId) {
        self.get_mut(class_id).flags.set(FROZEN);
    }

    pub fn mark_cloned(&mut self, class_id: ClassId) {
        self.get_mut(class_id).flags.set(CLONED);
    }

    pub fn set_allocator(&mut self, class_id: ClassId, allocator: Allocator, sink: &mut dyn InvalidationSink) {
        self.get_mut(class_id).allocator = allocator;
        self.bump_serial(class_id);
        sink.notify(AssumptionKey::AllocatorChanged { class_id });
    }

    /// Force-insert an ivar index for `name` on `class_id` if absent,
    /// returning the (possibly newly assigned) index (§4.E ivar-get step 2).
    pub fn ensure_ivar_index(&mut self, class_id: ClassId, name: Symbol) -> u32 {
        let class = self.get_mut(class_id);
        let next = class.ivar_index.len() as u32;
        *class.ivar_index.entry(name).or_insert(next)
    }

    pub fn class_flags(&self, id: ClassId) -> ClassFlags {
        self.get(id).flags
    }
}
