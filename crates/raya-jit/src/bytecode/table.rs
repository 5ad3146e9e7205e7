//! Resolves a [`BodyId`] to the [`Body`] it names.
//!
//! A `Definition::Bytecode` method entry carries only an id (§3 "Method
//! entry"); call-site lowering (component F) needs the callee's actual
//! instruction stream — its local count, optional-argument table, and
//! leaf-builtin eligibility — to decide whether it can lower the call at
//! all. The host owns bytecode generation (out of scope, §1); this table
//! is simply where it publishes bodies for the JIT to read back.

use super::{Body, BodyId};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct BodyTable {
    bodies: FxHashMap<BodyId, Body>,
}

impl BodyTable {
    pub fn new() -> Self {
        BodyTable::default()
    }

    pub fn insert(&mut self, body: Body) -> BodyId {
        let id = body.id;
        self.bodies.insert(id, body);
        id
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_body_resolves_by_its_own_id() {
        let mut table = BodyTable::new();
        let id = table.insert(Body::new("m"));
        assert!(table.get(id).is_some());
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        let table = BodyTable::new();
        assert!(table.get(BodyId(9999)).is_none());
    }
}
