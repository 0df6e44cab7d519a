//! The fixed base-object hierarchy every user object ultimately chains to.
//!
//! `Primitive` sits at the root of every `base` chain; every other
//! well-known base (`Object`, `Enumerable`, `Number`, ...) chains to it
//! directly or indirectly. The chain is a DAG that terminates at `Primitive`
//! and is built exactly once, at [`crate::run::Engine::new`] time — grounded
//! on `knownbases.c`'s one-shot `KnownBases_Preload` in the original
//! implementation.

use crate::{
    heap::{Heap, HeapData, HeapId, UserObjectData},
    intern::{Interns, SymbolId},
    kind::HeapFlags,
};

/// Handles to the preloaded base objects, fixed for the lifetime of an
/// [`crate::run::Engine`].
#[derive(Debug, Clone, Copy)]
pub struct KnownBases {
    pub primitive: HeapId,
    pub object: HeapId,
    pub enumerable: HeapId,
    pub number: HeapId,
    pub handle: HeapId,
    pub function: HeapId,
}

impl KnownBases {
    /// Allocates the fixed base hierarchy on `heap`, interning any names it
    /// needs through `interns`. Call exactly once per heap.
    pub fn new(heap: &mut Heap, interns: &mut Interns) -> Self {
        let mut base = |heap: &mut Heap, name: &str, parent: Option<HeapId>| {
            let sym = interns.get_or_intern(name);
            heap.alloc(
                sym,
                parent,
                HeapFlags::default(),
                HeapData::UserObject(UserObjectData { security_key: None, name: sym, dict: ahash::AHashMap::default() }),
            )
        };

        let primitive = base(heap, "Primitive", None);
        let object = base(heap, "Object", Some(primitive));
        let enumerable = base(heap, "Enumerable", Some(object));
        let number = base(heap, "Number", Some(object));
        let handle = base(heap, "Handle", Some(object));
        let function = base(heap, "Function", Some(object));

        Self { primitive, object, enumerable, number, handle, function }
    }

    /// Returns the base chain root for newly allocated objects with no
    /// explicit `base` of their own.
    #[must_use]
    pub fn default_base_for(&self, assigned: SymbolId) -> HeapId {
        let _ = assigned; // kept for parity with the name-aware lookup knownbases.c performs
        self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_base_chains_to_primitive() {
        let mut heap = Heap::new();
        let mut interns = Interns::default();
        let bases = KnownBases::new(&mut heap, &mut interns);
        for id in [bases.object, bases.enumerable, bases.number, bases.handle, bases.function] {
            let mut current = Some(id);
            let mut steps = 0;
            while let Some(cur) = current {
                if cur == bases.primitive {
                    break;
                }
                current = heap.get(cur).base;
                steps += 1;
                assert!(steps < 10, "base chain failed to terminate at Primitive");
            }
            assert_eq!(current, Some(bases.primitive));
        }
    }

    #[test]
    fn primitive_has_no_base() {
        let mut heap = Heap::new();
        let mut interns = Interns::default();
        let bases = KnownBases::new(&mut heap, &mut interns);
        assert_eq!(heap.get(bases.primitive).base, None);
    }
}
