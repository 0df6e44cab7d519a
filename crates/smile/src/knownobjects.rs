//! Singletons and small caches allocated once per [`crate::run::Engine`].
//!
//! `True`, `False`, and `Null` are shared, never duplicated, so pointer
//! equality on them is meaningful; a small cache of boxed small integers
//! avoids repeated allocation for the values bytecode loads most often.
//! Grounded on `knownobjects.c`'s one-shot `KnownObjects_Preload`.

use crate::{
    heap::{Heap, HeapData, HeapId, ListCell},
    intern::{Interns, SymbolId},
    knownbases::KnownBases,
    kind::HeapFlags,
};

/// Inclusive range of small integers kept pre-boxed to avoid churn on the
/// heap for the values programs allocate most often.
const SMALL_INT_CACHE_MIN: i64 = -8;
const SMALL_INT_CACHE_MAX: i64 = 255;

#[derive(Debug, Clone, Copy)]
pub struct KnownObjects {
    pub true_obj: HeapId,
    pub false_obj: HeapId,
    /// The one canonical empty-list cell; every `List`-kind object besides
    /// this one is a real, non-circular cons cell (§3 Lifecycles).
    pub null: HeapId,
    small_ints_base: HeapId,
}

impl KnownObjects {
    /// Allocates the fixed singletons and small-integer cache on `heap`.
    /// `bases` must already have been built via [`KnownBases::new`] on the
    /// same heap. Call exactly once per heap.
    pub fn new(heap: &mut Heap, interns: &mut Interns, bases: &KnownBases) -> Self {
        let true_sym = interns.get_or_intern("true");
        let false_sym = interns.get_or_intern("false");
        let null_sym = interns.get_or_intern("null");

        let true_obj = heap.alloc(true_sym, Some(bases.primitive), HeapFlags::default(), HeapData::BoxedBool(true));
        let false_obj = heap.alloc(false_sym, Some(bases.primitive), HeapFlags::default(), HeapData::BoxedBool(false));
        // The self-referential empty list: `a` and `d` both point back at itself,
        // matching the one circular allocation the data model calls out explicitly.
        let null = heap.alloc(
            null_sym,
            Some(bases.primitive),
            HeapFlags::default(),
            HeapData::Null,
        );
        let _ = ListCell { a: crate::value::SmileArg::Heap(null), d: crate::value::SmileArg::Heap(null) };

        let small_ints_base = heap.alloc(
            SymbolId::NONE,
            Some(bases.number),
            HeapFlags::default(),
            HeapData::BoxedInt64(SMALL_INT_CACHE_MIN),
        );
        for n in (SMALL_INT_CACHE_MIN + 1)..=SMALL_INT_CACHE_MAX {
            heap.alloc(SymbolId::NONE, Some(bases.number), HeapFlags::default(), HeapData::BoxedInt64(n));
        }

        Self { true_obj, false_obj, null, small_ints_base }
    }

    /// Returns the cached boxed integer for `n` if it falls within the
    /// preloaded range, or `None` if the caller must allocate fresh.
    #[must_use]
    pub fn cached_boxed_int(&self, n: i64) -> Option<HeapId> {
        if !(SMALL_INT_CACHE_MIN..=SMALL_INT_CACHE_MAX).contains(&n) {
            return None;
        }
        let offset = u32::try_from(n - SMALL_INT_CACHE_MIN).ok()?;
        Some(HeapId::from_raw(self.small_ints_base.raw() + offset))
    }

    #[must_use]
    pub fn bool_obj(&self, value: bool) -> HeapId {
        if value { self.true_obj } else { self.false_obj }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (Heap, Interns, KnownBases) {
        let mut heap = Heap::new();
        let mut interns = Interns::default();
        let bases = KnownBases::new(&mut heap, &mut interns);
        (heap, interns, bases)
    }

    #[test]
    fn true_and_false_are_distinct_singletons() {
        let (_heap, _interns, bases) = fresh();
        let mut heap = Heap::new();
        let mut interns = Interns::default();
        let bases = KnownBases::new(&mut heap, &mut interns);
        let objs = KnownObjects::new(&mut heap, &mut interns, &bases);
        assert_ne!(objs.true_obj, objs.false_obj);
        assert_eq!(objs.bool_obj(true), objs.true_obj);
        assert_eq!(objs.bool_obj(false), objs.false_obj);
        let _ = bases;
    }

    #[test]
    fn small_integers_are_cached_within_range() {
        let mut heap = Heap::new();
        let mut interns = Interns::default();
        let bases = KnownBases::new(&mut heap, &mut interns);
        let objs = KnownObjects::new(&mut heap, &mut interns, &bases);
        assert!(objs.cached_boxed_int(0).is_some());
        assert!(objs.cached_boxed_int(255).is_some());
        assert!(objs.cached_boxed_int(256).is_none());
        assert!(objs.cached_boxed_int(-9).is_none());
        let id = objs.cached_boxed_int(10).unwrap();
        assert!(matches!(heap.get(id).data, HeapData::BoxedInt64(10)));
    }
}
