//! `SmileArg`: the evaluation-stack / register representation of a value.
//!
//! Every slot on a [`crate::closure::Closure`]'s evaluation stack, every local
//! variable and argument, and every bytecode literal load produces a
//! `SmileArg`. Twelve of its variants are "unboxed scalars" — the payload is
//! inline, no heap allocation involved; the thirteenth, [`SmileArg::Heap`],
//! is a reference into the [`crate::heap::Heap`] arena for everything else
//! (lists, user objects, strings, functions, closures, …).
//!
//! The original implementation represents this as a tagged union of a raw
//! pointer and a scalar payload, relying on a handful of sentinel "unboxed-kind"
//! pointer values to mean "the payload is the real value, ignore the pointer".
//! Rust's enums make that sentinel trick unnecessary: the discriminant *is* the
//! tag, checked by the compiler, so `SmileArg` is a plain sum type instead.

use crate::{heap::HeapId, intern::SymbolId, kind::Kind};

/// An opaque decimal-ish real number.
///
/// The numeric tower's actual decimal arithmetic is out of scope for the core;
/// `Real32`/`Real64` are carried as opaque payloads with declared storage only,
/// exactly as the spec directs for library-owned numeric kinds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Real32(pub f32);

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Real64(pub f64);

/// A Unicode scalar value kept distinct from [`Kind::Char`] (a single-byte
/// character) per the source type hierarchy: `Char` is a narrow 8-bit code
/// unit, `Uni` is a full Unicode code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Uni(pub char);

/// The evaluation-stack slot type: an unboxed scalar carried inline, or a
/// reference to a heap-allocated object.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SmileArg {
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Bool(bool),
    F32(f32),
    F64(f64),
    Symbol(SymbolId),
    R32(Real32),
    R64(Real64),
    Char(u8),
    Uni(Uni),
    /// Reference into the heap arena. Covers every aggregate kind, every
    /// boxed-scalar kind, and the always-boxed extended numerics.
    Heap(HeapId),
}

impl SmileArg {
    /// Returns the kind tag for the unboxed variants directly. `Heap` slots
    /// carry no tag of their own — their real kind lives on the heap object's
    /// header, so callers dispatch through [`crate::heap::Heap::kind_of`]
    /// instead.
    #[must_use]
    pub fn unboxed_kind(&self) -> Option<Kind> {
        Some(match self {
            Self::Byte(_) => Kind::Byte,
            Self::Int16(_) => Kind::Int16,
            Self::Int32(_) => Kind::Int32,
            Self::Int64(_) => Kind::Int64,
            Self::Bool(_) => Kind::Bool,
            Self::F32(_) => Kind::F32,
            Self::F64(_) => Kind::F64,
            Self::Symbol(_) => Kind::Symbol,
            Self::R32(_) => Kind::R32,
            Self::R64(_) => Kind::R64,
            Self::Char(_) => Kind::Char,
            Self::Uni(_) => Kind::Uni,
            Self::Heap(_) => return None,
        })
    }

    #[must_use]
    pub fn is_unboxed(&self) -> bool {
        !matches!(self, Self::Heap(_))
    }

    #[must_use]
    pub fn as_heap_id(&self) -> Option<HeapId> {
        match self {
            Self::Heap(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<HeapId> for SmileArg {
    fn from(id: HeapId) -> Self {
        Self::Heap(id)
    }
}

impl From<bool> for SmileArg {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SmileArg {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unboxed_scalars_report_their_kind() {
        assert_eq!(SmileArg::Int64(3).unboxed_kind(), Some(Kind::Int64));
        assert_eq!(SmileArg::Bool(true).unboxed_kind(), Some(Kind::Bool));
        assert!(SmileArg::Bool(true).is_unboxed());
    }

    #[test]
    fn heap_slots_carry_no_inline_kind() {
        let arg = SmileArg::Heap(HeapId::from_raw(3));
        assert!(!arg.is_unboxed());
        assert_eq!(arg.unboxed_kind(), None);
        assert_eq!(arg.as_heap_id(), Some(HeapId::from_raw(3)));
    }
}
