//! The kind tag: the 8-bit primary type discriminant shared by every value.
//!
//! Unboxed scalar kinds occupy `0x00..=0x0F`; their boxed counterparts occupy
//! `0x10..=0x1F`, offset by exactly `0x10` from the unboxed form of the same
//! logical type. This lets `box`/`unbox` be a branchless bit flip on the kind
//! byte rather than a lookup table, matching the layout described in §4.1.
//!
//! Rust gives us a type-level alternative to the vtable-of-function-pointers
//! idiom the original C implementation uses: [`crate::heap::HeapData`] is an enum
//! whose variants *are* the kinds, and [`crate::heap::Heap`] dispatches through
//! `match` instead of an indirect call. `Kind` itself survives as the runtime tag
//! carried on [`crate::value::SmileArg`] and [`crate::heap::HeapObject`], because
//! the spec's invariants (§3, §8) are phrased in terms of comparing tags, not in
//! terms of Rust's own type system.

/// The 8-bit primary kind tag. Only the low byte of a `u16` header field is ever
/// interpreted as a `Kind`; flag bits live in the remaining byte (see
/// [`crate::heap::HeapFlags`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum Kind {
    // --- Unboxed scalars: register/stack-only, 0x00..=0x0F ---
    Byte = 0x00,
    Int16 = 0x01,
    Int32 = 0x02,
    Int64 = 0x03,
    Bool = 0x04,
    F32 = 0x05,
    F64 = 0x06,
    Symbol = 0x07,
    R32 = 0x08,
    R64 = 0x09,
    Char = 0x0A,
    Uni = 0x0B,

    // --- Boxed counterparts of the above, 0x10..=0x1F ---
    BoxedByte = 0x10,
    BoxedInt16 = 0x11,
    BoxedInt32 = 0x12,
    BoxedInt64 = 0x13,
    BoxedBool = 0x14,
    BoxedF32 = 0x15,
    BoxedF64 = 0x16,
    BoxedSymbol = 0x17,
    BoxedR32 = 0x18,
    BoxedR64 = 0x19,
    BoxedChar = 0x1A,
    BoxedUni = 0x1B,

    // --- Aggregates ---
    Null = 0x20,
    List = 0x21,
    UserObject = 0x22,
    String = 0x23,
    Pair = 0x24,
    RangeByte = 0x25,
    RangeInt16 = 0x26,
    RangeInt32 = 0x27,
    RangeInt64 = 0x28,
    RangeF32 = 0x29,
    RangeF64 = 0x2A,
    ByteArray = 0x2B,
    Handle = 0x2C,
    Function = 0x2D,
    Closure = 0x2E,
    TillContinuation = 0x2F,
    Macro = 0x30,

    // --- Extended numerics: always boxed, see spec Open Questions ---
    Int128 = 0x31,
    F128 = 0x32,
    R128 = 0x33,
    BigInt = 0x34,
    BigFloat = 0x35,
    BigReal = 0x36,
    Timestamp = 0x37,

    // --- Parse-time kinds: reserved, never produced by the compiler itself ---
    Syntax = 0x38,
    Nonterminal = 0x39,
    Loanword = 0x3A,
    ParseDecl = 0x3B,
    ParseMessage = 0x3C,

    // --- Reserved per spec Open Questions: enumerated, never exercised ---
    Facade = 0x3D,
}

/// Bit distinguishing the unboxed range (`0x00..=0x0F`) from the boxed range
/// (`0x10..=0x1F`) of the same logical scalar kind.
pub const BOXED_BIT: u8 = 0x10;

/// Mask isolating the kind byte from any future flag bits packed alongside it.
pub const KIND_MASK: u8 = 0xFF;

impl Kind {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for the twelve unboxed scalar kinds: valid only on the evaluation
    /// stack/in registers, never reachable from a heap slot (§4.1 constraint).
    #[must_use]
    pub fn is_unboxed_scalar(self) -> bool {
        (self.as_u8() & !BOXED_BIT) == self.as_u8() && self.as_u8() <= Kind::Uni.as_u8()
    }

    /// True for the boxed counterpart of an unboxed scalar kind.
    #[must_use]
    pub fn is_boxed_scalar(self) -> bool {
        let v = self.as_u8();
        (BOXED_BIT..=Kind::BoxedUni.as_u8()).contains(&v)
    }

    /// Returns the boxed kind corresponding to an unboxed scalar kind, or `self`
    /// if already boxed or not a scalar at all. This is the "set the `0x10` bit"
    /// branchless rule from §4.1.
    #[must_use]
    pub fn boxed(self) -> Self {
        if self.is_unboxed_scalar() {
            // Safety-free: every unboxed scalar discriminant plus BOXED_BIT is a
            // valid boxed-scalar discriminant by construction above.
            kind_from_u8(self.as_u8() | BOXED_BIT).unwrap_or(self)
        } else {
            self
        }
    }

    /// Returns the unboxed kind corresponding to a boxed scalar kind, or `self`
    /// if already unboxed or not a scalar at all.
    #[must_use]
    pub fn unboxed(self) -> Self {
        if self.is_boxed_scalar() {
            kind_from_u8(self.as_u8() & !BOXED_BIT).unwrap_or(self)
        } else {
            self
        }
    }

    #[must_use]
    pub fn is_list_or_null(self) -> bool {
        matches!(self, Kind::List | Kind::Null)
    }
}

fn kind_from_u8(raw: u8) -> Option<Kind> {
    use Kind::{
        Bool, BoxedBool, BoxedByte, BoxedChar, BoxedF32, BoxedF64, BoxedInt16, BoxedInt32, BoxedInt64, BoxedR32,
        BoxedR64, BoxedSymbol, BoxedUni, Byte, Char, F32, F64, Int16, Int32, Int64, R32, R64, Symbol, Uni,
    };
    Some(match raw {
        0x00 => Byte,
        0x01 => Int16,
        0x02 => Int32,
        0x03 => Int64,
        0x04 => Bool,
        0x05 => F32,
        0x06 => F64,
        0x07 => Symbol,
        0x08 => R32,
        0x09 => R64,
        0x0A => Char,
        0x0B => Uni,
        0x10 => BoxedByte,
        0x11 => BoxedInt16,
        0x12 => BoxedInt32,
        0x13 => BoxedInt64,
        0x14 => BoxedBool,
        0x15 => BoxedF32,
        0x16 => BoxedF64,
        0x17 => BoxedSymbol,
        0x18 => BoxedR32,
        0x19 => BoxedR64,
        0x1A => BoxedChar,
        0x1B => BoxedUni,
        _ => return None,
    })
}

/// Per-object flag bits, packed alongside the kind tag in the object header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HeapFlags {
    bits: u8,
}

impl HeapFlags {
    pub const SECURITY: u8 = 0x01;
    pub const HAS_SOURCE_LOCATION: u8 = 0x02;
    pub const EXTERNAL_FUNCTION: u8 = 0x04;
    pub const WRITABLE: u8 = 0x08;
    pub const APPENDABLE: u8 = 0x10;
    pub const FROZEN: u8 = 0x20;

    #[must_use]
    pub fn new(bits: u8) -> Self {
        Self { bits }
    }

    #[must_use]
    pub fn has(self, flag: u8) -> bool {
        self.bits & flag != 0
    }

    pub fn set(&mut self, flag: u8, value: bool) {
        if value {
            self.bits |= flag;
        } else {
            self.bits &= !flag;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_unbox_round_trips_for_every_unboxed_scalar() {
        let scalars = [
            Kind::Byte,
            Kind::Int16,
            Kind::Int32,
            Kind::Int64,
            Kind::Bool,
            Kind::F32,
            Kind::F64,
            Kind::Symbol,
            Kind::R32,
            Kind::R64,
            Kind::Char,
            Kind::Uni,
        ];
        for k in scalars {
            assert!(k.is_unboxed_scalar());
            let boxed = k.boxed();
            assert!(boxed.is_boxed_scalar());
            assert_eq!(boxed.unboxed(), k);
            assert_eq!(boxed.as_u8(), k.as_u8() | BOXED_BIT);
        }
    }

    #[test]
    fn aggregate_kinds_are_unaffected_by_box_unbox() {
        assert_eq!(Kind::UserObject.boxed(), Kind::UserObject);
        assert_eq!(Kind::Null.unboxed(), Kind::Null);
    }

    #[test]
    fn flags_round_trip() {
        let mut flags = HeapFlags::default();
        assert!(!flags.has(HeapFlags::WRITABLE));
        flags.set(HeapFlags::WRITABLE, true);
        assert!(flags.has(HeapFlags::WRITABLE));
        flags.set(HeapFlags::WRITABLE, false);
        assert!(!flags.has(HeapFlags::WRITABLE));
    }
}
