//! The heap arena and the per-kind operation dispatch ("vtable") that acts on it.
//!
//! Every boxed object — a boxed scalar, a list cell, a user object, a string, a
//! function, a closure, a handle — lives in [`Heap`], a single growable arena
//! indexed by [`HeapId`]. The original implementation gives every kind a
//! function-pointer table (`VTable`) with a fixed set of entries
//! (`compareEqual`, `deepEqual`, `hash`, property access, `toBool`/`toString`,
//! `call`, `box`/`unbox`, …); the Design Notes call for replacing that with "a
//! capability set" rather than literal function pointers. Here that capability
//! set is `impl Heap`: each vtable entry becomes a method that `match`es on
//! [`HeapData`], so the compiler checks every kind handles every operation
//! instead of relying on a hand-filled struct of pointers.

use std::cell::Cell;

use ahash::AHashMap;
use num_bigint::BigInt;

use crate::{
    hash_oracle::HashOracle,
    intern::SymbolId,
    kind::{HeapFlags, Kind},
    value::SmileArg,
};

/// Index into [`Heap`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct HeapId(u32);

impl HeapId {
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A list cell: `{ a, d }`. `null` is the one self-referential cell, allocated
/// once by [`crate::knownobjects::KnownObjects`] and never mutated afterward;
/// every other cell is a genuine `List` kind.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ListCell {
    pub a: SmileArg,
    pub d: SmileArg,
}

/// A `{ left, right }` pair, with an optional source position for forms that
/// need to report where in the source text they came from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PairData {
    pub left: SmileArg,
    pub right: SmileArg,
    pub source_location: Option<u32>,
}

/// A prototype-based user object: `{ security_key, name, dict }`.
///
/// Writable/appendable/frozen live in the shared [`HeapFlags`] on the object
/// header rather than here, matching the source layout.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserObjectData {
    pub security_key: Option<HeapId>,
    pub name: SymbolId,
    pub dict: AHashMap<SymbolId, SmileArg>,
}

/// Backing storage for a closure's variable slots.
///
/// `LOCAL` closures use a dense, index-addressed array the compiler assigns
/// slots into at compile time; `GLOBAL` closures back variables by name so
/// late-bound/introspectable globals work without a compile-time slot count
/// (§4.5).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum VariableStorage {
    Dense(Vec<SmileArg>),
    Global(AHashMap<SymbolId, SmileArg>),
}

/// A closure, i.e. an activation record: `{ parent, closure_info, variables, stack }`.
///
/// Closures are themselves heap-allocated values (`Kind::Closure`) so a
/// function's environment can be captured, returned, and compared like any
/// other aggregate.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClosureData {
    pub parent: Option<HeapId>,
    pub variables: VariableStorage,
    pub stack: Vec<SmileArg>,
}

/// A resource owned by a [`HeapData::Handle`]: an opaque host resource id plus
/// a single-shot close flag so repeated/finalizer-driven closes are idempotent
/// (§3 Lifecycles, §5 Shared-resource policy).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HandleData {
    pub resource_id: u64,
    pub closed: bool,
}

/// Which function-kind a `Function` heap object is.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum FunctionData {
    /// `{ args, body, closure_info }` — a Smile-level function compiled to
    /// bytecode. `info_index` indexes into the owning program's
    /// `CompiledTables::user_functions`.
    User { info_index: u32, closure: Option<HeapId> },
    /// An externally provided function reachable from Smile code, checked
    /// against `ExternalFunctionInfo` before every call.
    External { info_index: u32 },
}

/// The payload carried by a heap object, keyed by kind.
///
/// This enum *is* the kind for every boxed/aggregate value: matching on it is
/// the Rust replacement for consulting a `VTable*`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum HeapData {
    // Boxed scalars: same payload as the unboxed `SmileArg` variant, but
    // reachable from any slot that expects a general heap value.
    BoxedByte(u8),
    BoxedInt16(i16),
    BoxedInt32(i32),
    BoxedInt64(i64),
    BoxedBool(bool),
    BoxedF32(f32),
    BoxedF64(f64),
    BoxedSymbol(SymbolId),
    BoxedR32(f32),
    BoxedR64(f64),
    BoxedChar(u8),
    BoxedUni(char),

    Null,
    List(ListCell),
    UserObject(UserObjectData),
    Str(String),
    Pair(PairData),
    Range { start: SmileArg, end: SmileArg, step: SmileArg },
    ByteArray(Vec<u8>),
    Handle(HandleData),
    Function(FunctionData),
    Closure(ClosureData),
    /// Snapshot of an escape target for a `$till` loop: the closure a matching
    /// named exit should unwind to.
    TillContinuation { target_closure: HeapId, name: SymbolId },

    Int128(i128),
    /// Opaque 128-bit float/real storage; no arithmetic is implemented here
    /// (out-of-scope numeric-library internals), only faithful carry-through.
    F128([u64; 2]),
    R128([u64; 2]),
    BigInt(BigInt),
    BigFloat { mantissa: BigInt, exponent: i32 },
    BigReal { mantissa: BigInt, exponent: i32 },
    /// Nanoseconds since the Unix epoch.
    Timestamp(i64),

    /// Reserved kinds (`Macro`, `Syntax`, `Nonterminal`, `Loanword`,
    /// `ParseDecl`, `Facade`) whose operations the spec says are not
    /// exercised by the included core. Carries the tag so round-tripping and
    /// `typeof` still work; every other vtable entry on it throws/no-ops.
    Reserved(Kind),
}

/// A heap-allocated object: the common header plus its kind-specific payload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HeapObject {
    pub assigned_symbol: SymbolId,
    pub base: Option<HeapId>,
    pub flags: HeapFlags,
    pub data: HeapData,
    #[serde(skip)]
    marked: Cell<bool>,
}

impl HeapObject {
    #[must_use]
    pub fn kind(&self) -> Kind {
        match &self.data {
            HeapData::BoxedByte(_) => Kind::BoxedByte,
            HeapData::BoxedInt16(_) => Kind::BoxedInt16,
            HeapData::BoxedInt32(_) => Kind::BoxedInt32,
            HeapData::BoxedInt64(_) => Kind::BoxedInt64,
            HeapData::BoxedBool(_) => Kind::BoxedBool,
            HeapData::BoxedF32(_) => Kind::BoxedF32,
            HeapData::BoxedF64(_) => Kind::BoxedF64,
            HeapData::BoxedSymbol(_) => Kind::BoxedSymbol,
            HeapData::BoxedR32(_) => Kind::BoxedR32,
            HeapData::BoxedR64(_) => Kind::BoxedR64,
            HeapData::BoxedChar(_) => Kind::BoxedChar,
            HeapData::BoxedUni(_) => Kind::BoxedUni,
            HeapData::Null => Kind::Null,
            HeapData::List(_) => Kind::List,
            HeapData::UserObject(_) => Kind::UserObject,
            HeapData::Str(_) => Kind::String,
            HeapData::Pair(_) => Kind::Pair,
            HeapData::Range { .. } => Kind::RangeInt64,
            HeapData::ByteArray(_) => Kind::ByteArray,
            HeapData::Handle(_) => Kind::Handle,
            HeapData::Function(_) => Kind::Function,
            HeapData::Closure(_) => Kind::Closure,
            HeapData::TillContinuation { .. } => Kind::TillContinuation,
            HeapData::Int128(_) => Kind::Int128,
            HeapData::F128(_) => Kind::F128,
            HeapData::R128(_) => Kind::R128,
            HeapData::BigInt(_) => Kind::BigInt,
            HeapData::BigFloat { .. } => Kind::BigFloat,
            HeapData::BigReal { .. } => Kind::BigReal,
            HeapData::Timestamp(_) => Kind::Timestamp,
            HeapData::Reserved(kind) => *kind,
        }
    }
}

/// The heap arena. A simple growable `Vec` of slots with a free list for reuse
/// after [`Heap::collect`] runs; this is the conservative tracing GC the spec
/// calls for, scaled down to mark-sweep over an explicit root set (the
/// embedder's closure stack) rather than scanning machine registers.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Option<HeapObject>>,
    free: Vec<HeapId>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, assigned_symbol: SymbolId, base: Option<HeapId>, flags: HeapFlags, data: HeapData) -> HeapId {
        let obj = HeapObject { assigned_symbol, base, flags, data, marked: Cell::new(false) };
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(obj);
            id
        } else {
            let id = HeapId(u32::try_from(self.slots.len()).expect("heap overflow"));
            self.slots.push(Some(obj));
            id
        }
    }

    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapObject {
        self.slots[id.index()].as_ref().expect("dangling HeapId")
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapObject {
        self.slots[id.index()].as_mut().expect("dangling HeapId")
    }

    #[must_use]
    pub fn kind_of(&self, id: HeapId) -> Kind {
        self.get(id).kind()
    }

    /// `base` prototype-chain walk: follows `base` pointers looking for
    /// `symbol` in a `UserObject`'s dict, per §4.1's `getProperty` contract.
    #[must_use]
    pub fn get_property(&self, id: HeapId, symbol: SymbolId) -> Option<SmileArg> {
        let mut current = Some(id);
        // `base` chains are DAGs that terminate at Primitive, never cycles
        // (Design Notes), so an unbounded walk is safe.
        while let Some(cur) = current {
            let obj = self.get(cur);
            if let HeapData::UserObject(data) = &obj.data {
                if let Some(value) = data.dict.get(&symbol) {
                    return Some(*value);
                }
            }
            current = obj.base;
        }
        None
    }

    #[must_use]
    pub fn has_property(&self, id: HeapId, symbol: SymbolId) -> bool {
        self.get_property(id, symbol).is_some()
    }

    /// Sets `symbol` on the object directly (never walks to `base`).
    ///
    /// `key` is whatever security key the caller presents (`None` for
    /// ordinary language-level `$set`, which has no way to present one).
    /// Fails with `security-error` when the object is frozen, carries a
    /// `security_key` the presented `key` doesn't match, or is read-only
    /// (lacks `WRITABLE`) and the property already exists; with
    /// `property-error` when the property is absent and the object is not
    /// appendable — the failure modes §4.1 calls out.
    pub fn set_property(&mut self, id: HeapId, symbol: SymbolId, value: SmileArg, key: Option<SmileArg>) -> Result<(), PropertySetError> {
        let obj = self.get_mut(id);
        if obj.flags.has(HeapFlags::FROZEN) {
            return Err(PropertySetError::Security);
        }
        match &mut obj.data {
            HeapData::UserObject(data) => {
                if let Some(expected) = data.security_key {
                    if key.as_ref().and_then(SmileArg::as_heap_id) != Some(expected) {
                        return Err(PropertySetError::Security);
                    }
                }
                let exists = data.dict.contains_key(&symbol);
                if exists && !obj.flags.has(HeapFlags::WRITABLE) {
                    return Err(PropertySetError::Security);
                }
                if !exists && !obj.flags.has(HeapFlags::APPENDABLE) {
                    return Err(PropertySetError::MissingProperty);
                }
                data.dict.insert(symbol, value);
                Ok(())
            }
            _ => Err(PropertySetError::MissingProperty),
        }
    }

    #[must_use]
    pub fn get_property_names(&self, id: HeapId) -> Vec<SymbolId> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let obj = self.get(cur);
            if let HeapData::UserObject(data) = &obj.data {
                names.extend(data.dict.keys().copied());
            }
            current = obj.base;
        }
        names
    }

    /// `toBool` vtable entry: every kind has a definite truthiness.
    #[must_use]
    pub fn to_bool(&self, id: HeapId) -> bool {
        match &self.get(id).data {
            HeapData::Null => false,
            HeapData::BoxedBool(b) => *b,
            HeapData::BoxedInt64(n) => *n != 0,
            HeapData::BoxedInt32(n) => *n != 0,
            HeapData::BoxedF64(f) => *f != 0.0,
            HeapData::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// `box` vtable entry: promotes an unboxed [`SmileArg`] scalar into an
    /// equivalent heap object. Non-scalar/already-heap args pass through.
    pub fn box_value(&mut self, arg: SmileArg) -> SmileArg {
        let data = match arg {
            SmileArg::Byte(v) => HeapData::BoxedByte(v),
            SmileArg::Int16(v) => HeapData::BoxedInt16(v),
            SmileArg::Int32(v) => HeapData::BoxedInt32(v),
            SmileArg::Int64(v) => HeapData::BoxedInt64(v),
            SmileArg::Bool(v) => HeapData::BoxedBool(v),
            SmileArg::F32(v) => HeapData::BoxedF32(v),
            SmileArg::F64(v) => HeapData::BoxedF64(v),
            SmileArg::Symbol(v) => HeapData::BoxedSymbol(v),
            SmileArg::R32(v) => HeapData::BoxedR32(v.0),
            SmileArg::R64(v) => HeapData::BoxedR64(v.0),
            SmileArg::Char(v) => HeapData::BoxedChar(v),
            SmileArg::Uni(v) => HeapData::BoxedUni(v.0),
            SmileArg::Heap(id) => return SmileArg::Heap(id),
        };
        let id = self.alloc(SymbolId::NONE, None, HeapFlags::default(), data);
        SmileArg::Heap(id)
    }

    /// `unbox` vtable entry: the inverse of [`Self::box_value`]. Returns the
    /// original `SmileArg` unchanged for anything that isn't a boxed scalar.
    #[must_use]
    pub fn unbox_value(&self, arg: SmileArg) -> SmileArg {
        let SmileArg::Heap(id) = arg else { return arg };
        match &self.get(id).data {
            HeapData::BoxedByte(v) => SmileArg::Byte(*v),
            HeapData::BoxedInt16(v) => SmileArg::Int16(*v),
            HeapData::BoxedInt32(v) => SmileArg::Int32(*v),
            HeapData::BoxedInt64(v) => SmileArg::Int64(*v),
            HeapData::BoxedBool(v) => SmileArg::Bool(*v),
            HeapData::BoxedF32(v) => SmileArg::F32(*v),
            HeapData::BoxedF64(v) => SmileArg::F64(*v),
            HeapData::BoxedSymbol(v) => SmileArg::Symbol(*v),
            HeapData::BoxedR32(v) => SmileArg::R32(crate::value::Real32(*v)),
            HeapData::BoxedR64(v) => SmileArg::R64(crate::value::Real64(*v)),
            HeapData::BoxedChar(v) => SmileArg::Char(*v),
            HeapData::BoxedUni(v) => SmileArg::Uni(crate::value::Uni(*v)),
            _ => arg,
        }
    }

    /// `compareEqual` vtable entry: reflexive, symmetric, and treats an
    /// unboxed `K` as equal to a boxed `K` carrying the same payload (§4.1,
    /// and the boxed/unboxed testable property in §8).
    #[must_use]
    pub fn compare_equal(&self, a: SmileArg, b: SmileArg) -> bool {
        let a = self.unbox_value(a);
        let b = self.unbox_value(b);
        match (a, b) {
            (SmileArg::Byte(x), SmileArg::Byte(y)) => x == y,
            (SmileArg::Int16(x), SmileArg::Int16(y)) => x == y,
            (SmileArg::Int32(x), SmileArg::Int32(y)) => x == y,
            (SmileArg::Int64(x), SmileArg::Int64(y)) => x == y,
            (SmileArg::Bool(x), SmileArg::Bool(y)) => x == y,
            (SmileArg::F32(x), SmileArg::F32(y)) => x == y,
            (SmileArg::F64(x), SmileArg::F64(y)) => x == y,
            (SmileArg::Symbol(x), SmileArg::Symbol(y)) => x == y,
            (SmileArg::Char(x), SmileArg::Char(y)) => x == y,
            (SmileArg::Uni(x), SmileArg::Uni(y)) => x == y,
            (SmileArg::Heap(x), SmileArg::Heap(y)) => {
                if x == y {
                    return true;
                }
                match (&self.get(x).data, &self.get(y).data) {
                    (HeapData::Str(s1), HeapData::Str(s2)) => s1 == s2,
                    (HeapData::BigInt(i1), HeapData::BigInt(i2)) => i1 == i2,
                    (HeapData::Null, HeapData::Null) => true,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// `deepEqual` vtable entry: structural equality with cycle-safety. The
    /// visited set records which *heap* pairs we've already assumed equal; on
    /// re-entry for a previously-seen pointer we return `true`, matching the
    /// source's "graph equality by structural correspondence" rule (§4.1, §8).
    #[must_use]
    pub fn deep_equal(&self, a: SmileArg, b: SmileArg, visited: &mut ahash::AHashSet<(HeapId, HeapId)>) -> bool {
        let a = self.unbox_value(a);
        let b = self.unbox_value(b);
        if let (SmileArg::Heap(x), SmileArg::Heap(y)) = (a, b) {
            if x == y || !visited.insert((x, y)) {
                return true;
            }
            return match (&self.get(x).data, &self.get(y).data) {
                (HeapData::List(c1), HeapData::List(c2)) => {
                    self.deep_equal(c1.a, c2.a, visited) && self.deep_equal(c1.d, c2.d, visited)
                }
                (HeapData::Pair(p1), HeapData::Pair(p2)) => {
                    self.deep_equal(p1.left, p2.left, visited) && self.deep_equal(p1.right, p2.right, visited)
                }
                (HeapData::UserObject(u1), HeapData::UserObject(u2)) => {
                    u1.dict.len() == u2.dict.len()
                        && u1.dict.iter().all(|(k, v)| u2.dict.get(k).is_some_and(|v2| self.deep_equal(*v, *v2, visited)))
                }
                _ => self.compare_equal(SmileArg::Heap(x), SmileArg::Heap(y)),
            };
        }
        self.compare_equal(a, b)
    }

    /// `hash` vtable entry: stable within a process, perturbed by the
    /// process-wide [`HashOracle`] so repeated runs of the same program don't
    /// leak identical hash sequences (§3, §8).
    #[must_use]
    pub fn hash(&self, arg: SmileArg, oracle: &HashOracle) -> u64 {
        let arg = self.unbox_value(arg);
        let raw = match arg {
            SmileArg::Byte(v) => u64::from(v),
            SmileArg::Int16(v) => v as u64,
            SmileArg::Int32(v) => v as u64,
            SmileArg::Int64(v) => v as u64,
            SmileArg::Bool(v) => u64::from(v),
            SmileArg::F32(v) => u64::from(v.to_bits()),
            SmileArg::F64(v) => v.to_bits(),
            SmileArg::Symbol(v) => u64::from(v.raw()),
            SmileArg::Char(v) => u64::from(v),
            SmileArg::Uni(v) => u64::from(v.0),
            SmileArg::R32(v) => u64::from(v.0.to_bits()),
            SmileArg::R64(v) => v.0.to_bits(),
            SmileArg::Heap(id) => match &self.get(id).data {
                HeapData::Str(s) => fnv1a(s.as_bytes()),
                HeapData::Null => 0,
                _ => u64::from(id.raw()),
            },
        };
        oracle.perturb(raw)
    }

    /// Marks `root` and everything reachable from it, for use by
    /// [`Self::collect`].
    fn mark(&self, root: HeapId) {
        let obj = self.get(root);
        if obj.marked.replace(true) {
            return; // already visited; base chains/cycles-via-closures are safe to stop at.
        }
        if let Some(base) = obj.base {
            self.mark(base);
        }
        match &obj.data {
            HeapData::List(cell) => {
                self.mark_arg(cell.a);
                self.mark_arg(cell.d);
            }
            HeapData::Pair(p) => {
                self.mark_arg(p.left);
                self.mark_arg(p.right);
            }
            HeapData::UserObject(u) => {
                if let Some(key) = u.security_key {
                    self.mark(key);
                }
                for v in u.dict.values() {
                    self.mark_arg(*v);
                }
            }
            HeapData::Closure(c) => {
                if let Some(parent) = c.parent {
                    self.mark(parent);
                }
                match &c.variables {
                    VariableStorage::Dense(vars) => vars.iter().for_each(|v| self.mark_arg(*v)),
                    VariableStorage::Global(map) => map.values().for_each(|v| self.mark_arg(*v)),
                }
                c.stack.iter().for_each(|v| self.mark_arg(*v));
            }
            HeapData::Range { start, end, step } => {
                self.mark_arg(*start);
                self.mark_arg(*end);
                self.mark_arg(*step);
            }
            HeapData::TillContinuation { target_closure, .. } => self.mark(*target_closure),
            _ => {}
        }
    }

    fn mark_arg(&self, arg: SmileArg) {
        if let SmileArg::Heap(id) = arg {
            self.mark(id);
        }
    }

    /// Conservative tracing collection: marks everything reachable from
    /// `roots`, then frees every unmarked slot for reuse.
    pub fn collect(&mut self, roots: &[SmileArg]) {
        for root in roots {
            self.mark_arg(*root);
        }
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(obj) = slot {
                if !obj.marked.replace(false) {
                    *slot = None;
                    self.free.push(HeapId(u32::try_from(i).expect("heap id fits u32")));
                }
            }
        }
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertySetError {
    Security,
    MissingProperty,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Heap {
        Heap::new()
    }

    #[test]
    fn box_unbox_round_trips_and_compares_equal() {
        let mut heap = fresh();
        let unboxed = SmileArg::Int64(42);
        let boxed = heap.box_value(unboxed);
        assert!(matches!(boxed, SmileArg::Heap(_)));
        assert!(heap.compare_equal(unboxed, boxed));
        assert_eq!(heap.unbox_value(boxed), unboxed);
    }

    #[test]
    fn hash_agrees_for_boxed_and_unboxed_equal_values() {
        let mut heap = fresh();
        let oracle = HashOracle::from_seed(1);
        let unboxed = SmileArg::Int64(99);
        let boxed = heap.box_value(unboxed);
        assert_eq!(heap.hash(unboxed, &oracle), heap.hash(boxed, &oracle));
    }

    #[test]
    fn deep_equal_handles_self_referential_cycles() {
        let mut heap = fresh();
        let id = heap.alloc(
            SymbolId::NONE,
            None,
            HeapFlags::default(),
            HeapData::List(ListCell { a: SmileArg::Int64(1), d: SmileArg::Int64(1) }),
        );
        // Make the cell point at itself through `d`.
        heap.get_mut(id).data = HeapData::List(ListCell { a: SmileArg::Int64(1), d: SmileArg::Heap(id) });
        let mut visited = ahash::AHashSet::default();
        assert!(heap.deep_equal(SmileArg::Heap(id), SmileArg::Heap(id), &mut visited));
    }

    #[test]
    fn set_property_rejects_missing_key_on_non_appendable_object() {
        let mut heap = fresh();
        let id = heap.alloc(
            SymbolId::NONE,
            None,
            HeapFlags::default(),
            HeapData::UserObject(UserObjectData { security_key: None, name: SymbolId::NONE, dict: AHashMap::default() }),
        );
        let sym = SymbolId::from_raw(7);
        let err = heap.set_property(id, sym, SmileArg::Bool(true), None).unwrap_err();
        assert_eq!(err, PropertySetError::MissingProperty);
    }

    #[test]
    fn set_property_succeeds_on_appendable_object() {
        let mut heap = fresh();
        let mut flags = HeapFlags::default();
        flags.set(HeapFlags::APPENDABLE, true);
        let id = heap.alloc(
            SymbolId::NONE,
            None,
            flags,
            HeapData::UserObject(UserObjectData { security_key: None, name: SymbolId::NONE, dict: AHashMap::default() }),
        );
        let sym = SymbolId::from_raw(7);
        heap.set_property(id, sym, SmileArg::Bool(true), None).unwrap();
        assert_eq!(heap.get_property(id, sym), Some(SmileArg::Bool(true)));
    }

    #[test]
    fn property_lookup_falls_through_base_chain() {
        let mut heap = fresh();
        let sym = SymbolId::from_raw(5);
        let mut base_dict = AHashMap::default();
        base_dict.insert(sym, SmileArg::Int64(10));
        let base = heap.alloc(
            SymbolId::NONE,
            None,
            HeapFlags::default(),
            HeapData::UserObject(UserObjectData { security_key: None, name: SymbolId::NONE, dict: base_dict }),
        );
        let child = heap.alloc(
            SymbolId::NONE,
            Some(base),
            HeapFlags::default(),
            HeapData::UserObject(UserObjectData { security_key: None, name: SymbolId::NONE, dict: AHashMap::default() }),
        );
        assert_eq!(heap.get_property(child, sym), Some(SmileArg::Int64(10)));
    }

    #[test]
    fn collect_frees_unreachable_objects_and_keeps_roots() {
        let mut heap = fresh();
        let kept = heap.alloc(SymbolId::NONE, None, HeapFlags::default(), HeapData::BoxedInt64(1));
        let _garbage = heap.alloc(SymbolId::NONE, None, HeapFlags::default(), HeapData::BoxedInt64(2));
        assert_eq!(heap.live_count(), 2);
        heap.collect(&[SmileArg::Heap(kept)]);
        assert_eq!(heap.live_count(), 1);
    }
}
