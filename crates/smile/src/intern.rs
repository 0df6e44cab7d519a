//! Process-wide symbol interning.
//!
//! Every identifier in a Smile program — a variable name, a property name, a
//! special-form keyword — is interned once into a dense, append-only table and
//! referred to everywhere else by a small [`SymbolId`]. Interning happens during
//! parsing (out of scope here) and compilation; the table itself, and the fixed
//! block of well-known names preloaded into it, are the core's responsibility.
//!
//! Symbol ids are never recycled or renumbered: once `get_or_intern` hands out an
//! id for a name, that id is stable for the lifetime of the process. This lets
//! the compiler and interpreter compare symbols as plain integers instead of
//! doing string comparisons on every variable lookup.

use ahash::AHashMap;

/// A process-wide interned identifier.
///
/// `0` is reserved and never returned by [`Interns::get_or_intern`]; it is used
/// internally to mean "no symbol" in contexts that store an optional symbol
/// inline without the overhead of `Option<SymbolId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SymbolId(u32);

impl SymbolId {
    /// The reserved "no symbol" sentinel.
    pub const NONE: Self = Self(0);

    /// Returns the raw integer id, for embedding in bytecode operands.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Reconstructs a `SymbolId` from a raw integer previously returned by [`Self::raw`].
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Names preloaded into the symbol table at construction time.
///
/// Preloading guarantees these ids are fixed constants: code that needs to test
/// "is this symbol `$if`" never does a string lookup, it compares against
/// `Symbols::IF` directly. The order here fixes the numeric values, so it must
/// never be reordered or have entries removed once published.
const PRELOADED_NAMES: &[&str] = &[
    "$if", "$fn", "$quote", "$scope", "$progn", "$prog1", "$set", "$opset", "$include", "$while", "$till", "$return",
    "$catch", "$not", "$or", "$and", "$eq", "$ne", "$new", "$dot", "$index", "$is", "$typeof", "$throw", "a", "d",
    "left", "right", "start", "end", "count", "length",
];

/// Fixed symbol ids for the special forms and well-known property names.
///
/// Populated once by [`Interns::new`] from [`PRELOADED_NAMES`], in order. These
/// are the IDs the compiler compares incoming AST symbols against when deciding
/// whether a list head names a special form, and when choosing a short property
/// opcode (`LdA`, `LdD`, …) over the generic `LdProp`.
#[derive(Debug, Clone, Copy)]
pub struct Symbols {
    pub if_: SymbolId,
    pub fn_: SymbolId,
    pub quote: SymbolId,
    pub scope: SymbolId,
    pub progn: SymbolId,
    pub prog1: SymbolId,
    pub set: SymbolId,
    pub opset: SymbolId,
    pub include: SymbolId,
    pub while_: SymbolId,
    pub till: SymbolId,
    pub return_: SymbolId,
    pub catch: SymbolId,
    pub not: SymbolId,
    pub or: SymbolId,
    pub and: SymbolId,
    pub eq: SymbolId,
    pub ne: SymbolId,
    pub new: SymbolId,
    pub dot: SymbolId,
    pub index: SymbolId,
    pub is: SymbolId,
    pub typeof_: SymbolId,
    pub throw: SymbolId,
    pub a: SymbolId,
    pub d: SymbolId,
    pub left: SymbolId,
    pub right: SymbolId,
    pub start: SymbolId,
    pub end: SymbolId,
    pub count: SymbolId,
    pub length: SymbolId,
}

/// Process-wide mapping from identifier text to dense [`SymbolId`].
///
/// Adds are append-only; `name_of` and `get_no_create` never observe an id going
/// away or changing meaning. This mirrors `symboltable.h` in the original
/// implementation, minus the thread-safety wrapper (the core is single-threaded,
/// see the concurrency model).
#[derive(Debug, Default)]
pub struct Interns {
    by_name: AHashMap<Box<str>, SymbolId>,
    names: Vec<Box<str>>,
}

impl Interns {
    /// Builds a fresh symbol table with the well-known names preloaded, and
    /// returns it along with the fixed ids those names were assigned.
    #[must_use]
    pub fn new() -> (Self, Symbols) {
        let mut interns = Self::default();
        let ids: Vec<SymbolId> = PRELOADED_NAMES.iter().map(|name| interns.get_or_intern(name)).collect();
        let mut it = ids.into_iter();
        let mut next = || it.next().expect("PRELOADED_NAMES / Symbols field mismatch");
        let symbols = Symbols {
            if_: next(),
            fn_: next(),
            quote: next(),
            scope: next(),
            progn: next(),
            prog1: next(),
            set: next(),
            opset: next(),
            include: next(),
            while_: next(),
            till: next(),
            return_: next(),
            catch: next(),
            not: next(),
            or: next(),
            and: next(),
            eq: next(),
            ne: next(),
            new: next(),
            dot: next(),
            index: next(),
            is: next(),
            typeof_: next(),
            throw: next(),
            a: next(),
            d: next(),
            left: next(),
            right: next(),
            start: next(),
            end: next(),
            count: next(),
            length: next(),
        };
        (interns, symbols)
    }

    /// Interns `name`, returning its existing id if already present or assigning
    /// a fresh, never-reused id otherwise.
    pub fn get_or_intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        // id 0 is reserved, so the table starts at length 1.
        let id = SymbolId(u32::try_from(self.names.len() + 1).expect("symbol table overflow"));
        self.names.push(name.into());
        self.by_name.insert(name.into(), id);
        id
    }

    /// Looks up `name` without interning it if absent.
    #[must_use]
    pub fn get_no_create(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Returns the original text for a previously interned symbol.
    ///
    /// Panics if `symbol` was never issued by this table; that would indicate a
    /// symbol from a different `Interns` instance leaking in, which is a bug.
    #[must_use]
    pub fn name_of(&self, symbol: SymbolId) -> &str {
        &self.names[symbol.index()]
    }
}

impl SymbolId {
    fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let (mut interns, _) = Interns::new();
        let a = interns.get_or_intern("foo");
        let b = interns.get_or_intern("foo");
        assert_eq!(a, b);
        assert_eq!(interns.name_of(a), "foo");
    }

    #[test]
    fn unseen_name_is_not_created_by_probe() {
        let (interns, _) = Interns::new();
        assert!(interns.get_no_create("never-seen").is_none());
    }

    #[test]
    fn preloaded_symbols_are_stable_and_distinct() {
        let (_interns, symbols) = Interns::new();
        let ids = [
            symbols.if_,
            symbols.fn_,
            symbols.quote,
            symbols.scope,
            symbols.progn,
            symbols.prog1,
            symbols.set,
            symbols.opset,
            symbols.include,
            symbols.while_,
            symbols.till,
            symbols.return_,
            symbols.catch,
            symbols.not,
            symbols.or,
            symbols.and,
            symbols.eq,
            symbols.ne,
            symbols.new,
            symbols.dot,
            symbols.index,
            symbols.is,
            symbols.typeof_,
            symbols.a,
            symbols.d,
            symbols.left,
            symbols.right,
            symbols.start,
            symbols.end,
            symbols.count,
            symbols.length,
        ];
        let mut sorted = ids.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len(), "preloaded symbols must be pairwise distinct");
    }

    #[test]
    fn names_survive_round_trip() {
        let (interns, symbols) = Interns::new();
        assert_eq!(interns.name_of(symbols.if_), "$if");
        assert_eq!(interns.name_of(symbols.length), "length");
    }
}
