//! The AST shape [`crate::bytecode::compiler::Compiler`] consumes.
//!
//! §6 is explicit that the compiler's input "is indistinguishable from
//! runtime values" — a macro-expanded Smile program is just nested lists and
//! pairs of the same kinds the interpreter manipulates at run time. This
//! module gives that input a named Rust type for the compiler to pattern
//! match on without reaching into a live [`crate::heap::Heap`] during
//! compilation (the compiler works on free-standing trees, not on
//! already-heap-allocated objects).

use smallvec::SmallVec;

use crate::{compiled_tables::SourceLocation, intern::SymbolId, value::SmileArg};

/// A macro-expanded expression tree node.
///
/// Mirrors the five AST-relevant kinds a macro-expanded program is built
/// from: symbols (variable/property/special-form names), lists (both
/// "applications" and literal data), pairs (`left.right` property access
/// written as a dotted pair), and literal scalars/already-boxed values that
/// pass through the compiler unchanged.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Ast {
    /// A bare symbol: a variable reference, or (as a list head) a special
    /// form keyword or function name.
    Symbol(SymbolId),
    /// `(head arg1 arg2 ...)`, or the empty list `()` when `items` is empty.
    List { items: Vec<Ast>, tail: Option<Box<Ast>>, source_location: Option<SourceLocation> },
    /// `left.right`, Smile's property-access/method-call sugar.
    Pair { left: Box<Ast>, right: Box<Ast>, source_location: Option<SourceLocation> },
    /// Any literal value the parser already produced fully formed — numbers,
    /// strings, booleans — passed straight through to
    /// `CompiledTables::objects`.
    Literal(SmileArg),
}

impl Ast {
    #[must_use]
    pub fn symbol(id: SymbolId) -> Self {
        Self::Symbol(id)
    }

    #[must_use]
    pub fn list(items: Vec<Ast>) -> Self {
        Self::List { items, tail: None, source_location: None }
    }

    #[must_use]
    pub fn is_empty_list(&self) -> bool {
        matches!(self, Self::List { items, tail: None, .. } if items.is_empty())
    }

    /// Returns the list's head and argument slice, when this node is a
    /// non-empty proper list (the common case the compiler's special-form and
    /// call dispatch both start from).
    #[must_use]
    pub fn as_call(&self) -> Option<(&Ast, &[Ast])> {
        match self {
            Self::List { items, .. } if !items.is_empty() => Some((&items[0], &items[1..])),
            _ => None,
        }
    }

    #[must_use]
    pub fn source_location(&self) -> Option<SourceLocation> {
        match self {
            Self::List { source_location, .. } | Self::Pair { source_location, .. } => *source_location,
            _ => None,
        }
    }
}

/// Scratch vector type used while walking argument lists during compilation,
/// sized to avoid heap churn for the common small-arity case.
pub type AstArgs = SmallVec<[Ast; 4]>;
