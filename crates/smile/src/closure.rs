//! `ClosureInfo`: the immutable, compile-time descriptor of a closure's shape.
//!
//! This is distinct from [`crate::heap::ClosureData`], which is the mutable,
//! per-call activation record living on the heap. `ClosureInfo` is produced
//! once by the compiler and shared by every activation of the same function;
//! `ClosureData` is allocated fresh on every call and holds the actual
//! variable values. Grounded on the LOCAL-dense vs GLOBAL-dict split in
//! `namespace.rs`'s `NamespaceId`/`Namespace` design.

use smallvec::SmallVec;

use crate::intern::SymbolId;

/// Whether a closure's variables are addressed by dense compile-time slot
/// index (`Local`, the common case for function bodies and `$scope` blocks)
/// or by name through a dictionary (`Global`, for the outermost/top-level
/// closure and anything introspectable at runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClosureKind {
    Local,
    Global,
}

/// The immutable descriptor the compiler builds for every closure it
/// introduces (function bodies, `$scope` blocks, the top-level program).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClosureInfo {
    pub kind: ClosureKind,
    /// Number of argument slots occupying the front of the dense variable
    /// array, for `Local` closures; `0` for `Global`.
    pub num_args: u16,
    /// Total dense variable-slot count (arguments plus locals), for `Local`
    /// closures.
    pub num_variables: u16,
    /// Scratch stack depth the compiler computed this closure's body needs,
    /// beyond its variable slots.
    pub temp_size: u16,
    /// Variable names in slot order, kept for diagnostics and for resolving
    /// `$scope`-declared names back to a slot at compile time. Not consulted
    /// at run time.
    pub variable_names: SmallVec<[SymbolId; 8]>,
}

impl ClosureInfo {
    #[must_use]
    pub fn new_local(num_args: u16) -> Self {
        Self { kind: ClosureKind::Local, num_args, num_variables: num_args, temp_size: 0, variable_names: SmallVec::new() }
    }

    #[must_use]
    pub fn new_global() -> Self {
        Self { kind: ClosureKind::Global, num_args: 0, num_variables: 0, temp_size: 0, variable_names: SmallVec::new() }
    }

    /// Reserves a fresh dense slot for `name`, returning its index. Only
    /// meaningful for `Local` closures; the compiler never calls this on a
    /// `Global` one.
    pub fn add_local(&mut self, name: SymbolId) -> u16 {
        debug_assert_eq!(self.kind, ClosureKind::Local);
        let index = self.num_variables;
        self.num_variables += 1;
        self.variable_names.push(name);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_local_assigns_dense_increasing_slots() {
        let mut info = ClosureInfo::new_local(2);
        let first = info.add_local(SymbolId::from_raw(1));
        let second = info.add_local(SymbolId::from_raw(2));
        assert_eq!(first, 2);
        assert_eq!(second, 3);
        assert_eq!(info.num_variables, 4);
    }

    #[test]
    fn global_closures_start_with_no_dense_slots() {
        let info = ClosureInfo::new_global();
        assert_eq!(info.kind, ClosureKind::Global);
        assert_eq!(info.num_variables, 0);
    }
}
