//! Module/include resolution: lazy, once-only module initialization plus an
//! export dictionary.
//!
//! `$include` (§4.4) addresses a module by its integer id (§4.3); the first
//! time a given id is included, its body runs to completion and whatever it
//! leaves in its top-level closure's global dictionary becomes that module's
//! export set. Every subsequent `$include` of the same id reuses the cached
//! exports without re-running the body, matching the "lazy, once-only"
//! wording in the spec.

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{intern::SymbolId, value::SmileArg};

/// Compile-time descriptor for one module (§2 #10, "Module contract"):
/// which `UserFunctionInfo` its body compiled to (a `Global`-kind closure,
/// same shape as the main program's top level) and the export names its
/// top-level `$set`s are known, at compile time, to define — in the order
/// `$include`'s `memberOffset` addresses them by. `name` is carried for
/// diagnostics only; modules are addressed at both compile and run time by
/// their index into `CompiledTables::modules`, the "integer module id" §4.3
/// describes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModuleDescriptor {
    pub name: SymbolId,
    pub function_index: u32,
    pub exports: Vec<SymbolId>,
}

/// One resolved module: its export dictionary, captured once after its body
/// finished running. Insertion order is preserved (an `IndexMap` rather than
/// the `ahash`-backed dictionaries used elsewhere) so that `memberOffset`
/// addresses the same export `$include` validated at compile time.
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    pub exports: IndexMap<SymbolId, SmileArg>,
}

/// State tracked while a module's body is running, to detect a module
/// including itself transitively (a cycle, which is a compile/run error
/// rather than silently re-entering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleState {
    InProgress,
    Ready,
}

/// Cache of resolved modules, keyed by module id (the module's index into
/// `CompiledTables::modules`).
#[derive(Debug, Default)]
pub struct ModuleResolver {
    states: AHashMap<u32, ModuleState>,
    exports: AHashMap<u32, ModuleExports>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeError {
    /// The named module is already being loaded further up the include
    /// chain — a circular `$include`.
    CircularInclude,
}

impl ModuleResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `module_id` as currently loading. Returns an error if it's
    /// already in progress (a cycle) or already resolved (a caller bug —
    /// check [`Self::is_ready`] first).
    pub fn begin_load(&mut self, module_id: u32) -> Result<(), IncludeError> {
        match self.states.get(&module_id) {
            Some(ModuleState::InProgress) => Err(IncludeError::CircularInclude),
            Some(ModuleState::Ready) => Ok(()),
            None => {
                self.states.insert(module_id, ModuleState::InProgress);
                Ok(())
            }
        }
    }

    /// Records the finished module's exports and marks it ready, so future
    /// `$include`s of the same module id hit the cache.
    pub fn finish_load(&mut self, module_id: u32, exports: ModuleExports) {
        self.states.insert(module_id, ModuleState::Ready);
        self.exports.insert(module_id, exports);
    }

    #[must_use]
    pub fn get(&self, module_id: u32) -> Option<&ModuleExports> {
        self.exports.get(&module_id)
    }

    #[must_use]
    pub fn is_ready(&self, module_id: u32) -> bool {
        matches!(self.states.get(&module_id), Some(ModuleState::Ready))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_load_of_ready_module_succeeds_without_rerunning() {
        let mut resolver = ModuleResolver::new();
        resolver.begin_load(1).unwrap();
        resolver.finish_load(1, ModuleExports::default());
        assert!(resolver.begin_load(1).is_ok());
        assert!(resolver.is_ready(1));
    }

    #[test]
    fn reentrant_begin_load_reports_circular_include() {
        let mut resolver = ModuleResolver::new();
        resolver.begin_load(2).unwrap();
        assert_eq!(resolver.begin_load(2), Err(IncludeError::CircularInclude));
    }

    #[test]
    fn unresolved_module_has_no_exports() {
        let resolver = ModuleResolver::new();
        assert!(resolver.get(3).is_none());
    }
}
