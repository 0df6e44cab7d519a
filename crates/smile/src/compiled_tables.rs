//! `CompiledTables`: the pools a compiled program's bytecode indexes into.
//!
//! Bytecode operands never embed a literal object, string, or function
//! descriptor inline — they carry a small index into one of these pools,
//! resolved at the point of use. This keeps [`crate::bytecode::ByteCode`]
//! itself `Copy`-friendly and matches the literal-table pattern the source
//! compiler's `CompiledTables` groundwork uses.

use crate::{function::UserFunctionInfo, module::ModuleDescriptor, value::SmileArg};

/// A single source position: byte offset plus a human line/column for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

/// The literal/descriptor pools a single compiled program shares across all
/// its functions' bytecode.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CompiledTables {
    /// Literal values embedded by `LdObj`-family opcodes (quoted lists,
    /// literal strings already boxed onto the heap, etc.).
    pub objects: Vec<SmileArg>,
    /// One descriptor per `$fn` the compiler encountered, indexed by
    /// `FunctionData::User::info_index`.
    pub user_functions: Vec<UserFunctionInfo>,
    /// Raw string literals that have not (yet) been boxed onto the heap,
    /// kept distinct from `objects` so string-heavy programs don't force
    /// early heap allocation during compilation.
    pub strings: Vec<Box<str>>,
    /// Source positions referenced by bytecode instructions that carry one,
    /// for stack-trace and diagnostic reporting.
    pub source_locations: Vec<SourceLocation>,
    /// One descriptor per module compiled alongside this program, indexed by
    /// the "integer module id" `$include`/`LdInclude` address it by.
    pub modules: Vec<ModuleDescriptor>,
}

impl CompiledTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, value: SmileArg) -> u32 {
        let index = u32::try_from(self.objects.len()).expect("object table overflow");
        self.objects.push(value);
        index
    }

    pub fn add_user_function(&mut self, info: UserFunctionInfo) -> u32 {
        let index = u32::try_from(self.user_functions.len()).expect("function table overflow");
        self.user_functions.push(info);
        index
    }

    pub fn add_string(&mut self, s: impl Into<Box<str>>) -> u32 {
        let index = u32::try_from(self.strings.len()).expect("string table overflow");
        self.strings.push(s.into());
        index
    }

    pub fn add_source_location(&mut self, loc: SourceLocation) -> u32 {
        let index = u32::try_from(self.source_locations.len()).expect("source location table overflow");
        self.source_locations.push(loc);
        index
    }

    pub fn add_module(&mut self, descriptor: ModuleDescriptor) -> u32 {
        let index = u32::try_from(self.modules.len()).expect("module table overflow");
        self.modules.push(descriptor);
        index
    }

    #[must_use]
    pub fn user_function(&self, index: u32) -> &UserFunctionInfo {
        &self.user_functions[index as usize]
    }

    #[must_use]
    pub fn module(&self, module_id: u32) -> Option<&ModuleDescriptor> {
        self.modules.get(module_id as usize)
    }

    #[must_use]
    pub fn object(&self, index: u32) -> SmileArg {
        self.objects[index as usize]
    }

    #[must_use]
    pub fn string(&self, index: u32) -> &str {
        &self.strings[index as usize]
    }

    /// Serializes these tables to `postcard`'s compact binary form, so a
    /// compiled program can be cached to disk instead of recompiled on every
    /// run.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Inverse of [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_indices_are_stable_and_dense() {
        let mut tables = CompiledTables::new();
        let a = tables.add_object(SmileArg::Int64(1));
        let b = tables.add_object(SmileArg::Int64(2));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(tables.object(a), SmileArg::Int64(1));
        assert_eq!(tables.object(b), SmileArg::Int64(2));
    }

    #[test]
    fn string_table_preserves_insertion_order() {
        let mut tables = CompiledTables::new();
        let idx = tables.add_string("hello");
        assert_eq!(tables.string(idx), "hello");
    }

    #[test]
    fn round_trips_through_postcard() {
        let mut tables = CompiledTables::new();
        tables.add_object(SmileArg::Int64(9));
        tables.add_string("round-trip");
        let bytes = tables.to_bytes().unwrap();
        let restored = CompiledTables::from_bytes(&bytes).unwrap();
        assert_eq!(restored.object(0), SmileArg::Int64(9));
        assert_eq!(restored.string(0), "round-trip");
    }
}
