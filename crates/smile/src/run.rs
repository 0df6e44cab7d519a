//! `Engine`: the crate's public entry point, grounded on the teacher's
//! `Runner` (compile-then-drive shape, minus the async-resumption machinery
//! this crate has no use for — Smile functions here run synchronously to
//! completion rather than yielding mid-call).

use crate::{
    ast::Ast,
    bytecode::{compiler::Compiler, vm::Interpreter, ByteCodeSegment},
    compiled_tables::CompiledTables,
    exception::{ParseMessage, RunResult},
    intern::{Interns, Symbols},
    tracer::{NoopTracer, VmTracer},
    value::SmileArg,
};

/// Default maximum user-call nesting depth, matching the recursion ceiling
/// `abi`/`ArgCheckFlags` assumes when reasoning about stack exhaustion.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Result of [`Engine::compile`]: either a runnable top-level body, or the
/// accumulated [`ParseMessage`]s explaining why compilation failed.
pub enum CompileOutcome {
    Ready { body: ByteCodeSegment, tables: CompiledTables, messages: Vec<ParseMessage> },
    Errors(Vec<ParseMessage>),
}

/// Compiles and runs Smile programs expressed as [`Ast`] trees.
///
/// One `Engine` owns one compiled program's [`CompiledTables`]; running it
/// multiple times (e.g. re-invoking the top-level body) reuses the same
/// tables without recompiling.
pub struct Engine<Tr: VmTracer = NoopTracer> {
    tracer: Tr,
    max_call_depth: usize,
}

impl Engine<NoopTracer> {
    #[must_use]
    pub fn new() -> Self {
        Self { tracer: NoopTracer, max_call_depth: DEFAULT_MAX_CALL_DEPTH }
    }
}

impl Default for Engine<NoopTracer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tr: VmTracer> Engine<Tr> {
    #[must_use]
    pub fn with_tracer(tracer: Tr) -> Self {
        Self { tracer, max_call_depth: DEFAULT_MAX_CALL_DEPTH }
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Compiles `ast` against a fresh [`Symbols`] table, returning the
    /// resulting bytecode and literal pools, or the diagnostics explaining
    /// why compilation was rejected.
    #[must_use]
    pub fn compile(ast: &Ast, symbols: &Symbols) -> CompileOutcome {
        Self::compile_with_modules(ast, &[], symbols)
    }

    /// Compiles `ast` alongside a set of named modules it may `$include`
    /// from, each compiled first so its export set is known before `ast`
    /// itself is (§2 #10, §4.3). `modules[i]`'s position is *not* its module
    /// id — `[$include moduleId ...]` addresses a module by the id
    /// [`crate::bytecode::compiler::Compiler::compile_module`] assigned it,
    /// which source authors obtain out of band (e.g. by compiling modules
    /// first and recording the returned ids).
    #[must_use]
    pub fn compile_with_modules(ast: &Ast, modules: &[(crate::intern::SymbolId, Ast)], symbols: &Symbols) -> CompileOutcome {
        let mut compiler = Compiler::new(symbols);
        for (name, module_ast) in modules {
            compiler.compile_module(*name, module_ast);
        }
        let (top_level, tables, messages) = compiler.compile_program(ast);
        let has_errors = messages.iter().any(|m| {
            matches!(m.kind, crate::exception::ParseMessageKind::Error | crate::exception::ParseMessageKind::Fatal)
        });
        if has_errors {
            return CompileOutcome::Errors(messages);
        }
        CompileOutcome::Ready { body: top_level.body, tables, messages }
    }

    /// Runs a previously compiled program's top-level body to completion.
    ///
    /// `interns`/`symbols` must be the same pair `ast` was read/compiled
    /// against: bytecode operands carry `SymbolId`s assigned by that table,
    /// so running against a different one would make property and global
    /// lookups resolve the wrong names (or none at all).
    pub fn run(self, interns: Interns, symbols: Symbols, body: &ByteCodeSegment, tables: &CompiledTables) -> RunResult<SmileArg> {
        let mut interp = Interpreter::new(tables, interns, symbols, self.tracer, self.max_call_depth);
        interp.run(body, None, &[], crate::closure::ClosureKind::Global)
    }

    /// Compiles and runs `ast` in one step, for callers that don't need to
    /// keep the compiled form around. `ast` must have been built against a
    /// fresh [`Interns`] table of its own (e.g. via [`crate::sexpr::read_one`]).
    pub fn eval(self, interns: Interns, symbols: Symbols, ast: &Ast) -> RunResult<SmileArg> {
        match Self::compile(ast, &symbols) {
            CompileOutcome::Ready { body, tables, .. } => self.run(interns, symbols, &body, &tables),
            CompileOutcome::Errors(messages) => {
                let message = messages.first().map_or_else(|| "compilation failed".to_string(), |m| m.message.clone());
                Err(crate::exception::Throw::new(crate::exception::ExcType::ParseError, SmileArg::Bool(false), message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_of_a_literal_returns_the_literal() {
        let (interns, symbols) = crate::intern::Interns::new();
        let ast = Ast::Literal(SmileArg::Int64(42));
        let engine = Engine::new();
        let CompileOutcome::Ready { body, tables, .. } = Engine::<NoopTracer>::compile(&ast, &symbols) else {
            panic!("expected successful compile")
        };
        let result = engine.run(interns, symbols, &body, &tables).unwrap();
        assert_eq!(result, SmileArg::Int64(42));
    }

    #[test]
    fn eval_of_an_if_expression_takes_the_true_branch() {
        let (interns, symbols) = crate::intern::Interns::new();
        let ast = Ast::List {
            items: vec![
                Ast::Symbol(symbols.if_),
                Ast::Literal(SmileArg::Bool(true)),
                Ast::Literal(SmileArg::Int64(1)),
                Ast::Literal(SmileArg::Int64(2)),
            ],
            tail: None,
            source_location: None,
        };
        let engine = Engine::new();
        let CompileOutcome::Ready { body, tables, .. } = Engine::<NoopTracer>::compile(&ast, &symbols) else {
            panic!("expected successful compile")
        };
        let result = engine.run(interns, symbols, &body, &tables).unwrap();
        assert_eq!(result, SmileArg::Int64(1));
    }

    #[test]
    fn eval_compiles_and_runs_in_one_step() {
        let (interns, symbols) = crate::intern::Interns::new();
        let ast = Ast::Literal(SmileArg::Int64(7));
        let result = Engine::new().eval(interns, symbols, &ast).unwrap();
        assert_eq!(result, SmileArg::Int64(7));
    }

    /// §8 scenario 5: module A exports `foo = 42`; `[$include <A.id> foo
    /// bar]` in the main program binds `bar` to it.
    #[test]
    fn include_binds_a_modules_export_to_a_local_name() {
        let (mut interns, symbols) = crate::intern::Interns::new();
        let foo = interns.get_or_intern("foo");
        let bar = interns.get_or_intern("bar");
        let module_a_name = interns.get_or_intern("A");

        let module_a = Ast::List {
            items: vec![Ast::Symbol(symbols.set), Ast::Symbol(foo), Ast::Literal(SmileArg::Int64(42))],
            tail: None,
            source_location: None,
        };
        let include = Ast::List {
            items: vec![Ast::Symbol(symbols.include), Ast::Literal(SmileArg::Int64(0)), Ast::Symbol(foo), Ast::Symbol(bar)],
            tail: None,
            source_location: None,
        };
        let ast =
            Ast::List { items: vec![Ast::Symbol(symbols.progn), include, Ast::Symbol(bar)], tail: None, source_location: None };

        let CompileOutcome::Ready { body, tables, .. } =
            Engine::<NoopTracer>::compile_with_modules(&ast, &[(module_a_name, module_a)], &symbols)
        else {
            panic!("expected successful compile")
        };
        let result = Engine::new().run(interns, symbols, &body, &tables).unwrap();
        assert_eq!(result, SmileArg::Int64(42));
    }

    /// §8 scenario 5: if the named module's exports don't contain the
    /// requested member, compilation fails rather than binding `null`.
    #[test]
    fn include_of_a_missing_export_fails_to_compile() {
        let (mut interns, symbols) = crate::intern::Interns::new();
        let foo = interns.get_or_intern("foo");
        let other = interns.get_or_intern("other");
        let bar = interns.get_or_intern("bar");
        let module_a_name = interns.get_or_intern("A");

        let module_a = Ast::List {
            items: vec![Ast::Symbol(symbols.set), Ast::Symbol(other), Ast::Literal(SmileArg::Int64(1))],
            tail: None,
            source_location: None,
        };
        let ast = Ast::List {
            items: vec![Ast::Symbol(symbols.include), Ast::Literal(SmileArg::Int64(0)), Ast::Symbol(foo), Ast::Symbol(bar)],
            tail: None,
            source_location: None,
        };

        let outcome = Engine::<NoopTracer>::compile_with_modules(&ast, &[(module_a_name, module_a)], &symbols);
        assert!(matches!(outcome, CompileOutcome::Errors(_)));
    }
}
