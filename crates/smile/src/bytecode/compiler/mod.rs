//! The compiler: lowers a macro-expanded [`crate::ast::Ast`] tree into a
//! [`crate::bytecode::ByteCodeSegment`] through the [`crate::bytecode::ir`]
//! block representation.
//!
//! `compile_expr` is the single entry point every special form and the
//! general call path recurse through; it returns a [`CompiledBlock`]
//! summary (`max_stack_depth`/`final_stack_delta`/whether the expression
//! can escape) that callers use to keep the enclosing function's declared
//! stack depth correct without re-walking the emitted instructions.

mod call;
mod property;
mod special_forms;
mod variable;

use smallvec::SmallVec;

use crate::{
    ast::Ast,
    bytecode::{ir::Block, Opcode, UnionOperand},
    closure::ClosureInfo,
    compiled_tables::CompiledTables,
    exception::{ParseMessage, ParseMessageKind},
    function::{ArgCheckFlags, UserFunctionInfo},
    intern::Symbols,
};

/// Flags threaded through `compile_expr` describing the syntactic position
/// an expression is being compiled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileFlags {
    bits: u8,
}

impl CompileFlags {
    /// The expression is in tail position: a `$return`/escape from here may
    /// be compiled as a direct `Ret` rather than an explicit unwind.
    pub const TAIL: u8 = 0x01;
    /// The expression's result is discarded; the compiler may skip pushing a
    /// value where it's safe to (e.g. the non-final statements of `$progn`).
    pub const DISCARD: u8 = 0x02;

    #[must_use]
    pub fn new(bits: u8) -> Self {
        Self { bits }
    }

    #[must_use]
    pub fn has(self, flag: u8) -> bool {
        self.bits & flag != 0
    }

    #[must_use]
    pub fn with(self, flag: u8) -> Self {
        Self { bits: self.bits | flag }
    }

    #[must_use]
    pub fn without(self, flag: u8) -> Self {
        Self { bits: self.bits & !flag }
    }
}

/// Summary of a just-compiled expression, returned by every `compile_*`
/// function so callers can maintain the enclosing function's declared
/// maximum stack depth without re-scanning emitted instructions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompiledBlock {
    pub max_stack_depth: u32,
    /// Net change to the stack depth this expression leaves behind (should be
    /// `+1` for anything compiled in non-discard position: exactly one result
    /// value pushed).
    pub final_stack_delta: i32,
    /// True if compiling this expression can produce a `$return`/`$brk`-style
    /// escape that exits the enclosing function early.
    pub escapes: bool,
}

impl CompiledBlock {
    fn leaf(delta: i32) -> Self {
        Self { max_stack_depth: delta.unsigned_abs(), final_stack_delta: delta, escapes: false }
    }

    fn merge_sequential(self, other: Self, running_depth: u32) -> Self {
        Self {
            max_stack_depth: self.max_stack_depth.max(running_depth + other.max_stack_depth),
            final_stack_delta: self.final_stack_delta + other.final_stack_delta,
            escapes: self.escapes || other.escapes,
        }
    }
}

/// Per-`$scope` (and per-function) lexical layer of declared local names.
///
/// A chain of these — one per nested `$scope` or function body — is what
/// `compile_variable::resolve` walks outward through when looking up a name,
/// mirroring `parsescope.h`'s nested-scope chain.
#[derive(Debug, Default)]
pub struct CompileScope {
    /// `(name, slot)` pairs declared directly in this scope, innermost
    /// declarations last so shadowing a previous `$scope` variable of the
    /// same name just means a later lookup hit wins.
    locals: SmallVec<[(crate::intern::SymbolId, u16); 8]>,
}

impl CompileScope {
    fn declare(&mut self, name: crate::intern::SymbolId, slot: u16) {
        self.locals.push((name, slot));
    }

    fn lookup(&self, name: crate::intern::SymbolId) -> Option<u16> {
        self.locals.iter().rev().find(|(n, _)| *n == name).map(|(_, slot)| *slot)
    }
}

/// One function currently being compiled: its growing [`Block`], its
/// [`ClosureInfo`] descriptor, and the stack of lexical [`CompileScope`]s
/// open within it.
struct FunctionCompiler {
    block: Block,
    closure_info: ClosureInfo,
    scopes: Vec<CompileScope>,
    function_depth: u16,
}

impl FunctionCompiler {
    fn new(closure_info: ClosureInfo, function_depth: u16) -> Self {
        Self { block: Block::new(), closure_info, scopes: vec![CompileScope::default()], function_depth }
    }
}

/// Top-level compiler state: one [`CompiledTables`] shared by every function
/// compiled in this unit, a stack of in-progress [`FunctionCompiler`]s (one
/// pushed per nested `$fn`), and accumulated [`ParseMessage`]s.
pub struct Compiler<'a> {
    pub tables: CompiledTables,
    pub symbols: &'a Symbols,
    functions: Vec<FunctionCompiler>,
    pub messages: Vec<ParseMessage>,
    /// While compiling a module's top-level body (between [`Self::compile_module`]'s
    /// push and pop), the names its `$set`/`$opset` write to the global
    /// dictionary — that module's inferred export set. `None` outside a
    /// module body, so ordinary top-level/program compilation doesn't pay for
    /// tracking it.
    current_module_exports: Option<Vec<crate::intern::SymbolId>>,
}

impl<'a> Compiler<'a> {
    #[must_use]
    pub fn new(symbols: &'a Symbols) -> Self {
        let top = FunctionCompiler::new(ClosureInfo::new_global(), 0);
        Self { tables: CompiledTables::new(), symbols, functions: vec![top], messages: Vec::new(), current_module_exports: None }
    }

    fn current(&mut self) -> &mut FunctionCompiler {
        self.functions.last_mut().expect("compiler always has an active function")
    }

    fn functions_for_resolution(&self) -> &[FunctionCompiler] {
        &self.functions
    }

    fn function_depth(&self) -> u16 {
        self.functions.last().map_or(0, |f| f.function_depth)
    }

    fn push_function(&mut self, func: FunctionCompiler) {
        self.functions.push(func);
    }

    fn pop_function(&mut self) -> FunctionCompiler {
        self.functions.pop().expect("push_function/pop_function are balanced")
    }

    fn emit_current(&mut self, opcode: Opcode, operand: UnionOperand) {
        self.current().block.emit(opcode, operand);
    }

    fn emit_branch(&mut self, opcode: Opcode, target: crate::bytecode::ir::Label) {
        self.current().block.emit_branch(opcode, target);
    }

    fn place_label(&mut self, label: crate::bytecode::ir::Label) {
        self.current().block.place_label(label);
    }

    fn error(&mut self, message: impl Into<String>) {
        self.messages.push(ParseMessage { kind: ParseMessageKind::Error, source_location: None, message: message.into() });
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| matches!(m.kind, ParseMessageKind::Error | ParseMessageKind::Fatal))
    }

    /// Records `name` as a global write observed while compiling the current
    /// module's body, if one is in progress. Called from [`variable::compile_write`]'s
    /// `Global` resolution; a no-op for ordinary (non-module) compilation.
    fn note_global_write(&mut self, name: crate::intern::SymbolId) {
        if let Some(exports) = self.current_module_exports.as_mut() {
            if !exports.contains(&name) {
                exports.push(name);
            }
        }
    }

    /// Compiles one module's top-level program against this compiler's
    /// shared `tables`/`symbols`, registering it as a fresh entry in
    /// `tables.modules` and returning its module id — the index `$include`
    /// addresses it by (§4.3, §4.4 "Module contract"). Must run before any
    /// `$include` referencing it is compiled, so the export-membership check
    /// has something to validate against.
    ///
    /// A module's export set isn't declared separately — it's whichever
    /// names the module's own top-level `$set`/`$opset` writes resolve to a
    /// global (§4.4: "whatever it leaves in its top-level closure's global
    /// dictionary becomes that module's export set"), in first-write order.
    pub fn compile_module(&mut self, name: crate::intern::SymbolId, ast: &Ast) -> u32 {
        self.push_function(FunctionCompiler::new(ClosureInfo::new_global(), 0));
        let outer_exports = self.current_module_exports.replace(Vec::new());

        let flags = CompileFlags::new(CompileFlags::TAIL);
        self.compile_expr(ast, flags);
        self.current().block.emit(Opcode::Ret, UnionOperand::None);

        let exports = self.current_module_exports.take().unwrap_or_default();
        self.current_module_exports = outer_exports;
        let module_fn = self.pop_function();

        let info = UserFunctionInfo {
            name,
            closure_info: module_fn.closure_info,
            body: module_fn.block.flatten(),
            min_args: 0,
            max_args: 0,
            arg_check: ArgCheckFlags::new(ArgCheckFlags::EXACT),
        };
        let function_index = self.tables.add_user_function(info);
        self.tables.add_module(crate::module::ModuleDescriptor { name, function_index, exports })
    }

    /// Compiles a full top-level program, returning the resulting top-level
    /// [`UserFunctionInfo`] (a `Global`-kind closure with no arguments) plus
    /// the shared [`CompiledTables`].
    pub fn compile_program(mut self, ast: &Ast) -> (UserFunctionInfo, CompiledTables, Vec<ParseMessage>) {
        let flags = CompileFlags::new(CompileFlags::TAIL);
        self.compile_expr(ast, flags);
        self.current().block.emit(Opcode::Ret, UnionOperand::None);
        let top = self.functions.pop().expect("top-level function frame");
        let info = UserFunctionInfo {
            name: crate::intern::SymbolId::NONE,
            closure_info: top.closure_info,
            body: top.block.flatten(),
            min_args: 0,
            max_args: 0,
            arg_check: crate::function::ArgCheckFlags::new(ArgCheckFlags::EXACT),
        };
        (info, self.tables, self.messages)
    }

    /// The single recursive entry point: dispatches on the AST node's shape,
    /// checking for special forms first when the node is a call whose head
    /// is one of the preloaded keyword symbols.
    pub fn compile_expr(&mut self, ast: &Ast, flags: CompileFlags) -> CompiledBlock {
        match ast {
            Ast::Literal(value) => {
                let index = self.tables.add_object(*value);
                self.current().block.emit(Opcode::LdObj, UnionOperand::ObjectIndex(index));
                CompiledBlock::leaf(1)
            }
            Ast::Symbol(sym) => variable::compile_read(self, *sym),
            Ast::Pair { left, right, .. } => property::compile_read(self, left, right),
            Ast::List { items, tail: None, .. } if items.is_empty() => {
                self.current().block.emit(Opcode::LdNull, UnionOperand::None);
                CompiledBlock::leaf(1)
            }
            Ast::List { .. } => self.compile_call_form(ast, flags),
        }
    }

    fn compile_call_form(&mut self, ast: &Ast, flags: CompileFlags) -> CompiledBlock {
        let Some((head, args)) = ast.as_call() else {
            self.error("Cannot compile: expression is not well-formed.");
            return CompiledBlock::default();
        };
        if let Ast::Symbol(sym) = head {
            let sym = *sym;
            let symbols = self.symbols;
            if sym == symbols.if_ {
                return special_forms::compile_if(self, args);
            } else if sym == symbols.and {
                return special_forms::compile_and(self, args);
            } else if sym == symbols.or {
                return special_forms::compile_or(self, args);
            } else if sym == symbols.scope {
                return special_forms::compile_scope(self, args);
            } else if sym == symbols.progn {
                return special_forms::compile_progn(self, args, flags);
            } else if sym == symbols.prog1 {
                return special_forms::compile_prog1(self, args);
            } else if sym == symbols.fn_ {
                return special_forms::compile_fn(self, args);
            } else if sym == symbols.quote {
                return special_forms::compile_quote(self, args);
            } else if sym == symbols.return_ {
                return special_forms::compile_return(self, args);
            } else if sym == symbols.new {
                return special_forms::compile_new(self, args);
            } else if sym == symbols.include {
                return special_forms::compile_include(self, args);
            } else if sym == symbols.till {
                return special_forms::compile_brk(self, args);
            } else if sym == symbols.catch {
                return special_forms::compile_catch(self, args);
            } else if sym == symbols.set {
                return special_forms::compile_set(self, args);
            } else if sym == symbols.not {
                return special_forms::compile_not(self, args);
            } else if sym == symbols.eq {
                return special_forms::compile_eq(self, args);
            } else if sym == symbols.ne {
                return special_forms::compile_ne(self, args);
            } else if sym == symbols.is {
                return special_forms::compile_is(self, args);
            } else if sym == symbols.typeof_ {
                return special_forms::compile_typeof(self, args);
            } else if sym == symbols.throw {
                return special_forms::compile_throw(self, args);
            }
        }
        call::compile_call(self, head, args)
    }

    fn strip_nots<'b>(&self, ast: &'b Ast) -> (bool, &'b Ast) {
        if let Some((head, args)) = ast.as_call() {
            if let Ast::Symbol(sym) = head {
                if *sym == self.symbols.not && args.len() == 1 {
                    let (inner_not, inner) = self.strip_nots(&args[0]);
                    return (!inner_not, inner);
                }
            }
        }
        (false, ast)
    }
}
