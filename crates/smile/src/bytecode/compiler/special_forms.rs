//! Lowering for each built-in special form.
//!
//! `$if`/`$and`/`$or` follow the original compiler's emit-placeholder /
//! patch-later shape exactly (`compile_if.c`, `compile_or.c`), translated
//! from explicit byte-offset patching to the labeled [`crate::bytecode::ir`]
//! block. `$scope` opens a fresh lexical layer and declares each bound name
//! as a local before compiling its body (`compile_scope.c`); `$prog1`
//! compiles its first expression for keeps and discards every subsequent one
//! (`compile_prog1.c`).

use crate::{
    ast::Ast,
    bytecode::{
        compiler::{variable, CompiledBlock, CompileFlags, CompileScope, Compiler, FunctionCompiler},
        Opcode, UnionOperand,
    },
    closure::ClosureInfo,
    function::{ArgCheckFlags, UserFunctionInfo},
    intern::SymbolId,
};

/// `[$if cond then else]` / `[$if cond then]`.
///
/// `$not`-stripping on the condition swaps which branch compiles where,
/// rather than negating at run time: `(if (not c) a b)` compiles identically
/// to `(if c b a)`.
pub(super) fn compile_if(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    if args.len() < 2 || args.len() > 3 {
        compiler.error("Cannot compile [if]: expression is not well-formed.");
        return CompiledBlock::default();
    }
    let (negate, condition) = compiler.strip_nots(&args[0]);
    let cond_result = compiler.compile_expr(condition, CompileFlags::default());

    let else_label = compiler.current().block.new_label();
    compiler.emit_branch(if negate { Opcode::Bt } else { Opcode::Bf }, else_label);

    let then_result = compiler.compile_expr(&args[1], CompileFlags::default());

    if args.len() == 3 {
        let end_label = compiler.current().block.new_label();
        compiler.emit_branch(Opcode::Jmp, end_label);
        compiler.place_label(else_label);
        let else_result = compiler.compile_expr(&args[2], CompileFlags::default());
        compiler.place_label(end_label);
        CompiledBlock {
            max_stack_depth: cond_result.max_stack_depth.max(then_result.max_stack_depth).max(else_result.max_stack_depth),
            final_stack_delta: 1,
            escapes: cond_result.escapes || then_result.escapes || else_result.escapes,
        }
    } else {
        compiler.place_label(else_label);
        CompiledBlock {
            max_stack_depth: cond_result.max_stack_depth.max(then_result.max_stack_depth),
            final_stack_delta: 1,
            escapes: cond_result.escapes || then_result.escapes,
        }
    }
}

/// `[$and x y z ...]`: short-circuits to `false` on the first falsy operand,
/// otherwise yields the last operand's value.
pub(super) fn compile_and(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    if args.is_empty() {
        compiler.error("Cannot compile [and]: expression is not well-formed.");
        return CompiledBlock::default();
    }
    let end_label = compiler.current().block.new_label();
    let mut max_depth = 0;
    let mut escapes = false;
    for (i, arg) in args.iter().enumerate() {
        let (negate, expr) = compiler.strip_nots(arg);
        let result = compiler.compile_expr(expr, CompileFlags::default());
        max_depth = max_depth.max(result.max_stack_depth);
        escapes |= result.escapes;
        if i + 1 < args.len() {
            compiler.current().block.emit(Opcode::Dup, UnionOperand::None);
            compiler.emit_branch(if negate { Opcode::Bt } else { Opcode::Bf }, end_label);
            compiler.current().block.emit(Opcode::Pop, UnionOperand::None);
        }
    }
    compiler.place_label(end_label);
    CompiledBlock { max_stack_depth: max_depth.max(1), final_stack_delta: 1, escapes }
}

/// `[$or x y z ...]`: the exact conditional-branch-per-operand shape of
/// `compile_or.c`, short-circuiting to `true` on the first truthy operand.
pub(super) fn compile_or(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    if args.is_empty() {
        compiler.error("Cannot compile [or]: expression is not well-formed.");
        return CompiledBlock::default();
    }
    let true_label = compiler.current().block.new_label();
    let end_label = compiler.current().block.new_label();
    let mut max_depth = 0;
    let mut escapes = false;
    for arg in args {
        let (negate, expr) = compiler.strip_nots(arg);
        let result = compiler.compile_expr(expr, CompileFlags::default());
        max_depth = max_depth.max(result.max_stack_depth);
        escapes |= result.escapes;
        compiler.emit_branch(if negate { Opcode::Bf } else { Opcode::Bt }, true_label);
    }
    compiler.current().block.emit(Opcode::LdBool, UnionOperand::Bool(false));
    compiler.emit_branch(Opcode::Jmp, end_label);
    compiler.place_label(true_label);
    compiler.current().block.emit(Opcode::LdBool, UnionOperand::Bool(true));
    compiler.place_label(end_label);
    CompiledBlock { max_stack_depth: max_depth.max(1), final_stack_delta: 1, escapes }
}

/// `[$scope (names...) body...]`: opens a fresh lexical layer, declares each
/// name as a new dense local slot, then compiles the body as an implicit
/// `$progn`.
pub(super) fn compile_scope(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let Some((names, body)) = args.split_first() else {
        compiler.error("Cannot compile [scope]: expression is not well-formed.");
        return CompiledBlock::default();
    };
    let Ast::List { items: names, .. } = names else {
        compiler.error("Cannot compile [scope]: variable list is not well-formed.");
        return CompiledBlock::default();
    };

    compiler.current().scopes.push(CompileScope::default());
    for name in names {
        if let Ast::Symbol(sym) = name {
            variable::declare_local(compiler, *sym);
        }
    }
    let result = compile_progn(compiler, body, CompileFlags::default());
    compiler.current().scopes.pop();
    result
}

/// `[$progn a b c ...]`: compiles each expression in order, yielding the
/// last one's value (or `null` for an empty body).
pub(super) fn compile_progn(compiler: &mut Compiler, args: &[Ast], flags: CompileFlags) -> CompiledBlock {
    if args.is_empty() {
        compiler.current().block.emit(Opcode::LdNull, UnionOperand::None);
        return CompiledBlock::leaf(1);
    }
    let mut running = CompiledBlock::leaf(0);
    let mut depth = 0u32;
    for (i, arg) in args.iter().enumerate() {
        let is_last = i + 1 == args.len();
        let sub_flags = if is_last { flags } else { flags.with(CompileFlags::DISCARD) };
        let result = compiler.compile_expr(arg, sub_flags);
        if !is_last {
            compiler.current().block.emit(Opcode::Pop, UnionOperand::None);
        }
        running = running.merge_sequential(result, depth);
        depth = running.final_stack_delta.max(0) as u32;
    }
    running.final_stack_delta = 1;
    running
}

/// `[$prog1 a b c ...]`: keeps the first expression's value, discarding every
/// subsequent one (`compile_prog1.c`).
pub(super) fn compile_prog1(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let Some((first, rest)) = args.split_first() else {
        compiler.error("Cannot compile [prog1]: expression is not well-formed.");
        return CompiledBlock::default();
    };
    let mut running = compiler.compile_expr(first, CompileFlags::default());
    for arg in rest {
        let result = compiler.compile_expr(arg, CompileFlags::default().with(CompileFlags::DISCARD));
        compiler.current().block.emit(Opcode::Pop, UnionOperand::None);
        running.max_stack_depth = running.max_stack_depth.max(1 + result.max_stack_depth);
        running.escapes |= result.escapes;
    }
    running.final_stack_delta = 1;
    running
}

/// `[$fn (args...) body...]`: compiles a nested function body into its own
/// [`FunctionCompiler`] frame, registers its [`UserFunctionInfo`] in the
/// shared table, and emits a `NewFn` that materializes a closure over it at
/// run time.
pub(super) fn compile_fn(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let Some((params, body)) = args.split_first() else {
        compiler.error("Cannot compile [fn]: expression is not well-formed.");
        return CompiledBlock::default();
    };
    let Ast::List { items: params, .. } = params else {
        compiler.error("Cannot compile [fn]: parameter list is not well-formed.");
        return CompiledBlock::default();
    };

    let num_args = u16::try_from(params.len()).unwrap_or(u16::MAX);
    let mut closure_info = ClosureInfo::new_local(num_args);
    let depth = compiler.function_depth() + 1;
    let mut param_names = Vec::new();
    for param in params {
        if let Ast::Symbol(sym) = param {
            closure_info.variable_names.push(*sym);
            param_names.push(*sym);
        }
    }
    compiler.push_function(FunctionCompiler::new(closure_info, depth));
    for (slot, sym) in param_names.iter().enumerate() {
        variable::declare_param(compiler, *sym, slot as u16);
    }

    let body_result = compile_progn(compiler, body, CompileFlags::new(CompileFlags::TAIL));
    compiler.current().block.emit(Opcode::Ret, UnionOperand::None);

    let func = compiler.pop_function();
    let info = UserFunctionInfo {
        name: SymbolId::NONE,
        closure_info: func.closure_info,
        body: func.block.flatten(),
        min_args: num_args,
        max_args: num_args,
        arg_check: ArgCheckFlags::new(ArgCheckFlags::EXACT),
    };
    let index = compiler.tables.add_user_function(info);
    compiler.current().block.emit(Opcode::NewFn, UnionOperand::FunctionIndex(index));
    CompiledBlock { max_stack_depth: 1, final_stack_delta: 1, escapes: body_result.escapes }
}

/// `[$quote expr]`: the argument is taken verbatim as data rather than
/// compiled as code.
pub(super) fn compile_quote(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let Some(quoted) = args.first() else {
        compiler.error("Cannot compile [quote]: expression is not well-formed.");
        return CompiledBlock::default();
    };
    compile_quoted(compiler, quoted)
}

/// Compiles a quoted AST node as data. A symbol or an already-literal value
/// is interned once into `CompiledTables.objects` and loaded by index, the
/// same as an ordinary literal. A `List`/`Pair`, though, is rebuilt at *run*
/// time out of `Cons`/`NewPair` instructions rather than pre-baked into the
/// object pool: materializing cons cells is a heap allocation, and the
/// compiler itself never owns a live `Heap` to allocate onto — only the
/// interpreter does, when these instructions execute.
fn compile_quoted(compiler: &mut Compiler, ast: &Ast) -> CompiledBlock {
    match ast {
        Ast::Symbol(sym) => {
            let index = compiler.tables.add_object(crate::value::SmileArg::Symbol(*sym));
            compiler.current().block.emit(Opcode::LdObj, UnionOperand::ObjectIndex(index));
            CompiledBlock::leaf(1)
        }
        Ast::Literal(value) => {
            let index = compiler.tables.add_object(*value);
            compiler.current().block.emit(Opcode::LdObj, UnionOperand::ObjectIndex(index));
            CompiledBlock::leaf(1)
        }
        Ast::Pair { left, right, .. } => {
            let left_result = compile_quoted(compiler, left);
            let right_result = compile_quoted(compiler, right);
            compiler.current().block.emit(Opcode::NewPair, UnionOperand::None);
            CompiledBlock {
                max_stack_depth: left_result.max_stack_depth.max(1 + right_result.max_stack_depth),
                final_stack_delta: 1,
                escapes: false,
            }
        }
        Ast::List { items, tail, .. } => {
            // Build the rest of the list first (the dotted tail, or `null`
            // for a proper list), then cons each item on in reverse so the
            // innermost `Cons` sees the tail and the outermost sees `items[0]`.
            let mut running = match tail {
                Some(tail_ast) => compile_quoted(compiler, tail_ast),
                None => {
                    compiler.current().block.emit(Opcode::LdNull, UnionOperand::None);
                    CompiledBlock::leaf(1)
                }
            };
            let mut depth_so_far = 1u32;
            for item in items.iter().rev() {
                let item_result = compile_quoted(compiler, item);
                // Stack is now [..., rest, item]; `Cons` wants `a` pushed
                // before `d` (it pops `d` first), so swap to [..., item, rest].
                compiler.current().block.emit(Opcode::Swap, UnionOperand::None);
                compiler.current().block.emit(Opcode::Cons, UnionOperand::None);
                depth_so_far = depth_so_far.max(1 + item_result.max_stack_depth);
                running = CompiledBlock { max_stack_depth: depth_so_far, final_stack_delta: 1, escapes: false };
            }
            running
        }
    }
}

/// `[$return expr]`: an explicit escape continuation back to the enclosing
/// function's caller, modeled as `Return` rather than a plain `Ret` so it can
/// unwind through intervening `$scope`/`$progn` nesting.
pub(super) fn compile_return(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let result = if let Some(expr) = args.first() {
        compiler.compile_expr(expr, CompileFlags::default())
    } else {
        compiler.current().block.emit(Opcode::LdNull, UnionOperand::None);
        CompiledBlock::leaf(1)
    };
    compiler.current().block.emit(Opcode::Return, UnionOperand::None);
    CompiledBlock { max_stack_depth: result.max_stack_depth.max(1), final_stack_delta: 1, escapes: true }
}

/// `[$new base (name value)...]`: constructs a fresh `UserObject` whose
/// `base` is the compiled `base` expression's value.
pub(super) fn compile_new(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let Some((base, members)) = args.split_first() else {
        compiler.error("Cannot compile [new]: expression is not well-formed.");
        return CompiledBlock::default();
    };
    let base_result = compiler.compile_expr(base, CompileFlags::default());
    let mut max_depth = base_result.max_stack_depth.max(1);
    let mut count = 0u16;
    for member in members {
        if let Some((head, rest)) = member.as_call() {
            if let (Ast::Symbol(name), [value]) = (head, rest) {
                let value_result = compiler.compile_expr(value, CompileFlags::default());
                let name_index = compiler.tables.add_object(crate::value::SmileArg::Symbol(*name));
                compiler.current().block.emit(Opcode::LdObj, UnionOperand::ObjectIndex(name_index));
                max_depth = max_depth.max(1 + value_result.max_stack_depth);
                count += 1;
            }
        }
    }
    compiler.current().block.emit(Opcode::NewObj, UnionOperand::ArgCount(count));
    CompiledBlock { max_stack_depth: max_depth, final_stack_delta: 1, escapes: base_result.escapes }
}

/// `[$include moduleId memberName localName?]`: validates the module id
/// resolves and that `memberName` is in that module's export set — both
/// compile-time checks, per §4.3 — then emits `LdInclude(moduleId,
/// memberOffset)` and binds the result to `localName` (defaulting to
/// `memberName`) the same way `$set` binds any other variable. `moduleId`
/// must already have been registered via [`Compiler::compile_module`]
/// before this runs; it is the module's index into `tables.modules`, not its
/// name.
pub(super) fn compile_include(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let [module_id_ast, member_ast, rest @ ..] = args else {
        compiler.error("Cannot compile [include]: expects a module id and a member name.");
        return CompiledBlock::default();
    };
    let Ast::Literal(crate::value::SmileArg::Int64(module_id)) = module_id_ast else {
        compiler.error("Cannot compile [include]: expected an integer module id.");
        return CompiledBlock::default();
    };
    let Ast::Symbol(member) = member_ast else {
        compiler.error("Cannot compile [include]: expected a member symbol.");
        return CompiledBlock::default();
    };
    let local_name = match rest {
        [] => *member,
        [Ast::Symbol(local)] => *local,
        _ => {
            compiler.error("Cannot compile [include]: expected at most one local name after the member.");
            return CompiledBlock::default();
        }
    };
    let Ok(module_index) = u32::try_from(*module_id) else {
        compiler.error("Cannot compile [include]: module id out of range.");
        return CompiledBlock::default();
    };
    let Some(module) = compiler.tables.modules.get(module_index as usize) else {
        compiler.error(format!("Cannot compile [include]: no module with id {module_index}."));
        return CompiledBlock::default();
    };
    let Some(offset) = module.exports.iter().position(|s| s == member) else {
        compiler.error(format!("Cannot compile [include]: module {module_index} has no such export."));
        return CompiledBlock::default();
    };

    compiler.current().block.emit(Opcode::LdInclude, UnionOperand::ModuleMember(module_index, offset as u32));
    let write_result = variable::compile_write(compiler, local_name);
    CompiledBlock { max_stack_depth: write_result.max_stack_depth.max(1), final_stack_delta: 1, escapes: false }
}

/// `[$till (names...) body...]`: establishes a named escape target a nested
/// `$brk`/named exit can jump back out to. Modeled minimally here as a
/// `Catch`/`EndCatch` bracket around the body whose handler is the point
/// immediately after the bracket, since the full loop-construct sugar this
/// desugars from is outside the compiler's scope: an exception unwinding
/// through the body lands at the same place normal completion does, with
/// the thrown value standing in for the `$brk` value.
pub(super) fn compile_brk(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let Some((_names, body)) = args.split_first() else {
        compiler.error("Cannot compile [till]: expression is not well-formed.");
        return CompiledBlock::default();
    };
    let end_label = compiler.current().block.new_label();
    compiler.current().block.emit_branch(Opcode::Catch, end_label);
    let result = compile_progn(compiler, body, CompileFlags::default());
    compiler.current().block.emit(Opcode::EndCatch, UnionOperand::None);
    compiler.place_label(end_label);
    CompiledBlock { max_stack_depth: result.max_stack_depth.max(1), final_stack_delta: 1, escapes: result.escapes }
}

/// `[$catch body binding handler]`: runs `body` under a protected region; if
/// it throws, the thrown value is bound to `binding` and `handler` is
/// evaluated instead (in place of `body`'s result). Grounded on the
/// `eval-error`/`$throw` exception contract (§7/§8 scenario 6): the binding
/// is an ordinary local, not an implicit magic name, so `handler` reads it
/// like any other variable.
pub(super) fn compile_catch(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let [body, binding, handler] = args else {
        compiler.error("Cannot compile [catch]: expects a body, a binding symbol, and a handler expression.");
        return CompiledBlock::default();
    };
    let Ast::Symbol(binding_name) = binding else {
        compiler.error("Cannot compile [catch]: binding is not a symbol.");
        return CompiledBlock::default();
    };

    let handler_label = compiler.current().block.new_label();
    let end_label = compiler.current().block.new_label();

    compiler.current().block.emit_branch(Opcode::Catch, handler_label);
    let body_result = compiler.compile_expr(body, CompileFlags::default());
    compiler.current().block.emit(Opcode::EndCatch, UnionOperand::None);
    compiler.emit_branch(Opcode::Jmp, end_label);

    compiler.place_label(handler_label);
    compiler.current().scopes.push(CompileScope::default());
    variable::declare_local(compiler, *binding_name);
    let bind_result = variable::compile_write(compiler, *binding_name);
    compiler.current().block.emit(Opcode::Pop, UnionOperand::None);
    let handler_result = compiler.compile_expr(handler, CompileFlags::default());
    compiler.current().scopes.pop();
    compiler.place_label(end_label);

    CompiledBlock {
        max_stack_depth: body_result.max_stack_depth.max(1 + bind_result.max_stack_depth).max(handler_result.max_stack_depth),
        final_stack_delta: 1,
        escapes: body_result.escapes || handler_result.escapes,
    }
}

/// `[$not x]`: logical negation. Condition position inside `$if`/`$and`/`$or`
/// folds this away via [`Compiler::strip_nots`] instead of reaching here; this
/// is the fallback for `$not` used as an ordinary value-producing expression.
pub(super) fn compile_not(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let [operand] = args else {
        compiler.error("Cannot compile [not]: expects exactly one argument.");
        return CompiledBlock::default();
    };
    let result = compiler.compile_expr(operand, CompileFlags::default());
    compiler.current().block.emit(Opcode::Not, UnionOperand::None);
    CompiledBlock { max_stack_depth: result.max_stack_depth.max(1), final_stack_delta: 1, escapes: result.escapes }
}

/// Shared shape for the binary comparison primitives `$eq`/`$ne`/`$is`.
fn compile_binary_compare(compiler: &mut Compiler, args: &[Ast], op: Opcode, name: &str) -> CompiledBlock {
    let [left, right] = args else {
        compiler.error(&format!("Cannot compile [{name}]: expects exactly two arguments."));
        return CompiledBlock::default();
    };
    let left_result = compiler.compile_expr(left, CompileFlags::default());
    let right_result = compiler.compile_expr(right, CompileFlags::default());
    compiler.current().block.emit(op, UnionOperand::None);
    CompiledBlock {
        max_stack_depth: left_result.max_stack_depth.max(1 + right_result.max_stack_depth),
        final_stack_delta: 1,
        escapes: left_result.escapes || right_result.escapes,
    }
}

/// `[$eq a b]`: structural equality, delegating to the heap's own notion of
/// equal values rather than raw tag comparison.
pub(super) fn compile_eq(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    compile_binary_compare(compiler, args, Opcode::Eq, "eq")
}

/// `[$ne a b]`: the negation of `$eq`, emitted as its own opcode rather than
/// `$eq` followed by `$not` so the interpreter can compare once.
pub(super) fn compile_ne(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    compile_binary_compare(compiler, args, Opcode::Ne, "ne")
}

/// `[$is a b]`: identity comparison — same tagged value, not merely an
/// equal one (two distinct heap objects with equal contents are `$eq` but
/// not `$is`).
pub(super) fn compile_is(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    compile_binary_compare(compiler, args, Opcode::Is, "is")
}

/// `[$throw x]`: raises `x` as a user exception, unwinding to the nearest
/// enclosing `[$catch ...]` (or out of the program entirely if there is
/// none).
pub(super) fn compile_throw(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let [value] = args else {
        compiler.error("Cannot compile [throw]: expects exactly one argument.");
        return CompiledBlock::default();
    };
    let result = compiler.compile_expr(value, CompileFlags::default());
    compiler.current().block.emit(Opcode::Throw, UnionOperand::None);
    CompiledBlock { max_stack_depth: result.max_stack_depth.max(1), final_stack_delta: 1, escapes: true }
}

/// `[$typeof x]`: the runtime kind of a value, as the symbol naming it.
pub(super) fn compile_typeof(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let [operand] = args else {
        compiler.error("Cannot compile [typeof]: expects exactly one argument.");
        return CompiledBlock::default();
    };
    let result = compiler.compile_expr(operand, CompileFlags::default());
    compiler.current().block.emit(Opcode::TypeOf, UnionOperand::None);
    CompiledBlock { max_stack_depth: result.max_stack_depth.max(1), final_stack_delta: 1, escapes: result.escapes }
}

/// `[$set target value]`: assigns to a variable or a `left.symbol` property,
/// dispatching on the target's shape.
pub(super) fn compile_set(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let [target, value] = args else {
        compiler.error("Cannot compile [set]: expression is not well-formed.");
        return CompiledBlock::default();
    };
    match target {
        Ast::Symbol(name) => {
            let value_result = compiler.compile_expr(value, CompileFlags::default());
            let write_result = variable::compile_write(compiler, *name);
            CompiledBlock {
                max_stack_depth: value_result.max_stack_depth.max(write_result.max_stack_depth),
                final_stack_delta: 1,
                escapes: value_result.escapes,
            }
        }
        Ast::Pair { left, right, .. } => super::property::compile_write(compiler, left, right, value),
        _ => {
            compiler.error("Cannot compile [set]: target is not an assignable expression.");
            CompiledBlock::default()
        }
    }
}
