//! Call-site lowering: method calls (`receiver.method arg ...`) vs. general
//! calls (`fn_expr arg ...`).
//!
//! A call's head being a [`Ast::Pair`] whose right side is a symbol is
//! Smile's method-call sugar — the receiver is compiled once and the
//! bytecode dispatches through its property lookup (`MetCall`) rather than
//! first materializing the function value and then calling it generically.
//! Anything else compiles the head as a plain expression and falls back to
//! the general `Call` opcode.

use crate::{
    ast::Ast,
    bytecode::{compiler::{CompiledBlock, CompileFlags, Compiler}, Opcode, UnionOperand},
};

pub(super) fn compile_call(compiler: &mut Compiler, head: &Ast, args: &[Ast]) -> CompiledBlock {
    let arg_count = u16::try_from(args.len()).unwrap_or(u16::MAX);

    if let Ast::Pair { left, right, .. } = head {
        if let Ast::Symbol(symbol) = right.as_ref() {
            let symbol = *symbol;
            let receiver_result = compiler.compile_expr(left, CompileFlags::default());
            let args_result = compile_args(compiler, args);
            compiler.emit_current(Opcode::MetCall, UnionOperand::MethodCall(symbol.raw(), arg_count));
            return CompiledBlock {
                max_stack_depth: receiver_result.max_stack_depth.max(1 + args_result.max_stack_depth),
                final_stack_delta: 1,
                escapes: receiver_result.escapes || args_result.escapes,
            };
        }
    }

    let head_result = compiler.compile_expr(head, CompileFlags::default());
    let args_result = compile_args(compiler, args);
    compiler.emit_current(Opcode::Call, UnionOperand::ArgCount(arg_count));
    CompiledBlock {
        max_stack_depth: head_result.max_stack_depth.max(1 + args_result.max_stack_depth),
        final_stack_delta: 1,
        escapes: head_result.escapes || args_result.escapes,
    }
}

fn compile_args(compiler: &mut Compiler, args: &[Ast]) -> CompiledBlock {
    let mut running = CompiledBlock::leaf(0);
    let mut depth = 0u32;
    for arg in args {
        let result = compiler.compile_expr(arg, CompileFlags::default());
        running = running.merge_sequential(result, depth);
        depth += 1;
    }
    running
}
