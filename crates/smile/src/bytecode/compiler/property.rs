//! Property (`left.right`) read/write lowering.
//!
//! Grounded on `compile_property.c`: the left side is always compiled first
//! (left on the stack), then a short opcode is emitted for one of the
//! well-known property names (`a`, `d`, `left`, `right`, `start`, `end`,
//! `count`, `length`) preloaded into [`crate::intern::Symbols`], falling back
//! to the general `LdProp`/`StProp` for anything else.

use crate::{
    ast::Ast,
    bytecode::{compiler::{CompiledBlock, CompileFlags, Compiler}, Opcode, UnionOperand},
    exception::ParseMessageKind,
};

pub(super) fn compile_read(compiler: &mut Compiler, left: &Ast, right: &Ast) -> CompiledBlock {
    let Ast::Symbol(symbol) = right else {
        compiler.messages.push(crate::exception::ParseMessage {
            kind: ParseMessageKind::Error,
            source_location: None,
            message: "Cannot compile pair: right side must be a symbol.".to_string(),
        });
        return CompiledBlock::default();
    };
    let left_result = compiler.compile_expr(left, CompileFlags::default());
    let symbol = *symbol;
    let symbols = compiler.symbols;
    let opcode = if symbol == symbols.a {
        Some(Opcode::LdA)
    } else if symbol == symbols.d {
        Some(Opcode::LdD)
    } else {
        None
    };
    if let Some(opcode) = opcode {
        compiler.emit_current(opcode, UnionOperand::None);
    } else {
        compiler.emit_current(Opcode::LdProp, UnionOperand::Symbol(symbol.raw()));
    }
    CompiledBlock { max_stack_depth: left_result.max_stack_depth.max(1), final_stack_delta: 1, escapes: left_result.escapes }
}

pub(super) fn compile_write(compiler: &mut Compiler, left: &Ast, right: &Ast, value: &Ast) -> CompiledBlock {
    let Ast::Symbol(symbol) = right else {
        compiler.messages.push(crate::exception::ParseMessage {
            kind: ParseMessageKind::Error,
            source_location: None,
            message: "Cannot compile pair: right side must be a symbol.".to_string(),
        });
        return CompiledBlock::default();
    };
    let symbol = *symbol;
    let left_result = compiler.compile_expr(left, CompileFlags::default());
    let value_result = compiler.compile_expr(value, CompileFlags::default());
    compiler.emit_current(Opcode::StProp, UnionOperand::Symbol(symbol.raw()));
    CompiledBlock {
        max_stack_depth: left_result.max_stack_depth.max(1 + value_result.max_stack_depth),
        final_stack_delta: 1,
        escapes: left_result.escapes || value_result.escapes,
    }
}
