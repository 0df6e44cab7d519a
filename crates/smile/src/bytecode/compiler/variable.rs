//! Variable read/write resolution.
//!
//! Grounded exactly on `compile_variable.c`: an unresolved/global symbol
//! becomes a generic `LdX`/`StX` against the global dictionary; a declared
//! argument or local within the 8 shallowest function-nesting depths gets a
//! short, depth-free opcode (`LdArg0..7`/`LdLoc0..7`); anything deeper falls
//! back to the general `LdArg`/`LdLoc` opcode carrying an explicit
//! `(depth, index)` operand pair.

use crate::{
    bytecode::{compiler::{CompiledBlock, Compiler}, Opcode, UnionOperand},
    intern::SymbolId,
};

const SHORT_OPCODE_ARGS: [Opcode; 8] =
    [Opcode::LdArg0, Opcode::LdArg1, Opcode::LdArg2, Opcode::LdArg3, Opcode::LdArg4, Opcode::LdArg5, Opcode::LdArg6, Opcode::LdArg7];
const SHORT_OPCODE_ARGS_ST: [Opcode; 8] =
    [Opcode::StArg0, Opcode::StArg1, Opcode::StArg2, Opcode::StArg3, Opcode::StArg4, Opcode::StArg5, Opcode::StArg6, Opcode::StArg7];
const SHORT_OPCODE_LOCS: [Opcode; 8] =
    [Opcode::LdLoc0, Opcode::LdLoc1, Opcode::LdLoc2, Opcode::LdLoc3, Opcode::LdLoc4, Opcode::LdLoc5, Opcode::LdLoc6, Opcode::LdLoc7];
const SHORT_OPCODE_LOCS_ST: [Opcode; 8] =
    [Opcode::StLoc0, Opcode::StLoc1, Opcode::StLoc2, Opcode::StLoc3, Opcode::StLoc4, Opcode::StLoc5, Opcode::StLoc6, Opcode::StLoc7];

/// Where a resolved variable lives, found by walking the active
/// [`crate::bytecode::compiler::CompileScope`] chain outward through enclosing
/// functions.
enum Resolution {
    /// Declared as one of the current function's parameters, `depth` levels
    /// out from the function currently being compiled (`0` = the innermost).
    Argument { depth: u16, index: u16 },
    /// Declared as a local (via `$scope` or a `$fn` body), `depth` levels out.
    Local { depth: u16, index: u16 },
    /// Not found in any enclosing function's scopes: a global.
    Global,
}

fn resolve(compiler: &Compiler, name: SymbolId) -> Resolution {
    let functions = &compiler.functions_for_resolution();
    for (depth, func) in functions.iter().rev().enumerate() {
        let depth = u16::try_from(depth).expect("function nesting fits u16");
        for scope in func.scopes.iter().rev() {
            if let Some(slot) = scope.lookup(name) {
                return if slot < func.closure_info.num_args {
                    Resolution::Argument { depth, index: slot }
                } else {
                    Resolution::Local { depth, index: slot }
                };
            }
        }
    }
    Resolution::Global
}

pub(super) fn compile_read(compiler: &mut Compiler, name: SymbolId) -> CompiledBlock {
    match resolve(compiler, name) {
        Resolution::Argument { depth: 0, index } if (index as usize) < SHORT_OPCODE_ARGS.len() => {
            compiler.emit_current(SHORT_OPCODE_ARGS[index as usize], UnionOperand::None);
        }
        Resolution::Argument { depth, index } => {
            compiler.emit_current(Opcode::LdArg, UnionOperand::DepthIndex(depth, index));
        }
        Resolution::Local { depth: 0, index } if (index as usize) < SHORT_OPCODE_LOCS.len() => {
            compiler.emit_current(SHORT_OPCODE_LOCS[index as usize], UnionOperand::None);
        }
        Resolution::Local { depth, index } => {
            compiler.emit_current(Opcode::LdLoc, UnionOperand::DepthIndex(depth, index));
        }
        Resolution::Global => {
            compiler.emit_current(Opcode::LdX, UnionOperand::Symbol(name.raw()));
        }
    }
    CompiledBlock::leaf(1)
}

pub(super) fn compile_write(compiler: &mut Compiler, name: SymbolId) -> CompiledBlock {
    match resolve(compiler, name) {
        Resolution::Argument { depth: 0, index } if (index as usize) < SHORT_OPCODE_ARGS_ST.len() => {
            compiler.emit_current(SHORT_OPCODE_ARGS_ST[index as usize], UnionOperand::None);
        }
        Resolution::Argument { depth, index } => {
            compiler.emit_current(Opcode::StArg, UnionOperand::DepthIndex(depth, index));
        }
        Resolution::Local { depth: 0, index } if (index as usize) < SHORT_OPCODE_LOCS_ST.len() => {
            compiler.emit_current(SHORT_OPCODE_LOCS_ST[index as usize], UnionOperand::None);
        }
        Resolution::Local { depth, index } => {
            compiler.emit_current(Opcode::StLoc, UnionOperand::DepthIndex(depth, index));
        }
        Resolution::Global => {
            compiler.note_global_write(name);
            compiler.emit_current(Opcode::StX, UnionOperand::Symbol(name.raw()));
        }
    }
    CompiledBlock::leaf(0)
}

/// Declares `name` as referring to an already-reserved argument slot (one of
/// the dense slots `ClosureInfo::new_local` set aside for the parameter
/// list), without allocating a new slot the way [`declare_local`] does.
pub(super) fn declare_param(compiler: &mut Compiler, name: SymbolId, slot: u16) {
    compiler.current().scopes.last_mut().expect("scope stack is never empty").declare(name, slot);
}

/// Declares `name` as a fresh local slot in the innermost open scope of the
/// function currently being compiled (the `$scope` form's job), returning the
/// assigned slot index.
pub(super) fn declare_local(compiler: &mut Compiler, name: SymbolId) -> u16 {
    let func = compiler.current();
    let slot = func.closure_info.add_local(name);
    func.scopes.last_mut().expect("scope stack is never empty").declare(name, slot);
    slot
}
