#![doc = include_str!("../../../README.md")]
#![expect(dead_code, reason = "some descriptor fields exist for parity/diagnostics and aren't read yet")]

pub mod ast;
pub mod bytecode;
pub mod closure;
pub mod compiled_tables;
pub mod exception;
pub mod function;
mod hash_oracle;
pub mod heap;
mod intern;
pub mod kind;
mod knownbases;
mod knownobjects;
mod module;
pub mod run;
pub mod sexpr;
pub mod tracer;
pub mod value;

pub use crate::{
    ast::Ast,
    bytecode::{ByteCode, ByteCodeSegment, Instruction, Opcode, UnionOperand},
    closure::{ClosureInfo, ClosureKind},
    compiled_tables::{CompiledTables, SourceLocation},
    exception::{ExcType, ParseMessage, ParseMessageKind, RunResult, StackFrame, Throw},
    function::{ArgCheckFlags, ExternalFunctionInfo, UserFunctionInfo},
    heap::{Heap, HeapData, HeapId, HeapObject},
    intern::{Interns, SymbolId, Symbols},
    kind::{HeapFlags, Kind},
    run::{CompileOutcome, Engine},
    tracer::{NoopTracer, StderrTracer, VmTracer},
    value::SmileArg,
};
