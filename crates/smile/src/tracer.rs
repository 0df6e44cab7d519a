//! VM execution tracing infrastructure.
//!
//! Provides a trait-based tracing hook for the bytecode interpreter with
//! zero-cost abstraction: when using [`NoopTracer`], every trace call
//! compiles away entirely via monomorphization, identical in spirit to how
//! the teacher crate's `NoLimitTracker` eliminates resource-checking
//! overhead in production.
//!
//! # Architecture
//!
//! [`VmTracer`] defines hook points at the handful of execution events the
//! spec calls out as worth observing: instruction dispatch (so a `Brk`
//! opcode can suspend execution for a debugger), function entry/exit, and
//! uncaught exceptions. [`NoopTracer`] is the production default;
//! [`StderrTracer`] is a human-readable execution log used in tests and the
//! CLI's `--trace` mode.
//!
//! The interpreter is parameterized as `Interpreter<'a, Tr: VmTracer>` so
//! callers choose the tracer at construction time without paying for a
//! trait-object indirection on the hot dispatch path.

use crate::{bytecode::Opcode, intern::SymbolId};

/// Hook points the bytecode interpreter calls into during execution.
///
/// Every method has a default empty body so implementers only override what
/// they need.
pub trait VmTracer {
    /// Called before each instruction is dispatched.
    fn on_instruction(&mut self, pc: usize, opcode: Opcode) {
        let _ = (pc, opcode);
    }

    /// Called when the `Brk` opcode is reached, the spec's debugger-suspend
    /// hook point.
    fn on_break(&mut self, pc: usize) {
        let _ = pc;
    }

    fn on_call_enter(&mut self, function_name: SymbolId, depth: usize) {
        let _ = (function_name, depth);
    }

    fn on_call_exit(&mut self, function_name: SymbolId, depth: usize) {
        let _ = (function_name, depth);
    }

    fn on_uncaught_throw(&mut self, message: &str) {
        let _ = message;
    }
}

/// Zero-cost production tracer: every hook is inlined away.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

/// Human-readable execution log written to stderr, for debugging and tests.
#[derive(Debug, Default)]
pub struct StderrTracer {
    instructions_seen: u64,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn instructions_seen(&self) -> u64 {
        self.instructions_seen
    }
}

impl VmTracer for StderrTracer {
    fn on_instruction(&mut self, pc: usize, opcode: Opcode) {
        self.instructions_seen += 1;
        eprintln!("  {pc:>6}  {opcode}");
    }

    fn on_break(&mut self, pc: usize) {
        eprintln!("brk at {pc}");
    }

    fn on_call_enter(&mut self, function_name: SymbolId, depth: usize) {
        eprintln!("{:>width$}-> call {:?}", "", function_name, width = depth * 2);
    }

    fn on_call_exit(&mut self, function_name: SymbolId, depth: usize) {
        eprintln!("{:>width$}<- return {:?}", "", function_name, width = depth * 2);
    }

    fn on_uncaught_throw(&mut self, message: &str) {
        eprintln!("uncaught exception: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_tracer_accepts_every_hook_without_panicking() {
        let mut tracer = NoopTracer;
        tracer.on_instruction(0, Opcode::Nop);
        tracer.on_break(0);
        tracer.on_call_enter(SymbolId::NONE, 0);
        tracer.on_call_exit(SymbolId::NONE, 0);
        tracer.on_uncaught_throw("boom");
    }

    #[test]
    fn stderr_tracer_counts_instructions() {
        let mut tracer = StderrTracer::new();
        tracer.on_instruction(0, Opcode::Nop);
        tracer.on_instruction(1, Opcode::Pop);
        assert_eq!(tracer.instructions_seen(), 2);
    }
}
