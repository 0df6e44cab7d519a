//! The bytecode dispatch loop.
//!
//! `Step` is the escape-continuation machinery the original implementation
//! builds out of `setjmp`/`longjmp`: rather than a C-style non-local jump
//! back to a handler frame, each instruction's effect is expressed as an
//! ordinary Rust value the caller matches on. A `Throw` propagates as an
//! ordinary `Err`; `step`'s dispatch loop intercepts it against the active
//! frame's `catch_marks` (each one a `(stack_depth, handler_pc)` pair
//! recorded by `Catch`) before it ever reaches `run`, truncating the stack,
//! pushing the exception value, and resuming at the handler address in
//! place — the in-frame equivalent of `longjmp`ing to the matching
//! `setjmp`. Only an exception with no enclosing catch mark escapes `step`
//! as `Err`, unwinding native call frames the way `$return` does.

pub mod call;
pub mod exceptions;
pub mod modules;

use crate::{
    bytecode::{ByteCodeSegment, Instruction, Opcode, UnionOperand},
    closure::ClosureKind,
    compiled_tables::CompiledTables,
    exception::{ExcType, RunResult, Throw},
    hash_oracle::HashOracle,
    heap::{ClosureData, Heap, HeapData, HeapId, ListCell, VariableStorage, FunctionData},
    kind::HeapFlags,
    intern::{Interns, Symbols},
    knownbases::KnownBases,
    knownobjects::KnownObjects,
    module::ModuleResolver,
    tracer::VmTracer,
    value::SmileArg,
};

/// Outcome of executing one function's bytecode to completion.
#[derive(Debug)]
pub enum Step {
    /// Execution reached the implicit end of its bytecode (a `Ret`),
    /// carrying the value left on top of the stack.
    Returned(SmileArg),
}

/// Where to resume, and how much of the evaluation stack to discard, when an
/// exception unwinds into an open `Catch`/`EndCatch` bracket.
struct CatchMark {
    stack_depth: usize,
    handler_pc: usize,
}

/// One function activation: its bytecode, program counter, and evaluation
/// stack. Distinct from [`crate::heap::ClosureData`] — a `Frame` is
/// interpreter-internal bookkeeping that never outlives the call that
/// created it, while `ClosureData` is the heap-resident, potentially
/// captured environment a closure carries after its defining call returns.
struct Frame {
    code: ByteCodeSegment,
    pc: usize,
    stack: Vec<SmileArg>,
    closure: HeapId,
    /// Currently-open `Catch`/`EndCatch` brackets, innermost last.
    catch_marks: Vec<CatchMark>,
}

/// The bytecode interpreter: owns the heap and the fixed tables built once
/// at construction, and executes [`crate::function::UserFunctionInfo`]
/// bodies against them.
pub struct Interpreter<'a, Tr: VmTracer> {
    pub heap: Heap,
    pub interns: Interns,
    pub symbols: Symbols,
    pub bases: KnownBases,
    pub objects: KnownObjects,
    pub oracle: HashOracle,
    pub modules: ModuleResolver,
    pub tables: &'a CompiledTables,
    pub tracer: Tr,
    max_call_depth: usize,
    call_depth: usize,
}

impl<'a, Tr: VmTracer> Interpreter<'a, Tr> {
    /// Builds an interpreter sharing `interns`/`symbols` with whatever
    /// compiled `tables`: bytecode operands carry `SymbolId`s assigned by the
    /// same interning table the source was read with, so the interpreter
    /// must keep using it rather than starting a disconnected one — a fresh
    /// `Interns::new()` here would only know the preloaded special-form
    /// names, and any user-defined symbol a property lookup or `$include`
    /// name referenced would fail to resolve.
    #[must_use]
    pub fn new(tables: &'a CompiledTables, mut interns: Interns, symbols: Symbols, tracer: Tr, max_call_depth: usize) -> Self {
        let mut heap = Heap::new();
        let bases = KnownBases::new(&mut heap, &mut interns);
        let objects = KnownObjects::new(&mut heap, &mut interns, &bases);
        Self {
            heap,
            interns,
            symbols,
            bases,
            objects,
            oracle: HashOracle::new(),
            modules: ModuleResolver::new(),
            tables,
            tracer,
            max_call_depth,
            call_depth: 0,
        }
    }

    /// Runs `code` as a fresh activation parented by `parent_closure` (`None`
    /// for the top-level program), returning the final result or a thrown
    /// exception. `kind` is the closure's `ClosureInfo::kind` — `Global` backs
    /// the activation's variables by name (the top-level program, so `$set`
    /// on an undeclared name has somewhere to land), `Local` by dense
    /// compile-time slot index (every ordinary `$fn` body).
    pub fn run(
        &mut self,
        code: &ByteCodeSegment,
        parent_closure: Option<HeapId>,
        args: &[SmileArg],
        kind: ClosureKind,
    ) -> RunResult<SmileArg> {
        self.run_with_closure(code, parent_closure, args, kind).map(|(value, _)| value)
    }

    /// Like [`Self::run`], but also returns the heap id of the activation's
    /// own closure — needed by module loading (`vm::modules`), which reads
    /// the finished module's global dictionary back out after running it,
    /// something the plain return value alone doesn't expose.
    fn run_with_closure(
        &mut self,
        code: &ByteCodeSegment,
        parent_closure: Option<HeapId>,
        args: &[SmileArg],
        kind: ClosureKind,
    ) -> RunResult<(SmileArg, HeapId)> {
        if self.call_depth >= self.max_call_depth {
            return Err(Throw::new(ExcType::EvalError, SmileArg::Bool(false), "call stack exhausted"));
        }
        self.call_depth += 1;
        let result = self.run_inner(code, parent_closure, args, kind);
        self.call_depth -= 1;
        result
    }

    fn run_inner(
        &mut self,
        code: &ByteCodeSegment,
        parent_closure: Option<HeapId>,
        args: &[SmileArg],
        kind: ClosureKind,
    ) -> RunResult<(SmileArg, HeapId)> {
        let variables = match kind {
            ClosureKind::Local => VariableStorage::Dense(args.to_vec()),
            ClosureKind::Global => VariableStorage::Global(ahash::AHashMap::default()),
        };
        let closure = self.heap.alloc(
            crate::intern::SymbolId::NONE,
            parent_closure,
            HeapFlags::default(),
            HeapData::Closure(ClosureData { parent: parent_closure, variables, stack: Vec::new() }),
        );
        let mut frame = Frame { code: code.clone(), pc: 0, stack: Vec::new(), closure, catch_marks: Vec::new() };
        loop {
            match self.step(&mut frame)? {
                Step::Returned(value) => return Ok((value, closure)),
            }
        }
    }

    /// Executes instructions until the frame returns or exhausts its
    /// bytecode, transparently resuming at an open catch handler whenever an
    /// exception unwinds into one instead of letting it escape immediately.
    fn step(&mut self, frame: &mut Frame) -> Result<Step, Throw> {
        loop {
            let Some(instr) = frame.code.get(frame.pc).copied() else {
                let value = frame.stack.pop().unwrap_or(SmileArg::Heap(self.objects.null));
                return Ok(Step::Returned(value));
            };
            self.tracer.on_instruction(frame.pc, instr.opcode);
            frame.pc += 1;

            match self.execute(frame, instr) {
                Ok(None) => {}
                Ok(Some(step)) => return Ok(step),
                Err(throw) => {
                    if let Some(mark) = frame.catch_marks.pop() {
                        frame.stack.truncate(mark.stack_depth);
                        frame.stack.push(throw.value);
                        frame.pc = mark.handler_pc;
                    } else {
                        return Err(throw);
                    }
                }
            }
        }
    }

    /// Executes a single already-fetched instruction, returning `Ok(None)`
    /// to keep dispatching, `Ok(Some(step))` when the frame is finished
    /// (`Ret`/`Return`), or `Err` when it raises an exception — which
    /// `step`'s loop catches against `frame.catch_marks` before it escapes.
    fn execute(&mut self, frame: &mut Frame, instr: Instruction) -> Result<Option<Step>, Throw> {
        match instr.opcode {
            Opcode::Nop => {}
            Opcode::Brk => self.tracer.on_break(frame.pc - 1),
            Opcode::Dup => {
                let top = *frame.stack.last().expect("Dup requires a value on the stack");
                frame.stack.push(top);
            }
            Opcode::Pop => {
                frame.stack.pop();
            }
            Opcode::Swap => {
                let len = frame.stack.len();
                assert!(len >= 2, "Swap requires two values on the stack");
                frame.stack.swap(len - 1, len - 2);
            }
            Opcode::LdNull => frame.stack.push(SmileArg::Heap(self.objects.null)),
            Opcode::LdBool => {
                let UnionOperand::Bool(b) = instr.operand else { unreachable!("LdBool operand") };
                frame.stack.push(SmileArg::Bool(b));
            }
            Opcode::LdInt => {
                let UnionOperand::Int(n) = instr.operand else { unreachable!("LdInt operand") };
                frame.stack.push(SmileArg::Int64(n));
            }
            Opcode::LdObj => {
                let UnionOperand::ObjectIndex(index) = instr.operand else { unreachable!("LdObj operand") };
                frame.stack.push(self.tables.object(index));
            }
            Opcode::Ret | Opcode::Return => {
                let value = frame.stack.pop().unwrap_or(SmileArg::Heap(self.objects.null));
                return Ok(Some(Step::Returned(value)));
            }
            Opcode::Jmp => self.apply_branch(frame, instr.operand),
            Opcode::Bt => {
                let cond = frame.stack.pop().expect("Bt requires a condition on the stack");
                if self.is_truthy(cond) {
                    self.apply_branch(frame, instr.operand);
                }
            }
            Opcode::Bf => {
                let cond = frame.stack.pop().expect("Bf requires a condition on the stack");
                if !self.is_truthy(cond) {
                    self.apply_branch(frame, instr.operand);
                }
            }
            Opcode::Not => {
                let v = frame.stack.pop().expect("Not requires an operand");
                frame.stack.push(SmileArg::Bool(!self.is_truthy(v)));
            }
            Opcode::Eq => {
                let (b, a) = (frame.stack.pop().expect("Eq rhs"), frame.stack.pop().expect("Eq lhs"));
                frame.stack.push(SmileArg::Bool(self.heap.compare_equal(a, b)));
            }
            Opcode::Ne => {
                let (b, a) = (frame.stack.pop().expect("Ne rhs"), frame.stack.pop().expect("Ne lhs"));
                frame.stack.push(SmileArg::Bool(!self.heap.compare_equal(a, b)));
            }
            Opcode::Is => {
                let (b, a) = (frame.stack.pop().expect("Is rhs"), frame.stack.pop().expect("Is lhs"));
                frame.stack.push(SmileArg::Bool(a == b));
            }
            Opcode::TypeOf => {
                let v = frame.stack.pop().expect("TypeOf requires an operand");
                let kind = self.kind_of(v);
                frame.stack.push(SmileArg::Symbol(self.interns.get_no_create(&format!("{kind:?}")).unwrap_or(crate::intern::SymbolId::NONE)));
            }
            Opcode::LdArg0 | Opcode::LdArg1 | Opcode::LdArg2 | Opcode::LdArg3 | Opcode::LdArg4 | Opcode::LdArg5
            | Opcode::LdArg6 | Opcode::LdArg7 | Opcode::LdLoc0 | Opcode::LdLoc1 | Opcode::LdLoc2 | Opcode::LdLoc3
            | Opcode::LdLoc4 | Opcode::LdLoc5 | Opcode::LdLoc6 | Opcode::LdLoc7 => {
                let index = short_slot_index(instr.opcode);
                frame.stack.push(self.read_dense_slot(frame.closure, 0, index));
            }
            Opcode::StArg0 | Opcode::StArg1 | Opcode::StArg2 | Opcode::StArg3 | Opcode::StArg4 | Opcode::StArg5
            | Opcode::StArg6 | Opcode::StArg7 | Opcode::StLoc0 | Opcode::StLoc1 | Opcode::StLoc2 | Opcode::StLoc3
            | Opcode::StLoc4 | Opcode::StLoc5 | Opcode::StLoc6 | Opcode::StLoc7 => {
                let index = short_slot_index(instr.opcode);
                let value = *frame.stack.last().expect("StArg/StLoc leaves its value on the stack");
                self.write_dense_slot(frame.closure, 0, index, value);
            }
            Opcode::LdArg | Opcode::LdLoc => {
                let UnionOperand::DepthIndex(depth, index) = instr.operand else { unreachable!("LdArg/LdLoc operand") };
                frame.stack.push(self.read_dense_slot(frame.closure, depth, index));
            }
            Opcode::StArg | Opcode::StLoc => {
                let UnionOperand::DepthIndex(depth, index) = instr.operand else { unreachable!("StArg/StLoc operand") };
                let value = *frame.stack.last().expect("StArg/StLoc leaves its value on the stack");
                self.write_dense_slot(frame.closure, depth, index, value);
            }
            Opcode::LdX => {
                let UnionOperand::Symbol(sym) = instr.operand else { unreachable!("LdX operand") };
                let sym = crate::intern::SymbolId::from_raw(sym);
                frame.stack.push(self.read_global(frame.closure, sym));
            }
            Opcode::StX => {
                let UnionOperand::Symbol(sym) = instr.operand else { unreachable!("StX operand") };
                let sym = crate::intern::SymbolId::from_raw(sym);
                let value = *frame.stack.last().expect("StX leaves its value on the stack");
                self.write_global(frame.closure, sym, value);
            }
            Opcode::LdA | Opcode::LdD => {
                let receiver = frame.stack.pop().expect("LdA/LdD requires a receiver");
                let cell = self.list_cell(receiver)?;
                frame.stack.push(if instr.opcode == Opcode::LdA { cell.a } else { cell.d });
            }
            Opcode::LdProp => {
                let UnionOperand::Symbol(sym) = instr.operand else { unreachable!("LdProp operand") };
                let sym = crate::intern::SymbolId::from_raw(sym);
                let receiver = frame.stack.pop().expect("LdProp requires a receiver");
                let Some(id) = receiver.as_heap_id() else {
                    return Err(Throw::new(ExcType::PropertyError, receiver, "property access on an unboxed value"));
                };
                let value = self.heap.get_property(id, sym).ok_or_else(|| {
                    Throw::new(ExcType::PropertyError, receiver, format!("no such property: {}", self.interns.name_of(sym)))
                })?;
                frame.stack.push(value);
            }
            Opcode::StProp => {
                let UnionOperand::Symbol(sym) = instr.operand else { unreachable!("StProp operand") };
                let sym = crate::intern::SymbolId::from_raw(sym);
                let value = frame.stack.pop().expect("StProp requires a value");
                let receiver = frame.stack.pop().expect("StProp requires a receiver");
                let Some(id) = receiver.as_heap_id() else {
                    return Err(Throw::new(ExcType::PropertyError, receiver, "property assignment on an unboxed value"));
                };
                self.heap.set_property(id, sym, value, None).map_err(|err| match err {
                    crate::heap::PropertySetError::Security => {
                        Throw::new(ExcType::ObjectSecurityError, receiver, "cannot assign this property")
                    }
                    crate::heap::PropertySetError::MissingProperty => {
                        Throw::new(ExcType::PropertyError, receiver, format!("no such property: {}", self.interns.name_of(sym)))
                    }
                })?;
                frame.stack.push(value);
            }
            Opcode::NewFn => {
                let UnionOperand::FunctionIndex(index) = instr.operand else { unreachable!("NewFn operand") };
                let func_id = self.heap.alloc(
                    crate::intern::SymbolId::NONE,
                    Some(self.bases.function),
                    HeapFlags::default(),
                    HeapData::Function(FunctionData::User { info_index: index, closure: Some(frame.closure) }),
                );
                frame.stack.push(SmileArg::Heap(func_id));
            }
            Opcode::Call => {
                let UnionOperand::ArgCount(count) = instr.operand else { unreachable!("Call operand") };
                call::dispatch_call(self, frame, count)?;
            }
            Opcode::MetCall => {
                let UnionOperand::MethodCall(sym, count) = instr.operand else { unreachable!("MetCall operand") };
                call::dispatch_method_call(self, frame, crate::intern::SymbolId::from_raw(sym), count)?;
            }
            Opcode::NewObj => {
                let UnionOperand::ArgCount(count) = instr.operand else { unreachable!("NewObj operand") };
                exceptions::build_new_object(self, frame, count)?;
            }
            Opcode::NewPair => {
                let right = frame.stack.pop().expect("NewPair rhs");
                let left = frame.stack.pop().expect("NewPair lhs");
                let id = self.heap.alloc(
                    crate::intern::SymbolId::NONE,
                    Some(self.bases.object),
                    HeapFlags::default(),
                    HeapData::Pair(crate::heap::PairData { left, right, source_location: None }),
                );
                frame.stack.push(SmileArg::Heap(id));
            }
            Opcode::Cons => {
                let d = frame.stack.pop().expect("Cons d");
                let a = frame.stack.pop().expect("Cons a");
                let id = self.heap.alloc(
                    crate::intern::SymbolId::NONE,
                    Some(self.bases.object),
                    HeapFlags::default(),
                    HeapData::List(ListCell { a, d }),
                );
                frame.stack.push(SmileArg::Heap(id));
            }
            Opcode::Catch => {
                let handler_pc = self.branch_target(frame.pc, instr.operand);
                exceptions::enter_catch(frame, handler_pc);
            }
            Opcode::EndCatch => exceptions::exit_catch(frame),
            Opcode::Throw => {
                let value = frame.stack.pop().expect("Throw requires a value");
                return Err(Throw::new(ExcType::EvalError, value, "thrown by program"));
            }
            Opcode::LdInclude => {
                let UnionOperand::ModuleMember(module_id, offset) = instr.operand else {
                    unreachable!("LdInclude operand")
                };
                modules::ensure_loaded(self, module_id)?;
                let exports = self.modules.get(module_id).expect("ensure_loaded populates the resolver");
                let value = exports.exports.get_index(offset as usize).map_or(SmileArg::Heap(self.objects.null), |(_, v)| *v);
                frame.stack.push(value);
            }
        }
        Ok(None)
    }

    fn apply_branch(&self, frame: &mut Frame, operand: UnionOperand) {
        frame.pc = self.branch_target(frame.pc, operand);
    }

    /// Resolves a `BranchDelta` operand to an absolute instruction index,
    /// relative to the instruction following the branch — `pc` here has
    /// already been advanced past the branch itself by the dispatch loop.
    fn branch_target(&self, pc: usize, operand: UnionOperand) -> usize {
        let UnionOperand::BranchDelta(delta) = operand else { unreachable!("branch operand") };
        let target = i64::from(i32::try_from(pc).expect("pc fits i32")) + i64::from(delta);
        usize::try_from(target).expect("branch target is non-negative")
    }

    fn is_truthy(&self, arg: SmileArg) -> bool {
        match arg {
            SmileArg::Heap(id) => self.heap.to_bool(id),
            SmileArg::Bool(b) => b,
            SmileArg::Int64(n) => n != 0,
            _ => true,
        }
    }

    fn kind_of(&self, arg: SmileArg) -> crate::kind::Kind {
        match arg {
            SmileArg::Heap(id) => self.heap.kind_of(id),
            other => other.unboxed_kind().expect("non-heap SmileArg always has an unboxed kind"),
        }
    }

    fn list_cell<'s>(&'s self, arg: SmileArg) -> Result<crate::heap::ListCell, Throw> {
        let id = arg.as_heap_id().ok_or_else(|| Throw::new(ExcType::TypeError, arg, "expected a list"))?;
        match &self.heap.get(id).data {
            HeapData::List(cell) => Ok(cell.clone()),
            _ => Err(Throw::new(ExcType::TypeError, arg, "expected a list")),
        }
    }

    fn closure_chain(&self, closure: HeapId, depth: u16) -> HeapId {
        let mut current = closure;
        for _ in 0..depth {
            let HeapData::Closure(data) = &self.heap.get(current).data else {
                return current;
            };
            current = data.parent.unwrap_or(current);
        }
        current
    }

    fn read_dense_slot(&self, closure: HeapId, depth: u16, index: u16) -> SmileArg {
        let closure = self.closure_chain(closure, depth);
        let HeapData::Closure(data) = &self.heap.get(closure).data else {
            return SmileArg::Heap(self.objects.null);
        };
        match &data.variables {
            VariableStorage::Dense(vars) => vars.get(index as usize).copied().unwrap_or(SmileArg::Heap(self.objects.null)),
            VariableStorage::Global(_) => SmileArg::Heap(self.objects.null),
        }
    }

    fn write_dense_slot(&mut self, closure: HeapId, depth: u16, index: u16, value: SmileArg) {
        let closure = self.closure_chain(closure, depth);
        if let HeapData::Closure(data) = &mut self.heap.get_mut(closure).data {
            if let VariableStorage::Dense(vars) = &mut data.variables {
                if (index as usize) >= vars.len() {
                    vars.resize(index as usize + 1, SmileArg::Heap(self.objects.null));
                }
                vars[index as usize] = value;
            }
        }
    }

    fn read_global(&self, closure: HeapId, name: crate::intern::SymbolId) -> SmileArg {
        let mut current = Some(closure);
        while let Some(id) = current {
            if let HeapData::Closure(data) = &self.heap.get(id).data {
                if let VariableStorage::Global(map) = &data.variables {
                    if let Some(value) = map.get(&name) {
                        return *value;
                    }
                }
                current = data.parent;
            } else {
                break;
            }
        }
        SmileArg::Heap(self.objects.null)
    }

    fn write_global(&mut self, closure: HeapId, name: crate::intern::SymbolId, value: SmileArg) {
        let mut current = Some(closure);
        while let Some(id) = current {
            let HeapData::Closure(data) = &mut self.heap.get_mut(id).data else { break };
            match &mut data.variables {
                VariableStorage::Global(map) => {
                    map.insert(name, value);
                    return;
                }
                VariableStorage::Dense(_) => current = data.parent,
            }
        }
    }
}

fn short_slot_index(opcode: Opcode) -> u16 {
    use Opcode::{
        LdArg0, LdArg1, LdArg2, LdArg3, LdArg4, LdArg5, LdArg6, LdArg7, LdLoc0, LdLoc1, LdLoc2, LdLoc3, LdLoc4, LdLoc5,
        LdLoc6, LdLoc7, StArg0, StArg1, StArg2, StArg3, StArg4, StArg5, StArg6, StArg7, StLoc0, StLoc1, StLoc2, StLoc3,
        StLoc4, StLoc5, StLoc6, StLoc7,
    };
    match opcode {
        LdArg0 | StArg0 | LdLoc0 | StLoc0 => 0,
        LdArg1 | StArg1 | LdLoc1 | StLoc1 => 1,
        LdArg2 | StArg2 | LdLoc2 | StLoc2 => 2,
        LdArg3 | StArg3 | LdLoc3 | StLoc3 => 3,
        LdArg4 | StArg4 | LdLoc4 | StLoc4 => 4,
        LdArg5 | StArg5 | LdLoc5 | StLoc5 => 5,
        LdArg6 | StArg6 | LdLoc6 | StLoc6 => 6,
        LdArg7 | StArg7 | LdLoc7 | StLoc7 => 7,
        _ => unreachable!("short_slot_index called on a non-short opcode"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bytecode::ir::Block, tracer::NoopTracer};

    #[test]
    fn runs_a_trivial_literal_returning_program() {
        let mut block = Block::new();
        let mut tables = CompiledTables::new();
        let index = tables.add_object(SmileArg::Int64(7));
        block.emit(Opcode::LdObj, UnionOperand::ObjectIndex(index));
        block.emit(Opcode::Ret, UnionOperand::None);
        let code = block.flatten();

        let (interns, symbols) = Interns::new();
        let mut interp = Interpreter::new(&tables, interns, symbols, NoopTracer, 64);
        let result = interp.run(&code, None, &[], ClosureKind::Global).unwrap();
        assert_eq!(result, SmileArg::Int64(7));
    }

    #[test]
    fn if_true_branch_skips_else() {
        let mut block = Block::new();
        let tables = CompiledTables::new();
        let else_label = block.new_label();
        let end_label = block.new_label();
        block.emit(Opcode::LdBool, UnionOperand::Bool(true));
        block.emit_branch(Opcode::Bf, else_label);
        block.emit(Opcode::LdInt, UnionOperand::Int(1));
        block.emit_branch(Opcode::Jmp, end_label);
        block.place_label(else_label);
        block.emit(Opcode::LdInt, UnionOperand::Int(2));
        block.place_label(end_label);
        block.emit(Opcode::Ret, UnionOperand::None);
        let code = block.flatten();

        let (interns, symbols) = Interns::new();
        let mut interp = Interpreter::new(&tables, interns, symbols, NoopTracer, 64);
        let result = interp.run(&code, None, &[], ClosureKind::Global).unwrap();
        assert_eq!(result, SmileArg::Int64(1));
    }

    #[test]
    fn max_call_depth_is_enforced() {
        let tables = CompiledTables::new();
        let (interns, symbols) = Interns::new();
        let mut interp = Interpreter::new(&tables, interns, symbols, NoopTracer, 1);
        let code = ByteCodeSegment::new();
        interp.call_depth = 1;
        let err = interp.run(&code, None, &[], ClosureKind::Global).unwrap_err();
        assert_eq!(err.exc_type, ExcType::EvalError);
    }
}
