//! `$catch`/`$new` runtime support: escape-continuation bookkeeping and
//! user-object construction.
//!
//! `Catch`/`EndCatch` bracket a protected region; rather than the original
//! `setjmp`-captured `jmp_buf`, entering a catch region here remembers the
//! evaluation-stack depth to restore to and the handler address to resume
//! at if a `Throw` unwinds through it. `step`'s dispatch loop is what
//! actually intercepts the exception and jumps there — this module only
//! records/discards the bracket.

use ahash::AHashMap;

use crate::{
    bytecode::vm::{CatchMark, Frame, Interpreter},
    exception::{ExcType, Throw},
    heap::{HeapData, UserObjectData},
    kind::HeapFlags,
    tracer::VmTracer,
};

pub(super) fn enter_catch(frame: &mut Frame, handler_pc: usize) {
    frame.catch_marks.push(CatchMark { stack_depth: frame.stack.len(), handler_pc });
}

pub(super) fn exit_catch(frame: &mut Frame) {
    frame.catch_marks.pop();
}

/// `[$new base (name value)...]`: pops `2 * count` `(value, name)` pairs
/// (value pushed first, name second, per `special_forms::compile_new`) plus
/// the base object, and builds a fresh `UserObject` appendable/writable by
/// default.
pub(super) fn build_new_object<Tr: VmTracer>(interp: &mut Interpreter<'_, Tr>, frame: &mut Frame, count: u16) -> Result<(), Throw> {
    let mut dict = AHashMap::default();
    for _ in 0..count {
        let name_arg = frame.stack.pop().expect("NewObj: missing member name");
        let value = frame.stack.pop().expect("NewObj: missing member value");
        let crate::value::SmileArg::Symbol(name) = interp.heap.unbox_value(name_arg) else {
            return Err(Throw::new(ExcType::TypeError, name_arg, "object member name must be a symbol"));
        };
        dict.insert(name, value);
    }
    let base = frame.stack.pop().expect("NewObj: missing base");
    let base_id = base.as_heap_id();
    let mut flags = HeapFlags::default();
    flags.set(HeapFlags::APPENDABLE, true);
    flags.set(HeapFlags::WRITABLE, true);
    let id = interp.heap.alloc(
        crate::intern::SymbolId::NONE,
        base_id,
        flags,
        HeapData::UserObject(UserObjectData { security_key: None, name: crate::intern::SymbolId::NONE, dict }),
    );
    frame.stack.push(crate::value::SmileArg::Heap(id));
    Ok(())
}
