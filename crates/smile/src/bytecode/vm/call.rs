//! Function and method call sequencing.
//!
//! Both paths pop their arguments off the caller's evaluation stack, check
//! them against the callee's declared arity, then recurse into
//! [`crate::bytecode::vm::Interpreter::run`] for a `User` function or invoke
//! the embedder-supplied native for an `External` one.

use crate::{
    bytecode::vm::{Frame, Interpreter},
    exception::{ExcType, Throw},
    function::check_args,
    heap::{FunctionData, HeapData},
    intern::SymbolId,
    tracer::VmTracer,
    value::SmileArg,
};

pub(super) fn dispatch_call<Tr: VmTracer>(interp: &mut Interpreter<'_, Tr>, frame: &mut Frame, arg_count: u16) -> Result<(), Throw> {
    let args = pop_args(frame, arg_count);
    let callee = frame.stack.pop().expect("Call requires a function value");
    let result = invoke(interp, callee, &args)?;
    frame.stack.push(result);
    Ok(())
}

pub(super) fn dispatch_method_call<Tr: VmTracer>(
    interp: &mut Interpreter<'_, Tr>,
    frame: &mut Frame,
    method: SymbolId,
    arg_count: u16,
) -> Result<(), Throw> {
    let args = pop_args(frame, arg_count);
    let receiver = frame.stack.pop().expect("MetCall requires a receiver");
    let Some(receiver_id) = receiver.as_heap_id() else {
        return Err(Throw::new(ExcType::PropertyError, receiver, "method call on an unboxed value"));
    };
    let callee = interp.heap.get_property(receiver_id, method).ok_or_else(|| {
        Throw::new(ExcType::PropertyError, receiver, format!("no such method: {}", interp.interns.name_of(method)))
    })?;
    let result = invoke(interp, callee, &args)?;
    frame.stack.push(result);
    Ok(())
}

fn pop_args(frame: &mut Frame, arg_count: u16) -> Vec<SmileArg> {
    let start = frame.stack.len() - arg_count as usize;
    frame.stack.split_off(start)
}

fn invoke<Tr: VmTracer>(interp: &mut Interpreter<'_, Tr>, callee: SmileArg, args: &[SmileArg]) -> Result<SmileArg, Throw> {
    let Some(id) = callee.as_heap_id() else {
        return Err(Throw::new(ExcType::EvalError, callee, "attempt to call a non-function value"));
    };
    let HeapData::Function(func_data) = interp.heap.get(id).data.clone() else {
        return Err(Throw::new(ExcType::EvalError, callee, "attempt to call a non-function value"));
    };
    match func_data {
        FunctionData::User { info_index, closure } => {
            let info = interp.tables.user_function(info_index);
            check_args(info.arg_check, info.min_args, info.max_args, args.len() as u16).map_err(|_| {
                Throw::new(ExcType::EvalError, callee, "wrong number of arguments")
            })?;
            interp.tracer.on_call_enter(info.name, 0);
            let body = info.body.clone();
            let kind = info.closure_info.kind;
            let result = interp.run(&body, closure, args, kind);
            interp.tracer.on_call_exit(info.name, 0);
            result
        }
        FunctionData::External { info_index } => {
            Err(Throw::new(ExcType::NativeMethodError, callee, format!("external function {info_index} has no embedder binding")))
        }
    }
}
