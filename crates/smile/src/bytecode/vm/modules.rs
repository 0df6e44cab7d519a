//! Lazy module initialization for `$include`/`LdInclude` (§4.4, "Include
//! semantics").
//!
//! A module is just another compiled top-level program — the same
//! `Global`-kind closure shape the main program's top level uses. The first
//! `LdInclude` against a given module id runs that module's body to
//! completion and snapshots its compile-time-declared export names out of
//! the resulting global dictionary into a [`ModuleExports`]. Every later
//! `$include` of the same id reuses the cached result through
//! [`ModuleResolver`] without rerunning the body.

use indexmap::IndexMap;

use crate::{
    bytecode::vm::Interpreter,
    exception::{ExcType, Throw},
    module::{IncludeError, ModuleExports},
    tracer::VmTracer,
    value::SmileArg,
};

pub(super) fn ensure_loaded<Tr: VmTracer>(interp: &mut Interpreter<'_, Tr>, module_id: u32) -> Result<(), Throw> {
    if interp.modules.is_ready(module_id) {
        return Ok(());
    }
    let Some(descriptor) = interp.tables.module(module_id) else {
        return Err(Throw::new(ExcType::IoError, SmileArg::Heap(interp.objects.null), "module not found"));
    };
    let function_index = descriptor.function_index;
    let export_names = descriptor.exports.clone();

    interp.modules.begin_load(module_id).map_err(|err| match err {
        IncludeError::CircularInclude => {
            Throw::new(ExcType::EvalError, SmileArg::Heap(interp.objects.null), "circular module include")
        }
    })?;

    let info = interp.tables.user_function(function_index).clone();
    let (_, closure) = interp.run_with_closure(&info.body, None, &[], info.closure_info.kind)?;

    let mut exports = IndexMap::new();
    for name in export_names {
        exports.insert(name, interp.read_global(closure, name));
    }
    interp.modules.finish_load(module_id, ModuleExports { exports });
    Ok(())
}
