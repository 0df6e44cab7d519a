//! `UserFunctionInfo` and `ExternalFunctionInfo`: the compile-time descriptors
//! behind the two [`crate::heap::FunctionData`] variants.
//!
//! A `Function` heap object never carries its own bytecode or argument-check
//! policy inline — it indexes into one of these pools on
//! [`crate::compiled_tables::CompiledTables`], so every closure created from
//! the same `$fn` shares one descriptor. Grounded on `function.rs` in the
//! teacher crate (the `Function` struct's doc comments on namespace layout
//! and the `is_simple_sync` fast-path idea, here repurposed as
//! `ArgCheckFlags`).

use smallvec::SmallVec;

use crate::{bytecode::ByteCodeSegment, closure::ClosureInfo, intern::SymbolId};

/// Which argument-count checks a function call must pass before the call
/// proceeds, mirroring the `ARG_CHECK_*` flag bits described in §4.3's ABI
/// section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArgCheckFlags {
    bits: u8,
}

impl ArgCheckFlags {
    pub const NONE: u8 = 0x00;
    pub const MIN: u8 = 0x01;
    pub const MAX: u8 = 0x02;
    pub const EXACT: u8 = Self::MIN | Self::MAX;

    #[must_use]
    pub fn new(bits: u8) -> Self {
        Self { bits }
    }

    #[must_use]
    pub fn has(self, flag: u8) -> bool {
        self.bits & flag != 0
    }
}

/// Checks `arg_count` against `(min_args, max_args)` under `flags`, returning
/// `Ok(())` if the call may proceed or `Err` describing which bound failed.
pub fn check_args(flags: ArgCheckFlags, min_args: u16, max_args: u16, arg_count: u16) -> Result<(), ArgCountError> {
    if flags.has(ArgCheckFlags::MIN) && arg_count < min_args {
        return Err(ArgCountError::TooFew { min_args, got: arg_count });
    }
    if flags.has(ArgCheckFlags::MAX) && arg_count > max_args {
        return Err(ArgCountError::TooMany { max_args, got: arg_count });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgCountError {
    TooFew { min_args: u16, got: u16 },
    TooMany { max_args: u16, got: u16 },
}

/// Compile-time descriptor for a Smile-level function: `{ args, body,
/// closure_info }` (§4.3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserFunctionInfo {
    pub name: SymbolId,
    pub closure_info: ClosureInfo,
    pub body: ByteCodeSegment,
    pub min_args: u16,
    pub max_args: u16,
    pub arg_check: ArgCheckFlags,
}

/// Descriptor for a function provided by the embedder rather than compiled
/// from Smile source. Exercised only through its argument-check policy and
/// name here; the actual native call dispatch is an embedder concern (§6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExternalFunctionInfo {
    pub name: SymbolId,
    pub min_args: u16,
    pub max_args: u16,
    pub arg_check: ArgCheckFlags,
    /// Declared parameter names, for diagnostics only.
    pub param_names: SmallVec<[SymbolId; 4]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_arity_rejects_too_few_and_too_many() {
        let flags = ArgCheckFlags::new(ArgCheckFlags::EXACT);
        assert!(check_args(flags, 2, 2, 1).is_err());
        assert!(check_args(flags, 2, 2, 3).is_err());
        assert!(check_args(flags, 2, 2, 2).is_ok());
    }

    #[test]
    fn min_only_flag_ignores_upper_bound() {
        let flags = ArgCheckFlags::new(ArgCheckFlags::MIN);
        assert!(check_args(flags, 1, 1, 50).is_ok());
        assert!(check_args(flags, 1, 1, 0).is_err());
    }

    #[test]
    fn none_flag_accepts_any_arity() {
        let flags = ArgCheckFlags::new(ArgCheckFlags::NONE);
        assert!(check_args(flags, 5, 5, 0).is_ok());
    }
}
