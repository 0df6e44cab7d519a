//! Compile-time diagnostics and runtime exceptions.
//!
//! Two separate error channels run through this crate, matching the
//! distinction between compile time and run time drawn throughout the spec:
//! [`ParseMessage`] accumulates during compilation (informational notes up
//! through fatal errors that gate whether the program may run at all), while
//! [`RunError`]/[`Throw`] represent a runtime exception in flight, searched
//! for by a `$catch` escape continuation. Grounded on the teacher's
//! `exception_private.rs` (`RunResult` alias, `strum`-derived error-kind
//! enum).

use strum::{Display, EnumString};

use crate::value::SmileArg;

/// Result type alias for operations that can raise a runtime exception.
pub type RunResult<T> = Result<T, Throw>;

/// Severity of a single compile-time diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, serde::Serialize, serde::Deserialize)]
pub enum ParseMessageKind {
    Info,
    Warning,
    Error,
    Fatal,
}

/// One compile-time diagnostic, accumulated on [`crate::bytecode::compiler::Compiler::messages`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParseMessage {
    pub kind: ParseMessageKind,
    pub source_location: Option<crate::compiled_tables::SourceLocation>,
    pub message: String,
}

/// The runtime exception-kind taxonomy a `Throw` carries, matching the
/// source's built-in exception families exactly (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum ExcType {
    ObjectSecurityError,
    PropertyError,
    EvalError,
    NativeMethodError,
    ParseError,
    TypeError,
    ArithmeticError,
    IoError,
}

/// One frame of a captured stack trace, recorded when a [`Throw`] is raised
/// so `$catch` handlers (or an uncaught-exception report) can show where it
/// came from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StackFrame {
    pub function_name: crate::intern::SymbolId,
    pub source_location: Option<crate::compiled_tables::SourceLocation>,
}

/// A runtime exception in flight: the thrown value (usually a `UserObject`
/// built from `ExcType`'s fields) plus the call stack captured at the throw
/// site.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Throw {
    pub exc_type: ExcType,
    pub value: SmileArg,
    pub message: String,
    pub stack_trace: Vec<StackFrame>,
}

impl Throw {
    #[must_use]
    pub fn new(exc_type: ExcType, value: SmileArg, message: impl Into<String>) -> Self {
        Self { exc_type, value, message: message.into(), stack_trace: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exc_type_kebab_case_round_trips_through_strum() {
        use std::str::FromStr;
        assert_eq!(ExcType::PropertyError.to_string(), "property-error");
        assert_eq!(ExcType::from_str("arithmetic-error").unwrap(), ExcType::ArithmeticError);
    }

    #[test]
    fn parse_message_kinds_order_by_severity() {
        assert!(ParseMessageKind::Info < ParseMessageKind::Warning);
        assert!(ParseMessageKind::Warning < ParseMessageKind::Error);
        assert!(ParseMessageKind::Error < ParseMessageKind::Fatal);
    }
}
