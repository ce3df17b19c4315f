//! Compilation-fatal errors.
//!
//! These abort the compilation outright; recoverable conditions (like an
//! unresolved identifier) are instead embedded into the bytecode as
//! `Error`-opcode diagnostics for the VM to report at execution time.

use crate::ast::BinaryOperatorKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    /// `push_subroutine` was asked for a name with no symbol in scope.
    #[error("no symbol found for `{0}`")]
    UnknownSubroutine(String),

    /// A symbol of a routine-requiring kind has no routine attached —
    /// an earlier symbol-table invariant was violated.
    #[error("`{0}` is not a reference to an existing routine")]
    MissingRoutine(String),

    /// `pop_subroutine` with nothing on the active stack.
    #[error("no active subroutine")]
    NoActiveSubroutine,

    /// `pop_subroutine` on a routine that emitted no ops.
    #[error("routine is empty")]
    EmptyRoutine,

    /// Only `=` assignments are lowered.
    #[error("binary operator {0:?} not handled")]
    UnsupportedOperator(BinaryOperatorKind),

    /// Only identifiers are supported as assignment targets.
    #[error("assignment target must be an identifier")]
    UnsupportedAssignmentTarget,
}
