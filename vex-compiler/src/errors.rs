// Static errors raised by the assignment analyzer (SPEC_FULL §4.1, §6).
//
// Grounded on the teacher's `borrow_checker::errors::BorrowError`: a plain
// enum with a hand-rolled `Display` that adds a "help:" follow-up line,
// plus a `vex_diagnostics::Diagnostic` conversion. Trimmed to exactly the
// three static error kinds this subsystem names; the move/borrow/lifetime
// variants of the original have no counterpart here.

use crate::diagnostics::{DiagnosticEngine, Span};
use std::fmt;

pub type AnalyzeResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Write to a `let` binding or a function parameter.
    ImmutableAssignment { name: String, span: Span },

    /// Write to an annotated binding whose value has no legal coercion.
    AnnotatedTypeMismatch {
        name: String,
        expected: String,
        found: String,
        span: Span,
    },

    /// Assignment target (or the innermost receiver of an indexed/member
    /// target) resolves to no binding in the scope chain.
    UnknownBinding { name: String, span: Span },
}

impl AnalysisError {
    pub fn span(&self) -> &Span {
        match self {
            AnalysisError::ImmutableAssignment { span, .. } => span,
            AnalysisError::AnnotatedTypeMismatch { span, .. } => span,
            AnalysisError::UnknownBinding { span, .. } => span,
        }
    }

    /// Record this error on a diagnostic engine, reusing the same error
    /// codes and message shape as the engine's existing
    /// `immutable_assignment`/`annotated_type_mismatch`/`undefined_variable`
    /// helpers.
    pub fn emit(&self, engine: &mut DiagnosticEngine) {
        match self {
            AnalysisError::ImmutableAssignment { name, span } => {
                engine.immutable_assignment(name, span.clone());
            }
            AnalysisError::AnnotatedTypeMismatch {
                name,
                expected,
                found,
                span,
            } => {
                engine.annotated_type_mismatch(name, expected, found, span.clone());
            }
            AnalysisError::UnknownBinding { name, span } => {
                engine.undefined_variable(name, span.clone(), Vec::new());
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::ImmutableAssignment { name, .. } => {
                write!(f, "cannot assign twice to immutable variable `{}`", name)?;
                write!(f, "\nhelp: consider making this binding mutable: `let! {}`", name)
            }
            AnalysisError::AnnotatedTypeMismatch {
                name,
                expected,
                found,
                ..
            } => write!(
                f,
                "mismatched types assigning to `{}`: expected `{}`, found `{}`",
                name, expected, found
            ),
            AnalysisError::UnknownBinding { name, .. } => {
                write!(f, "cannot find value `{}` in this scope", name)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
