//! Error taxonomy for check construction, check execution and audit runs.
//!
//! "Inapplicable" is deliberately absent: a check that is disabled or does
//! not match resolves with `None`, which is an outcome and not a failure.

use thiserror::Error;

/// Which ambient namespace a textual function reference was resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Evaluate,
    After,
    Matches,
}

impl std::fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FunctionKind::Evaluate => "evaluate",
            FunctionKind::After => "after",
            FunctionKind::Matches => "matches",
        };
        f.write_str(name)
    }
}

/// A textual function specification could not be turned into a callable.
///
/// Raised synchronously from `Check::new` and `Check::configure`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("malformed {kind} source {source_text:?}: {reason}")]
    Malformed {
        kind: FunctionKind,
        source_text: String,
        reason: String,
    },

    #[error("no {kind} function registered under {name:?}")]
    Unresolved { kind: FunctionKind, name: String },
}

/// Evaluation logic failed, either by returning an error synchronously or
/// by rejecting through its asynchronous completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("evaluation failed: {0}")]
    Failed(String),

    #[error("invalid evaluation input: {reason}")]
    Invalid { reason: String },
}

impl EvaluationError {
    pub fn failed(msg: impl Into<String>) -> Self {
        EvaluationError::Failed(msg.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        EvaluationError::Invalid {
            reason: reason.into(),
        }
    }
}

/// Failure delivered through a check's completion channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("check {check_id:?}: {source}")]
    Evaluation {
        check_id: String,
        #[source]
        source: EvaluationError,
    },
}

impl CheckError {
    pub fn check_id(&self) -> &str {
        match self {
            CheckError::Evaluation { check_id, .. } => check_id,
        }
    }

    pub fn evaluation(&self) -> &EvaluationError {
        match self {
            CheckError::Evaluation { source, .. } => source,
        }
    }
}

/// The external audit-run producer failed before any result was reduced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("audit run failed: {0}")]
    Producer(String),
}
