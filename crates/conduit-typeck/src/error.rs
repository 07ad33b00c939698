//! Analysis errors

use thiserror::Error;

use crate::types::Type;

/// Errors raised while setting up an analysis. Queries themselves never fail;
/// they answer with `Type::Unknown` or `EvaluatedNode::Unknown` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// A builtin class the core depends on is not declared in the module
    #[error("builtin class '{name}' is not declared")]
    MissingBuiltinClass { name: String },

    /// A builtin name is declared, but not as a class
    #[error("builtin '{name}' is declared as {found}, expected a class")]
    BuiltinNotAClass { name: String, found: &'static str },
}

/// A value of type `found` was used where `expected` is required
#[derive(Debug, Clone, PartialEq, Error)]
#[error("type mismatch: expected {expected}, found {found}")]
pub struct AssignabilityError {
    pub expected: Type,
    pub found: Type,
}
