//! # Conduit Type Checker
//!
//! Semantic core of the Conduit pipeline language: the type model, the
//! assignability checker, the class hierarchy, the partial evaluator and the
//! type computer. All queries run against an [`Analysis`] of one resolved
//! [`Module`](conduit_ast::Module) and are total: where nothing can be said,
//! they answer with [`Type::Unknown`] or [`EvaluatedNode::Unknown`].
//!
//! ```ignore
//! let analysis = Analysis::new(&module)?;
//! let ty = analysis.compute_type(expr);
//! assert!(analysis.is_assignable_to(&ty, &expected));
//! ```

mod error;
mod diagnostic;
mod options;
mod constant;
mod types;
mod evaluated;
mod builtins;
mod cache;
mod analysis;
mod class_hierarchy;
mod evaluator;
mod checker;
mod computer;
mod expr_types;
mod supertype;

// Re-export public API
pub use error::{AnalysisError, AssignabilityError};
pub use diagnostic::Diagnostic;
pub use options::{AnalysisOptions, BuiltinNames};
pub use constant::Constant;
pub use types::{
    CallableType, ClassType, EnumType, EnumVariantType, LiteralType, NamedTupleEntry, NamedTupleType, StaticType,
    Type, TypeParameterSubstitutions, TypeParameterType, UnionType,
};
pub use evaluated::{
    EvaluatedEnumVariant, EvaluatedMap, EvaluatedMapEntry, EvaluatedNamedTuple, EvaluatedNode, NamedEntry,
    ParameterSubstitutions,
};
pub use builtins::Builtins;
pub use cache::{AnalysisCache, NodePath};
pub use analysis::Analysis;
pub use class_hierarchy::{ClassHierarchy, Superclasses};
pub use evaluator::PartialEvaluator;
pub use checker::{AssignabilityOptions, TypeChecker};
pub use computer::TypeComputer;

// =============================================================================
// Tests
// =============================================================================
