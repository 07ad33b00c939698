//! # Conduit AST
//!
//! Resolved, immutable syntax tree for the Conduit pipeline language.
//! Nodes live in per-module arenas and refer to each other through typed ids.
//! Name resolution has already happened: every reference carries either the
//! id of its target declaration or `None` for an unresolved reference.

use std::fmt;

// =============================================================================
// Core Types (kept in lib.rs - used by all modules)
// =============================================================================

/// Identity of a source document
pub type DocumentId = usize;

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub file_id: DocumentId,
}

impl Span {
    pub fn new(start: usize, end: usize, file_id: DocumentId) -> Self {
        Self { start, end, file_id }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            file_id: self.file_id,
        }
    }
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// Arena Ids
// =============================================================================

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Identity of a declaration. Two declaration-bearing values are the same
    /// declaration iff their ids are equal.
    DeclId,
    "decl#"
);
arena_id!(
    /// Identity of an expression node
    ExprId,
    "expr#"
);
arena_id!(
    /// Identity of a type expression node
    TypeExprId,
    "type#"
);
arena_id!(
    /// Identity of a statement
    StmtId,
    "stmt#"
);

/// Structural path of a node inside its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Decl(DeclId),
    Expr(ExprId),
    TypeExpr(TypeExprId),
}

impl From<DeclId> for NodeKey {
    fn from(id: DeclId) -> Self {
        NodeKey::Decl(id)
    }
}

impl From<ExprId> for NodeKey {
    fn from(id: ExprId) -> Self {
        NodeKey::Expr(id)
    }
}

impl From<TypeExprId> for NodeKey {
    fn from(id: TypeExprId) -> Self {
        NodeKey::TypeExpr(id)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Decl(id) => write!(f, "{}", id),
            NodeKey::Expr(id) => write!(f, "{}", id),
            NodeKey::TypeExpr(id) => write!(f, "{}", id),
        }
    }
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod types;
pub mod expr;
pub mod stmt;
pub mod decl;
pub mod module;
pub mod builder;

// =============================================================================
// Re-exports
// =============================================================================

pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use module::*;
pub use builder::ModuleBuilder;

// =============================================================================
// Tests
// =============================================================================
