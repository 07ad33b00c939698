//! Declaration definitions for the AST

use super::*;
use std::fmt;

/// Declaration node
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: Ident,
    pub span: Span,
    /// Declaration that syntactically contains this one (class for members,
    /// enum for variants, callable for parameters and results)
    pub parent: Option<DeclId>,
    pub kind: DeclKind,
}

/// Declaration kinds
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// Class declaration
    Class {
        type_parameters: Vec<DeclId>,
        /// Constructor parameters; `None` if the class cannot be instantiated
        parameters: Option<Vec<DeclId>>,
        /// Parent types. Only the first one takes part in the superclass chain.
        parents: Vec<TypeExprId>,
        members: Vec<DeclId>,
    },

    /// Enum declaration
    Enum { variants: Vec<DeclId> },

    /// Enum variant declaration
    EnumVariant { parameters: Vec<DeclId> },

    /// Class attribute
    Attribute {
        is_static: bool,
        ty: Option<TypeExprId>,
    },

    /// Function (class method or global function)
    Function {
        is_static: bool,
        type_parameters: Vec<DeclId>,
        parameters: Vec<DeclId>,
        results: Vec<DeclId>,
    },

    /// Segment: a user-defined callable whose results are produced by `yield`
    Segment {
        parameters: Vec<DeclId>,
        results: Vec<DeclId>,
        body: Vec<StmtId>,
    },

    /// Pipeline: entry point, not callable
    Pipeline { body: Vec<StmtId> },

    /// Annotation declaration
    Annotation { parameters: Vec<DeclId> },

    /// Parameter of any callable. Optional iff it has a default value.
    Parameter {
        is_constant: bool,
        ty: Option<TypeExprId>,
        default_value: Option<ExprId>,
    },

    /// Declared result of a function, segment or callable type
    Result { ty: Option<TypeExprId> },

    /// Type parameter of a class or function
    TypeParameter { variance: Variance },

    /// Placeholder introduced by an assignment
    Placeholder { assignment: Option<StmtId> },

    /// Result of a block lambda introduced by an assignment
    BlockLambdaResult { assignment: Option<StmtId> },
}

/// Declaration-site variance of a type parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

impl DeclKind {
    /// Short, user-facing description of the declaration kind
    pub fn describe(&self) -> &'static str {
        match self {
            DeclKind::Class { .. } => "class",
            DeclKind::Enum { .. } => "enum",
            DeclKind::EnumVariant { .. } => "enum variant",
            DeclKind::Attribute { .. } => "attribute",
            DeclKind::Function { .. } => "function",
            DeclKind::Segment { .. } => "segment",
            DeclKind::Pipeline { .. } => "pipeline",
            DeclKind::Annotation { .. } => "annotation",
            DeclKind::Parameter { .. } => "parameter",
            DeclKind::Result { .. } => "result",
            DeclKind::TypeParameter { .. } => "type parameter",
            DeclKind::Placeholder { .. } => "placeholder",
            DeclKind::BlockLambdaResult { .. } => "block lambda result",
        }
    }

    /// Whether a reference to this declaration denotes something that can be called
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            DeclKind::Class { .. }
                | DeclKind::EnumVariant { .. }
                | DeclKind::Function { .. }
                | DeclKind::Segment { .. }
                | DeclKind::Annotation { .. }
        )
    }
}

// Display implementations

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variance::Invariant => write!(f, "invariant"),
            Variance::Covariant => write!(f, "out"),
            Variance::Contravariant => write!(f, "in"),
        }
    }
}
