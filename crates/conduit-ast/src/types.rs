//! Type expression definitions for the AST

use super::*;

/// Type expression node
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub span: Span,
    pub kind: TypeExprKind,
}

/// Type expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// Named type: `C`, `List<Int>?`, `E.V`, `T`
    Named {
        target: Option<DeclId>,
        type_arguments: Vec<TypeExprId>,
        is_nullable: bool,
    },

    /// Callable type: `(a: Int) -> (r: String)`
    Callable {
        parameters: Vec<DeclId>,
        results: Vec<DeclId>,
    },

    /// Literal type: `literal<1, "a", null>`
    Literal { constants: Vec<ExprId> },

    /// Union type: `union<A, B>`
    Union { types: Vec<TypeExprId> },
}
