//! Expression definitions for the AST

use super::*;
use num_bigint::BigInt;
use std::fmt;

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Boolean literal
    Boolean(bool),

    /// Float literal
    Float(f64),

    /// Int literal (arbitrary precision)
    Int(BigInt),

    /// `null`
    Null,

    /// String literal
    String(String),

    /// Verbatim text between the interpolations of a template string
    TemplateFragment(String),

    /// Template string: `"a {{ x }} b"` is `[fragment, x, fragment]`
    TemplateString { parts: Vec<ExprId> },

    /// Block lambda: (params) { statements }
    BlockLambda {
        parameters: Vec<DeclId>,
        body: Vec<StmtId>,
    },

    /// Expression lambda: (params) -> result
    ExpressionLambda {
        parameters: Vec<DeclId>,
        result: ExprId,
    },

    /// Call: receiver(args) or receiver?(args)
    Call {
        receiver: ExprId,
        arguments: Vec<Argument>,
        is_null_safe: bool,
    },

    /// Indexed access: receiver[index] or receiver?[index]
    IndexedAccess {
        receiver: ExprId,
        index: ExprId,
        is_null_safe: bool,
    },

    /// Binary operation: left op right
    Infix {
        operator: InfixOperator,
        left: ExprId,
        right: ExprId,
    },

    /// Unary operation: op operand
    Prefix {
        operator: PrefixOperator,
        operand: ExprId,
    },

    /// List literal: [a, b, c]
    List(Vec<ExprId>),

    /// Map literal: {k1: v1, k2: v2}
    Map(Vec<MapEntry>),

    /// Member access: receiver.member or receiver?.member
    MemberAccess {
        receiver: ExprId,
        member: Option<DeclId>,
        is_null_safe: bool,
    },

    /// Reference to a declaration
    Reference { target: Option<DeclId> },

    /// Parenthesized expression
    Parenthesized(ExprId),

    /// Type cast: expr as Type
    TypeCast { expr: ExprId, ty: TypeExprId },
}

/// Argument of a call
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Parameter the argument is assigned to, if resolved
    pub parameter: Option<DeclId>,
    pub value: ExprId,
}

/// Entry of a map literal
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: ExprId,
    pub value: ExprId,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOperator {
    // Logical
    Or,
    And,

    // Equality
    Equals,
    NotEquals,
    IdenticalTo,
    NotIdenticalTo,

    // Comparison
    LessThan,
    LessThanOrEquals,
    GreaterThanOrEquals,
    GreaterThan,

    // Arithmetic
    Plus,
    Minus,
    Times,
    DividedBy,

    // Null handling
    Elvis,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixOperator {
    Not,
    Minus,
}

impl InfixOperator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            InfixOperator::LessThan
                | InfixOperator::LessThanOrEquals
                | InfixOperator::GreaterThanOrEquals
                | InfixOperator::GreaterThan
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            InfixOperator::Plus | InfixOperator::Minus | InfixOperator::Times | InfixOperator::DividedBy
        )
    }
}

// Display implementations

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InfixOperator::Or => "or",
            InfixOperator::And => "and",
            InfixOperator::Equals => "==",
            InfixOperator::NotEquals => "!=",
            InfixOperator::IdenticalTo => "===",
            InfixOperator::NotIdenticalTo => "!==",
            InfixOperator::LessThan => "<",
            InfixOperator::LessThanOrEquals => "<=",
            InfixOperator::GreaterThanOrEquals => ">=",
            InfixOperator::GreaterThan => ">",
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Times => "*",
            InfixOperator::DividedBy => "/",
            InfixOperator::Elvis => "?:",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Not => write!(f, "not"),
            PrefixOperator::Minus => write!(f, "-"),
        }
    }
}
