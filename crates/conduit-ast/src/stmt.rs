//! Statement definitions for the AST

use super::*;

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Assignment: `val a, yield b, _ = expr;`
    Assignment {
        assignees: Vec<Assignee>,
        expr: ExprId,
    },

    /// Expression statement: `expr;`
    Expression(ExprId),
}

/// Left-hand side entry of an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assignee {
    /// `val name`
    Placeholder(DeclId),
    /// `yield name` inside a block lambda
    BlockLambdaResult(DeclId),
    /// `yield name` inside a segment, pointing at the segment result if resolved
    Yield(Option<DeclId>),
    /// `_`
    Wildcard,
}

impl Assignee {
    /// The declaration introduced or targeted by this assignee
    pub fn declaration(&self) -> Option<DeclId> {
        match self {
            Assignee::Placeholder(id) | Assignee::BlockLambdaResult(id) => Some(*id),
            Assignee::Yield(target) => *target,
            Assignee::Wildcard => None,
        }
    }
}
