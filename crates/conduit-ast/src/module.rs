//! Module definition: the node arenas of one resolved document

use super::*;

/// Root AST node - a resolved document with all of its nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub document: DocumentId,
    pub(crate) decls: Vec<Decl>,
    pub(crate) exprs: Vec<Expr>,
    pub(crate) type_exprs: Vec<TypeExpr>,
    pub(crate) stmts: Vec<Stmt>,
    pub(crate) top_level: Vec<DeclId>,
}

impl Module {
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn type_expr(&self, id: TypeExprId) -> &TypeExpr {
        &self.type_exprs[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn top_level(&self) -> &[DeclId] {
        &self.top_level
    }

    pub fn span_of(&self, node: NodeKey) -> Span {
        match node {
            NodeKey::Decl(id) => self.decl(id).span,
            NodeKey::Expr(id) => self.expr(id).span,
            NodeKey::TypeExpr(id) => self.type_expr(id).span,
        }
    }

    /// Find a top-level class by name
    pub fn find_class(&self, name: &str) -> Option<DeclId> {
        self.top_level.iter().copied().find(|id| {
            let decl = self.decl(*id);
            decl.name.name == name && matches!(decl.kind, DeclKind::Class { .. })
        })
    }

    /// The class directly containing a member, if any
    pub fn containing_class(&self, id: DeclId) -> Option<DeclId> {
        let parent = self.decl(id).parent?;
        matches!(self.decl(parent).kind, DeclKind::Class { .. }).then_some(parent)
    }

    /// The enum an enum variant belongs to
    pub fn containing_enum(&self, variant: DeclId) -> Option<DeclId> {
        let parent = self.decl(variant).parent?;
        matches!(self.decl(parent).kind, DeclKind::Enum { .. }).then_some(parent)
    }

    /// Nested classes and enums count as static members.
    pub fn is_static(&self, id: DeclId) -> bool {
        match &self.decl(id).kind {
            DeclKind::Attribute { is_static, .. } | DeclKind::Function { is_static, .. } => *is_static,
            DeclKind::Class { .. } | DeclKind::Enum { .. } => true,
            _ => false,
        }
    }

    pub fn is_optional_parameter(&self, id: DeclId) -> bool {
        matches!(
            self.decl(id).kind,
            DeclKind::Parameter {
                default_value: Some(_),
                ..
            }
        )
    }

    pub fn is_constant_parameter(&self, id: DeclId) -> bool {
        matches!(self.decl(id).kind, DeclKind::Parameter { is_constant: true, .. })
    }

    /// Parameters of a callable declaration; empty for everything else
    pub fn parameters_of(&self, id: DeclId) -> &[DeclId] {
        match &self.decl(id).kind {
            DeclKind::Class {
                parameters: Some(parameters),
                ..
            }
            | DeclKind::EnumVariant { parameters }
            | DeclKind::Function { parameters, .. }
            | DeclKind::Segment { parameters, .. }
            | DeclKind::Annotation { parameters } => parameters,
            _ => &[],
        }
    }

    /// Declared results of a function or segment
    pub fn results_of(&self, id: DeclId) -> &[DeclId] {
        match &self.decl(id).kind {
            DeclKind::Function { results, .. } | DeclKind::Segment { results, .. } => results,
            _ => &[],
        }
    }

    pub fn type_parameters_of(&self, id: DeclId) -> &[DeclId] {
        match &self.decl(id).kind {
            DeclKind::Class { type_parameters, .. } | DeclKind::Function { type_parameters, .. } => {
                type_parameters
            }
            _ => &[],
        }
    }

    pub fn members_of(&self, class: DeclId) -> &[DeclId] {
        match &self.decl(class).kind {
            DeclKind::Class { members, .. } => members,
            _ => &[],
        }
    }

    pub fn variants_of(&self, enum_decl: DeclId) -> &[DeclId] {
        match &self.decl(enum_decl).kind {
            DeclKind::Enum { variants } => variants,
            _ => &[],
        }
    }

    /// The declared type expression of a parameter, result or attribute
    pub fn declared_type_of(&self, id: DeclId) -> Option<TypeExprId> {
        match &self.decl(id).kind {
            DeclKind::Parameter { ty, .. } | DeclKind::Result { ty } | DeclKind::Attribute { ty, .. } => *ty,
            _ => None,
        }
    }

    pub fn default_value_of(&self, parameter: DeclId) -> Option<ExprId> {
        match &self.decl(parameter).kind {
            DeclKind::Parameter { default_value, .. } => *default_value,
            _ => None,
        }
    }

    /// The assignment that introduces a placeholder or block lambda result
    pub fn assignment_of(&self, id: DeclId) -> Option<StmtId> {
        match &self.decl(id).kind {
            DeclKind::Placeholder { assignment } | DeclKind::BlockLambdaResult { assignment } => *assignment,
            _ => None,
        }
    }

    /// Position of the assignee declaring or targeting `decl` in an assignment,
    /// together with the assigned expression
    pub fn assigned_value(&self, stmt: StmtId, decl: DeclId) -> Option<(ExprId, usize)> {
        match &self.stmt(stmt).kind {
            StmtKind::Assignment { assignees, expr } => assignees
                .iter()
                .position(|assignee| assignee.declaration() == Some(decl))
                .map(|index| (*expr, index)),
            StmtKind::Expression(_) => None,
        }
    }

    /// Results declared inside a block lambda body, in order of appearance
    pub fn block_lambda_results(&self, lambda: ExprId) -> Vec<DeclId> {
        let ExprKind::BlockLambda { body, .. } = &self.expr(lambda).kind else {
            return Vec::new();
        };
        body.iter()
            .filter_map(|stmt| match &self.stmt(*stmt).kind {
                StmtKind::Assignment { assignees, .. } => Some(assignees),
                StmtKind::Expression(_) => None,
            })
            .flatten()
            .filter_map(|assignee| match assignee {
                Assignee::BlockLambdaResult(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// The statement of a segment body that yields the given result
    pub fn yield_of(&self, segment: DeclId, result: DeclId) -> Option<StmtId> {
        let DeclKind::Segment { body, .. } = &self.decl(segment).kind else {
            return None;
        };
        body.iter().copied().find(|stmt| match &self.stmt(*stmt).kind {
            StmtKind::Assignment { assignees, .. } => assignees.contains(&Assignee::Yield(Some(result))),
            StmtKind::Expression(_) => false,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
