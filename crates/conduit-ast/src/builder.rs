//! Programmatic construction of resolved modules
//!
//! The builder is what the name-resolution layer (and every test) uses to hand
//! a resolved tree to the semantic core. Nodes get synthetic, strictly
//! increasing spans inside the builder's document. Operator, call and access
//! expressions span their operands as well.

use super::*;
use num_bigint::BigInt;

pub struct ModuleBuilder {
    module: Module,
    offset: usize,
}

impl ModuleBuilder {
    pub fn new(document: DocumentId) -> Self {
        Self {
            module: Module {
                document,
                decls: Vec::new(),
                exprs: Vec::new(),
                type_exprs: Vec::new(),
                stmts: Vec::new(),
                top_level: Vec::new(),
            },
            offset: 0,
        }
    }

    /// Read access to the module built so far
    pub fn module_ref(&self) -> &Module {
        &self.module
    }

    pub fn finish(self) -> Module {
        self.module
    }

    fn next_span(&mut self) -> Span {
        let span = Span::new(self.offset, self.offset + 1, self.module.document);
        self.offset += 1;
        span
    }

    // =========================================================================
    // Raw allocation
    // =========================================================================

    pub fn push_decl(&mut self, name: &str, parent: Option<DeclId>, kind: DeclKind) -> DeclId {
        let id = DeclId(self.module.decls.len() as u32);
        let span = self.next_span();
        self.module.decls.push(Decl {
            name: Ident::new(name),
            span,
            parent,
            kind,
        });
        if parent.is_none() && is_top_level_kind(&self.module.decls[id.index()].kind) {
            self.module.top_level.push(id);
        }
        id
    }

    pub fn push_expr(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId(self.module.exprs.len() as u32);
        let span = self.next_span();
        self.module.exprs.push(Expr { span, kind });
        id
    }

    /// Push an expression whose span covers the spans of `operands`
    fn push_composite_expr(&mut self, kind: ExprKind, operands: &[ExprId]) -> ExprId {
        let id = self.push_expr(kind);
        let span = operands
            .iter()
            .fold(self.module.exprs[id.index()].span, |span, operand| {
                span.merge(&self.module.exprs[operand.index()].span)
            });
        self.module.exprs[id.index()].span = span;
        id
    }

    pub fn push_type_expr(&mut self, kind: TypeExprKind) -> TypeExprId {
        let id = TypeExprId(self.module.type_exprs.len() as u32);
        let span = self.next_span();
        self.module.type_exprs.push(TypeExpr { span, kind });
        id
    }

    pub fn push_stmt(&mut self, kind: StmtKind) -> StmtId {
        let id = StmtId(self.module.stmts.len() as u32);
        let span = self.next_span();
        self.module.stmts.push(Stmt { span, kind });
        id
    }

    fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.module.decls[id.index()]
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Top-level class, optionally extending `parent`
    pub fn class(&mut self, name: &str, parent: Option<DeclId>) -> DeclId {
        let parents = match parent {
            Some(parent) => vec![self.named(parent)],
            None => Vec::new(),
        };
        self.push_decl(
            name,
            None,
            DeclKind::Class {
                type_parameters: Vec::new(),
                parameters: None,
                parents,
                members: Vec::new(),
            },
        )
    }

    /// Class nested inside another class
    pub fn nested_class(&mut self, outer: DeclId, name: &str) -> DeclId {
        let id = self.push_decl(
            name,
            Some(outer),
            DeclKind::Class {
                type_parameters: Vec::new(),
                parameters: None,
                parents: Vec::new(),
                members: Vec::new(),
            },
        );
        self.push_member(outer, id);
        id
    }

    /// Append a parent type to a class
    pub fn add_parent(&mut self, class: DeclId, parent: TypeExprId) {
        if let DeclKind::Class { parents, .. } = &mut self.decl_mut(class).kind {
            parents.push(parent);
        }
    }

    /// Make a class instantiable without constructor parameters
    pub fn make_instantiable(&mut self, class: DeclId) {
        if let DeclKind::Class { parameters, .. } = &mut self.decl_mut(class).kind {
            parameters.get_or_insert_with(Vec::new);
        }
    }

    pub fn type_parameter(&mut self, owner: DeclId, name: &str, variance: Variance) -> DeclId {
        let id = self.push_decl(name, Some(owner), DeclKind::TypeParameter { variance });
        match &mut self.decl_mut(owner).kind {
            DeclKind::Class { type_parameters, .. } | DeclKind::Function { type_parameters, .. } => {
                type_parameters.push(id)
            }
            _ => {}
        }
        id
    }

    pub fn attribute(&mut self, class: DeclId, name: &str, is_static: bool, ty: Option<TypeExprId>) -> DeclId {
        let id = self.push_decl(name, Some(class), DeclKind::Attribute { is_static, ty });
        self.push_member(class, id);
        id
    }

    pub fn method(&mut self, class: DeclId, name: &str, is_static: bool) -> DeclId {
        let id = self.push_decl(
            name,
            Some(class),
            DeclKind::Function {
                is_static,
                type_parameters: Vec::new(),
                parameters: Vec::new(),
                results: Vec::new(),
            },
        );
        self.push_member(class, id);
        id
    }

    fn push_member(&mut self, class: DeclId, member: DeclId) {
        if let DeclKind::Class { members, .. } = &mut self.decl_mut(class).kind {
            members.push(member);
        }
    }

    /// Global function
    pub fn function(&mut self, name: &str) -> DeclId {
        self.push_decl(
            name,
            None,
            DeclKind::Function {
                is_static: false,
                type_parameters: Vec::new(),
                parameters: Vec::new(),
                results: Vec::new(),
            },
        )
    }

    pub fn enumeration(&mut self, name: &str) -> DeclId {
        self.push_decl(name, None, DeclKind::Enum { variants: Vec::new() })
    }

    pub fn variant(&mut self, enum_decl: DeclId, name: &str) -> DeclId {
        let id = self.push_decl(name, Some(enum_decl), DeclKind::EnumVariant { parameters: Vec::new() });
        if let DeclKind::Enum { variants } = &mut self.decl_mut(enum_decl).kind {
            variants.push(id);
        }
        id
    }

    pub fn segment(&mut self, name: &str) -> DeclId {
        self.push_decl(
            name,
            None,
            DeclKind::Segment {
                parameters: Vec::new(),
                results: Vec::new(),
                body: Vec::new(),
            },
        )
    }

    pub fn pipeline(&mut self, name: &str) -> DeclId {
        self.push_decl(name, None, DeclKind::Pipeline { body: Vec::new() })
    }

    pub fn annotation(&mut self, name: &str) -> DeclId {
        self.push_decl(name, None, DeclKind::Annotation { parameters: Vec::new() })
    }

    /// Parameter appended to a callable declaration's parameter list
    pub fn parameter(
        &mut self,
        callable: DeclId,
        name: &str,
        ty: Option<TypeExprId>,
        default_value: Option<ExprId>,
    ) -> DeclId {
        self.add_parameter(callable, name, false, ty, default_value)
    }

    pub fn constant_parameter(
        &mut self,
        callable: DeclId,
        name: &str,
        ty: Option<TypeExprId>,
        default_value: Option<ExprId>,
    ) -> DeclId {
        self.add_parameter(callable, name, true, ty, default_value)
    }

    fn add_parameter(
        &mut self,
        callable: DeclId,
        name: &str,
        is_constant: bool,
        ty: Option<TypeExprId>,
        default_value: Option<ExprId>,
    ) -> DeclId {
        let id = self.push_decl(
            name,
            Some(callable),
            DeclKind::Parameter {
                is_constant,
                ty,
                default_value,
            },
        );
        match &mut self.decl_mut(callable).kind {
            DeclKind::Class { parameters, .. } => parameters.get_or_insert_with(Vec::new).push(id),
            DeclKind::EnumVariant { parameters }
            | DeclKind::Function { parameters, .. }
            | DeclKind::Segment { parameters, .. }
            | DeclKind::Annotation { parameters } => parameters.push(id),
            _ => {}
        }
        id
    }

    /// Parameter of a lambda or callable type
    pub fn free_parameter(&mut self, name: &str, ty: Option<TypeExprId>, default_value: Option<ExprId>) -> DeclId {
        self.push_decl(
            name,
            None,
            DeclKind::Parameter {
                is_constant: false,
                ty,
                default_value,
            },
        )
    }

    /// Result appended to a function's or segment's result list
    pub fn result(&mut self, callable: DeclId, name: &str, ty: Option<TypeExprId>) -> DeclId {
        let id = self.push_decl(name, Some(callable), DeclKind::Result { ty });
        match &mut self.decl_mut(callable).kind {
            DeclKind::Function { results, .. } | DeclKind::Segment { results, .. } => results.push(id),
            _ => {}
        }
        id
    }

    /// Result of a callable type
    pub fn free_result(&mut self, name: &str, ty: Option<TypeExprId>) -> DeclId {
        self.push_decl(name, None, DeclKind::Result { ty })
    }

    pub fn placeholder(&mut self, name: &str) -> DeclId {
        self.push_decl(name, None, DeclKind::Placeholder { assignment: None })
    }

    pub fn block_lambda_result(&mut self, name: &str) -> DeclId {
        self.push_decl(name, None, DeclKind::BlockLambdaResult { assignment: None })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Assignment statement; links the declared placeholders and block lambda
    /// results back to it
    pub fn assignment(&mut self, assignees: Vec<Assignee>, expr: ExprId) -> StmtId {
        let declared: Vec<DeclId> = assignees
            .iter()
            .filter_map(|assignee| match assignee {
                Assignee::Placeholder(id) | Assignee::BlockLambdaResult(id) => Some(*id),
                _ => None,
            })
            .collect();
        let id = self.push_stmt(StmtKind::Assignment { assignees, expr });
        for decl in declared {
            match &mut self.decl_mut(decl).kind {
                DeclKind::Placeholder { assignment } | DeclKind::BlockLambdaResult { assignment } => {
                    *assignment = Some(id)
                }
                _ => {}
            }
        }
        id
    }

    pub fn expression_statement(&mut self, expr: ExprId) -> StmtId {
        self.push_stmt(StmtKind::Expression(expr))
    }

    /// Append a statement to a segment or pipeline body
    pub fn push_body(&mut self, owner: DeclId, stmt: StmtId) {
        match &mut self.decl_mut(owner).kind {
            DeclKind::Segment { body, .. } | DeclKind::Pipeline { body } => body.push(stmt),
            _ => {}
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.push_expr(ExprKind::Boolean(value))
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.push_expr(ExprKind::Float(value))
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.push_expr(ExprKind::Int(BigInt::from(value)))
    }

    pub fn big_int(&mut self, value: BigInt) -> ExprId {
        self.push_expr(ExprKind::Int(value))
    }

    pub fn null(&mut self) -> ExprId {
        self.push_expr(ExprKind::Null)
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.push_expr(ExprKind::String(value.to_string()))
    }

    pub fn template_fragment(&mut self, value: &str) -> ExprId {
        self.push_expr(ExprKind::TemplateFragment(value.to_string()))
    }

    pub fn template_string(&mut self, parts: Vec<ExprId>) -> ExprId {
        self.push_expr(ExprKind::TemplateString { parts })
    }

    pub fn block_lambda(&mut self, parameters: Vec<DeclId>, body: Vec<StmtId>) -> ExprId {
        self.push_expr(ExprKind::BlockLambda { parameters, body })
    }

    pub fn expression_lambda(&mut self, parameters: Vec<DeclId>, result: ExprId) -> ExprId {
        self.push_expr(ExprKind::ExpressionLambda { parameters, result })
    }

    /// Call with positional arguments
    pub fn call(&mut self, receiver: ExprId, arguments: Vec<ExprId>) -> ExprId {
        let arguments = arguments
            .into_iter()
            .map(|value| Argument { parameter: None, value })
            .collect();
        self.call_with(receiver, arguments, false)
    }

    pub fn call_with(&mut self, receiver: ExprId, arguments: Vec<Argument>, is_null_safe: bool) -> ExprId {
        let mut operands: Vec<ExprId> = arguments.iter().map(|argument| argument.value).collect();
        operands.push(receiver);
        self.push_composite_expr(
            ExprKind::Call {
                receiver,
                arguments,
                is_null_safe,
            },
            &operands,
        )
    }

    pub fn indexed_access(&mut self, receiver: ExprId, index: ExprId) -> ExprId {
        self.push_composite_expr(
            ExprKind::IndexedAccess {
                receiver,
                index,
                is_null_safe: false,
            },
            &[receiver, index],
        )
    }

    pub fn infix(&mut self, operator: InfixOperator, left: ExprId, right: ExprId) -> ExprId {
        self.push_composite_expr(ExprKind::Infix { operator, left, right }, &[left, right])
    }

    pub fn prefix(&mut self, operator: PrefixOperator, operand: ExprId) -> ExprId {
        self.push_composite_expr(ExprKind::Prefix { operator, operand }, &[operand])
    }

    pub fn list(&mut self, elements: Vec<ExprId>) -> ExprId {
        self.push_expr(ExprKind::List(elements))
    }

    pub fn map(&mut self, entries: Vec<(ExprId, ExprId)>) -> ExprId {
        let entries = entries
            .into_iter()
            .map(|(key, value)| MapEntry { key, value })
            .collect();
        self.push_expr(ExprKind::Map(entries))
    }

    pub fn member_access(&mut self, receiver: ExprId, member: Option<DeclId>) -> ExprId {
        self.push_composite_expr(
            ExprKind::MemberAccess {
                receiver,
                member,
                is_null_safe: false,
            },
            &[receiver],
        )
    }

    pub fn null_safe_member_access(&mut self, receiver: ExprId, member: Option<DeclId>) -> ExprId {
        self.push_composite_expr(
            ExprKind::MemberAccess {
                receiver,
                member,
                is_null_safe: true,
            },
            &[receiver],
        )
    }

    pub fn reference(&mut self, target: DeclId) -> ExprId {
        self.push_expr(ExprKind::Reference { target: Some(target) })
    }

    pub fn unresolved_reference(&mut self) -> ExprId {
        self.push_expr(ExprKind::Reference { target: None })
    }

    pub fn parenthesized(&mut self, expr: ExprId) -> ExprId {
        self.push_expr(ExprKind::Parenthesized(expr))
    }

    pub fn type_cast(&mut self, expr: ExprId, ty: TypeExprId) -> ExprId {
        self.push_expr(ExprKind::TypeCast { expr, ty })
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    /// Non-nullable named type without type arguments
    pub fn named(&mut self, target: DeclId) -> TypeExprId {
        self.named_type(target, Vec::new(), false)
    }

    pub fn nullable_named(&mut self, target: DeclId) -> TypeExprId {
        self.named_type(target, Vec::new(), true)
    }

    pub fn named_type(&mut self, target: DeclId, type_arguments: Vec<TypeExprId>, is_nullable: bool) -> TypeExprId {
        self.push_type_expr(TypeExprKind::Named {
            target: Some(target),
            type_arguments,
            is_nullable,
        })
    }

    pub fn unresolved_type(&mut self) -> TypeExprId {
        self.push_type_expr(TypeExprKind::Named {
            target: None,
            type_arguments: Vec::new(),
            is_nullable: false,
        })
    }

    pub fn callable_type(&mut self, parameters: Vec<DeclId>, results: Vec<DeclId>) -> TypeExprId {
        self.push_type_expr(TypeExprKind::Callable { parameters, results })
    }

    pub fn literal_type(&mut self, constants: Vec<ExprId>) -> TypeExprId {
        self.push_type_expr(TypeExprKind::Literal { constants })
    }

    pub fn union_type(&mut self, types: Vec<TypeExprId>) -> TypeExprId {
        self.push_type_expr(TypeExprKind::Union { types })
    }
}

fn is_top_level_kind(kind: &DeclKind) -> bool {
    matches!(
        kind,
        DeclKind::Class { .. }
            | DeclKind::Enum { .. }
            | DeclKind::Function { .. }
            | DeclKind::Segment { .. }
            | DeclKind::Pipeline { .. }
            | DeclKind::Annotation { .. }
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_are_unique_and_in_document() {
        let mut b = ModuleBuilder::new(7);
        let x = b.int(1);
        let y = b.int(2);
        let module = b.finish();
        assert_ne!(module.expr(x).span, module.expr(y).span);
        assert_eq!(module.expr(x).span.file_id, 7);
    }

    #[test]
    fn test_operator_spans_cover_operands() {
        let mut b = ModuleBuilder::new(0);
        let x = b.int(1);
        let y = b.int(2);
        let sum = b.infix(InfixOperator::Plus, x, y);
        let negated = b.prefix(PrefixOperator::Minus, sum);
        let module = b.finish();

        let span = module.expr(sum).span;
        assert_eq!(span.start, module.expr(x).span.start);
        assert!(span.end > module.expr(y).span.end);
        assert_eq!(module.expr(negated).span.start, span.start);
    }

    #[test]
    fn test_parameters_are_attached_to_callables() {
        let mut b = ModuleBuilder::new(0);
        let c = b.class("C", None);
        assert!(b.module_ref().parameters_of(c).is_empty());
        let p = b.parameter(c, "p", None, None);
        let f = b.function("f");
        let q = b.parameter(f, "q", None, None);
        let r = b.result(f, "r", None);
        let module = b.finish();

        assert_eq!(module.parameters_of(c), &[p]);
        assert_eq!(module.parameters_of(f), &[q]);
        assert_eq!(module.results_of(f), &[r]);
        assert_eq!(module.decl(p).parent, Some(c));
    }

    #[test]
    fn test_class_parent_creates_type_expression() {
        let mut b = ModuleBuilder::new(0);
        let a = b.class("A", None);
        let c = b.class("C", Some(a));
        let module = b.finish();

        let DeclKind::Class { parents, .. } = &module.decl(c).kind else {
            panic!("Expected class");
        };
        assert_eq!(parents.len(), 1);
        assert!(matches!(
            module.type_expr(parents[0]).kind,
            TypeExprKind::Named { target: Some(t), .. } if t == a
        ));
    }

    #[test]
    fn test_only_top_level_declarations_are_listed() {
        let mut b = ModuleBuilder::new(0);
        let c = b.class("C", None);
        let _a = b.attribute(c, "a", false, None);
        let e = b.enumeration("E");
        let _v = b.variant(e, "V");
        let module = b.finish();
        assert_eq!(module.top_level(), &[c, e]);
    }
}
