//! Partial evaluator
//!
//! Folds expressions into [`EvaluatedNode`]s as far as their inputs are
//! known. Evaluation is memoized per node for the substitution-free case.
//! Evaluations under parameter substitutions (inside an inlined call) are
//! never cached, because their result depends on the call site.
//!
//! Operands are always evaluated eagerly, including both sides of `and`,
//! `or` and `?:`.

use std::cmp::Ordering;

use conduit_ast::{
    Argument, DeclId, DeclKind, ExprId, ExprKind, InfixOperator, Module, NodeKey, PrefixOperator, StmtId,
};
use num_traits::ToPrimitive;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::analysis::Analysis;
use crate::cache::NodePath;
use crate::constant::Constant;
use crate::evaluated::{
    EvaluatedEnumVariant, EvaluatedMap, EvaluatedMapEntry, EvaluatedNamedTuple, EvaluatedNode, NamedEntry,
    ParameterSubstitutions,
};

/// Bookkeeping of evaluations that are currently running
#[derive(Debug, Default)]
pub(crate) struct EvaluationState {
    /// Callables that are being called through, innermost last
    call_stack: Vec<NodeKey>,
    /// Nodes that are being evaluated under substitutions
    substituted: FxHashSet<NodePath>,
    /// Lowest call stack index that made a call guard give up since the
    /// innermost memoized evaluation started
    guard_floor: Option<usize>,
}

fn lowest(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    a.into_iter().chain(b).min()
}

#[derive(Clone, Copy)]
pub struct PartialEvaluator<'a> {
    analysis: &'a Analysis<'a>,
    module: &'a Module,
}

impl<'a> PartialEvaluator<'a> {
    pub fn new(analysis: &'a Analysis<'a>) -> Self {
        Self {
            analysis,
            module: analysis.module(),
        }
    }

    pub fn evaluate(&self, node: impl Into<NodeKey>) -> EvaluatedNode {
        self.evaluate_with(node, &ParameterSubstitutions::default())
    }

    /// Evaluate `node` with parameters bound to the given values
    pub fn evaluate_with(&self, node: impl Into<NodeKey>, substitutions: &ParameterSubstitutions) -> EvaluatedNode {
        self.evaluate_raw(node.into(), substitutions).unwrap()
    }

    /// Like `evaluate_with`, but single-entry tuples are kept as they are
    fn evaluate_raw(&self, node: NodeKey, substitutions: &ParameterSubstitutions) -> EvaluatedNode {
        let path = self.analysis.path_of(node);
        let cached = self.cached(node, path);
        if cached.is_fully_evaluated() || substitutions.is_empty() {
            return cached;
        }

        if !self.analysis.evaluation_state.borrow_mut().substituted.insert(path) {
            trace!(%node, "re-entrant substituted evaluation");
            return EvaluatedNode::Unknown;
        }
        let result = self.evaluate_node(node, substitutions);
        self.analysis.evaluation_state.borrow_mut().substituted.remove(&path);
        result
    }

    fn cached(&self, node: NodeKey, path: NodePath) -> EvaluatedNode {
        let cached = self.analysis.cache.borrow().cached_evaluation(&path).cloned();
        if let Some(value) = cached {
            return value;
        }

        if !self.analysis.cache.borrow_mut().begin_evaluation(path) {
            trace!(%node, "evaluation cycle");
            return EvaluatedNode::Unknown;
        }
        let (base, outer_floor) = {
            let mut state = self.analysis.evaluation_state.borrow_mut();
            (state.call_stack.len(), state.guard_floor.take())
        };
        let value = self.evaluate_node(node, &ParameterSubstitutions::default());
        let floor = {
            let mut state = self.analysis.evaluation_state.borrow_mut();
            let floor = state.guard_floor;
            state.guard_floor = lowest(outer_floor, floor);
            floor
        };

        // A call guard tripped by a frame of the caller depends on the call
        // site, so the value only holds for this evaluation.
        if floor.is_some_and(|floor| floor < base) {
            trace!(%node, "not memoizing call-site dependent evaluation");
            self.analysis.cache.borrow_mut().abandon_evaluation(path);
        } else {
            self.analysis.cache.borrow_mut().finish_evaluation(path, value.clone());
        }
        value
    }

    fn evaluate_node(&self, node: NodeKey, substitutions: &ParameterSubstitutions) -> EvaluatedNode {
        match node {
            NodeKey::Decl(decl) => self.evaluate_declaration(decl),
            NodeKey::Expr(expr) => self.evaluate_expression(expr, substitutions),
            NodeKey::TypeExpr(_) => EvaluatedNode::Unknown,
        }
    }

    fn evaluate_declaration(&self, decl: DeclId) -> EvaluatedNode {
        match &self.module.decl(decl).kind {
            DeclKind::Class { .. } | DeclKind::Function { .. } | DeclKind::Segment { .. } | DeclKind::Annotation { .. } => {
                EvaluatedNode::NamedCallable {
                    declaration: decl,
                    name: self.module.decl(decl).name.name.clone(),
                }
            }
            DeclKind::EnumVariant { .. } => self.referenced_variant(decl),
            _ => EvaluatedNode::Unknown,
        }
    }

    fn referenced_variant(&self, variant: DeclId) -> EvaluatedNode {
        EvaluatedNode::EnumVariant(EvaluatedEnumVariant {
            variant,
            name: self.module.decl(variant).name.name.clone(),
            takes_parameters: !self.module.parameters_of(variant).is_empty(),
            args: None,
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn evaluate_expression(&self, expr: ExprId, substitutions: &ParameterSubstitutions) -> EvaluatedNode {
        match &self.module.expr(expr).kind {
            ExprKind::Boolean(value) => Constant::Boolean(*value).into(),
            ExprKind::Float(value) => Constant::Float(*value).into(),
            ExprKind::Int(value) => Constant::Int(value.clone()).into(),
            ExprKind::Null => Constant::Null.into(),
            ExprKind::String(value) | ExprKind::TemplateFragment(value) => Constant::String(value.clone()).into(),
            ExprKind::TemplateString { parts } => self.evaluate_template_string(parts, substitutions),
            ExprKind::BlockLambda { .. } => EvaluatedNode::BlockLambdaClosure {
                lambda: expr,
                substitutions_on_creation: substitutions.clone(),
                results: self.module.block_lambda_results(expr),
            },
            ExprKind::ExpressionLambda { result, .. } => EvaluatedNode::ExpressionLambdaClosure {
                lambda: expr,
                substitutions_on_creation: substitutions.clone(),
                result: *result,
            },
            ExprKind::Call {
                receiver,
                arguments,
                is_null_safe,
            } => self.evaluate_call(*receiver, arguments, *is_null_safe, substitutions),
            ExprKind::IndexedAccess {
                receiver,
                index,
                is_null_safe,
            } => self.evaluate_indexed_access(*receiver, *index, *is_null_safe, substitutions),
            ExprKind::Infix { operator, left, right } => {
                let left = self.evaluate_with(*left, substitutions);
                let right = self.evaluate_with(*right, substitutions);
                evaluate_infix(*operator, left, right)
            }
            ExprKind::Prefix { operator, operand } => {
                let operand = self.evaluate_with(*operand, substitutions);
                evaluate_prefix(*operator, operand)
            }
            ExprKind::List(elements) => EvaluatedNode::List(
                elements
                    .iter()
                    .map(|element| self.evaluate_with(*element, substitutions))
                    .collect(),
            ),
            ExprKind::Map(entries) => EvaluatedNode::Map(EvaluatedMap::new(
                entries
                    .iter()
                    .map(|entry| EvaluatedMapEntry {
                        key: self.evaluate_with(entry.key, substitutions),
                        value: self.evaluate_with(entry.value, substitutions),
                    })
                    .collect(),
            )),
            ExprKind::MemberAccess {
                receiver,
                member,
                is_null_safe,
            } => self.evaluate_member_access(*receiver, *member, *is_null_safe, substitutions),
            ExprKind::Reference { target } => match target {
                Some(target) => self.evaluate_reference(*target, substitutions),
                None => EvaluatedNode::Unknown,
            },
            ExprKind::Parenthesized(inner) => self.evaluate_with(*inner, substitutions),
            ExprKind::TypeCast { expr, .. } => self.evaluate_with(*expr, substitutions),
        }
    }

    fn evaluate_template_string(&self, parts: &[ExprId], substitutions: &ParameterSubstitutions) -> EvaluatedNode {
        let parts: Vec<EvaluatedNode> = parts
            .iter()
            .map(|part| self.evaluate_with(*part, substitutions))
            .collect();

        let mut text = String::new();
        for part in &parts {
            match part.constant() {
                Some(constant) => text.push_str(&constant.to_interpolation_string()),
                None => return EvaluatedNode::Unknown,
            }
        }
        Constant::String(text).into()
    }

    fn evaluate_indexed_access(
        &self,
        receiver: ExprId,
        index: ExprId,
        is_null_safe: bool,
        substitutions: &ParameterSubstitutions,
    ) -> EvaluatedNode {
        let receiver = self.evaluate_with(receiver, substitutions);
        let index = self.evaluate_with(index, substitutions);
        if is_null_safe && receiver == EvaluatedNode::Constant(Constant::Null) {
            return Constant::Null.into();
        }

        match receiver {
            EvaluatedNode::List(elements) => match index {
                EvaluatedNode::Constant(Constant::Int(index)) => index
                    .to_usize()
                    .and_then(|index| elements.get(index).cloned())
                    .unwrap_or(EvaluatedNode::Unknown),
                _ => EvaluatedNode::Unknown,
            },
            EvaluatedNode::Map(map) if index.is_fully_evaluated() => map.get_last_value_for_key(&index),
            _ => EvaluatedNode::Unknown,
        }
    }

    fn evaluate_member_access(
        &self,
        receiver: ExprId,
        member: Option<DeclId>,
        is_null_safe: bool,
        substitutions: &ParameterSubstitutions,
    ) -> EvaluatedNode {
        let Some(member) = member else {
            return EvaluatedNode::Unknown;
        };
        if let DeclKind::EnumVariant { .. } = self.module.decl(member).kind {
            return self.referenced_variant(member);
        }

        let receiver = self.evaluate_raw(NodeKey::Expr(receiver), substitutions);
        if is_null_safe && receiver == EvaluatedNode::Constant(Constant::Null) {
            return Constant::Null.into();
        }

        match (&self.module.decl(member).kind, receiver) {
            (DeclKind::Result { .. } | DeclKind::BlockLambdaResult { .. }, EvaluatedNode::NamedTuple(tuple)) => {
                tuple.get(member)
            }
            _ => EvaluatedNode::Unknown,
        }
    }

    fn evaluate_reference(&self, target: DeclId, substitutions: &ParameterSubstitutions) -> EvaluatedNode {
        match &self.module.decl(target).kind {
            DeclKind::Class { .. } | DeclKind::Function { .. } | DeclKind::Segment { .. } | DeclKind::Annotation { .. } => {
                self.evaluate_declaration(target)
            }
            DeclKind::EnumVariant { .. } => self.referenced_variant(target),
            DeclKind::Placeholder { assignment } | DeclKind::BlockLambdaResult { assignment } => match assignment {
                Some(assignment) => self.evaluate_assigned_value(*assignment, target, substitutions),
                None => EvaluatedNode::Unknown,
            },
            // Defaults are bound when a call is evaluated, never here.
            DeclKind::Parameter { .. } => substitutions
                .get(&target)
                .cloned()
                .unwrap_or(EvaluatedNode::Unknown),
            DeclKind::Enum { .. }
            | DeclKind::Attribute { .. }
            | DeclKind::Pipeline { .. }
            | DeclKind::Result { .. }
            | DeclKind::TypeParameter { .. } => EvaluatedNode::Unknown,
        }
    }

    /// Value an assignment binds to one of its assignees
    fn evaluate_assigned_value(
        &self,
        assignment: StmtId,
        assignee: DeclId,
        substitutions: &ParameterSubstitutions,
    ) -> EvaluatedNode {
        let Some((expr, index)) = self.module.assigned_value(assignment, assignee) else {
            return EvaluatedNode::Unknown;
        };
        let value = self.evaluate_raw(NodeKey::Expr(expr), substitutions);
        project(value, index).unwrap()
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn evaluate_call(
        &self,
        receiver: ExprId,
        arguments: &[Argument],
        is_null_safe: bool,
        substitutions: &ParameterSubstitutions,
    ) -> EvaluatedNode {
        let callee = self.evaluate_with(receiver, substitutions);
        if is_null_safe && callee == EvaluatedNode::Constant(Constant::Null) {
            return Constant::Null.into();
        }

        match callee {
            EvaluatedNode::EnumVariant(variant) => self.instantiate_variant(variant, arguments, substitutions),
            EvaluatedNode::BlockLambdaClosure {
                lambda,
                substitutions_on_creation,
                results,
            } => {
                let parameters = self.lambda_parameters(lambda);
                let bound = self.bind_arguments(parameters, arguments, substitutions, &substitutions_on_creation);
                self.call_through(NodeKey::Expr(lambda), |this| {
                    let entries = results
                        .iter()
                        .map(|result| {
                            let value = match self.module.assignment_of(*result) {
                                Some(assignment) => this.evaluate_assigned_value(assignment, *result, &bound),
                                None => EvaluatedNode::Unknown,
                            };
                            self.named_entry(*result, value)
                        })
                        .collect();
                    EvaluatedNode::NamedTuple(EvaluatedNamedTuple::new(entries))
                })
            }
            EvaluatedNode::ExpressionLambdaClosure {
                lambda,
                substitutions_on_creation,
                result,
            } => {
                let parameters = self.lambda_parameters(lambda);
                let bound = self.bind_arguments(parameters, arguments, substitutions, &substitutions_on_creation);
                self.call_through(NodeKey::Expr(lambda), |this| {
                    this.evaluate_with(result, &bound)
                })
            }
            EvaluatedNode::NamedCallable { declaration, .. }
                if matches!(self.module.decl(declaration).kind, DeclKind::Segment { .. }) =>
            {
                let parameters = self.module.parameters_of(declaration);
                let bound =
                    self.bind_arguments(parameters, arguments, substitutions, &ParameterSubstitutions::default());
                self.call_through(NodeKey::Decl(declaration), |this| {
                    let entries = self
                        .module
                        .results_of(declaration)
                        .iter()
                        .map(|result| {
                            let value = match self.module.yield_of(declaration, *result) {
                                Some(stmt) => this.evaluate_assigned_value(stmt, *result, &bound),
                                None => EvaluatedNode::Unknown,
                            };
                            self.named_entry(*result, value)
                        })
                        .collect();
                    EvaluatedNode::NamedTuple(EvaluatedNamedTuple::new(entries))
                })
            }
            _ => EvaluatedNode::Unknown,
        }
    }

    fn instantiate_variant(
        &self,
        variant: EvaluatedEnumVariant,
        arguments: &[Argument],
        substitutions: &ParameterSubstitutions,
    ) -> EvaluatedNode {
        if variant.args.is_some() {
            return EvaluatedNode::Unknown;
        }

        let parameters = self.module.parameters_of(variant.variant);
        let mut args: Vec<NamedEntry> = parameters
            .iter()
            .map(|parameter| {
                let value = match self.module.default_value_of(*parameter) {
                    Some(default) => self.evaluate(default),
                    None => EvaluatedNode::Unknown,
                };
                self.named_entry(*parameter, value)
            })
            .collect();

        for (index, argument) in arguments.iter().enumerate() {
            let parameter = argument.parameter.or_else(|| parameters.get(index).copied());
            if let Some(entry) = args.iter_mut().find(|entry| Some(entry.declaration) == parameter) {
                entry.value = self.evaluate_with(argument.value, substitutions);
            }
        }

        EvaluatedNode::EnumVariant(EvaluatedEnumVariant {
            args: Some(args),
            ..variant
        })
    }

    /// Run `body` as a call of `callable`, unless that would recurse into a
    /// callable that is already being called or exceed the depth limit.
    /// Arguments must already be bound in the caller's context.
    fn call_through(&self, callable: NodeKey, body: impl FnOnce(&Self) -> EvaluatedNode) -> EvaluatedNode {
        {
            let mut state = self.analysis.evaluation_state.borrow_mut();
            let depth = state.call_stack.len();
            let blocking = match state.call_stack.iter().position(|frame| *frame == callable) {
                Some(index) => Some(index),
                None if depth >= self.analysis.options().max_call_depth => Some(0),
                None => None,
            };
            if let Some(index) = blocking {
                trace!(%callable, depth, "not evaluating recursive call");
                state.guard_floor = lowest(state.guard_floor, Some(index));
                return EvaluatedNode::Unknown;
            }
            state.call_stack.push(callable);
            trace!(%callable, depth, "evaluating call");
        }

        let result = body(self);
        self.analysis.evaluation_state.borrow_mut().call_stack.pop();
        result
    }

    /// Substitutions for a call: the closure's bindings, overridden by the
    /// value of each parameter at this call site
    fn bind_arguments(
        &self,
        parameters: &[DeclId],
        arguments: &[Argument],
        caller_substitutions: &ParameterSubstitutions,
        closure_substitutions: &ParameterSubstitutions,
    ) -> ParameterSubstitutions {
        let mut bound = closure_substitutions.clone();
        for (index, parameter) in parameters.iter().enumerate() {
            let argument = arguments
                .iter()
                .enumerate()
                .find(|(position, argument)| match argument.parameter {
                    Some(target) => target == *parameter,
                    None => *position == index,
                })
                .map(|(_, argument)| argument);

            let value = match argument {
                Some(argument) => self.evaluate_with(argument.value, caller_substitutions),
                None => match self.module.default_value_of(*parameter) {
                    Some(default) => self.evaluate(default),
                    None => EvaluatedNode::Unknown,
                },
            };
            bound.insert(*parameter, value);
        }
        bound
    }

    fn lambda_parameters(&self, lambda: ExprId) -> &'a [DeclId] {
        match &self.module.expr(lambda).kind {
            ExprKind::BlockLambda { parameters, .. } | ExprKind::ExpressionLambda { parameters, .. } => parameters,
            _ => &[],
        }
    }

    fn named_entry(&self, declaration: DeclId, value: EvaluatedNode) -> NamedEntry {
        NamedEntry {
            declaration,
            name: self.module.decl(declaration).name.name.clone(),
            value,
        }
    }
}

/// Entry `index` of a tuple; any other value only has an entry 0
fn project(value: EvaluatedNode, index: usize) -> EvaluatedNode {
    match value {
        EvaluatedNode::NamedTuple(tuple) => tuple.get_by_index(index),
        other if index == 0 => other,
        _ => EvaluatedNode::Unknown,
    }
}

// =============================================================================
// Operators
// =============================================================================

fn evaluate_infix(operator: InfixOperator, left: EvaluatedNode, right: EvaluatedNode) -> EvaluatedNode {
    use InfixOperator::*;

    match operator {
        Or | And => match (left.constant(), right.constant()) {
            (Some(Constant::Boolean(l)), Some(Constant::Boolean(r))) => {
                Constant::Boolean(if operator == Or { *l || *r } else { *l && *r }).into()
            }
            _ => EvaluatedNode::Unknown,
        },
        Equals | IdenticalTo | NotEquals | NotIdenticalTo => {
            if !left.is_fully_evaluated() || !right.is_fully_evaluated() {
                return EvaluatedNode::Unknown;
            }
            let equal = left == right;
            Constant::Boolean(if matches!(operator, Equals | IdenticalTo) { equal } else { !equal }).into()
        }
        LessThan | LessThanOrEquals | GreaterThanOrEquals | GreaterThan => {
            let Some(ordering) = compare_numbers(&left, &right) else {
                return EvaluatedNode::Unknown;
            };
            let result = match operator {
                LessThan => ordering == Ordering::Less,
                LessThanOrEquals => ordering != Ordering::Greater,
                GreaterThanOrEquals => ordering != Ordering::Less,
                _ => ordering == Ordering::Greater,
            };
            Constant::Boolean(result).into()
        }
        Plus | Minus | Times | DividedBy => evaluate_arithmetic(operator, &left, &right),
        Elvis => {
            if left == EvaluatedNode::Constant(Constant::Null) {
                right
            } else {
                left
            }
        }
    }
}

fn compare_numbers(left: &EvaluatedNode, right: &EvaluatedNode) -> Option<Ordering> {
    match (left.constant()?, right.constant()?) {
        (Constant::Int(l), Constant::Int(r)) => Some(l.cmp(r)),
        (l, r) if l.is_numeric() && r.is_numeric() => l.as_f64()?.partial_cmp(&r.as_f64()?),
        _ => None,
    }
}

fn evaluate_arithmetic(operator: InfixOperator, left: &EvaluatedNode, right: &EvaluatedNode) -> EvaluatedNode {
    let (Some(l), Some(r)) = (left.constant(), right.constant()) else {
        return EvaluatedNode::Unknown;
    };
    if !l.is_numeric() || !r.is_numeric() {
        return EvaluatedNode::Unknown;
    }
    if operator == InfixOperator::DividedBy && r.is_zero() {
        return EvaluatedNode::Unknown;
    }

    if let (Constant::Int(l), Constant::Int(r)) = (l, r) {
        let value = match operator {
            InfixOperator::Plus => l + r,
            InfixOperator::Minus => l - r,
            InfixOperator::Times => l * r,
            _ => l / r,
        };
        return Constant::Int(value).into();
    }

    let (Some(l), Some(r)) = (l.as_f64(), r.as_f64()) else {
        return EvaluatedNode::Unknown;
    };
    let value = match operator {
        InfixOperator::Plus => l + r,
        InfixOperator::Minus => l - r,
        InfixOperator::Times => l * r,
        _ => l / r,
    };
    Constant::Float(value).into()
}

fn evaluate_prefix(operator: PrefixOperator, operand: EvaluatedNode) -> EvaluatedNode {
    match (operator, operand.constant()) {
        (PrefixOperator::Not, Some(Constant::Boolean(value))) => Constant::Boolean(!value).into(),
        (PrefixOperator::Minus, Some(Constant::Int(value))) => Constant::Int(-value).into(),
        (PrefixOperator::Minus, Some(Constant::Float(value))) => Constant::Float(-value).into(),
        _ => EvaluatedNode::Unknown,
    }
}

// =============================================================================
// Tests
// =============================================================================
