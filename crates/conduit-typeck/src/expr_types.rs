//! Type computer: types of expressions

use conduit_ast::{DeclId, DeclKind, ExprId, ExprKind, InfixOperator, NodeKey, PrefixOperator};

use crate::computer::TypeComputer;
use crate::evaluated::EvaluatedNode;
use crate::types::{CallableType, ClassType, NamedTupleEntry, NamedTupleType, Type};

impl<'a> TypeComputer<'a> {
    pub(crate) fn compute_expression_type(&self, expr: ExprId) -> Type {
        // Anything that folds to a constant has a literal type
        if let EvaluatedNode::Constant(constant) = self.analysis.evaluator().evaluate(expr) {
            return Type::literal([constant]);
        }

        match &self.module.expr(expr).kind {
            ExprKind::Boolean(_)
            | ExprKind::Float(_)
            | ExprKind::Int(_)
            | ExprKind::Null
            | ExprKind::String(_)
            | ExprKind::TemplateFragment(_) => Type::Unknown,
            ExprKind::TemplateString { .. } => self.builtin(self.builtins.string),
            ExprKind::BlockLambda { parameters, .. } => {
                let results = self.module.block_lambda_results(expr);
                self.callable_type(NodeKey::Expr(expr), parameters, &results)
            }
            ExprKind::ExpressionLambda { parameters, result } => Type::Callable(CallableType {
                callable: Some(NodeKey::Expr(expr)),
                inputs: self.named_tuple_of(parameters),
                outputs: NamedTupleType::new(vec![NamedTupleEntry {
                    declaration: None,
                    name: "result".to_string(),
                    ty: self.compute_type(*result),
                }]),
            }),
            ExprKind::Call {
                receiver, is_null_safe, ..
            } => self.compute_call_type(*receiver, *is_null_safe),
            ExprKind::IndexedAccess {
                receiver,
                is_null_safe,
                ..
            } => {
                let receiver = self.compute_type(*receiver);
                let element = self.element_type(&receiver.update_nullability(false));
                null_safe(element, &receiver, *is_null_safe)
            }
            ExprKind::Infix { operator, left, right } => self.compute_infix_type(*operator, *left, *right),
            ExprKind::Prefix { operator, operand } => match operator {
                PrefixOperator::Not => self.builtin(self.builtins.boolean),
                PrefixOperator::Minus => self.numeric_type(&[self.compute_type(*operand)]),
            },
            ExprKind::List(elements) => {
                let element = self.lowest_common_supertype(
                    &elements.iter().map(|element| self.compute_type(*element)).collect::<Vec<_>>(),
                );
                self.collection_type(self.builtins.list, vec![element])
            }
            ExprKind::Map(entries) => {
                let keys: Vec<Type> = entries.iter().map(|entry| self.compute_type(entry.key)).collect();
                let values: Vec<Type> = entries.iter().map(|entry| self.compute_type(entry.value)).collect();
                self.collection_type(
                    self.builtins.map,
                    vec![self.lowest_common_supertype(&keys), self.lowest_common_supertype(&values)],
                )
            }
            ExprKind::MemberAccess {
                receiver,
                member,
                is_null_safe,
            } => {
                let receiver = self.compute_type(*receiver);
                let member_type = match member {
                    Some(member) => self.compute_member_type(&receiver, *member),
                    None => Type::Unknown,
                };
                null_safe(member_type, &receiver, *is_null_safe)
            }
            ExprKind::Reference { target } => match target {
                Some(target) => self.compute_reference_type(*target),
                None => Type::Unknown,
            },
            ExprKind::Parenthesized(inner) => self.compute_type(*inner),
            ExprKind::TypeCast { ty, .. } => self.compute_type(*ty),
        }
    }

    fn builtin(&self, class: DeclId) -> Type {
        self.builtins.class_type(self.module, class, false)
    }

    fn collection_type(&self, class: DeclId, type_arguments: Vec<Type>) -> Type {
        let substitutions = self
            .module
            .type_parameters_of(class)
            .iter()
            .copied()
            .zip(type_arguments)
            .collect();
        Type::Class(ClassType::new(self.module, class, substitutions, false))
    }

    /// Type of a reference used as a value
    fn compute_reference_type(&self, target: DeclId) -> Type {
        match self.module.decl(target).kind {
            DeclKind::Class { .. } | DeclKind::Enum { .. } => self.static_type(self.compute_type(target)),
            DeclKind::EnumVariant { .. } if !self.module.parameters_of(target).is_empty() => {
                self.static_type(self.compute_type(target))
            }
            _ => self.compute_type(target),
        }
    }

    fn compute_member_type(&self, receiver: &Type, member: DeclId) -> Type {
        if let Type::NamedTuple(tuple) = receiver {
            if let Some(entry) = tuple.entries.iter().find(|entry| entry.declaration == Some(member)) {
                return entry.ty.clone();
            }
        }

        let ty = self.compute_reference_type(member);
        let Some(owner) = self.module.containing_class(member) else {
            return ty;
        };
        let Type::Class(receiver) = receiver.update_nullability(false) else {
            return ty;
        };
        match self.instance_of(&receiver, owner) {
            Some(instance) => ty.substitute(&instance.substitutions),
            None => ty,
        }
    }

    fn compute_call_type(&self, receiver: ExprId, is_null_safe: bool) -> Type {
        let receiver = self.compute_type(receiver);
        let result = match receiver.update_nullability(false).unwrap() {
            Type::Callable(callable) => Type::NamedTuple(callable.outputs),
            Type::Static(static_type) => match *static_type.instance_type {
                Type::Class(class) if matches!(
                    self.module.decl(class.declaration).kind,
                    DeclKind::Class { parameters: Some(_), .. }
                ) =>
                {
                    Type::Class(class)
                }
                Type::EnumVariant(variant) => Type::EnumVariant(variant),
                _ => Type::Unknown,
            },
            _ => Type::Unknown,
        };
        null_safe(result, &receiver, is_null_safe)
    }

    fn compute_infix_type(&self, operator: InfixOperator, left: ExprId, right: ExprId) -> Type {
        use InfixOperator::*;

        match operator {
            Or | And | Equals | NotEquals | IdenticalTo | NotIdenticalTo | LessThan | LessThanOrEquals
            | GreaterThanOrEquals | GreaterThan => self.builtin(self.builtins.boolean),
            Plus | Minus | Times | DividedBy => {
                self.numeric_type(&[self.compute_type(left), self.compute_type(right)])
            }
            Elvis => {
                let left = self.compute_type(left);
                if !left.is_nullable() {
                    return left;
                }
                let right = self.compute_type(right);
                self.lowest_common_supertype(&[left.update_nullability(false), right])
            }
        }
    }

    /// `Int` if every operand is an `Int`, `Float` otherwise
    fn numeric_type(&self, operands: &[Type]) -> Type {
        let int = self.builtin(self.builtins.int);
        let checker = self.analysis.type_checker();
        if operands.iter().all(|operand| checker.is_assignable_to(operand, &int)) {
            int
        } else {
            self.builtin(self.builtins.float)
        }
    }

    /// Element type of a list, value type of a map
    fn element_type(&self, receiver: &Type) -> Type {
        let Type::Class(receiver) = receiver else {
            return Type::Unknown;
        };
        for (collection, position) in [(self.builtins.list, 0), (self.builtins.map, 1)] {
            if let Some(instance) = self.instance_of(receiver, collection) {
                return self
                    .module
                    .type_parameters_of(collection)
                    .get(position)
                    .and_then(|parameter| instance.substitutions.get(*parameter).cloned())
                    .unwrap_or(Type::Unknown);
            }
        }
        Type::Unknown
    }

    /// The instantiation of `class` in the supertype chain of `ty`, `ty` included
    pub(crate) fn instance_of(&self, ty: &ClassType, class: DeclId) -> Option<ClassType> {
        if ty.declaration == class {
            return Some(ty.clone());
        }
        self.stream_supertypes(ty)
            .into_iter()
            .find(|supertype| supertype.declaration == class)
    }
}

/// Make `ty` nullable if it is reached through `?.` on a nullable receiver
fn null_safe(ty: Type, receiver: &Type, is_null_safe: bool) -> Type {
    if is_null_safe && receiver.is_nullable() {
        ty.update_nullability(true)
    } else {
        ty
    }
}
