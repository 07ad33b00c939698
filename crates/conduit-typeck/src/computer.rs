//! Type computer: types of declarations and type expressions
//!
//! The expression half lives in `expr_types.rs`, supertypes and the lowest
//! common supertype in `supertype.rs`.

use conduit_ast::{DeclId, DeclKind, Module, NodeKey, TypeExprId, TypeExprKind};
use tracing::trace;

use crate::analysis::Analysis;
use crate::builtins::Builtins;
use crate::constant::Constant;
use crate::evaluated::EvaluatedNode;
use crate::types::{
    CallableType, ClassType, EnumType, EnumVariantType, NamedTupleEntry, NamedTupleType, StaticType, Type,
    TypeParameterSubstitutions, TypeParameterType,
};

/// Computes the type of AST nodes bottom-up from declared types and
/// evaluated constants
#[derive(Clone, Copy)]
pub struct TypeComputer<'a> {
    pub(crate) analysis: &'a Analysis<'a>,
    pub(crate) module: &'a Module,
    pub(crate) builtins: &'a Builtins,
}

impl<'a> TypeComputer<'a> {
    pub fn new(analysis: &'a Analysis<'a>) -> Self {
        Self {
            analysis,
            module: analysis.module(),
            builtins: analysis.builtins(),
        }
    }

    /// Type of a declaration, expression or type expression. Nodes whose type
    /// depends on themselves get `Unknown`.
    pub fn compute_type(&self, node: impl Into<NodeKey>) -> Type {
        let node = node.into();
        let path = self.analysis.path_of(node);

        let cached = self.analysis.cache.borrow().cached_type(&path).cloned();
        if let Some(ty) = cached {
            return ty;
        }
        if !self.analysis.cache.borrow_mut().begin_type(path) {
            trace!(%node, "type computation cycle");
            return Type::Unknown;
        }

        let ty = match node {
            NodeKey::Decl(decl) => self.compute_declaration_type(decl),
            NodeKey::Expr(expr) => self.compute_expression_type(expr),
            NodeKey::TypeExpr(type_expr) => self.compute_type_expression_type(type_expr),
        }
        .unwrap();

        self.analysis.cache.borrow_mut().finish_type(path, ty.clone());
        ty
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn compute_declaration_type(&self, decl: DeclId) -> Type {
        match &self.module.decl(decl).kind {
            DeclKind::Class { type_parameters, .. } => {
                let substitutions = type_parameters
                    .iter()
                    .map(|parameter| {
                        let ty = TypeParameterType::new(self.module, *parameter, false);
                        (*parameter, Type::TypeParameter(ty))
                    })
                    .collect();
                Type::Class(ClassType::new(self.module, decl, substitutions, false))
            }
            DeclKind::Enum { .. } => Type::Enum(EnumType::new(self.module, decl, false)),
            DeclKind::EnumVariant { .. } => Type::EnumVariant(EnumVariantType::new(self.module, decl, false)),
            DeclKind::Attribute { ty, .. } | DeclKind::Parameter { ty, .. } | DeclKind::Result { ty } => match ty {
                Some(ty) => self.compute_type(*ty),
                None => Type::Unknown,
            },
            DeclKind::Function {
                parameters, results, ..
            }
            | DeclKind::Segment {
                parameters, results, ..
            } => self.callable_type(NodeKey::Decl(decl), parameters, results),
            DeclKind::Annotation { parameters } => self.callable_type(NodeKey::Decl(decl), parameters, &[]),
            DeclKind::TypeParameter { .. } => Type::TypeParameter(TypeParameterType::new(self.module, decl, false)),
            DeclKind::Placeholder { assignment } | DeclKind::BlockLambdaResult { assignment } => match assignment {
                Some(assignment) => match self.module.assigned_value(*assignment, decl) {
                    Some((expr, index)) => project(self.compute_type(expr), index),
                    None => Type::Unknown,
                },
                None => Type::Unknown,
            },
            DeclKind::Pipeline { .. } => Type::Unknown,
        }
    }

    /// Callable type with one input per parameter and one output per result
    pub(crate) fn callable_type(&self, callable: NodeKey, parameters: &[DeclId], results: &[DeclId]) -> Type {
        Type::Callable(CallableType {
            callable: Some(callable),
            inputs: self.named_tuple_of(parameters),
            outputs: self.named_tuple_of(results),
        })
    }

    pub(crate) fn named_tuple_of(&self, declarations: &[DeclId]) -> NamedTupleType {
        NamedTupleType::new(
            declarations
                .iter()
                .map(|declaration| NamedTupleEntry {
                    declaration: Some(*declaration),
                    name: self.module.decl(*declaration).name.name.clone(),
                    ty: self.compute_type(*declaration),
                })
                .collect(),
        )
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    fn compute_type_expression_type(&self, type_expr: TypeExprId) -> Type {
        match &self.module.type_expr(type_expr).kind {
            TypeExprKind::Named {
                target,
                type_arguments,
                is_nullable,
            } => {
                let Some(target) = target else {
                    return Type::Unknown;
                };
                match self.module.decl(*target).kind {
                    DeclKind::Class { .. } => {
                        let substitutions: TypeParameterSubstitutions = self
                            .module
                            .type_parameters_of(*target)
                            .iter()
                            .enumerate()
                            .map(|(index, parameter)| {
                                let ty = match type_arguments.get(index) {
                                    Some(argument) => self.compute_type(*argument),
                                    None => Type::Unknown,
                                };
                                (*parameter, ty)
                            })
                            .collect();
                        Type::Class(ClassType::new(self.module, *target, substitutions, *is_nullable))
                    }
                    DeclKind::Enum { .. } => Type::Enum(EnumType::new(self.module, *target, *is_nullable)),
                    DeclKind::EnumVariant { .. } => {
                        Type::EnumVariant(EnumVariantType::new(self.module, *target, *is_nullable))
                    }
                    DeclKind::TypeParameter { .. } => {
                        Type::TypeParameter(TypeParameterType::new(self.module, *target, *is_nullable))
                    }
                    _ => Type::Unknown,
                }
            }
            TypeExprKind::Callable { parameters, results } => {
                self.callable_type(NodeKey::TypeExpr(type_expr), parameters, results)
            }
            TypeExprKind::Literal { constants } => {
                let evaluator = self.analysis.evaluator();
                let mut values = Vec::with_capacity(constants.len());
                for constant in constants {
                    match evaluator.evaluate(*constant) {
                        EvaluatedNode::Constant(value) => values.push(value),
                        _ => return Type::Unknown,
                    }
                }
                Type::literal(values)
            }
            TypeExprKind::Union { types } => Type::union(types.iter().map(|ty| self.compute_type(*ty))),
        }
    }

    /// Type of a constant value, as a builtin class
    pub fn class_type_of_constant(&self, constant: &Constant) -> Type {
        self.builtins.class_type_for_constant(self.module, constant)
    }

    /// The type of a class used as a value
    pub(crate) fn static_type(&self, instance_type: Type) -> Type {
        Type::Static(StaticType {
            instance_type: Box::new(instance_type),
        })
    }
}

/// Entry `index` of a tuple type; any other type only has an entry 0
pub(crate) fn project(ty: Type, index: usize) -> Type {
    match ty {
        Type::NamedTuple(tuple) => tuple.get_type_of_entry(index),
        other if index == 0 => other,
        _ => Type::Unknown,
    }
}
