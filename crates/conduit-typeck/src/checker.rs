//! Type checker: assignability between types

use conduit_ast::{DeclId, DeclKind, Module, NodeKey, Variance};
use tracing::trace;

use crate::analysis::Analysis;
use crate::builtins::Builtins;
use crate::class_hierarchy::ClassHierarchy;
use crate::computer::TypeComputer;
use crate::constant::Constant;
use crate::diagnostic::Diagnostic;
use crate::error::AssignabilityError;
use crate::types::{
    CallableType, ClassType, EnumType, EnumVariantType, LiteralType, NamedTupleEntry, NamedTupleType, StaticType, Type,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignabilityOptions {
    /// Only compare the classes of class types, not their type arguments
    pub ignore_type_parameters: bool,
}

/// Answers whether a value of one type may be used where another is expected
#[derive(Clone, Copy)]
pub struct TypeChecker<'a> {
    analysis: &'a Analysis<'a>,
    module: &'a Module,
    builtins: &'a Builtins,
}

impl<'a> TypeChecker<'a> {
    pub fn new(analysis: &'a Analysis<'a>) -> Self {
        Self {
            analysis,
            module: analysis.module(),
            builtins: analysis.builtins(),
        }
    }

    fn hierarchy(&self) -> ClassHierarchy<'a> {
        ClassHierarchy::new(self.module, self.builtins)
    }

    fn computer(&self) -> TypeComputer<'a> {
        TypeComputer::new(self.analysis)
    }

    pub fn is_assignable_to(&self, ty: &Type, other: &Type) -> bool {
        self.is_assignable_to_with(ty, other, AssignabilityOptions::default())
    }

    pub fn is_assignable_to_with(&self, ty: &Type, other: &Type, options: AssignabilityOptions) -> bool {
        let result = self.check(ty, other, options);
        trace!(%ty, %other, result, "assignability");
        result
    }

    /// Like `is_assignable_to`, reporting a mismatch as an error
    pub fn check_assignable(&self, found: &Type, expected: &Type) -> Result<(), AssignabilityError> {
        if self.is_assignable_to(found, expected) {
            Ok(())
        } else {
            Err(AssignabilityError {
                expected: expected.clone(),
                found: found.clone(),
            })
        }
    }

    /// Check the computed type of `node` against `expected`, locating a
    /// mismatch at the node
    pub fn check_node(&self, node: impl Into<NodeKey>, expected: &Type) -> Result<(), Diagnostic> {
        let node = node.into();
        let found = self.computer().compute_type(node);
        self.check_assignable(&found, expected)
            .map_err(|error| Diagnostic::type_mismatch(&error, self.module.span_of(node)))
    }

    fn check(&self, ty: &Type, other: &Type, options: AssignabilityOptions) -> bool {
        if ty.is_unknown() || other.is_unknown() {
            return false;
        }
        if matches!(ty, Type::TypeParameter(_)) || matches!(other, Type::TypeParameter(_)) {
            return true;
        }
        if let Type::Class(class) = ty {
            if class.declaration == self.builtins.nothing {
                return !class.is_nullable || other.is_nullable();
            }
        }
        if let Type::Union(union) = ty {
            return union.types().iter().all(|member| self.check(member, other, options));
        }

        if let Type::Literal(literal) = ty {
            let constants = literal.constants();
            if constants.is_empty() {
                return true;
            }
            if constants == [Constant::Null] {
                return other.is_nullable();
            }
            // Each constant may be accepted by a different member
            if constants.len() > 1 && matches!(other, Type::Union(_)) {
                return constants
                    .iter()
                    .all(|constant| self.check(&Type::literal([constant.clone()]), other, options));
            }
        }

        if let Type::Union(union) = other {
            return union.types().iter().any(|member| self.check(ty, member, options));
        }

        match ty {
            Type::Callable(callable) => self.callable_is_assignable_to(callable, other, options),
            Type::Class(class) => self.class_is_assignable_to(class, other, options),
            Type::Enum(enum_type) => self.enum_is_assignable_to(enum_type, other),
            Type::EnumVariant(variant) => self.variant_is_assignable_to(variant, other),
            Type::Literal(literal) => self.literal_is_assignable_to(literal, other, options),
            Type::NamedTuple(tuple) => self.named_tuple_is_assignable_to(tuple, other, options),
            Type::Static(static_type) => self.static_is_assignable_to(static_type, other, options),
            Type::Unknown | Type::TypeParameter(_) | Type::Union(_) => false,
        }
    }

    fn is_any(&self, class: &ClassType) -> bool {
        class.declaration == self.builtins.any
    }

    fn callable_is_assignable_to(&self, ty: &CallableType, other: &Type, options: AssignabilityOptions) -> bool {
        let other = match other {
            Type::Class(class) => return self.is_any(class),
            Type::Callable(callable) => callable,
            _ => return false,
        };

        if ty.inputs.len() < other.inputs.len() || ty.outputs.len() < other.outputs.len() {
            return false;
        }

        for (index, other_parameter) in other.inputs.entries.iter().enumerate() {
            let parameter = &ty.inputs.entries[index];
            if parameter.name != other_parameter.name {
                return false;
            }
            if self.is_optional(parameter) && !self.is_optional(other_parameter) {
                return false;
            }
            // Contravariant
            if !self.check(&other_parameter.ty, &parameter.ty, options) {
                return false;
            }
        }

        if !ty.inputs.entries[other.inputs.len()..]
            .iter()
            .all(|parameter| self.is_optional(parameter))
        {
            return false;
        }

        other
            .outputs
            .entries
            .iter()
            .zip(&ty.outputs.entries)
            .all(|(other_result, result)| self.check(&result.ty, &other_result.ty, options))
    }

    fn is_optional(&self, entry: &NamedTupleEntry) -> bool {
        entry
            .declaration
            .is_some_and(|declaration| self.module.is_optional_parameter(declaration))
    }

    fn class_is_assignable_to(&self, ty: &ClassType, other: &Type, options: AssignabilityOptions) -> bool {
        if ty.is_nullable && !other.is_nullable() {
            return false;
        }
        let Type::Class(other) = other else {
            return false;
        };
        if !self
            .hierarchy()
            .is_equal_to_or_subclass_of(Some(ty.declaration), Some(other.declaration))
        {
            return false;
        }

        let type_parameters = self.module.type_parameters_of(other.declaration);
        if options.ignore_type_parameters || type_parameters.is_empty() {
            return true;
        }

        let Some(instance) = self.computer().instance_of(ty, other.declaration) else {
            return false;
        };
        type_parameters.iter().all(|parameter| {
            let (Some(actual), Some(expected)) = (instance.substitutions.get(*parameter), other.substitutions.get(*parameter))
            else {
                return false;
            };
            match self.variance_of(*parameter) {
                Variance::Invariant => {
                    !actual.is_unknown()
                        && (actual == expected
                            || matches!(actual, Type::TypeParameter(_))
                            || matches!(expected, Type::TypeParameter(_)))
                }
                Variance::Covariant => self.check(actual, expected, options),
                Variance::Contravariant => self.check(expected, actual, options),
            }
        })
    }

    fn variance_of(&self, type_parameter: DeclId) -> Variance {
        match self.module.decl(type_parameter).kind {
            DeclKind::TypeParameter { variance } => variance,
            _ => Variance::Invariant,
        }
    }

    fn enum_is_assignable_to(&self, ty: &EnumType, other: &Type) -> bool {
        if ty.is_nullable && !other.is_nullable() {
            return false;
        }
        match other {
            Type::Class(class) => self.is_any(class),
            Type::Enum(other) => ty.declaration == other.declaration,
            _ => false,
        }
    }

    fn variant_is_assignable_to(&self, ty: &EnumVariantType, other: &Type) -> bool {
        if ty.is_nullable && !other.is_nullable() {
            return false;
        }
        match other {
            Type::Class(class) => self.is_any(class),
            Type::Enum(other) => self.module.containing_enum(ty.declaration) == Some(other.declaration),
            Type::EnumVariant(other) => ty.declaration == other.declaration,
            _ => false,
        }
    }

    fn literal_is_assignable_to(&self, ty: &LiteralType, other: &Type, options: AssignabilityOptions) -> bool {
        if ty.is_nullable() && !other.is_nullable() {
            return false;
        }
        match other {
            Type::Class(class) if self.is_any(class) && class.is_nullable => true,
            Type::Class(_) => ty.constants().iter().all(|constant| {
                let class_type = self.builtins.class_type_for_constant(self.module, constant);
                self.check(&class_type, other, options)
            }),
            Type::Literal(other) => ty
                .constants()
                .iter()
                .all(|constant| other.constants().contains(constant)),
            _ => false,
        }
    }

    fn named_tuple_is_assignable_to(&self, ty: &NamedTupleType, other: &Type, options: AssignabilityOptions) -> bool {
        let Type::NamedTuple(other) = other else {
            return false;
        };
        ty.len() == other.len()
            && ty
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(entry, other_entry)| {
                    entry.name == other_entry.name && self.check(&entry.ty, &other_entry.ty, options)
                })
    }

    fn static_is_assignable_to(&self, ty: &StaticType, other: &Type, options: AssignabilityOptions) -> bool {
        if let Type::Callable(_) = other {
            return match self.constructor_of(ty) {
                Some(constructor) => self.check(&constructor, other, options),
                None => false,
            };
        }
        Type::Static(ty.clone()) == *other
    }

    /// Callable that creates instances of a static type, if it has one
    fn constructor_of(&self, ty: &StaticType) -> Option<Type> {
        let declaration = match ty.instance_type.as_ref() {
            Type::Class(class) => match &self.module.decl(class.declaration).kind {
                DeclKind::Class {
                    parameters: Some(_), ..
                } => class.declaration,
                _ => return None,
            },
            Type::EnumVariant(variant) => variant.declaration,
            _ => return None,
        };

        let instance = ty.instance_type.update_nullability(false);
        Some(Type::Callable(CallableType {
            callable: Some(declaration.into()),
            inputs: self.computer().named_tuple_of(self.module.parameters_of(declaration)),
            outputs: NamedTupleType::new(vec![NamedTupleEntry {
                declaration: None,
                name: "instance".to_string(),
                ty: instance,
            }]),
        }))
    }

    // =========================================================================
    // Derived predicates
    // =========================================================================

    pub fn is_list(&self, ty: &Type) -> bool {
        self.is_collection(ty, self.builtins.list)
    }

    pub fn is_map(&self, ty: &Type) -> bool {
        self.is_collection(ty, self.builtins.map)
    }

    fn is_collection(&self, ty: &Type, collection: DeclId) -> bool {
        let target = self.builtins.class_type(self.module, collection, false);
        self.is_assignable_to_with(
            ty,
            &target,
            AssignabilityOptions {
                ignore_type_parameters: true,
            },
        )
    }

    /// Whether values of `ty` can be passed to a constant parameter
    pub fn can_be_type_of_constant_parameter(&self, ty: &Type) -> bool {
        match ty {
            Type::Class(class) => self.builtins.is_constant_class(class.declaration),
            Type::Enum(enum_type) => Builtins::is_constant_enum(self.module, enum_type.declaration),
            Type::EnumVariant(variant) => Builtins::is_constant_variant(self.module, variant.declaration),
            Type::Literal(_) | Type::Unknown => true,
            _ => false,
        }
    }
}
