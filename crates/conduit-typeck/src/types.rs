//! Internal type representation
//!
//! Types are immutable values. Declaration-bearing variants compare their
//! declarations by id, so two class types are equal iff they name the same
//! class declaration with equal substitutions and nullability.

use std::fmt;

use conduit_ast::{DeclId, Module, NodeKey};

use crate::constant::Constant;

/// Internal type representation used by the type checker
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Result of a failed computation. Never assignable to or from anything.
    Unknown,

    /// Type of a callable (function, segment, lambda, callable type)
    Callable(CallableType),

    /// Instance of a class
    Class(ClassType),

    /// Instance of an enum
    Enum(EnumType),

    /// Instance of one enum variant
    EnumVariant(EnumVariantType),

    /// Finite set of constant values
    Literal(LiteralType),

    /// Results of a call, addressed by position and name
    NamedTuple(NamedTupleType),

    /// The type itself used as a value, e.g. a class reference
    Static(StaticType),

    /// Unsubstituted generic type parameter
    TypeParameter(TypeParameterType),

    /// Disjunction of types
    Union(UnionType),
}

/// Ordered type parameter bindings of a class type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeParameterSubstitutions(Vec<(DeclId, Type)>);

impl TypeParameterSubstitutions {
    pub fn get(&self, parameter: DeclId) -> Option<&Type> {
        self.0
            .iter()
            .find(|(p, _)| *p == parameter)
            .map(|(_, ty)| ty)
    }

    pub fn insert(&mut self, parameter: DeclId, ty: Type) {
        match self.0.iter_mut().find(|(p, _)| *p == parameter) {
            Some(entry) => entry.1 = ty,
            None => self.0.push((parameter, ty)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DeclId, Type)> {
        self.0.iter()
    }

    fn map_types(&self, f: impl Fn(&Type) -> Type) -> Self {
        Self(self.0.iter().map(|(p, ty)| (*p, f(ty))).collect())
    }
}

impl FromIterator<(DeclId, Type)> for TypeParameterSubstitutions {
    fn from_iter<I: IntoIterator<Item = (DeclId, Type)>>(iter: I) -> Self {
        let mut substitutions = Self::default();
        for (parameter, ty) in iter {
            substitutions.insert(parameter, ty);
        }
        substitutions
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallableType {
    /// Node the callable was computed from; identity only
    pub callable: Option<NodeKey>,
    pub inputs: NamedTupleType,
    pub outputs: NamedTupleType,
}

impl CallableType {
    pub fn get_parameter_type_by_index(&self, index: usize) -> Type {
        self.inputs.get_type_of_entry(index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    pub declaration: DeclId,
    pub name: String,
    pub substitutions: TypeParameterSubstitutions,
    pub is_nullable: bool,
}

impl ClassType {
    pub fn new(
        module: &Module,
        declaration: DeclId,
        substitutions: TypeParameterSubstitutions,
        is_nullable: bool,
    ) -> Self {
        Self {
            declaration,
            name: module.decl(declaration).name.name.clone(),
            substitutions,
            is_nullable,
        }
    }

    pub fn with_nullability(&self, is_nullable: bool) -> Self {
        Self {
            is_nullable,
            ..self.clone()
        }
    }

    /// Replace type parameters inside the type arguments
    pub fn substitute(&self, substitutions: &TypeParameterSubstitutions) -> Self {
        Self {
            substitutions: self.substitutions.map_types(|ty| ty.substitute(substitutions)),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub declaration: DeclId,
    pub name: String,
    pub is_nullable: bool,
}

impl EnumType {
    pub fn new(module: &Module, declaration: DeclId, is_nullable: bool) -> Self {
        Self {
            declaration,
            name: module.decl(declaration).name.name.clone(),
            is_nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariantType {
    pub declaration: DeclId,
    pub name: String,
    pub is_nullable: bool,
}

impl EnumVariantType {
    pub fn new(module: &Module, declaration: DeclId, is_nullable: bool) -> Self {
        Self {
            declaration,
            name: module.decl(declaration).name.name.clone(),
            is_nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameterType {
    pub declaration: DeclId,
    pub name: String,
    pub is_nullable: bool,
}

impl TypeParameterType {
    pub fn new(module: &Module, declaration: DeclId, is_nullable: bool) -> Self {
        Self {
            declaration,
            name: module.decl(declaration).name.name.clone(),
            is_nullable,
        }
    }
}

/// Literal type; equality ignores the order of constants
#[derive(Debug, Clone)]
pub struct LiteralType {
    constants: Vec<Constant>,
}

impl LiteralType {
    pub fn new(constants: impl IntoIterator<Item = Constant>) -> Self {
        let mut unique: Vec<Constant> = Vec::new();
        for constant in constants {
            if !unique.contains(&constant) {
                unique.push(constant);
            }
        }
        Self { constants: unique }
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn is_nullable(&self) -> bool {
        self.constants.contains(&Constant::Null)
    }

    fn with_nullability(&self, is_nullable: bool) -> Self {
        if is_nullable && !self.is_nullable() {
            Self::new(self.constants.iter().cloned().chain([Constant::Null]))
        } else if !is_nullable && self.is_nullable() {
            Self::new(self.constants.iter().filter(|c| **c != Constant::Null).cloned())
        } else {
            self.clone()
        }
    }
}

impl PartialEq for LiteralType {
    fn eq(&self, other: &Self) -> bool {
        self.constants.len() == other.constants.len()
            && self.constants.iter().all(|c| other.constants.contains(c))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedTupleType {
    pub entries: Vec<NamedTupleEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedTupleEntry {
    pub declaration: Option<DeclId>,
    pub name: String,
    pub ty: Type,
}

impl NamedTupleType {
    pub fn new(entries: Vec<NamedTupleEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_type_of_entry(&self, index: usize) -> Type {
        self.entries
            .get(index)
            .map(|entry| entry.ty.clone())
            .unwrap_or(Type::Unknown)
    }

    fn map_types(&self, f: impl Fn(&Type) -> Type) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|entry| NamedTupleEntry {
                    ty: f(&entry.ty),
                    ..entry.clone()
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticType {
    pub instance_type: Box<Type>,
}

/// Flattened, deduplicated union; equality ignores the order of members
#[derive(Debug, Clone, Default)]
pub struct UnionType {
    types: Vec<Type>,
}

impl UnionType {
    pub fn new(types: impl IntoIterator<Item = Type>) -> Self {
        let mut unique: Vec<Type> = Vec::new();
        for ty in types {
            let members = match ty {
                Type::Union(union) => union.types,
                other => vec![other],
            };
            for member in members {
                if !unique.contains(&member) {
                    unique.push(member);
                }
            }
        }
        Self { types: unique }
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn is_nullable(&self) -> bool {
        self.types.iter().any(Type::is_nullable)
    }
}

impl PartialEq for UnionType {
    fn eq(&self, other: &Self) -> bool {
        self.types.len() == other.types.len() && self.types.iter().all(|t| other.types.contains(t))
    }
}

// =============================================================================
// Structural operations
// =============================================================================

impl Type {
    pub fn literal(constants: impl IntoIterator<Item = Constant>) -> Type {
        Type::Literal(LiteralType::new(constants))
    }

    pub fn union(types: impl IntoIterator<Item = Type>) -> Type {
        Type::Union(UnionType::new(types))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            Type::Unknown | Type::Callable(_) | Type::NamedTuple(_) | Type::Static(_) => false,
            Type::Class(class) => class.is_nullable,
            Type::Enum(enum_type) => enum_type.is_nullable,
            Type::EnumVariant(variant) => variant.is_nullable,
            Type::TypeParameter(parameter) => parameter.is_nullable,
            Type::Literal(literal) => literal.is_nullable(),
            Type::Union(union) => union.is_nullable(),
        }
    }

    /// Toggle nullability. Shapes without a nullable form become a union
    /// with `literal<null>`.
    pub fn update_nullability(&self, is_nullable: bool) -> Type {
        match self {
            Type::Unknown => Type::Unknown,
            Type::Class(class) => Type::Class(class.with_nullability(is_nullable)),
            Type::Enum(enum_type) => Type::Enum(EnumType {
                is_nullable,
                ..enum_type.clone()
            }),
            Type::EnumVariant(variant) => Type::EnumVariant(EnumVariantType {
                is_nullable,
                ..variant.clone()
            }),
            Type::TypeParameter(parameter) => Type::TypeParameter(TypeParameterType {
                is_nullable,
                ..parameter.clone()
            }),
            Type::Literal(literal) => Type::Literal(literal.with_nullability(is_nullable)),
            Type::Callable(_) | Type::NamedTuple(_) | Type::Static(_) => {
                if is_nullable {
                    Type::union([self.clone(), Type::literal([Constant::Null])])
                } else {
                    self.clone()
                }
            }
            Type::Union(union) => {
                if is_nullable && !union.is_nullable() {
                    if union.types.is_empty() {
                        Type::literal([Constant::Null])
                    } else {
                        Type::union(union.types.iter().cloned().chain([Type::literal([Constant::Null])]))
                    }
                } else if !is_nullable && union.is_nullable() {
                    Type::union(
                        union
                            .types
                            .iter()
                            .map(|ty| ty.update_nullability(false))
                            .filter(|ty| !matches!(ty, Type::Literal(literal) if literal.constants.is_empty())),
                    )
                } else {
                    self.clone()
                }
            }
        }
    }

    /// Remove redundant containers: single-member unions and single-entry tuples
    pub fn unwrap(&self) -> Type {
        match self {
            Type::Union(union) if union.types.len() == 1 => union.types[0].unwrap(),
            Type::Union(union) => Type::union(union.types.iter().map(Type::unwrap)),
            Type::NamedTuple(tuple) if tuple.entries.len() == 1 => tuple.entries[0].ty.unwrap(),
            Type::NamedTuple(tuple) => Type::NamedTuple(tuple.map_types(Type::unwrap)),
            Type::Callable(callable) => Type::Callable(CallableType {
                callable: callable.callable,
                inputs: callable.inputs.map_types(Type::unwrap),
                outputs: callable.outputs.map_types(Type::unwrap),
            }),
            Type::Class(class) => Type::Class(ClassType {
                substitutions: class.substitutions.map_types(Type::unwrap),
                ..class.clone()
            }),
            Type::Static(static_type) => Type::Static(StaticType {
                instance_type: Box::new(static_type.instance_type.unwrap()),
            }),
            _ => self.clone(),
        }
    }

    /// Replace type parameters by their bindings
    pub fn substitute(&self, substitutions: &TypeParameterSubstitutions) -> Type {
        if substitutions.is_empty() {
            return self.clone();
        }

        match self {
            Type::TypeParameter(parameter) => match substitutions.get(parameter.declaration) {
                Some(ty) if parameter.is_nullable => ty.update_nullability(true),
                Some(ty) => ty.clone(),
                None => self.clone(),
            },
            Type::Callable(callable) => Type::Callable(CallableType {
                callable: callable.callable,
                inputs: callable.inputs.map_types(|ty| ty.substitute(substitutions)),
                outputs: callable.outputs.map_types(|ty| ty.substitute(substitutions)),
            }),
            Type::Class(class) => Type::Class(class.substitute(substitutions)),
            Type::NamedTuple(tuple) => Type::NamedTuple(tuple.map_types(|ty| ty.substitute(substitutions))),
            Type::Static(static_type) => Type::Static(StaticType {
                instance_type: Box::new(static_type.instance_type.substitute(substitutions)),
            }),
            Type::Union(union) => Type::union(union.types.iter().map(|ty| ty.substitute(substitutions))),
            Type::Unknown | Type::Enum(_) | Type::EnumVariant(_) | Type::Literal(_) => self.clone(),
        }
    }
}

// =============================================================================
// Display
// =============================================================================

fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn nullable_suffix(is_nullable: bool) -> &'static str {
    if is_nullable {
        "?"
    } else {
        ""
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => write!(f, "$unknown"),
            Type::Callable(callable) => write!(f, "{} -> {}", callable.inputs, callable.outputs),
            Type::Class(class) => {
                write!(f, "{}", class.name)?;
                if !class.substitutions.is_empty() {
                    write!(f, "<{}>", join(class.substitutions.iter().map(|(_, ty)| ty)))?;
                }
                write!(f, "{}", nullable_suffix(class.is_nullable))
            }
            Type::Enum(enum_type) => write!(f, "{}{}", enum_type.name, nullable_suffix(enum_type.is_nullable)),
            Type::EnumVariant(variant) => write!(f, "{}{}", variant.name, nullable_suffix(variant.is_nullable)),
            Type::TypeParameter(parameter) => {
                write!(f, "{}{}", parameter.name, nullable_suffix(parameter.is_nullable))
            }
            Type::Literal(literal) => write!(f, "literal<{}>", join(&literal.constants)),
            Type::NamedTuple(tuple) => write!(f, "{}", tuple),
            Type::Static(static_type) => write!(f, "$type<{}>", static_type.instance_type),
            Type::Union(union) => write!(f, "union<{}>", join(&union.types)),
        }
    }
}

impl fmt::Display for NamedTupleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self
            .entries
            .iter()
            .map(|entry| format!("{}: {}", entry.name, entry.ty));
        write!(f, "({})", join(entries))
    }
}

// =============================================================================
// Tests
// =============================================================================
