//! Type computer: supertypes and the lowest common supertype

use conduit_ast::{DeclKind, TypeExprKind};
use rustc_hash::FxHashSet;

use crate::computer::TypeComputer;
use crate::types::{ClassType, EnumType, Type};

impl<'a> TypeComputer<'a> {
    /// Supertypes of a class type, nearest first, ending with `Any`. Type
    /// arguments are carried through each parent type.
    pub fn stream_supertypes(&self, ty: &ClassType) -> Vec<ClassType> {
        let mut visited = FxHashSet::default();
        visited.insert(ty.declaration);

        let mut supertypes = Vec::new();
        let mut current = ty.clone();
        while let Some(parent) = self.parent_type(&current) {
            if !visited.insert(parent.declaration) {
                break;
            }
            let parent = parent.substitute(&current.substitutions).with_nullability(ty.is_nullable);
            supertypes.push(parent.clone());
            current = parent;
        }

        if !visited.contains(&self.builtins.any) {
            if let Type::Class(any) = self.builtins.any_type(self.module, ty.is_nullable) {
                supertypes.push(any);
            }
        }
        supertypes
    }

    /// Type of the first parent of a class, if it names a class
    fn parent_type(&self, ty: &ClassType) -> Option<ClassType> {
        let DeclKind::Class { parents, .. } = &self.module.decl(ty.declaration).kind else {
            return None;
        };
        let first = *parents.first()?;
        if !matches!(self.module.type_expr(first).kind, TypeExprKind::Named { .. }) {
            return None;
        }
        match self.compute_type(first) {
            Type::Class(parent) => Some(parent.with_nullability(false)),
            _ => None,
        }
    }

    /// The next wider type on the path towards `Any`
    fn immediate_supertype(&self, ty: &Type) -> Option<Type> {
        match ty {
            Type::Class(class) => self.stream_supertypes(class).into_iter().next().map(Type::Class),
            Type::Enum(_) => Some(self.builtins.any_type(self.module, false)),
            Type::EnumVariant(variant) => match self.module.containing_enum(variant.declaration) {
                Some(enum_decl) => Some(Type::Enum(EnumType::new(self.module, enum_decl, false))),
                None => Some(self.builtins.any_type(self.module, false)),
            },
            _ => None,
        }
    }

    /// Narrowest type all of `types` are assignable to
    pub fn lowest_common_supertype(&self, types: &[Type]) -> Type {
        let flattened: Vec<Type> = types
            .iter()
            .flat_map(|ty| match ty {
                Type::Union(union) => union.types().to_vec(),
                other => vec![other.clone()],
            })
            .collect();
        if flattened.is_empty() {
            return self.builtins.nothing_type(self.module, false);
        }

        let is_nullable = flattened.iter().any(Type::is_nullable);
        let mut candidates: Vec<Type> = Vec::new();
        for ty in flattened {
            let ty = ty.update_nullability(false);
            let is_empty_literal = matches!(&ty, Type::Literal(literal) if literal.constants().is_empty());
            if !is_empty_literal && !candidates.contains(&ty) {
                candidates.push(ty);
            }
        }

        match candidates.as_slice() {
            [] => return self.builtins.nothing_type(self.module, is_nullable),
            [single] => return single.update_nullability(is_nullable),
            _ => {}
        }

        if candidates.iter().any(|ty| {
            matches!(
                ty,
                Type::Callable(_) | Type::NamedTuple(_) | Type::Static(_) | Type::TypeParameter(_) | Type::Unknown
            )
        }) {
            return Type::Unknown;
        }

        if candidates.iter().all(|ty| matches!(ty, Type::Literal(_))) {
            let constants = candidates.iter().flat_map(|ty| match ty {
                Type::Literal(literal) => literal.constants().to_vec(),
                _ => Vec::new(),
            });
            return Type::literal(constants).update_nullability(is_nullable);
        }

        let checker = self.analysis.type_checker();
        let mut candidate = candidates
            .iter()
            .find(|ty| !matches!(ty, Type::Literal(_)))
            .cloned()
            .unwrap_or(Type::Unknown);
        let mut visited: Vec<Type> = Vec::new();
        loop {
            if candidates.iter().all(|ty| checker.is_assignable_to(ty, &candidate)) {
                return candidate.update_nullability(is_nullable);
            }
            visited.push(candidate.clone());
            match self.immediate_supertype(&candidate) {
                Some(next) if !visited.contains(&next) => candidate = next,
                _ => break,
            }
        }
        self.builtins.any_type(self.module, is_nullable)
    }
}
