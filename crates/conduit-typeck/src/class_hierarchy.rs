//! Superclass chains and inherited members

use conduit_ast::{DeclId, DeclKind, Module, TypeExprKind};
use rustc_hash::FxHashSet;

use crate::builtins::Builtins;

/// Resolves nominal class relationships. Only the first parent type of a
/// class takes part in the linear superclass chain.
#[derive(Clone, Copy)]
pub struct ClassHierarchy<'a> {
    module: &'a Module,
    builtins: &'a Builtins,
}

impl<'a> ClassHierarchy<'a> {
    pub fn new(module: &'a Module, builtins: &'a Builtins) -> Self {
        Self { module, builtins }
    }

    /// Class named by the first parent type of `class`
    pub fn parent_class(&self, class: DeclId) -> Option<DeclId> {
        let DeclKind::Class { parents, .. } = &self.module.decl(class).kind else {
            return None;
        };
        let first = parents.first()?;
        match &self.module.type_expr(*first).kind {
            TypeExprKind::Named {
                target: Some(target), ..
            } if matches!(self.module.decl(*target).kind, DeclKind::Class { .. }) => Some(*target),
            _ => None,
        }
    }

    /// Superclasses of `class`, nearest first, ending with `Any`. Every class
    /// is visited at most once, so cyclic hierarchies terminate.
    pub fn stream_superclasses(&self, class: Option<DeclId>) -> Superclasses<'a> {
        let mut visited = FxHashSet::default();
        let next = class.and_then(|class| {
            visited.insert(class);
            self.parent_class(class)
        });
        Superclasses {
            hierarchy: *self,
            next,
            visited,
            any_pending: class.is_some_and(|class| class != self.builtins.any),
        }
    }

    /// Members of all superclasses, nearest superclass first
    pub fn stream_superclass_members(&self, class: Option<DeclId>) -> impl Iterator<Item = DeclId> + 'a {
        let module = self.module;
        self.stream_superclasses(class)
            .flat_map(move |superclass| module.members_of(superclass).iter().copied())
    }

    /// The inherited instance member that `member` overrides. An earlier
    /// instance member of the same name in the same class shadows it.
    pub fn get_overridden_member(&self, member: DeclId) -> Option<DeclId> {
        let decl = self.module.decl(member);
        if !matches!(decl.kind, DeclKind::Attribute { .. } | DeclKind::Function { .. })
            || self.module.is_static(member)
        {
            return None;
        }
        let class = self.module.containing_class(member)?;
        let module = self.module;
        let same_name = |candidate: &DeclId| !module.is_static(*candidate) && module.decl(*candidate).name == decl.name;

        let shadowed = module
            .members_of(class)
            .iter()
            .take_while(|candidate| **candidate != member)
            .any(same_name);
        if shadowed {
            return None;
        }
        self.stream_superclass_members(Some(class)).find(same_name)
    }

    pub fn is_equal_to_or_subclass_of(&self, class: Option<DeclId>, other: Option<DeclId>) -> bool {
        let (Some(class), Some(other)) = (class, other) else {
            return false;
        };
        class == self.builtins.nothing
            || class == other
            || self.stream_superclasses(Some(class)).any(|superclass| superclass == other)
    }
}

/// Lazy iterator over a superclass chain
pub struct Superclasses<'a> {
    hierarchy: ClassHierarchy<'a>,
    next: Option<DeclId>,
    visited: FxHashSet<DeclId>,
    any_pending: bool,
}

impl Iterator for Superclasses<'_> {
    type Item = DeclId;

    fn next(&mut self) -> Option<DeclId> {
        if let Some(current) = self.next.take() {
            if self.visited.insert(current) {
                self.next = self.hierarchy.parent_class(current);
                if current == self.hierarchy.builtins.any {
                    self.any_pending = false;
                }
                return Some(current);
            }
        }

        if self.any_pending {
            self.any_pending = false;
            return Some(self.hierarchy.builtins.any);
        }
        None
    }
}

// =============================================================================
// Tests
// =============================================================================
