//! Builtin class registry
//!
//! The core refers to a handful of classes declared by the language's builtin
//! library: the top type `Any`, the bottom type `Nothing`, the classes literal
//! constants belong to, and the collection classes.

use conduit_ast::{DeclId, DeclKind, Module};
use tracing::debug;

use crate::constant::Constant;
use crate::error::AnalysisError;
use crate::options::BuiltinNames;
use crate::types::{ClassType, Type, TypeParameterSubstitutions};

/// Resolved builtin classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtins {
    pub any: DeclId,
    pub nothing: DeclId,
    pub boolean: DeclId,
    pub float: DeclId,
    pub int: DeclId,
    pub string: DeclId,
    pub list: DeclId,
    pub map: DeclId,
    pub number: Option<DeclId>,
}

impl Builtins {
    /// Look up every builtin class among the module's top-level declarations
    pub fn resolve(module: &Module, names: &BuiltinNames) -> Result<Self, AnalysisError> {
        let builtins = Self {
            any: Self::require(module, &names.any)?,
            nothing: Self::require(module, &names.nothing)?,
            boolean: Self::require(module, &names.boolean)?,
            float: Self::require(module, &names.float)?,
            int: Self::require(module, &names.int)?,
            string: Self::require(module, &names.string)?,
            list: Self::require(module, &names.list)?,
            map: Self::require(module, &names.map)?,
            number: module.find_class(&names.number),
        };
        debug!(document = module.document, "resolved builtin classes");
        Ok(builtins)
    }

    fn require(module: &Module, name: &str) -> Result<DeclId, AnalysisError> {
        if let Some(class) = module.find_class(name) {
            return Ok(class);
        }
        let other = module
            .top_level()
            .iter()
            .map(|id| module.decl(*id))
            .find(|decl| decl.name.name == name);
        match other {
            Some(decl) => Err(AnalysisError::BuiltinNotAClass {
                name: name.to_string(),
                found: decl.kind.describe(),
            }),
            None => Err(AnalysisError::MissingBuiltinClass {
                name: name.to_string(),
            }),
        }
    }

    /// Classes whose instances may be passed to constant parameters
    pub fn is_constant_class(&self, class: DeclId) -> bool {
        [
            self.boolean,
            self.float,
            self.int,
            self.list,
            self.map,
            self.nothing,
            self.string,
        ]
        .contains(&class)
    }

    /// Class type of a builtin declaration, with every type parameter unknown
    pub fn class_type(&self, module: &Module, class: DeclId, is_nullable: bool) -> Type {
        let substitutions = module
            .type_parameters_of(class)
            .iter()
            .map(|parameter| (*parameter, Type::Unknown))
            .collect();
        Type::Class(ClassType::new(module, class, substitutions, is_nullable))
    }

    pub fn any_type(&self, module: &Module, is_nullable: bool) -> Type {
        Type::Class(ClassType::new(module, self.any, TypeParameterSubstitutions::default(), is_nullable))
    }

    pub fn nothing_type(&self, module: &Module, is_nullable: bool) -> Type {
        Type::Class(ClassType::new(
            module,
            self.nothing,
            TypeParameterSubstitutions::default(),
            is_nullable,
        ))
    }

    /// The builtin class a constant is an instance of; `null` is `Nothing?`
    pub fn class_type_for_constant(&self, module: &Module, constant: &Constant) -> Type {
        let (class, is_nullable) = match constant {
            Constant::Boolean(_) => (self.boolean, false),
            Constant::Float(_) => (self.float, false),
            Constant::Int(_) => (self.int, false),
            Constant::Null => (self.nothing, true),
            Constant::String(_) => (self.string, false),
        };
        Type::Class(ClassType::new(
            module,
            class,
            TypeParameterSubstitutions::default(),
            is_nullable,
        ))
    }

    /// Whether every variant of an enum only takes constant parameters
    pub fn is_constant_enum(module: &Module, enum_decl: DeclId) -> bool {
        module
            .variants_of(enum_decl)
            .iter()
            .all(|variant| Self::is_constant_variant(module, *variant))
    }

    pub fn is_constant_variant(module: &Module, variant: DeclId) -> bool {
        matches!(module.decl(variant).kind, DeclKind::EnumVariant { .. })
            && module
                .parameters_of(variant)
                .iter()
                .all(|parameter| module.is_constant_parameter(*parameter))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_ast::ModuleBuilder;

    fn declare_builtins(b: &mut ModuleBuilder, skip: &str) {
        for name in ["Any", "Nothing", "Boolean", "Float", "Int", "String", "Map"] {
            if name != skip {
                b.class(name, None);
            }
        }
    }

    #[test]
    fn test_missing_builtin_class() {
        let mut b = ModuleBuilder::new(0);
        declare_builtins(&mut b, "Int");
        b.class("List", None);
        let module = b.finish();

        let err = Builtins::resolve(&module, &BuiltinNames::default()).unwrap_err();
        assert_eq!(err, AnalysisError::MissingBuiltinClass { name: "Int".to_string() });
        assert_eq!(err.to_string(), "builtin class 'Int' is not declared");
    }

    #[test]
    fn test_builtin_declared_as_something_else() {
        let mut b = ModuleBuilder::new(0);
        declare_builtins(&mut b, "");
        b.enumeration("List");
        let module = b.finish();

        let err = Builtins::resolve(&module, &BuiltinNames::default()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::BuiltinNotAClass { ref name, found: "enum" } if name == "List"
        ));
    }

    #[test]
    fn test_custom_builtin_names() {
        let mut b = ModuleBuilder::new(0);
        declare_builtins(&mut b, "Any");
        b.class("List", None);
        let top = b.class("Object", None);
        let module = b.finish();

        let names = BuiltinNames {
            any: "Object".to_string(),
            ..BuiltinNames::default()
        };
        let builtins = Builtins::resolve(&module, &names).unwrap();
        assert_eq!(builtins.any, top);
        assert_eq!(builtins.number, None);
    }

    #[test]
    fn test_constant_enum() {
        let mut b = ModuleBuilder::new(0);
        let e = b.enumeration("E");
        let v1 = b.variant(e, "A");
        b.constant_parameter(v1, "p", None, None);
        let _v2 = b.variant(e, "B");
        let f = b.enumeration("F");
        let w = b.variant(f, "C");
        b.parameter(w, "q", None, None);
        let module = b.finish();

        assert!(Builtins::is_constant_enum(&module, e));
        assert!(!Builtins::is_constant_enum(&module, f));
        assert!(!Builtins::is_constant_variant(&module, w));
    }
}
