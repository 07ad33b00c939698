//! Shared fixture: a module builder preloaded with the builtin classes

#![allow(dead_code)]

use conduit_ast::{DeclId, Module, ModuleBuilder, Variance};
use conduit_typeck::{ClassType, Type, TypeParameterSubstitutions};

/// Builtin class declarations of the fixture module
pub struct Std {
    pub any: DeclId,
    pub nothing: DeclId,
    pub boolean: DeclId,
    pub number: DeclId,
    pub float: DeclId,
    pub int: DeclId,
    pub string: DeclId,
    pub list: DeclId,
    pub list_element: DeclId,
    pub map: DeclId,
    pub map_key: DeclId,
    pub map_value: DeclId,
}

/// `Float` and `Int` extend `Number`; `List<out E>` and `Map<K, out V>`
pub fn builder() -> (ModuleBuilder, Std) {
    let mut b = ModuleBuilder::new(0);
    let any = b.class("Any", None);
    let nothing = b.class("Nothing", None);
    let boolean = b.class("Boolean", None);
    let number = b.class("Number", None);
    let float = b.class("Float", Some(number));
    let int = b.class("Int", Some(number));
    let string = b.class("String", None);
    let list = b.class("List", None);
    let list_element = b.type_parameter(list, "E", Variance::Covariant);
    let map = b.class("Map", None);
    let map_key = b.type_parameter(map, "K", Variance::Invariant);
    let map_value = b.type_parameter(map, "V", Variance::Covariant);

    let std = Std {
        any,
        nothing,
        boolean,
        number,
        float,
        int,
        string,
        list,
        list_element,
        map,
        map_key,
        map_value,
    };
    (b, std)
}

pub fn class(module: &Module, decl: DeclId, is_nullable: bool) -> Type {
    Type::Class(ClassType::new(
        module,
        decl,
        TypeParameterSubstitutions::default(),
        is_nullable,
    ))
}

pub fn generic(module: &Module, decl: DeclId, arguments: Vec<(DeclId, Type)>, is_nullable: bool) -> Type {
    Type::Class(ClassType::new(module, decl, arguments.into_iter().collect(), is_nullable))
}

pub fn list_of(module: &Module, std: &Std, element: Type) -> Type {
    generic(module, std.list, vec![(std.list_element, element)], false)
}

pub fn map_of(module: &Module, std: &Std, key: Type, value: Type) -> Type {
    generic(module, std.map, vec![(std.map_key, key), (std.map_value, value)], false)
}
