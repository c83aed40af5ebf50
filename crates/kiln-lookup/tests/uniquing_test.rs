//! Uniquing and lazy completion tests
//!
//! Constructed types are interned per environment, binary types are built
//! on demand and placeholders are patched in place once their target loads.

mod common;

use common::{compile, env, env_with, get, platform};
use kiln_lookup::{
    BaseType, BinaryTypeDescriptor, CompilationUnitDecl, CompoundName, FieldDecl, MethodDecl, Modifiers, TypeBinding,
    TypeDecl, TypeRef, WildcardKind,
};

#[test]
fn test_constructed_types_are_identical() {
    let (mut env, _) = env();
    let list = get(&mut env, "java.util.List");
    let string = get(&mut env, "java.lang.String");
    let number = get(&mut env, "java.lang.Number");

    let first = env.create_parameterized_type(list, vec![string], None);
    let second = env.create_parameterized_type(list, vec![string], None);
    assert_eq!(first, second);
    assert_ne!(first, env.create_parameterized_type(list, vec![number], None));

    let extends = env.create_wildcard(Some(list), 0, Some(number), Vec::new(), WildcardKind::Extends);
    assert_eq!(
        extends,
        env.create_wildcard(Some(list), 0, Some(number), Vec::new(), WildcardKind::Extends)
    );
    let super_number = env.create_wildcard(Some(list), 0, Some(number), Vec::new(), WildcardKind::Super);
    assert_ne!(extends, super_number);

    let matrix = env.create_array_type(first, 2);
    let row = env.create_array_type(first, 1);
    assert_eq!(env.create_array_type(row, 1), matrix);
    assert!(env.stats().constructed_cache_hits > 0);
}

#[test]
fn test_raw_and_parameterized_never_collapse() {
    let (mut env, _) = env();
    let list = get(&mut env, "java.util.List");
    let object = env.object_type().unwrap();
    let raw = env.create_raw_type(list, None);
    let of_object = env.create_parameterized_type(list, vec![object], None);

    assert_ne!(raw, list);
    assert_ne!(raw, of_object);
    assert_eq!(env.create_raw_type(list, None), raw);
    assert_eq!(env.erasure(raw).unwrap(), list);
    assert_eq!(env.erasure(of_object).unwrap(), list);
}

#[test]
fn test_binary_members_are_built_once() {
    let (mut env, _) = env();
    let array_list = get(&mut env, "java.util.ArrayList");
    let before = env.stats().binary_member_completions;
    let methods = env.methods(array_list).unwrap();
    assert_eq!(env.stats().binary_member_completions, before + 1);
    assert_eq!(env.methods(array_list).unwrap(), methods);
    env.fields(array_list).unwrap();
    assert_eq!(env.stats().binary_member_completions, before + 1);
}

#[test]
fn test_substituted_members_are_cached() {
    let (mut env, _) = env();
    let list = get(&mut env, "java.util.List");
    let string = get(&mut env, "java.lang.String");
    let of_string = env.create_parameterized_type(list, vec![string], None);

    let methods = env.methods(of_string).unwrap();
    assert_eq!(env.methods(of_string).unwrap(), methods);
    let get = methods
        .iter()
        .copied()
        .find(|&m| env.method(m).selector == "get")
        .expect("get is declared by List");
    assert_eq!(env.method(get).return_type, string);
}

#[test]
fn test_missing_type_is_requested_once() {
    let provider = platform();
    let log = provider.clone();
    let (mut env, _) = env_with(provider);
    let name = CompoundName::from_dotted("java.util.Missing");
    assert_eq!(env.get_type(&name).unwrap(), None);
    assert_eq!(env.get_type(&name).unwrap(), None);
    assert_eq!(log.request_count("java.util.Missing"), 1);
}

#[test]
fn test_field_placeholder_is_patched_when_target_loads() {
    let mut provider = platform();
    provider
        .add_binary(BinaryTypeDescriptor::class("p/Holder").with_field("item", Modifiers::PUBLIC, "Lq/Item;"))
        .add_binary(BinaryTypeDescriptor::class("q/Item"));
    let (mut env, _) = env_with(provider);
    let holder = get(&mut env, "p.Holder");
    let fields = env.fields(holder).unwrap();
    let placeholder = env.field(fields[0]).ty;
    assert!(env.is_pending_placeholder(placeholder));

    let item = get(&mut env, "q.Item");
    assert_eq!(env.field(fields[0]).ty, item);
    assert!(env.class(item).is_some());
    assert!(!env.is_pending_placeholder(env.field(fields[0]).ty));
}

#[test]
fn test_base_types_are_shared() {
    let (mut env, _) = env();
    let int = env.base_type(BaseType::Int);
    assert_eq!(env.base_type(BaseType::Int), int);
    assert!(matches!(env.ty(int), TypeBinding::Base(BaseType::Int)));
    let boxed = env.boxed_type(BaseType::Int).unwrap();
    assert_eq!(boxed, Some(get(&mut env, "java.lang.Integer")));
}

#[test]
fn test_unit_declarations_are_released_after_completion() {
    let (mut env, _) = env();
    let first = CompilationUnitDecl::new("Shape.java", "p").with_type(
        TypeDecl::class("Shape")
            .with_field(FieldDecl::new("sides", Modifiers::PUBLIC, TypeRef::int()))
            .with_member_type(TypeDecl::class("Corner").with_method(MethodDecl::new("angle", TypeRef::int()))),
    );
    let second = CompilationUnitDecl::new("Square.java", "p")
        .with_type(TypeDecl::class("Square").extends(TypeRef::simple("Shape")));
    env.build_type_bindings(first);
    env.build_type_bindings(second);
    assert_eq!(env.registered_unit_count(), 2);

    env.complete_type_bindings().unwrap();
    assert_eq!(env.registered_unit_count(), 0);
    assert_eq!(env.stats().units_completed, 2);

    // Bindings outlive their declarations
    let shape = get(&mut env, "p.Shape");
    let corner = env.member_types(shape).unwrap()[0];
    let square = get(&mut env, "p.Square");
    assert_eq!(env.fields(shape).unwrap().len(), 1);
    assert_eq!(env.methods_named(corner, "angle").unwrap().len(), 1);
    assert_eq!(env.superclass(square).unwrap(), Some(shape));

    // A later unit is released on its own run
    compile(&mut env, CompilationUnitDecl::new("Circle.java", "p").with_type(TypeDecl::class("Circle")));
    assert_eq!(env.registered_unit_count(), 0);
    assert_eq!(env.stats().units_completed, 3);
}
