//! Hierarchy connection tests
//!
//! Source types are pushed through the pipeline against the miniature
//! platform and their connected supertypes are inspected.

mod common;

use common::{compile, env, get, scope_of};
use kiln_lookup::decl::TypeArgRef;
use kiln_lookup::{
    CompilationUnitDecl, InvocationSite, MethodOrigin, Modifiers, ProblemId, ProblemReason, TypeDecl, TypeRef, TypeState,
};

fn has_problems(env: &kiln_lookup::LookupEnvironment, ty: kiln_lookup::TypeId) -> bool {
    env.class(ty).is_some_and(|c| c.state.contains(TypeState::HIERARCHY_HAS_PROBLEMS))
}

#[test]
fn test_three_way_cycle_is_reported_once() {
    let (mut env, reporter) = env();
    let unit = CompilationUnitDecl::new("Cycle.java", "p")
        .with_type(TypeDecl::class("A").extends(TypeRef::simple("B")))
        .with_type(TypeDecl::class("B").extends(TypeRef::simple("C")))
        .with_type(TypeDecl::class("C").extends(TypeRef::simple("A")));
    let (_, types) = compile(&mut env, unit);

    assert_eq!(reporter.count(ProblemId::HierarchyCircularity), 1);
    for &ty in &types {
        assert!(has_problems(&env, ty));
    }
    // Walking the superclass chain terminates at Object
    let object = env.object_type().unwrap();
    let mut current = types[0];
    let mut steps = 0;
    while let Some(superclass) = env.superclass(current).unwrap() {
        current = superclass;
        steps += 1;
        assert!(steps <= types.len() + 1, "superclass chain does not terminate");
    }
    assert_eq!(current, object);
}

#[test]
fn test_enum_extends_enum_of_itself() {
    let (mut env, reporter) = env();
    let (_, types) = compile(
        &mut env,
        CompilationUnitDecl::new("Color.java", "p").with_type(TypeDecl::enumeration("Color")),
    );
    let color = types[0];
    let enum_type = get(&mut env, "java.lang.Enum");
    let superclass = env.superclass(color).unwrap().expect("enum has a superclass");

    assert_eq!(env.erasure_class(superclass), Some(enum_type));
    let arguments = env.ty(superclass).as_parameterized().map(|p| p.arguments.clone());
    assert_eq!(arguments, Some(vec![color]));
    assert!(reporter.problems().is_empty());

    let scope = scope_of(&env, color);
    let mut site = InvocationSite::at(0);
    let values = env.find_method(scope, color, "values", &[], &mut site).unwrap().found().unwrap();
    let color_array = env.create_array_type(color, 1);
    assert_eq!(env.method(values).return_type, color_array);
}

#[test]
fn test_annotation_implements_annotation_interface() {
    let (mut env, _) = env();
    let (_, types) = compile(
        &mut env,
        CompilationUnitDecl::new("Marker.java", "p").with_type(TypeDecl::annotation("Marker")),
    );
    let annotation = get(&mut env, "java.lang.annotation.Annotation");
    assert!(env.super_interfaces(types[0]).unwrap().contains(&annotation));
    assert!(env.is_subclass_of(types[0], annotation).unwrap());
}

#[test]
fn test_duplicate_superinterface() {
    let (mut env, reporter) = env();
    let unit = CompilationUnitDecl::new("Twice.java", "p").with_type(
        TypeDecl::class("Twice")
            .implements(TypeRef::qualified("java.io.Serializable"))
            .implements(TypeRef::qualified("java.io.Serializable")),
    );
    let (_, types) = compile(&mut env, unit);
    assert_eq!(reporter.count(ProblemId::DuplicateSuperinterface), 1);
    assert_eq!(env.super_interfaces(types[0]).unwrap().len(), 1);
}

#[test]
fn test_superinterfaces_with_different_arguments_collide() {
    let (mut env, reporter) = env();
    let comparable_of = |name: &str| TypeRef::simple("Comparable").with_args(vec![TypeArgRef::from(TypeRef::simple(name))]);
    let unit = CompilationUnitDecl::new("Z.java", "p")
        .with_type(TypeDecl::interface("I").implements(comparable_of("String")))
        .with_type(
            TypeDecl::class("Z")
                .with_modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
                .implements(TypeRef::simple("I"))
                .implements(comparable_of("Integer")),
        );
    let (_, types) = compile(&mut env, unit);
    assert_eq!(reporter.count(ProblemId::SuperinterfacesCollide), 1);
    assert!(has_problems(&env, types[1]));
    assert!(!has_problems(&env, types[0]));
}

#[test]
fn test_final_and_interface_misuse() {
    let (mut env, reporter) = env();
    let unit = CompilationUnitDecl::new("Bad.java", "p")
        .with_type(TypeDecl::class("FromString").extends(TypeRef::simple("String")))
        .with_type(TypeDecl::class("FromInterface").extends(TypeRef::simple("Comparable")))
        .with_type(TypeDecl::class("ImplementsClass").implements(TypeRef::simple("Number")))
        .with_type(TypeDecl::class("FromNowhere").extends(TypeRef::simple("Nowhere")));
    let (_, types) = compile(&mut env, unit);
    let object = env.object_type().unwrap();

    assert_eq!(reporter.count(ProblemId::ClassExtendsFinalClass), 1);
    assert_eq!(reporter.count(ProblemId::SuperclassMustBeAClass), 1);
    assert_eq!(reporter.count(ProblemId::SuperInterfaceMustBeAnInterface), 1);
    assert_eq!(reporter.count(ProblemId::SuperTypeNotFound), 1);
    for &ty in &[types[0], types[1], types[3]] {
        assert_eq!(env.superclass(ty).unwrap(), Some(object));
    }
    assert!(env.super_interfaces(types[2]).unwrap().is_empty());
}

#[test]
fn test_default_constructor_follows_class_access() {
    let (mut env, _) = env();
    let (_, types) = compile(
        &mut env,
        CompilationUnitDecl::new("Plain.java", "p").with_type(TypeDecl::class("Plain")),
    );
    let plain = types[0];
    let scope = scope_of(&env, plain);
    let mut site = InvocationSite::at(0);
    let constructor = env.find_constructor(scope, plain, &[], &mut site).unwrap().found().unwrap();
    let binding = env.method(constructor);
    assert_eq!(binding.origin, MethodOrigin::DefaultConstructor);
    assert!(binding.modifiers.contains(Modifiers::PUBLIC));
}

#[test]
fn test_missing_member_of_broken_hierarchy_is_inconclusive() {
    let (mut env, _) = env();
    let unit = CompilationUnitDecl::new("Cycle.java", "p")
        .with_type(TypeDecl::class("A").extends(TypeRef::simple("B")))
        .with_type(TypeDecl::class("B").extends(TypeRef::simple("A")))
        .with_type(TypeDecl::class("Sound"));
    let (_, types) = compile(&mut env, unit);
    let (a, sound) = (types[0], types[2]);
    let scope = scope_of(&env, a);
    let mut site = InvocationSite::at(0);

    let method = env.find_method(scope, a, "missing", &[], &mut site).unwrap();
    assert_eq!(method.problem_reason(), Some(ProblemReason::HierarchyHasProblems));
    let field = env.find_field(scope, a, "missing", &mut site).unwrap();
    assert_eq!(field.problem_reason(), Some(ProblemReason::HierarchyHasProblems));
    // Members that did connect are still found
    assert!(env.find_method(scope, a, "toString", &[], &mut site).unwrap().is_found());

    let healthy = env.find_method(scope, sound, "missing", &[], &mut site).unwrap();
    assert_eq!(healthy.problem_reason(), Some(ProblemReason::NotFound));
}
