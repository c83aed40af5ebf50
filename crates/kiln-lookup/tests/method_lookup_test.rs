//! Method lookup tests
//!
//! Overload resolution across the three applicability phases, visibility,
//! generic method inference and the implicit array members.

mod common;

use common::{compile, env, get, scope_of};
use kiln_lookup::{
    BaseType, CompilationUnitDecl, InvocationSite, LookupEnvironment, MethodDecl, MethodId, Modifiers, ProblemReason,
    ScopeId, TypeDecl, TypeId, TypeRef, WildcardKind,
};

// A class named `Calls` in package `p` plus helpers, returning (env, Calls, its scope)
fn calls(methods: Vec<MethodDecl>, extra: Vec<TypeDecl>) -> (LookupEnvironment, TypeId, ScopeId) {
    let (mut env, _) = env();
    let mut calls = TypeDecl::class("Calls");
    for method in methods {
        calls = calls.with_method(method);
    }
    let mut unit = CompilationUnitDecl::new("Calls.java", "p").with_type(calls);
    for decl in extra {
        unit = unit.with_type(decl);
    }
    let (_, types) = compile(&mut env, unit);
    let scope = scope_of(&env, types[0]);
    (env, types[0], scope)
}

fn find(env: &mut LookupEnvironment, scope: ScopeId, receiver: TypeId, selector: &str, args: &[TypeId]) -> MethodId {
    let mut site = InvocationSite::at(0);
    env.find_method(scope, receiver, selector, args, &mut site)
        .unwrap()
        .found()
        .unwrap_or_else(|| panic!("{selector} not resolved"))
}

#[test]
fn test_most_specific_overload_is_chosen() {
    let (mut env, calls, scope) = calls(
        vec![
            MethodDecl::new("f", TypeRef::void()).param("o", TypeRef::simple("Object")),
            MethodDecl::new("f", TypeRef::void()).param("s", TypeRef::simple("String")),
        ],
        Vec::new(),
    );
    let string = get(&mut env, "java.lang.String");
    let object = env.object_type().unwrap();
    let null = env.base_type(BaseType::Null);

    let with_string = find(&mut env, scope, calls, "f", &[string]);
    assert_eq!(env.method(with_string).parameters, vec![string]);
    let with_object = find(&mut env, scope, calls, "f", &[object]);
    assert_eq!(env.method(with_object).parameters, vec![object]);
    // null fits both; String is more specific
    let with_null = find(&mut env, scope, calls, "f", &[null]);
    assert_eq!(env.method(with_null).parameters, vec![string]);
}

#[test]
fn test_unrelated_overloads_are_ambiguous_for_null() {
    let (mut env, calls, scope) = calls(
        vec![
            MethodDecl::new("f", TypeRef::void()).param("x", TypeRef::simple("X")),
            MethodDecl::new("f", TypeRef::void()).param("y", TypeRef::simple("Y")),
        ],
        vec![TypeDecl::class("X"), TypeDecl::class("Y")],
    );
    let null = env.base_type(BaseType::Null);
    let mut site = InvocationSite::at(0);
    let result = env.find_method(scope, calls, "f", &[null], &mut site).unwrap();
    assert_eq!(result.problem_reason(), Some(ProblemReason::Ambiguous));
    assert!(result.found_or_closest().is_some());
}

#[test]
fn test_private_method_of_other_type_is_not_visible() {
    let (mut env, _) = env();
    let unit = CompilationUnitDecl::new("Secret.java", "p")
        .with_type(
            TypeDecl::class("Secret")
                .with_method(MethodDecl::new("hidden", TypeRef::void()).with_modifiers(Modifiers::PRIVATE)),
        )
        .with_type(TypeDecl::class("Other"));
    let (_, types) = compile(&mut env, unit);
    let (secret, other) = (types[0], types[1]);

    let mut site = InvocationSite::at(0);
    let from_other = env.find_method(scope_of(&env, other), secret, "hidden", &[], &mut site).unwrap();
    assert_eq!(from_other.problem_reason(), Some(ProblemReason::NotVisible));

    let from_inside = env.find_method(scope_of(&env, secret), secret, "hidden", &[], &mut site).unwrap();
    assert!(from_inside.is_found());
}

#[test]
fn test_strict_phase_wins_before_boxing() {
    let (mut env, calls, scope) = calls(
        vec![
            MethodDecl::new("g", TypeRef::void()).param("l", TypeRef::base(BaseType::Long)),
            MethodDecl::new("g", TypeRef::void()).param("o", TypeRef::simple("Object")),
            MethodDecl::new("h", TypeRef::void()).param("i", TypeRef::simple("Integer")),
        ],
        Vec::new(),
    );
    let int = env.base_type(BaseType::Int);
    let long = env.base_type(BaseType::Long);
    let integer = get(&mut env, "java.lang.Integer");
    let object = env.object_type().unwrap();

    // int widens to long without boxing
    let widened = find(&mut env, scope, calls, "g", &[int]);
    assert_eq!(env.method(widened).parameters, vec![long]);
    // Integer reaches Object by subtyping, unboxing is never tried
    let referenced = find(&mut env, scope, calls, "g", &[integer]);
    assert_eq!(env.method(referenced).parameters, vec![object]);
    // Only boxing makes h applicable
    let boxed = find(&mut env, scope, calls, "h", &[int]);
    assert_eq!(env.method(boxed).parameters, vec![integer]);
}

#[test]
fn test_variable_arity_with_inference() {
    let (mut env, _, scope) = calls(Vec::new(), Vec::new());
    let collections = get(&mut env, "java.util.Collections");
    let string = get(&mut env, "java.lang.String");
    let list = get(&mut env, "java.util.List");

    let as_list = find(&mut env, scope, collections, "asList", &[string, string]);
    let list_of_string = env.create_parameterized_type(list, vec![string], None);
    assert_eq!(env.method(as_list).return_type, list_of_string);
    assert!(env.method(as_list).is_varargs());
    assert_eq!(env.method(as_list).type_arguments(), &[string]);
}

#[test]
fn test_inference_uses_expected_type() {
    let (mut env, _, scope) = calls(Vec::new(), Vec::new());
    let collections = get(&mut env, "java.util.Collections");
    let string = get(&mut env, "java.lang.String");
    let list = get(&mut env, "java.util.List");
    let list_of_string = env.create_parameterized_type(list, vec![string], None);

    let mut site = InvocationSite::at(0).expecting(list_of_string);
    let expected = env
        .find_method(scope, collections, "emptyList", &[], &mut site)
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(env.method(expected).return_type, list_of_string);

    let object = env.object_type().unwrap();
    let list_of_object = env.create_parameterized_type(list, vec![object], None);
    let unconstrained = find(&mut env, scope, collections, "emptyList", &[]);
    assert_eq!(env.method(unconstrained).return_type, list_of_object);
}

#[test]
fn test_inference_through_wildcard_bound() {
    let (mut env, _, scope) = calls(Vec::new(), Vec::new());
    let collections = get(&mut env, "java.util.Collections");
    let array_list = get(&mut env, "java.util.ArrayList");
    let integer = get(&mut env, "java.lang.Integer");
    let integers = env.create_parameterized_type(array_list, vec![integer], None);

    let max = find(&mut env, scope, collections, "max", &[integers]);
    assert_eq!(env.method(max).return_type, integer);
}

#[test]
fn test_explicit_type_arguments_are_checked() {
    let (mut env, _, scope) = calls(Vec::new(), Vec::new());
    let collections = get(&mut env, "java.util.Collections");
    let string = get(&mut env, "java.lang.String");
    let object = env.object_type().unwrap();
    let array_list = get(&mut env, "java.util.ArrayList");
    let objects = env.create_parameterized_type(array_list, vec![object], None);

    let mut site = InvocationSite::at(0).with_type_arguments(vec![string, string]);
    let arity = env.find_method(scope, collections, "emptyList", &[], &mut site).unwrap();
    assert_eq!(arity.problem_reason(), Some(ProblemReason::TypeParameterArityMismatch));

    let mut site = InvocationSite::at(0).with_type_arguments(vec![object]);
    let bound = env.find_method(scope, collections, "max", &[objects], &mut site).unwrap();
    assert_eq!(bound.problem_reason(), Some(ProblemReason::ParameterBoundMismatch));

    let mut site = InvocationSite::at(0).with_type_arguments(vec![string]);
    let explicit = env
        .find_method(scope, collections, "emptyList", &[], &mut site)
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(env.method(explicit).type_arguments(), &[string]);
}

#[test]
fn test_interface_methods_through_parameterized_receiver() {
    let (mut env, _, scope) = calls(Vec::new(), Vec::new());
    let list = get(&mut env, "java.util.List");
    let string = get(&mut env, "java.lang.String");
    let int = env.base_type(BaseType::Int);
    let list_of_string = env.create_parameterized_type(list, vec![string], None);

    let get_method = find(&mut env, scope, list_of_string, "get", &[int]);
    assert_eq!(env.method(get_method).return_type, string);
    // add is inherited from Collection<String>
    let add = find(&mut env, scope, list_of_string, "add", &[string]);
    assert_eq!(env.method(add).parameters, vec![string]);
    // Object members are visible through interfaces
    find(&mut env, scope, list_of_string, "hashCode", &[]);

    let integer = get(&mut env, "java.lang.Integer");
    let mut site = InvocationSite::at(0);
    let wrong = env.find_method(scope, list_of_string, "add", &[integer], &mut site).unwrap();
    assert_eq!(wrong.problem_reason(), Some(ProblemReason::NotFound));
}

#[test]
fn test_wildcard_receiver_is_captured() {
    let (mut env, _, scope) = calls(Vec::new(), Vec::new());
    let list = get(&mut env, "java.util.List");
    let number = get(&mut env, "java.lang.Number");
    let int = env.base_type(BaseType::Int);
    let wildcard = env.create_wildcard(Some(list), 0, Some(number), Vec::new(), WildcardKind::Extends);
    let numbers = env.create_parameterized_type(list, vec![wildcard], None);

    let element = find(&mut env, scope, numbers, "get", &[int]);
    let returned = env.method(element).return_type;
    assert_ne!(returned, wildcard);
    assert!(env.is_compatible_with(returned, number).unwrap());
}

#[test]
fn test_array_members() {
    let (mut env, _, scope) = calls(Vec::new(), Vec::new());
    let string = get(&mut env, "java.lang.String");
    let strings = env.create_array_type(string, 1);

    let clone = find(&mut env, scope, strings, "clone", &[]);
    assert_eq!(env.method(clone).return_type, strings);
    let mut site = InvocationSite::at(0);
    let length = env.find_field(scope, strings, "length", &mut site).unwrap().found().unwrap();
    assert_eq!(env.field(length).ty, env.base_type(BaseType::Int));
    let missing = env.find_field(scope, strings, "size", &mut site).unwrap();
    assert_eq!(missing.problem_reason(), Some(ProblemReason::NotFound));
    // Other Object methods are inherited
    find(&mut env, scope, strings, "toString", &[]);
}
