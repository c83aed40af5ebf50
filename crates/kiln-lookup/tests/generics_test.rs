//! Generics tests
//!
//! Wildcard containment, declared bounds on source types, substitution
//! through inherited parameterized and raw supertypes, and type joins.

mod common;

use common::{compile, env, env_with_options, get, platform, scope_of};
use kiln_lookup::decl::TypeArgRef;
use kiln_lookup::{
    BaseType, CompilationUnitDecl, CompilerOptions, FieldDecl, InvocationSite, MethodDecl, Modifiers, ProblemId, TypeDecl, TypeRef,
    WildcardKind,
};

#[test]
fn test_wildcard_containment() {
    let (mut env, _) = env();
    let list = get(&mut env, "java.util.List");
    let number = get(&mut env, "java.lang.Number");
    let integer = get(&mut env, "java.lang.Integer");
    let string = get(&mut env, "java.lang.String");
    let object = env.object_type().unwrap();

    let extends_number = env.create_wildcard(Some(list), 0, Some(number), Vec::new(), WildcardKind::Extends);
    assert!(env.wildcard_bound_check(extends_number, integer).unwrap());
    assert!(env.wildcard_bound_check(extends_number, number).unwrap());
    assert!(!env.wildcard_bound_check(extends_number, string).unwrap());
    assert!(!env.wildcard_bound_check(extends_number, object).unwrap());

    let super_integer = env.create_wildcard(Some(list), 0, Some(integer), Vec::new(), WildcardKind::Super);
    assert!(env.wildcard_bound_check(super_integer, number).unwrap());
    assert!(env.wildcard_bound_check(super_integer, object).unwrap());
    assert!(!env.wildcard_bound_check(super_integer, string).unwrap());

    let unbound = env.create_wildcard(Some(list), 0, None, Vec::new(), WildcardKind::Unbound);
    assert!(env.wildcard_bound_check(unbound, string).unwrap());
}

#[test]
fn test_parameterized_subtyping_is_invariant() {
    let (mut env, _) = env();
    let list = get(&mut env, "java.util.List");
    let array_list = get(&mut env, "java.util.ArrayList");
    let collection = get(&mut env, "java.util.Collection");
    let number = get(&mut env, "java.lang.Number");
    let integer = get(&mut env, "java.lang.Integer");

    let integers = env.create_parameterized_type(array_list, vec![integer], None);
    let list_of_integer = env.create_parameterized_type(list, vec![integer], None);
    let list_of_number = env.create_parameterized_type(list, vec![number], None);
    let extends_number = env.create_wildcard(Some(collection), 0, Some(number), Vec::new(), WildcardKind::Extends);
    let collection_of_numbers = env.create_parameterized_type(collection, vec![extends_number], None);
    let raw_list = env.create_raw_type(list, None);

    assert!(env.is_compatible_with(integers, list_of_integer).unwrap());
    assert!(!env.is_compatible_with(integers, list_of_number).unwrap());
    assert!(env.is_compatible_with(integers, collection_of_numbers).unwrap());
    // Unchecked conversion in both directions
    assert!(env.is_compatible_with(integers, raw_list).unwrap());
    assert!(env.is_compatible_with(raw_list, list_of_number).unwrap());

    let collection_of_integer = env.create_parameterized_type(collection, vec![integer], None);
    assert_eq!(env.as_super_type(integers, collection).unwrap(), Some(collection_of_integer));
}

#[test]
fn test_source_type_argument_outside_bound_is_reported() {
    let (mut env, reporter) = env();
    let boxed = |name: &str| TypeRef::simple("Box").with_args(vec![TypeArgRef::from(TypeRef::simple(name))]);
    let unit = CompilationUnitDecl::new("Box.java", "p")
        .with_type(TypeDecl::class("Box").with_type_parameter("T", vec![TypeRef::simple("Number")]))
        .with_type(
            TypeDecl::class("Use")
                .with_field(FieldDecl::new("good", Modifiers::empty(), boxed("Integer")))
                .with_field(FieldDecl::new("bad", Modifiers::empty(), boxed("String"))),
        );
    compile(&mut env, unit);

    let mismatches = reporter.problems_with(ProblemId::TypeArgumentMismatch);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].arguments[0], "java.lang.String");
    assert_eq!(mismatches[0].arguments[1], "T");
}

#[test]
fn test_bound_checked_in_supertype_reference() {
    let (mut env, reporter) = env();
    let unit = CompilationUnitDecl::new("Sorted.java", "p")
        .with_type(
            TypeDecl::class("Sorted")
                .with_type_parameter("T", vec![TypeRef::simple("Comparable").with_args(vec![TypeArgRef::from(TypeRef::simple("T"))])]),
        )
        .with_type(TypeDecl::class("Numbers").extends(TypeRef::simple("Sorted").with_args(vec![TypeArgRef::from(TypeRef::simple("Number"))])))
        .with_type(TypeDecl::class("Names").extends(TypeRef::simple("Sorted").with_args(vec![TypeArgRef::from(TypeRef::simple("String"))])));
    compile(&mut env, unit);
    assert_eq!(reporter.count(ProblemId::TypeArgumentMismatch), 1);
}

#[test]
fn test_members_of_parameterized_and_raw_superclass() {
    let (mut env, _) = env();
    let unit = CompilationUnitDecl::new("Lists.java", "p")
        .with_type(
            TypeDecl::class("Strings")
                .extends(TypeRef::simple("ArrayList").with_args(vec![TypeArgRef::from(TypeRef::simple("String"))])),
        )
        .with_type(TypeDecl::class("Anything").extends(TypeRef::simple("ArrayList")))
        .with_import(kiln_lookup::ImportDecl::on_demand("java.util"));
    let (_, types) = compile(&mut env, unit);
    let (strings, anything) = (types[0], types[1]);
    let scope = scope_of(&env, strings);
    let int = env.base_type(BaseType::Int);
    let string = get(&mut env, "java.lang.String");
    let object = env.object_type().unwrap();

    let mut site = InvocationSite::at(0);
    let typed = env.find_method(scope, strings, "get", &[int], &mut site).unwrap().found().unwrap();
    assert_eq!(env.method(typed).return_type, string);

    let erased = env.find_method(scope, anything, "get", &[int], &mut site).unwrap().found().unwrap();
    assert_eq!(env.method(erased).return_type, object);
    assert!(env.method(erased).is_raw);
    // A raw receiver accepts any reference for the erased parameter
    let add = env.find_method(scope, anything, "add", &[string], &mut site).unwrap().found().unwrap();
    assert_eq!(env.method(add).parameters, vec![object]);
}

#[test]
fn test_generic_source_method_is_inferred() {
    let (mut env, _) = env();
    let unit = CompilationUnitDecl::new("Pick.java", "p").with_type(
        TypeDecl::class("Pick").with_method(
            MethodDecl::new("either", TypeRef::simple("T"))
                .with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
                .with_type_parameter("T", vec![TypeRef::simple("Number")])
                .param("a", TypeRef::simple("T"))
                .param("b", TypeRef::simple("T")),
        ),
    );
    let (_, types) = compile(&mut env, unit);
    let pick = types[0];
    let scope = scope_of(&env, pick);
    let integer = get(&mut env, "java.lang.Integer");
    let number = get(&mut env, "java.lang.Number");
    let string = get(&mut env, "java.lang.String");

    let mut site = InvocationSite::at(0);
    let same = env.find_method(scope, pick, "either", &[integer, integer], &mut site).unwrap().found().unwrap();
    assert_eq!(env.method(same).return_type, integer);

    // Lower bounds are joined
    let mixed = env.find_method(scope, pick, "either", &[integer, number], &mut site).unwrap().found().unwrap();
    assert_eq!(env.method(mixed).return_type, number);

    let rejected = env.find_method(scope, pick, "either", &[string, string], &mut site).unwrap();
    assert!(!rejected.is_found());
}

#[test]
fn test_lub_prefers_parameterized_common_supertype() {
    let (mut env, _) = env();
    let list = get(&mut env, "java.util.List");
    let array_list = get(&mut env, "java.util.ArrayList");
    let string = get(&mut env, "java.lang.String");
    let strings = env.create_parameterized_type(array_list, vec![string], None);
    let list_of_string = env.create_parameterized_type(list, vec![string], None);

    assert_eq!(env.lower_upper_bound(&[strings, list_of_string]).unwrap(), Some(list_of_string));
}

#[test]
fn test_capture_of_super_wildcard_accepts_lower_bound() {
    let (mut env, _) = env();
    let list = get(&mut env, "java.util.List");
    let integer = get(&mut env, "java.lang.Integer");
    let super_integer = env.create_wildcard(Some(list), 0, Some(integer), Vec::new(), WildcardKind::Super);
    let sink = env.create_parameterized_type(list, vec![super_integer], None);

    let captured = env.capture(sink, 42).unwrap();
    assert_eq!(env.capture(sink, 42).unwrap(), captured);
    let argument = env.ty(captured).as_parameterized().unwrap().arguments[0];
    assert!(env.is_compatible_with(integer, argument).unwrap());
    assert!(env.is_compatible_with(captured, sink).unwrap());
}

fn type_safety_unit() -> CompilationUnitDecl {
    let comparable_of = |name: &str| TypeRef::simple("Comparable").with_args(vec![TypeArgRef::from(TypeRef::simple(name))]);
    let list_of_string = TypeRef::simple("List").with_args(vec![TypeArgRef::from(TypeRef::simple("String"))]);
    CompilationUnitDecl::new("Sorted.java", "p")
        .with_import(kiln_lookup::ImportDecl::on_demand("java.util"))
        .with_type(TypeDecl::class("Sorted").with_type_parameter("T", vec![comparable_of("T")]))
        .with_type(TypeDecl::class("Loose").implements(TypeRef::simple("Comparable")))
        .with_type(
            TypeDecl::class("Use")
                .with_field(FieldDecl::new(
                    "loose",
                    Modifiers::empty(),
                    TypeRef::simple("Sorted").with_args(vec![TypeArgRef::from(TypeRef::simple("Loose"))]),
                ))
                .with_method(
                    MethodDecl::new("take", TypeRef::void())
                        .with_modifiers(Modifiers::PUBLIC)
                        .param("names", list_of_string),
                ),
        )
}

/// Compiles the unit, then calls `Use.take(ArrayList)` and raw `ArrayList.add(String)`
fn run_type_safety_checks(options: CompilerOptions) -> kiln_lookup::CollectingReporter {
    let (mut env, reporter) = env_with_options(options, platform());
    let (_, types) = compile(&mut env, type_safety_unit());
    let user = types[2];
    let scope = scope_of(&env, user);
    let array_list = get(&mut env, "java.util.ArrayList");
    let string = get(&mut env, "java.lang.String");
    let raw_list = env.create_raw_type(array_list, None);

    let mut site = InvocationSite::at(0);
    assert!(env.find_method(scope, user, "take", &[raw_list], &mut site).unwrap().is_found());
    assert!(env.find_method(scope, raw_list, "add", &[string], &mut site).unwrap().is_found());
    reporter
}

#[test]
fn test_unchecked_operations_are_reported_by_default() {
    let reporter = run_type_safety_checks(CompilerOptions::default());

    let arguments = reporter.problems_with(ProblemId::UncheckedTypeArgument);
    assert_eq!(arguments.len(), 1);
    assert_eq!(arguments[0].arguments[0], "p.Loose");
    assert_eq!(arguments[0].arguments[1], "T");
    assert_eq!(reporter.count(ProblemId::UncheckedConversion), 1);
    assert_eq!(reporter.count(ProblemId::UncheckedRawMemberCall), 1);
    assert_eq!(reporter.count(ProblemId::TypeArgumentMismatch), 0);
}

#[test]
fn test_unchecked_reporting_can_be_disabled() {
    let options = CompilerOptions {
        report_unchecked: false,
        ..CompilerOptions::default()
    };
    let reporter = run_type_safety_checks(options);

    assert_eq!(reporter.count(ProblemId::UncheckedTypeArgument), 0);
    assert_eq!(reporter.count(ProblemId::UncheckedConversion), 0);
    assert_eq!(reporter.count(ProblemId::UncheckedRawMemberCall), 0);
    assert_eq!(reporter.count(ProblemId::TypeArgumentMismatch), 0);
}

#[test]
fn test_member_chain_through_raw_receiver_stays_erased() {
    let (mut env, _) = env();
    let chained = TypeRef::simple("Chain").with_args(vec![TypeArgRef::from(TypeRef::simple("T"))]);
    let unit = CompilationUnitDecl::new("Chain.java", "p").with_type(
        TypeDecl::class("Chain")
            .with_type_parameter("T", vec![TypeRef::simple("Number")])
            .with_field(FieldDecl::new("rest", Modifiers::PUBLIC, chained.clone()))
            .with_method(MethodDecl::new("next", chained).with_modifiers(Modifiers::PUBLIC))
            .with_method(MethodDecl::new("head", TypeRef::simple("T")).with_modifiers(Modifiers::PUBLIC)),
    );
    let (_, types) = compile(&mut env, unit);
    let chain = types[0];
    let scope = scope_of(&env, chain);
    let number = get(&mut env, "java.lang.Number");
    let raw = env.create_raw_type(chain, None);

    let mut site = InvocationSite::at(0);
    let mut receiver = raw;
    for _ in 0..2 {
        let next = env.find_method(scope, receiver, "next", &[], &mut site).unwrap().found().unwrap();
        receiver = env.method(next).return_type;
        assert_eq!(receiver, raw);
    }
    let rest = env.find_field(scope, receiver, "rest", &mut site).unwrap().found().unwrap();
    assert_eq!(env.field(rest).ty, raw);

    // The erased variable answers its bound, never the variable itself
    let tail = env.field(rest).ty;
    let head = env.find_method(scope, tail, "head", &[], &mut site).unwrap().found().unwrap();
    let head_type = env.method(head).return_type;
    assert_eq!(head_type, number);
    assert!(!env.ty(head_type).is_type_variable_like());
}
