use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kiln_lookup::{
    BaseType, BinaryTypeDescriptor, CompilationUnitDecl, CompilerOptions, CompoundName, InMemoryProvider,
    InvocationSite, LookupEnvironment, MethodDecl, Modifiers, SilentReporter, TypeDecl, TypeId, TypeRef,
};

fn provider() -> InMemoryProvider {
    let public = Modifiers::PUBLIC;
    let mut provider = InMemoryProvider::new();
    provider
        .add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None))
        .add_binary(BinaryTypeDescriptor::class("java/lang/String").with_modifiers(public | Modifiers::FINAL))
        .add_binary(BinaryTypeDescriptor::class("java/lang/Number").with_modifiers(public | Modifiers::ABSTRACT))
        .add_binary(
            BinaryTypeDescriptor::class("java/lang/Integer")
                .with_modifiers(public | Modifiers::FINAL)
                .with_superclass(Some("java/lang/Number")),
        )
        .add_binary(
            BinaryTypeDescriptor::interface("java/util/List")
                .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;")
                .with_generic_method("get", public | Modifiers::ABSTRACT, "(I)Ljava/lang/Object;", "(I)TE;"),
        )
        .add_binary(
            BinaryTypeDescriptor::class("java/util/Collections").with_generic_method(
                "emptyList",
                public | Modifiers::STATIC,
                "()Ljava/util/List;",
                "<T:Ljava/lang/Object;>()Ljava/util/List<TT;>;",
            ),
        );
    provider
}

fn environment() -> LookupEnvironment {
    LookupEnvironment::new(CompilerOptions::default(), Box::new(provider()), Box::new(SilentReporter))
}

fn get(env: &mut LookupEnvironment, name: &str) -> TypeId {
    env.get_type(&CompoundName::from_dotted(name)).unwrap().unwrap()
}

fn bench_uniquing(c: &mut Criterion) {
    let mut env = environment();
    let list = get(&mut env, "java.util.List");
    let string = get(&mut env, "java.lang.String");

    c.bench_function("parameterized_cache_hit", |b| {
        b.iter(|| env.create_parameterized_type(black_box(list), vec![black_box(string)], None));
    });

    let mut group = c.benchmark_group("arrays");
    for dimensions in [1u32, 4, 16] {
        group.bench_with_input(BenchmarkId::new("create", dimensions), &dimensions, |b, &dimensions| {
            b.iter(|| env.create_array_type(black_box(string), dimensions));
        });
    }
    group.finish();
}

fn bench_overloads(c: &mut Criterion) {
    let mut group = c.benchmark_group("overloads");

    for count in [2usize, 8, 32] {
        let mut env = environment();
        let mut decl = TypeDecl::class("Calls");
        for index in 0..count {
            let parameter = if index % 2 == 0 { TypeRef::simple("Object") } else { TypeRef::simple("Number") };
            decl = decl.with_method(
                MethodDecl::new("f", TypeRef::void())
                    .param("first", parameter)
                    .param("second", TypeRef::base(BaseType::Int).array(index as u32 / 2 + 1)),
            );
        }
        decl = decl.with_method(
            MethodDecl::new("f", TypeRef::void())
                .param("first", TypeRef::simple("Integer"))
                .param("second", TypeRef::int()),
        );
        let unit = env.build_type_bindings(CompilationUnitDecl::new("Calls.java", "p").with_type(decl));
        env.complete_type_bindings().unwrap();
        let calls = env.unit_types(unit)[0];
        let scope = env.class_scope(calls).unwrap();
        let integer = get(&mut env, "java.lang.Integer");
        let int = env.base_type(BaseType::Int);

        group.bench_with_input(BenchmarkId::new("find_method", count), &count, |b, _| {
            b.iter(|| {
                let mut site = InvocationSite::at(0);
                env.find_method(scope, calls, "f", black_box(&[integer, int]), &mut site).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_inference(c: &mut Criterion) {
    let mut env = environment();
    let collections = get(&mut env, "java.util.Collections");
    let list = get(&mut env, "java.util.List");
    let string = get(&mut env, "java.lang.String");
    let expected = env.create_parameterized_type(list, vec![string], None);
    let unit = env.build_type_bindings(CompilationUnitDecl::new("Use.java", "p").with_type(TypeDecl::class("Use")));
    env.complete_type_bindings().unwrap();
    let scope = env.class_scope(env.unit_types(unit)[0]).unwrap();

    c.bench_function("infer_from_expected_type", |b| {
        b.iter(|| {
            let mut site = InvocationSite::at(0).expecting(black_box(expected));
            env.find_method(scope, collections, "emptyList", &[], &mut site).unwrap()
        });
    });
}

criterion_group!(benches, bench_uniquing, bench_overloads, bench_inference);
criterion_main!(benches);
