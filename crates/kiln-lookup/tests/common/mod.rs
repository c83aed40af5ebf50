//! Shared fixtures: a miniature `java.lang` / `java.util` class path

#![allow(dead_code)]

use kiln_lookup::{
    BinaryTypeDescriptor, CollectingReporter, CompilationUnitDecl, CompilerOptions, CompoundName, InMemoryProvider,
    LookupEnvironment, Modifiers, ScopeId, TypeId, UnitId,
};

const OBJECT: &str = "java/lang/Object";

/// Binary descriptors for the handful of platform types the tests need
pub fn platform() -> InMemoryProvider {
    let public = Modifiers::PUBLIC;
    let mut provider = InMemoryProvider::new();
    provider
        .add_binary(
            BinaryTypeDescriptor::class(OBJECT)
                .with_superclass(None)
                .with_method("<init>", public, "()V")
                .with_method("toString", public, "()Ljava/lang/String;")
                .with_method("equals", public, "(Ljava/lang/Object;)Z")
                .with_method("hashCode", public, "()I"),
        )
        .add_binary(BinaryTypeDescriptor::interface("java/lang/Cloneable"))
        .add_binary(BinaryTypeDescriptor::interface("java/io/Serializable"))
        .add_binary(
            BinaryTypeDescriptor::interface("java/lang/Comparable")
                .with_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
                .with_generic_method(
                    "compareTo",
                    public | Modifiers::ABSTRACT,
                    "(Ljava/lang/Object;)I",
                    "(TT;)I",
                ),
        )
        .add_binary(
            BinaryTypeDescriptor::class("java/lang/String")
                .with_modifiers(public | Modifiers::FINAL)
                .with_interface("java/io/Serializable")
                .with_interface("java/lang/Comparable")
                .with_signature("Ljava/lang/Object;Ljava/io/Serializable;Ljava/lang/Comparable<Ljava/lang/String;>;")
                .with_method("length", public, "()I")
                .with_method("valueOf", public | Modifiers::STATIC, "(I)Ljava/lang/String;")
                .with_method("valueOf", public | Modifiers::STATIC, "(Ljava/lang/Object;)Ljava/lang/String;"),
        )
        .add_binary(
            BinaryTypeDescriptor::class("java/lang/Number")
                .with_modifiers(public | Modifiers::ABSTRACT)
                .with_interface("java/io/Serializable")
                .with_method("intValue", public | Modifiers::ABSTRACT, "()I"),
        )
        .add_binary(
            BinaryTypeDescriptor::class("java/lang/Integer")
                .with_modifiers(public | Modifiers::FINAL)
                .with_superclass(Some("java/lang/Number"))
                .with_interface("java/lang/Comparable")
                .with_signature("Ljava/lang/Number;Ljava/lang/Comparable<Ljava/lang/Integer;>;")
                .with_field("MAX_VALUE", public | Modifiers::STATIC | Modifiers::FINAL, "I")
                .with_method("intValue", public, "()I"),
        )
        .add_binary(
            BinaryTypeDescriptor::class("java/lang/Long")
                .with_modifiers(public | Modifiers::FINAL)
                .with_superclass(Some("java/lang/Number"))
                .with_interface("java/lang/Comparable")
                .with_signature("Ljava/lang/Number;Ljava/lang/Comparable<Ljava/lang/Long;>;"),
        )
        .add_binary(
            BinaryTypeDescriptor::class("java/lang/Enum")
                .with_modifiers(public | Modifiers::ABSTRACT)
                .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<TE;>;")
                .with_interface("java/lang/Comparable"),
        )
        .add_binary(BinaryTypeDescriptor::interface("java/lang/annotation/Annotation"))
        .add_binary(
            BinaryTypeDescriptor::interface("java/lang/Iterable")
                .with_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;"),
        )
        .add_binary(
            BinaryTypeDescriptor::interface("java/util/Collection")
                .with_interface("java/lang/Iterable")
                .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Iterable<TE;>;")
                .with_generic_method("add", public | Modifiers::ABSTRACT, "(Ljava/lang/Object;)Z", "(TE;)Z")
                .with_method("size", public | Modifiers::ABSTRACT, "()I"),
        )
        .add_binary(
            BinaryTypeDescriptor::interface("java/util/List")
                .with_interface("java/util/Collection")
                .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Collection<TE;>;")
                .with_generic_method("get", public | Modifiers::ABSTRACT, "(I)Ljava/lang/Object;", "(I)TE;"),
        )
        .add_binary(
            BinaryTypeDescriptor::class("java/util/ArrayList")
                .with_interface("java/util/List")
                .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/List<TE;>;")
                .with_method("<init>", public, "()V")
                .with_generic_method("get", public, "(I)Ljava/lang/Object;", "(I)TE;")
                .with_generic_method("add", public, "(Ljava/lang/Object;)Z", "(TE;)Z")
                .with_method("size", public, "()I"),
        )
        .add_binary(
            BinaryTypeDescriptor::class("java/util/Collections")
                .with_generic_method(
                    "emptyList",
                    public | Modifiers::STATIC,
                    "()Ljava/util/List;",
                    "<T:Ljava/lang/Object;>()Ljava/util/List<TT;>;",
                )
                .with_generic_method(
                    "max",
                    public | Modifiers::STATIC,
                    "(Ljava/util/Collection;)Ljava/lang/Object;",
                    "<T::Ljava/lang/Comparable<-TT;>;>(Ljava/util/Collection<+TT;>;)TT;",
                )
                .with_generic_method(
                    "asList",
                    public | Modifiers::STATIC | Modifiers::VARARGS,
                    "([Ljava/lang/Object;)Ljava/util/List;",
                    "<T:Ljava/lang/Object;>([TT;)Ljava/util/List<TT;>;",
                ),
        );
    provider
}

/// Environment over the platform types, reporting into a shared collector
pub fn env() -> (LookupEnvironment, CollectingReporter) {
    env_with(platform())
}

/// Environment over a custom provider
pub fn env_with(provider: InMemoryProvider) -> (LookupEnvironment, CollectingReporter) {
    env_with_options(CompilerOptions::default(), provider)
}

/// Environment over a custom provider with explicit options
pub fn env_with_options(options: CompilerOptions, provider: InMemoryProvider) -> (LookupEnvironment, CollectingReporter) {
    let reporter = CollectingReporter::new();
    let env = LookupEnvironment::new(options, Box::new(provider), Box::new(reporter.clone()));
    (env, reporter)
}

/// Known type by dotted name; panics when missing
pub fn get(env: &mut LookupEnvironment, dotted: &str) -> TypeId {
    env.get_type(&CompoundName::from_dotted(dotted))
        .expect("lookup aborted")
        .unwrap_or_else(|| panic!("type {dotted} not found"))
}

/// Register a unit, run the pipeline and return the unit's top-level types
pub fn compile(env: &mut LookupEnvironment, unit: CompilationUnitDecl) -> (UnitId, Vec<TypeId>) {
    let id = env.build_type_bindings(unit);
    env.complete_type_bindings().expect("pipeline aborted");
    let types = env.unit_types(id).to_vec();
    (id, types)
}

/// Class scope of a source type
pub fn scope_of(env: &LookupEnvironment, ty: TypeId) -> ScopeId {
    env.class_scope(ty).expect("source type without scope")
}
