//! Kiln Lookup
//!
//! Binding resolution for a Java-like language: the lookup environment,
//! lazy binary type completion, hierarchy connection, scoped name and
//! member lookup, and the generics engine.

#![warn(missing_docs)]

pub mod binding;
pub mod decl;
pub mod env;
pub mod error;
pub mod generics;
pub mod hierarchy;
pub mod lookup;
pub mod names;
pub mod options;
pub mod provider;
pub mod reporter;
pub mod scope;
pub mod signature;

pub use binding::{
    BaseType, Binding, BindingMask, ClassBinding, FieldBinding, FieldId, LocalId, MethodBinding, MethodId,
    MethodOrigin, Modifiers, PackageId, ScopeId, TypeBinding, TypeId, TypeState, UnitId, WildcardKind,
};
pub use decl::{CompilationUnitDecl, FieldDecl, ImportDecl, MethodDecl, ParameterDecl, TypeArgRef, TypeDecl, TypeRef};
pub use env::{CompletedUnit, CompletionStage, EnvironmentStats, LookupEnvironment};
pub use error::{AbortCompilation, LookupResult, ProblemBinding, ProblemReason, Resolution};
pub use generics::{BoundCheck, CombinedBounds, Substitution};
pub use lookup::{CompatibilityPhase, InvocationSite};
pub use names::CompoundName;
pub use options::{CompilerOptions, LanguageLevel};
pub use provider::{BinaryTypeDescriptor, InMemoryProvider, ProvidedType, SymbolProvider};
pub use reporter::{CollectingReporter, Problem, ProblemId, ProblemReporter, SilentReporter};
