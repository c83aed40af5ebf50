//! Lookup environment
//!
//! The environment is the per-compilation registry. It owns every binding
//! arena, the package tree, the uniquing caches and the staged completion
//! pipeline, and it is the only component that talks to the
//! [`SymbolProvider`].

pub mod binary;
pub mod members;
pub mod pipeline;
pub mod placeholder;
pub mod uniquing;

pub use pipeline::{CompletedUnit, CompletionStage};

use crate::binding::{
    BaseType, ClassBinding, FieldBinding, FieldId, LocalId, LocalVariableBinding, MethodBinding,
    MethodId, PackageBinding, PackageId, ProblemTypeBinding, ScopeId, TypeBinding, TypeId, UnitId,
};
use crate::decl::CompilationUnitDecl;
use crate::error::{AbortCompilation, LookupResult, ProblemReason};
use crate::names::{well_known, CompoundName};
use crate::options::CompilerOptions;
use crate::provider::{ProvidedType, SymbolProvider};
use crate::reporter::{Problem, ProblemId, ProblemReporter};
use crate::scope::Scope;
use pipeline::UnitRecord;
use placeholder::Referrer;
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;
use tracing::{debug, trace};
use uniquing::UniquingCaches;

/// Counters describing the work the environment did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentStats {
    /// Binary types whose fields and methods were built
    pub binary_member_completions: u32,
    /// Binary superclass or superinterface lists that were built
    pub binary_supertype_completions: u32,
    /// Binary member type lists that were built
    pub binary_member_type_completions: u32,
    /// Placeholders swapped for their resolved type
    pub placeholder_resolutions: u32,
    /// Calls into the symbol provider
    pub provider_requests: u32,
    /// Constructed-type requests answered from a cache
    pub constructed_cache_hits: u32,
    /// Constructed-type requests that allocated a new binding
    pub constructed_cache_misses: u32,
    /// Units that went through all pipeline stages
    pub units_completed: u32,
}

/// Per-compilation binding registry
pub struct LookupEnvironment {
    options: CompilerOptions,
    provider: Box<dyn SymbolProvider>,
    reporter: Box<dyn ProblemReporter>,
    pub(crate) types: Vec<TypeBinding>,
    pub(crate) methods: Vec<MethodBinding>,
    pub(crate) fields: Vec<FieldBinding>,
    pub(crate) packages: Vec<PackageBinding>,
    pub(crate) locals: Vec<LocalVariableBinding>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) units: Vec<UnitRecord>,
    pub(crate) unit_decls: FxHashMap<UnitId, Rc<CompilationUnitDecl>>,
    pub(crate) pending_units: Vec<UnitId>,
    pub(crate) pipeline_stage: Option<CompletionStage>,
    pub(crate) caches: UniquingCaches,
    pub(crate) referrers: FxHashMap<TypeId, Vec<Referrer>>,
    pub(crate) captures: FxHashMap<(TypeId, u32), TypeId>,
    pub(crate) capture_sequence: u32,
    pub(crate) deferred_bound_checks: Option<Vec<TypeId>>,
    pub(crate) connecting_supertypes: FxHashMap<TypeId, TypeId>,
    pub(crate) method_scopes: FxHashMap<MethodId, ScopeId>,
    pub(crate) compat_guard: FxHashSet<(TypeId, TypeId)>,
    // Unchecked conversions accepted so far; compared before and after a check
    pub(crate) unchecked_conversions: u64,
    pub(crate) lub_depth: u32,
    object: Option<TypeId>,
    default_package: PackageId,
    pub(crate) stats: EnvironmentStats,
}

impl LookupEnvironment {
    /// Create an environment with base types pre-interned
    pub fn new(
        options: CompilerOptions,
        provider: Box<dyn SymbolProvider>,
        reporter: Box<dyn ProblemReporter>,
    ) -> Self {
        let mut env = LookupEnvironment {
            options,
            provider,
            reporter,
            types: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            packages: Vec::new(),
            locals: Vec::new(),
            scopes: Vec::new(),
            units: Vec::new(),
            unit_decls: FxHashMap::default(),
            pending_units: Vec::new(),
            pipeline_stage: None,
            caches: UniquingCaches::default(),
            referrers: FxHashMap::default(),
            captures: FxHashMap::default(),
            capture_sequence: 0,
            deferred_bound_checks: None,
            connecting_supertypes: FxHashMap::default(),
            method_scopes: FxHashMap::default(),
            compat_guard: FxHashSet::default(),
            unchecked_conversions: 0,
            lub_depth: 0,
            object: None,
            default_package: PackageId::new(0),
            stats: EnvironmentStats::default(),
        };
        env.intern_base_types();
        env
    }

    fn intern_base_types(&mut self) {
        for base in BaseType::ALL {
            self.types.push(TypeBinding::Base(base));
        }
        self.packages.push(PackageBinding::new(CompoundName::default(), None));
        self.default_package = PackageId::new(0);
    }

    /// Drop every binding, cache and unit; options and collaborators are kept
    pub fn reset(&mut self) {
        debug!(types = self.types.len(), units = self.units.len(), "resetting lookup environment");
        self.types.clear();
        self.methods.clear();
        self.fields.clear();
        self.packages.clear();
        self.locals.clear();
        self.scopes.clear();
        self.units.clear();
        self.unit_decls.clear();
        self.pending_units.clear();
        self.pipeline_stage = None;
        self.caches = UniquingCaches::default();
        self.referrers.clear();
        self.captures.clear();
        self.capture_sequence = 0;
        self.deferred_bound_checks = None;
        self.connecting_supertypes.clear();
        self.method_scopes.clear();
        self.compat_guard.clear();
        self.unchecked_conversions = 0;
        self.lub_depth = 0;
        self.object = None;
        self.stats = EnvironmentStats::default();
        self.intern_base_types();
    }

    /// Options this environment was created with
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Work counters
    pub fn stats(&self) -> EnvironmentStats {
        self.stats
    }

    /// Number of type bindings allocated so far
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Type binding behind a handle
    pub fn ty(&self, id: TypeId) -> &TypeBinding {
        &self.types[id.index()]
    }

    pub(crate) fn ty_mut(&mut self, id: TypeId) -> &mut TypeBinding {
        &mut self.types[id.index()]
    }

    /// Class payload of a handle, if it is a class
    pub fn class(&self, id: TypeId) -> Option<&ClassBinding> {
        self.ty(id).as_class()
    }

    pub(crate) fn class_mut(&mut self, id: TypeId) -> Option<&mut ClassBinding> {
        self.ty_mut(id).as_class_mut()
    }

    /// Method binding behind a handle
    pub fn method(&self, id: MethodId) -> &MethodBinding {
        &self.methods[id.index()]
    }

    /// Field binding behind a handle
    pub fn field(&self, id: FieldId) -> &FieldBinding {
        &self.fields[id.index()]
    }

    /// Package binding behind a handle
    pub fn package(&self, id: PackageId) -> &PackageBinding {
        &self.packages[id.index()]
    }

    /// Local variable behind a handle
    pub fn local(&self, id: LocalId) -> &LocalVariableBinding {
        &self.locals[id.index()]
    }

    /// Scope behind a handle
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Pre-interned handle of a base type
    pub fn base_type(&self, base: BaseType) -> TypeId {
        TypeId::new(base.index())
    }

    /// The default (unnamed) package
    pub fn default_package(&self) -> PackageId {
        self.default_package
    }

    pub(crate) fn alloc_type(&mut self, binding: TypeBinding) -> TypeId {
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(binding);
        id
    }

    pub(crate) fn alloc_method(&mut self, binding: MethodBinding) -> MethodId {
        let id = MethodId::new(self.methods.len() as u32);
        self.methods.push(binding);
        id
    }

    pub(crate) fn alloc_field(&mut self, binding: FieldBinding) -> FieldId {
        let id = FieldId::new(self.fields.len() as u32);
        self.fields.push(binding);
        id
    }

    pub(crate) fn alloc_local(&mut self, binding: LocalVariableBinding) -> LocalId {
        let id = LocalId::new(self.locals.len() as u32);
        self.locals.push(binding);
        id
    }

    pub(crate) fn alloc_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        if let Some(parent) = scope.parent {
            self.scopes[parent.index()].children.push(id);
        }
        self.scopes.push(scope);
        id
    }

    pub(crate) fn method_mut(&mut self, id: MethodId) -> &mut MethodBinding {
        &mut self.methods[id.index()]
    }

    pub(crate) fn report(&mut self, id: ProblemId, arguments: Vec<String>) {
        trace!(code = id.code(), ?arguments, "problem reported");
        self.reporter.report(Problem::new(id, arguments));
    }

    /// Problem type carrying a reason; never uniqued
    pub fn create_problem_type(
        &mut self,
        name: CompoundName,
        reason: ProblemReason,
        closest_match: Option<TypeId>,
    ) -> TypeId {
        self.alloc_type(TypeBinding::Problem(ProblemTypeBinding {
            name,
            reason,
            closest_match,
        }))
    }

    /// Package with the given name, created (with its parents) if missing
    pub fn create_package(&mut self, name: &CompoundName) -> PackageId {
        let mut current = self.default_package;
        for (i, segment) in name.segments().iter().enumerate() {
            current = match self.packages[current.index()].known_package(segment) {
                Some(existing) => existing,
                None => {
                    let child = PackageId::new(self.packages.len() as u32);
                    let compound = CompoundName::new(name.segments()[..=i].to_vec());
                    let parent = if i == 0 { None } else { Some(current) };
                    self.packages.push(PackageBinding::new(compound, parent));
                    self.packages[current.index()]
                        .known_packages
                        .insert(segment.clone(), child);
                    child
                }
            };
        }
        current
    }

    /// Existing package with the given name, consulting the provider for unknown ones
    pub fn get_package(&mut self, name: &CompoundName) -> Option<PackageId> {
        let mut current = self.default_package;
        for (i, segment) in name.segments().iter().enumerate() {
            current = match self.packages[current.index()].known_package(segment) {
                Some(existing) => existing,
                None => {
                    let prefix = CompoundName::new(name.segments()[..=i].to_vec());
                    if !self.provider.is_package(&prefix) {
                        return None;
                    }
                    self.create_package(&prefix)
                }
            };
        }
        Some(current)
    }

    /// Type with the given fully qualified name
    ///
    /// Known types are answered from the package tree; unknown ones are
    /// requested from the provider once. Member types can be named either
    /// by source name (`p.Outer.Inner`) or by binary name (`p.Outer$Inner`).
    pub fn get_type(&mut self, name: &CompoundName) -> LookupResult<Option<TypeId>> {
        let Some(simple) = name.last() else {
            return Ok(None);
        };
        let simple = simple.to_string();
        let package_name = name.parent();
        match self.get_package(&package_name) {
            Some(package) => {
                if let Some(known) = self.packages[package.index()].known_type(&simple) {
                    return self.resolved_real(known);
                }
                if self.packages[package.index()].missing_types.contains(&simple) {
                    return Ok(None);
                }
                self.ask_for_type(name)
            }
            None => {
                if package_name.is_empty() {
                    return Ok(None);
                }
                let Some(enclosing) = self.get_type(&package_name)? else {
                    return Ok(None);
                };
                self.direct_member_type(enclosing, &simple)
            }
        }
    }

    /// Request a type from the provider and build its binding
    pub fn ask_for_type(&mut self, name: &CompoundName) -> LookupResult<Option<TypeId>> {
        self.fetch_from_provider(name)?;
        let simple = name.last().unwrap_or_default().to_string();
        let package = self.create_package(&name.parent());
        match self.packages[package.index()].known_type(&simple) {
            Some(found) => self.resolved_real(found),
            None => {
                self.packages[package.index()].missing_types.insert(simple);
                Ok(None)
            }
        }
    }

    /// Ask the provider for `name` and build whatever it answers with
    pub(crate) fn fetch_from_provider(&mut self, name: &CompoundName) -> LookupResult<()> {
        self.stats.provider_requests += 1;
        trace!(name = %name, "asking provider for type");
        match self.provider.find_type(name) {
            None => {
                let simple = name.last().unwrap_or_default().to_string();
                if let Some(package) = self.get_package(&name.parent()) {
                    self.packages[package.index()].missing_types.insert(simple);
                }
            }
            Some(ProvidedType::Binary(descriptor)) => {
                self.create_binary_type(descriptor)?;
            }
            Some(ProvidedType::SourceUnit(unit)) => {
                self.accept_provided_unit(unit)?;
            }
            Some(ProvidedType::SourceDeclarations { package, types }) => {
                let unit = crate::decl::CompilationUnitDecl {
                    file_name: format!("{}.declarations", package.dotted()),
                    package,
                    imports: Vec::new(),
                    types,
                };
                self.accept_provided_unit(unit)?;
            }
        }
        Ok(())
    }

    // Resolved type behind a registry entry; problem types count as absent
    fn resolved_real(&mut self, id: TypeId) -> LookupResult<Option<TypeId>> {
        let target = self.resolved(id)?;
        Ok((!self.ty(target).is_problem()).then_some(target))
    }

    /// Follow a resolved placeholder, resolving it first if needed
    pub fn resolved(&mut self, id: TypeId) -> LookupResult<TypeId> {
        match self.ty(id) {
            TypeBinding::Unresolved(unresolved) => match unresolved.resolved {
                Some(target) => Ok(target),
                None => self.resolve_placeholder(id),
            },
            _ => Ok(id),
        }
    }

    /// `java.lang.Object`; its absence aborts the compilation
    pub fn object_type(&mut self) -> LookupResult<TypeId> {
        if let Some(object) = self.object {
            return Ok(object);
        }
        let name = CompoundName::from_dotted(well_known::JAVA_LANG_OBJECT);
        match self.get_type(&name)? {
            Some(object) if self.class(object).is_some() => {
                self.object = Some(object);
                Ok(object)
            }
            _ => Err(AbortCompilation::MissingFoundationType {
                name: well_known::JAVA_LANG_OBJECT.to_string(),
            }),
        }
    }

    /// True when `id` is `java.lang.Object`
    pub fn is_object(&self, id: TypeId) -> bool {
        self.object == Some(id)
            || self
                .class(id)
                .is_some_and(|class| class.compound_name.dotted() == well_known::JAVA_LANG_OBJECT)
    }

    /// Well-known type by dotted name; missing ones are not fatal
    pub fn well_known_type(&mut self, dotted: &str) -> LookupResult<Option<TypeId>> {
        self.get_type(&CompoundName::from_dotted(dotted))
    }

    /// Wrapper class of a primitive
    pub fn boxed_type(&mut self, base: BaseType) -> LookupResult<Option<TypeId>> {
        match base.box_name() {
            Some(name) => self.well_known_type(name),
            None => Ok(None),
        }
    }

    /// Primitive wrapped by a wrapper class (or its parameterization)
    pub fn unboxed_base(&self, id: TypeId) -> Option<BaseType> {
        let erased = self.erasure_class(id)?;
        let class = self.class(erased)?;
        BaseType::from_box_name(&class.compound_name.dotted())
    }

    /// Class binding a class-like type is built on (the generic type for
    /// parameterized and raw types)
    pub fn erasure_class(&self, id: TypeId) -> Option<TypeId> {
        match self.ty(id) {
            TypeBinding::Class(_) => Some(id),
            TypeBinding::Parameterized(p) => Some(p.generic),
            TypeBinding::Raw(raw) => Some(raw.generic),
            TypeBinding::Unresolved(unresolved) => unresolved.resolved.and_then(|r| self.erasure_class(r)),
            _ => None,
        }
    }

    /// Scope used to resolve the signature and body of a declared source method
    pub fn method_scope(&self, method: MethodId) -> Option<ScopeId> {
        self.method_scopes.get(&method).copied()
    }

    /// Direct member type by simple (or binary) name, without inheritance
    pub(crate) fn direct_member_type(&mut self, enclosing: TypeId, simple: &str) -> LookupResult<Option<TypeId>> {
        let Some(enclosing) = self.erasure_class(enclosing) else {
            return Ok(None);
        };
        for member in self.member_types(enclosing)? {
            if let Some(class) = self.class(member) {
                if class.source_name == simple || class.compound_name.last() == Some(simple) {
                    return Ok(Some(member));
                }
            }
        }
        Ok(None)
    }
}
