//! Name resolution through the scope chain
//!
//! Lookups walk the chain innermost first: locals, then each enclosing
//! class (type variables, then members), then the compilation unit (its
//! own types, single-type imports, the package, on-demand imports).

use super::imports::OnDemandImport;
use super::ScopeKind;
use crate::binding::{Binding, BindingMask, FieldId, MethodId, Modifiers, ScopeId, TypeBinding, TypeId, UnitId};
use crate::decl::{TypeArgRef, TypeRef};
use crate::env::LookupEnvironment;
use crate::error::{LookupResult, ProblemBinding, ProblemReason, Resolution};
use crate::lookup::field::MemberHit;
use crate::lookup::InvocationSite;
use crate::names::CompoundName;
use crate::reporter::ProblemId;
use tracing::trace;

// Named type located segment by segment; `classes[k]` is the binding of
// segment `first_type_segment + k`
struct LocatedType {
    first_type_segment: usize,
    classes: Vec<TypeId>,
}

impl LookupEnvironment {
    fn named_type_variable(&self, variables: &[TypeId], name: &str) -> Option<TypeId> {
        variables
            .iter()
            .copied()
            .find(|&tv| self.ty(tv).as_type_variable().is_some_and(|v| v.name == name))
    }

    // Nested types of interfaces and enums are implicitly static
    fn is_static_type(&self, ty: TypeId) -> bool {
        self.class(ty).is_some_and(|c| {
            c.modifiers.contains(Modifiers::STATIC) || c.is_interface() || c.enclosing.is_none()
        })
    }

    /// Resolve a simple type name visible from `scope`
    pub fn resolve_type(&mut self, scope: ScopeId, name: &str) -> LookupResult<Resolution<TypeId>> {
        let mut inherited: Option<TypeId> = None;
        let mut not_visible: Option<TypeId> = None;
        for id in self.scope_chain(scope) {
            match self.scope(id).kind.clone() {
                ScopeKind::Block => {}
                ScopeKind::Method { type_variables, .. } => {
                    if inherited.is_none() {
                        if let Some(tv) = self.named_type_variable(&type_variables, name) {
                            return Ok(Resolution::Found(tv));
                        }
                    }
                }
                ScopeKind::Class { ty } => {
                    let variables = self.class(ty).map(|c| c.type_variables.clone()).unwrap_or_default();
                    let direct = match self.named_type_variable(&variables, name) {
                        Some(tv) => Some(tv),
                        None => self.direct_member_type(ty, name)?,
                    };
                    if let Some(direct) = direct {
                        return Ok(match inherited {
                            Some(hit) if hit != direct => Resolution::Problem(ProblemBinding::with_closest(
                                name,
                                ProblemReason::InheritedNameHidesEnclosingName,
                                hit,
                            )),
                            _ => Resolution::Found(direct),
                        });
                    }
                    let connecting = self.class(ty).is_some_and(|c| c.is_hierarchy_being_connected());
                    if inherited.is_none() && !connecting {
                        match self.member_type_in_hierarchy(ty, name)? {
                            MemberHit::None => {}
                            MemberHit::Ambiguous(member) => {
                                return Ok(Resolution::Problem(ProblemBinding::with_closest(
                                    name,
                                    ProblemReason::Ambiguous,
                                    member,
                                )))
                            }
                            MemberHit::One(member) => {
                                if self.can_type_be_seen(member, scope)? {
                                    inherited = Some(member);
                                } else {
                                    not_visible.get_or_insert(member);
                                }
                            }
                        }
                    }
                }
                ScopeKind::CompilationUnit { unit, .. } => {
                    if let Some(hit) = inherited {
                        return Ok(Resolution::Found(hit));
                    }
                    return self.resolve_type_in_unit(unit, scope, name, not_visible);
                }
            }
        }
        Ok(match inherited {
            Some(hit) => Resolution::Found(hit),
            None => Resolution::Problem(ProblemBinding::new(name, ProblemReason::NotFound)),
        })
    }

    fn resolve_type_in_unit(
        &mut self,
        unit: UnitId,
        scope: ScopeId,
        name: &str,
        mut closest: Option<TypeId>,
    ) -> LookupResult<Resolution<TypeId>> {
        self.resolve_imports(unit)?;
        let own_types = self.units[unit.index()].types.clone();
        for own in own_types {
            if self.class(own).is_some_and(|c| c.source_name == name) {
                return Ok(Resolution::Found(own));
            }
        }
        if let Some(imported) = self.imports(unit).single_type(name) {
            return Ok(Resolution::Found(imported));
        }
        let package = self.units[unit.index()].package;
        let in_package = self.package(package).compound_name.child(name);
        if let Some(ty) = self.get_type(&in_package)? {
            return Ok(Resolution::Found(ty));
        }

        let on_demand = self.imports(unit).on_demand.clone();
        let mut found: Option<TypeId> = None;
        for import in on_demand {
            let candidate = match import {
                OnDemandImport::Package(imported) => {
                    let qualified = self.package(imported).compound_name.child(name);
                    self.get_type(&qualified)?
                }
                OnDemandImport::Type(ty) => match self.member_type_in_hierarchy(ty, name)? {
                    MemberHit::One(member) => Some(member),
                    _ => None,
                },
            };
            let Some(candidate) = candidate else {
                continue;
            };
            if !self.can_type_be_seen(candidate, scope)? {
                closest.get_or_insert(candidate);
                continue;
            }
            match found {
                Some(existing) if existing != candidate => {
                    return Ok(Resolution::Problem(ProblemBinding::with_closest(
                        name,
                        ProblemReason::Ambiguous,
                        existing,
                    )))
                }
                _ => found = Some(candidate),
            }
        }
        Ok(match (found, closest) {
            (Some(ty), _) => Resolution::Found(ty),
            (None, Some(ty)) => Resolution::Problem(ProblemBinding::with_closest(name, ProblemReason::NotVisible, ty)),
            (None, None) => Resolution::Problem(ProblemBinding::new(name, ProblemReason::NotFound)),
        })
    }

    // First segment as a type, or the longest package prefix followed by a
    // type, then member types
    fn locate_type(
        &mut self,
        scope: ScopeId,
        names: &[&str],
    ) -> LookupResult<Result<LocatedType, ProblemBinding<TypeId>>> {
        let dotted = names.join(".");
        let Some(&first) = names.first() else {
            return Ok(Err(ProblemBinding::new(dotted, ProblemReason::NotFound)));
        };
        let mut located = match self.resolve_type(scope, first)? {
            Resolution::Found(ty) => LocatedType {
                first_type_segment: 0,
                classes: vec![ty],
            },
            Resolution::Problem(problem) if problem.reason != ProblemReason::NotFound || names.len() == 1 => {
                return Ok(Err(ProblemBinding {
                    name: dotted,
                    ..problem
                }));
            }
            Resolution::Problem(_) => {
                let mut package = CompoundName::new(vec![first.to_string()]);
                if self.get_package(&package).is_none() {
                    return Ok(Err(ProblemBinding::new(dotted, ProblemReason::NotFound)));
                }
                let mut index = 1;
                loop {
                    let Some(&segment) = names.get(index) else {
                        return Ok(Err(ProblemBinding::new(dotted, ProblemReason::NotFound)));
                    };
                    let candidate = package.child(segment);
                    if let Some(ty) = self.get_type(&candidate)? {
                        if !self.can_type_be_seen(ty, scope)? {
                            return Ok(Err(ProblemBinding::with_closest(dotted, ProblemReason::NotVisible, ty)));
                        }
                        break LocatedType {
                            first_type_segment: index,
                            classes: vec![ty],
                        };
                    }
                    if self.get_package(&candidate).is_none() {
                        return Ok(Err(ProblemBinding::new(dotted, ProblemReason::NotFound)));
                    }
                    package = candidate;
                    index += 1;
                }
            }
        };

        for &segment in &names[located.first_type_segment + 1..] {
            let Some(&current) = located.classes.last() else {
                break;
            };
            let connecting = self
                .erasure_class(current)
                .and_then(|c| self.class(c))
                .is_some_and(|c| c.is_hierarchy_being_connected());
            let member = if connecting {
                self.direct_member_type(current, segment)?
            } else {
                match self.member_type_in_hierarchy(current, segment)? {
                    MemberHit::One(member) => Some(member),
                    MemberHit::Ambiguous(member) => {
                        return Ok(Err(ProblemBinding::with_closest(dotted, ProblemReason::Ambiguous, member)));
                    }
                    MemberHit::None => None,
                }
            };
            let Some(member) = member else {
                return Ok(Err(ProblemBinding::new(dotted, ProblemReason::NotFound)));
            };
            if !self.can_type_be_seen(member, scope)? {
                return Ok(Err(ProblemBinding::with_closest(dotted, ProblemReason::NotVisible, member)));
            }
            located.classes.push(member);
        }
        Ok(Ok(located))
    }

    /// Resolve a possibly qualified type name (`Map.Entry`, `java.util.List`)
    pub fn resolve_qualified_type(&mut self, scope: ScopeId, name: &CompoundName) -> LookupResult<Resolution<TypeId>> {
        let names: Vec<&str> = name.segments().iter().map(String::as_str).collect();
        Ok(match self.locate_type(scope, &names)? {
            Ok(located) => match located.classes.last() {
                Some(&ty) => Resolution::Found(ty),
                None => Resolution::Problem(ProblemBinding::new(name.dotted(), ProblemReason::NotFound)),
            },
            Err(problem) => Resolution::Problem(problem),
        })
    }

    /// Resolve a source type reference; failures are reported and typed as
    /// problem types
    pub fn resolve_type_ref(&mut self, scope: ScopeId, reference: &TypeRef) -> LookupResult<TypeId> {
        self.resolve_type_ref_in(scope, reference, ProblemId::UndefinedType)
    }

    /// Like [`resolve_type_ref`](Self::resolve_type_ref), reporting a missing
    /// type with `missing`
    pub(crate) fn resolve_type_ref_in(
        &mut self,
        scope: ScopeId,
        reference: &TypeRef,
        missing: ProblemId,
    ) -> LookupResult<TypeId> {
        match reference {
            TypeRef::Base(base) => Ok(self.base_type(*base)),
            TypeRef::Array { component, dimensions } => {
                let component = self.resolve_type_ref_in(scope, component, missing)?;
                if self.ty(component).is_problem() {
                    return Ok(component);
                }
                Ok(self.create_array_type(component, *dimensions))
            }
            TypeRef::Named(segments) => {
                let display = reference.display_name();
                let names: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
                let located = match self.locate_type(scope, &names)? {
                    Ok(located) => located,
                    Err(problem) => {
                        self.report_type_problem(scope, &display, problem.reason, missing);
                        return Ok(self.create_problem_type(
                            CompoundName::from_dotted(&display),
                            problem.reason,
                            problem.closest_match,
                        ));
                    }
                };
                let mut current: Option<TypeId> = None;
                for (offset, &ty) in located.classes.iter().enumerate() {
                    let segment = &segments[located.first_type_segment + offset];
                    if self.ty(ty).is_type_variable_like() {
                        current = Some(ty);
                        continue;
                    }
                    let enclosing = current
                        .filter(|&outer| matches!(self.ty(outer), TypeBinding::Parameterized(_)))
                        .filter(|_| !self.is_static_type(ty));
                    current = Some(self.apply_type_arguments(scope, ty, segment.arguments.as_deref(), enclosing, &display)?);
                }
                match current {
                    Some(ty) => Ok(ty),
                    None => Ok(self.create_problem_type(
                        CompoundName::from_dotted(&display),
                        ProblemReason::NotFound,
                        None,
                    )),
                }
            }
        }
    }

    fn report_type_problem(&mut self, scope: ScopeId, display: &str, reason: ProblemReason, missing: ProblemId) {
        let id = match reason {
            ProblemReason::NotVisible => ProblemId::NotVisibleType,
            ProblemReason::Ambiguous | ProblemReason::InheritedNameHidesEnclosingName => ProblemId::AmbiguousType,
            _ => missing,
        };
        let mut arguments = vec![display.to_string()];
        if id == ProblemId::SuperTypeNotFound {
            let owner = match self.enclosing_source_type(scope) {
                Some(ty) => self.type_name(ty),
                None => String::new(),
            };
            arguments.push(owner);
        }
        self.report(id, arguments);
    }

    /// Apply source type arguments to a class
    ///
    /// Without arguments a generic class becomes its raw type. Arguments on
    /// a non-generic class, a wrong number of arguments and primitive
    /// arguments are reported; the latter two fall back to the raw type.
    fn apply_type_arguments(
        &mut self,
        scope: ScopeId,
        class: TypeId,
        arguments: Option<&[TypeArgRef]>,
        enclosing: Option<TypeId>,
        display: &str,
    ) -> LookupResult<TypeId> {
        if !self.options().generics_enabled() {
            return Ok(class);
        }
        let variables = self.class(class).map(|c| c.type_variables.clone()).unwrap_or_default();
        let Some(arguments) = arguments.filter(|arguments| !arguments.is_empty()) else {
            if !variables.is_empty() {
                return Ok(self.create_raw_type(class, enclosing));
            }
            return Ok(match enclosing {
                Some(enclosing) => self.create_parameterized_type(class, Vec::new(), Some(enclosing)),
                None => class,
            });
        };
        if variables.is_empty() {
            self.report(ProblemId::NonGenericTypeCannotBeParameterized, vec![display.to_string()]);
            return Ok(class);
        }
        if arguments.len() != variables.len() {
            self.report(ProblemId::IncorrectArityForParameterizedType, vec![display.to_string()]);
            return Ok(self.create_raw_type(class, enclosing));
        }

        let mut resolved = Vec::with_capacity(arguments.len());
        for (rank, argument) in arguments.iter().enumerate() {
            let (reference, kind) = match argument {
                TypeArgRef::Type(reference) => (Some(reference), None),
                TypeArgRef::Wildcard { kind, bound } => (bound.as_deref(), Some(*kind)),
            };
            let bound = match reference {
                Some(reference) => {
                    let ty = self.resolve_type_ref(scope, reference)?;
                    if self.ty(ty).as_base().is_some() {
                        self.report(ProblemId::IllegalPrimitiveTypeArgument, vec![reference.display_name()]);
                        return Ok(self.create_raw_type(class, enclosing));
                    }
                    Some(ty)
                }
                None => None,
            };
            let argument = match (kind, bound) {
                (Some(kind), bound) => self.create_wildcard(Some(class), rank as u32, bound, Vec::new(), kind),
                (None, Some(ty)) => ty,
                (None, None) => continue,
            };
            resolved.push(argument);
        }

        let parameterized = self.create_parameterized_type(class, resolved, enclosing);
        match &mut self.deferred_bound_checks {
            Some(deferred) => deferred.push(parameterized),
            None => self.check_type_argument_bounds(parameterized)?,
        }
        Ok(parameterized)
    }

    /// Resolve a simple name to a variable, type or package, as `mask` allows
    ///
    /// Variables take precedence over types, types over packages. A problem
    /// other than "not found" is kept and answered when nothing else matches.
    pub fn resolve_name(
        &mut self,
        scope: ScopeId,
        name: &str,
        mask: BindingMask,
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<Binding>> {
        let mut problem: Option<ProblemBinding<Binding>> = None;
        if mask.contains(BindingMask::VARIABLE) {
            if let Some(local) = self.find_local(scope, name) {
                return Ok(Resolution::Found(Binding::Local(local)));
            }
            match self.resolve_field(scope, None, name, site)?.map(Binding::Field) {
                Resolution::Found(field) => return Ok(Resolution::Found(field)),
                Resolution::Problem(found) if found.reason != ProblemReason::NotFound => problem = Some(found),
                Resolution::Problem(_) => {}
            }
        }
        if mask.contains(BindingMask::TYPE) {
            match self.resolve_type(scope, name)? {
                Resolution::Found(ty) => {
                    let binding = if self.ty(ty).is_type_variable_like() {
                        Binding::TypeVariable(ty)
                    } else {
                        Binding::Type(ty)
                    };
                    return Ok(Resolution::Found(binding));
                }
                Resolution::Problem(found) if found.reason != ProblemReason::NotFound => {
                    problem.get_or_insert(ProblemBinding {
                        name: found.name,
                        reason: found.reason,
                        closest_match: found.closest_match.map(Binding::Type),
                    });
                }
                Resolution::Problem(_) => {}
            }
        }
        if mask.contains(BindingMask::PACKAGE) {
            if let Some(package) = self.get_package(&CompoundName::new(vec![name.to_string()])) {
                return Ok(Resolution::Found(Binding::Package(package)));
            }
        }
        trace!(name, "name not resolved");
        Ok(Resolution::Problem(
            problem.unwrap_or_else(|| ProblemBinding::new(name, ProblemReason::NotFound)),
        ))
    }

    /// Resolve a field, through `receiver` or (for `None`) as a simple name
    ///
    /// A simple name is searched in each enclosing class, innermost first.
    /// The first class whose members (inherited ones included) have the
    /// field answers; an inherited field is only accepted when no enclosing
    /// class declares a field of that name itself. Static imports come last.
    pub fn resolve_field(
        &mut self,
        scope: ScopeId,
        receiver: Option<TypeId>,
        name: &str,
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<FieldId>> {
        if let Some(receiver) = receiver {
            return self.find_field(scope, receiver, name, site);
        }
        let mut depth = 0;
        let mut static_context = false;
        let mut inherited: Option<FieldId> = None;
        for id in self.scope_chain(scope) {
            match self.scope(id).kind.clone() {
                ScopeKind::Block => {}
                ScopeKind::Method { is_static, .. } => static_context |= is_static,
                ScopeKind::Class { ty } => {
                    if let Some(hit) = inherited {
                        if let Some(direct) = self.declared_field(ty, name)? {
                            if direct != hit {
                                return Ok(Resolution::Problem(ProblemBinding::with_closest(
                                    name,
                                    ProblemReason::InheritedNameHidesEnclosingName,
                                    hit,
                                )));
                            }
                        }
                        continue;
                    }
                    match self.find_field(scope, ty, name, site)? {
                        Resolution::Found(field) => {
                            if static_context && !self.field(field).is_static() {
                                return Ok(Resolution::Problem(ProblemBinding::with_closest(
                                    name,
                                    ProblemReason::NonStaticReferenceInStaticContext,
                                    field,
                                )));
                            }
                            site.depth = depth;
                            let declaring = self.field(field).declaring_class;
                            if self.erasure_class(declaring) == Some(ty) {
                                return Ok(Resolution::Found(field));
                            }
                            inherited = Some(field);
                        }
                        // Absent here; an enclosing class may still declare it
                        Resolution::Problem(problem)
                            if matches!(problem.reason, ProblemReason::NotFound | ProblemReason::HierarchyHasProblems) => {}
                        Resolution::Problem(problem) => return Ok(Resolution::Problem(problem)),
                    }
                    depth += 1;
                    static_context = self.is_static_type(ty);
                }
                ScopeKind::CompilationUnit { unit, .. } => {
                    if let Some(hit) = inherited {
                        return Ok(Resolution::Found(hit));
                    }
                    return self.static_import_field(unit, scope, name, site);
                }
            }
        }
        Ok(match inherited {
            Some(hit) => Resolution::Found(hit),
            None => Resolution::Problem(ProblemBinding::new(name, ProblemReason::NotFound)),
        })
    }

    fn static_import_field(
        &mut self,
        unit: UnitId,
        scope: ScopeId,
        name: &str,
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<FieldId>> {
        let imports = self.imports(unit).clone();
        for (ty, member) in &imports.static_single {
            if member != name {
                continue;
            }
            if let Resolution::Found(field) = self.find_field(scope, *ty, name, site)? {
                if self.field(field).is_static() {
                    return Ok(Resolution::Found(field));
                }
            }
        }
        let mut found: Option<FieldId> = None;
        for &ty in &imports.static_on_demand {
            if let Resolution::Found(field) = self.find_field(scope, ty, name, site)? {
                if !self.field(field).is_static() {
                    continue;
                }
                match found {
                    Some(existing) if existing != field => {
                        return Ok(Resolution::Problem(ProblemBinding::with_closest(
                            name,
                            ProblemReason::Ambiguous,
                            existing,
                        )))
                    }
                    _ => found = Some(field),
                }
            }
        }
        Ok(match found {
            Some(field) => Resolution::Found(field),
            None => Resolution::Problem(ProblemBinding::new(name, ProblemReason::NotFound)),
        })
    }

    /// Resolve an unqualified method invocation `selector(arguments)`
    ///
    /// The innermost enclosing class that has any method of that name is
    /// searched; outer classes are not consulted even if its candidates do
    /// not apply. Static imports are used when no class has the name.
    pub fn resolve_method(
        &mut self,
        scope: ScopeId,
        selector: &str,
        arguments: &[TypeId],
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<MethodId>> {
        let mut depth = 0;
        let mut static_context = false;
        for id in self.scope_chain(scope) {
            match self.scope(id).kind.clone() {
                ScopeKind::Block => {}
                ScopeKind::Method { is_static, .. } => static_context |= is_static,
                ScopeKind::Class { ty } => {
                    if !self.collect_methods(ty, selector)?.is_empty() {
                        let result = self.find_method(scope, ty, selector, arguments, site)?;
                        site.depth = depth;
                        if let Resolution::Found(method) = result {
                            let binding = self.method(method);
                            if static_context && !binding.is_static() && !binding.is_constructor() {
                                return Ok(Resolution::Problem(ProblemBinding::with_closest(
                                    selector,
                                    ProblemReason::NonStaticReferenceInStaticContext,
                                    method,
                                )));
                            }
                        }
                        return Ok(result);
                    }
                    depth += 1;
                    static_context = self.is_static_type(ty);
                }
                ScopeKind::CompilationUnit { unit, .. } => {
                    return self.static_import_method(unit, scope, selector, arguments, site);
                }
            }
        }
        Ok(Resolution::Problem(ProblemBinding::new(selector, ProblemReason::NotFound)))
    }

    fn static_import_method(
        &mut self,
        unit: UnitId,
        scope: ScopeId,
        selector: &str,
        arguments: &[TypeId],
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<MethodId>> {
        let imports = self.imports(unit).clone();
        let mut sources: Vec<TypeId> = imports
            .static_single
            .iter()
            .filter(|(_, member)| member == selector)
            .map(|(ty, _)| *ty)
            .collect();
        sources.extend(imports.static_on_demand.iter().copied());

        let mut candidates: Vec<MethodId> = Vec::new();
        for source in sources {
            for method in self.collect_methods(source, selector)? {
                if self.method(method).is_static() && !candidates.contains(&method) {
                    candidates.push(method);
                }
            }
        }
        let Some(&first) = candidates.first() else {
            return Ok(Resolution::Problem(ProblemBinding::new(selector, ProblemReason::NotFound)));
        };
        let receiver = self.method(first).declaring_class;
        self.select_method(scope, receiver, selector, candidates, arguments, site)
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::{BindingMask, Modifiers};
    use crate::decl::{CompilationUnitDecl, FieldDecl, MethodDecl, TypeArgRef, TypeDecl, TypeRef};
    use crate::env::LookupEnvironment;
    use crate::error::ProblemReason;
    use crate::lookup::InvocationSite;
    use crate::options::CompilerOptions;
    use crate::provider::{BinaryTypeDescriptor, InMemoryProvider};
    use crate::reporter::{CollectingReporter, ProblemId};

    fn env(reporter: &CollectingReporter) -> LookupEnvironment {
        let mut provider = InMemoryProvider::new();
        provider
            .add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None))
            .add_binary(
                BinaryTypeDescriptor::class("java/lang/String").with_modifiers(Modifiers::PUBLIC | Modifiers::FINAL),
            )
            .add_binary(
                BinaryTypeDescriptor::interface("java/util/List")
                    .with_modifiers(Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT)
                    .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;"),
            );
        LookupEnvironment::new(CompilerOptions::default(), Box::new(provider), Box::new(reporter.clone()))
    }

    #[test]
    fn test_inherited_member_type_hidden_by_enclosing_declaration() {
        let reporter = CollectingReporter::new();
        let mut env = env(&reporter);
        let unit = env.build_type_bindings(
            CompilationUnitDecl::new("A.java", "p")
                .with_type(TypeDecl::class("Base").with_member_type(TypeDecl::class("Node")))
                .with_type(
                    TypeDecl::class("Outer")
                        .with_member_type(TypeDecl::class("Node"))
                        .with_member_type(TypeDecl::class("Inner").extends(TypeRef::simple("Base"))),
                ),
        );
        env.complete_type_bindings().unwrap();
        let outer = env.unit_types(unit)[1];
        let inner = env.class(outer).unwrap().member_types[1];
        let scope = env.class_scope(inner).unwrap();
        let node = env.resolve_type(scope, "Node").unwrap();
        assert_eq!(node.problem_reason(), Some(ProblemReason::InheritedNameHidesEnclosingName));
    }

    #[test]
    fn test_qualified_and_parameterized_references() {
        let reporter = CollectingReporter::new();
        let mut env = env(&reporter);
        let unit = env.build_type_bindings(CompilationUnitDecl::new("A.java", "p").with_type(TypeDecl::class("A")));
        env.complete_type_bindings().unwrap();
        let scope = env.class_scope(env.unit_types(unit)[0]).unwrap();

        let raw = env.resolve_type_ref(scope, &TypeRef::qualified("java.util.List")).unwrap();
        assert!(matches!(env.ty(raw), crate::binding::TypeBinding::Raw(_)));

        let strings = TypeRef::qualified("java.util.List").with_args(vec![TypeRef::simple("String").into()]);
        let first = env.resolve_type_ref(scope, &strings).unwrap();
        let second = env.resolve_type_ref(scope, &strings).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, raw);

        let primitive = TypeRef::qualified("java.util.List").with_args(vec![TypeArgRef::Type(TypeRef::int())]);
        env.resolve_type_ref(scope, &primitive).unwrap();
        assert_eq!(reporter.count(ProblemId::IllegalPrimitiveTypeArgument), 1);

        let arity = TypeRef::qualified("java.util.List")
            .with_args(vec![TypeRef::simple("String").into(), TypeRef::simple("String").into()]);
        env.resolve_type_ref(scope, &arity).unwrap();
        assert_eq!(reporter.count(ProblemId::IncorrectArityForParameterizedType), 1);

        let missing = env.resolve_type_ref(scope, &TypeRef::simple("Nowhere")).unwrap();
        assert!(env.ty(missing).is_problem());
        assert_eq!(reporter.count(ProblemId::UndefinedType), 1);
    }

    #[test]
    fn test_instance_field_from_static_method() {
        let reporter = CollectingReporter::new();
        let mut env = env(&reporter);
        let unit = env.build_type_bindings(
            CompilationUnitDecl::new("A.java", "p").with_type(
                TypeDecl::class("A")
                    .with_field(FieldDecl::new("count", Modifiers::empty(), TypeRef::int()))
                    .with_method(MethodDecl::new("run", TypeRef::void()).with_modifiers(Modifiers::STATIC))
                    .with_method(MethodDecl::new("tick", TypeRef::void())),
            ),
        );
        env.complete_type_bindings().unwrap();
        let a = env.unit_types(unit)[0];
        let class_scope = env.class_scope(a).unwrap();
        let static_scope = env.new_method_scope(class_scope, None, true);
        let instance_scope = env.new_method_scope(class_scope, None, false);
        let mut site = InvocationSite::at(0);

        let from_static = env.resolve_field(static_scope, None, "count", &mut site).unwrap();
        assert_eq!(from_static.problem_reason(), Some(ProblemReason::NonStaticReferenceInStaticContext));
        assert!(env.resolve_field(instance_scope, None, "count", &mut site).unwrap().is_found());

        let tick = env.resolve_method(static_scope, "tick", &[], &mut site).unwrap();
        assert_eq!(tick.problem_reason(), Some(ProblemReason::NonStaticReferenceInStaticContext));
        assert!(env.resolve_method(static_scope, "run", &[], &mut site).unwrap().is_found());
    }

    #[test]
    fn test_variables_take_precedence_over_types() {
        let reporter = CollectingReporter::new();
        let mut env = env(&reporter);
        let unit = env.build_type_bindings(
            CompilationUnitDecl::new("A.java", "p").with_type(
                TypeDecl::class("A").with_field(FieldDecl::new("String", Modifiers::empty(), TypeRef::int())),
            ),
        );
        env.complete_type_bindings().unwrap();
        let scope = env.class_scope(env.unit_types(unit)[0]).unwrap();
        let method_scope = env.new_method_scope(scope, None, false);
        let mut site = InvocationSite::at(0);

        let all = BindingMask::VARIABLE | BindingMask::TYPE | BindingMask::PACKAGE;
        let as_variable = env.resolve_name(method_scope, "String", all, &mut site).unwrap();
        assert!(as_variable.found().and_then(|b| b.as_field()).is_some());
        let as_type = env.resolve_name(method_scope, "String", BindingMask::TYPE, &mut site).unwrap();
        assert!(as_type.found().and_then(|b| b.as_type()).is_some());
        let as_package = env.resolve_name(method_scope, "java", all, &mut site).unwrap();
        assert!(as_package.found().and_then(|b| b.as_package()).is_some());
    }
}
