//! Hierarchy connection and cycle detection (pipeline stage 3)
//!
//! A source type is marked `BEGIN_HIERARCHY_CHECK` before any of its
//! supertypes are resolved, and `END_HIERARCHY_CHECK` once they are all
//! connected. The supertype being connected is recorded so that a back
//! reference from a type connected in the meantime is recognized as a
//! cycle. A cycle is reported once, by the type that closes it; the
//! offending supertype is replaced by `java.lang.Object` (or dropped, for
//! interfaces) and every type on the cycle is marked as having hierarchy
//! problems.

use crate::binding::{ClassKind, Modifiers, ScopeId, TypeBinding, TypeId, TypeState};
use crate::decl::{TypeParameterDecl, TypeRef};
use crate::env::{CompletionStage, LookupEnvironment};
use crate::error::LookupResult;
use crate::names::well_known;
use crate::reporter::ProblemId;
use rustc_hash::FxHashSet;
use tracing::{trace, warn};

/// What kind of supertype slot a candidate is connected to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SupertypeSlot {
    Superclass,
    Interface,
}

impl LookupEnvironment {
    /// Connect the supertypes and type variable bounds of a source type
    pub(crate) fn connect_type_hierarchy(&mut self, ty: TypeId) -> LookupResult<()> {
        let Some(class) = self.class(ty) else {
            return Ok(());
        };
        if class.state.contains(TypeState::BEGIN_HIERARCHY_CHECK) {
            return Ok(());
        }
        let Some(scope) = class.scope else {
            return Ok(());
        };
        let kind = class.kind;
        let enclosing = class.enclosing;
        let Some((unit, unit_decl, path)) = self.source_decl(ty) else {
            return Ok(());
        };
        let Some(decl) = unit_decl.type_at(&path) else {
            return Ok(());
        };
        if let Some(class) = self.class_mut(ty) {
            class.state.insert(TypeState::BEGIN_HIERARCHY_CHECK);
        }
        if self.units[unit.index()].stage < CompletionStage::ImportsResolved {
            self.resolve_imports(unit)?;
        }
        trace!(ty = %ty, "connecting hierarchy");

        // An enclosing type is connected first so inherited member types resolve.
        if let Some(enclosing) = enclosing {
            self.connect_type_hierarchy(enclosing)?;
        }

        let variables = self.class(ty).map(|c| c.type_variables.clone()).unwrap_or_default();
        if self.class(ty).is_some_and(|c| !c.state.contains(TypeState::TYPE_VARIABLES_CONNECTED)) {
            if let Some(class) = self.class_mut(ty) {
                class.state.insert(TypeState::TYPE_VARIABLES_CONNECTED);
            }
            self.connect_type_variable_bounds(scope, &decl.type_parameters, &variables)?;
        }

        let object = self.object_type()?;
        let superclass = if object == ty {
            None
        } else {
            match kind {
                ClassKind::Interface | ClassKind::Annotation => Some(object),
                ClassKind::Enum => Some(self.enum_superclass(ty)?.unwrap_or(object)),
                ClassKind::Class => match &decl.superclass {
                    None => Some(object),
                    Some(reference) => {
                        let candidate = self.resolve_supertype_ref(scope, reference)?;
                        let connected = self.check_supertype(ty, candidate, reference, SupertypeSlot::Superclass)?;
                        Some(connected.unwrap_or(object))
                    }
                },
            }
        };
        if let Some(class) = self.class_mut(ty) {
            class.superclass = superclass;
        }
        self.connecting_supertypes.remove(&ty);

        let mut interfaces: Vec<TypeId> = Vec::with_capacity(decl.super_interfaces.len());
        for reference in &decl.super_interfaces {
            let candidate = self.resolve_supertype_ref(scope, reference)?;
            let Some(interface) = self.check_supertype(ty, candidate, reference, SupertypeSlot::Interface)? else {
                continue;
            };
            let erased = self.erasure_class(interface);
            if interfaces.iter().any(|&existing| self.erasure_class(existing) == erased) {
                let type_name = self.type_name(ty);
                self.report(ProblemId::DuplicateSuperinterface, vec![reference.display_name(), type_name]);
                continue;
            }
            interfaces.push(interface);
            if let Some(class) = self.class_mut(ty) {
                class.super_interfaces = interfaces.clone();
            }
        }
        self.connecting_supertypes.remove(&ty);
        if kind == ClassKind::Annotation {
            if let Some(annotation) = self.well_known_type(well_known::JAVA_LANG_ANNOTATION_ANNOTATION)? {
                if !interfaces.contains(&annotation) {
                    interfaces.push(annotation);
                }
            }
        }

        let mut has_problems = false;
        for supertype in superclass.iter().chain(interfaces.iter()) {
            if let Some(class) = self.erasure_class(*supertype).and_then(|c| self.class(c)) {
                has_problems |= class.state.contains(TypeState::HIERARCHY_HAS_PROBLEMS);
            }
        }
        if let Some(class) = self.class_mut(ty) {
            class.super_interfaces = interfaces;
            if has_problems {
                class.state.insert(TypeState::HIERARCHY_HAS_PROBLEMS);
            }
            class.state.insert(TypeState::END_HIERARCHY_CHECK);
        }
        Ok(())
    }

    fn enum_superclass(&mut self, ty: TypeId) -> LookupResult<Option<TypeId>> {
        let Some(enum_type) = self.well_known_type(well_known::JAVA_LANG_ENUM)? else {
            return Ok(None);
        };
        let generic = self.class(enum_type).is_some_and(|c| c.type_variables.len() == 1);
        if generic && self.options().generics_enabled() {
            Ok(Some(self.create_parameterized_type(enum_type, vec![ty], None)))
        } else {
            Ok(Some(enum_type))
        }
    }

    fn resolve_supertype_ref(&mut self, scope: ScopeId, reference: &TypeRef) -> LookupResult<TypeId> {
        self.resolve_type_ref_in(scope, reference, ProblemId::SuperTypeNotFound)
    }

    // Validate a resolved supertype; `None` means it must not be connected
    fn check_supertype(
        &mut self,
        ty: TypeId,
        candidate: TypeId,
        reference: &TypeRef,
        slot: SupertypeSlot,
    ) -> LookupResult<Option<TypeId>> {
        let type_name = self.type_name(ty);
        if self.ty(candidate).is_problem() {
            self.mark_hierarchy_problem(ty);
            return Ok(None);
        }
        if self.ty(candidate).is_type_variable_like() {
            self.report(ProblemId::SuperTypeUsingTypeVariable, vec![reference.display_name(), type_name]);
            self.mark_hierarchy_problem(ty);
            return Ok(None);
        }
        let Some(class) = self.erasure_class(candidate) else {
            let id = match slot {
                SupertypeSlot::Superclass => ProblemId::SuperclassMustBeAClass,
                SupertypeSlot::Interface => ProblemId::SuperInterfaceMustBeAnInterface,
            };
            self.report(id, vec![reference.display_name(), type_name]);
            self.mark_hierarchy_problem(ty);
            return Ok(None);
        };
        let (is_interface, is_final) = match self.class(class) {
            Some(c) => (c.is_interface(), c.modifiers.contains(Modifiers::FINAL)),
            None => (false, false),
        };
        let illegal = match slot {
            SupertypeSlot::Superclass if is_interface => Some(ProblemId::SuperclassMustBeAClass),
            SupertypeSlot::Superclass if is_final => Some(ProblemId::ClassExtendsFinalClass),
            SupertypeSlot::Interface if !is_interface => Some(ProblemId::SuperInterfaceMustBeAnInterface),
            _ => None,
        };
        if let Some(id) = illegal {
            self.report(id, vec![reference.display_name(), type_name]);
            self.mark_hierarchy_problem(ty);
            return Ok(None);
        }

        self.connecting_supertypes.insert(ty, class);
        if self.detect_hierarchy_cycle(ty, class)? {
            warn!(ty = %type_name, supertype = %reference.display_name(), "breaking hierarchy cycle");
            self.report(ProblemId::HierarchyCircularity, vec![type_name, reference.display_name()]);
            self.mark_hierarchy_problem(ty);
            self.mark_hierarchy_problem(class);
            return Ok(None);
        }
        Ok(Some(candidate))
    }

    fn mark_hierarchy_problem(&mut self, ty: TypeId) {
        if let Some(class) = self.class_mut(ty) {
            class.state.insert(TypeState::HIERARCHY_HAS_PROBLEMS);
        }
    }

    /// Would connecting `supertype` to `source` close a cycle?
    fn detect_hierarchy_cycle(&mut self, source: TypeId, supertype: TypeId) -> LookupResult<bool> {
        if supertype == source {
            return Ok(true);
        }
        // A supertype nested in the type itself
        let mut enclosing = self.class(supertype).and_then(|c| c.enclosing);
        let mut steps = 0;
        while let Some(outer) = enclosing {
            let outer = self.resolved(outer)?;
            if outer == source {
                return Ok(true);
            }
            enclosing = self.class(outer).and_then(|c| c.enclosing);
            steps += 1;
            if steps > 64 {
                break;
            }
        }

        let Some(class) = self.class(supertype) else {
            return Ok(false);
        };
        if class.is_binary() {
            return self.binary_hierarchy_reaches(supertype, source);
        }
        if class.is_hierarchy_being_connected() {
            // Follow the supertypes recorded by types still being connected.
            let mut visited = FxHashSet::default();
            let mut current = supertype;
            while let Some(&next) = self.connecting_supertypes.get(&current) {
                if next == source {
                    return Ok(true);
                }
                if !visited.insert(next) {
                    break;
                }
                current = next;
            }
            return Ok(false);
        }
        if !class.state.contains(TypeState::BEGIN_HIERARCHY_CHECK) {
            self.connect_type_hierarchy(supertype)?;
        }
        self.binary_hierarchy_reaches(supertype, source)
    }

    // Walk the connected supertypes of `start` looking for `target`
    fn binary_hierarchy_reaches(&mut self, start: TypeId, target: TypeId) -> LookupResult<bool> {
        let mut visited = FxHashSet::default();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if current == target {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            if self.class(current).is_some_and(|c| c.is_hierarchy_being_connected()) {
                continue;
            }
            if let Some(superclass) = self.superclass(current)? {
                stack.extend(self.erasure_class(superclass));
            }
            for interface in self.super_interfaces(current)? {
                stack.extend(self.erasure_class(interface));
            }
        }
        Ok(false)
    }

    /// Resolve and install the bounds of declared type variables
    pub(crate) fn connect_type_variable_bounds(
        &mut self,
        scope: ScopeId,
        parameters: &[TypeParameterDecl],
        variables: &[TypeId],
    ) -> LookupResult<()> {
        for (parameter, &variable) in parameters.iter().zip(variables) {
            let mut class_bound = None;
            let mut interfaces = Vec::with_capacity(parameter.bounds.len());
            for (index, reference) in parameter.bounds.iter().enumerate() {
                let bound = self.resolve_type_ref(scope, reference)?;
                if self.ty(bound).is_problem() {
                    continue;
                }
                let is_interface = self
                    .erasure_class(bound)
                    .and_then(|c| self.class(c))
                    .is_some_and(|c| c.is_interface());
                if is_interface {
                    interfaces.push(bound);
                } else if index == 0 {
                    class_bound = Some(bound);
                } else {
                    let name = parameter.name.clone();
                    self.report(ProblemId::SuperInterfaceMustBeAnInterface, vec![reference.display_name(), name]);
                }
            }
            self.set_type_variable_bounds(variable, class_bound, interfaces)?;
        }
        Ok(())
    }

    /// Report two different instantiations of one generic supertype
    pub(crate) fn check_superinterface_collisions(&mut self, ty: TypeId) -> LookupResult<()> {
        let Some(class) = self.class(ty) else {
            return Ok(());
        };
        if class.state.contains(TypeState::INTERFACES_CHECKED)
            || class.state.contains(TypeState::HIERARCHY_HAS_PROBLEMS)
        {
            return Ok(());
        }
        if let Some(class) = self.class_mut(ty) {
            class.state.insert(TypeState::INTERFACES_CHECKED);
        }

        let mut seen: Vec<(TypeId, TypeId)> = Vec::new();
        let mut visited = FxHashSet::default();
        let mut stack = vec![ty];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(generic) = self.erasure_class(current) {
                let parameterized = matches!(self.ty(current), TypeBinding::Parameterized(_) | TypeBinding::Raw(_));
                if parameterized {
                    if let Some(&(_, previous)) = seen.iter().find(|(g, _)| *g == generic) {
                        if previous != current {
                            let names = vec![self.type_name(previous), self.type_name(current), self.type_name(ty)];
                            self.report(ProblemId::SuperinterfacesCollide, names);
                            self.mark_hierarchy_problem(ty);
                            return Ok(());
                        }
                    } else {
                        seen.push((generic, current));
                    }
                }
            }
            if let Some(superclass) = self.superclass(current)? {
                stack.push(superclass);
            }
            stack.extend(self.super_interfaces(current)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::{Modifiers, TypeState};
    use crate::decl::{CompilationUnitDecl, TypeDecl, TypeRef};
    use crate::env::LookupEnvironment;
    use crate::options::CompilerOptions;
    use crate::provider::{BinaryTypeDescriptor, InMemoryProvider};
    use crate::reporter::{CollectingReporter, ProblemId};

    fn env(reporter: &CollectingReporter) -> LookupEnvironment {
        let mut provider = InMemoryProvider::new();
        provider
            .add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None))
            .add_binary(BinaryTypeDescriptor::class("java/lang/String").with_modifiers(Modifiers::PUBLIC | Modifiers::FINAL))
            .add_binary(BinaryTypeDescriptor::interface("java/lang/Runnable"))
            .add_package("java.lang");
        LookupEnvironment::new(CompilerOptions::default(), Box::new(provider), Box::new(reporter.clone()))
    }

    #[test]
    fn test_symmetric_cycle_is_reported_once() {
        let reporter = CollectingReporter::new();
        let mut env = env(&reporter);
        let unit = env.build_type_bindings(
            CompilationUnitDecl::new("A.java", "p")
                .with_type(TypeDecl::class("A").extends(TypeRef::simple("B")))
                .with_type(TypeDecl::class("B").extends(TypeRef::simple("A"))),
        );
        env.complete_type_bindings().unwrap();
        let object = env.object_type().unwrap();
        let a = env.unit_types(unit)[0];
        let b = env.unit_types(unit)[1];

        assert_eq!(reporter.count(ProblemId::HierarchyCircularity), 1);
        for ty in [a, b] {
            assert!(env.class(ty).unwrap().state.contains(TypeState::HIERARCHY_HAS_PROBLEMS));
        }
        assert_eq!(env.superclass(b).unwrap(), Some(object));
        assert_eq!(env.superclass(a).unwrap(), Some(b));
    }

    #[test]
    fn test_illegal_supertypes_fall_back_to_object() {
        let reporter = CollectingReporter::new();
        let mut env = env(&reporter);
        let unit = env.build_type_bindings(
            CompilationUnitDecl::new("A.java", "p")
                .with_type(TypeDecl::class("A").extends(TypeRef::simple("String")))
                .with_type(TypeDecl::class("B").extends(TypeRef::simple("Runnable")))
                .with_type(TypeDecl::class("C").implements(TypeRef::simple("A")))
                .with_type(TypeDecl::class("D").extends(TypeRef::simple("Nowhere"))),
        );
        env.complete_type_bindings().unwrap();
        let object = env.object_type().unwrap();
        for &ty in env.unit_types(unit).to_vec().iter() {
            assert_eq!(env.superclass(ty).unwrap(), Some(object));
        }
        assert_eq!(reporter.count(ProblemId::ClassExtendsFinalClass), 1);
        assert_eq!(reporter.count(ProblemId::SuperclassMustBeAClass), 1);
        assert_eq!(reporter.count(ProblemId::SuperInterfaceMustBeAnInterface), 1);
        assert_eq!(reporter.count(ProblemId::SuperTypeNotFound), 1);
    }

    #[test]
    fn test_member_supertype_of_enclosing_is_a_cycle() {
        let reporter = CollectingReporter::new();
        let mut env = env(&reporter);
        env.build_type_bindings(
            CompilationUnitDecl::new("A.java", "p").with_type(
                TypeDecl::class("A")
                    .extends(TypeRef::qualified("A.Inner"))
                    .with_member_type(TypeDecl::class("Inner")),
            ),
        );
        env.complete_type_bindings().unwrap();
        assert_eq!(reporter.count(ProblemId::HierarchyCircularity), 1);
    }
}
