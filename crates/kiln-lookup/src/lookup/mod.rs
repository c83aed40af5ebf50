//! Member lookup and overload resolution
//!
//! Method lookup collects candidates by name from the receiver and its
//! supertypes, keeps the ones applicable in the first phase that finds any,
//! drops invisible ones and picks the most specific. Ties that remain are
//! reported as ambiguous.

pub mod compat;
pub mod field;
pub mod visibility;

pub use compat::CompatibilityPhase;

use crate::binding::{
    BaseType, FieldBinding, FieldId, MethodBinding, MethodId, MethodOrigin, Modifiers, ScopeId, TypeBinding, TypeId,
    TypeState,
};
use crate::error::{LookupResult, ProblemBinding, ProblemReason, Resolution};
use crate::generics::BoundCheck;
use crate::names::well_known;
use crate::reporter::ProblemId;
use crate::env::LookupEnvironment;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Call-site information for a lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationSite {
    /// Source position, keys capture conversion
    pub position: u32,
    /// Type the call result is assigned to, if known
    pub expected_type: Option<TypeId>,
    /// Explicit method type arguments (`this.<String>m()`)
    pub type_arguments: Option<Vec<TypeId>>,
    /// Number of enclosing types crossed to find the member; set by lookup
    pub depth: u32,
}

impl InvocationSite {
    /// Site at a position, nothing else known
    pub fn at(position: u32) -> Self {
        InvocationSite {
            position,
            ..InvocationSite::default()
        }
    }

    /// With an expected result type
    pub fn expecting(mut self, expected: TypeId) -> Self {
        self.expected_type = Some(expected);
        self
    }

    /// With explicit type arguments
    pub fn with_type_arguments(mut self, arguments: Vec<TypeId>) -> Self {
        self.type_arguments = Some(arguments);
        self
    }
}

// Outcome of checking one candidate
enum Applicability {
    Applicable(MethodId),
    NotApplicable,
    Problem(ProblemReason),
}

impl LookupEnvironment {
    /// Receiver with wildcard type arguments captured
    pub(crate) fn lookup_receiver(&mut self, receiver: TypeId, position: u32) -> LookupResult<TypeId> {
        let receiver = self.resolved(receiver)?;
        self.capture(receiver, position)
    }

    /// Resolve a method invocation `receiver.selector(arguments)`
    pub fn find_method(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        selector: &str,
        arguments: &[TypeId],
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<MethodId>> {
        let receiver = self.lookup_receiver(receiver, site.position)?;
        if matches!(self.ty(receiver), TypeBinding::Array(_)) && selector == well_known::CLONE && arguments.is_empty() {
            return Ok(Resolution::Found(self.array_clone_method(receiver)));
        }
        let candidates = self.collect_methods(receiver, selector)?;
        trace!(selector, candidates = candidates.len(), "method lookup");
        self.select_method(scope, receiver, selector, candidates, arguments, site)
    }

    /// Resolve `new receiver(arguments)`
    pub fn find_constructor(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        arguments: &[TypeId],
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<MethodId>> {
        let receiver = self.resolved(receiver)?;
        let candidates = self.methods_named(receiver, well_known::INIT)?;
        self.select_method(scope, receiver, well_known::INIT, candidates, arguments, site)
    }

    /// Why a member is absent: a receiver whose supertypes failed to connect
    /// may be missing inherited members, so the absence is not conclusive
    pub(crate) fn missing_member_reason(&self, receiver: TypeId) -> ProblemReason {
        let broken = self
            .erasure_class(receiver)
            .and_then(|class| self.class(class))
            .is_some_and(|class| class.state.contains(TypeState::HIERARCHY_HAS_PROBLEMS));
        if broken {
            ProblemReason::HierarchyHasProblems
        } else {
            ProblemReason::NotFound
        }
    }

    pub(crate) fn select_method(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        selector: &str,
        candidates: Vec<MethodId>,
        arguments: &[TypeId],
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<MethodId>> {
        if candidates.is_empty() {
            let reason = self.missing_member_reason(receiver);
            return Ok(Resolution::Problem(ProblemBinding::new(selector, reason)));
        }

        let mut applicable = Vec::new();
        let mut problem = None;
        let mut phase_used = CompatibilityPhase::Strict;
        for phase in self.compatibility_phases() {
            for &candidate in &candidates {
                match self.check_applicability(candidate, arguments, site, phase)? {
                    Applicability::Applicable(method) => applicable.push(method),
                    Applicability::NotApplicable => {}
                    Applicability::Problem(reason) => {
                        problem.get_or_insert((reason, candidate));
                    }
                }
            }
            if !applicable.is_empty() {
                phase_used = phase;
                break;
            }
        }

        if applicable.is_empty() {
            if let Some((reason, candidate)) = problem {
                return Ok(Resolution::Problem(ProblemBinding::with_closest(selector, reason, candidate)));
            }
            let closest = candidates
                .iter()
                .copied()
                .find(|&m| self.method(m).parameters.len() == arguments.len())
                .unwrap_or(candidates[0]);
            return Ok(Resolution::Problem(ProblemBinding::with_closest(
                selector,
                ProblemReason::NotFound,
                closest,
            )));
        }

        let mut visible = Vec::with_capacity(applicable.len());
        for &method in &applicable {
            let (declaring, modifiers) = {
                let binding = self.method(method);
                (binding.declaring_class, binding.modifiers)
            };
            if self.can_member_be_seen(declaring, modifiers, scope, Some(receiver))? {
                visible.push(method);
            }
        }
        if visible.is_empty() {
            return Ok(Resolution::Problem(ProblemBinding::with_closest(
                selector,
                ProblemReason::NotVisible,
                applicable[0],
            )));
        }
        let resolution = if visible.len() == 1 {
            Resolution::Found(visible[0])
        } else {
            self.most_specific_method(selector, &visible, phase_used)?
        };
        if let Resolution::Found(method) = &resolution {
            if self.options().report_unchecked {
                self.report_unchecked_invocation(receiver, *method, arguments)?;
            }
        }
        Ok(resolution)
    }

    /// Type-safety warnings for a selected method: a raw member whose
    /// declared parameters mention the class type variables, and each
    /// argument that only fits its parameter through an unchecked conversion
    fn report_unchecked_invocation(
        &mut self,
        receiver: TypeId,
        method: MethodId,
        arguments: &[TypeId],
    ) -> LookupResult<()> {
        let (is_raw, original, parameters) = {
            let binding = self.method(method);
            (binding.is_raw, binding.original(), binding.parameters.clone())
        };
        if is_raw {
            if let Some(original) = original {
                let declared = self.method(original);
                let variables = self
                    .ty(declared.declaring_class)
                    .as_class()
                    .map(|class| class.type_variables.clone())
                    .unwrap_or_default();
                let mentions = declared
                    .parameters
                    .iter()
                    .any(|&parameter| self.mentions_any(parameter, &variables));
                if mentions {
                    let names = vec![self.method_signature_name(method), self.type_name(receiver)];
                    self.report(ProblemId::UncheckedRawMemberCall, names);
                }
            }
        }
        for (&argument, &parameter) in arguments.iter().zip(&parameters) {
            let (compatible, unchecked) = self.check_compatibility(argument, parameter)?;
            if compatible && unchecked {
                let names = vec![self.type_name(argument), self.type_name(parameter)];
                self.report(ProblemId::UncheckedConversion, names);
            }
        }
        Ok(())
    }

    fn check_applicability(
        &mut self,
        candidate: MethodId,
        arguments: &[TypeId],
        site: &InvocationSite,
        phase: CompatibilityPhase,
    ) -> LookupResult<Applicability> {
        let method = self.method(candidate);
        let arity = method.parameters.len();
        let is_varargs = method.is_varargs();
        let is_raw = method.is_raw;
        let variables = method.type_variables.clone();
        let original = method.original();
        if phase != CompatibilityPhase::VariableArity && arity != arguments.len() {
            return Ok(Applicability::NotApplicable);
        }
        if phase == CompatibilityPhase::VariableArity && (!is_varargs || arguments.len() + 1 < arity) {
            return Ok(Applicability::NotApplicable);
        }

        let mut target = candidate;
        if let Some(explicit) = &site.type_arguments {
            let declared_generic = original.is_some_and(|original| self.method(original).is_generic());
            if is_raw && declared_generic {
                return Ok(Applicability::Problem(ProblemReason::TypeArgumentsForRawGenericMethod));
            }
            // Explicit arguments for a non-generic method are ignored
            if !variables.is_empty() {
                if explicit.len() != variables.len() {
                    return Ok(Applicability::Problem(ProblemReason::TypeParameterArityMismatch));
                }
                let substitution = self.substitution_of(&variables, explicit);
                for (&variable, &argument) in variables.iter().zip(explicit) {
                    if self.bound_check(&substitution, variable, argument)? == BoundCheck::Mismatch {
                        return Ok(Applicability::Problem(ProblemReason::ParameterBoundMismatch));
                    }
                }
                target = self.instantiate_method(candidate, explicit.clone(), false)?;
            }
        } else if !variables.is_empty() {
            match self.infer_method_invocation(candidate, arguments, site.expected_type, phase)? {
                Some(instantiated) => target = instantiated,
                None => return Ok(Applicability::NotApplicable),
            }
        }

        if self.is_method_compatible(target, arguments, phase)? {
            Ok(Applicability::Applicable(target))
        } else {
            Ok(Applicability::NotApplicable)
        }
    }

    fn most_specific_method(
        &mut self,
        selector: &str,
        visible: &[MethodId],
        phase: CompatibilityPhase,
    ) -> LookupResult<Resolution<MethodId>> {
        let mut maximal = Vec::new();
        for &candidate in visible {
            let mut most_specific = true;
            for &other in visible {
                if other != candidate && !self.is_more_specific(candidate, other, phase)? {
                    most_specific = false;
                    break;
                }
            }
            if most_specific {
                maximal.push(candidate);
            }
        }
        match maximal.len() {
            0 => Ok(Resolution::Problem(ProblemBinding::with_closest(
                selector,
                ProblemReason::Ambiguous,
                visible[0],
            ))),
            1 => Ok(Resolution::Found(maximal[0])),
            _ => self.break_tie(selector, &maximal),
        }
    }

    // Several maximally specific methods: they must share a signature
    fn break_tie(&mut self, selector: &str, maximal: &[MethodId]) -> LookupResult<Resolution<MethodId>> {
        let first = self.erased_parameter_types(maximal[0])?;
        for &other in &maximal[1..] {
            if self.erased_parameter_types(other)? != first {
                return Ok(Resolution::Problem(ProblemBinding::with_closest(
                    selector,
                    ProblemReason::Ambiguous,
                    maximal[0],
                )));
            }
        }
        let concrete: Vec<MethodId> = maximal.iter().copied().filter(|&m| !self.method(m).is_abstract()).collect();
        match concrete.len() {
            1 => return Ok(Resolution::Found(concrete[0])),
            0 => {}
            _ => {
                return Ok(Resolution::Problem(ProblemBinding::with_closest(
                    selector,
                    ProblemReason::Ambiguous,
                    concrete[0],
                )))
            }
        }
        for &candidate in maximal {
            let return_type = self.method(candidate).return_type;
            let mut most_specific = true;
            for &other in maximal {
                let other_return = self.method(other).return_type;
                if other != candidate && !self.is_compatible_with(return_type, other_return)? {
                    most_specific = false;
                    break;
                }
            }
            if most_specific {
                return Ok(Resolution::Found(candidate));
            }
        }
        Ok(Resolution::Problem(ProblemBinding::with_closest(
            selector,
            ProblemReason::Ambiguous,
            maximal[0],
        )))
    }

    /// `first` is at least as specific as `second`: `second` accepts the
    /// parameter types of `first`
    fn is_more_specific(&mut self, first: MethodId, second: MethodId, phase: CompatibilityPhase) -> LookupResult<bool> {
        let parameters = self.method(first).parameters.clone();
        let second_parameters = self.method(second).parameters.clone();
        if phase == CompatibilityPhase::VariableArity
            && self.method(first).is_varargs()
            && self.method(second).is_varargs()
            && parameters.len() == second_parameters.len()
        {
            for (&a, &b) in parameters.iter().zip(&second_parameters) {
                if !self.is_argument_compatible(a, b, CompatibilityPhase::Loose)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        self.is_method_compatible(second, &parameters, phase)
    }

    fn erased_parameter_types(&mut self, method: MethodId) -> LookupResult<Vec<TypeId>> {
        let parameters = self.method(method).parameters.clone();
        let mut erased = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            erased.push(self.erasure(parameter)?);
        }
        Ok(erased)
    }

    /// Methods named `selector` visible through `receiver`, overridden ones skipped
    ///
    /// Interfaces of an interface receiver come first, followed by
    /// `java.lang.Object`; for a class receiver the class chain comes first,
    /// followed by the interfaces it implements.
    pub(crate) fn collect_methods(&mut self, receiver: TypeId, selector: &str) -> LookupResult<Vec<MethodId>> {
        let mut found: Vec<MethodId> = Vec::new();
        let mut erased_found: Vec<Vec<TypeId>> = Vec::new();
        let mut visited = FxHashSet::default();
        let mut interfaces: Vec<TypeId> = Vec::new();

        let receiver_is_interface = self
            .erasure_class(receiver)
            .and_then(|c| self.class(c))
            .is_some_and(|c| c.is_interface());
        let mut chain: Vec<TypeId> = Vec::new();
        match self.ty(receiver) {
            TypeBinding::TypeVariable(_) | TypeBinding::Captured(_) | TypeBinding::Wildcard(_) => {
                if let Some(superclass) = self.superclass(receiver)? {
                    chain.push(superclass);
                }
                interfaces.extend(self.super_interfaces(receiver)?);
            }
            TypeBinding::Array(_) => chain.push(self.object_type()?),
            _ if receiver_is_interface => interfaces.push(receiver),
            _ => chain.push(receiver),
        }

        // Class chain
        let mut current = chain.pop();
        while let Some(ty) = current {
            let Some(erased) = self.erasure_class(ty) else {
                break;
            };
            if !visited.insert(erased) {
                break;
            }
            for method in self.methods_named(ty, selector)? {
                self.add_unless_overridden(method, &mut found, &mut erased_found)?;
            }
            interfaces.extend(self.super_interfaces(ty)?);
            current = self.superclass(ty)?;
        }

        // Interfaces, breadth first
        let mut index = 0;
        while index < interfaces.len() {
            let interface = interfaces[index];
            index += 1;
            let Some(erased) = self.erasure_class(interface) else {
                continue;
            };
            if !visited.insert(erased) {
                continue;
            }
            for method in self.methods_named(interface, selector)? {
                self.add_unless_overridden(method, &mut found, &mut erased_found)?;
            }
            interfaces.extend(self.super_interfaces(interface)?);
        }

        if receiver_is_interface {
            let object = self.object_type()?;
            if visited.insert(object) {
                for method in self.methods_named(object, selector)? {
                    if self.method(method).modifiers.contains(Modifiers::PUBLIC) {
                        self.add_unless_overridden(method, &mut found, &mut erased_found)?;
                    }
                }
            }
        }
        Ok(found)
    }

    fn add_unless_overridden(
        &mut self,
        method: MethodId,
        found: &mut Vec<MethodId>,
        erased_found: &mut Vec<Vec<TypeId>>,
    ) -> LookupResult<()> {
        let erased = self.erased_parameter_types(method)?;
        if erased_found.iter().any(|existing| *existing == erased) {
            return Ok(());
        }
        found.push(method);
        erased_found.push(erased);
        Ok(())
    }

    /// Public `clone()` of an array type, returning the array type
    pub fn array_clone_method(&mut self, array: TypeId) -> MethodId {
        if let Some(&method) = self.caches.array_clones.get(&array) {
            return method;
        }
        let method = self.alloc_method(MethodBinding {
            selector: well_known::CLONE.to_string(),
            modifiers: Modifiers::PUBLIC,
            declaring_class: array,
            return_type: array,
            parameters: Vec::new(),
            thrown_exceptions: Vec::new(),
            type_variables: Vec::new(),
            origin: MethodOrigin::ArrayClone,
            is_raw: false,
        });
        self.caches.array_clones.insert(array, method);
        method
    }

    /// Public final `length` field of an array type
    pub fn array_length_field(&mut self, array: TypeId) -> FieldId {
        if let Some(&field) = self.caches.array_lengths.get(&array) {
            return field;
        }
        let int = self.base_type(BaseType::Int);
        let field = self.alloc_field(FieldBinding {
            name: well_known::LENGTH.to_string(),
            modifiers: Modifiers::PUBLIC | Modifiers::FINAL,
            ty: int,
            declaring_class: array,
            original: None,
        });
        self.caches.array_lengths.insert(array, field);
        field
    }
}

#[cfg(test)]
mod tests {
    use super::InvocationSite;
    use crate::binding::{BaseType, Modifiers};
    use crate::decl::{CompilationUnitDecl, MethodDecl, TypeDecl, TypeRef};
    use crate::env::LookupEnvironment;
    use crate::error::ProblemReason;
    use crate::options::CompilerOptions;
    use crate::provider::{BinaryTypeDescriptor, InMemoryProvider};
    use crate::reporter::SilentReporter;

    #[test]
    fn test_array_members_are_shared() {
        let mut provider = InMemoryProvider::new();
        provider.add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None));
        let mut env = LookupEnvironment::new(CompilerOptions::default(), Box::new(provider), Box::new(SilentReporter));
        let unit = env.build_type_bindings(CompilationUnitDecl::new("A.java", "").with_type(TypeDecl::class("A")));
        env.complete_type_bindings().unwrap();
        let scope = env.class_scope(env.unit_types(unit)[0]).unwrap();
        let int = env.base_type(BaseType::Int);
        let array = env.create_array_type(int, 1);

        let mut site = InvocationSite::at(0);
        let clone = env.find_method(scope, array, "clone", &[], &mut site).unwrap().found().unwrap();
        assert_eq!(env.method(clone).return_type, array);
        assert_eq!(env.array_clone_method(array), clone);
        let length = env.array_length_field(array);
        assert_eq!(env.array_length_field(array), length);
        assert!(env.field(length).modifiers.contains(Modifiers::FINAL));
    }

    #[test]
    fn test_unknown_selector_is_not_found() {
        let mut provider = InMemoryProvider::new();
        provider.add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None));
        let mut env = LookupEnvironment::new(CompilerOptions::default(), Box::new(provider), Box::new(SilentReporter));
        let unit = env.build_type_bindings(
            CompilationUnitDecl::new("A.java", "")
                .with_type(TypeDecl::class("A").with_method(MethodDecl::new("f", TypeRef::void()).param("x", TypeRef::int()))),
        );
        env.complete_type_bindings().unwrap();
        let a = env.unit_types(unit)[0];
        let scope = env.class_scope(a).unwrap();
        let mut site = InvocationSite::at(0);
        let missing = env.find_method(scope, a, "g", &[], &mut site).unwrap();
        assert_eq!(missing.problem_reason(), Some(ProblemReason::NotFound));
        assert_eq!(missing.found_or_closest(), None);

        let boolean = env.base_type(BaseType::Boolean);
        let wrong = env.find_method(scope, a, "f", &[boolean], &mut site).unwrap();
        assert_eq!(wrong.problem_reason(), Some(ProblemReason::NotFound));
        assert!(wrong.found_or_closest().is_some());
    }
}
