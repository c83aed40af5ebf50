//! Type argument inference for generic method invocations
//!
//! Constraints are collected from every (parameter, argument) pair and, when
//! a variable is still free, from the expected type of the invocation. Each
//! variable is then fixed from its equality constraints, the least upper
//! bound of its lower bounds, the expected type, its upper bounds and
//! finally its declared bound, in that order.

use crate::binding::{BaseType, MethodBinding, MethodId, MethodOrigin, TypeBinding, TypeId, WildcardKind};
use crate::env::LookupEnvironment;
use crate::error::LookupResult;
use crate::generics::BoundCheck;
use crate::lookup::CompatibilityPhase;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    /// Parameter and argument are the same type
    Equal,
    /// Argument converts to the parameter
    Lower,
    /// Parameter converts to the argument
    Upper,
}

#[derive(Debug, Default, Clone)]
struct Constraints {
    equal: Vec<TypeId>,
    lower: Vec<TypeId>,
    upper: Vec<TypeId>,
}

impl Constraints {
    fn push(&mut self, relation: Relation, ty: TypeId) {
        let list = match relation {
            Relation::Equal => &mut self.equal,
            Relation::Lower => &mut self.lower,
            Relation::Upper => &mut self.upper,
        };
        if !list.contains(&ty) {
            list.push(ty);
        }
    }

    fn is_empty(&self) -> bool {
        self.equal.is_empty() && self.lower.is_empty() && self.upper.is_empty()
    }
}

impl LookupEnvironment {
    /// Infer the type arguments of a generic `method` from `arguments`
    ///
    /// Answers the instantiated method, or `None` when the constraints are
    /// contradictory or the inferred arguments violate a declared bound.
    pub fn infer_method_invocation(
        &mut self,
        method: MethodId,
        arguments: &[TypeId],
        expected: Option<TypeId>,
        phase: CompatibilityPhase,
    ) -> LookupResult<Option<MethodId>> {
        let binding = self.method(method);
        let variables = binding.type_variables.clone();
        let parameters = binding.parameters.clone();
        let return_type = binding.return_type;
        let is_varargs = binding.is_varargs();
        if variables.is_empty() {
            return Ok(Some(method));
        }

        let mut pairs = Vec::with_capacity(arguments.len());
        if phase == CompatibilityPhase::VariableArity && is_varargs {
            let Some((&last, fixed)) = parameters.split_last() else {
                return Ok(None);
            };
            if arguments.len() < fixed.len() {
                return Ok(None);
            }
            let Some(component) = self.array_component(last) else {
                return Ok(None);
            };
            pairs.extend(fixed.iter().copied().zip(arguments.iter().copied()));
            pairs.extend(arguments[fixed.len()..].iter().map(|&argument| (component, argument)));
        } else {
            if parameters.len() != arguments.len() {
                return Ok(None);
            }
            pairs.extend(parameters.iter().copied().zip(arguments.iter().copied()));
        }

        let mut constraints = vec![Constraints::default(); variables.len()];
        for (parameter, argument) in pairs {
            let argument = match self.ty(argument).as_base() {
                Some(BaseType::Null) => continue,
                Some(base) if self.ty(parameter).as_base().is_none() => {
                    // Primitive against a reference parameter: boxing waits for the loose phase
                    if phase == CompatibilityPhase::Strict || !self.options().boxing_enabled() {
                        continue;
                    }
                    match self.boxed_type(base)? {
                        Some(boxed) => boxed,
                        None => continue,
                    }
                }
                _ => argument,
            };
            self.collect_constraints(&variables, &mut constraints, parameter, argument, Relation::Lower)?;
        }

        let mut inferred: Vec<Option<TypeId>> = vec![None; variables.len()];
        for (index, constraint) in constraints.iter().enumerate() {
            if let Some((&first, rest)) = constraint.equal.split_first() {
                if rest.iter().any(|&other| other != first) {
                    trace!(method = %method, "conflicting equality constraints");
                    return Ok(None);
                }
                inferred[index] = Some(first);
            } else if !constraint.lower.is_empty() {
                match self.lower_upper_bound(&constraint.lower)? {
                    Some(lub) => inferred[index] = Some(lub),
                    None => return Ok(None),
                }
            }
        }

        if inferred.iter().any(Option::is_none) {
            if let Some(expected) = expected {
                let mut from_expected = vec![Constraints::default(); variables.len()];
                let expected = match self.ty(expected).as_base() {
                    Some(base) if self.ty(return_type).as_base().is_none() => {
                        self.boxed_type(base)?.unwrap_or(expected)
                    }
                    _ => expected,
                };
                self.collect_constraints(&variables, &mut from_expected, return_type, expected, Relation::Upper)?;
                for (index, constraint) in from_expected.iter().enumerate() {
                    if inferred[index].is_some() || constraint.is_empty() {
                        continue;
                    }
                    if let Some(&equal) = constraint.equal.first() {
                        inferred[index] = Some(equal);
                    } else if let Some(glb) = self.greater_lower_bound(&constraint.upper)? {
                        inferred[index] = glb.first().copied();
                    }
                }
            }
        }

        let mut type_arguments = Vec::with_capacity(variables.len());
        for (index, &variable) in variables.iter().enumerate() {
            if let Some(argument) = inferred[index] {
                type_arguments.push(argument);
                continue;
            }
            if !constraints[index].upper.is_empty() {
                if let Some(first) = self.greater_lower_bound(&constraints[index].upper)?.and_then(|glb| glb.first().copied()) {
                    type_arguments.push(first);
                    continue;
                }
            }
            type_arguments.push(self.default_type_argument(variable, &variables)?);
        }

        let instantiated = self.instantiate_method(method, type_arguments.clone(), true)?;
        let substitution = self.substitution_of(&variables, &type_arguments);
        for (&variable, &argument) in variables.iter().zip(&type_arguments) {
            if self.bound_check(&substitution, variable, argument)? == BoundCheck::Mismatch {
                trace!(method = %method, "inferred argument violates its bound");
                return Ok(None);
            }
        }
        Ok(Some(instantiated))
    }

    // Declared bound of an unconstrained variable, erased when it refers to the variables being inferred
    fn default_type_argument(&mut self, variable: TypeId, variables: &[TypeId]) -> LookupResult<TypeId> {
        let bound = self.ty(variable).as_type_variable().and_then(|tv| tv.first_bound);
        match bound {
            Some(bound) if self.mentions_any(bound, variables) => self.erasure(bound),
            Some(bound) => Ok(bound),
            None => self.object_type(),
        }
    }

    fn collect_constraints(
        &mut self,
        variables: &[TypeId],
        constraints: &mut [Constraints],
        parameter: TypeId,
        argument: TypeId,
        relation: Relation,
    ) -> LookupResult<()> {
        let parameter = self.resolved(parameter)?;
        let argument = self.resolved(argument)?;
        if let Some(index) = variables.iter().position(|&v| v == parameter) {
            if self.ty(argument).as_base().is_none() && !self.ty(argument).is_problem() {
                constraints[index].push(relation, argument);
            }
            return Ok(());
        }
        if !self.mentions_any(parameter, variables) {
            return Ok(());
        }
        match self.ty(parameter) {
            TypeBinding::Array(array) => {
                let (leaf, dimensions) = (array.leaf, array.dimensions);
                let Some(target) = self.ty(argument).as_array() else {
                    return Ok(());
                };
                let (target_leaf, target_dimensions) = (target.leaf, target.dimensions);
                let component = self.create_array_type(leaf, dimensions - 1);
                let target_component = self.create_array_type(target_leaf, target_dimensions - 1);
                if self.ty(target_component).as_base().is_some() {
                    return Ok(());
                }
                self.collect_constraints(variables, constraints, component, target_component, relation)
            }
            TypeBinding::Parameterized(p) => {
                let (generic, formals) = (p.generic, p.arguments.clone());
                let actual = match relation {
                    Relation::Lower => self.as_super_type(argument, generic)?,
                    Relation::Equal | Relation::Upper => {
                        (self.erasure_class(argument) == Some(generic)).then_some(argument)
                    }
                };
                let Some(actual) = actual else {
                    return Ok(());
                };
                let Some(actuals) = self.ty(actual).as_parameterized().map(|p| p.arguments.clone()) else {
                    // Raw actual: unchecked, nothing to learn
                    return Ok(());
                };
                for (&formal, &actual) in formals.iter().zip(&actuals) {
                    self.collect_argument_constraints(variables, constraints, formal, actual, relation)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn collect_argument_constraints(
        &mut self,
        variables: &[TypeId],
        constraints: &mut [Constraints],
        formal: TypeId,
        actual: TypeId,
        relation: Relation,
    ) -> LookupResult<()> {
        let formal_wildcard = self.ty(formal).as_wildcard().map(|w| (w.kind, w.bound));
        let actual_wildcard = self.ty(actual).as_wildcard().map(|w| (w.kind, w.bound));
        match (formal_wildcard, actual_wildcard) {
            (Some((WildcardKind::Extends, Some(bound))), Some((WildcardKind::Extends, Some(actual_bound)))) => {
                self.collect_constraints(variables, constraints, bound, actual_bound, relation)
            }
            (Some((WildcardKind::Extends, Some(bound))), None) => {
                self.collect_constraints(variables, constraints, bound, actual, Relation::Lower)
            }
            (Some((WildcardKind::Super, Some(bound))), Some((WildcardKind::Super, Some(actual_bound)))) => {
                self.collect_constraints(variables, constraints, bound, actual_bound, Relation::Upper)
            }
            (Some((WildcardKind::Super, Some(bound))), None) => {
                self.collect_constraints(variables, constraints, bound, actual, Relation::Upper)
            }
            (None, None) => self.collect_constraints(variables, constraints, formal, actual, Relation::Equal),
            _ => Ok(()),
        }
    }

    /// Apply a generic method to type arguments
    ///
    /// Instances are uniqued per (method, arguments).
    pub fn instantiate_method(
        &mut self,
        method: MethodId,
        type_arguments: Vec<TypeId>,
        inferred: bool,
    ) -> LookupResult<MethodId> {
        let key = (method, type_arguments);
        if let Some(&cached) = self.caches.instantiated_methods.get(&key) {
            return Ok(cached);
        }
        let (method, type_arguments) = key;
        let source = self.method(method).clone();
        let substitution = self.substitution_of(&source.type_variables, &type_arguments);
        let mut parameters = Vec::with_capacity(source.parameters.len());
        for &parameter in &source.parameters {
            parameters.push(self.substitute(&substitution, parameter)?);
        }
        let return_type = self.substitute(&substitution, source.return_type)?;
        let mut thrown_exceptions = Vec::with_capacity(source.thrown_exceptions.len());
        for &exception in &source.thrown_exceptions {
            thrown_exceptions.push(self.substitute(&substitution, exception)?);
        }
        let id = self.alloc_method(MethodBinding {
            parameters,
            return_type,
            thrown_exceptions,
            type_variables: Vec::new(),
            origin: MethodOrigin::Instantiated {
                original: method,
                type_arguments: type_arguments.clone(),
                inferred,
            },
            ..source
        });
        self.caches.instantiated_methods.insert((method, type_arguments), id);
        self.note_method_referrers(id);
        trace!(method = %id, original = %method, inferred, "instantiated generic method");
        Ok(id)
    }
}
