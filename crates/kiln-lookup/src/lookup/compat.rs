//! Argument compatibility, in phases
//!
//! Phase 1 allows identity and widening conversions (plus unchecked
//! conversion). Phase 2 adds boxing and unboxing. Phase 3 adds variable
//! arity invocation. A later phase only runs when the earlier ones found no
//! applicable method.

use crate::binding::{BaseType, MethodId, TypeBinding, TypeId};
use crate::env::LookupEnvironment;
use crate::error::LookupResult;

/// Applicability phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompatibilityPhase {
    /// Identity, widening and unchecked conversion
    Strict,
    /// Adds boxing and unboxing
    Loose,
    /// Adds variable arity invocation
    VariableArity,
}

impl LookupEnvironment {
    /// Phases enabled by the compiler options, in order
    pub fn compatibility_phases(&self) -> Vec<CompatibilityPhase> {
        let mut phases = vec![CompatibilityPhase::Strict];
        if self.options().boxing_enabled() {
            phases.push(CompatibilityPhase::Loose);
        }
        if self.options().varargs_enabled() {
            phases.push(CompatibilityPhase::VariableArity);
        }
        phases
    }

    /// Is an argument of type `argument` acceptable for `parameter`?
    pub fn is_argument_compatible(
        &mut self,
        argument: TypeId,
        parameter: TypeId,
        phase: CompatibilityPhase,
    ) -> LookupResult<bool> {
        if self.is_compatible_with(argument, parameter)? {
            return Ok(true);
        }
        if phase == CompatibilityPhase::Strict || !self.options().boxing_enabled() {
            return Ok(false);
        }
        match (self.ty(argument).as_base(), self.ty(parameter).as_base()) {
            (Some(BaseType::Null), _) => Ok(false),
            (Some(base), None) => match self.boxed_type(base)? {
                Some(boxed) => self.is_compatible_with(boxed, parameter),
                None => Ok(false),
            },
            (None, Some(base)) => Ok(self.unboxed_base(argument).is_some_and(|unboxed| unboxed.widens_to(base))),
            _ => Ok(false),
        }
    }

    /// Are the arguments acceptable for `method` in the given phase?
    pub fn is_method_compatible(
        &mut self,
        method: MethodId,
        arguments: &[TypeId],
        phase: CompatibilityPhase,
    ) -> LookupResult<bool> {
        let parameters = self.method(method).parameters.clone();
        if parameters.len() == arguments.len() {
            let mut all = true;
            for (&argument, &parameter) in arguments.iter().zip(&parameters) {
                let element_phase = phase.min(CompatibilityPhase::Loose);
                if !self.is_argument_compatible(argument, parameter, element_phase)? {
                    all = false;
                    break;
                }
            }
            if all {
                return Ok(true);
            }
        }
        if phase != CompatibilityPhase::VariableArity || !self.method(method).is_varargs() {
            return Ok(false);
        }
        let Some((&last, fixed)) = parameters.split_last() else {
            return Ok(false);
        };
        if arguments.len() < fixed.len() {
            return Ok(false);
        }
        let Some(component) = self.array_component(last) else {
            return Ok(false);
        };
        for (&argument, &parameter) in arguments.iter().zip(fixed) {
            if !self.is_argument_compatible(argument, parameter, CompatibilityPhase::Loose)? {
                return Ok(false);
            }
        }
        for &argument in &arguments[fixed.len()..] {
            if !self.is_argument_compatible(argument, component, CompatibilityPhase::Loose)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Component type of an array type, one dimension down
    pub fn array_component(&mut self, ty: TypeId) -> Option<TypeId> {
        match self.ty(ty) {
            TypeBinding::Array(array) => {
                let (leaf, dimensions) = (array.leaf, array.dimensions);
                Some(self.create_array_type(leaf, dimensions - 1))
            }
            _ => None,
        }
    }
}
