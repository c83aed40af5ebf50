//! Bound checks, least upper bound and greatest lower bound

use crate::binding::{TypeBinding, TypeId, WildcardKind};
use crate::env::LookupEnvironment;
use crate::error::LookupResult;
use crate::generics::Substitution;
use crate::reporter::ProblemId;
use rustc_hash::FxHashSet;
use tracing::trace;

// Nested lub computations past this depth answer Object (`lub(Integer, String)` recurses forever)
const MAX_LUB_DEPTH: u32 = 4;

/// Outcome of checking a type argument against a type variable's bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundCheck {
    /// Argument satisfies every bound
    Ok,
    /// Satisfied only after erasure
    Unchecked,
    /// Argument violates a bound
    Mismatch,
}

/// Bounds of two wildcards applied to the same type variable
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CombinedBounds {
    /// Upper bounds, all of which apply
    pub upper: Vec<TypeId>,
    /// Lower bound, if any
    pub lower: Option<TypeId>,
}

impl LookupEnvironment {
    /// Check `argument` against the bounds of `variable`
    ///
    /// The bounds are substituted first, so `T extends Comparable<T>` is
    /// checked against `Comparable<argument>`.
    pub fn bound_check(
        &mut self,
        substitution: &Substitution,
        variable: TypeId,
        argument: TypeId,
    ) -> LookupResult<BoundCheck> {
        let argument = self.resolved(argument)?;
        let Some(tv) = self.ty(variable).as_type_variable().cloned() else {
            return Ok(BoundCheck::Ok);
        };
        let mut bounds = Vec::with_capacity(tv.super_interfaces.len() + 1);
        if let Some(superclass) = tv.superclass {
            if !self.is_object(superclass) {
                bounds.push(self.substitute(substitution, superclass)?);
            }
        }
        for interface in tv.super_interfaces {
            bounds.push(self.substitute(substitution, interface)?);
        }
        if bounds.is_empty() {
            return Ok(BoundCheck::Ok);
        }

        if let Some(wildcard) = self.ty(argument).as_wildcard() {
            let (kind, bound) = (wildcard.kind, wildcard.bound);
            let Some(bound) = bound else {
                return Ok(BoundCheck::Ok);
            };
            match kind {
                WildcardKind::Unbound => return Ok(BoundCheck::Ok),
                WildcardKind::Extends => {
                    for variable_bound in bounds {
                        if self.is_compatible_with(bound, variable_bound)?
                            || self.is_compatible_with(variable_bound, bound)?
                        {
                            continue;
                        }
                        // Some subclass may still implement the interface
                        if self.is_interface_type(bound) || self.is_interface_type(variable_bound) {
                            continue;
                        }
                        return Ok(BoundCheck::Mismatch);
                    }
                }
                WildcardKind::Super => {
                    for variable_bound in bounds {
                        if !self.is_compatible_with(bound, variable_bound)? {
                            return Ok(BoundCheck::Mismatch);
                        }
                    }
                }
            }
            return Ok(BoundCheck::Ok);
        }

        let mut result = BoundCheck::Ok;
        for variable_bound in bounds {
            let (compatible, unchecked) = self.check_compatibility(argument, variable_bound)?;
            if compatible {
                if unchecked {
                    result = BoundCheck::Unchecked;
                }
                continue;
            }
            let erased_argument = self.erasure(argument)?;
            let erased_bound = self.erasure(variable_bound)?;
            if self.is_compatible_with(erased_argument, erased_bound)? {
                result = BoundCheck::Unchecked;
                continue;
            }
            return Ok(BoundCheck::Mismatch);
        }
        Ok(result)
    }

    fn is_interface_type(&self, ty: TypeId) -> bool {
        self.erasure_class(ty)
            .and_then(|c| self.class(c))
            .is_some_and(|c| c.is_interface())
    }

    /// Is `candidate` within the range of `wildcard`?
    pub fn wildcard_bound_check(&mut self, wildcard: TypeId, candidate: TypeId) -> LookupResult<bool> {
        self.type_argument_contains(wildcard, candidate)
    }

    /// Check every argument of a parameterized type, reporting mismatches
    pub(crate) fn check_type_argument_bounds(&mut self, parameterized: TypeId) -> LookupResult<()> {
        let Some(p) = self.ty(parameterized).as_parameterized() else {
            return Ok(());
        };
        let (generic, arguments) = (p.generic, p.arguments.clone());
        let variables = self.class(generic).map(|c| c.type_variables.clone()).unwrap_or_default();
        let substitution = self.substitution_of(&variables, &arguments);
        for (&variable, &argument) in variables.iter().zip(&arguments) {
            let id = match self.bound_check(&substitution, variable, argument)? {
                BoundCheck::Ok => continue,
                BoundCheck::Unchecked if !self.options().report_unchecked => continue,
                BoundCheck::Unchecked => ProblemId::UncheckedTypeArgument,
                BoundCheck::Mismatch => ProblemId::TypeArgumentMismatch,
            };
            let variable_name = self
                .ty(variable)
                .as_type_variable()
                .map(|tv| tv.name.clone())
                .unwrap_or_default();
            let names = vec![self.type_name(argument), variable_name, self.type_name(generic)];
            self.report(id, names);
        }
        Ok(())
    }

    /// Check the parameterized types collected while hierarchies were connected
    pub(crate) fn run_deferred_bound_checks(&mut self) -> LookupResult<()> {
        let pending = self.deferred_bound_checks.take().unwrap_or_default();
        trace!(count = pending.len(), "running deferred bound checks");
        for parameterized in pending {
            self.check_type_argument_bounds(parameterized)?;
        }
        Ok(())
    }

    /// Least upper bound of reference types
    ///
    /// Answers `None` for primitive inputs. Several minimal erased
    /// candidates produce an intersection (`? extends A & B` with no
    /// generic type).
    pub fn lower_upper_bound(&mut self, types: &[TypeId]) -> LookupResult<Option<TypeId>> {
        let mut unique: Vec<TypeId> = Vec::with_capacity(types.len());
        for &ty in types {
            let ty = self.resolved(ty)?;
            if matches!(self.ty(ty), TypeBinding::Base(crate::binding::BaseType::Null)) {
                continue;
            }
            if !unique.contains(&ty) {
                unique.push(ty);
            }
        }
        if unique.iter().any(|&ty| self.ty(ty).as_base().is_some()) {
            return Ok(None);
        }
        match unique.len() {
            0 => return Ok(None),
            1 => return Ok(Some(unique[0])),
            _ => {}
        }
        if self.lub_depth > MAX_LUB_DEPTH {
            return Ok(Some(self.object_type()?));
        }
        self.lub_depth += 1;
        let result = self.compute_lub(&unique);
        self.lub_depth -= 1;
        result
    }

    fn erased_supertypes(&mut self, ty: TypeId) -> LookupResult<Vec<TypeId>> {
        let start = self.erasure(ty)?;
        let mut result = vec![start];
        let mut seen: FxHashSet<TypeId> = FxHashSet::default();
        seen.insert(start);
        let mut index = 0;
        while index < result.len() {
            let current = result[index];
            index += 1;
            let mut supertypes: Vec<TypeId> = self.superclass(current)?.into_iter().collect();
            supertypes.extend(self.super_interfaces(current)?);
            for supertype in supertypes {
                let erased = self.erasure(supertype)?;
                if seen.insert(erased) {
                    result.push(erased);
                }
            }
        }
        Ok(result)
    }

    fn compute_lub(&mut self, types: &[TypeId]) -> LookupResult<Option<TypeId>> {
        let mut common = self.erased_supertypes(types[0])?;
        for &ty in &types[1..] {
            let supertypes = self.erased_supertypes(ty)?;
            common.retain(|candidate| supertypes.contains(candidate));
        }
        if common.is_empty() {
            return Ok(None);
        }

        let mut minimal = Vec::with_capacity(common.len());
        for &candidate in &common {
            let mut dominated = false;
            for &other in &common {
                if other != candidate && self.is_subclass_of(other, candidate)? {
                    dominated = true;
                    break;
                }
            }
            if !dominated {
                minimal.push(candidate);
            }
        }
        if minimal.len() > 1 {
            minimal.retain(|&candidate| !self.is_object(candidate));
        }

        let mut bounds = Vec::with_capacity(minimal.len());
        for candidate in minimal {
            bounds.push(self.lub_candidate(candidate, types)?);
        }
        // Class bound first
        bounds.sort_by_key(|&bound| self.is_interface_type(bound));
        let Some((&first, rest)) = bounds.split_first() else {
            return Ok(None);
        };
        if rest.is_empty() {
            return Ok(Some(first));
        }
        Ok(Some(self.create_wildcard(None, 0, Some(first), rest.to_vec(), WildcardKind::Extends)))
    }

    // Parameterization of a generic candidate that covers every input
    fn lub_candidate(&mut self, candidate: TypeId, types: &[TypeId]) -> LookupResult<TypeId> {
        let is_generic = self.class(candidate).is_some_and(|c| c.is_generic());
        if !is_generic || !self.options().generics_enabled() {
            return Ok(candidate);
        }
        let mut invocations = Vec::with_capacity(types.len());
        for &ty in types {
            match self.as_super_type(ty, candidate)? {
                Some(supertype) => match self.ty(supertype) {
                    TypeBinding::Parameterized(p) => invocations.push(p.arguments.clone()),
                    _ => return Ok(self.create_raw_type(candidate, None)),
                },
                None => return Ok(self.create_raw_type(candidate, None)),
            }
        }
        let arity = invocations[0].len();
        if invocations.iter().any(|arguments| arguments.len() != arity) {
            return Ok(self.create_raw_type(candidate, None));
        }
        let mut arguments = Vec::with_capacity(arity);
        for rank in 0..arity {
            let first = invocations[0][rank];
            if invocations.iter().all(|arguments| arguments[rank] == first) {
                arguments.push(first);
                continue;
            }
            let mut uppers = Vec::with_capacity(invocations.len());
            for invocation in &invocations {
                uppers.push(self.argument_upper_bound(invocation[rank])?);
            }
            let bound = self.lower_upper_bound(&uppers)?;
            let wildcard = match bound {
                Some(bound) if !self.is_object(bound) => {
                    self.create_wildcard(Some(candidate), rank as u32, Some(bound), Vec::new(), WildcardKind::Extends)
                }
                _ => self.create_wildcard(Some(candidate), rank as u32, None, Vec::new(), WildcardKind::Unbound),
            };
            arguments.push(wildcard);
        }
        Ok(self.create_parameterized_type(candidate, arguments, None))
    }

    fn argument_upper_bound(&mut self, argument: TypeId) -> LookupResult<TypeId> {
        match self.ty(argument).as_wildcard() {
            Some(wildcard) => match (wildcard.kind, wildcard.bound) {
                (WildcardKind::Extends, Some(bound)) => Ok(bound),
                _ => self.object_type(),
            },
            None => Ok(argument),
        }
    }

    /// Greatest lower bound: the members that are not supertypes of another
    ///
    /// Answers `None` when two unrelated classes remain, since no type can
    /// extend both.
    pub fn greater_lower_bound(&mut self, types: &[TypeId]) -> LookupResult<Option<Vec<TypeId>>> {
        let mut unique: Vec<TypeId> = Vec::with_capacity(types.len());
        for &ty in types {
            let ty = self.resolved(ty)?;
            if !unique.contains(&ty) {
                unique.push(ty);
            }
        }
        let mut result = Vec::with_capacity(unique.len());
        for (index, &ty) in unique.iter().enumerate() {
            let mut redundant = false;
            for (other_index, &other) in unique.iter().enumerate() {
                if other_index == index || !self.is_compatible_with(other, ty)? {
                    continue;
                }
                // Mutually compatible pairs keep the first one
                if !self.is_compatible_with(ty, other)? || other_index < index {
                    redundant = true;
                    break;
                }
            }
            if !redundant {
                result.push(ty);
            }
        }
        let classes = result
            .iter()
            .filter(|&&ty| self.ty(ty).is_class_like() && !self.is_interface_type(ty))
            .count();
        if classes > 1 {
            return Ok(None);
        }
        Ok(Some(result))
    }

    /// Combine two arguments applied to one type variable
    ///
    /// Non-wildcard arguments count as exact (upper and lower bound both the
    /// argument). Answers `None` when no type satisfies both.
    pub fn combine_wildcards(&mut self, first: TypeId, second: TypeId) -> LookupResult<Option<CombinedBounds>> {
        let a = self.argument_bounds(first)?;
        let b = self.argument_bounds(second)?;
        let mut upper = a.upper;
        upper.extend(b.upper);
        let upper = if upper.len() > 1 {
            match self.greater_lower_bound(&upper)? {
                Some(glb) => glb,
                None => return Ok(None),
            }
        } else {
            upper
        };
        let lower = match (a.lower, b.lower) {
            (Some(x), Some(y)) if x == y => Some(x),
            (Some(x), Some(y)) => {
                // Two exact arguments must agree
                if self.ty(first).as_wildcard().is_none() || self.ty(second).as_wildcard().is_none() {
                    return Ok(None);
                }
                match self.lower_upper_bound(&[x, y])? {
                    Some(lub) => Some(lub),
                    None => return Ok(None),
                }
            }
            (lower, None) | (None, lower) => lower,
        };
        if let Some(lower) = lower {
            for &bound in &upper {
                if !self.is_compatible_with(lower, bound)? {
                    return Ok(None);
                }
            }
        }
        Ok(Some(CombinedBounds { upper, lower }))
    }

    fn argument_bounds(&mut self, argument: TypeId) -> LookupResult<CombinedBounds> {
        let argument = self.resolved(argument)?;
        Ok(match self.ty(argument).as_wildcard() {
            Some(wildcard) => match (wildcard.kind, wildcard.bound) {
                (WildcardKind::Extends, Some(bound)) => {
                    let mut upper = vec![bound];
                    upper.extend(wildcard.other_bounds.iter().copied());
                    CombinedBounds { upper, lower: None }
                }
                (WildcardKind::Super, Some(bound)) => CombinedBounds {
                    upper: Vec::new(),
                    lower: Some(bound),
                },
                _ => CombinedBounds::default(),
            },
            None => CombinedBounds {
                upper: vec![argument],
                lower: Some(argument),
            },
        })
    }
}
