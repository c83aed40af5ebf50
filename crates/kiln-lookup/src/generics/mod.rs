//! Generics engine
//!
//! Erasure, subtyping with type-argument containment, substitution,
//! bound checks, least upper and greatest lower bounds, capture conversion
//! and generic method inference.

pub mod bounds;
pub mod capture;
pub mod infer;
pub mod substitute;

pub use bounds::{BoundCheck, CombinedBounds};
pub use substitute::Substitution;

use crate::binding::{BaseType, TypeBinding, TypeId, WildcardKind};
use crate::env::LookupEnvironment;
use crate::error::LookupResult;
use crate::names::well_known;
use rustc_hash::FxHashSet;

// Bound chains deeper than this are malformed (`T extends U, U extends T`)
const MAX_ERASURE_DEPTH: u32 = 16;

impl LookupEnvironment {
    /// Erasure of a type
    ///
    /// Parameterized and raw types erase to their generic class, type
    /// variables and captures to the erasure of their first bound, arrays
    /// component-wise.
    pub fn erasure(&mut self, ty: TypeId) -> LookupResult<TypeId> {
        self.erasure_at(ty, 0)
    }

    fn erasure_at(&mut self, ty: TypeId, depth: u32) -> LookupResult<TypeId> {
        let ty = self.resolved(ty)?;
        if depth > MAX_ERASURE_DEPTH {
            return self.object_type();
        }
        let bound = match self.ty(ty) {
            TypeBinding::Base(_) | TypeBinding::Class(_) | TypeBinding::Problem(_) | TypeBinding::Unresolved(_) => {
                return Ok(ty)
            }
            TypeBinding::Parameterized(p) => return Ok(p.generic),
            TypeBinding::Raw(raw) => return Ok(raw.generic),
            TypeBinding::Array(array) => {
                let (leaf, dimensions) = (array.leaf, array.dimensions);
                let leaf = self.erasure_at(leaf, depth + 1)?;
                return Ok(self.create_array_type(leaf, dimensions));
            }
            TypeBinding::TypeVariable(tv) => tv.first_bound.or(tv.superclass),
            TypeBinding::Captured(capture) => capture.upper_bounds.first().copied(),
            TypeBinding::Wildcard(wildcard) => match wildcard.kind {
                WildcardKind::Extends => wildcard.bound,
                WildcardKind::Unbound | WildcardKind::Super => None,
            },
        };
        match bound {
            Some(bound) => self.erasure_at(bound, depth + 1),
            None => self.object_type(),
        }
    }

    /// Is a value of type `from` assignable to `to` without boxing?
    ///
    /// Covers identity, widening primitive and widening reference
    /// conversion. A raw type converts to any parameterization of its
    /// generic type (unchecked conversion).
    pub fn is_compatible_with(&mut self, from: TypeId, to: TypeId) -> LookupResult<bool> {
        let from = self.resolved(from)?;
        let to = self.resolved(to)?;
        if from == to {
            return Ok(true);
        }
        match (self.ty(from), self.ty(to)) {
            (TypeBinding::Base(a), TypeBinding::Base(b)) => return Ok(a.widens_to(*b)),
            (TypeBinding::Base(BaseType::Null), _) => return Ok(true),
            (TypeBinding::Base(_), _) | (_, TypeBinding::Base(_)) => return Ok(false),
            (TypeBinding::Problem(_), _) | (_, TypeBinding::Problem(_)) => return Ok(true),
            _ => {}
        }
        if self.is_object(to) {
            return Ok(true);
        }
        // Re-entry through a recursive bound (`T extends Comparable<T>`) is
        // assumed to hold; any other re-entry is a malformed cycle.
        if !self.compat_guard.insert((from, to)) {
            return Ok(self.ty(from).is_type_variable_like() || self.ty(to).is_type_variable_like());
        }
        let result = self.is_reference_compatible(from, to);
        self.compat_guard.remove(&(from, to));
        result
    }

    /// Compatibility of `from` with `to`, and whether it needed an unchecked
    /// conversion somewhere (a raw type standing in for a parameterization)
    pub(crate) fn check_compatibility(&mut self, from: TypeId, to: TypeId) -> LookupResult<(bool, bool)> {
        let before = self.unchecked_conversions;
        let compatible = self.is_compatible_with(from, to)?;
        Ok((compatible, compatible && self.unchecked_conversions > before))
    }

    fn is_reference_compatible(&mut self, from: TypeId, to: TypeId) -> LookupResult<bool> {
        // Target-side cases first
        match self.ty(to) {
            TypeBinding::Captured(capture) => {
                let lower = capture.lower_bound;
                if let Some(lower) = lower {
                    if self.is_compatible_with(from, lower)? {
                        return Ok(true);
                    }
                }
                return self.is_bound_compatible(from, to);
            }
            TypeBinding::Wildcard(wildcard) if wildcard.generic.is_none() => {
                let mut bounds: Vec<TypeId> = wildcard.bound.into_iter().collect();
                bounds.extend(wildcard.other_bounds.iter().copied());
                for bound in bounds {
                    if !self.is_compatible_with(from, bound)? {
                        return Ok(false);
                    }
                }
                return Ok(true);
            }
            TypeBinding::TypeVariable(_) => return self.is_bound_compatible(from, to),
            _ => {}
        }

        match self.ty(from) {
            TypeBinding::TypeVariable(_) | TypeBinding::Captured(_) | TypeBinding::Wildcard(_) => {
                self.is_bound_compatible(from, to)
            }
            TypeBinding::Array(array) => {
                let (leaf, dimensions) = (array.leaf, array.dimensions);
                match self.ty(to) {
                    TypeBinding::Array(target) => {
                        let (target_leaf, target_dimensions) = (target.leaf, target.dimensions);
                        let component = self.create_array_type(leaf, dimensions - 1);
                        let target_component = self.create_array_type(target_leaf, target_dimensions - 1);
                        if self.ty(component).as_base().is_some() || self.ty(target_component).as_base().is_some() {
                            return Ok(component == target_component);
                        }
                        self.is_compatible_with(component, target_component)
                    }
                    _ => {
                        let name = self
                            .erasure_class(to)
                            .and_then(|c| self.class(c))
                            .map(|c| c.compound_name.dotted());
                        Ok(matches!(
                            name.as_deref(),
                            Some(well_known::JAVA_LANG_CLONEABLE) | Some(well_known::JAVA_IO_SERIALIZABLE)
                        ))
                    }
                }
            }
            TypeBinding::Class(_) | TypeBinding::Parameterized(_) | TypeBinding::Raw(_) => {
                let Some(target_class) = self.erasure_class(to) else {
                    return Ok(false);
                };
                let Some(supertype) = self.as_super_type(from, target_class)? else {
                    return Ok(false);
                };
                let target_arguments = match self.ty(to) {
                    TypeBinding::Parameterized(p) => p.arguments.clone(),
                    _ => return Ok(true),
                };
                let source_arguments = match self.ty(supertype) {
                    TypeBinding::Parameterized(p) => p.arguments.clone(),
                    // Unchecked conversion
                    _ => {
                        self.unchecked_conversions += 1;
                        return Ok(true);
                    }
                };
                if source_arguments.len() != target_arguments.len() {
                    return Ok(false);
                }
                for (&target, &source) in target_arguments.iter().zip(&source_arguments) {
                    if !self.type_argument_contains(target, source)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // A type variable, capture or intersection is compatible with `to` when one of its upper bounds is
    fn is_bound_compatible(&mut self, from: TypeId, to: TypeId) -> LookupResult<bool> {
        if self.ty(from).is_class_like() || matches!(self.ty(from), TypeBinding::Array(_)) {
            return Ok(false);
        }
        let mut bounds: Vec<TypeId> = self.superclass(from)?.into_iter().collect();
        bounds.extend(self.super_interfaces(from)?);
        for bound in bounds {
            if bound != from && self.is_compatible_with(bound, to)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The supertype of `ty` whose erasure is `generic_class`, if any
    ///
    /// For `ArrayList<String>` and `List` this answers `List<String>`.
    pub fn as_super_type(&mut self, ty: TypeId, generic_class: TypeId) -> LookupResult<Option<TypeId>> {
        let ty = self.resolved(ty)?;
        let mut visited = FxHashSet::default();
        let mut queue = vec![ty];
        let mut index = 0;
        while index < queue.len() {
            let current = queue[index];
            index += 1;
            if self.erasure_class(current) == Some(generic_class) {
                return Ok(Some(current));
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(superclass) = self.superclass(current)? {
                queue.push(superclass);
            }
            queue.extend(self.super_interfaces(current)?);
        }
        Ok(None)
    }

    /// Does type argument `container` contain `argument`?
    ///
    /// Non-wildcard arguments must be identical; `? extends B` contains
    /// subtypes of `B`, `? super B` supertypes of `B`, `?` everything.
    pub fn type_argument_contains(&mut self, container: TypeId, argument: TypeId) -> LookupResult<bool> {
        let container = self.resolved(container)?;
        let argument = self.resolved(argument)?;
        if container == argument {
            return Ok(true);
        }
        let Some(wildcard) = self.ty(container).as_wildcard() else {
            return Ok(false);
        };
        let (kind, bound) = (wildcard.kind, wildcard.bound);
        let argument_wildcard = self.ty(argument).as_wildcard().map(|w| (w.kind, w.bound));
        match (kind, bound) {
            (WildcardKind::Unbound, _) | (_, None) => Ok(true),
            (WildcardKind::Extends, Some(bound)) => match argument_wildcard {
                Some((WildcardKind::Extends, Some(argument_bound))) => self.is_compatible_with(argument_bound, bound),
                Some(_) => Ok(self.is_object(bound)),
                None => self.is_compatible_with(argument, bound),
            },
            (WildcardKind::Super, Some(bound)) => match argument_wildcard {
                Some((WildcardKind::Super, Some(argument_bound))) => self.is_compatible_with(bound, argument_bound),
                Some(_) => Ok(false),
                None => self.is_compatible_with(bound, argument),
            },
        }
    }
}
