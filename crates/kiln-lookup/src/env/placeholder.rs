//! Placeholder (unresolved reference) bookkeeping
//!
//! Binary signatures name classes that may not be loaded yet. Such names
//! become placeholders registered in their package. Every binding that
//! stores a placeholder is recorded as a referrer; the single resolution
//! event patches all referrers and merges the constructed-type caches keyed
//! by the placeholder into the resolved type's lists.

use super::LookupEnvironment;
use crate::binding::{FieldId, MethodId, PackageId, TypeBinding, TypeId, UnresolvedBinding};
use crate::error::{AbortCompilation, LookupResult, ProblemReason};
use crate::names::{well_known, CompoundName};
use crate::reporter::ProblemId;
use tracing::trace;

/// Binding that holds a placeholder in one of its type slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Referrer {
    Type(TypeId),
    Field(FieldId),
    Method(MethodId),
}

fn swap_slot(slot: &mut TypeId, from: TypeId, to: TypeId) {
    if *slot == from {
        *slot = to;
    }
}

fn swap_optional(slot: &mut Option<TypeId>, from: TypeId, to: TypeId) {
    if *slot == Some(from) {
        *slot = Some(to);
    }
}

fn swap_all(slots: &mut [TypeId], from: TypeId, to: TypeId) {
    for slot in slots {
        swap_slot(slot, from, to);
    }
}

impl LookupEnvironment {
    /// Placeholder that has not been resolved yet
    pub fn is_pending_placeholder(&self, id: TypeId) -> bool {
        matches!(self.ty(id), TypeBinding::Unresolved(UnresolvedBinding { resolved: None, .. }))
    }

    fn add_referrer(&mut self, placeholder: TypeId, referrer: Referrer) {
        let list = self.referrers.entry(placeholder).or_default();
        if !list.contains(&referrer) {
            list.push(referrer);
        }
    }

    pub(crate) fn note_referrers(&mut self, holder: TypeId, components: &[TypeId]) {
        for &component in components {
            if self.is_pending_placeholder(component) {
                self.add_referrer(component, Referrer::Type(holder));
            }
        }
    }

    pub(crate) fn note_field_referrer(&mut self, field: FieldId, ty: TypeId) {
        if self.is_pending_placeholder(ty) {
            self.add_referrer(ty, Referrer::Field(field));
        }
    }

    pub(crate) fn note_method_referrers(&mut self, method: MethodId) {
        let binding = self.method(method);
        let mut components = binding.parameters.clone();
        components.push(binding.return_type);
        components.extend(binding.thrown_exceptions.iter().copied());
        for component in components {
            if self.is_pending_placeholder(component) {
                self.add_referrer(component, Referrer::Method(method));
            }
        }
    }

    /// Known type or placeholder for a fully qualified name, without asking the provider
    pub(crate) fn type_or_placeholder(&mut self, name: &CompoundName) -> TypeId {
        let package = self.create_package(&name.parent());
        let simple = name.last().unwrap_or_default().to_string();
        if let Some(known) = self.packages[package.index()].known_type(&simple) {
            return match self.ty(known) {
                TypeBinding::Unresolved(UnresolvedBinding {
                    resolved: Some(target), ..
                }) => *target,
                _ => known,
            };
        }
        let id = self.alloc_type(TypeBinding::Unresolved(UnresolvedBinding {
            compound_name: name.clone(),
            resolved: None,
        }));
        self.packages[package.index()].known_types.insert(simple, id);
        trace!(placeholder = %id, name = %name, "created placeholder");
        id
    }

    /// Register a freshly built type under its simple name
    ///
    /// A placeholder held under that name is resolved to the new type.
    /// Returns the existing type when the name is already taken.
    pub(crate) fn register_type(&mut self, package: PackageId, simple: &str, id: TypeId) -> Option<TypeId> {
        let existing = self.packages[package.index()].known_type(simple);
        match existing {
            Some(existing) if matches!(self.ty(existing), TypeBinding::Unresolved(_)) => {
                self.packages[package.index()].known_types.insert(simple.to_string(), id);
                if self.is_pending_placeholder(existing) {
                    self.swap_placeholder(existing, id);
                }
                None
            }
            Some(existing) => Some(existing),
            None => {
                let binding = &mut self.packages[package.index()];
                binding.known_types.insert(simple.to_string(), id);
                binding.missing_types.remove(simple);
                None
            }
        }
    }

    /// Resolve a placeholder by asking the provider
    ///
    /// A name the provider cannot supply is reported and resolved to a
    /// problem type, except for `java.lang.Object`, whose absence aborts.
    pub fn resolve_placeholder(&mut self, placeholder: TypeId) -> LookupResult<TypeId> {
        let name = match self.ty(placeholder) {
            TypeBinding::Unresolved(UnresolvedBinding {
                resolved: Some(target), ..
            }) => return Ok(*target),
            TypeBinding::Unresolved(unresolved) => unresolved.compound_name.clone(),
            _ => return Ok(placeholder),
        };
        self.fetch_from_provider(&name)?;
        if let TypeBinding::Unresolved(UnresolvedBinding {
            resolved: Some(target), ..
        }) = self.ty(placeholder)
        {
            return Ok(*target);
        }
        if name.dotted() == well_known::JAVA_LANG_OBJECT {
            return Err(AbortCompilation::MissingFoundationType { name: name.dotted() });
        }
        self.report(ProblemId::IsClassPathCorrect, vec![name.dotted()]);
        let problem = self.create_problem_type(name, ProblemReason::NotFound, None);
        self.swap_placeholder(placeholder, problem);
        Ok(problem)
    }

    /// Patch every referrer of `placeholder` to `target` and merge caches
    pub(crate) fn swap_placeholder(&mut self, placeholder: TypeId, target: TypeId) {
        if let TypeBinding::Unresolved(unresolved) = self.ty_mut(placeholder) {
            if unresolved.resolved.is_some() {
                return;
            }
            unresolved.resolved = Some(target);
        }
        self.stats.placeholder_resolutions += 1;
        trace!(placeholder = %placeholder, target = %target, "resolved placeholder");

        let caches = &mut self.caches;
        for cache in [&mut caches.arrays, &mut caches.parameterized, &mut caches.raw] {
            if let Some(list) = cache.remove(&placeholder) {
                cache.entry(target).or_default().extend(list);
            }
        }
        if let Some(list) = caches.wildcards.remove(&Some(placeholder)) {
            caches.wildcards.entry(Some(target)).or_default().extend(list);
        }

        let Some(referrers) = self.referrers.remove(&placeholder) else {
            return;
        };
        for referrer in referrers {
            match referrer {
                Referrer::Type(holder) => self.patch_type_slots(holder, placeholder, target),
                Referrer::Field(field) => {
                    let binding = &mut self.fields[field.index()];
                    swap_slot(&mut binding.ty, placeholder, target);
                    swap_slot(&mut binding.declaring_class, placeholder, target);
                }
                Referrer::Method(method) => {
                    let binding = self.method_mut(method);
                    swap_all(&mut binding.parameters, placeholder, target);
                    swap_slot(&mut binding.return_type, placeholder, target);
                    swap_all(&mut binding.thrown_exceptions, placeholder, target);
                    swap_slot(&mut binding.declaring_class, placeholder, target);
                }
            }
        }
    }

    fn patch_type_slots(&mut self, holder: TypeId, from: TypeId, to: TypeId) {
        match self.ty_mut(holder) {
            TypeBinding::Class(class) => {
                swap_optional(&mut class.superclass, from, to);
                swap_all(&mut class.super_interfaces, from, to);
                swap_optional(&mut class.enclosing, from, to);
            }
            TypeBinding::Array(array) => swap_slot(&mut array.leaf, from, to),
            TypeBinding::Parameterized(p) => {
                swap_slot(&mut p.generic, from, to);
                swap_all(&mut p.arguments, from, to);
                swap_optional(&mut p.enclosing, from, to);
            }
            TypeBinding::Raw(raw) => {
                swap_slot(&mut raw.generic, from, to);
                swap_optional(&mut raw.enclosing, from, to);
            }
            TypeBinding::Wildcard(wildcard) => {
                swap_optional(&mut wildcard.generic, from, to);
                swap_optional(&mut wildcard.bound, from, to);
                swap_all(&mut wildcard.other_bounds, from, to);
            }
            TypeBinding::TypeVariable(tv) => {
                swap_optional(&mut tv.first_bound, from, to);
                swap_optional(&mut tv.superclass, from, to);
                swap_all(&mut tv.super_interfaces, from, to);
            }
            TypeBinding::Captured(capture) => {
                swap_all(&mut capture.upper_bounds, from, to);
                swap_optional(&mut capture.lower_bound, from, to);
            }
            TypeBinding::Base(_) | TypeBinding::Unresolved(_) | TypeBinding::Problem(_) => {}
        }
    }
}
