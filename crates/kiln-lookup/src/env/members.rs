//! Supertype and member accessors
//!
//! These are the only entry points that read supertypes, member types,
//! fields and methods. Each one first runs whatever lazy completion the
//! type still needs (binary completion steps, source hierarchy
//! connection, source member building) so callers never observe a
//! half-built binding.

use super::{CompletionStage, LookupEnvironment};
use crate::binding::{FieldId, MethodId, TypeBinding, TypeId, TypeState, WildcardKind};
use crate::error::LookupResult;
use crate::names::well_known;
use rustc_hash::FxHashSet;

impl LookupEnvironment {
    fn ensure_supertypes(&mut self, ty: TypeId) -> LookupResult<()> {
        let Some(class) = self.class(ty) else {
            return Ok(());
        };
        if class.is_binary() {
            self.complete_binary_superclass(ty)?;
            return self.complete_binary_super_interfaces(ty);
        }
        if !class.state.contains(TypeState::BEGIN_HIERARCHY_CHECK)
            && self.source_stage(ty).is_some_and(|stage| stage >= CompletionStage::ImportsResolved)
        {
            self.connect_type_hierarchy(ty)?;
        }
        Ok(())
    }

    fn ensure_members(&mut self, ty: TypeId) -> LookupResult<()> {
        let Some(class) = self.class(ty) else {
            return Ok(());
        };
        if class.is_binary() {
            return self.complete_binary_members(ty);
        }
        if !class.state.contains(TypeState::FIELDS_AND_METHODS_BUILT)
            && self.source_stage(ty).is_some_and(|stage| stage >= CompletionStage::ImportsResolved)
        {
            self.build_fields_and_methods(ty)?;
        }
        Ok(())
    }

    fn resolve_all(&mut self, ids: Vec<TypeId>) -> LookupResult<Vec<TypeId>> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            resolved.push(self.resolved(id)?);
        }
        Ok(resolved)
    }

    /// Direct superclass of any type
    ///
    /// Parameterized types answer the substituted superclass, raw types the
    /// erased one. Arrays answer `Object`; type variables and captures their
    /// class bound.
    pub fn superclass(&mut self, ty: TypeId) -> LookupResult<Option<TypeId>> {
        let ty = self.resolved(ty)?;
        match self.ty(ty) {
            TypeBinding::Class(_) => {
                self.ensure_supertypes(ty)?;
                match self.class(ty).and_then(|class| class.superclass) {
                    Some(superclass) => Ok(Some(self.resolved(superclass)?)),
                    None => Ok(None),
                }
            }
            TypeBinding::Parameterized(p) => {
                let generic = p.generic;
                match self.superclass(generic)? {
                    Some(superclass) => {
                        let substitution = self.substitution_for(ty)?;
                        Ok(Some(self.substitute(&substitution, superclass)?))
                    }
                    None => Ok(None),
                }
            }
            TypeBinding::Raw(raw) => {
                let generic = raw.generic;
                match self.superclass(generic)? {
                    Some(superclass) => Ok(Some(self.raw_erasure(superclass)?)),
                    None => Ok(None),
                }
            }
            TypeBinding::Array(_) => Ok(Some(self.object_type()?)),
            TypeBinding::TypeVariable(tv) => match tv.superclass {
                Some(superclass) => Ok(Some(self.resolved(superclass)?)),
                None => Ok(None),
            },
            TypeBinding::Captured(capture) => {
                let bounds = capture.upper_bounds.clone();
                for bound in bounds {
                    let is_class = match self.erasure_class(bound) {
                        Some(class) => self.class(class).is_some_and(|c| !c.is_interface()),
                        None => self.ty(bound).is_type_variable_like(),
                    };
                    if is_class {
                        return Ok(Some(bound));
                    }
                }
                Ok(Some(self.object_type()?))
            }
            TypeBinding::Wildcard(wildcard) => match (wildcard.kind, wildcard.bound) {
                (WildcardKind::Extends, Some(bound)) if wildcard.generic.is_none() => Ok(Some(bound)),
                _ => Ok(Some(self.object_type()?)),
            },
            TypeBinding::Base(_) | TypeBinding::Unresolved(_) | TypeBinding::Problem(_) => Ok(None),
        }
    }

    /// Direct superinterfaces of any type
    pub fn super_interfaces(&mut self, ty: TypeId) -> LookupResult<Vec<TypeId>> {
        let ty = self.resolved(ty)?;
        match self.ty(ty) {
            TypeBinding::Class(_) => {
                self.ensure_supertypes(ty)?;
                let interfaces = self.class(ty).map(|class| class.super_interfaces.clone()).unwrap_or_default();
                self.resolve_all(interfaces)
            }
            TypeBinding::Parameterized(p) => {
                let generic = p.generic;
                let interfaces = self.super_interfaces(generic)?;
                let substitution = self.substitution_for(ty)?;
                let mut result = Vec::with_capacity(interfaces.len());
                for interface in interfaces {
                    result.push(self.substitute(&substitution, interface)?);
                }
                Ok(result)
            }
            TypeBinding::Raw(raw) => {
                let generic = raw.generic;
                let interfaces = self.super_interfaces(generic)?;
                let mut result = Vec::with_capacity(interfaces.len());
                for interface in interfaces {
                    result.push(self.raw_erasure(interface)?);
                }
                Ok(result)
            }
            TypeBinding::Array(_) => {
                let mut result = Vec::with_capacity(2);
                for name in [well_known::JAVA_LANG_CLONEABLE, well_known::JAVA_IO_SERIALIZABLE] {
                    if let Some(interface) = self.well_known_type(name)? {
                        result.push(interface);
                    }
                }
                Ok(result)
            }
            TypeBinding::TypeVariable(tv) => {
                let interfaces = tv.super_interfaces.clone();
                self.resolve_all(interfaces)
            }
            TypeBinding::Captured(capture) => {
                let bounds = capture.upper_bounds.clone();
                let mut result = Vec::new();
                for bound in bounds {
                    let is_interface = self
                        .erasure_class(bound)
                        .and_then(|class| self.class(class))
                        .is_some_and(|class| class.is_interface());
                    if is_interface {
                        result.push(bound);
                    }
                }
                Ok(result)
            }
            TypeBinding::Wildcard(wildcard) if wildcard.generic.is_none() => Ok(wildcard.other_bounds.clone()),
            _ => Ok(Vec::new()),
        }
    }

    /// Direct member types of a class-like type
    pub fn member_types(&mut self, ty: TypeId) -> LookupResult<Vec<TypeId>> {
        let ty = self.resolved(ty)?;
        let Some(class) = self.erasure_class(ty) else {
            return Ok(Vec::new());
        };
        if self.class(class).is_some_and(|c| c.is_binary()) {
            self.complete_binary_member_types(class)?;
        }
        Ok(self.class(class).map(|c| c.member_types.clone()).unwrap_or_default())
    }

    /// Methods declared by a type, seen through the type
    ///
    /// Parameterized and raw types answer substituted views of the generic
    /// type's methods; the views are uniqued per (receiver, method).
    pub fn methods(&mut self, ty: TypeId) -> LookupResult<Vec<MethodId>> {
        let ty = self.resolved(ty)?;
        match self.ty(ty) {
            TypeBinding::Class(_) => {
                self.ensure_members(ty)?;
                Ok(self.class(ty).map(|class| class.methods.clone()).unwrap_or_default())
            }
            TypeBinding::Parameterized(p) => {
                let generic = p.generic;
                let originals = self.methods(generic)?;
                let mut result = Vec::with_capacity(originals.len());
                for original in originals {
                    result.push(self.substituted_method(ty, original)?);
                }
                Ok(result)
            }
            TypeBinding::Raw(raw) => {
                let generic = raw.generic;
                let originals = self.methods(generic)?;
                let mut result = Vec::with_capacity(originals.len());
                for original in originals {
                    result.push(self.substituted_method(ty, original)?);
                }
                Ok(result)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Fields declared by a type, seen through the type
    pub fn fields(&mut self, ty: TypeId) -> LookupResult<Vec<FieldId>> {
        let ty = self.resolved(ty)?;
        match self.ty(ty) {
            TypeBinding::Class(_) => {
                self.ensure_members(ty)?;
                Ok(self.class(ty).map(|class| class.fields.clone()).unwrap_or_default())
            }
            TypeBinding::Parameterized(_) | TypeBinding::Raw(_) => {
                let Some(generic) = self.erasure_class(ty) else {
                    return Ok(Vec::new());
                };
                let originals = self.fields(generic)?;
                let mut result = Vec::with_capacity(originals.len());
                for original in originals {
                    result.push(self.substituted_field(ty, original)?);
                }
                Ok(result)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Methods with the given selector declared by a type
    pub fn methods_named(&mut self, ty: TypeId, selector: &str) -> LookupResult<Vec<MethodId>> {
        let ty = self.resolved(ty)?;
        let Some(class) = self.erasure_class(ty) else {
            return Ok(Vec::new());
        };
        self.ensure_members(class)?;
        let declared: Vec<MethodId> = self
            .class(class)
            .map(|c| c.methods.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|&m| self.method(m).selector == selector)
            .collect();
        if class == ty {
            return Ok(declared);
        }
        let mut result = Vec::with_capacity(declared.len());
        for original in declared {
            result.push(self.substituted_method(ty, original)?);
        }
        Ok(result)
    }

    /// Erasure of `sub` is `sup` or inherits from it
    pub fn is_subclass_of(&mut self, sub: TypeId, sup: TypeId) -> LookupResult<bool> {
        let (Some(sub), Some(sup)) = (self.erasure_class(sub), self.erasure_class(sup)) else {
            return Ok(false);
        };
        if sub == sup || self.is_object(sup) {
            return Ok(true);
        }
        let mut visited = FxHashSet::default();
        let mut stack = vec![sub];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if current == sup {
                return Ok(true);
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

    /// Neither the type nor any supertype declares member types
    ///
    /// The answer is cached in `HAS_NO_MEMBER_TYPES` once it is known.
    pub fn has_no_member_types(&mut self, ty: TypeId) -> LookupResult<bool> {
        let Some(class) = self.erasure_class(ty) else {
            return Ok(true);
        };
        if self.class(class).is_some_and(|c| c.state.contains(TypeState::HAS_NO_MEMBER_TYPES)) {
            return Ok(true);
        }
        let mut visited = FxHashSet::default();
        let mut stack = vec![class];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if self.class(current).is_some_and(|c| c.state.contains(TypeState::HAS_NO_MEMBER_TYPES)) {
                continue;
            }
            if !self.member_types(current)?.is_empty() {
                return Ok(false);
            }
            if let Some(superclass) = self.superclass(current)? {
                stack.extend(self.erasure_class(superclass));
            }
            for interface in self.super_interfaces(current)? {
                stack.extend(self.erasure_class(interface));
            }
        }
        let complete = self
            .class(class)
            .is_some_and(|c| c.is_binary() || c.state.contains(TypeState::END_HIERARCHY_CHECK));
        if complete {
            if let Some(c) = self.class_mut(class) {
                c.state.insert(TypeState::HAS_NO_MEMBER_TYPES);
            }
        }
        Ok(true)
    }
}
