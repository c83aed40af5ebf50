//! Field and member type lookup through a receiver

use super::InvocationSite;
use crate::binding::{FieldId, ScopeId, TypeBinding, TypeId};
use crate::env::LookupEnvironment;
use crate::error::{LookupResult, ProblemBinding, ProblemReason, Resolution};
use crate::names::well_known;
use rustc_hash::FxHashSet;

/// Raw hit of a member search, before visibility
pub(crate) enum MemberHit<T> {
    None,
    One(T),
    Ambiguous(T),
}

impl LookupEnvironment {
    /// Resolve `receiver.name` as a field
    ///
    /// The superclass chain is searched first. Interfaces are only searched
    /// when no class on the chain declares the field; a field declared both
    /// by a class and by an interface reached from a more specific class is
    /// ambiguous.
    pub fn find_field(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        name: &str,
        site: &mut InvocationSite,
    ) -> LookupResult<Resolution<FieldId>> {
        let receiver = self.lookup_receiver(receiver, site.position)?;
        if matches!(self.ty(receiver), TypeBinding::Array(_)) {
            if name == well_known::LENGTH {
                return Ok(Resolution::Found(self.array_length_field(receiver)));
            }
            return Ok(Resolution::Problem(ProblemBinding::new(name, ProblemReason::NotFound)));
        }
        let field = match self.field_in_hierarchy(receiver, name)? {
            MemberHit::None => {
                let reason = self.missing_member_reason(receiver);
                return Ok(Resolution::Problem(ProblemBinding::new(name, reason)));
            }
            MemberHit::Ambiguous(field) => {
                return Ok(Resolution::Problem(ProblemBinding::with_closest(
                    name,
                    ProblemReason::Ambiguous,
                    field,
                )))
            }
            MemberHit::One(field) => field,
        };
        let (declaring, modifiers) = {
            let binding = self.field(field);
            (binding.declaring_class, binding.modifiers)
        };
        if self.can_member_be_seen(declaring, modifiers, scope, Some(receiver))? {
            Ok(Resolution::Found(field))
        } else {
            Ok(Resolution::Problem(ProblemBinding::with_closest(
                name,
                ProblemReason::NotVisible,
                field,
            )))
        }
    }

    pub(crate) fn declared_field(&mut self, ty: TypeId, name: &str) -> LookupResult<Option<FieldId>> {
        for field in self.fields(ty)? {
            if self.field(field).name == name {
                return Ok(Some(field));
            }
        }
        Ok(None)
    }

    fn field_in_hierarchy(&mut self, receiver: TypeId, name: &str) -> LookupResult<MemberHit<FieldId>> {
        let mut visited = FxHashSet::default();
        let mut interfaces_to_visit: Vec<TypeId> = Vec::new();
        let mut class_hit = None;

        let is_interface = self
            .erasure_class(receiver)
            .and_then(|c| self.class(c))
            .is_some_and(|c| c.is_interface());
        if is_interface {
            interfaces_to_visit.push(receiver);
        } else {
            let mut current = Some(receiver);
            while let Some(ty) = current {
                let erased = self.erasure_class(ty).unwrap_or(ty);
                if !visited.insert(erased) {
                    break;
                }
                if let Some(field) = self.declared_field(ty, name)? {
                    class_hit = Some(field);
                    break;
                }
                interfaces_to_visit.extend(self.super_interfaces(ty)?);
                current = self.superclass(ty)?;
            }
        }

        let mut interface_hit: Option<FieldId> = None;
        let mut index = 0;
        while index < interfaces_to_visit.len() {
            let interface = interfaces_to_visit[index];
            index += 1;
            let erased = self.erasure_class(interface).unwrap_or(interface);
            if !visited.insert(erased) {
                continue;
            }
            if let Some(field) = self.declared_field(interface, name)? {
                let original = self.field(field).original.unwrap_or(field);
                match interface_hit {
                    Some(existing) if self.field(existing).original.unwrap_or(existing) != original => {
                        return Ok(MemberHit::Ambiguous(existing));
                    }
                    _ => interface_hit = Some(field),
                }
                // A hit hides the interface's own superinterfaces
                continue;
            }
            interfaces_to_visit.extend(self.super_interfaces(interface)?);
        }

        Ok(match (class_hit, interface_hit) {
            (Some(class_field), Some(_)) => MemberHit::Ambiguous(class_field),
            (Some(field), None) | (None, Some(field)) => MemberHit::One(field),
            (None, None) => MemberHit::None,
        })
    }

    /// Resolve `receiver.Name` as a member type, inherited ones included
    pub fn find_member_type(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        name: &str,
    ) -> LookupResult<Resolution<TypeId>> {
        let receiver = self.resolved(receiver)?;
        if self.has_no_member_types(receiver)? {
            return Ok(Resolution::Problem(ProblemBinding::new(name, ProblemReason::NotFound)));
        }
        match self.member_type_in_hierarchy(receiver, name)? {
            MemberHit::None => Ok(Resolution::Problem(ProblemBinding::new(name, ProblemReason::NotFound))),
            MemberHit::Ambiguous(member) => Ok(Resolution::Problem(ProblemBinding::with_closest(
                name,
                ProblemReason::Ambiguous,
                member,
            ))),
            MemberHit::One(member) => {
                if self.can_type_be_seen(member, scope)? {
                    Ok(Resolution::Found(member))
                } else {
                    Ok(Resolution::Problem(ProblemBinding::with_closest(
                        name,
                        ProblemReason::NotVisible,
                        member,
                    )))
                }
            }
        }
    }

    /// Member type declared by `ty` or inherited from its supertypes
    ///
    /// A direct member wins. Otherwise the superclass is searched, then the
    /// superinterfaces; two different hits are ambiguous.
    pub(crate) fn member_type_in_hierarchy(&mut self, ty: TypeId, name: &str) -> LookupResult<MemberHit<TypeId>> {
        let mut visited = FxHashSet::default();
        self.member_type_search(ty, name, &mut visited)
    }

    fn member_type_search(
        &mut self,
        ty: TypeId,
        name: &str,
        visited: &mut FxHashSet<TypeId>,
    ) -> LookupResult<MemberHit<TypeId>> {
        let Some(class) = self.erasure_class(ty) else {
            return Ok(MemberHit::None);
        };
        if !visited.insert(class) {
            return Ok(MemberHit::None);
        }
        if let Some(member) = self.direct_member_type(class, name)? {
            return Ok(MemberHit::One(member));
        }
        let mut found: Option<TypeId> = None;
        let mut supertypes: Vec<TypeId> = self.superclass(ty)?.into_iter().collect();
        supertypes.extend(self.super_interfaces(ty)?);
        for supertype in supertypes {
            match self.member_type_search(supertype, name, visited)? {
                MemberHit::None => {}
                MemberHit::Ambiguous(member) => return Ok(MemberHit::Ambiguous(member)),
                MemberHit::One(member) => match found {
                    Some(existing) if existing != member => return Ok(MemberHit::Ambiguous(existing)),
                    _ => found = Some(member),
                },
            }
        }
        Ok(found.map_or(MemberHit::None, MemberHit::One))
    }
}
