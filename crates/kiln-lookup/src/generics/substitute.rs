//! Type substitution and substituted member views

use crate::binding::{
    FieldBinding, FieldId, MethodBinding, MethodId, MethodOrigin, TypeBinding, TypeId, TypeVariableOwner,
};
use crate::env::LookupEnvironment;
use crate::error::LookupResult;
use rustc_hash::FxHashMap;
use tracing::trace;

/// Mapping from type variables to the types replacing them
///
/// A raw substitution replaces every type variable by its erasure.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    pub(crate) map: FxHashMap<TypeId, TypeId>,
    pub(crate) raw: bool,
}

impl Substitution {
    /// Nothing to replace
    pub fn is_empty(&self) -> bool {
        self.map.is_empty() && !self.raw
    }

    /// Replacement of a type variable
    pub fn get(&self, variable: TypeId) -> Option<TypeId> {
        self.map.get(&variable).copied()
    }

    /// Erasing substitution
    pub fn is_raw(&self) -> bool {
        self.raw
    }
}

impl LookupEnvironment {
    /// Substitution mapping `variables` to `arguments` pairwise
    pub fn substitution_of(&self, variables: &[TypeId], arguments: &[TypeId]) -> Substitution {
        Substitution {
            map: variables.iter().copied().zip(arguments.iter().copied()).collect(),
            raw: false,
        }
    }

    /// Substitution implied by a receiver type
    ///
    /// A parameterized type maps its generic type's variables to its
    /// arguments, then those of its enclosing type. A raw type (or a
    /// parameterized type nested in a raw one) erases.
    pub fn substitution_for(&mut self, receiver: TypeId) -> LookupResult<Substitution> {
        let receiver = self.resolved(receiver)?;
        match self.ty(receiver) {
            TypeBinding::Parameterized(p) => {
                let (generic, arguments, enclosing) = (p.generic, p.arguments.clone(), p.enclosing);
                let variables = self.class(generic).map(|c| c.type_variables.clone()).unwrap_or_default();
                let mut substitution = self.substitution_of(&variables, &arguments);
                if let Some(enclosing) = enclosing {
                    let outer = self.substitution_for(enclosing)?;
                    substitution.raw |= outer.raw;
                    for (variable, argument) in outer.map {
                        substitution.map.entry(variable).or_insert(argument);
                    }
                }
                Ok(substitution)
            }
            TypeBinding::Raw(_) => Ok(Substitution {
                map: FxHashMap::default(),
                raw: true,
            }),
            _ => Ok(Substitution::default()),
        }
    }

    /// Apply a substitution to a type
    ///
    /// Constructed types are rebuilt through the uniquing constructors; a
    /// type the substitution does not touch comes back with the same handle.
    pub fn substitute(&mut self, substitution: &Substitution, ty: TypeId) -> LookupResult<TypeId> {
        if substitution.is_empty() {
            return Ok(ty);
        }
        let ty = self.resolved(ty)?;
        match self.ty(ty) {
            TypeBinding::TypeVariable(_) => match substitution.get(ty) {
                Some(replacement) => Ok(replacement),
                None if substitution.raw => self.raw_erasure(ty),
                None => Ok(ty),
            },
            TypeBinding::Parameterized(p) => {
                let (generic, arguments, enclosing) = (p.generic, p.arguments.clone(), p.enclosing);
                if substitution.raw {
                    return Ok(self.create_raw_type(generic, None));
                }
                let mut changed = false;
                let mut substituted = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    let replacement = self.substitute(substitution, argument)?;
                    changed |= replacement != argument;
                    substituted.push(replacement);
                }
                let new_enclosing = match enclosing {
                    Some(outer) => {
                        let replacement = self.substitute(substitution, outer)?;
                        changed |= replacement != outer;
                        Some(replacement)
                    }
                    None => None,
                };
                if !changed {
                    return Ok(ty);
                }
                Ok(self.create_parameterized_type(generic, substituted, new_enclosing))
            }
            TypeBinding::Array(array) => {
                let (leaf, dimensions) = (array.leaf, array.dimensions);
                let replacement = self.substitute(substitution, leaf)?;
                if replacement == leaf {
                    return Ok(ty);
                }
                Ok(self.create_array_type(replacement, dimensions))
            }
            TypeBinding::Wildcard(wildcard) => {
                let (generic, rank, bound, other_bounds, kind) = (
                    wildcard.generic,
                    wildcard.rank,
                    wildcard.bound,
                    wildcard.other_bounds.clone(),
                    wildcard.kind,
                );
                let mut changed = false;
                let new_bound = match bound {
                    Some(bound) => {
                        let replacement = self.substitute(substitution, bound)?;
                        changed |= replacement != bound;
                        Some(replacement)
                    }
                    None => None,
                };
                let mut new_others = Vec::with_capacity(other_bounds.len());
                for other in other_bounds {
                    let replacement = self.substitute(substitution, other)?;
                    changed |= replacement != other;
                    new_others.push(replacement);
                }
                if !changed {
                    return Ok(ty);
                }
                Ok(self.create_wildcard(generic, rank, new_bound, new_others, kind))
            }
            _ => Ok(ty),
        }
    }

    /// Erasure as seen through a raw type: generic classes come back raw
    ///
    /// `Box<U>` in a member of a raw type becomes the raw `Box`, never the
    /// generic declaration, so members reached through it are erased too.
    pub(crate) fn raw_erasure(&mut self, ty: TypeId) -> LookupResult<TypeId> {
        let erased = self.erasure(ty)?;
        match self.ty(erased) {
            TypeBinding::Class(class) if class.is_generic() => Ok(self.create_raw_type(erased, None)),
            TypeBinding::Array(array) => {
                let (leaf, dimensions) = (array.leaf, array.dimensions);
                if self.class(leaf).is_some_and(|c| c.is_generic()) {
                    let raw = self.create_raw_type(leaf, None);
                    return Ok(self.create_array_type(raw, dimensions));
                }
                Ok(erased)
            }
            _ => Ok(erased),
        }
    }

    /// Does `ty` mention any of the given type variables?
    pub fn mentions_any(&self, ty: TypeId, variables: &[TypeId]) -> bool {
        if variables.contains(&ty) {
            return true;
        }
        match self.ty(ty) {
            TypeBinding::Parameterized(p) => {
                p.arguments.iter().any(|&a| self.mentions_any(a, variables))
                    || p.enclosing.is_some_and(|e| self.mentions_any(e, variables))
            }
            TypeBinding::Array(array) => self.mentions_any(array.leaf, variables),
            TypeBinding::Wildcard(wildcard) => {
                wildcard.bound.is_some_and(|b| self.mentions_any(b, variables))
                    || wildcard.other_bounds.iter().any(|&b| self.mentions_any(b, variables))
            }
            TypeBinding::Unresolved(unresolved) => unresolved.resolved.is_some_and(|r| self.mentions_any(r, variables)),
            _ => false,
        }
    }

    /// View of `original` as a member of a parameterized or raw `receiver`
    ///
    /// Static methods are shared with the generic type. Views are uniqued
    /// per (receiver, method) pair.
    pub fn substituted_method(&mut self, receiver: TypeId, original: MethodId) -> LookupResult<MethodId> {
        if self.method(original).is_static() {
            return Ok(original);
        }
        if let Some(&cached) = self.caches.substituted_methods.get(&(receiver, original)) {
            return Ok(cached);
        }
        let source = self.method(original).clone();
        let id = self.alloc_method(MethodBinding {
            declaring_class: receiver,
            origin: MethodOrigin::Substituted { original, receiver },
            ..source.clone()
        });
        self.caches.substituted_methods.insert((receiver, original), id);

        let substitution = self.substitution_for(receiver)?;
        if substitution.raw {
            let mut parameters = Vec::with_capacity(source.parameters.len());
            for parameter in &source.parameters {
                parameters.push(self.raw_erasure(*parameter)?);
            }
            let return_type = self.raw_erasure(source.return_type)?;
            let mut thrown_exceptions = Vec::with_capacity(source.thrown_exceptions.len());
            for exception in &source.thrown_exceptions {
                thrown_exceptions.push(self.raw_erasure(*exception)?);
            }
            let binding = self.method_mut(id);
            binding.parameters = parameters;
            binding.return_type = return_type;
            binding.thrown_exceptions = thrown_exceptions;
            binding.type_variables = Vec::new();
            binding.is_raw = true;
        } else {
            let mut substitution = substitution;
            let mut type_variables = source.type_variables.clone();
            let receiver_variables: Vec<TypeId> = substitution.map.keys().copied().collect();
            let bounds_mention_receiver = source.type_variables.iter().any(|&variable| {
                self.ty(variable).as_type_variable().is_some_and(|tv| {
                    tv.superclass.is_some_and(|b| self.mentions_any(b, &receiver_variables))
                        || tv.super_interfaces.iter().any(|&b| self.mentions_any(b, &receiver_variables))
                })
            });
            if bounds_mention_receiver {
                // Fresh variables whose bounds see the receiver's arguments
                let names: Vec<String> = source
                    .type_variables
                    .iter()
                    .filter_map(|&v| self.ty(v).as_type_variable().map(|tv| tv.name.clone()))
                    .collect();
                let fresh = self.create_type_variables(&names, TypeVariableOwner::Method(id));
                for (&old, &new) in source.type_variables.iter().zip(&fresh) {
                    substitution.map.insert(old, new);
                }
                for (&old, &new) in source.type_variables.iter().zip(&fresh) {
                    let Some(tv) = self.ty(old).as_type_variable().cloned() else {
                        continue;
                    };
                    let class_bound = match (tv.first_bound, tv.superclass) {
                        (Some(first), Some(superclass)) if first == superclass => {
                            Some(self.substitute(&substitution, superclass)?)
                        }
                        _ => None,
                    };
                    let mut interfaces = Vec::with_capacity(tv.super_interfaces.len());
                    for interface in tv.super_interfaces {
                        interfaces.push(self.substitute(&substitution, interface)?);
                    }
                    self.set_type_variable_bounds(new, class_bound, interfaces)?;
                }
                type_variables = fresh;
            }
            let mut parameters = Vec::with_capacity(source.parameters.len());
            for parameter in &source.parameters {
                parameters.push(self.substitute(&substitution, *parameter)?);
            }
            let return_type = self.substitute(&substitution, source.return_type)?;
            let mut thrown_exceptions = Vec::with_capacity(source.thrown_exceptions.len());
            for exception in &source.thrown_exceptions {
                thrown_exceptions.push(self.substitute(&substitution, *exception)?);
            }
            let binding = self.method_mut(id);
            binding.parameters = parameters;
            binding.return_type = return_type;
            binding.thrown_exceptions = thrown_exceptions;
            binding.type_variables = type_variables;
        }
        self.note_method_referrers(id);
        trace!(method = %id, original = %original, receiver = %receiver, "substituted method");
        Ok(id)
    }

    /// View of `original` as a field of a parameterized or raw `receiver`
    pub fn substituted_field(&mut self, receiver: TypeId, original: FieldId) -> LookupResult<FieldId> {
        if self.field(original).is_static() {
            return Ok(original);
        }
        if let Some(&cached) = self.caches.substituted_fields.get(&(receiver, original)) {
            return Ok(cached);
        }
        let source = self.field(original).clone();
        let substitution = self.substitution_for(receiver)?;
        let ty = if substitution.raw {
            self.raw_erasure(source.ty)?
        } else {
            self.substitute(&substitution, source.ty)?
        };
        let id = self.alloc_field(FieldBinding {
            name: source.name,
            modifiers: source.modifiers,
            ty,
            declaring_class: receiver,
            original: Some(original),
        });
        self.caches.substituted_fields.insert((receiver, original), id);
        self.note_field_referrer(id, ty);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::{Modifiers, WildcardKind};
    use crate::env::LookupEnvironment;
    use crate::names::CompoundName;
    use crate::options::CompilerOptions;
    use crate::provider::{BinaryTypeDescriptor, InMemoryProvider};
    use crate::reporter::SilentReporter;

    fn env() -> LookupEnvironment {
        let mut provider = InMemoryProvider::new();
        provider
            .add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None))
            .add_binary(BinaryTypeDescriptor::class("java/lang/String"))
            .add_binary(
                BinaryTypeDescriptor::class("p/Box")
                    .with_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
                    .with_generic_method("get", Modifiers::PUBLIC, "()Ljava/lang/Object;", "()TT;")
                    .with_generic_method(
                        "wrap",
                        Modifiers::PUBLIC,
                        "(Ljava/lang/Object;)Lp/Box;",
                        "<U:TT;>(TU;)Lp/Box<TU;>;",
                    ),
            );
        LookupEnvironment::new(CompilerOptions::default(), Box::new(provider), Box::new(SilentReporter))
    }

    fn lookup(env: &mut LookupEnvironment, name: &str) -> crate::binding::TypeId {
        env.get_type(&CompoundName::from_dotted(name)).unwrap().unwrap()
    }

    #[test]
    fn test_methods_of_parameterized_receiver_are_substituted() {
        let mut env = env();
        let boxed = lookup(&mut env, "p.Box");
        let string = lookup(&mut env, "java.lang.String");
        let box_of_string = env.create_parameterized_type(boxed, vec![string], None);

        let get = env.methods_named(box_of_string, "get").unwrap();
        assert_eq!(env.method(get[0]).return_type, string);
        assert_eq!(env.methods_named(box_of_string, "get").unwrap(), get);

        // The method variable's bound mentions T, so it is renewed with bound String
        let wrap = env.methods_named(box_of_string, "wrap").unwrap()[0];
        let variable = env.method(wrap).type_variables[0];
        let tv = env.ty(variable).as_type_variable().unwrap();
        assert_eq!(tv.first_bound, Some(string));
    }

    #[test]
    fn test_raw_receiver_erases_signatures() {
        let mut env = env();
        let boxed = lookup(&mut env, "p.Box");
        let object = env.object_type().unwrap();
        let raw = env.create_raw_type(boxed, None);
        let wrap = env.methods_named(raw, "wrap").unwrap()[0];
        let binding = env.method(wrap);
        assert!(binding.is_raw);
        assert!(binding.type_variables.is_empty());
        assert_eq!(binding.parameters, vec![object]);
        assert_eq!(binding.return_type, raw);

        // Chained access stays erased
        let get = env.methods_named(raw, "get").unwrap()[0];
        assert_eq!(env.method(get).return_type, object);
        let returned = env.method(wrap).return_type;
        let chained = env.methods_named(returned, "get").unwrap()[0];
        assert_eq!(env.method(chained).return_type, object);
        assert!(env.ty(env.method(chained).return_type).as_type_variable().is_none());
    }

    #[test]
    fn test_raw_receiver_field_of_generic_type_is_raw() {
        let mut provider = InMemoryProvider::new();
        provider
            .add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None))
            .add_binary(
                BinaryTypeDescriptor::class("p/Node")
                    .with_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
                    .with_generic_field("next", Modifiers::PUBLIC, "Lp/Node;", "Lp/Node<TT;>;")
                    .with_generic_field("siblings", Modifiers::PUBLIC, "[Lp/Node;", "[Lp/Node<TT;>;"),
            );
        let mut env = LookupEnvironment::new(CompilerOptions::default(), Box::new(provider), Box::new(SilentReporter));
        let node = lookup(&mut env, "p.Node");
        let raw = env.create_raw_type(node, None);
        let fields = env.fields(raw).unwrap();
        assert_eq!(env.field(fields[0]).ty, raw);
        let raw_array = env.create_array_type(raw, 1);
        assert_eq!(env.field(fields[1]).ty, raw_array);
    }

    #[test]
    fn test_untouched_types_keep_their_handle() {
        let mut env = env();
        let boxed = lookup(&mut env, "p.Box");
        let string = lookup(&mut env, "java.lang.String");
        let wildcard = env.create_wildcard(Some(boxed), 0, Some(string), Vec::new(), WildcardKind::Extends);
        let box_of_wildcard = env.create_parameterized_type(boxed, vec![wildcard], None);
        let substitution = env.substitution_for(box_of_wildcard).unwrap();
        assert_eq!(env.substitute(&substitution, box_of_wildcard).unwrap(), box_of_wildcard);
        assert_eq!(env.substitute(&substitution, string).unwrap(), string);
    }
}
