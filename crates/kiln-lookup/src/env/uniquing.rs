//! Uniquing constructors for constructed types
//!
//! Arrays, parameterized, raw and wildcard types are only ever created here.
//! Each cache maps the type a shape is built on (leaf or generic type) to a
//! short list of instances that is scanned for a structural match before a
//! new binding is allocated.

use super::LookupEnvironment;
use crate::binding::{
    ArrayBinding, FieldId, MethodId, ParameterizedBinding, RawBinding, TypeBinding, TypeId, WildcardBinding,
    WildcardKind,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

pub(crate) type InstanceList = SmallVec<[TypeId; 4]>;

/// Per-shape instance caches
#[derive(Debug, Default)]
pub(crate) struct UniquingCaches {
    pub(crate) arrays: FxHashMap<TypeId, InstanceList>,
    pub(crate) parameterized: FxHashMap<TypeId, InstanceList>,
    pub(crate) raw: FxHashMap<TypeId, InstanceList>,
    pub(crate) wildcards: FxHashMap<Option<TypeId>, InstanceList>,
    pub(crate) substituted_methods: FxHashMap<(TypeId, MethodId), MethodId>,
    pub(crate) substituted_fields: FxHashMap<(TypeId, FieldId), FieldId>,
    pub(crate) instantiated_methods: FxHashMap<(MethodId, Vec<TypeId>), MethodId>,
    pub(crate) array_lengths: FxHashMap<TypeId, FieldId>,
    pub(crate) array_clones: FxHashMap<TypeId, MethodId>,
}

impl LookupEnvironment {
    /// Array of `component` with `dimensions` extra dimensions
    ///
    /// Nested array components are flattened, so `(int[], 1)` and `(int, 2)`
    /// yield the same handle.
    pub fn create_array_type(&mut self, component: TypeId, dimensions: u32) -> TypeId {
        let (leaf, dimensions) = match self.ty(component) {
            TypeBinding::Array(array) => (array.leaf, array.dimensions + dimensions),
            _ => (component, dimensions),
        };
        if dimensions == 0 {
            return leaf;
        }
        if let Some(list) = self.caches.arrays.get(&leaf) {
            for &candidate in list {
                if self.ty(candidate).as_array().is_some_and(|a| a.dimensions == dimensions) {
                    self.stats.constructed_cache_hits += 1;
                    return candidate;
                }
            }
        }
        self.stats.constructed_cache_misses += 1;
        let id = self.alloc_type(TypeBinding::Array(ArrayBinding { leaf, dimensions }));
        self.caches.arrays.entry(leaf).or_default().push(id);
        self.note_referrers(id, &[leaf]);
        trace!(array = %id, leaf = %leaf, dimensions, "created array type");
        id
    }

    /// Generic type applied to `arguments`
    pub fn create_parameterized_type(
        &mut self,
        generic: TypeId,
        arguments: Vec<TypeId>,
        enclosing: Option<TypeId>,
    ) -> TypeId {
        if let Some(list) = self.caches.parameterized.get(&generic) {
            for &candidate in list {
                if let TypeBinding::Parameterized(p) = self.ty(candidate) {
                    if p.arguments == arguments && p.enclosing == enclosing {
                        self.stats.constructed_cache_hits += 1;
                        return candidate;
                    }
                }
            }
        }
        self.stats.constructed_cache_misses += 1;
        let mut components = arguments.clone();
        components.push(generic);
        components.extend(enclosing);
        let id = self.alloc_type(TypeBinding::Parameterized(ParameterizedBinding {
            generic,
            arguments,
            enclosing,
        }));
        self.caches.parameterized.entry(generic).or_default().push(id);
        self.note_referrers(id, &components);
        trace!(parameterized = %id, generic = %generic, "created parameterized type");
        id
    }

    /// Generic type used without type arguments
    pub fn create_raw_type(&mut self, generic: TypeId, enclosing: Option<TypeId>) -> TypeId {
        if let Some(list) = self.caches.raw.get(&generic) {
            for &candidate in list {
                if let TypeBinding::Raw(raw) = self.ty(candidate) {
                    if raw.enclosing == enclosing {
                        self.stats.constructed_cache_hits += 1;
                        return candidate;
                    }
                }
            }
        }
        self.stats.constructed_cache_misses += 1;
        let id = self.alloc_type(TypeBinding::Raw(RawBinding { generic, enclosing }));
        self.caches.raw.entry(generic).or_default().push(id);
        let mut components = vec![generic];
        components.extend(enclosing);
        self.note_referrers(id, &components);
        trace!(raw = %id, generic = %generic, "created raw type");
        id
    }

    /// Wildcard argument at `rank` of `generic`
    ///
    /// `generic` is `None` for intersection bounds (`? extends A & B`), which
    /// are not attached to any type variable.
    pub fn create_wildcard(
        &mut self,
        generic: Option<TypeId>,
        rank: u32,
        bound: Option<TypeId>,
        other_bounds: Vec<TypeId>,
        kind: WildcardKind,
    ) -> TypeId {
        let bound = if kind == WildcardKind::Unbound { None } else { bound };
        if let Some(list) = self.caches.wildcards.get(&generic) {
            for &candidate in list {
                if let TypeBinding::Wildcard(w) = self.ty(candidate) {
                    if w.rank == rank && w.bound == bound && w.kind == kind && w.other_bounds == other_bounds {
                        self.stats.constructed_cache_hits += 1;
                        return candidate;
                    }
                }
            }
        }
        self.stats.constructed_cache_misses += 1;
        let mut components: Vec<TypeId> = generic.into_iter().chain(bound).collect();
        components.extend(other_bounds.iter().copied());
        let id = self.alloc_type(TypeBinding::Wildcard(WildcardBinding {
            generic,
            rank,
            bound,
            other_bounds,
            kind,
        }));
        self.caches.wildcards.entry(generic).or_default().push(id);
        self.note_referrers(id, &components);
        trace!(wildcard = %id, ?kind, "created wildcard");
        id
    }

    /// Number of cached instances of each constructed shape built on `base`
    pub fn cached_instances(&self, base: TypeId) -> usize {
        [&self.caches.arrays, &self.caches.parameterized, &self.caches.raw]
            .iter()
            .map(|cache| cache.get(&base).map_or(0, |list| list.len()))
            .sum::<usize>()
            + self.caches.wildcards.get(&Some(base)).map_or(0, |list| list.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::{BaseType, WildcardKind};
    use crate::env::LookupEnvironment;
    use crate::options::CompilerOptions;
    use crate::provider::InMemoryProvider;
    use crate::reporter::SilentReporter;

    fn env() -> LookupEnvironment {
        LookupEnvironment::new(
            CompilerOptions::default(),
            Box::new(InMemoryProvider::new()),
            Box::new(SilentReporter),
        )
    }

    #[test]
    fn test_arrays_are_flattened_and_uniqued() {
        let mut env = env();
        let int = env.base_type(BaseType::Int);
        let int_array = env.create_array_type(int, 1);
        let nested = env.create_array_type(int_array, 1);
        let direct = env.create_array_type(int, 2);
        assert_eq!(nested, direct);
        assert_ne!(int_array, direct);
        assert_eq!(env.create_array_type(int, 0), int);
        assert_eq!(env.stats().constructed_cache_misses, 2);
    }

    #[test]
    fn test_wildcards_are_uniqued_by_kind_and_bound() {
        let mut env = env();
        let int = env.base_type(BaseType::Int);
        let a = env.create_wildcard(None, 0, Some(int), Vec::new(), WildcardKind::Extends);
        let b = env.create_wildcard(None, 0, Some(int), Vec::new(), WildcardKind::Extends);
        let c = env.create_wildcard(None, 0, Some(int), Vec::new(), WildcardKind::Super);
        let unbound = env.create_wildcard(None, 0, Some(int), Vec::new(), WildcardKind::Unbound);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            unbound,
            env.create_wildcard(None, 0, None, Vec::new(), WildcardKind::Unbound)
        );
    }
}
