//! Capture conversion
//!
//! Each wildcard argument of a parameterized type is replaced by a fresh
//! captured type variable. Captures are uniqued per (type, position) so that
//! two lookups at one expression site see the same captured type.

use crate::binding::{CaptureBinding, TypeBinding, TypeId, WildcardKind};
use crate::env::LookupEnvironment;
use crate::error::LookupResult;
use tracing::trace;

impl LookupEnvironment {
    /// Capture of `ty` at source position `position`
    ///
    /// Types without wildcard arguments are returned unchanged.
    pub fn capture(&mut self, ty: TypeId, position: u32) -> LookupResult<TypeId> {
        let ty = self.resolved(ty)?;
        let Some(p) = self.ty(ty).as_parameterized() else {
            return Ok(ty);
        };
        let (generic, arguments, enclosing) = (p.generic, p.arguments.clone(), p.enclosing);
        if !arguments.iter().any(|&a| self.ty(a).as_wildcard().is_some()) {
            return Ok(ty);
        }
        if let Some(&cached) = self.captures.get(&(ty, position)) {
            return Ok(cached);
        }

        // Allocate first: the bounds of one capture may mention another
        let mut captured_arguments = Vec::with_capacity(arguments.len());
        let mut fresh = Vec::new();
        for (rank, &argument) in arguments.iter().enumerate() {
            if self.ty(argument).as_wildcard().is_none() {
                captured_arguments.push(argument);
                continue;
            }
            self.capture_sequence += 1;
            let capture = self.alloc_type(TypeBinding::Captured(CaptureBinding {
                wildcard: argument,
                source: generic,
                position,
                upper_bounds: Vec::new(),
                lower_bound: None,
                sequence: self.capture_sequence,
            }));
            captured_arguments.push(capture);
            fresh.push((rank, capture, argument));
        }
        let result = self.create_parameterized_type(generic, captured_arguments.clone(), enclosing);
        self.captures.insert((ty, position), result);

        let variables = self.class(generic).map(|c| c.type_variables.clone()).unwrap_or_default();
        let substitution = self.substitution_of(&variables, &captured_arguments);
        let object = self.object_type()?;
        for (rank, capture, wildcard) in fresh {
            let mut declared = Vec::new();
            if let Some(tv) = variables.get(rank).and_then(|&v| self.ty(v).as_type_variable()).cloned() {
                if let Some(superclass) = tv.superclass.filter(|&s| s != object) {
                    declared.push(self.substitute(&substitution, superclass)?);
                }
                for interface in tv.super_interfaces {
                    declared.push(self.substitute(&substitution, interface)?);
                }
            }
            let Some(binding) = self.ty(wildcard).as_wildcard().cloned() else {
                continue;
            };
            let (mut upper, lower) = match (binding.kind, binding.bound) {
                (WildcardKind::Extends, Some(bound)) => {
                    let mut own = vec![bound];
                    own.extend(binding.other_bounds);
                    let mut all = own.clone();
                    all.extend(declared);
                    // Unrelated class bounds fall back to the wildcard's own
                    (self.greater_lower_bound(&all)?.unwrap_or(own), None)
                }
                (WildcardKind::Super, Some(bound)) => (declared, Some(bound)),
                _ => (declared, None),
            };
            if upper.is_empty() {
                upper.push(object);
            }
            if let TypeBinding::Captured(captured) = self.ty_mut(capture) {
                captured.upper_bounds = upper;
                captured.lower_bound = lower;
            }
        }
        trace!(source = %ty, captured = %result, position, "captured wildcards");
        Ok(result)
    }
}
