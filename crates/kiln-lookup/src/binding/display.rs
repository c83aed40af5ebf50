//! Readable names for bindings, as used in problem messages

use super::{MethodId, TypeBinding, TypeId, WildcardKind};
use crate::env::LookupEnvironment;

impl LookupEnvironment {
    /// Source-like name of a type (`java.util.List<? extends Number>[]`)
    pub fn type_name(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type_name(ty, &mut out);
        out
    }

    fn write_type_name(&self, ty: TypeId, out: &mut String) {
        match self.ty(ty) {
            TypeBinding::Base(base) => out.push_str(base.name()),
            TypeBinding::Class(class) => out.push_str(&class.compound_name.dotted().replace('$', ".")),
            TypeBinding::Array(array) => {
                self.write_type_name(array.leaf, out);
                for _ in 0..array.dimensions {
                    out.push_str("[]");
                }
            }
            TypeBinding::Parameterized(p) => {
                match p.enclosing {
                    Some(enclosing) => {
                        self.write_type_name(enclosing, out);
                        out.push('.');
                        out.push_str(self.class(p.generic).map_or("", |c| c.source_name.as_str()));
                    }
                    None => self.write_type_name(p.generic, out),
                }
                if !p.arguments.is_empty() {
                    out.push('<');
                    self.write_list(&p.arguments, ", ", out);
                    out.push('>');
                }
            }
            TypeBinding::Raw(raw) => self.write_type_name(raw.generic, out),
            TypeBinding::Wildcard(wildcard) => match (wildcard.kind, wildcard.bound) {
                (WildcardKind::Extends, Some(bound)) => {
                    out.push_str("? extends ");
                    self.write_type_name(bound, out);
                    for &other in &wildcard.other_bounds {
                        out.push_str(" & ");
                        self.write_type_name(other, out);
                    }
                }
                (WildcardKind::Super, Some(bound)) => {
                    out.push_str("? super ");
                    self.write_type_name(bound, out);
                }
                _ => out.push('?'),
            },
            TypeBinding::TypeVariable(tv) => out.push_str(&tv.name),
            TypeBinding::Captured(capture) => {
                out.push_str(&format!("capture#{}-of ", capture.sequence));
                self.write_type_name(capture.wildcard, out);
            }
            TypeBinding::Unresolved(unresolved) => match unresolved.resolved {
                Some(resolved) => self.write_type_name(resolved, out),
                None => out.push_str(&unresolved.compound_name.dotted()),
            },
            TypeBinding::Problem(problem) => out.push_str(&problem.name.dotted()),
        }
    }

    fn write_list(&self, types: &[TypeId], separator: &str, out: &mut String) {
        for (index, &ty) in types.iter().enumerate() {
            if index > 0 {
                out.push_str(separator);
            }
            self.write_type_name(ty, out);
        }
    }

    /// `selector(Param, Param)`; constructors use the class simple name
    pub fn method_signature_name(&self, method: MethodId) -> String {
        let binding = self.method(method);
        let mut out = if binding.is_constructor() {
            self.erasure_class(binding.declaring_class)
                .and_then(|c| self.class(c))
                .map(|c| c.source_name.clone())
                .unwrap_or_else(|| binding.selector.clone())
        } else {
            binding.selector.clone()
        };
        out.push('(');
        self.write_list(&binding.parameters, ", ", &mut out);
        out.push(')');
        out
    }
}
