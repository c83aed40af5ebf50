//! Method and block scopes, local declarations and slot allocation

use super::{Scope, ScopeKind};
use crate::binding::{LocalId, LocalVariableBinding, MethodId, Modifiers, ScopeId, TypeId};
use crate::env::LookupEnvironment;
use crate::reporter::ProblemId;

impl LookupEnvironment {
    /// New method scope nested in a class scope
    pub fn new_method_scope(&mut self, parent: ScopeId, method: Option<MethodId>, is_static: bool) -> ScopeId {
        self.alloc_scope(Scope::new(
            ScopeKind::Method {
                method,
                is_static,
                type_variables: Vec::new(),
            },
            Some(parent),
        ))
    }

    /// New block scope nested in a method or block scope
    pub fn new_block_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.alloc_scope(Scope::new(ScopeKind::Block, Some(parent)))
    }

    /// Local declared in `scope` or any enclosing local scope of the same method
    pub fn find_local(&self, scope: ScopeId, name: &str) -> Option<LocalId> {
        for id in self.scope_chain(scope) {
            let current = self.scope(id);
            if !current.is_local() {
                return None;
            }
            if let Some(&local) = current.locals.iter().rev().find(|&&l| self.local(l).name == name) {
                return Some(local);
            }
            if matches!(current.kind, ScopeKind::Method { .. }) {
                return None;
            }
        }
        None
    }

    /// Declare a local variable
    ///
    /// A name already declared in this or an enclosing block of the same
    /// method is reported; the local is declared anyway.
    pub fn declare_local(&mut self, scope: ScopeId, name: &str, ty: TypeId, modifiers: Modifiers) -> LocalId {
        self.declare(scope, name, ty, modifiers, false)
    }

    /// Declare a method argument
    pub fn declare_argument(&mut self, scope: ScopeId, name: &str, ty: TypeId) -> LocalId {
        self.declare(scope, name, ty, Modifiers::empty(), true)
    }

    fn declare(&mut self, scope: ScopeId, name: &str, ty: TypeId, modifiers: Modifiers, is_argument: bool) -> LocalId {
        if self.find_local(scope, name).is_some() {
            self.report(ProblemId::DuplicateLocalVariable, vec![name.to_string()]);
        }
        let id = self.alloc_local(LocalVariableBinding {
            name: name.to_string(),
            ty,
            modifiers,
            scope,
            is_argument,
            used: is_argument,
            slot: None,
        });
        self.scopes[scope.index()].locals.push(id);
        id
    }

    /// Record that flow analysis found a read of the local
    pub fn mark_local_used(&mut self, local: LocalId) {
        self.locals[local.index()].used = true;
    }

    /// Assign slots to the arguments and used locals of a method scope
    ///
    /// Slot 0 holds `this` in instance methods. `long` and `double` take two
    /// slots. Sibling blocks start at the same offset. Returns the number of
    /// slots the method needs.
    pub fn compute_local_positions(&mut self, method_scope: ScopeId) -> u32 {
        let first = match self.scope(method_scope).kind {
            ScopeKind::Method { is_static: false, .. } => 1,
            _ => 0,
        };
        self.assign_slots(method_scope, first)
    }

    fn assign_slots(&mut self, scope: ScopeId, mut offset: u32) -> u32 {
        let locals = self.scope(scope).locals.clone();
        for local in locals {
            let binding = self.local(local);
            if !binding.used && !binding.is_argument {
                continue;
            }
            let width = if self.ty(binding.ty).as_base().is_some_and(|base| base.is_wide()) {
                2
            } else {
                1
            };
            self.locals[local.index()].slot = Some(offset);
            offset += width;
        }
        let mut max = offset;
        let children = self.scope(scope).children.clone();
        for child in children {
            if self.scope(child).is_local() {
                max = max.max(self.assign_slots(child, offset));
            }
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::{BaseType, Modifiers};
    use crate::decl::{CompilationUnitDecl, TypeDecl};
    use crate::env::LookupEnvironment;
    use crate::options::CompilerOptions;
    use crate::provider::{BinaryTypeDescriptor, InMemoryProvider};
    use crate::reporter::{CollectingReporter, ProblemId};

    fn setup(reporter: &CollectingReporter) -> (LookupEnvironment, crate::binding::ScopeId) {
        let mut provider = InMemoryProvider::new();
        provider.add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None));
        let mut env = LookupEnvironment::new(CompilerOptions::default(), Box::new(provider), Box::new(reporter.clone()));
        let unit = env.build_type_bindings(CompilationUnitDecl::new("A.java", "").with_type(TypeDecl::class("A")));
        let a = env.unit_types(unit)[0];
        let class_scope = env.class_scope(a).unwrap();
        (env, class_scope)
    }

    #[test]
    fn test_duplicate_local_in_enclosing_block() {
        let reporter = CollectingReporter::new();
        let (mut env, class_scope) = setup(&reporter);
        let int = env.base_type(BaseType::Int);
        let method = env.new_method_scope(class_scope, None, false);
        env.declare_argument(method, "x", int);
        let block = env.new_block_scope(method);
        env.declare_local(block, "x", int, Modifiers::empty());
        env.declare_local(block, "y", int, Modifiers::empty());
        let sibling = env.new_block_scope(method);
        env.declare_local(sibling, "y", int, Modifiers::empty());
        assert_eq!(reporter.count(ProblemId::DuplicateLocalVariable), 1);
    }

    #[test]
    fn test_slots_skip_unused_and_reuse_siblings() {
        let reporter = CollectingReporter::new();
        let (mut env, class_scope) = setup(&reporter);
        let int = env.base_type(BaseType::Int);
        let long = env.base_type(BaseType::Long);
        let method = env.new_method_scope(class_scope, None, false);
        let arg = env.declare_argument(method, "a", long);
        let first = env.new_block_scope(method);
        let unused = env.declare_local(first, "u", int, Modifiers::empty());
        let b = env.declare_local(first, "b", int, Modifiers::empty());
        env.mark_local_used(b);
        let second = env.new_block_scope(method);
        let c = env.declare_local(second, "c", long, Modifiers::empty());
        env.mark_local_used(c);

        let size = env.compute_local_positions(method);
        assert_eq!(env.local(arg).slot, Some(1));
        assert_eq!(env.local(unused).slot, None);
        assert_eq!(env.local(b).slot, Some(3));
        assert_eq!(env.local(c).slot, Some(3));
        assert_eq!(size, 5);
    }
}
