//! Access control
//!
//! Public is visible everywhere. Protected is visible within the package
//! and from subclasses (including code nested in a subclass). Private is
//! visible within the outermost enclosing type of the declaration.
//! Package-private is visible only within the exact same package.

use crate::binding::{Modifiers, PackageId, ScopeId, TypeBinding, TypeId};
use crate::env::LookupEnvironment;
use crate::error::LookupResult;

impl LookupEnvironment {
    fn package_of(&self, ty: TypeId) -> Option<PackageId> {
        let class = self.erasure_class(ty)?;
        self.class(class).map(|c| c.package)
    }

    /// Whether code in `package` may name `ty` (import checks)
    pub fn is_type_visible_in_package(&self, ty: TypeId, package: PackageId) -> bool {
        let Some(class) = self.erasure_class(ty).and_then(|c| self.class(c)) else {
            return true;
        };
        class.modifiers.contains(Modifiers::PUBLIC) || class.package == package
    }

    /// Whether code in `scope` may name `ty`
    pub fn can_type_be_seen(&mut self, ty: TypeId, scope: ScopeId) -> LookupResult<bool> {
        let ty = self.resolved(ty)?;
        let leaf = match self.ty(ty) {
            TypeBinding::Array(array) => array.leaf,
            _ => ty,
        };
        let Some(class) = self.erasure_class(leaf) else {
            return Ok(true);
        };
        let (modifiers, enclosing) = match self.class(class) {
            Some(c) => (c.modifiers, c.enclosing),
            None => return Ok(true),
        };
        match enclosing {
            Some(enclosing) => self.can_member_be_seen(enclosing, modifiers, scope, None),
            None => Ok(modifiers.contains(Modifiers::PUBLIC) || self.package_of(class) == Some(self.scope_package(scope))),
        }
    }

    /// Whether code in `scope` may access a member declared in `declaring`
    ///
    /// `receiver` is the type the member is accessed through; a protected
    /// instance member reached from another package needs a receiver that
    /// is a subclass of the accessing type.
    pub fn can_member_be_seen(
        &mut self,
        declaring: TypeId,
        modifiers: Modifiers,
        scope: ScopeId,
        receiver: Option<TypeId>,
    ) -> LookupResult<bool> {
        if modifiers.contains(Modifiers::PUBLIC) {
            return Ok(true);
        }
        let declaring = self.resolved(declaring)?;
        // Array members (length, clone) are public; anything else without a class is not restricted
        let Some(declaring_class) = self.erasure_class(declaring) else {
            return Ok(true);
        };
        let invocation = self.enclosing_source_type(scope);
        let invocation_package = self.scope_package(scope);
        let declaring_package = self.package_of(declaring_class);

        if modifiers.contains(Modifiers::PRIVATE) {
            return Ok(match invocation {
                Some(invocation) => self.outermost_type(invocation) == self.outermost_type(declaring_class),
                None => false,
            });
        }
        if declaring_package == Some(invocation_package) {
            return Ok(true);
        }
        if !modifiers.contains(Modifiers::PROTECTED) {
            return Ok(false);
        }

        let mut current = invocation;
        while let Some(ty) = current {
            if self.is_subclass_of(ty, declaring_class)? {
                let receiver_ok = match receiver {
                    None => true,
                    Some(_) if modifiers.contains(Modifiers::STATIC) => true,
                    Some(receiver) => match self.erasure_class(receiver) {
                        Some(receiver) => self.is_subclass_of(receiver, ty)?,
                        None => true,
                    },
                };
                if receiver_ok {
                    return Ok(true);
                }
            }
            current = self.class(ty).and_then(|c| c.enclosing);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::Modifiers;
    use crate::decl::{CompilationUnitDecl, TypeDecl, TypeRef};
    use crate::env::LookupEnvironment;
    use crate::options::CompilerOptions;
    use crate::provider::{BinaryTypeDescriptor, InMemoryProvider};
    use crate::reporter::SilentReporter;

    #[test]
    fn test_member_visibility_rules() {
        let mut provider = InMemoryProvider::new();
        provider.add_binary(BinaryTypeDescriptor::class("java/lang/Object").with_superclass(None));
        let mut env = LookupEnvironment::new(CompilerOptions::default(), Box::new(provider), Box::new(SilentReporter));
        let lib = env.build_type_bindings(CompilationUnitDecl::new("Lib.java", "lib").with_type(
            TypeDecl::class("Lib").with_member_type(TypeDecl::class("Nested").with_modifiers(Modifiers::PRIVATE)),
        ));
        let app = env.build_type_bindings(
            CompilationUnitDecl::new("App.java", "app")
                .with_import(crate::decl::ImportDecl::single("lib.Lib"))
                .with_type(TypeDecl::class("App").extends(TypeRef::simple("Lib")))
                .with_type(TypeDecl::class("Other")),
        );
        env.complete_type_bindings().unwrap();
        let lib_type = env.unit_types(lib)[0];
        let nested = env.class(lib_type).unwrap().member_types[0];
        let app_scope = env.class_scope(env.unit_types(app)[0]).unwrap();
        let other_scope = env.class_scope(env.unit_types(app)[1]).unwrap();
        let nested_scope = env.class_scope(nested).unwrap();

        assert!(env.can_member_be_seen(lib_type, Modifiers::PROTECTED, app_scope, None).unwrap());
        assert!(!env.can_member_be_seen(lib_type, Modifiers::PROTECTED, other_scope, None).unwrap());
        assert!(!env.can_member_be_seen(lib_type, Modifiers::empty(), app_scope, None).unwrap());
        assert!(env.can_member_be_seen(lib_type, Modifiers::PRIVATE, nested_scope, None).unwrap());
        assert!(!env.can_member_be_seen(lib_type, Modifiers::PRIVATE, app_scope, None).unwrap());
        assert!(!env.can_type_be_seen(nested, app_scope).unwrap());
    }
}
