//! Scope chain
//!
//! Scopes form a parent-linked tree stored in the environment arena:
//! block -> method -> class -> compilation unit. Name resolution walks the
//! chain innermost first.

pub mod imports;
pub mod locals;
pub mod resolve;

use crate::binding::{LocalId, MethodId, PackageId, ScopeId, TypeId, UnitId};
use crate::env::LookupEnvironment;

/// Scope kind and the symbol layer it adds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    /// Imports, same-package types
    CompilationUnit {
        /// Owning unit
        unit: UnitId,
        /// Declared package
        package: PackageId,
    },
    /// Type variables, member types, fields and methods of a type
    Class {
        /// The type
        ty: TypeId,
    },
    /// Method type variables and arguments
    Method {
        /// The method, if the scope belongs to one
        method: Option<MethodId>,
        /// Static method or initializer
        is_static: bool,
        /// Method type variables
        type_variables: Vec<TypeId>,
    },
    /// Local variables
    Block,
}

/// A scope in the scope tree
#[derive(Debug, Clone)]
pub struct Scope {
    /// Scope kind
    pub kind: ScopeKind,
    /// Parent scope (None for compilation-unit scopes)
    pub parent: Option<ScopeId>,
    /// Locals declared directly in this scope, in declaration order
    pub locals: Vec<LocalId>,
    /// Nested scopes, in creation order
    pub children: Vec<ScopeId>,
}

impl Scope {
    /// Create a new scope
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Scope {
            kind,
            parent,
            locals: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Method or block scope
    pub fn is_local(&self) -> bool {
        matches!(self.kind, ScopeKind::Method { .. } | ScopeKind::Block)
    }
}

impl LookupEnvironment {
    /// A scope and its parents, innermost first
    pub(crate) fn scope_chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            chain.push(id);
            current = self.scope(id).parent;
        }
        chain
    }

    /// Innermost enclosing type of a scope
    pub fn enclosing_source_type(&self, scope: ScopeId) -> Option<TypeId> {
        self.scope_chain(scope).into_iter().find_map(|id| match self.scope(id).kind {
            ScopeKind::Class { ty } => Some(ty),
            _ => None,
        })
    }

    /// Innermost enclosing method scope
    pub fn enclosing_method_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scope_chain(scope)
            .into_iter()
            .take_while(|&id| !matches!(self.scope(id).kind, ScopeKind::Class { .. }))
            .find(|&id| matches!(self.scope(id).kind, ScopeKind::Method { .. }))
    }

    /// Compilation-unit scope at the root of the chain
    pub fn compilation_unit_scope(&self, scope: ScopeId) -> ScopeId {
        self.scope_chain(scope).last().copied().unwrap_or(scope)
    }

    /// Package of the unit a scope belongs to
    pub fn scope_package(&self, scope: ScopeId) -> PackageId {
        match self.scope(self.compilation_unit_scope(scope)).kind {
            ScopeKind::CompilationUnit { package, .. } => package,
            _ => self.default_package(),
        }
    }

    /// Unit a scope belongs to
    pub fn scope_unit(&self, scope: ScopeId) -> Option<UnitId> {
        match self.scope(self.compilation_unit_scope(scope)).kind {
            ScopeKind::CompilationUnit { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// Inside a static method; instance members of the enclosing type are unreachable
    pub fn is_static_context(&self, scope: ScopeId) -> bool {
        match self.enclosing_method_scope(scope).map(|id| &self.scope(id).kind) {
            Some(ScopeKind::Method { is_static, .. }) => *is_static,
            _ => false,
        }
    }

    /// Outermost enclosing type of a type (itself for top-level types)
    pub fn outermost_type(&self, ty: TypeId) -> TypeId {
        let mut current = self.erasure_class(ty).unwrap_or(ty);
        let mut steps = 0;
        while let Some(enclosing) = self.class(current).and_then(|class| class.enclosing) {
            let next = match self.ty(enclosing) {
                crate::binding::TypeBinding::Unresolved(unresolved) => match unresolved.resolved {
                    Some(resolved) => resolved,
                    None => break,
                },
                _ => enclosing,
            };
            current = next;
            steps += 1;
            if steps > 64 {
                break;
            }
        }
        current
    }
}
