//! Method, field and local variable bindings

use super::{FieldId, MethodId, Modifiers, ScopeId, TypeId};
use crate::names::well_known;

/// How a method binding came to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodOrigin {
    /// Declared by a source or binary class
    Declared,
    /// Implicit default constructor of a source class
    DefaultConstructor,
    /// Array `clone()`
    ArrayClone,
    /// A declared method seen through a parameterized or raw receiver
    Substituted {
        /// The declared method
        original: MethodId,
        /// Receiver whose substitution was applied
        receiver: TypeId,
    },
    /// A generic method applied to (explicit or inferred) type arguments
    Instantiated {
        /// The generic method
        original: MethodId,
        /// One argument per method type variable
        type_arguments: Vec<TypeId>,
        /// Arguments were inferred rather than given explicitly
        inferred: bool,
    },
}

/// A method or constructor
#[derive(Debug, Clone)]
pub struct MethodBinding {
    /// Name; constructors use `<init>`
    pub selector: String,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Declaring type (a parameterized or raw type for substituted methods)
    pub declaring_class: TypeId,
    /// Return type (`void` for constructors)
    pub return_type: TypeId,
    /// Parameter types
    pub parameters: Vec<TypeId>,
    /// Declared exceptions
    pub thrown_exceptions: Vec<TypeId>,
    /// Method type variables
    pub type_variables: Vec<TypeId>,
    /// Provenance
    pub origin: MethodOrigin,
    /// Member of a raw type: signature erased, type variables dropped
    pub is_raw: bool,
}

impl MethodBinding {
    /// Constructor
    pub fn is_constructor(&self) -> bool {
        self.selector == well_known::INIT
    }

    /// Static method
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    /// Abstract method
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    /// Variable arity method
    pub fn is_varargs(&self) -> bool {
        self.modifiers.contains(Modifiers::VARARGS)
    }

    /// Declares its own type variables
    pub fn is_generic(&self) -> bool {
        !self.type_variables.is_empty()
    }

    /// The method this one was derived from, if any
    pub fn original(&self) -> Option<MethodId> {
        match &self.origin {
            MethodOrigin::Substituted { original, .. } | MethodOrigin::Instantiated { original, .. } => {
                Some(*original)
            }
            _ => None,
        }
    }

    /// Type arguments of an instantiated generic method
    pub fn type_arguments(&self) -> &[TypeId] {
        match &self.origin {
            MethodOrigin::Instantiated { type_arguments, .. } => type_arguments,
            _ => &[],
        }
    }
}

/// A field
#[derive(Debug, Clone)]
pub struct FieldBinding {
    /// Field name
    pub name: String,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Field type
    pub ty: TypeId,
    /// Declaring type (a parameterized or raw type for substituted fields)
    pub declaring_class: TypeId,
    /// Declared field this one was substituted from
    pub original: Option<FieldId>,
}

impl FieldBinding {
    /// Static field
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }
}

/// A local variable or method argument
#[derive(Debug, Clone)]
pub struct LocalVariableBinding {
    /// Declared name
    pub name: String,
    /// Declared type
    pub ty: TypeId,
    /// Declared modifiers (`final`)
    pub modifiers: Modifiers,
    /// Declaring block or method scope
    pub scope: ScopeId,
    /// Method argument
    pub is_argument: bool,
    /// Marked used by flow analysis
    pub used: bool,
    /// Allocated slot, set by position allocation
    pub slot: Option<u32>,
}
