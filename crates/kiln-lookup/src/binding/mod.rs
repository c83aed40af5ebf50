//! Binding model
//!
//! Bindings are resolved symbols. They are stored in arenas owned by the
//! [`LookupEnvironment`](crate::LookupEnvironment) and referred to by small
//! `Copy` handles. Handle equality is binding identity: two handles are
//! equal exactly when they name the same binding.

pub mod display;
pub mod member;
pub mod package;
pub mod ty;

pub use member::{FieldBinding, LocalVariableBinding, MethodBinding, MethodOrigin};
pub use package::PackageBinding;
pub use ty::{
    ArrayBinding, BaseType, CaptureBinding, ClassBinding, ClassKind, ClassOrigin, ParameterizedBinding,
    ProblemTypeBinding, RawBinding, TypeBinding, TypeVariableBinding, TypeVariableOwner,
    UnresolvedBinding, WildcardBinding, WildcardKind,
};

use bitflags::bitflags;
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Create a handle from a raw index
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Raw index of this handle
            pub const fn as_u32(self) -> u32 {
                self.0
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(
    /// Handle of a type binding
    TypeId
);
arena_id!(
    /// Handle of a method binding
    MethodId
);
arena_id!(
    /// Handle of a field binding
    FieldId
);
arena_id!(
    /// Handle of a package binding
    PackageId
);
arena_id!(
    /// Handle of a local variable binding
    LocalId
);
arena_id!(
    /// Handle of a scope
    ScopeId
);
arena_id!(
    /// Handle of a compilation unit registered with the environment
    UnitId
);

bitflags! {
    /// Access and property modifiers, using the class-file flag values
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICTFP = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const DEPRECATED = 0x10_0000;
    }
}

impl Modifiers {
    /// Mask of the access modifiers
    pub const ACCESS_MASK: Modifiers = Modifiers::PUBLIC
        .union(Modifiers::PRIVATE)
        .union(Modifiers::PROTECTED);

    /// Neither public, protected nor private
    pub fn is_package_private(self) -> bool {
        !self.intersects(Self::ACCESS_MASK)
    }
}

bitflags! {
    /// Resolution-state bits of a class binding
    ///
    /// `UNRESOLVED_*` bits are set when a binary type is created and cleared
    /// exactly once when the corresponding lazy step runs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeState: u32 {
        /// Hierarchy connection has started
        const BEGIN_HIERARCHY_CHECK = 1 << 0;
        /// Hierarchy connection has finished
        const END_HIERARCHY_CHECK = 1 << 1;
        /// Supertypes could not be fully connected
        const HIERARCHY_HAS_PROBLEMS = 1 << 2;
        /// Binary superclass not built yet
        const UNRESOLVED_SUPERCLASS = 1 << 3;
        /// Binary superinterfaces not built yet
        const UNRESOLVED_SUPERINTERFACES = 1 << 4;
        /// Binary fields and methods not built yet
        const UNRESOLVED_MEMBERS = 1 << 5;
        /// Binary member types not built yet
        const UNRESOLVED_MEMBER_TYPES = 1 << 6;
        /// Neither the type nor any of its supertypes declares member types
        const HAS_NO_MEMBER_TYPES = 1 << 7;
        /// Source fields and methods built (pipeline stage 4)
        const FIELDS_AND_METHODS_BUILT = 1 << 8;
        /// Type variable bounds connected
        const TYPE_VARIABLES_CONNECTED = 1 << 9;
        /// Superinterface collision check done
        const INTERFACES_CHECKED = 1 << 10;
    }
}

bitflags! {
    /// What kind of binding a name lookup may return
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindingMask: u8 {
        /// Locals and fields
        const VARIABLE = 0b001;
        /// Types and type variables
        const TYPE = 0b010;
        /// Packages
        const PACKAGE = 0b100;
    }
}

/// Coarse kind tag shared by all bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Package
    Package,
    /// Reference, base or array type
    Type,
    /// Method or constructor
    Method,
    /// Field
    Field,
    /// Local variable or argument
    Local,
    /// Type variable
    TypeVariable,
}

/// Any resolved symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Package
    Package(PackageId),
    /// Type
    Type(TypeId),
    /// Method
    Method(MethodId),
    /// Field
    Field(FieldId),
    /// Local variable
    Local(LocalId),
    /// Type variable (its handle lives in the type arena)
    TypeVariable(TypeId),
}

impl Binding {
    /// Kind tag of this binding
    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::Package(_) => BindingKind::Package,
            Binding::Type(_) => BindingKind::Type,
            Binding::Method(_) => BindingKind::Method,
            Binding::Field(_) => BindingKind::Field,
            Binding::Local(_) => BindingKind::Local,
            Binding::TypeVariable(_) => BindingKind::TypeVariable,
        }
    }

    /// Type handle for type and type variable bindings
    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Binding::Type(id) | Binding::TypeVariable(id) => Some(*id),
            _ => None,
        }
    }

    /// Field handle, if this is a field
    pub fn as_field(&self) -> Option<FieldId> {
        match self {
            Binding::Field(id) => Some(*id),
            _ => None,
        }
    }

    /// Local handle, if this is a local
    pub fn as_local(&self) -> Option<LocalId> {
        match self {
            Binding::Local(id) => Some(*id),
            _ => None,
        }
    }

    /// Package handle, if this is a package
    pub fn as_package(&self) -> Option<PackageId> {
        match self {
            Binding::Package(id) => Some(*id),
            _ => None,
        }
    }
}
