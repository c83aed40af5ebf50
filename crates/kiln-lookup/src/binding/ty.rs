//! Type bindings
//!
//! Every type the engine knows about is one [`TypeBinding`] variant stored in
//! the environment's type arena. Constructed shapes (arrays, parameterized,
//! raw and wildcard types) are only created through the environment's
//! uniquing constructors, so structurally equal shapes share one handle.

use super::{FieldId, MethodId, Modifiers, PackageId, ScopeId, TypeId, TypeState, UnitId};
use crate::error::ProblemReason;
use crate::names::CompoundName;
use crate::provider::BinaryTypeDescriptor;
use smallvec::SmallVec;
use std::fmt;

/// Primitive types plus `void` and the type of `null`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `void`
    Void,
    /// Type of the `null` literal
    Null,
}

impl BaseType {
    /// All base types, in the order they are pre-interned
    pub const ALL: [BaseType; 10] = [
        BaseType::Boolean,
        BaseType::Byte,
        BaseType::Char,
        BaseType::Short,
        BaseType::Int,
        BaseType::Long,
        BaseType::Float,
        BaseType::Double,
        BaseType::Void,
        BaseType::Null,
    ];

    /// Source keyword
    pub fn name(&self) -> &'static str {
        match self {
            BaseType::Boolean => "boolean",
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Short => "short",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Float => "float",
            BaseType::Double => "double",
            BaseType::Void => "void",
            BaseType::Null => "null",
        }
    }

    /// Parse a source keyword
    pub fn from_name(name: &str) -> Option<BaseType> {
        BaseType::ALL.into_iter().find(|base| base.name() == name && *base != BaseType::Null)
    }

    /// Parse a descriptor character (`I`, `Z`, ...)
    pub fn from_descriptor(c: char) -> Option<BaseType> {
        match c {
            'Z' => Some(BaseType::Boolean),
            'B' => Some(BaseType::Byte),
            'C' => Some(BaseType::Char),
            'S' => Some(BaseType::Short),
            'I' => Some(BaseType::Int),
            'J' => Some(BaseType::Long),
            'F' => Some(BaseType::Float),
            'D' => Some(BaseType::Double),
            'V' => Some(BaseType::Void),
            _ => None,
        }
    }

    /// Position in [`BaseType::ALL`], which is also its pre-interned handle
    pub(crate) fn index(&self) -> u32 {
        match self {
            BaseType::Boolean => 0,
            BaseType::Byte => 1,
            BaseType::Char => 2,
            BaseType::Short => 3,
            BaseType::Int => 4,
            BaseType::Long => 5,
            BaseType::Float => 6,
            BaseType::Double => 7,
            BaseType::Void => 8,
            BaseType::Null => 9,
        }
    }

    /// Numeric primitive (including `char`)
    pub fn is_numeric(&self) -> bool {
        !matches!(self, BaseType::Boolean | BaseType::Void | BaseType::Null)
    }

    /// Occupies two local variable slots
    pub fn is_wide(&self) -> bool {
        matches!(self, BaseType::Long | BaseType::Double)
    }

    /// Identity or widening primitive conversion from `self` to `target`
    pub fn widens_to(&self, target: BaseType) -> bool {
        use BaseType::*;
        if *self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short => matches!(target, Int | Long | Float | Double),
            Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean | Void | Null => false,
        }
    }

    /// Dotted name of the wrapper class used by boxing
    pub fn box_name(&self) -> Option<&'static str> {
        match self {
            BaseType::Boolean => Some("java.lang.Boolean"),
            BaseType::Byte => Some("java.lang.Byte"),
            BaseType::Char => Some("java.lang.Character"),
            BaseType::Short => Some("java.lang.Short"),
            BaseType::Int => Some("java.lang.Integer"),
            BaseType::Long => Some("java.lang.Long"),
            BaseType::Float => Some("java.lang.Float"),
            BaseType::Double => Some("java.lang.Double"),
            BaseType::Void | BaseType::Null => None,
        }
    }

    /// Base type whose wrapper class has the given dotted name
    pub fn from_box_name(name: &str) -> Option<BaseType> {
        BaseType::ALL.into_iter().find(|base| base.box_name() == Some(name))
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declaration kind of a class binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Ordinary class
    Class,
    /// Interface
    Interface,
    /// Enum class
    Enum,
    /// Annotation interface
    Annotation,
}

impl ClassKind {
    /// Interfaces and annotation interfaces
    pub fn is_interface(&self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }

    /// Kind implied by class-file access flags
    pub fn from_modifiers(modifiers: Modifiers) -> ClassKind {
        if modifiers.contains(Modifiers::ANNOTATION) {
            ClassKind::Annotation
        } else if modifiers.contains(Modifiers::INTERFACE) {
            ClassKind::Interface
        } else if modifiers.contains(Modifiers::ENUM) {
            ClassKind::Enum
        } else {
            ClassKind::Class
        }
    }
}

/// Where a class binding came from
#[derive(Debug, Clone)]
pub enum ClassOrigin {
    /// Built from a declaration of a unit being analyzed
    Source {
        /// Owning unit
        unit: UnitId,
        /// Index path of the declaration inside its unit: top-level index,
        /// then member-type indices
        path: SmallVec<[u32; 4]>,
    },
    /// Built from a compiled descriptor
    Binary,
}

/// Source or binary class, interface, enum or annotation
#[derive(Debug, Clone)]
pub struct ClassBinding {
    /// Fully qualified name; member types append their simple name
    pub compound_name: CompoundName,
    /// Simple name
    pub source_name: String,
    /// Declaring package
    pub package: PackageId,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Declaration kind
    pub kind: ClassKind,
    /// Source or binary
    pub origin: ClassOrigin,
    /// Enclosing type of a member type
    pub enclosing: Option<TypeId>,
    /// Declared type variables, in order
    pub type_variables: Vec<TypeId>,
    /// Resolution-state bits
    pub state: TypeState,
    pub(crate) superclass: Option<TypeId>,
    pub(crate) super_interfaces: Vec<TypeId>,
    pub(crate) member_types: Vec<TypeId>,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) methods: Vec<MethodId>,
    pub(crate) scope: Option<ScopeId>,
    pub(crate) binary: Option<Box<BinaryTypeDescriptor>>,
}

impl ClassBinding {
    /// True for interfaces and annotation interfaces
    pub fn is_interface(&self) -> bool {
        self.kind.is_interface()
    }

    /// True when built from a compiled descriptor
    pub fn is_binary(&self) -> bool {
        matches!(self.origin, ClassOrigin::Binary)
    }

    /// True when the type declares type variables
    pub fn is_generic(&self) -> bool {
        !self.type_variables.is_empty()
    }

    /// Member type (has an enclosing type)
    pub fn is_member_type(&self) -> bool {
        self.enclosing.is_some()
    }

    /// Hierarchy connection started but not finished
    pub fn is_hierarchy_being_connected(&self) -> bool {
        self.state.contains(TypeState::BEGIN_HIERARCHY_CHECK)
            && !self.state.contains(TypeState::END_HIERARCHY_CHECK)
    }

    /// Class scope of a source type
    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }
}

/// `leaf[]...[]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayBinding {
    /// Innermost non-array component
    pub leaf: TypeId,
    /// Number of dimensions, at least 1
    pub dimensions: u32,
}

/// Generic type applied to type arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterizedBinding {
    /// The generic class binding
    pub generic: TypeId,
    /// One argument per type variable of `generic`
    pub arguments: Vec<TypeId>,
    /// Enclosing instantiation for inner types of generic types
    pub enclosing: Option<TypeId>,
}

/// Generic type used without type arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawBinding {
    /// The generic class binding
    pub generic: TypeId,
    /// Enclosing type, if the raw type is an inner type
    pub enclosing: Option<TypeId>,
}

/// Kind of a wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `?`
    Unbound,
    /// `? extends B`
    Extends,
    /// `? super B`
    Super,
}

/// `?`, `? extends B` or `? super B` at a given argument rank
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardBinding {
    /// Generic type whose argument this is; `None` for intersection bounds
    pub generic: Option<TypeId>,
    /// Argument position
    pub rank: u32,
    /// Bound, absent for unbound wildcards
    pub bound: Option<TypeId>,
    /// Additional bounds of an intersection (`? extends A & B`)
    pub other_bounds: Vec<TypeId>,
    /// Wildcard kind
    pub kind: WildcardKind,
}

/// Declarer of a type variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeVariableOwner {
    /// Declared by a generic type
    Type(TypeId),
    /// Declared by a generic method
    Method(MethodId),
}

/// Type variable declared by a generic type or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVariableBinding {
    /// Declared name
    pub name: String,
    /// Position in the declaring type variable list
    pub rank: u32,
    /// Declaring type or method
    pub owner: TypeVariableOwner,
    /// First declared bound
    pub first_bound: Option<TypeId>,
    /// Class bound (or `Object`)
    pub superclass: Option<TypeId>,
    /// Interface bounds
    pub super_interfaces: Vec<TypeId>,
}

/// Fresh type variable introduced by capture conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureBinding {
    /// The captured wildcard
    pub wildcard: TypeId,
    /// Generic type whose argument was captured
    pub source: TypeId,
    /// Capture site position
    pub position: u32,
    /// Upper bounds (wildcard bound combined with the declared bound)
    pub upper_bounds: Vec<TypeId>,
    /// Lower bound of a `? super` wildcard
    pub lower_bound: Option<TypeId>,
    /// Sequence number, for display
    pub sequence: u32,
}

/// Forward reference swapped exactly once for its resolved type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedBinding {
    /// Name the placeholder stands for
    pub compound_name: CompoundName,
    /// Resolution result, set by the single resolution event
    pub resolved: Option<TypeId>,
}

/// Type-shaped sentinel for a failed type resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemTypeBinding {
    /// Name that failed to resolve
    pub name: CompoundName,
    /// Why it failed
    pub reason: ProblemReason,
    /// Best candidate, if any
    pub closest_match: Option<TypeId>,
}

/// A type binding
#[derive(Debug, Clone)]
pub enum TypeBinding {
    /// Primitive, `void` or `null`
    Base(BaseType),
    /// Source or binary class
    Class(ClassBinding),
    /// Array
    Array(ArrayBinding),
    /// Parameterized generic type
    Parameterized(ParameterizedBinding),
    /// Raw generic type
    Raw(RawBinding),
    /// Wildcard type argument
    Wildcard(WildcardBinding),
    /// Type variable
    TypeVariable(TypeVariableBinding),
    /// Capture of a wildcard
    Captured(CaptureBinding),
    /// Placeholder for a type not loaded yet
    Unresolved(UnresolvedBinding),
    /// Failed resolution
    Problem(ProblemTypeBinding),
}

impl TypeBinding {
    /// Class payload, if this is a class
    pub fn as_class(&self) -> Option<&ClassBinding> {
        match self {
            TypeBinding::Class(class) => Some(class),
            _ => None,
        }
    }

    pub(crate) fn as_class_mut(&mut self) -> Option<&mut ClassBinding> {
        match self {
            TypeBinding::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Base type payload, if this is a base type
    pub fn as_base(&self) -> Option<BaseType> {
        match self {
            TypeBinding::Base(base) => Some(*base),
            _ => None,
        }
    }

    /// Type variable payload
    pub fn as_type_variable(&self) -> Option<&TypeVariableBinding> {
        match self {
            TypeBinding::TypeVariable(tv) => Some(tv),
            _ => None,
        }
    }

    /// Wildcard payload
    pub fn as_wildcard(&self) -> Option<&WildcardBinding> {
        match self {
            TypeBinding::Wildcard(wildcard) => Some(wildcard),
            _ => None,
        }
    }

    /// Parameterized payload
    pub fn as_parameterized(&self) -> Option<&ParameterizedBinding> {
        match self {
            TypeBinding::Parameterized(p) => Some(p),
            _ => None,
        }
    }

    /// Array payload
    pub fn as_array(&self) -> Option<&ArrayBinding> {
        match self {
            TypeBinding::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Anything but base types
    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeBinding::Base(_))
    }

    /// Class, parameterized or raw type
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            TypeBinding::Class(_) | TypeBinding::Parameterized(_) | TypeBinding::Raw(_)
        )
    }

    /// Type variable or capture
    pub fn is_type_variable_like(&self) -> bool {
        matches!(self, TypeBinding::TypeVariable(_) | TypeBinding::Captured(_))
    }

    /// Problem or still-unresolved placeholder
    pub fn is_problem(&self) -> bool {
        matches!(self, TypeBinding::Problem(_))
    }
}
