//! Source declaration model
//!
//! The engine does not parse source text. A parser (an external
//! collaborator) hands it declarations in this shape: one
//! [`CompilationUnitDecl`] per file, with type references still unresolved
//! ([`TypeRef`]). The builder methods keep hand-written fixtures readable.

use crate::binding::{BaseType, ClassKind, Modifiers, WildcardKind};
use crate::names::{well_known, CompoundName};

/// One source file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnitDecl {
    /// File name, used in diagnostics
    pub file_name: String,
    /// Declared package (empty for the default package)
    pub package: CompoundName,
    /// Import declarations in source order
    pub imports: Vec<ImportDecl>,
    /// Top-level type declarations
    pub types: Vec<TypeDecl>,
}

impl CompilationUnitDecl {
    /// Unit in the given (dotted) package
    pub fn new(file_name: impl Into<String>, package: &str) -> Self {
        CompilationUnitDecl {
            file_name: file_name.into(),
            package: CompoundName::from_dotted(package),
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Add an import
    pub fn with_import(mut self, import: ImportDecl) -> Self {
        self.imports.push(import);
        self
    }

    /// Add a top-level type
    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    /// Type declaration at an index path (top-level index, then member indices)
    pub(crate) fn type_at(&self, path: &[u32]) -> Option<&TypeDecl> {
        let (&first, rest) = path.split_first()?;
        let mut decl = self.types.get(first as usize)?;
        for &index in rest {
            decl = decl.member_types.get(index as usize)?;
        }
        Some(decl)
    }
}

/// `import a.b.C;`, `import a.b.*;`, `import static a.b.C.m;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Imported name (without the trailing `*`)
    pub name: CompoundName,
    /// `.*` import
    pub on_demand: bool,
    /// `import static`
    pub is_static: bool,
}

impl ImportDecl {
    /// Single-type import
    pub fn single(name: &str) -> Self {
        ImportDecl {
            name: CompoundName::from_dotted(name),
            on_demand: false,
            is_static: false,
        }
    }

    /// On-demand import of a package or type
    pub fn on_demand(name: &str) -> Self {
        ImportDecl {
            name: CompoundName::from_dotted(name),
            on_demand: true,
            is_static: false,
        }
    }

    /// Single static import (`import static a.B.member;`)
    pub fn static_single(name: &str) -> Self {
        ImportDecl {
            name: CompoundName::from_dotted(name),
            on_demand: false,
            is_static: true,
        }
    }

    /// Static on-demand import (`import static a.B.*;`)
    pub fn static_on_demand(name: &str) -> Self {
        ImportDecl {
            name: CompoundName::from_dotted(name),
            on_demand: true,
            is_static: true,
        }
    }
}

/// Class, interface, enum or annotation declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Simple name
    pub name: String,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Declaration kind
    pub kind: ClassKind,
    /// Declared type parameters
    pub type_parameters: Vec<TypeParameterDecl>,
    /// `extends` clause of a class
    pub superclass: Option<TypeRef>,
    /// `implements` clause (or `extends` clause of an interface)
    pub super_interfaces: Vec<TypeRef>,
    /// Field declarations
    pub fields: Vec<FieldDecl>,
    /// Method and constructor declarations
    pub methods: Vec<MethodDecl>,
    /// Member type declarations
    pub member_types: Vec<TypeDecl>,
}

impl TypeDecl {
    fn new(name: &str, kind: ClassKind, modifiers: Modifiers) -> Self {
        TypeDecl {
            name: name.to_string(),
            modifiers,
            kind,
            type_parameters: Vec::new(),
            superclass: None,
            super_interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            member_types: Vec::new(),
        }
    }

    /// Public class
    pub fn class(name: &str) -> Self {
        TypeDecl::new(name, ClassKind::Class, Modifiers::PUBLIC)
    }

    /// Public interface
    pub fn interface(name: &str) -> Self {
        TypeDecl::new(
            name,
            ClassKind::Interface,
            Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT,
        )
    }

    /// Public enum
    pub fn enumeration(name: &str) -> Self {
        TypeDecl::new(name, ClassKind::Enum, Modifiers::PUBLIC | Modifiers::ENUM)
    }

    /// Public annotation interface
    pub fn annotation(name: &str) -> Self {
        TypeDecl::new(
            name,
            ClassKind::Annotation,
            Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ANNOTATION | Modifiers::ABSTRACT,
        )
    }

    /// Replace the modifiers (kind bits are kept)
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        let kind_bits = self.modifiers & (Modifiers::INTERFACE | Modifiers::ANNOTATION | Modifiers::ENUM);
        self.modifiers = modifiers | kind_bits;
        self
    }

    /// Declare a type parameter
    pub fn with_type_parameter(mut self, name: &str, bounds: Vec<TypeRef>) -> Self {
        self.type_parameters.push(TypeParameterDecl {
            name: name.to_string(),
            bounds,
        });
        self
    }

    /// Set the superclass
    pub fn extends(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Add a superinterface
    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.super_interfaces.push(interface);
        self
    }

    /// Add a field
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method or constructor
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a member type
    pub fn with_member_type(mut self, member: TypeDecl) -> Self {
        self.member_types.push(member);
        self
    }

    /// Declares at least one constructor
    pub fn declares_constructor(&self) -> bool {
        self.methods.iter().any(MethodDecl::is_constructor)
    }
}

/// `<T extends A & B>`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameterDecl {
    /// Declared name
    pub name: String,
    /// Bounds in source order
    pub bounds: Vec<TypeRef>,
}

/// Field declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Declared type
    pub ty: TypeRef,
}

impl FieldDecl {
    /// Field with the given modifiers
    pub fn new(name: &str, modifiers: Modifiers, ty: TypeRef) -> Self {
        FieldDecl {
            name: name.to_string(),
            modifiers,
            ty,
        }
    }
}

/// Method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    /// Parameter name
    pub name: String,
    /// Declared type (the array type for a variable arity parameter)
    pub ty: TypeRef,
}

/// Method or constructor declaration
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    /// Name; constructors use `<init>`
    pub selector: String,
    /// Declared modifiers (`VARARGS` marks a variable arity method)
    pub modifiers: Modifiers,
    /// Method type parameters
    pub type_parameters: Vec<TypeParameterDecl>,
    /// Return type, `None` for constructors
    pub return_type: Option<TypeRef>,
    /// Parameters
    pub parameters: Vec<ParameterDecl>,
    /// `throws` clause
    pub thrown: Vec<TypeRef>,
}

impl MethodDecl {
    /// Public method
    pub fn new(selector: &str, return_type: TypeRef) -> Self {
        MethodDecl {
            selector: selector.to_string(),
            modifiers: Modifiers::PUBLIC,
            type_parameters: Vec::new(),
            return_type: Some(return_type),
            parameters: Vec::new(),
            thrown: Vec::new(),
        }
    }

    /// Public constructor
    pub fn constructor() -> Self {
        MethodDecl {
            selector: well_known::INIT.to_string(),
            modifiers: Modifiers::PUBLIC,
            type_parameters: Vec::new(),
            return_type: None,
            parameters: Vec::new(),
            thrown: Vec::new(),
        }
    }

    /// Replace the modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Add a parameter
    pub fn param(mut self, name: &str, ty: TypeRef) -> Self {
        self.parameters.push(ParameterDecl {
            name: name.to_string(),
            ty,
        });
        self
    }

    /// Declare a method type parameter
    pub fn with_type_parameter(mut self, name: &str, bounds: Vec<TypeRef>) -> Self {
        self.type_parameters.push(TypeParameterDecl {
            name: name.to_string(),
            bounds,
        });
        self
    }

    /// Add a thrown exception
    pub fn throws(mut self, exception: TypeRef) -> Self {
        self.thrown.push(exception);
        self
    }

    /// Constructor declaration
    pub fn is_constructor(&self) -> bool {
        self.selector == well_known::INIT
    }
}

/// One dotted segment of a named type reference, with optional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRefSegment {
    /// Segment identifier
    pub name: String,
    /// `<...>` arguments on this segment
    pub arguments: Option<Vec<TypeArgRef>>,
}

/// Unresolved type reference as written in source
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Primitive or `void`
    Base(BaseType),
    /// `a.b.C<X>.D<Y>`
    Named(Vec<TypeRefSegment>),
    /// `T[]...[]`
    Array {
        /// Component (never itself an array)
        component: Box<TypeRef>,
        /// Number of dimensions
        dimensions: u32,
    },
}

impl TypeRef {
    /// Single identifier reference (`String`)
    pub fn simple(name: &str) -> Self {
        TypeRef::Named(vec![TypeRefSegment {
            name: name.to_string(),
            arguments: None,
        }])
    }

    /// Dotted reference (`java.util.List`)
    pub fn qualified(name: &str) -> Self {
        TypeRef::Named(
            name.split('.')
                .map(|segment| TypeRefSegment {
                    name: segment.to_string(),
                    arguments: None,
                })
                .collect(),
        )
    }

    /// Primitive or `void`
    pub fn base(base: BaseType) -> Self {
        TypeRef::Base(base)
    }

    /// `void`
    pub fn void() -> Self {
        TypeRef::Base(BaseType::Void)
    }

    /// `int`
    pub fn int() -> Self {
        TypeRef::Base(BaseType::Int)
    }

    /// Attach type arguments to the last segment
    pub fn with_args(self, arguments: Vec<TypeArgRef>) -> Self {
        match self {
            TypeRef::Named(mut segments) => {
                if let Some(last) = segments.last_mut() {
                    last.arguments = Some(arguments);
                }
                TypeRef::Named(segments)
            }
            other => other,
        }
    }

    /// Array of this type
    pub fn array(self, dimensions: u32) -> Self {
        match self {
            TypeRef::Array {
                component,
                dimensions: inner,
            } => TypeRef::Array {
                component,
                dimensions: inner + dimensions,
            },
            component => TypeRef::Array {
                component: Box::new(component),
                dimensions,
            },
        }
    }

    /// Source spelling, for diagnostics
    pub fn display_name(&self) -> String {
        match self {
            TypeRef::Base(base) => base.name().to_string(),
            TypeRef::Named(segments) => segments
                .iter()
                .map(|segment| segment.name.as_str())
                .collect::<Vec<_>>()
                .join("."),
            TypeRef::Array { component, dimensions } => {
                format!("{}{}", component.display_name(), "[]".repeat(*dimensions as usize))
            }
        }
    }
}

/// Type argument as written in source
#[derive(Debug, Clone, PartialEq)]
pub enum TypeArgRef {
    /// Plain type argument
    Type(TypeRef),
    /// `?`, `? extends B`, `? super B`
    Wildcard {
        /// Wildcard kind
        kind: WildcardKind,
        /// Bound (absent for `?`)
        bound: Option<Box<TypeRef>>,
    },
}

impl TypeArgRef {
    /// `?`
    pub fn unbound() -> Self {
        TypeArgRef::Wildcard {
            kind: WildcardKind::Unbound,
            bound: None,
        }
    }

    /// `? extends bound`
    pub fn extends(bound: TypeRef) -> Self {
        TypeArgRef::Wildcard {
            kind: WildcardKind::Extends,
            bound: Some(Box::new(bound)),
        }
    }

    /// `? super bound`
    pub fn super_of(bound: TypeRef) -> Self {
        TypeArgRef::Wildcard {
            kind: WildcardKind::Super,
            bound: Some(Box::new(bound)),
        }
    }
}

impl From<TypeRef> for TypeArgRef {
    fn from(ty: TypeRef) -> Self {
        TypeArgRef::Type(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_builders() {
        let list = TypeRef::qualified("java.util.List").with_args(vec![TypeRef::simple("String").into()]);
        match &list {
            TypeRef::Named(segments) => {
                assert_eq!(segments.len(), 3);
                assert!(segments[2].arguments.is_some());
                assert!(segments[0].arguments.is_none());
            }
            _ => panic!("Expected named type reference"),
        }
        assert_eq!(list.display_name(), "java.util.List");
    }

    #[test]
    fn test_array_dimensions_accumulate() {
        let array = TypeRef::int().array(1).array(2);
        assert_eq!(
            array,
            TypeRef::Array {
                component: Box::new(TypeRef::int()),
                dimensions: 3
            }
        );
        assert_eq!(array.display_name(), "int[][][]");
    }

    #[test]
    fn test_with_modifiers_keeps_kind_bits() {
        let decl = TypeDecl::interface("I").with_modifiers(Modifiers::empty());
        assert!(decl.modifiers.contains(Modifiers::INTERFACE));
        assert!(!decl.modifiers.contains(Modifiers::PUBLIC));
    }
}
