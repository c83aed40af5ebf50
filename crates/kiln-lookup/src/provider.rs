//! Symbol provider boundary
//!
//! The environment never touches the file system. Whenever it meets a name
//! it does not know yet it asks a [`SymbolProvider`], which answers with a
//! compiled descriptor, a parsed unit or loose source declarations.

use crate::binding::Modifiers;
use crate::decl::{CompilationUnitDecl, TypeDecl};
use crate::names::CompoundName;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::Rc;

/// Answer of a symbol provider
#[derive(Debug, Clone)]
pub enum ProvidedType {
    /// Compiled class description
    Binary(BinaryTypeDescriptor),
    /// Parsed compilation unit
    SourceUnit(CompilationUnitDecl),
    /// Declarations without a unit (e.g. from an index)
    SourceDeclarations {
        /// Package of the declarations
        package: CompoundName,
        /// The declarations
        types: Vec<TypeDecl>,
    },
}

/// Callback into the host for unknown names
pub trait SymbolProvider {
    /// Find the type with the given fully qualified name
    fn find_type(&mut self, name: &CompoundName) -> Option<ProvidedType>;

    /// True when the name denotes an existing package
    fn is_package(&mut self, name: &CompoundName) -> bool;
}

/// Field of a class file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryField {
    /// Field name
    pub name: String,
    /// Access flags
    pub modifiers: Modifiers,
    /// JVM field descriptor
    pub descriptor: String,
    /// Generic signature, if any
    pub generic_signature: Option<String>,
}

/// Method of a class file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMethod {
    /// Name (`<init>` for constructors)
    pub selector: String,
    /// Access flags
    pub modifiers: Modifiers,
    /// JVM method descriptor
    pub descriptor: String,
    /// Generic signature, if any
    pub generic_signature: Option<String>,
    /// Internal names of declared exceptions
    pub exceptions: Vec<String>,
}

/// Compiled class description, using internal names (`java/util/List`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryTypeDescriptor {
    /// Internal name (`java/util/Map$Entry` for member types)
    pub name: String,
    /// Access flags
    pub modifiers: Modifiers,
    /// Generic class signature, if any
    pub generic_signature: Option<String>,
    /// Internal name of the superclass (`None` only for the root type)
    pub superclass_name: Option<String>,
    /// Internal names of the superinterfaces
    pub interface_names: Vec<String>,
    /// Internal name of the enclosing type of a member type
    pub enclosing_type_name: Option<String>,
    /// Internal names of member types
    pub member_type_names: Vec<String>,
    /// Fields
    pub fields: Vec<BinaryField>,
    /// Methods and constructors
    pub methods: Vec<BinaryMethod>,
}

impl BinaryTypeDescriptor {
    fn new(name: &str, modifiers: Modifiers) -> Self {
        BinaryTypeDescriptor {
            name: name.to_string(),
            modifiers,
            generic_signature: None,
            superclass_name: Some("java/lang/Object".to_string()),
            interface_names: Vec::new(),
            enclosing_type_name: None,
            member_type_names: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Public class extending `java/lang/Object`
    pub fn class(name: &str) -> Self {
        BinaryTypeDescriptor::new(name, Modifiers::PUBLIC)
    }

    /// Public interface
    pub fn interface(name: &str) -> Self {
        BinaryTypeDescriptor::new(name, Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT)
    }

    /// Replace the access flags
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set (or clear) the superclass
    pub fn with_superclass(mut self, name: Option<&str>) -> Self {
        self.superclass_name = name.map(str::to_string);
        self
    }

    /// Add a superinterface
    pub fn with_interface(mut self, name: &str) -> Self {
        self.interface_names.push(name.to_string());
        self
    }

    /// Set the generic class signature
    pub fn with_signature(mut self, signature: &str) -> Self {
        self.generic_signature = Some(signature.to_string());
        self
    }

    /// Mark as a member type of `enclosing`
    pub fn with_enclosing(mut self, enclosing: &str) -> Self {
        self.enclosing_type_name = Some(enclosing.to_string());
        self
    }

    /// Add a member type name
    pub fn with_member_type(mut self, name: &str) -> Self {
        self.member_type_names.push(name.to_string());
        self
    }

    /// Add a field
    pub fn with_field(mut self, name: &str, modifiers: Modifiers, descriptor: &str) -> Self {
        self.fields.push(BinaryField {
            name: name.to_string(),
            modifiers,
            descriptor: descriptor.to_string(),
            generic_signature: None,
        });
        self
    }

    /// Add a field with a generic signature
    pub fn with_generic_field(mut self, name: &str, modifiers: Modifiers, descriptor: &str, signature: &str) -> Self {
        self.fields.push(BinaryField {
            name: name.to_string(),
            modifiers,
            descriptor: descriptor.to_string(),
            generic_signature: Some(signature.to_string()),
        });
        self
    }

    /// Add a method
    pub fn with_method(mut self, selector: &str, modifiers: Modifiers, descriptor: &str) -> Self {
        self.methods.push(BinaryMethod {
            selector: selector.to_string(),
            modifiers,
            descriptor: descriptor.to_string(),
            generic_signature: None,
            exceptions: Vec::new(),
        });
        self
    }

    /// Add a method with a generic signature
    pub fn with_generic_method(mut self, selector: &str, modifiers: Modifiers, descriptor: &str, signature: &str) -> Self {
        self.methods.push(BinaryMethod {
            selector: selector.to_string(),
            modifiers,
            descriptor: descriptor.to_string(),
            generic_signature: Some(signature.to_string()),
            exceptions: Vec::new(),
        });
        self
    }

    /// Compound form of the internal name
    pub fn compound_name(&self) -> CompoundName {
        CompoundName::from_internal(&self.name)
    }
}

/// Provider backed by in-memory tables
///
/// Cloning shares the request log, so a test can keep a clone and check
/// which names the environment asked for.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProvider {
    binaries: FxHashMap<String, BinaryTypeDescriptor>,
    sources: FxHashMap<String, CompilationUnitDecl>,
    packages: FxHashSet<String>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl InMemoryProvider {
    /// Empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled type (and its packages)
    pub fn add_binary(&mut self, descriptor: BinaryTypeDescriptor) -> &mut Self {
        self.register_packages(&descriptor.compound_name().parent());
        self.binaries.insert(descriptor.compound_name().dotted(), descriptor);
        self
    }

    /// Register a unit that is handed out when any of its top-level types is requested
    pub fn add_source_unit(&mut self, unit: CompilationUnitDecl) -> &mut Self {
        self.register_packages(&unit.package);
        for decl in &unit.types {
            self.sources.insert(unit.package.child(&decl.name).dotted(), unit.clone());
        }
        self
    }

    /// Register an empty package
    pub fn add_package(&mut self, name: &str) -> &mut Self {
        self.register_packages(&CompoundName::from_dotted(name));
        self
    }

    /// Names requested through `find_type` so far (dotted)
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Number of times `name` was requested
    pub fn request_count(&self, name: &str) -> usize {
        self.requests.borrow().iter().filter(|requested| *requested == name).count()
    }

    fn register_packages(&mut self, package: &CompoundName) {
        let mut current = package.clone();
        while !current.is_empty() {
            self.packages.insert(current.dotted());
            current = current.parent();
        }
    }
}

impl SymbolProvider for InMemoryProvider {
    fn find_type(&mut self, name: &CompoundName) -> Option<ProvidedType> {
        let dotted = name.dotted();
        self.requests.borrow_mut().push(dotted.clone());
        if let Some(descriptor) = self.binaries.get(&dotted) {
            return Some(ProvidedType::Binary(descriptor.clone()));
        }
        // Each unit is handed out once; its other types are then known to the environment
        let unit = self.sources.remove(&dotted)?;
        self.sources.retain(|_, other| other.file_name != unit.file_name);
        Some(ProvidedType::SourceUnit(unit))
    }

    fn is_package(&mut self, name: &CompoundName) -> bool {
        self.packages.contains(&name.dotted())
    }
}
