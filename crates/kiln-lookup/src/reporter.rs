//! Problem reporting
//!
//! The engine never renders diagnostics. It hands structured [`Problem`]
//! values to a [`ProblemReporter`] and keeps going.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Identifier of a reportable problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemId {
    /// Two declarations of the same type
    DuplicateType,
    /// Imported name does not resolve
    ImportNotFound,
    /// Single-type import collides with another import or a unit type
    ConflictingImport,
    /// Imported type is not visible
    ImportNotVisible,
    /// Circular supertype or enclosing chain
    HierarchyCircularity,
    /// Class extends an interface
    SuperclassMustBeAClass,
    /// Class or interface implements a class
    SuperInterfaceMustBeAnInterface,
    /// Class extends a final class
    ClassExtendsFinalClass,
    /// Type variable used as a supertype
    SuperTypeUsingTypeVariable,
    /// Supertype cannot be resolved
    SuperTypeNotFound,
    /// Same superinterface listed twice
    DuplicateSuperinterface,
    /// Different instantiations of one generic interface inherited
    SuperinterfacesCollide,
    /// Type argument violates a declared bound
    TypeArgumentMismatch,
    /// Wrong number of type arguments for a generic type
    IncorrectArityForParameterizedType,
    /// Type arguments on a non-generic type
    NonGenericTypeCannotBeParameterized,
    /// Type reference cannot be resolved
    UndefinedType,
    /// Type reference is ambiguous
    AmbiguousType,
    /// Type reference is not visible
    NotVisibleType,
    /// Two fields with the same name
    DuplicateField,
    /// Two methods with the same erased signature
    DuplicateMethod,
    /// Local variable redeclared in an enclosing block of the same method
    DuplicateLocalVariable,
    /// A type referenced by a class file cannot be found
    IsClassPathCorrect,
    /// Class-file descriptor or generic signature is malformed
    CorruptedSignature,
    /// Primitive used where a reference type is required
    IllegalPrimitiveTypeArgument,
    /// Type argument meets its bound only through a raw type
    UncheckedTypeArgument,
    /// Argument needs unchecked conversion to the parameter type
    UncheckedConversion,
    /// Generic method called as a member of a raw type
    UncheckedRawMemberCall,
}

impl ProblemId {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ProblemId::DuplicateType => "E1001",
            ProblemId::ImportNotFound => "E1002",
            ProblemId::ConflictingImport => "E1003",
            ProblemId::ImportNotVisible => "E1004",
            ProblemId::HierarchyCircularity => "E1101",
            ProblemId::SuperclassMustBeAClass => "E1102",
            ProblemId::SuperInterfaceMustBeAnInterface => "E1103",
            ProblemId::ClassExtendsFinalClass => "E1104",
            ProblemId::SuperTypeUsingTypeVariable => "E1105",
            ProblemId::SuperTypeNotFound => "E1106",
            ProblemId::DuplicateSuperinterface => "E1107",
            ProblemId::SuperinterfacesCollide => "E1108",
            ProblemId::TypeArgumentMismatch => "E1201",
            ProblemId::IncorrectArityForParameterizedType => "E1202",
            ProblemId::NonGenericTypeCannotBeParameterized => "E1203",
            ProblemId::IllegalPrimitiveTypeArgument => "E1204",
            ProblemId::UncheckedTypeArgument => "E1205",
            ProblemId::UncheckedConversion => "E1206",
            ProblemId::UncheckedRawMemberCall => "E1207",
            ProblemId::UndefinedType => "E1301",
            ProblemId::AmbiguousType => "E1302",
            ProblemId::NotVisibleType => "E1303",
            ProblemId::DuplicateField => "E1401",
            ProblemId::DuplicateMethod => "E1402",
            ProblemId::DuplicateLocalVariable => "E1403",
            ProblemId::IsClassPathCorrect => "E1501",
            ProblemId::CorruptedSignature => "E1502",
        }
    }

    /// Message template; `{0}`, `{1}`... are replaced by the arguments
    pub fn template(&self) -> &'static str {
        match self {
            ProblemId::DuplicateType => "The type {0} is already defined",
            ProblemId::ImportNotFound => "The import {0} cannot be resolved",
            ProblemId::ConflictingImport => "The import {0} conflicts with a type already visible in this unit",
            ProblemId::ImportNotVisible => "The type {0} is not visible",
            ProblemId::HierarchyCircularity => "Cycle detected: the type {0} cannot extend/implement {1}",
            ProblemId::SuperclassMustBeAClass => "The type {0} cannot be the superclass of {1}; a superclass must be a class",
            ProblemId::SuperInterfaceMustBeAnInterface => {
                "The type {0} cannot be a superinterface of {1}; a superinterface must be an interface"
            }
            ProblemId::ClassExtendsFinalClass => "The type {1} cannot subclass the final class {0}",
            ProblemId::SuperTypeUsingTypeVariable => "Cannot refer to the type parameter {0} as a supertype of {1}",
            ProblemId::SuperTypeNotFound => "The supertype {0} of {1} cannot be resolved",
            ProblemId::DuplicateSuperinterface => "Duplicate interface {0} for the type {1}",
            ProblemId::SuperinterfacesCollide => {
                "The type {2} cannot implement both {0} and {1}"
            }
            ProblemId::TypeArgumentMismatch => {
                "Bound mismatch: the type {0} is not a valid substitute for the bounded parameter {1} of {2}"
            }
            ProblemId::IncorrectArityForParameterizedType => "Incorrect number of arguments for type {0}",
            ProblemId::NonGenericTypeCannotBeParameterized => {
                "The type {0} is not generic; it cannot be parameterized with arguments"
            }
            ProblemId::IllegalPrimitiveTypeArgument => "Syntax error, insert a reference type instead of {0}",
            ProblemId::UncheckedTypeArgument => {
                "Type safety: the type {0} satisfies the bound of {1} in {2} only through a raw type"
            }
            ProblemId::UncheckedConversion => {
                "Type safety: the expression of type {0} needs unchecked conversion to conform to {1}"
            }
            ProblemId::UncheckedRawMemberCall => {
                "Type safety: the method {0} belongs to the raw type {1}; references to generic type {1} should be parameterized"
            }
            ProblemId::UndefinedType => "{0} cannot be resolved to a type",
            ProblemId::AmbiguousType => "The type {0} is ambiguous",
            ProblemId::NotVisibleType => "The type {0} is not visible",
            ProblemId::DuplicateField => "Duplicate field {1}.{0}",
            ProblemId::DuplicateMethod => "Duplicate method {0} in type {1}",
            ProblemId::DuplicateLocalVariable => "Duplicate local variable {0}",
            ProblemId::IsClassPathCorrect => {
                "The type {0} cannot be resolved. It is indirectly referenced from required class files"
            }
            ProblemId::CorruptedSignature => "The class file {0} contains a corrupted signature: {1}",
        }
    }
}

/// A reported problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// What went wrong
    pub id: ProblemId,
    /// Template arguments, already rendered as names
    pub arguments: Vec<String>,
}

impl Problem {
    /// Create a problem
    pub fn new(id: ProblemId, arguments: Vec<String>) -> Self {
        Problem { id, arguments }
    }

    /// Rendered message
    pub fn message(&self) -> String {
        let mut message = self.id.template().to_string();
        for (i, argument) in self.arguments.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), argument);
        }
        message
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id.code(), self.message())
    }
}

/// Sink for problems found while resolving
pub trait ProblemReporter {
    /// Record a problem; must not fail
    fn report(&mut self, problem: Problem);
}

/// Reporter that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProblemReporter for SilentReporter {
    fn report(&mut self, _problem: Problem) {}
}

/// Reporter that stores problems behind a shared handle
///
/// Clone the reporter before handing it to the environment and read the
/// problems back through the clone.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    problems: Rc<RefCell<Vec<Problem>>>,
}

impl CollectingReporter {
    /// Empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn problems(&self) -> Vec<Problem> {
        self.problems.borrow().clone()
    }

    /// Problems with the given id
    pub fn problems_with(&self, id: ProblemId) -> Vec<Problem> {
        self.problems
            .borrow()
            .iter()
            .filter(|problem| problem.id == id)
            .cloned()
            .collect()
    }

    /// Number of problems with the given id
    pub fn count(&self, id: ProblemId) -> usize {
        self.problems.borrow().iter().filter(|problem| problem.id == id).count()
    }

    /// Drop all stored problems
    pub fn clear(&self) {
        self.problems.borrow_mut().clear();
    }
}

impl ProblemReporter for CollectingReporter {
    fn report(&mut self, problem: Problem) {
        self.problems.borrow_mut().push(problem);
    }
}
