//! Error types for binding resolution
//!
//! Resolution failures come in two flavours. Recoverable failures are
//! returned as [`Resolution::Problem`] values so the caller can keep analyzing
//! the rest of the unit. The single fatal failure, a foundation type that
//! cannot be located at all, is an [`AbortCompilation`] error that travels up
//! through `?` to the compile driver.

use std::fmt;
use thiserror::Error;

/// Fatal condition that unwinds the whole compilation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbortCompilation {
    /// A type every compilation depends on (e.g. `java.lang.Object`) is missing
    #[error("The type {name} cannot be resolved. The class path is incorrect or incomplete")]
    MissingFoundationType {
        /// Dotted name of the missing type
        name: String,
    },
}

/// Result of an engine call that may hit the fatal abort path
pub type LookupResult<T> = Result<T, AbortCompilation>;

/// Reason code carried by a problem binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemReason {
    /// No candidate at all
    NotFound,
    /// A candidate exists but fails the visibility check
    NotVisible,
    /// Two or more equally good candidates
    Ambiguous,
    /// An inherited match is shadowed by a declaration in an enclosing type
    InheritedNameHidesEnclosingName,
    /// Instance member referenced from a static context
    NonStaticReferenceInStaticContext,
    /// Explicit or inferred type argument violates a declared bound
    ParameterBoundMismatch,
    /// Wrong number of explicit type arguments
    TypeParameterArityMismatch,
    /// Explicit type arguments supplied to a generic method of a raw type
    TypeArgumentsForRawGenericMethod,
    /// The type's supertypes could not be fully connected
    HierarchyHasProblems,
}

impl ProblemReason {
    /// Short human readable label (used by `Display`)
    pub fn label(&self) -> &'static str {
        match self {
            ProblemReason::NotFound => "not found",
            ProblemReason::NotVisible => "not visible",
            ProblemReason::Ambiguous => "ambiguous",
            ProblemReason::InheritedNameHidesEnclosingName => "inherited name hides enclosing name",
            ProblemReason::NonStaticReferenceInStaticContext => "non-static reference in static context",
            ProblemReason::ParameterBoundMismatch => "parameter bound mismatch",
            ProblemReason::TypeParameterArityMismatch => "type parameter arity mismatch",
            ProblemReason::TypeArgumentsForRawGenericMethod => "type arguments for raw generic method",
            ProblemReason::HierarchyHasProblems => "hierarchy has problems",
        }
    }
}

impl fmt::Display for ProblemReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sentinel describing a failed resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemBinding<T> {
    /// Name that was being resolved
    pub name: String,
    /// Why resolution failed
    pub reason: ProblemReason,
    /// Best candidate found, kept for downstream diagnostics
    pub closest_match: Option<T>,
}

impl<T> ProblemBinding<T> {
    /// Create a problem without a closest match
    pub fn new(name: impl Into<String>, reason: ProblemReason) -> Self {
        ProblemBinding {
            name: name.into(),
            reason,
            closest_match: None,
        }
    }

    /// Create a problem that remembers the best candidate
    pub fn with_closest(name: impl Into<String>, reason: ProblemReason, closest: T) -> Self {
        ProblemBinding {
            name: name.into(),
            reason,
            closest_match: Some(closest),
        }
    }
}

/// Outcome of a recoverable resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Resolution succeeded
    Found(T),
    /// Resolution failed; the problem describes why
    Problem(ProblemBinding<T>),
}

impl<T: Copy> Resolution<T> {
    /// The resolved value, if any
    pub fn found(&self) -> Option<T> {
        match self {
            Resolution::Found(value) => Some(*value),
            Resolution::Problem(_) => None,
        }
    }

    /// The problem reason, if resolution failed
    pub fn problem_reason(&self) -> Option<ProblemReason> {
        match self {
            Resolution::Found(_) => None,
            Resolution::Problem(problem) => Some(problem.reason),
        }
    }

    /// Found value, or the closest match recorded by the problem
    pub fn found_or_closest(&self) -> Option<T> {
        match self {
            Resolution::Found(value) => Some(*value),
            Resolution::Problem(problem) => problem.closest_match,
        }
    }

    /// True when resolution succeeded
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    /// Map the carried value (and closest match) to another handle type
    pub fn map<U>(self, f: impl Fn(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Found(value) => Resolution::Found(f(value)),
            Resolution::Problem(problem) => Resolution::Problem(ProblemBinding {
                name: problem.name,
                reason: problem.reason,
                closest_match: problem.closest_match.map(f),
            }),
        }
    }
}

/// Errors decoding binary descriptors and generic signatures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Input ended in the middle of a signature
    #[error("Unexpected end of signature '{signature}'")]
    UnexpectedEnd {
        /// Full signature text
        signature: String,
    },

    /// Unexpected character at the given offset
    #[error("Unexpected '{found}' at offset {offset} in signature '{signature}'")]
    UnexpectedChar {
        /// Full signature text
        signature: String,
        /// Offending character
        found: char,
        /// Byte offset of the character
        offset: usize,
    },

    /// Trailing characters after a complete signature
    #[error("Trailing characters at offset {offset} in signature '{signature}'")]
    TrailingCharacters {
        /// Full signature text
        signature: String,
        /// Byte offset of the first trailing character
        offset: usize,
    },
}

/// Errors loading compiler options
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Failed to parse TOML
    #[error("Failed to parse compiler options: {0}")]
    Parse(#[from] toml::de::Error),

    /// Options are syntactically valid but inconsistent
    #[error("Invalid compiler options: {0}")]
    Validation(String),
}
