//! Compiler options read by the binding engine
//!
//! Options are read-only for the lifetime of an environment. They gate the
//! language features the engine honours: generics (type parameters, type
//! arguments, wildcards, inference), boxing conversions and variable arity
//! invocation.

use crate::error::OptionsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Language level of the sources (or of the class files being consumed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageLevel {
    /// 1.3
    #[serde(rename = "1.3")]
    Jdk1_3,
    /// 1.4
    #[serde(rename = "1.4")]
    Jdk1_4,
    /// 1.5, first level with generics, boxing and varargs
    #[serde(rename = "1.5")]
    Jdk1_5,
    /// 1.6
    #[serde(rename = "1.6")]
    Jdk1_6,
    /// 1.7
    #[serde(rename = "1.7")]
    Jdk1_7,
    /// 1.8
    #[serde(rename = "1.8")]
    Jdk1_8,
}

impl Default for LanguageLevel {
    fn default() -> Self {
        LanguageLevel::Jdk1_8
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LanguageLevel::Jdk1_3 => "1.3",
            LanguageLevel::Jdk1_4 => "1.4",
            LanguageLevel::Jdk1_5 => "1.5",
            LanguageLevel::Jdk1_6 => "1.6",
            LanguageLevel::Jdk1_7 => "1.7",
            LanguageLevel::Jdk1_8 => "1.8",
        };
        f.write_str(text)
    }
}

/// Compiler options (usually loaded from a `[compiler]`-less TOML document)
///
/// ```toml
/// source_level = "1.5"
/// compliance_level = "1.6"
/// report_unchecked = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Level of the sources being analyzed
    #[serde(default)]
    pub source_level: LanguageLevel,

    /// Level the produced bindings must comply with
    #[serde(default)]
    pub compliance_level: LanguageLevel,

    /// Report unchecked conversions and raw type bound checks
    #[serde(default = "default_report_unchecked")]
    pub report_unchecked: bool,
}

fn default_report_unchecked() -> bool {
    true
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            source_level: LanguageLevel::default(),
            compliance_level: LanguageLevel::default(),
            report_unchecked: true,
        }
    }
}

impl CompilerOptions {
    /// Options for a given source level, with compliance at the same level
    pub fn for_level(level: LanguageLevel) -> Self {
        CompilerOptions {
            source_level: level,
            compliance_level: level,
            ..CompilerOptions::default()
        }
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        let options: CompilerOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate option consistency
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.source_level > self.compliance_level {
            return Err(OptionsError::Validation(format!(
                "source level {} is higher than compliance level {}",
                self.source_level, self.compliance_level
            )));
        }
        Ok(())
    }

    /// Whether type parameters, type arguments and inference are active
    pub fn generics_enabled(&self) -> bool {
        self.source_level >= LanguageLevel::Jdk1_5
    }

    /// Whether boxing/unboxing conversions participate in invocation
    pub fn boxing_enabled(&self) -> bool {
        self.source_level >= LanguageLevel::Jdk1_5
    }

    /// Whether variable arity invocation is considered
    pub fn varargs_enabled(&self) -> bool {
        self.source_level >= LanguageLevel::Jdk1_5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let options = CompilerOptions::default();
        assert!(options.generics_enabled());
        assert!(options.boxing_enabled());
        assert!(options.varargs_enabled());
    }

    #[test]
    fn test_parse_toml() {
        let options = CompilerOptions::from_toml_str(
            r#"
            source_level = "1.4"
            compliance_level = "1.6"
            "#,
        )
        .unwrap();
        assert_eq!(options.source_level, LanguageLevel::Jdk1_4);
        assert_eq!(options.compliance_level, LanguageLevel::Jdk1_6);
        assert!(options.report_unchecked);
        assert!(!options.generics_enabled());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let options = CompilerOptions::from_toml_str("").unwrap();
        assert_eq!(options, CompilerOptions::default());
    }

    #[test]
    fn test_source_above_compliance_is_rejected() {
        let result = CompilerOptions::from_toml_str(
            r#"
            source_level = "1.8"
            compliance_level = "1.5"
            "#,
        );
        assert!(matches!(result, Err(OptionsError::Validation(_))));
    }

    #[test]
    fn test_unknown_level_is_parse_error() {
        let result = CompilerOptions::from_toml_str(r#"source_level = "9""#);
        assert!(matches!(result, Err(OptionsError::Parse(_))));
    }
}
