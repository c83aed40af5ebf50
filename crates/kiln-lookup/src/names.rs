//! Compound names and well-known type names

use std::fmt;

/// Segmented fully-qualified name of a package or type
///
/// `java.util.Map` is `["java", "util", "Map"]`. Member types use their own
/// segment (`java.util.Map.Entry`), while binary names keep the `$`
/// separator inside the last segment (`java/util/Map$Entry`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CompoundName(Vec<String>);

impl CompoundName {
    /// Build from segments
    pub fn new(segments: Vec<String>) -> Self {
        CompoundName(segments)
    }

    /// Parse a dotted source name (`java.lang.Object`)
    pub fn from_dotted(name: &str) -> Self {
        if name.is_empty() {
            return CompoundName::default();
        }
        CompoundName(name.split('.').map(str::to_string).collect())
    }

    /// Parse an internal binary name (`java/lang/Object`)
    pub fn from_internal(name: &str) -> Self {
        if name.is_empty() {
            return CompoundName::default();
        }
        CompoundName(name.split('/').map(str::to_string).collect())
    }

    /// Segments of the name
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the default package
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment (simple name)
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Everything but the last segment
    pub fn parent(&self) -> CompoundName {
        match self.0.split_last() {
            Some((_, rest)) => CompoundName(rest.to_vec()),
            None => CompoundName::default(),
        }
    }

    /// Append a segment
    pub fn child(&self, segment: &str) -> CompoundName {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        CompoundName(segments)
    }

    /// Dotted form
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    /// Internal (slash separated) form
    pub fn internal(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for CompoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl From<&str> for CompoundName {
    fn from(name: &str) -> Self {
        CompoundName::from_dotted(name)
    }
}

/// Names the engine knows about without being told
pub mod well_known {
    /// Universal root type
    pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";
    /// String type
    pub const JAVA_LANG_STRING: &str = "java.lang.String";
    /// Supertype of all enums
    pub const JAVA_LANG_ENUM: &str = "java.lang.Enum";
    /// Implicit superinterface of annotation types
    pub const JAVA_LANG_ANNOTATION_ANNOTATION: &str = "java.lang.annotation.Annotation";
    /// Array supertype
    pub const JAVA_LANG_CLONEABLE: &str = "java.lang.Cloneable";
    /// Array supertype
    pub const JAVA_IO_SERIALIZABLE: &str = "java.io.Serializable";
    /// Package implicitly imported on demand by every unit
    pub const JAVA_LANG: &[&str] = &["java", "lang"];

    /// Selector of constructors
    pub const INIT: &str = "<init>";
    /// Selector of static initializers
    pub const CLINIT: &str = "<clinit>";
    /// Synthetic length field of arrays
    pub const LENGTH: &str = "length";
    /// Clone method of arrays
    pub const CLONE: &str = "clone";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_and_internal_forms() {
        let name = CompoundName::from_internal("java/util/Map$Entry");
        assert_eq!(name.len(), 3);
        assert_eq!(name.last(), Some("Map$Entry"));
        assert_eq!(name.dotted(), "java.util.Map$Entry");
        assert_eq!(CompoundName::from_dotted("java.util.List").internal(), "java/util/List");
    }

    #[test]
    fn test_parent_and_child() {
        let name = CompoundName::from_dotted("java.lang.Object");
        assert_eq!(name.parent(), CompoundName::from_dotted("java.lang"));
        assert_eq!(name.parent().child("String"), CompoundName::from_dotted("java.lang.String"));
        assert!(CompoundName::from_dotted("").is_empty());
    }
}
