//! Selection criteria for [`MemoryHistogram::filter`](crate::MemoryHistogram::filter).

use crate::CriteriaError;
use crate::class_name::normalize;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// A reference to a JVM class, matched by its canonical name.
///
/// Built from the binary name the JVM reports for the class
/// (`java.util.ArrayList`, `[Ljava.lang.Object;`), so the same normalization
/// applied to capture rows decides what it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    binary_name: String,
    canonical_name: String,
}

impl TypeRef {
    pub fn new(binary_name: impl Into<String>) -> Self {
        let binary_name = binary_name.into();
        let canonical_name = normalize(&binary_name);
        Self {
            binary_name,
            canonical_name,
        }
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }
}

/// One way of selecting histogram entries.
#[derive(Debug, Clone)]
pub enum Criteria {
    /// Exact canonical class name.
    Exact(String),
    /// Class names starting with this text.
    Prefix(String),
    /// Class names containing a match of the pattern anywhere.
    Pattern(Regex),
    /// The class a [`TypeRef`] resolves to.
    Type(TypeRef),
}

impl Criteria {
    /// Whether a canonical class name is selected.
    pub fn matches(&self, class_name: &str) -> bool {
        match self {
            Criteria::Exact(name) => class_name == name,
            Criteria::Prefix(prefix) => class_name.starts_with(prefix.as_str()),
            Criteria::Pattern(pattern) => pattern.is_match(class_name),
            Criteria::Type(type_ref) => class_name == type_ref.canonical_name(),
        }
    }

    /// Parse the textual criteria syntax used on the command line.
    ///
    /// - `re:<regex>` or `regex:<regex>`
    /// - `type:<binary class name>`
    /// - `name:<exact name>`
    /// - `glob:<prefix>*`
    /// - anything else is a bare name: `java.util.*` is a prefix, every other
    ///   string an exact name
    pub fn parse(text: &str) -> Result<Self, CriteriaError> {
        if text.is_empty() {
            return Err(CriteriaError::Empty);
        }

        let Some((kind, value)) = text.split_once(':') else {
            return Ok(Criteria::from(text));
        };

        match kind {
            "re" | "regex" => Ok(Criteria::Pattern(Regex::new(value)?)),
            "type" => Ok(Criteria::Type(TypeRef::new(value))),
            "name" => Ok(Criteria::Exact(value.to_string())),
            "glob" => Ok(Criteria::from(value)),
            other => Err(CriteriaError::Unsupported(other.to_string())),
        }
    }
}

impl From<&str> for Criteria {
    fn from(text: &str) -> Self {
        match text.strip_suffix('*') {
            Some(prefix) => Criteria::Prefix(prefix.to_string()),
            None => Criteria::Exact(text.to_string()),
        }
    }
}

impl From<String> for Criteria {
    fn from(text: String) -> Self {
        Criteria::from(text.as_str())
    }
}

impl From<Regex> for Criteria {
    fn from(pattern: Regex) -> Self {
        Criteria::Pattern(pattern)
    }
}

impl From<TypeRef> for Criteria {
    fn from(type_ref: TypeRef) -> Self {
        Criteria::Type(type_ref)
    }
}

impl FromStr for Criteria {
    type Err = CriteriaError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Criteria::parse(text)
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Exact(name) => write!(f, "name:{name}"),
            Criteria::Prefix(prefix) => write!(f, "glob:{prefix}*"),
            Criteria::Pattern(pattern) => write!(f, "re:{}", pattern.as_str()),
            Criteria::Type(type_ref) => write!(f, "type:{}", type_ref.binary_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_strings() {
        assert!(matches!(Criteria::from("java.util.*"), Criteria::Prefix(p) if p == "java.util."));
        assert!(matches!(Criteria::from("String"), Criteria::Exact(n) if n == "String"));
    }

    #[test]
    fn prefix_matches_start_only() {
        let criteria = Criteria::from("java.util.*");
        assert!(criteria.matches("java.util.ArrayList"));
        assert!(!criteria.matches("com.java.util.Fake"));
    }

    #[test]
    fn pattern_matches_anywhere() {
        let criteria = Criteria::parse("re:Map\\$").unwrap();
        assert!(criteria.matches("java.util.HashMap$Node"));
        assert!(!criteria.matches("java.util.HashMap"));
    }

    #[test]
    fn type_ref_uses_canonical_name() {
        let object_array = TypeRef::new("[Ljava.lang.Object;");
        assert_eq!(object_array.canonical_name(), "Object[]");
        assert_eq!(object_array.binary_name(), "[Ljava.lang.Object;");

        let criteria = Criteria::from(object_array);
        assert!(criteria.matches("Object[]"));
        assert!(!criteria.matches("[Ljava.lang.Object;"));

        let criteria = Criteria::parse("type:java.util.ArrayList").unwrap();
        assert!(criteria.matches("java.util.ArrayList"));
    }

    #[test]
    fn parse_prefixed_kinds() {
        let Ok(Criteria::Exact(name)) = Criteria::parse("name:Foo*") else {
            panic!("name: should give an exact criteria");
        };
        assert_eq!(name, "Foo*");

        let Ok(Criteria::Prefix(prefix)) = Criteria::parse("glob:com.acme.*") else {
            panic!("glob: should give a prefix criteria");
        };
        assert_eq!(prefix, "com.acme.");

        assert!(matches!(Criteria::parse("regex:^int"), Ok(Criteria::Pattern(_))));
    }

    #[test]
    fn unsupported_kind_fails() {
        let result = "size:100".parse::<Criteria>();
        assert!(matches!(result, Err(CriteriaError::Unsupported(kind)) if kind == "size"));
    }

    #[test]
    fn invalid_pattern_fails() {
        assert!(matches!(
            Criteria::parse("re:(unclosed"),
            Err(CriteriaError::Pattern(_))
        ));
    }

    #[test]
    fn empty_fails() {
        assert!(matches!(Criteria::parse(""), Err(CriteriaError::Empty)));
    }

    #[test]
    fn display_round_trips() {
        for text in ["name:Foo", "glob:java.util.*", "re:.*Foo", "type:[I"] {
            let criteria: Criteria = text.parse().unwrap();
            assert_eq!(criteria.to_string(), text);
        }
    }
}
