use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of package link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    #[serde(rename = "requires")]
    Require,
    #[serde(rename = "conflicts")]
    Conflict,
    #[serde(rename = "provides")]
    Provide,
    #[serde(rename = "replaces")]
    Replace,
    #[serde(rename = "recommends")]
    Recommend,
    #[serde(rename = "suggests")]
    Suggest,
}

impl LinkType {
    /// Returns a human-readable description of the link type
    pub fn description(&self) -> &'static str {
        match self {
            LinkType::Require => "requires",
            LinkType::Conflict => "conflicts with",
            LinkType::Provide => "provides",
            LinkType::Replace => "replaces",
            LinkType::Recommend => "recommends",
            LinkType::Suggest => "suggests",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A relation from one package to a named target under a version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Source package name (lowercase)
    pub source: String,
    /// Target package name (lowercase)
    pub target: String,
    /// Version constraint string (e.g., "^1.0", ">=2.0,<3.0")
    pub constraint: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

impl Link {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        constraint: impl Into<String>,
        link_type: LinkType,
    ) -> Self {
        Self {
            source: source.into().to_lowercase(),
            target: target.into().to_lowercase(),
            constraint: constraint.into(),
            link_type,
        }
    }

    /// Returns a human-readable description of this link
    pub fn description(&self) -> String {
        format!(
            "{} {} {} {}",
            self.source,
            self.link_type.description(),
            self.target,
            self.constraint
        )
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_lowercases_names() {
        let link = Link::new("Vendor/App", "Vendor/Lib", "^1.0", LinkType::Require);
        assert_eq!(link.source, "vendor/app");
        assert_eq!(link.target, "vendor/lib");
        assert_eq!(link.constraint, "^1.0");
    }

    #[test]
    fn test_link_description() {
        let link = Link::new("a/a", "b/b", "<2.0", LinkType::Conflict);
        assert_eq!(link.description(), "a/a conflicts with b/b <2.0");
        assert_eq!(link.to_string(), link.description());
    }

    #[test]
    fn test_link_type_serde_names() {
        let json = serde_json::to_string(&LinkType::Replace).unwrap();
        assert_eq!(json, "\"replaces\"");
        let parsed: LinkType = serde_json::from_str("\"requires\"").unwrap();
        assert_eq!(parsed, LinkType::Require);
    }
}
