use std::fmt;

use indexmap::IndexMap;
use pox_semver::{Stability, VersionParser};

use super::{Link, LinkType};

/// One concrete version of a package, as offered by a repository.
///
/// Link maps are keyed by lowercase target name and keep declaration order,
/// which keeps rule generation deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package name (lowercase)
    pub name: String,
    /// Package name as declared
    pub pretty_name: String,
    /// Normalized version (e.g. "1.0.0.0")
    pub version: String,
    /// Version as declared (e.g. "v1.0")
    pub pretty_version: String,
    pub stability: Stability,
    /// VCS reference of a dev package checkout
    pub source_reference: Option<String>,
    pub require: IndexMap<String, String>,
    pub conflict: IndexMap<String, String>,
    pub provide: IndexMap<String, String>,
    pub replace: IndexMap<String, String>,
    pub recommend: IndexMap<String, String>,
    /// Suggested package name -> human readable reason
    pub suggest: IndexMap<String, String>,
}

impl Package {
    /// Creates a package, normalizing its version.
    ///
    /// A version the parser does not understand is kept verbatim so that
    /// exotic catalogs can still be loaded; such a package only matches
    /// constraints that compare equal to the raw string.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let pretty_name = name.into();
        let pretty_version = version.into();
        let version = match VersionParser::new().normalize(&pretty_version) {
            Ok(normalized) => normalized,
            Err(e) => {
                log::debug!("Keeping unparseable version of {}: {}", pretty_name, e);
                pretty_version.clone()
            }
        };
        let stability = VersionParser::parse_stability(&version);

        Self {
            name: pretty_name.to_lowercase(),
            pretty_name,
            version,
            pretty_version,
            stability,
            source_reference: None,
            require: IndexMap::new(),
            conflict: IndexMap::new(),
            provide: IndexMap::new(),
            replace: IndexMap::new(),
            recommend: IndexMap::new(),
            suggest: IndexMap::new(),
        }
    }

    pub fn with_require(mut self, target: &str, constraint: &str) -> Self {
        let constraint = self.resolve_self_version(constraint);
        self.require.insert(target.to_lowercase(), constraint);
        self
    }

    pub fn with_conflict(mut self, target: &str, constraint: &str) -> Self {
        let constraint = self.resolve_self_version(constraint);
        self.conflict.insert(target.to_lowercase(), constraint);
        self
    }

    pub fn with_provide(mut self, target: &str, constraint: &str) -> Self {
        let constraint = self.resolve_self_version(constraint);
        self.provide.insert(target.to_lowercase(), constraint);
        self
    }

    pub fn with_replace(mut self, target: &str, constraint: &str) -> Self {
        let constraint = self.resolve_self_version(constraint);
        self.replace.insert(target.to_lowercase(), constraint);
        self
    }

    pub fn with_recommend(mut self, target: &str, constraint: &str) -> Self {
        let constraint = self.resolve_self_version(constraint);
        self.recommend.insert(target.to_lowercase(), constraint);
        self
    }

    pub fn with_suggest(mut self, target: &str, reason: &str) -> Self {
        self.suggest.insert(target.to_lowercase(), reason.to_string());
        self
    }

    pub fn with_source_reference(mut self, reference: impl Into<String>) -> Self {
        self.source_reference = Some(reference.into());
        self
    }

    /// `self.version` in a link means "exactly my own version".
    fn resolve_self_version(&self, constraint: &str) -> String {
        if constraint.trim() == "self.version" {
            format!("={}", self.version)
        } else {
            constraint.to_string()
        }
    }

    /// Replaces `self.version` in link maps filled in directly.
    pub fn replace_self_version(&mut self) {
        let own = format!("={}", self.version);
        for map in [
            &mut self.require,
            &mut self.conflict,
            &mut self.provide,
            &mut self.replace,
            &mut self.recommend,
        ] {
            for constraint in map.values_mut() {
                if constraint.trim() == "self.version" {
                    *constraint = own.clone();
                }
            }
        }
    }

    pub fn is_dev(&self) -> bool {
        self.stability == Stability::Dev
    }

    /// Returns the links of one type, in declaration order.
    pub fn links(&self, link_type: LinkType) -> Vec<Link> {
        let map = match link_type {
            LinkType::Require => &self.require,
            LinkType::Conflict => &self.conflict,
            LinkType::Provide => &self.provide,
            LinkType::Replace => &self.replace,
            LinkType::Recommend => &self.recommend,
            LinkType::Suggest => &self.suggest,
        };
        map.iter()
            .map(|(target, constraint)| Link::new(&self.name, target, constraint, link_type))
            .collect()
    }

    /// Names this package can be installed as: its own name, every replaced
    /// name and, when asked, every provided name.
    pub fn get_names(&self, include_provides: bool) -> Vec<String> {
        let mut names = vec![self.name.clone()];

        for replaced in self.replace.keys() {
            if !names.contains(replaced) {
                names.push(replaced.clone());
            }
        }

        if include_provides {
            for provided in self.provide.keys() {
                if !names.contains(provided) {
                    names.push(provided.clone());
                }
            }
        }

        names
    }

    /// `name-version`, the form used in rule text.
    pub fn unique_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    pub fn pretty_string(&self) -> String {
        format!("{} {}", self.pretty_name, self.pretty_version)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_new_normalizes() {
        let package = Package::new("Vendor/Package", "v1.2");
        assert_eq!(package.name, "vendor/package");
        assert_eq!(package.pretty_name, "Vendor/Package");
        assert_eq!(package.version, "1.2.0.0");
        assert_eq!(package.pretty_version, "v1.2");
        assert_eq!(package.stability, Stability::Stable);
        assert!(!package.is_dev());
    }

    #[test]
    fn test_package_stability_from_version() {
        assert_eq!(Package::new("a", "1.0.0-beta2").stability, Stability::Beta);
        assert_eq!(Package::new("a", "1.0.0-RC1").stability, Stability::RC);
        assert!(Package::new("a", "dev-master").is_dev());
        assert!(Package::new("a", "1.0.x-dev").is_dev());
    }

    #[test]
    fn test_package_keeps_unparseable_version() {
        let package = Package::new("a", "not a version");
        assert_eq!(package.version, "not a version");
    }

    #[test]
    fn test_self_version_in_links() {
        let package = Package::new("symfony/symfony", "5.4.0")
            .with_replace("Symfony/Console", "self.version")
            .with_require("php", ">=7.2");
        assert_eq!(package.replace.get("symfony/console"), Some(&"=5.4.0.0".to_string()));
        assert_eq!(package.require.get("php"), Some(&">=7.2".to_string()));
    }

    #[test]
    fn test_replace_self_version_in_filled_maps() {
        let mut package = Package::new("a", "2.0");
        package.provide.insert("b".to_string(), "self.version".to_string());
        package.replace_self_version();
        assert_eq!(package.provide.get("b"), Some(&"=2.0.0.0".to_string()));
    }

    #[test]
    fn test_get_names() {
        let package = Package::new("a", "1.0")
            .with_replace("b", "*")
            .with_provide("c", "1.0")
            .with_provide("b", "*");
        assert_eq!(package.get_names(false), vec!["a", "b"]);
        assert_eq!(package.get_names(true), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_links_keep_declaration_order() {
        let package = Package::new("a", "1.0")
            .with_require("z", "^1.0")
            .with_require("b", "^2.0");
        let targets: Vec<String> = package
            .links(LinkType::Require)
            .into_iter()
            .map(|link| link.target)
            .collect();
        assert_eq!(targets, vec!["z", "b"]);
    }

    #[test]
    fn test_names_and_display() {
        let package = Package::new("Foo/Bar", "1.0.0");
        assert_eq!(package.unique_name(), "foo/bar-1.0.0.0");
        assert_eq!(package.pretty_string(), "Foo/Bar 1.0.0");
        assert_eq!(package.to_string(), "Foo/Bar 1.0.0");
    }
}
