//! Lock snapshot consumed by the resolver.
//!
//! Only the parts of a lock file that influence resolution are modeled: the
//! content hash of the root definition, the locked name/version pairs and the
//! source reference of dev packages.
//! Reading and writing the file itself belongs to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use pox_semver::VersionParser;
use serde::{Deserialize, Serialize};

use crate::package::Package;

/// A previously resolved set of packages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LockSnapshot {
    /// Hash of the root package definition the snapshot was resolved from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    /// Production packages
    #[serde(default)]
    pub packages: Vec<LockedPackage>,

    /// Development packages
    #[serde(default, rename = "packages-dev")]
    pub packages_dev: Vec<LockedPackage>,
}

/// A locked package entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LockedPackage {
    /// Package name (vendor/package)
    pub name: String,

    /// Version string as recorded
    pub version: String,

    /// Source information (VCS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<LockSource>,
}

/// Source information of a locked package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSource {
    #[serde(rename = "type", default)]
    pub source_type: String,
    #[serde(default)]
    pub url: String,
    pub reference: String,
}

impl LockedPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            source: None,
        }
    }

    pub fn with_source_reference(mut self, reference: impl Into<String>) -> Self {
        self.source = Some(LockSource {
            source_type: "git".to_string(),
            url: String::new(),
            reference: reference.into(),
        });
        self
    }

    pub fn source_reference(&self) -> Option<&str> {
        self.source.as_ref().map(|source| source.reference.as_str())
    }

    /// Version in normalized form, or verbatim if it cannot be parsed
    pub fn normalized_version(&self) -> String {
        VersionParser::new()
            .normalize(&self.version)
            .unwrap_or_else(|_| self.version.clone())
    }
}

impl LockSnapshot {
    pub fn new(packages: Vec<LockedPackage>) -> Self {
        Self {
            content_hash: None,
            packages,
            packages_dev: Vec::new(),
        }
    }

    /// Snapshot of a resolved set of packages
    pub fn from_packages(packages: &[Arc<Package>]) -> Self {
        let packages = packages
            .iter()
            .map(|package| {
                let locked = LockedPackage::new(&package.pretty_name, &package.pretty_version);
                match &package.source_reference {
                    Some(reference) => locked.with_source_reference(reference.clone()),
                    None => locked,
                }
            })
            .collect();
        Self::new(packages)
    }

    /// Production then development packages
    pub fn packages(&self) -> impl Iterator<Item = &LockedPackage> {
        self.packages.iter().chain(self.packages_dev.iter())
    }

    pub fn find(&self, name: &str) -> Option<&LockedPackage> {
        self.packages()
            .find(|locked| locked.name.eq_ignore_ascii_case(name))
    }

    /// Lowercase name -> normalized locked version
    pub fn locked_versions(&self) -> HashMap<String, String> {
        self.packages()
            .map(|locked| (locked.name.to_lowercase(), locked.normalized_version()))
            .collect()
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    /// False when the snapshot was recorded for a different root definition.
    /// A snapshot or caller without a hash is assumed fresh.
    pub fn is_fresh(&self, content_hash: Option<&str>) -> bool {
        match (self.content_hash.as_deref(), content_hash) {
            (Some(locked), Some(current)) => locked == current,
            _ => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.packages_dev.is_empty()
    }
}
