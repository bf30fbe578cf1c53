//! Package repositories consumed by the pool.
//!
//! Repositories here are fully materialized: whatever fetched the metadata
//! (package indexes, VCS drivers, the local install state) has already run.

mod array;
mod installed;
mod platform;

use std::fmt;
use std::sync::Arc;

use pox_semver::VersionParser;

use crate::package::Package;

pub use array::ArrayRepository;
pub use installed::InstalledRepository;
pub use platform::PlatformRepository;

/// Repository interface - read-only package source
pub trait Repository: fmt::Debug {
    /// Get a unique name for this repository
    fn name(&self) -> &str;

    /// Get all packages in the repository, in declaration order
    fn packages(&self) -> &[Arc<Package>];

    /// Find all versions of a package by name
    fn find_packages(&self, name: &str) -> Vec<Arc<Package>> {
        let name = name.to_lowercase();
        self.packages()
            .iter()
            .filter(|package| package.name == name)
            .cloned()
            .collect()
    }

    /// Find a specific package version; the version may be pretty or normalized
    fn find_package(&self, name: &str, version: &str) -> Option<Arc<Package>> {
        let name = name.to_lowercase();
        let normalized = VersionParser::new()
            .normalize(version)
            .unwrap_or_else(|_| version.to_string());
        self.packages()
            .iter()
            .find(|package| package.name == name && package.version == normalized)
            .cloned()
    }

    fn has_package(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.packages().iter().any(|package| package.name == name)
    }

    /// Get the number of packages in the repository
    fn count(&self) -> usize {
        self.packages().len()
    }
}
