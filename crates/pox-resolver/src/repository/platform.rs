use std::sync::Arc;

use super::Repository;
use crate::package::Package;
use crate::util::is_platform_package;

/// Platform packages (`php`, `ext-*`, `lib-*`) as reported by the caller.
///
/// Nothing is probed at runtime; the embedding tool decides which platform
/// it resolves for.
#[derive(Debug, Clone)]
pub struct PlatformRepository {
    packages: Vec<Arc<Package>>,
}

impl PlatformRepository {
    pub fn new() -> Self {
        Self {
            packages: Vec::new(),
        }
    }

    /// Builds the repository from `(name, version)` pairs.
    pub fn with_packages<I, N, V>(packages: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut repo = Self::new();
        for (name, version) in packages {
            repo.add_package(name, version);
        }
        repo
    }

    /// Adds or overrides a platform package. Names outside the platform
    /// namespace are ignored.
    pub fn add_package(&mut self, name: impl Into<String>, version: impl Into<String>) {
        let package = Package::new(name, version);
        if !is_platform_package(&package.name) {
            log::warn!("Ignoring non-platform package {} in platform repository", package.name);
            return;
        }
        self.packages.retain(|existing| existing.name != package.name);
        self.packages.push(Arc::new(package));
    }
}

impl Default for PlatformRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for PlatformRepository {
    fn name(&self) -> &str {
        "platform"
    }

    fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }
}
