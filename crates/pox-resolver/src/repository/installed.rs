use std::sync::Arc;

use super::{PlatformRepository, Repository};
use crate::package::Package;

/// What is currently installed: local packages followed by the platform.
///
/// Registered first in the pool, so it always has priority 0.
#[derive(Debug, Clone)]
pub struct InstalledRepository {
    packages: Vec<Arc<Package>>,
    local_count: usize,
}

impl InstalledRepository {
    pub fn new(local: Vec<Arc<Package>>, platform: &PlatformRepository) -> Self {
        let local_count = local.len();
        let mut packages = local;
        packages.extend(platform.packages().iter().cloned());
        Self {
            packages,
            local_count,
        }
    }

    /// Installed packages without the platform entries.
    pub fn local_packages(&self) -> &[Arc<Package>] {
        &self.packages[..self.local_count]
    }
}

impl Repository for InstalledRepository {
    fn name(&self) -> &str {
        "installed"
    }

    fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_combines_local_and_platform() {
        let local = vec![Arc::new(Package::new("vendor/a", "1.0.0"))];
        let platform = PlatformRepository::with_packages([("php", "8.3.0")]);
        let repo = InstalledRepository::new(local, &platform);

        assert_eq!(repo.count(), 2);
        assert_eq!(repo.local_packages().len(), 1);
        assert_eq!(repo.local_packages()[0].name, "vendor/a");
        assert!(repo.has_package("php"));
    }
}
