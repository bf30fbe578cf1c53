use std::sync::Arc;

use super::Repository;
use crate::package::Package;

/// In-memory repository holding packages in insertion order.
#[derive(Debug, Clone)]
pub struct ArrayRepository {
    name: String,
    packages: Vec<Arc<Package>>,
}

impl ArrayRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packages: Vec::new(),
        }
    }

    pub fn with_packages(name: impl Into<String>, packages: Vec<Package>) -> Self {
        let mut repo = Self::new(name);
        for package in packages {
            repo.add_package(package);
        }
        repo
    }

    pub fn add_package(&mut self, package: Package) {
        self.packages.push(Arc::new(package));
    }

    pub fn remove_package(&mut self, name: &str, version: &str) {
        let name = name.to_lowercase();
        self.packages
            .retain(|package| !(package.name == name && package.version == version));
    }
}

impl Repository for ArrayRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> ArrayRepository {
        ArrayRepository::with_packages(
            "remote",
            vec![
                Package::new("vendor/a", "1.0.0"),
                Package::new("vendor/a", "2.0.0"),
                Package::new("vendor/b", "1.0.0"),
            ],
        )
    }

    #[test]
    fn test_find_packages_by_name() {
        let repo = repo();
        assert_eq!(repo.find_packages("Vendor/A").len(), 2);
        assert!(repo.find_packages("vendor/c").is_empty());
        assert!(repo.has_package("vendor/b"));
    }

    #[test]
    fn test_find_package_accepts_pretty_version() {
        let repo = repo();
        let found = repo.find_package("vendor/a", "2.0").unwrap();
        assert_eq!(found.version, "2.0.0.0");
        assert!(repo.find_package("vendor/a", "3.0").is_none());
    }

    #[test]
    fn test_remove_package() {
        let mut repo = repo();
        repo.remove_package("vendor/a", "1.0.0.0");
        assert_eq!(repo.count(), 2);
        assert_eq!(repo.name(), "remote");
    }
}
