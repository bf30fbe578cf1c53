use std::collections::HashMap;

use pox_semver::{Stability, VersionParser};

use crate::lock::LockSnapshot;

/// One thing the caller wants from a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Install something satisfying the constraint (None means any version)
    Install { name: String, constraint: Option<String> },
    /// Same as Install, but an installed version is not kept by preference
    InstallOrUpgrade { name: String, constraint: Option<String> },
    /// Nothing with this name may be installed
    Remove { name: String },
    /// Exactly this version must stay installed (platform packages)
    Fix { name: String, version: String },
    /// Installed packages are not kept by preference
    UpdateAll,
}

/// A request specifies what needs to be resolved.
///
/// Built once, then consumed by the solver. Names are not checked against
/// the pool here; unknown names surface as unsatisfiable job rules.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Jobs in insertion order (order matters for rule ids)
    jobs: Vec<Job>,

    /// Least stable stability explicitly requested per package name
    stability_flags: HashMap<String, Stability>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one exact-version install job per locked package.
    pub fn from_lock(lock: &LockSnapshot) -> Self {
        let mut request = Self::new();
        for locked in lock.packages() {
            request.install(&locked.name, &format!("={}", locked.version));
        }
        request
    }

    fn normalize_constraint(constraint: &str) -> Option<String> {
        match constraint.trim() {
            "" | "*" => None,
            c => Some(c.to_string()),
        }
    }

    fn record_stability_flag(&mut self, name: &str, constraint: &str) {
        if let Some(stability) = VersionParser::stability_flag(constraint) {
            if stability != Stability::Stable {
                self.stability_flags.insert(name.to_string(), stability);
            }
        }
    }

    /// Add an install job
    pub fn install(&mut self, name: &str, constraint: &str) -> &mut Self {
        let name = name.to_lowercase();
        self.record_stability_flag(&name, constraint);
        self.jobs.push(Job::Install {
            name,
            constraint: Self::normalize_constraint(constraint),
        });
        self
    }

    /// Add an install job for a top-level requirement that is being updated
    pub fn install_or_upgrade(&mut self, name: &str, constraint: &str) -> &mut Self {
        let name = name.to_lowercase();
        self.record_stability_flag(&name, constraint);
        self.jobs.push(Job::InstallOrUpgrade {
            name,
            constraint: Self::normalize_constraint(constraint),
        });
        self
    }

    /// Add a remove job
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.jobs.push(Job::Remove {
            name: name.to_lowercase(),
        });
        self
    }

    /// Keep a package at exactly this (normalized or pretty) version
    pub fn fix(&mut self, name: &str, version: &str) -> &mut Self {
        let version = VersionParser::new()
            .normalize(version)
            .unwrap_or_else(|_| version.to_string());
        self.jobs.push(Job::Fix {
            name: name.to_lowercase(),
            version,
        });
        self
    }

    /// Allow every installed package to change
    pub fn update_all(&mut self) -> &mut Self {
        if !self.is_update_all() {
            self.jobs.push(Job::UpdateAll);
        }
        self
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_update_all(&self) -> bool {
        self.jobs.iter().any(|job| matches!(job, Job::UpdateAll))
    }

    /// Whether an installed package of this name may change
    pub fn is_updated(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.jobs.iter().any(|job| match job {
            Job::UpdateAll => true,
            Job::InstallOrUpgrade { name: updated, .. } => *updated == name,
            _ => false,
        })
    }

    /// Stability requested for a package with an `@flag` or an unstable constraint
    pub fn stability_flag(&self, name: &str) -> Option<Stability> {
        self.stability_flags.get(&name.to_lowercase()).copied()
    }

    pub fn stability_flags(&self) -> &HashMap<String, Stability> {
        &self.stability_flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::LockedPackage;

    #[test]
    fn test_request_new() {
        let request = Request::new();
        assert!(request.is_empty());
        assert!(!request.is_update_all());
    }

    #[test]
    fn test_request_install() {
        let mut request = Request::new();
        request.install("Vendor/Package", "^1.0").install("vendor/any", "*");

        assert_eq!(
            request.jobs(),
            &[
                Job::Install {
                    name: "vendor/package".to_string(),
                    constraint: Some("^1.0".to_string()),
                },
                Job::Install {
                    name: "vendor/any".to_string(),
                    constraint: None,
                },
            ]
        );
    }

    #[test]
    fn test_request_update_all() {
        let mut request = Request::new();
        request.install("a", "^1.0").update_all().update_all();

        assert_eq!(request.len(), 2);
        assert!(request.is_update_all());
        assert!(request.is_updated("anything"));
    }

    #[test]
    fn test_request_partial_update() {
        let mut request = Request::new();
        request.install_or_upgrade("vendor/a", "^1.0").install("vendor/b", "^1.0");

        assert!(request.is_updated("Vendor/A"));
        assert!(!request.is_updated("vendor/b"));
    }

    #[test]
    fn test_request_stability_flags() {
        let mut request = Request::new();
        request
            .install("vendor/dev", "^1.0@dev")
            .install("vendor/beta", "2.0.0-beta1")
            .install("vendor/stable", "^1.0");

        assert_eq!(request.stability_flag("vendor/dev"), Some(Stability::Dev));
        assert_eq!(request.stability_flag("vendor/beta"), Some(Stability::Beta));
        assert_eq!(request.stability_flag("vendor/stable"), None);
    }

    #[test]
    fn test_request_fix_and_remove() {
        let mut request = Request::new();
        request.fix("php", "8.3.0").remove("Vendor/Old");

        assert_eq!(
            request.jobs(),
            &[
                Job::Fix {
                    name: "php".to_string(),
                    version: "8.3.0.0".to_string(),
                },
                Job::Remove {
                    name: "vendor/old".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_request_from_lock() {
        let lock = LockSnapshot::new(vec![
            LockedPackage::new("vendor/a", "1.2.0"),
            LockedPackage::new("vendor/b", "dev-main").with_source_reference("abc123"),
        ]);
        let request = Request::from_lock(&lock);

        assert_eq!(
            request.jobs(),
            &[
                Job::Install {
                    name: "vendor/a".to_string(),
                    constraint: Some("=1.2.0".to_string()),
                },
                Job::Install {
                    name: "vendor/b".to_string(),
                    constraint: Some("=dev-main".to_string()),
                },
            ]
        );
        assert_eq!(request.stability_flag("vendor/b"), Some(Stability::Dev));
    }
}
