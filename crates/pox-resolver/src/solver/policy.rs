use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use pox_semver::{Comparator, Stability};

use super::pool::{PackageId, Pool};
use super::request::Request;
use crate::package::Package;

/// Policy for selecting between candidate packages.
///
/// When multiple packages can satisfy a rule, the policy determines which
/// one to try first. Candidates are ordered by:
/// 1. locked version, or installed package that is being kept
/// 2. repository priority (lower index first)
/// 3. stability (stable first), unless the package name carries a stability flag
/// 4. version (newest first, oldest first with `prefer_lowest`)
/// 5. package id
///
/// An installed package that may be updated ranks behind every repository in
/// step 2, otherwise nothing could ever change. Every step compares a key of
/// each package on its own, so the ordering is total.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Prefer lowest versions
    pub prefer_lowest: bool,
    /// Locked versions (package name -> normalized version)
    pub locked_versions: HashMap<String, String>,
    /// Names for which stability does not matter
    pub stability_flags: HashMap<String, Stability>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set preference for lowest versions
    pub fn prefer_lowest(mut self, prefer: bool) -> Self {
        self.prefer_lowest = prefer;
        self
    }

    /// Set locked versions for specific packages
    pub fn locked_versions(mut self, versions: HashMap<String, String>) -> Self {
        self.locked_versions = versions
            .into_iter()
            .map(|(name, version)| (name.to_lowercase(), version))
            .collect();
        self
    }

    /// Add a locked (normalized) version for a specific package
    pub fn with_locked_version(mut self, package: &str, version: &str) -> Self {
        self.locked_versions
            .insert(package.to_lowercase(), version.to_string());
        self
    }

    /// Copy of this policy that also honors a request's stability flags
    pub fn for_request(&self, request: &Request) -> Self {
        let mut policy = self.clone();
        for (name, stability) in request.stability_flags() {
            policy.stability_flags.insert(name.clone(), *stability);
        }
        policy
    }

    fn is_locked(&self, package: &Package) -> bool {
        self.locked_versions
            .get(&package.name)
            .is_some_and(|version| *version == package.version)
    }

    /// Returns the candidates sorted by preference (best first).
    ///
    /// `kept` holds installed packages that should stay as they are.
    pub fn select_preferred(
        &self,
        pool: &Pool,
        candidates: &[PackageId],
        kept: &HashSet<PackageId>,
    ) -> Vec<PackageId> {
        let mut result = candidates.to_vec();
        result.sort_unstable();
        result.dedup();
        result.sort_by(|&a, &b| self.compare_by_priority(pool, a, b, kept));
        result
    }

    fn compare_by_priority(
        &self,
        pool: &Pool,
        a: PackageId,
        b: PackageId,
        kept: &HashSet<PackageId>,
    ) -> Ordering {
        let (Some(pa), Some(pb)) = (pool.package(a), pool.package(b)) else {
            return a.cmp(&b);
        };

        let a_preferred = kept.contains(&a) || self.is_locked(pa);
        let b_preferred = kept.contains(&b) || self.is_locked(pb);
        if a_preferred != b_preferred {
            return b_preferred.cmp(&a_preferred);
        }

        let by_priority = self
            .repository_rank(pool, a, kept)
            .cmp(&self.repository_rank(pool, b, kept));
        if by_priority != Ordering::Equal {
            return by_priority;
        }

        let by_stability = self.stability_rank(pa).cmp(&self.stability_rank(pb));
        if by_stability != Ordering::Equal {
            return by_stability;
        }

        let by_version = if self.prefer_lowest {
            Comparator::order(&pa.version, &pb.version)
        } else {
            Comparator::order(&pb.version, &pa.version)
        };
        if by_version != Ordering::Equal {
            return by_version;
        }

        a.cmp(&b)
    }

    /// Repository priority; installed packages open for update rank last.
    fn repository_rank(&self, pool: &Pool, id: PackageId, kept: &HashSet<PackageId>) -> usize {
        if pool.is_installed(id) && !kept.contains(&id) {
            usize::MAX
        } else {
            pool.priority_of(id)
        }
    }

    fn stability_rank(&self, package: &Package) -> u8 {
        if self.stability_flags.contains_key(&package.name) {
            0
        } else {
            package.stability.priority()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::repository::ArrayRepository;

    fn pool_with(repos: Vec<(&str, Vec<Package>)>) -> Pool {
        let mut pool = Pool::new();
        for (name, packages) in repos {
            pool.add_repository(ArrayRepository::with_packages(name, packages))
                .unwrap();
        }
        pool
    }

    fn none() -> HashSet<PackageId> {
        HashSet::new()
    }

    #[test]
    fn test_prefers_newest_version() {
        let pool = pool_with(vec![(
            "remote",
            vec![
                Package::new("a", "1.0.0"),
                Package::new("a", "2.0.0"),
                Package::new("a", "1.5.0"),
            ],
        )]);
        let policy = Policy::new();
        assert_eq!(policy.select_preferred(&pool, &[1, 2, 3], &none()), vec![2, 3, 1]);
    }

    #[test]
    fn test_prefer_lowest() {
        let pool = pool_with(vec![(
            "remote",
            vec![Package::new("a", "1.0.0"), Package::new("a", "2.0.0")],
        )]);
        let policy = Policy::new().prefer_lowest(true);
        assert_eq!(policy.select_preferred(&pool, &[2, 1], &none()), vec![1, 2]);
    }

    #[test]
    fn test_prefers_stable_over_newer_unstable() {
        let pool = pool_with(vec![(
            "remote",
            vec![Package::new("a", "1.0.0"), Package::new("a", "2.0.0-beta1")],
        )]);
        let policy = Policy::new();
        assert_eq!(policy.select_preferred(&pool, &[1, 2], &none()), vec![1, 2]);

        let mut request = Request::new();
        request.install("a", "^2.0@beta");
        let flagged = policy.for_request(&request);
        assert_eq!(flagged.select_preferred(&pool, &[1, 2], &none()), vec![2, 1]);
    }

    #[test]
    fn test_repository_priority_beats_version() {
        let pool = pool_with(vec![
            ("first", vec![Package::new("a", "1.0.0")]),
            ("second", vec![Package::new("a", "2.0.0")]),
        ]);
        let policy = Policy::new();
        assert_eq!(policy.select_preferred(&pool, &[2, 1], &none()), vec![1, 2]);
    }

    #[test]
    fn test_locked_version_first() {
        let pool = pool_with(vec![(
            "remote",
            vec![Package::new("a", "1.0.0"), Package::new("a", "2.0.0")],
        )]);
        let policy = Policy::new().with_locked_version("A", "1.0.0.0");
        assert_eq!(policy.select_preferred(&pool, &[1, 2], &none()), vec![1, 2]);
    }

    #[test]
    fn test_kept_installed_first_and_updatable_installed_ranked_last() {
        let mut pool = Pool::new();
        pool.add_installed_repository(ArrayRepository::with_packages(
            "installed",
            vec![Package::new("a", "1.0.0")],
        ))
        .unwrap();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![Package::new("a", "1.0.0"), Package::new("a", "2.0.0")],
        ))
        .unwrap();
        let policy = Policy::new();

        let kept: HashSet<PackageId> = [1].into_iter().collect();
        assert_eq!(policy.select_preferred(&pool, &[1, 2, 3], &kept), vec![1, 3, 2]);
        assert_eq!(policy.select_preferred(&pool, &[1, 2, 3], &none()), vec![3, 2, 1]);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let pool = pool_with(vec![(
            "remote",
            vec![
                Package::new("a", "1.0.0"),
                Package::new("b", "1.0.0").with_replace("a", "1.0.0"),
            ],
        )]);
        let policy = Policy::new();
        let first = policy.select_preferred(&pool, &[2, 1, 2], &none());
        assert_eq!(first, vec![1, 2]);
        assert_eq!(policy.select_preferred(&pool, &[1, 2], &none()), first);
    }
}
