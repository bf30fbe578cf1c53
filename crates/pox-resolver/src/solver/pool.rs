use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use pox_semver::{Constraint, VersionParser};

use super::rule::Literal;
use crate::error::{ResolverError, Result};
use crate::package::Package;
use crate::repository::Repository;

/// Package ids are the variables of the SAT problem; literals are signed ids.
pub type PackageId = i32;

/// Pool of all available packages for dependency resolution.
///
/// Packages get 1-based ids in repository registration order, then in
/// declaration order within a repository. A repository's priority is its
/// registration index; the installed repository, when present, is index 0.
///
/// The first `what_provides` call freezes the pool: ids and name indexes never
/// change afterwards, which is what makes the lookup memo safe.
#[derive(Debug, Default)]
pub struct Pool {
    /// All packages, id - 1
    packages: Vec<Arc<Package>>,

    /// Repository index for each package, id - 1
    package_repos: Vec<usize>,

    /// Registered repositories in priority order
    repositories: Vec<Arc<dyn Repository>>,

    has_installed: bool,

    /// Package ids indexed by own name (lowercase)
    packages_by_name: HashMap<String, Vec<PackageId>>,

    /// Package ids indexed by provided or replaced name
    providers: HashMap<String, Vec<PackageId>>,

    frozen: Cell<bool>,

    /// Memoized what_provides results ((name, constraint) -> ids)
    what_provides_cache: RefCell<HashMap<(String, Option<String>), Vec<PackageId>>>,

    /// Cached parsed constraints (constraint string -> parsed constraint)
    parsed_constraints: RefCell<HashMap<String, Option<Constraint>>>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the repository of installed packages. It must come first so
    /// that it gets priority 0.
    pub fn add_installed_repository(&mut self, repo: impl Repository + 'static) -> Result<()> {
        if !self.repositories.is_empty() {
            return Err(ResolverError::InstalledRepositoryNotFirst);
        }
        self.register(Arc::new(repo))?;
        self.has_installed = true;
        Ok(())
    }

    /// Appends a repository; its priority is its registration index.
    pub fn add_repository(&mut self, repo: impl Repository + 'static) -> Result<()> {
        self.register(Arc::new(repo))
    }

    fn register(&mut self, repo: Arc<dyn Repository>) -> Result<()> {
        let name = repo.name().to_string();
        if self.frozen.get() {
            return Err(ResolverError::PoolFrozen { name });
        }
        if self.repositories.iter().any(|existing| existing.name() == name) {
            return Err(ResolverError::DuplicateRepository { name });
        }

        let repo_index = self.repositories.len();
        for package in repo.packages() {
            let id = self.packages.len() as PackageId + 1;
            self.packages.push(Arc::clone(package));
            self.package_repos.push(repo_index);

            self.packages_by_name
                .entry(package.name.clone())
                .or_default()
                .push(id);

            for target in package.provide.keys().chain(package.replace.keys()) {
                if *target == package.name {
                    continue;
                }
                let ids = self.providers.entry(target.clone()).or_default();
                if ids.last() != Some(&id) {
                    ids.push(id);
                }
            }
        }

        log::debug!(
            "Registered repository {} with {} packages at priority {}",
            name,
            repo.count(),
            repo_index
        );
        self.repositories.push(repo);
        Ok(())
    }

    /// Every package that can satisfy `name` under `constraint`, by own name or
    /// through provide/replace, in ascending id order.
    ///
    /// A provided or replaced name matches when its declared constraint
    /// intersects the required one. The first call freezes the pool.
    pub fn what_provides(&self, name: &str, constraint: Option<&str>) -> Vec<PackageId> {
        self.frozen.set(true);

        let name = name.to_lowercase();
        let constraint = constraint.map(str::trim).filter(|c| !c.is_empty());
        let key = (name, constraint.map(str::to_string));
        if let Some(cached) = self.what_provides_cache.borrow().get(&key) {
            return cached.clone();
        }

        let (name, _) = &key;
        let mut result = Vec::new();

        if let Some(ids) = self.packages_by_name.get(name) {
            for &id in ids {
                if self.matches_version(id, constraint) {
                    result.push(id);
                }
            }
        }

        if let Some(ids) = self.providers.get(name) {
            for &id in ids {
                let Some(package) = self.package(id) else {
                    continue;
                };
                let provided = package
                    .provide
                    .get(name)
                    .into_iter()
                    .chain(package.replace.get(name));
                if provided
                    .into_iter()
                    .any(|provided| self.matches_provided_constraint(provided, constraint))
                {
                    result.push(id);
                }
            }
        }

        result.sort_unstable();
        result.dedup();

        self.what_provides_cache
            .borrow_mut()
            .insert(key, result.clone());
        result
    }

    fn parsed_constraint(&self, constraint: &str) -> Option<Constraint> {
        if let Some(cached) = self.parsed_constraints.borrow().get(constraint) {
            return cached.clone();
        }

        let parsed = match VersionParser::new().parse_constraints(constraint) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Ignoring unparseable constraint \"{}\": {}", constraint, e);
                None
            }
        };
        self.parsed_constraints
            .borrow_mut()
            .insert(constraint.to_string(), parsed.clone());
        parsed
    }

    /// Check if a package's own version satisfies a constraint
    fn matches_version(&self, id: PackageId, constraint: Option<&str>) -> bool {
        let Some(constraint) = constraint else {
            return true;
        };
        let Some(package) = self.package(id) else {
            return false;
        };
        match self.parsed_constraint(constraint) {
            Some(parsed) => parsed.matches_version(&package.version),
            None => false,
        }
    }

    /// Check if a provide/replace constraint intersects the required one.
    fn matches_provided_constraint(&self, provided: &str, required: Option<&str>) -> bool {
        let Some(required) = required else {
            return true;
        };
        let Some(required) = self.parsed_constraint(required) else {
            return false;
        };

        let provided = provided.trim();
        if provided.is_empty() || provided == "*" {
            return true;
        }

        match self.parsed_constraint(provided) {
            Some(provided) => required.matches(&provided),
            None => false,
        }
    }

    /// Direct lookup by id.
    pub fn package_by_id(&self, id: PackageId) -> Result<&Arc<Package>> {
        self.package(id)
            .ok_or(ResolverError::PackageNotFound { id })
    }

    pub fn package(&self, id: PackageId) -> Option<&Arc<Package>> {
        if id < 1 {
            return None;
        }
        self.packages.get(id as usize - 1)
    }

    /// Package referenced by a literal, regardless of its sign.
    pub fn literal_package(&self, literal: Literal) -> Option<&Arc<Package>> {
        self.package(literal.abs())
    }

    /// `+name-version` or `-name-version`, the literal form used in rule text.
    pub fn literal_to_string(&self, literal: Literal) -> String {
        let sign = if literal > 0 { '+' } else { '-' };
        match self.literal_package(literal) {
            Some(package) => format!("{}{}", sign, package.unique_name()),
            None => format!("{}#{}", sign, literal.abs()),
        }
    }

    /// Priority of a registered repository (its registration index).
    pub fn get_priority(&self, repo: &dyn Repository) -> Result<usize> {
        self.repositories
            .iter()
            .position(|registered| registered.name() == repo.name())
            .ok_or_else(|| ResolverError::UnknownRepository {
                name: repo.name().to_string(),
            })
    }

    /// Priority of the repository a package came from.
    pub fn priority_of(&self, id: PackageId) -> usize {
        if id < 1 {
            return usize::MAX;
        }
        self.package_repos
            .get(id as usize - 1)
            .copied()
            .unwrap_or(usize::MAX)
    }

    pub fn is_installed(&self, id: PackageId) -> bool {
        self.has_installed && self.priority_of(id) == 0
    }

    /// Ids of all packages from the installed repository.
    pub fn installed_packages(&self) -> Vec<PackageId> {
        if !self.has_installed {
            return Vec::new();
        }
        (1..=self.max_id())
            .filter(|&id| self.priority_of(id) == 0)
            .collect()
    }

    /// Ids of packages whose own name is `name` (no providers).
    pub fn packages_by_name(&self, name: &str) -> Vec<PackageId> {
        self.packages_by_name
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Highest assigned id, 0 for an empty pool.
    pub fn max_id(&self) -> PackageId {
        self.packages.len() as PackageId
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    pub fn repository_names(&self) -> impl Iterator<Item = &str> {
        self.repositories.iter().map(|repo| repo.name())
    }
}
