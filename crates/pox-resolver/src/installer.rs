//! Install and update orchestration on top of the solver.
//!
//! The [`Installer`] takes the root package, the current install state, the
//! platform, remote repositories and an optional lock snapshot, and decides
//! which request to solve. It never touches the filesystem: the outcome is
//! the ordered operation list plus the lock snapshot of the resolved set,
//! ready for a caller to execute and persist.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use pox_semver::{Constraint, VersionParser};
use serde::{Deserialize, Serialize};

use crate::error::ResolverError;
use crate::lock::LockSnapshot;
use crate::package::Package;
use crate::repository::{ArrayRepository, InstalledRepository, PlatformRepository, Repository};
use crate::solver::{Decisions, Operation, Policy, Pool, Request, Solver, SolverConfig, Transaction};
use crate::util::is_platform_package;

/// Installation settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallConfig {
    /// Re-resolve everything instead of installing from the lock snapshot
    pub update: bool,

    /// Skip packages the root only recommends
    pub no_install_recommends: bool,

    /// Also install packages the root suggests
    pub install_suggests: bool,

    /// Prefer the lowest matching versions
    pub prefer_lowest: bool,

    /// Safety caps handed to the solver
    pub solver: SolverConfig,
}

impl InstallConfig {
    /// Config for an update run
    pub fn update() -> Self {
        Self {
            update: true,
            ..Self::default()
        }
    }
}

/// Root links that become install jobs, in declaration order.
///
/// Requires always count, recommends unless disabled, suggests only when
/// enabled. Suggest values are reasons, so suggested packages accept any
/// version. The first declaration of a name wins.
pub fn collect_links(root: &Package, config: &InstallConfig) -> IndexMap<String, String> {
    let mut links = root.require.clone();

    if !config.no_install_recommends {
        for (name, constraint) in &root.recommend {
            links
                .entry(name.clone())
                .or_insert_with(|| constraint.clone());
        }
    }

    if config.install_suggests {
        for name in root.suggest.keys() {
            links.entry(name.clone()).or_insert_with(|| "*".to_string());
        }
    }

    links
}

/// Parses every link constraint up front so a malformed root definition is
/// reported as such instead of as an unsatisfiable request.
fn parse_links(links: &IndexMap<String, String>) -> Result<Vec<(String, Constraint)>> {
    let parser = VersionParser::new();
    links
        .iter()
        .map(|(name, constraint)| {
            let parsed = parser
                .parse_constraints(constraint)
                .map_err(ResolverError::from)
                .with_context(|| format!("Invalid version constraint {} for {}", constraint, name))?;
            Ok((name.clone(), parsed))
        })
        .collect()
}

const LOCK_OUT_OF_SYNC: &str = "Warning: Your lock file is out of sync with your composer.json, \
run \"composer update\" to update dependencies";

/// Result of an install or update run
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Operations in execution order
    pub operations: Vec<Operation>,

    /// Human readable progress lines (warnings, the summary, then one per operation)
    pub messages: Vec<String>,

    /// Resolved non-platform packages, sorted by name
    pub lock: LockSnapshot,
}

impl InstallOutcome {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Which request the installer builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Update,
    FromLock,
    Install,
}

pub struct Installer {
    root: Package,
    config: InstallConfig,
    installed: Vec<Arc<Package>>,
    platform: PlatformRepository,
    repositories: Vec<ArrayRepository>,
    lock: Option<LockSnapshot>,
    content_hash: Option<String>,
}

impl Installer {
    pub fn new(root: Package, config: InstallConfig) -> Self {
        Self {
            root,
            config,
            installed: Vec::new(),
            platform: PlatformRepository::new(),
            repositories: Vec::new(),
            lock: None,
            content_hash: None,
        }
    }

    /// Packages currently installed (without platform packages)
    pub fn with_installed(mut self, installed: Vec<Arc<Package>>) -> Self {
        self.installed = installed;
        self
    }

    pub fn with_platform(mut self, platform: PlatformRepository) -> Self {
        self.platform = platform;
        self
    }

    /// Adds a remote repository; earlier repositories take precedence.
    pub fn with_repository(mut self, repository: ArrayRepository) -> Self {
        self.repositories.push(repository);
        self
    }

    pub fn with_lock(mut self, lock: LockSnapshot) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Hash of the current root definition, compared against the lock's
    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    fn mode(&self) -> Mode {
        if self.config.update {
            Mode::Update
        } else if self.lock.as_ref().is_some_and(|lock| !lock.is_empty()) {
            Mode::FromLock
        } else {
            Mode::Install
        }
    }

    fn build_pool(&self) -> Result<Pool> {
        let mut pool = Pool::new();
        pool.add_installed_repository(InstalledRepository::new(
            self.installed.clone(),
            &self.platform,
        ))
        .context("Failed to register the installed repository")?;

        for repository in &self.repositories {
            pool.add_repository(repository.clone())
                .with_context(|| format!("Failed to register repository {}", repository.name()))?;
        }

        log::debug!(
            "Pool has {} packages from {} repositories",
            pool.len(),
            self.repositories.len() + 1
        );
        Ok(pool)
    }

    fn build_request(&self, mode: Mode, links: &IndexMap<String, String>) -> Request {
        let mut request = match (mode, &self.lock) {
            (Mode::FromLock, Some(lock)) => {
                let mut request = Request::from_lock(lock);
                // the lock does not record platform packages
                for (name, constraint) in links.iter().filter(|(name, _)| is_platform_package(name)) {
                    request.install(name, constraint);
                }
                request
            }
            _ => {
                let mut request = Request::new();
                if mode == Mode::Update {
                    request.update_all();
                }
                for (name, constraint) in links {
                    request.install(name, constraint);
                }
                request
            }
        };

        for package in self.platform.packages() {
            request.fix(&package.name, &package.version);
        }
        request
    }

    /// A lock is stale when its hash differs from the root's, or when a root
    /// requirement is missing from it or no longer matches the locked version.
    fn lock_is_stale(&self, lock: &LockSnapshot, constraints: &[(String, Constraint)]) -> bool {
        if !lock.is_fresh(self.content_hash.as_deref()) {
            log::debug!("Lock content hash does not match the root definition");
            return true;
        }

        constraints
            .iter()
            .filter(|(name, _)| self.root.require.contains_key(name) && !is_platform_package(name))
            .any(|(name, constraint)| match lock.find(name) {
                Some(locked) => {
                    let stale = !constraint.matches_version(&locked.normalized_version());
                    if stale {
                        log::debug!("Locked {} {} no longer matches {}", name, locked.version, constraint);
                    }
                    stale
                }
                None => {
                    log::debug!("Required package {} is not locked", name);
                    true
                }
            })
    }

    fn build_policy(&self, mode: Mode) -> Policy {
        let policy = Policy::new().prefer_lowest(self.config.prefer_lowest);
        match (mode, &self.lock) {
            (Mode::FromLock, Some(lock)) => policy.locked_versions(lock.locked_versions()),
            _ => policy,
        }
    }

    /// Resolves and returns the operations that bring the install state to
    /// the resolved set.
    pub fn run(&self) -> Result<InstallOutcome> {
        let mode = self.mode();
        match mode {
            Mode::Update => log::info!("Updating dependencies"),
            Mode::FromLock => log::info!("Installing from lock file"),
            Mode::Install => log::info!("Installing dependencies"),
        }

        let links = collect_links(&self.root, &self.config);
        let constraints = parse_links(&links)?;

        let mut messages = Vec::new();
        if let (Mode::FromLock, Some(lock)) = (mode, &self.lock) {
            if self.lock_is_stale(lock, &constraints) {
                log::warn!("{}", LOCK_OUT_OF_SYNC);
                messages.push(LOCK_OUT_OF_SYNC.to_string());
            }
        }

        let pool = self.build_pool()?;
        let request = self.build_request(mode, &links);
        let policy = self.build_policy(mode);

        let decisions = Solver::new(&pool, &policy)
            .with_config(self.config.solver)
            .solve(&request)
            .context("Dependency resolution failed")?;

        let mut transaction = Transaction::build(&pool, &decisions, &self.installed);
        if mode == Mode::Update {
            transaction.append_reference_updates(&pool, &decisions, &self.installed);
        }

        let locked_refs = match (mode, &self.lock) {
            (Mode::FromLock, Some(lock)) => locked_references(lock),
            _ => HashMap::new(),
        };
        restore_locked_references(&mut transaction, &locked_refs);

        let lock = resolved_lock(&pool, &decisions, &locked_refs);
        for message in describe(&transaction) {
            log::info!("{}", message);
            messages.push(message);
        }

        Ok(InstallOutcome {
            operations: transaction.operations,
            messages,
            lock,
        })
    }
}

/// Lowercase name -> source reference, for locked packages that have one
fn locked_references(lock: &LockSnapshot) -> HashMap<String, String> {
    lock.packages()
        .filter_map(|locked| {
            locked
                .source_reference()
                .map(|reference| (locked.name.to_lowercase(), reference.to_string()))
        })
        .collect()
}

/// Dev packages keep the checkout recorded in the lock instead of whatever
/// reference the repository currently advertises.
fn with_locked_reference(
    package: &Arc<Package>,
    locked_refs: &HashMap<String, String>,
) -> Option<Arc<Package>> {
    if !package.is_dev() {
        return None;
    }
    let reference = locked_refs.get(&package.name)?;
    if package.source_reference.as_deref() == Some(reference.as_str()) {
        return None;
    }
    log::debug!(
        "Restoring locked source reference {} for {}",
        reference,
        package.pretty_name
    );
    let mut restored = Package::clone(package);
    restored.source_reference = Some(reference.clone());
    Some(Arc::new(restored))
}

fn restore_locked_references(
    transaction: &mut Transaction,
    locked_refs: &HashMap<String, String>,
) {
    if locked_refs.is_empty() {
        return;
    }
    for operation in &mut transaction.operations {
        match operation {
            Operation::Install(package) | Operation::Update { to: package, .. } => {
                if let Some(restored) = with_locked_reference(package, locked_refs) {
                    *package = restored;
                }
            }
            Operation::Uninstall(_) => {}
        }
    }
}

fn resolved_lock(
    pool: &Pool,
    decisions: &Decisions,
    locked_refs: &HashMap<String, String>,
) -> LockSnapshot {
    let mut packages: Vec<Arc<Package>> = decisions
        .installed_packages()
        .filter_map(|id| pool.package(id))
        .filter(|package| !is_platform_package(&package.name))
        .map(|package| {
            with_locked_reference(package, locked_refs).unwrap_or_else(|| Arc::clone(package))
        })
        .collect();
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    packages.dedup_by(|a, b| a.name == b.name);
    LockSnapshot::from_packages(&packages)
}

fn describe(transaction: &Transaction) -> Vec<String> {
    let mut messages = vec![transaction.summary().to_string()];
    messages.extend(transaction.operations.iter().map(|op| format!("  - {}", op)));
    messages
}
