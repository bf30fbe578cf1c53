use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::decisions::Decisions;
use super::pool::{PackageId, Pool};
use crate::package::Package;
use crate::util::is_platform_package;

/// A single operation in a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Install a new package
    Install(Arc<Package>),
    /// Update a package from one version to another
    Update {
        from: Arc<Package>,
        to: Arc<Package>,
    },
    /// Remove a package
    Uninstall(Arc<Package>),
}

impl Operation {
    pub fn job_type(&self) -> &'static str {
        match self {
            Operation::Install(_) => "install",
            Operation::Update { .. } => "update",
            Operation::Uninstall(_) => "uninstall",
        }
    }

    /// The package this operation leaves behind, or removes
    pub fn package(&self) -> &Arc<Package> {
        match self {
            Operation::Install(package) | Operation::Uninstall(package) => package,
            Operation::Update { to, .. } => to,
        }
    }

    /// The package an update replaces
    pub fn initial_package(&self) -> Option<&Arc<Package>> {
        match self {
            Operation::Update { from, .. } => Some(from),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Install(package) => write!(
                f,
                "Installing {} ({})",
                package.pretty_name, package.pretty_version
            ),
            Operation::Update { from, to } => write!(
                f,
                "Updating {} ({}) to {} ({})",
                from.pretty_name, from.pretty_version, to.pretty_name, to.pretty_version
            ),
            Operation::Uninstall(package) => write!(
                f,
                "Uninstalling {} ({})",
                package.pretty_name, package.pretty_version
            ),
        }
    }
}

/// The ordered operations turning the installed set into the solved one.
///
/// Uninstalls come first, sorted by name. Installs and updates follow in
/// dependency order: whatever a package requires is installed or updated
/// before the package itself. Ties and require cycles fall back to pool id
/// order, so the result is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff the solver's decisions against the installed packages by name.
    ///
    /// Platform packages never produce operations.
    pub fn build(pool: &Pool, decisions: &Decisions, installed: &[Arc<Package>]) -> Self {
        let selected = selected_by_name(pool, decisions);

        let present: HashMap<&str, &Arc<Package>> = installed
            .iter()
            .filter(|package| !is_platform_package(&package.name))
            .map(|package| (package.name.as_str(), package))
            .collect();

        let mut uninstalls: Vec<&Arc<Package>> = present
            .iter()
            .filter(|(name, _)| !selected.contains_key(**name))
            .map(|(_, package)| *package)
            .collect();
        uninstalls.sort_by(|a, b| a.name.cmp(&b.name));

        let mut changes: Vec<(PackageId, Operation)> = Vec::new();
        for (name, &(id, ref package)) in &selected {
            match present.get(name.as_str()) {
                Some(current) if current.version == package.version => {}
                Some(current) => changes.push((
                    id,
                    Operation::Update {
                        from: Arc::clone(current),
                        to: Arc::clone(package),
                    },
                )),
                None => changes.push((id, Operation::Install(Arc::clone(package)))),
            }
        }

        let mut operations: Vec<Operation> = uninstalls
            .into_iter()
            .map(|package| Operation::Uninstall(Arc::clone(package)))
            .collect();
        operations.extend(topological_sort_operations(changes));

        log::debug!("Transaction has {} operations", operations.len());
        Self { operations }
    }

    /// Add updates for installed dev packages whose selected counterpart has
    /// the same version but a different source reference.
    ///
    /// Only meaningful when updating; packages already touched by another
    /// operation are left alone.
    pub fn append_reference_updates(
        &mut self,
        pool: &Pool,
        decisions: &Decisions,
        installed: &[Arc<Package>],
    ) {
        let selected = selected_by_name(pool, decisions);
        let mut candidates: Vec<&Arc<Package>> = installed
            .iter()
            .filter(|package| package.is_dev() && !is_platform_package(&package.name))
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));

        for current in candidates {
            if self.touches(&current.name) {
                continue;
            }
            let Some((_, target)) = selected.get(&current.name) else {
                continue;
            };
            if target.version == current.version
                && target.source_reference.is_some()
                && target.source_reference != current.source_reference
            {
                log::debug!(
                    "Source reference of {} changed to {}",
                    current.pretty_name,
                    target.source_reference.as_deref().unwrap_or_default()
                );
                self.operations.push(Operation::Update {
                    from: Arc::clone(current),
                    to: Arc::clone(target),
                });
            }
        }
    }

    fn touches(&self, name: &str) -> bool {
        self.operations.iter().any(|op| {
            op.package().name == name || op.initial_package().is_some_and(|p| p.name == name)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Get only new installs (not updates)
    pub fn installs(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Install(package) => Some(package),
            _ => None,
        })
    }

    /// Get only updates
    pub fn updates(&self) -> impl Iterator<Item = (&Arc<Package>, &Arc<Package>)> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Update { from, to } => Some((from, to)),
            _ => None,
        })
    }

    /// Get only removals (not updates)
    pub fn uninstalls(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Uninstall(package) => Some(package),
            _ => None,
        })
    }

    pub fn summary(&self) -> TransactionSummary {
        let mut summary = TransactionSummary::default();
        for op in &self.operations {
            match op {
                Operation::Install(_) => summary.installs += 1,
                Operation::Update { .. } => summary.updates += 1,
                Operation::Uninstall(_) => summary.uninstalls += 1,
            }
        }
        summary
    }
}

/// Summary of a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionSummary {
    pub installs: usize,
    pub updates: usize,
    pub uninstalls: usize,
}

impl TransactionSummary {
    pub fn is_empty(&self) -> bool {
        self.installs + self.updates + self.uninstalls == 0
    }
}

impl fmt::Display for TransactionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Nothing to install/update");
        }

        let plural = |count: usize, word: &str| {
            if count == 1 {
                format!("{} {}", count, word)
            } else {
                format!("{} {}s", count, word)
            }
        };
        write!(
            f,
            "Package operations: {}, {}, {}",
            plural(self.installs, "install"),
            plural(self.updates, "update"),
            plural(self.uninstalls, "removal")
        )
    }
}

/// Selected non-platform packages by name, in pool id order
fn selected_by_name(pool: &Pool, decisions: &Decisions) -> IndexMap<String, (PackageId, Arc<Package>)> {
    let mut selected = IndexMap::new();
    for id in decisions.installed_packages() {
        let Some(package) = pool.package(id) else {
            continue;
        };
        if is_platform_package(&package.name) {
            continue;
        }
        selected
            .entry(package.name.clone())
            .or_insert_with(|| (id, Arc::clone(package)));
    }
    selected
}

/// Kahn's algorithm over requires edges between the changed packages.
///
/// A requirement points at every changed package providing the required
/// name. The ready set is ordered by pool id; when only cycles remain the
/// lowest id is taken next regardless of its unmet requirements.
fn topological_sort_operations(changes: Vec<(PackageId, Operation)>) -> Vec<Operation> {
    let count = changes.len();
    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, (_, op)) in changes.iter().enumerate() {
        for name in op.package().get_names(true) {
            by_name.entry(name).or_default().push(idx);
        }
    }

    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (idx, (_, op)) in changes.iter().enumerate() {
        let mut deps: Vec<usize> = op
            .package()
            .require
            .keys()
            .filter(|name| !is_platform_package(name))
            .filter_map(|name| by_name.get(name))
            .flatten()
            .copied()
            .filter(|&dep| dep != idx)
            .collect();
        deps.sort_unstable();
        deps.dedup();
        for dep in deps {
            dependents[dep].push(idx);
            in_degree[idx] += 1;
        }
    }

    let mut ready: BTreeSet<(PackageId, usize)> = changes
        .iter()
        .enumerate()
        .filter(|(idx, _)| in_degree[*idx] == 0)
        .map(|(idx, (id, _))| (*id, idx))
        .collect();
    let mut remaining: BTreeSet<(PackageId, usize)> = changes
        .iter()
        .enumerate()
        .map(|(idx, (id, _))| (*id, idx))
        .collect();
    let mut order = Vec::with_capacity(count);

    while !remaining.is_empty() {
        let next = match ready.pop_first() {
            Some(next) => next,
            None => match remaining.first() {
                Some(&next) => {
                    log::debug!("Breaking require cycle at package id {}", next.0);
                    next
                }
                None => break,
            },
        };
        if !remaining.remove(&next) {
            continue;
        }
        let (_, idx) = next;
        order.push(idx);

        for &dependent in &dependents[idx] {
            in_degree[dependent] = in_degree[dependent].saturating_sub(1);
            let key = (changes[dependent].0, dependent);
            if in_degree[dependent] == 0 && remaining.contains(&key) {
                ready.insert(key);
            }
        }
    }

    let mut slots: Vec<Option<Operation>> = changes.into_iter().map(|(_, op)| Some(op)).collect();
    order
        .into_iter()
        .filter_map(|idx| slots.get_mut(idx).and_then(Option::take))
        .collect()
}
