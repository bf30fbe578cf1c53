use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use indexmap::IndexMap;

use crate::package::LinkType;

use super::pool::{PackageId, Pool};
use super::request::{Job, Request};
use super::rule::{Rule, RuleReason, RuleType};
use super::rule_set::RuleSet;

/// Generates SAT rules from a request and the packages reachable from it.
///
/// This converts the dependency relationships into SAT clauses:
/// - Jobs: one of the candidates must be installed, or none of the removed ones
/// - Package requirements: if A is installed, then B|C|D must be installed
/// - Conflicts: A and B cannot both be installed
/// - Same name: only one package can be installed under a name, whether
///   it owns the name or replaces it
/// - Features: installed packages that are not being updated are preferred
pub struct RuleGenerator<'a> {
    pool: &'a Pool,
    rules: RuleSet,
    /// Packages we've already processed
    added_packages: HashSet<PackageId>,
    /// Processed packages in the order they were reached
    added_order: Vec<PackageId>,
    /// Processed packages grouped by own and replaced names
    added_packages_by_name: IndexMap<String, Vec<PackageId>>,
    /// Packages whose requirements still need rules
    queue: VecDeque<PackageId>,
}

impl<'a> RuleGenerator<'a> {
    pub fn new(pool: &'a Pool) -> Self {
        Self {
            pool,
            rules: RuleSet::new(),
            added_packages: HashSet::new(),
            added_order: Vec::new(),
            added_packages_by_name: IndexMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Generate all rules for a request
    pub fn generate(mut self, request: &Request) -> RuleSet {
        let start = Instant::now();

        self.add_job_rules(request);
        log::debug!("After job rules: {} rules, {} packages", self.rules.len(), self.added_packages.len());

        for id in self.pool.installed_packages() {
            self.add_package(id);
        }

        self.add_requirement_rules();
        log::debug!("After requirement rules: {} rules, {} packages", self.rules.len(), self.added_packages.len());

        self.add_conflict_rules();
        log::debug!("After conflict rules: {} rules", self.rules.len());

        self.add_same_name_rules();
        log::debug!("After same-name rules: {} rules", self.rules.len());

        self.add_feature_rules(request);

        log::info!(
            "Rule generation stats: {} packages processed, {} unique names in {:?}",
            self.added_packages.len(),
            self.added_packages_by_name.len(),
            start.elapsed()
        );
        log::debug!("Rules: {}", self.rules.stats());

        self.rules
    }

    fn add_package(&mut self, id: PackageId) {
        if !self.added_packages.insert(id) {
            return;
        }
        self.added_order.push(id);
        self.queue.push_back(id);

        if let Some(package) = self.pool.package(id) {
            for name in package.get_names(false) {
                self.added_packages_by_name.entry(name).or_default().push(id);
            }
        }
    }

    fn add_job_rules(&mut self, request: &Request) {
        for job in request.jobs() {
            match job {
                Job::Install { name, constraint } | Job::InstallOrUpgrade { name, constraint } => {
                    let candidates = self.pool.what_provides(name, constraint.as_deref());
                    if candidates.is_empty() {
                        log::warn!(
                            "No package found to satisfy root requirement {} {}",
                            name,
                            constraint.as_deref().unwrap_or("*")
                        );
                    }
                    for &id in &candidates {
                        self.add_package(id);
                    }

                    let rule = if matches!(job, Job::InstallOrUpgrade { .. }) {
                        Rule::update_job(candidates, name, constraint.as_deref())
                    } else {
                        Rule::install_job(candidates, name, constraint.as_deref())
                    };
                    self.rules.add(rule);
                }
                Job::Remove { name } => {
                    for id in self.pool.packages_by_name(name) {
                        self.rules.add(Rule::remove_job(id, name));
                    }
                }
                Job::Fix { name, version } => {
                    let fixed = self.pool.packages_by_name(name).into_iter().find(|&id| {
                        self.pool
                            .package(id)
                            .is_some_and(|package| package.version == *version)
                    });
                    match fixed {
                        Some(id) => {
                            self.rules.add(Rule::fix_job(id, name, version));
                            self.add_package(id);
                        }
                        None => {
                            log::warn!("Fixed package {} {} is not in the pool", name, version);
                            self.rules.add(Rule::new(
                                Vec::new(),
                                RuleType::Job,
                                RuleReason::JobFix {
                                    name: name.clone(),
                                    version: version.clone(),
                                },
                            ));
                        }
                    }
                }
                Job::UpdateAll => {}
            }
        }
    }

    /// Walk every reachable package breadth first and add its requirement rules.
    fn add_requirement_rules(&mut self) {
        while let Some(id) = self.queue.pop_front() {
            let Some(package) = self.pool.package(id) else {
                continue;
            };

            for link in package.links(LinkType::Require) {
                let providers = self.pool.what_provides(&link.target, Some(&link.constraint));
                if providers.is_empty() {
                    log::warn!("{} cannot be satisfied by any package", link);
                }
                for &provider in &providers {
                    self.add_package(provider);
                }
                self.rules
                    .add(Rule::requires(id, providers, &link.target, &link.constraint));
            }
        }
    }

    /// Conflicts only matter between packages that can be installed at all.
    ///
    /// A conflict applies to every package satisfying it, so conflicting with
    /// a virtual name excludes its providers too.
    fn add_conflict_rules(&mut self) {
        for &id in &self.added_order {
            let Some(package) = self.pool.package(id) else {
                continue;
            };

            for (target, constraint) in &package.conflict {
                for other in self.pool.what_provides(target, Some(constraint)) {
                    if other == id || !self.added_packages.contains(&other) {
                        continue;
                    }
                    self.rules.add(Rule::conflict(id, other, target, constraint));
                }
            }
        }
    }

    /// At most one package per name, counting replacers as owners of the
    /// names they replace.
    fn add_same_name_rules(&mut self) {
        for (name, ids) in &self.added_packages_by_name {
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    let owns_a = self.pool.package(a).is_some_and(|p| p.name == *name);
                    let owns_b = self.pool.package(b).is_some_and(|p| p.name == *name);
                    let rule = match (owns_a, owns_b) {
                        (true, true) => Rule::same_name(a, b, name),
                        (false, false) => Rule::choice(a, b, name),
                        _ => Rule::replaces(a, b, name),
                    };
                    self.rules.add(rule);
                }
            }
        }
    }

    fn add_feature_rules(&mut self, request: &Request) {
        for id in self.pool.installed_packages() {
            let keep = self
                .pool
                .package(id)
                .is_some_and(|package| !request.is_updated(&package.name));
            if keep {
                self.rules.add(Rule::keep_installed(id));
            }
        }
    }
}
