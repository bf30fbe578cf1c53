use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::decisions::Decisions;
use super::policy::Policy;
use super::pool::{PackageId, Pool};
use super::problem::{Explanation, Problem};
use super::request::Request;
use super::rule::{Literal, Rule, RuleId, RuleType};
use super::rule_generator::RuleGenerator;
use super::rule_set::RuleSet;
use super::watch_graph::WatchGraph;
use crate::error::{ResolverError, Result};

/// Limits and preferences of a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SolverConfig {
    /// Abort once this many rules have been learned
    pub max_learned_rules: usize,
    /// Abort after this many decisions
    pub max_iterations: usize,
    /// Try the oldest matching versions first
    pub prefer_lowest: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_learned_rules: 10_000,
            max_iterations: 100_000,
            prefer_lowest: false,
        }
    }
}

/// The SAT solver for dependency resolution.
///
/// Implements conflict-driven clause learning over the rules generated for a
/// request: unit propagation through two watched literals, policy-driven
/// decisions and first-UIP learning with non-chronological backjumping.
pub struct Solver<'a> {
    pool: &'a Pool,
    policy: &'a Policy,
    config: SolverConfig,
}

/// Search state owned by one call to [`Solver::solve`]
struct SolverState {
    rules: RuleSet,
    watch_graph: WatchGraph,
    decisions: Decisions,
    /// Trail position up to which decisions have been propagated
    propagate_index: usize,
    /// Installed packages that should stay installed
    kept: HashSet<PackageId>,
    policy: Policy,
    /// Rules each learned rule was derived from
    learned_why: HashMap<RuleId, Vec<RuleId>>,
    learned_count: usize,
}

impl SolverState {
    fn new(rules: RuleSet, max_id: PackageId, policy: Policy) -> Self {
        let watch_graph = WatchGraph::from_rules(rules.iter());
        let kept = rules
            .iter_for(RuleType::Feature)
            .flat_map(|rule| rule.literals().iter().copied())
            .filter(|&literal| literal > 0)
            .collect();

        Self {
            rules,
            watch_graph,
            decisions: Decisions::with_capacity(max_id.max(0) as usize),
            propagate_index: 0,
            kept,
            policy,
            learned_why: HashMap::new(),
            learned_count: 0,
        }
    }

    /// Propagate every decision that has not been propagated yet.
    ///
    /// Returns the id of a rule that became false.
    fn propagate(&mut self) -> Option<RuleId> {
        while self.propagate_index < self.decisions.len() {
            let (literal, _) = self.decisions.trail()[self.propagate_index];
            self.propagate_index += 1;

            if let Some(conflict) =
                self.watch_graph
                    .propagate_literal(literal, &self.rules, &mut self.decisions)
            {
                return Some(conflict);
            }
        }
        None
    }
}

impl<'a> Solver<'a> {
    pub fn new(pool: &'a Pool, policy: &'a Policy) -> Self {
        Self {
            pool,
            policy,
            config: SolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the dependency resolution problem.
    ///
    /// Returns the final assignment; pass it to
    /// [`Transaction::build`](super::Transaction::build) to get operations.
    /// Fails with [`ResolverError::Unsatisfiable`] and an explanation when
    /// no assignment satisfies every rule.
    pub fn solve(&self, request: &Request) -> Result<Decisions> {
        log::debug!("Generating rules");
        let start = Instant::now();
        let rules = RuleGenerator::new(self.pool).generate(request);
        log::info!("Generated {} rules in {:?}", rules.len(), start.elapsed());

        let mut policy = self.policy.for_request(request);
        if self.config.prefer_lowest {
            policy.prefer_lowest = true;
        }

        let mut state = SolverState::new(rules, self.pool.max_id(), policy);

        log::debug!("Resolving dependencies through SAT");
        let sat_start = Instant::now();
        match self.run_sat(&mut state) {
            Ok(()) => {
                log::info!(
                    "Dependency resolution completed in {:.3} seconds",
                    sat_start.elapsed().as_secs_f64()
                );
                log::info!(
                    "Analyzed {} packages and {} rules ({} learned) to resolve dependencies",
                    self.pool.len(),
                    state.rules.len(),
                    state.learned_count
                );
                Ok(state.decisions)
            }
            Err(err) => {
                log::debug!("SAT solving failed in {:?}", sat_start.elapsed());
                Err(err)
            }
        }
    }

    /// Main loop: propagate, decide, and learn from conflicts until every
    /// rule is satisfied or a conflict remains at level 0.
    fn run_sat(&self, state: &mut SolverState) -> Result<()> {
        self.check_empty_rules(state)?;
        self.process_assertions(state)?;

        if let Some(conflict) = state.propagate() {
            log::debug!("Conflict at level 0: rule {} is unsolvable", conflict);
            return Err(self.unsatisfiable(state, conflict));
        }

        let mut iterations = 0;
        loop {
            iterations += 1;
            if iterations > self.config.max_iterations {
                return Err(ResolverError::InternalSolverInvariantViolation(format!(
                    "no solution found within {} iterations",
                    self.config.max_iterations
                )));
            }

            let literal = match self.select_next(state) {
                Some(candidates) => {
                    let preferred =
                        state
                            .policy
                            .select_preferred(self.pool, &candidates, &state.kept);
                    match preferred.first() {
                        Some(&id) => id,
                        None => {
                            return Err(ResolverError::InternalSolverInvariantViolation(
                                "policy returned no candidate".to_string(),
                            ))
                        }
                    }
                }
                None => match self.next_unreferenced(state) {
                    Some(id) => -id,
                    None => break,
                },
            };

            state.decisions.increment_level();
            log::debug!(
                "Level {}: deciding {}",
                state.decisions.level(),
                self.pool.literal_to_string(literal)
            );
            state.decisions.decide(literal, None);

            while let Some(conflict) = state.propagate() {
                if state.decisions.level() == 0 {
                    log::debug!("Conflict at level 0: rule {} is unsolvable", conflict);
                    return Err(self.unsatisfiable(state, conflict));
                }
                self.analyze_and_backjump(state, conflict)?;
            }
        }

        Ok(())
    }

    /// Rules without literals can never be satisfied.
    fn check_empty_rules(&self, state: &SolverState) -> Result<()> {
        let empty: Vec<RuleId> = state
            .rules
            .iter_without(RuleType::Feature)
            .filter(|rule| rule.is_empty())
            .map(Rule::id)
            .collect();

        if empty.is_empty() {
            return Ok(());
        }
        log::debug!("{} rules have no literals", empty.len());
        let problem = Problem::from_rules(self.pool, &state.rules, &empty);
        Err(ResolverError::Unsatisfiable(Explanation::new(vec![problem])))
    }

    /// Decide every single-literal rule at level 0.
    fn process_assertions(&self, state: &mut SolverState) -> Result<()> {
        let assertions: Vec<(RuleId, Literal)> = state
            .rules
            .iter_without(RuleType::Feature)
            .filter(|rule| rule.is_assertion())
            .map(|rule| (rule.id(), rule.literals()[0]))
            .collect();

        for (rule_id, literal) in assertions {
            if state.decisions.conflict(literal) {
                let mut why = vec![rule_id];
                why.extend(state.decisions.decision_rule(literal));
                let problem = Problem::from_rules(self.pool, &state.rules, &why);
                return Err(ResolverError::Unsatisfiable(Explanation::new(vec![problem])));
            }
            state.decisions.decide(literal, Some(rule_id));
        }

        Ok(())
    }

    /// Find the first rule (in id order, so jobs come first) that is not
    /// satisfied yet and can only be satisfied by selecting one of its
    /// undecided positive literals.
    fn select_next(&self, state: &SolverState) -> Option<Vec<PackageId>> {
        let decisions = &state.decisions;
        state
            .rules
            .iter_without(RuleType::Feature)
            .filter(|rule| !rule.literals().iter().any(|&l| decisions.satisfied(l)))
            .filter(|rule| {
                rule.literals()
                    .iter()
                    .filter(|&&l| l < 0)
                    .all(|&l| decisions.conflict(l))
            })
            .map(|rule| {
                rule.literals()
                    .iter()
                    .copied()
                    .filter(|&l| l > 0 && decisions.undecided(l))
                    .collect::<Vec<_>>()
            })
            .find(|candidates| !candidates.is_empty())
    }

    /// Lowest undecided package referenced by any rule; it gets deselected.
    fn next_unreferenced(&self, state: &SolverState) -> Option<PackageId> {
        state
            .rules
            .iter_without(RuleType::Feature)
            .flat_map(|rule| rule.literals().iter().map(|l| l.abs()))
            .filter(|&id| state.decisions.undecided(id))
            .min()
    }

    /// First-UIP conflict analysis followed by a backjump.
    ///
    /// The learned rule lists the negated UIP first and the literal with the
    /// highest remaining level second, so its watches are correct right
    /// after backjumping and the UIP becomes unit.
    fn analyze_and_backjump(&self, state: &mut SolverState, conflict: RuleId) -> Result<()> {
        let (learned, backjump_level, why) = self.analyze(state, conflict)?;
        log::debug!(
            "Learned rule at level {}, backjumping to level {}",
            state.decisions.level(),
            backjump_level
        );

        state.decisions.revert_to_level(backjump_level);
        state.propagate_index = state.decisions.len();

        state.learned_count += 1;
        if state.learned_count > self.config.max_learned_rules {
            return Err(ResolverError::InternalSolverInvariantViolation(format!(
                "learned rule limit of {} exceeded",
                self.config.max_learned_rules
            )));
        }

        let uip = learned[0];
        let before = state.rules.len();
        let rule_id = state.rules.add(Rule::learned(learned));
        if state.rules.len() > before {
            let rule = state.rules.rule_by_id(rule_id)?;
            state.watch_graph.add_rule(rule);
            state.learned_why.insert(rule_id, why);
        }

        if !state.decisions.decide(uip, Some(rule_id)) {
            return Err(ResolverError::InternalSolverInvariantViolation(format!(
                "learned literal {} is already false after backjumping",
                self.pool.literal_to_string(uip)
            )));
        }
        Ok(())
    }

    fn analyze(
        &self,
        state: &SolverState,
        conflict: RuleId,
    ) -> Result<(Vec<Literal>, u32, Vec<RuleId>)> {
        let decisions = &state.decisions;
        let level = decisions.level();
        let trail = decisions.trail();

        let mut seen: HashSet<PackageId> = HashSet::new();
        let mut others: Vec<(u32, Literal)> = Vec::new();
        let mut why = vec![conflict];
        let mut pending = 0usize;
        let mut trail_index = trail.len();
        let mut rule_id = conflict;

        let uip = loop {
            let rule = state.rules.rule_by_id(rule_id)?;
            for &literal in rule.literals() {
                // the literal this rule implied
                if decisions.satisfied(literal) {
                    continue;
                }
                if !seen.insert(literal.abs()) {
                    continue;
                }
                let literal_level = decisions.decision_level(literal).ok_or_else(|| {
                    ResolverError::InternalSolverInvariantViolation(format!(
                        "undecided literal {} in conflict analysis",
                        self.pool.literal_to_string(literal)
                    ))
                })?;
                if literal_level == level {
                    pending += 1;
                } else if literal_level > 0 {
                    others.push((literal_level, literal));
                } else if let Some(reason) = decisions.decision_rule(literal) {
                    why.push(reason);
                }
            }

            let (trail_literal, reason) = loop {
                if trail_index == 0 || pending == 0 {
                    return Err(ResolverError::InternalSolverInvariantViolation(
                        "decision trail exhausted during conflict analysis".to_string(),
                    ));
                }
                trail_index -= 1;
                let (literal, reason) = trail[trail_index];
                if seen.contains(&literal.abs()) {
                    break (literal, reason);
                }
            };

            pending -= 1;
            if pending == 0 {
                break -trail_literal;
            }

            rule_id = reason.ok_or_else(|| {
                ResolverError::InternalSolverInvariantViolation(format!(
                    "free decision {} reached before the implication point",
                    self.pool.literal_to_string(trail_literal)
                ))
            })?;
            why.push(rule_id);
        };

        others.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.abs().cmp(&b.1.abs())));
        let backjump_level = others.first().map_or(0, |&(level, _)| level);

        let mut learned = Vec::with_capacity(others.len() + 1);
        learned.push(uip);
        learned.extend(others.into_iter().map(|(_, literal)| literal));

        Ok((learned, backjump_level, why))
    }

    /// Build the explanation for a conflict at level 0 by collecting the
    /// rules that implied every literal involved, expanding learned rules.
    fn unsatisfiable(&self, state: &SolverState, conflict: RuleId) -> ResolverError {
        let mut seen: HashSet<RuleId> = HashSet::new();
        let mut queue: VecDeque<RuleId> = VecDeque::from([conflict]);
        let mut involved = Vec::new();

        while let Some(rule_id) = queue.pop_front() {
            if !seen.insert(rule_id) {
                continue;
            }
            let Some(rule) = state.rules.get(rule_id) else {
                continue;
            };
            involved.push(rule_id);

            if let Some(sources) = state.learned_why.get(&rule_id) {
                queue.extend(sources.iter().copied());
            }
            for &literal in rule.literals() {
                if let Some(reason) = state.decisions.decision_rule(literal) {
                    queue.push_back(reason);
                }
            }
        }

        log::debug!("{} rules involved in the conflict", involved.len());
        let problem = Problem::from_rules(self.pool, &state.rules, &involved);
        ResolverError::Unsatisfiable(Explanation::new(vec![problem]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::repository::ArrayRepository;

    fn create_simple_pool() -> Pool {
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![
                Package::new("vendor/a", "1.0.0").with_require("vendor/b", "^1.0"),
                Package::new("vendor/b", "1.0.0"),
            ],
        ))
        .unwrap();
        pool
    }

    fn installed_names(pool: &Pool, decisions: &Decisions) -> Vec<String> {
        decisions
            .installed_packages()
            .map(|id| pool.package(id).unwrap().unique_name())
            .collect()
    }

    #[test]
    fn test_solver_simple() {
        let pool = create_simple_pool();
        let policy = Policy::new();
        let mut request = Request::new();
        request.install("vendor/a", "^1.0");

        let decisions = Solver::new(&pool, &policy).solve(&request).unwrap();
        assert_eq!(
            installed_names(&pool, &decisions),
            vec!["vendor/a-1.0.0.0", "vendor/b-1.0.0.0"]
        );
    }

    #[test]
    fn test_solver_no_solution() {
        let pool = create_simple_pool();
        let policy = Policy::new();
        let mut request = Request::new();
        request.install("vendor/nonexistent", "^1.0");

        let err = Solver::new(&pool, &policy).solve(&request).unwrap_err();
        assert!(err.is_unsatisfiable());
        let explanation = err.explanation().unwrap();
        assert_eq!(explanation.unresolvable_requirements().len(), 1);
    }

    #[test]
    fn test_solver_multiple_versions() {
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![
                Package::new("vendor/a", "1.0.0"),
                Package::new("vendor/a", "1.1.0"),
                Package::new("vendor/a", "2.0.0"),
            ],
        ))
        .unwrap();
        let policy = Policy::new();
        let mut request = Request::new();
        request.install("vendor/a", "^1.0");

        let decisions = Solver::new(&pool, &policy).solve(&request).unwrap();
        assert_eq!(installed_names(&pool, &decisions), vec!["vendor/a-1.1.0.0"]);
    }

    #[test]
    fn test_solver_prefer_lowest() {
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![
                Package::new("vendor/a", "1.0.0"),
                Package::new("vendor/a", "1.1.0"),
            ],
        ))
        .unwrap();
        let policy = Policy::new();
        let mut request = Request::new();
        request.install("vendor/a", "^1.0");

        let config = SolverConfig {
            prefer_lowest: true,
            ..SolverConfig::default()
        };
        let decisions = Solver::new(&pool, &policy)
            .with_config(config)
            .solve(&request)
            .unwrap();
        assert_eq!(installed_names(&pool, &decisions), vec!["vendor/a-1.0.0.0"]);
    }

    #[test]
    fn test_solver_learns_from_conflict() {
        // the newest a needs c 2.x, but b only works with c 1.x
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![
                Package::new("a", "1.0.0").with_require("c", "^1.0"),
                Package::new("a", "2.0.0").with_require("c", "^2.0"),
                Package::new("b", "1.0.0").with_require("c", "^1.0"),
                Package::new("b", "1.1.0").with_require("c", "^1.0"),
                Package::new("c", "1.0.0"),
                Package::new("c", "2.0.0"),
            ],
        ))
        .unwrap();
        let policy = Policy::new();
        let mut request = Request::new();
        request.install("a", "*").install("b", "*");

        let decisions = Solver::new(&pool, &policy).solve(&request).unwrap();
        assert_eq!(
            installed_names(&pool, &decisions),
            vec!["a-1.0.0.0", "b-1.1.0.0", "c-1.0.0.0"]
        );
    }

    #[test]
    fn test_solver_learned_rule_cap() {
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![
                Package::new("a", "1.0.0").with_require("c", "^1.0"),
                Package::new("a", "2.0.0").with_require("c", "^2.0"),
                Package::new("b", "1.0.0").with_require("c", "^1.0"),
                Package::new("b", "1.1.0").with_require("c", "^1.0"),
                Package::new("c", "1.0.0"),
                Package::new("c", "2.0.0"),
            ],
        ))
        .unwrap();
        let policy = Policy::new();
        let mut request = Request::new();
        request.install("a", "*").install("b", "*");

        let config = SolverConfig {
            max_learned_rules: 0,
            ..SolverConfig::default()
        };
        let err = Solver::new(&pool, &policy)
            .with_config(config)
            .solve(&request)
            .unwrap_err();
        assert!(matches!(err, ResolverError::InternalSolverInvariantViolation(_)));
    }

    #[test]
    fn test_solver_iteration_cap() {
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![Package::new("a", "1.0.0"), Package::new("a", "2.0.0")],
        ))
        .unwrap();
        let policy = Policy::new();
        let mut request = Request::new();
        request.install("a", "*");

        let config = SolverConfig {
            max_iterations: 0,
            ..SolverConfig::default()
        };
        let err = Solver::new(&pool, &policy)
            .with_config(config)
            .solve(&request)
            .unwrap_err();
        match err {
            ResolverError::InternalSolverInvariantViolation(message) => {
                assert!(message.contains("0 iterations"))
            }
            other => panic!("unexpected error: {}", other),
        }

        let decisions = Solver::new(&pool, &policy).solve(&request).unwrap();
        assert_eq!(decisions.installed_packages().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_solver_config_deserialize() {
        let config: SolverConfig =
            serde_json::from_str(r#"{"max-learned-rules": 5, "prefer-lowest": true}"#).unwrap();
        assert_eq!(config.max_learned_rules, 5);
        assert_eq!(config.max_iterations, 100_000);
        assert!(config.prefer_lowest);
    }
}
