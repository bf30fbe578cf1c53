use std::collections::HashMap;
use std::fmt;

use super::pool::Pool;
use super::rule::{Rule, RuleId, RuleType};
use crate::error::{ResolverError, Result};

/// Append-only collection of rules.
///
/// Rules get sequential ids on insertion and keep them for the whole
/// resolution; the solver uses them as clause handles. Adding a rule whose
/// literal set is already present returns the existing id, and the rule keeps
/// the type it was first added under.
#[derive(Debug, Default)]
pub struct RuleSet {
    /// All rules, indexed by id
    rules: Vec<Rule>,

    /// Rule ids per type, in insertion order
    rules_by_type: HashMap<RuleType, Vec<RuleId>>,

    /// Literal hash -> rule ids for duplicate detection
    rule_hashes: HashMap<u64, Vec<RuleId>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, returning its id (or the id of an equal rule already present)
    pub fn add(&mut self, mut rule: Rule) -> RuleId {
        let hash = rule.literal_hash();
        if let Some(existing) = self.find_equal(hash, &rule) {
            return existing;
        }

        let id = self.rules.len() as RuleId;
        rule.set_id(id);

        self.rules_by_type
            .entry(rule.rule_type())
            .or_default()
            .push(id);
        self.rule_hashes.entry(hash).or_default().push(id);
        self.rules.push(rule);

        id
    }

    fn find_equal(&self, hash: u64, rule: &Rule) -> Option<RuleId> {
        self.rule_hashes.get(&hash)?.iter().copied().find(|&id| {
            self.rules
                .get(id as usize)
                .is_some_and(|existing| existing.equals_literals(rule))
        })
    }

    /// True when a rule with the same literal set is already stored.
    pub fn contains_equal(&self, rule: &Rule) -> bool {
        self.find_equal(rule.literal_hash(), rule).is_some()
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id as usize)
    }

    pub fn rule_by_id(&self, id: RuleId) -> Result<&Rule> {
        self.get(id).ok_or(ResolverError::RuleNotFound { id })
    }

    /// Number of distinct rules
    pub fn count(&self) -> usize {
        self.rules.len()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Rules of one type, in insertion order
    pub fn iter_for(&self, rule_type: RuleType) -> impl Iterator<Item = &Rule> {
        self.rules_by_type
            .get(&rule_type)
            .into_iter()
            .flatten()
            .filter_map(|&id| self.rules.get(id as usize))
    }

    /// All rules except one type, in insertion order
    pub fn iter_without(&self, rule_type: RuleType) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .filter(move |rule| rule.rule_type() != rule_type)
    }

    pub fn count_by_type(&self, rule_type: RuleType) -> usize {
        self.rules_by_type.get(&rule_type).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> RuleSetStats {
        let mut stats = RuleSetStats {
            total: self.rules.len(),
            ..RuleSetStats::default()
        };

        for rule in &self.rules {
            match rule.rule_type() {
                RuleType::Job => stats.job += 1,
                RuleType::Package => stats.package += 1,
                RuleType::Feature => stats.feature += 1,
                RuleType::Learned => stats.learned += 1,
                RuleType::Choice => stats.choice += 1,
            }

            if rule.is_assertion() {
                stats.assertions += 1;
            }
        }

        stats
    }

    /// One `TYPE : (literals)` line per rule, in id order.
    pub fn describe(&self, pool: &Pool) -> String {
        self.rules
            .iter()
            .map(|rule| rule.to_text(pool))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSetStats {
    pub total: usize,
    pub assertions: usize,
    pub job: usize,
    pub package: usize,
    pub feature: usize,
    pub learned: usize,
    pub choice: usize,
}

impl fmt::Display for RuleSetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules ({} job, {} package, {} choice, {} feature, {} learned, {} assertions)",
            self.total, self.job, self.package, self.choice, self.feature, self.learned, self.assertions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::repository::ArrayRepository;

    #[test]
    fn test_rule_set_add() {
        let mut rules = RuleSet::new();

        let id1 = rules.add(Rule::fix_job(1, "php", "8.3.0.0"));
        let id2 = rules.add(Rule::requires(1, vec![2, 3], "b", "*"));

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(rules.count(), 2);
        assert_eq!(rules.rule_by_id(1).unwrap().id(), 1);
    }

    #[test]
    fn test_rule_set_deduplication() {
        let mut rules = RuleSet::new();

        let id1 = rules.add(Rule::requires(1, vec![2, 3], "b", "*"));
        let id2 = rules.add(Rule::learned(vec![3, 2, -1]));

        assert_eq!(id1, id2);
        assert_eq!(rules.count(), 1);
        assert_eq!(rules.rule_by_id(id1).unwrap().rule_type(), RuleType::Package);
        assert!(rules.contains_equal(&Rule::learned(vec![2, -1, 3])));
        assert!(!rules.contains_equal(&Rule::learned(vec![2, -1])));
    }

    #[test]
    fn test_empty_rules_are_kept_apart() {
        let mut rules = RuleSet::new();
        rules.add(Rule::install_job(vec![], "a", None));
        rules.add(Rule::install_job(vec![], "b", None));
        assert_eq!(rules.count(), 2);
    }

    #[test]
    fn test_rule_not_found() {
        let rules = RuleSet::new();
        assert!(matches!(
            rules.rule_by_id(7),
            Err(ResolverError::RuleNotFound { id: 7 })
        ));
    }

    #[test]
    fn test_filtered_iteration_keeps_insertion_order() {
        let mut rules = RuleSet::new();
        rules.add(Rule::install_job(vec![1], "a", None));
        rules.add(Rule::requires(1, vec![2], "b", "*"));
        rules.add(Rule::install_job(vec![3], "c", None));
        rules.add(Rule::keep_installed(4));
        rules.add(Rule::same_name(2, 5, "b"));

        let jobs: Vec<RuleId> = rules.iter_for(RuleType::Job).map(Rule::id).collect();
        assert_eq!(jobs, vec![0, 2]);

        let without_jobs: Vec<RuleId> = rules.iter_without(RuleType::Job).map(Rule::id).collect();
        assert_eq!(without_jobs, vec![1, 3, 4]);

        assert_eq!(rules.count_by_type(RuleType::Package), 2);
        assert_eq!(rules.count_by_type(RuleType::Learned), 0);
    }

    #[test]
    fn test_stats() {
        let mut rules = RuleSet::new();
        rules.add(Rule::install_job(vec![1], "a", None));
        rules.add(Rule::requires(1, vec![2], "b", "*"));
        rules.add(Rule::choice(2, 3, "b"));

        let stats = rules.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.job, 1);
        assert_eq!(stats.package, 1);
        assert_eq!(stats.choice, 1);
        assert_eq!(stats.assertions, 1);
    }

    #[test]
    fn test_describe() {
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![Package::new("a", "1.0.0"), Package::new("b", "1.0.0")],
        ))
        .unwrap();

        let mut rules = RuleSet::new();
        rules.add(Rule::install_job(vec![1], "a", None));
        rules.add(Rule::requires(1, vec![2], "b", "^1.0"));

        assert_eq!(
            rules.describe(&pool),
            "JOB : (+a-1.0.0.0)\nPACKAGE : (-a-1.0.0.0 +b-1.0.0.0)"
        );
    }
}
