use std::fmt;

use super::pool::{PackageId, Pool};
use super::rule::{Rule, RuleId, RuleReason, RuleType};
use super::rule_set::RuleSet;

/// A rule that contributes to a problem, rendered at creation time so the
/// explanation outlives the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemRule {
    pub rule_id: RuleId,
    pub rule_type: RuleType,
    /// Rule text form: `TYPE : (+name-version ...)`
    pub text: String,
    /// Human-readable description
    pub message: String,
}

/// A requirement that no package in the pool can satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvableRequirement {
    /// Requiring package, None for a root requirement
    pub required_by: Option<String>,
    pub name: String,
    pub constraint: String,
}

impl fmt::Display for UnresolvableRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.required_by {
            Some(source) => write!(f, "{} requires {} {}", source, self.name, self.constraint),
            None => write!(f, "Root composer.json requires {} {}", self.name, self.constraint),
        }
    }
}

/// One contradiction found by the solver and the rules that caused it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Problem {
    pub rules: Vec<ProblemRule>,
    pub unresolvable: Vec<UnresolvableRequirement>,
}

impl Problem {
    /// Builds a problem from rule ids, keeping rule id order and skipping
    /// rules that do not explain anything (learned and feature rules).
    pub fn from_rules(pool: &Pool, rules: &RuleSet, rule_ids: &[RuleId]) -> Self {
        let mut ids = rule_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut problem = Problem::default();
        for rule in ids.into_iter().filter_map(|id| rules.get(id)) {
            if matches!(rule.rule_type(), RuleType::Learned | RuleType::Feature) {
                continue;
            }
            if let Some(requirement) = unresolvable(pool, rule) {
                problem.unresolvable.push(requirement);
            }
            problem.rules.push(ProblemRule {
                rule_id: rule.id(),
                rule_type: rule.rule_type(),
                text: rule.to_text(pool),
                message: describe_rule(pool, rule),
            });
        }
        problem
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}\n    {}", rule.message, rule.text)?;
        }
        Ok(())
    }
}

/// Why a request is unsatisfiable. Deterministic for a given input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Explanation {
    problems: Vec<Problem>,
}

impl Explanation {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Contributing rules in text form, problem by problem
    pub fn rule_texts(&self) -> Vec<&str> {
        self.problems
            .iter()
            .flat_map(|problem| problem.rules.iter().map(|rule| rule.text.as_str()))
            .collect()
    }

    /// Requirements without any candidate
    pub fn unresolvable_requirements(&self) -> Vec<&UnresolvableRequirement> {
        self.problems
            .iter()
            .flat_map(|problem| problem.unresolvable.iter())
            .collect()
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, problem) in self.problems.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "Problem {}", i + 1)?;
            write!(f, "{}", problem)?;
        }
        Ok(())
    }
}

fn pretty(pool: &Pool, id: PackageId) -> String {
    pool.package(id.abs())
        .map(|package| package.pretty_string())
        .unwrap_or_else(|| format!("#{}", id.abs()))
}

fn pretty_list(pool: &Pool, ids: &[PackageId]) -> String {
    ids.iter()
        .map(|&id| pretty(pool, id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_constraint(constraint: Option<&str>) -> &str {
    constraint.unwrap_or("*")
}

fn unresolvable(pool: &Pool, rule: &Rule) -> Option<UnresolvableRequirement> {
    match rule.reason() {
        RuleReason::JobInstall { name, constraint } | RuleReason::JobUpdate { name, constraint }
            if rule.is_empty() =>
        {
            Some(UnresolvableRequirement {
                required_by: None,
                name: name.clone(),
                constraint: display_constraint(constraint.as_deref()).to_string(),
            })
        }
        RuleReason::PackageRequires { source, target, constraint } if rule.len() == 1 => {
            Some(UnresolvableRequirement {
                required_by: Some(pretty(pool, *source)),
                name: target.clone(),
                constraint: constraint.clone(),
            })
        }
        _ => None,
    }
}

/// Describe a rule in human-readable form
fn describe_rule(pool: &Pool, rule: &Rule) -> String {
    let literals = rule.literals();
    match rule.reason() {
        RuleReason::JobInstall { name, constraint } | RuleReason::JobUpdate { name, constraint } => {
            let constraint = display_constraint(constraint.as_deref());
            if !literals.is_empty() {
                format!(
                    "Root composer.json requires {} {} -> satisfiable by {}.",
                    name,
                    constraint,
                    pretty_list(pool, literals)
                )
            } else if pool.what_provides(name, None).is_empty() {
                format!(
                    "Root composer.json requires {} {}, but no matching package was found.",
                    name, constraint
                )
            } else {
                format!(
                    "Root composer.json requires {} {}, but no version satisfying the constraint can be installed.",
                    name, constraint
                )
            }
        }
        RuleReason::JobFix { name, version } => {
            if literals.is_empty() {
                format!("{} {} is fixed but not available.", name, version)
            } else {
                format!("{} is fixed and cannot be changed.", pretty_list(pool, literals))
            }
        }
        RuleReason::JobRemove { name } => {
            format!("Removal of {} was requested.", name)
        }
        RuleReason::PackageRequires { source, target, constraint } => {
            let providers = &literals[1.min(literals.len())..];
            if providers.is_empty() {
                format!(
                    "{} requires {} {} -> no matching package found.",
                    pretty(pool, *source),
                    target,
                    constraint
                )
            } else {
                format!(
                    "{} requires {} {} -> satisfiable by {}.",
                    pretty(pool, *source),
                    target,
                    constraint,
                    pretty_list(pool, providers)
                )
            }
        }
        RuleReason::PackageConflict { source, .. } => {
            let other = literals
                .iter()
                .copied()
                .find(|literal| literal.abs() != *source)
                .unwrap_or(*source);
            format!("{} conflicts with {}.", pretty(pool, *source), pretty(pool, other))
        }
        RuleReason::PackageSameName { name } => {
            format!(
                "Only one version of {} can be installed: {}.",
                name,
                pretty_list(pool, literals)
            )
        }
        RuleReason::PackageReplaces { name } => {
            let (owners, replacers): (Vec<PackageId>, Vec<PackageId>) = literals
                .iter()
                .map(|literal| literal.abs())
                .partition(|&id| pool.package(id).is_some_and(|p| p.name == *name));
            format!(
                "{} replaces {} and thus cannot coexist with {}.",
                pretty_list(pool, &replacers),
                name,
                pretty_list(pool, &owners)
            )
        }
        RuleReason::Choice { name } => {
            format!(
                "{} all replace {} and thus cannot coexist.",
                pretty_list(pool, literals),
                name
            )
        }
        RuleReason::InstalledKeep => {
            format!("{} is installed.", pretty_list(pool, literals))
        }
        RuleReason::Learned => "Conclusion drawn from earlier conflicts.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::repository::ArrayRepository;

    fn setup() -> (Pool, RuleSet) {
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![
                Package::new("a", "1.0.0").with_conflict("b", "*"),
                Package::new("b", "1.0.0"),
                Package::new("c", "1.0.0").with_require("missing", "^1.0"),
            ],
        ))
        .unwrap();

        let mut rules = RuleSet::new();
        rules.add(Rule::install_job(vec![1], "a", None));
        rules.add(Rule::install_job(vec![2], "b", None));
        rules.add(Rule::conflict(1, 2, "b", "*"));
        rules.add(Rule::requires(3, vec![], "missing", "^1.0"));
        rules.add(Rule::install_job(vec![], "nothing", Some("^2.0")));
        rules.add(Rule::learned(vec![-1]));
        (pool, rules)
    }

    #[test]
    fn test_problem_renders_messages_and_rule_text() {
        let (pool, rules) = setup();
        let problem = Problem::from_rules(&pool, &rules, &[2, 0, 1, 2, 5]);
        let explanation = Explanation::new(vec![problem]);

        assert_eq!(
            explanation.to_string(),
            "Problem 1\n\
             \x20 - Root composer.json requires a * -> satisfiable by a 1.0.0.\n\
             \x20   JOB : (+a-1.0.0.0)\n\
             \x20 - Root composer.json requires b * -> satisfiable by b 1.0.0.\n\
             \x20   JOB : (+b-1.0.0.0)\n\
             \x20 - a 1.0.0 conflicts with b 1.0.0.\n\
             \x20   PACKAGE : (-a-1.0.0.0 -b-1.0.0.0)"
        );
        assert_eq!(
            explanation.rule_texts(),
            vec!["JOB : (+a-1.0.0.0)", "JOB : (+b-1.0.0.0)", "PACKAGE : (-a-1.0.0.0 -b-1.0.0.0)"]
        );
    }

    #[test]
    fn test_unresolvable_requirements() {
        let (pool, rules) = setup();
        let explanation = Explanation::new(vec![Problem::from_rules(&pool, &rules, &[3, 4])]);

        let unresolvable = explanation.unresolvable_requirements();
        assert_eq!(unresolvable.len(), 2);
        assert_eq!(unresolvable[0].to_string(), "c 1.0.0 requires missing ^1.0");
        assert_eq!(unresolvable[1].to_string(), "Root composer.json requires nothing ^2.0");

        let text = explanation.to_string();
        assert!(text.contains("c 1.0.0 requires missing ^1.0 -> no matching package found."));
        assert!(text.contains("Root composer.json requires nothing ^2.0, but no matching package was found."));
    }

    #[test]
    fn test_learned_rules_are_not_listed() {
        let (pool, rules) = setup();
        let problem = Problem::from_rules(&pool, &rules, &[5]);
        assert!(problem.is_empty());
    }
}
