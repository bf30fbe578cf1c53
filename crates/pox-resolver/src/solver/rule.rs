use std::fmt;
use std::hash::{Hash, Hasher};

use super::pool::{PackageId, Pool};

/// A literal in SAT terms - positive means "install", negative means "don't install"
pub type Literal = i32;

/// Rule handle assigned by the RuleSet
pub type RuleId = u32;

/// Types of rules generated during dependency resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleType {
    /// Request job: install, update, remove or fix
    Job,
    /// Package relation: requires, conflicts, same name, replaces
    Package,
    /// Soft preference consulted by the policy, never by propagation
    Feature,
    /// Learned clause from conflict analysis
    Learned,
    /// At most one of several replacers claiming the same name
    Choice,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Job => "JOB",
            RuleType::Package => "PACKAGE",
            RuleType::Feature => "FEATURE",
            RuleType::Learned => "LEARNED",
            RuleType::Choice => "CHOICE",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a rule exists. Only used to explain failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleReason {
    /// Root requirement
    JobInstall { name: String, constraint: Option<String> },
    /// Root requirement that may be upgraded
    JobUpdate { name: String, constraint: Option<String> },
    /// Package that has to stay exactly as it is (platform packages)
    JobFix { name: String, version: String },
    JobRemove { name: String },
    PackageRequires { source: PackageId, target: String, constraint: String },
    PackageConflict { source: PackageId, target: String, constraint: String },
    /// Two versions of one package
    PackageSameName { name: String },
    /// A package and another one replacing its name
    PackageReplaces { name: String },
    /// Two replacers of the same name
    Choice { name: String },
    /// Installed package that is not being updated
    InstalledKeep,
    Learned,
}

/// A SAT rule (clause) representing a dependency constraint.
///
/// Rules are disjunctions (OR) of literals. A rule is satisfied when
/// at least one of its literals is true.
///
/// # Examples
///
/// - `[A]` - Package A must be installed (assertion)
/// - `[-A]` - Package A must not be installed
/// - `[-A, B, C]` - If A is installed, then B or C must be installed
/// - `[-A, -B]` - A and B cannot both be installed (conflict)
#[derive(Clone)]
pub struct Rule {
    literals: Vec<Literal>,
    rule_type: RuleType,
    reason: RuleReason,
    /// Rule ID (assigned by RuleSet)
    id: RuleId,
}

impl Rule {
    pub fn new(literals: Vec<Literal>, rule_type: RuleType, reason: RuleReason) -> Self {
        Self {
            literals,
            rule_type,
            reason,
            id: 0,
        }
    }

    /// Root requirement: one of the candidates must be installed
    pub fn install_job(candidates: Vec<PackageId>, name: &str, constraint: Option<&str>) -> Self {
        Self::new(
            candidates,
            RuleType::Job,
            RuleReason::JobInstall {
                name: name.to_string(),
                constraint: constraint.map(str::to_string),
            },
        )
    }

    /// Root requirement of an upgradable package
    pub fn update_job(candidates: Vec<PackageId>, name: &str, constraint: Option<&str>) -> Self {
        Self::new(
            candidates,
            RuleType::Job,
            RuleReason::JobUpdate {
                name: name.to_string(),
                constraint: constraint.map(str::to_string),
            },
        )
    }

    pub fn fix_job(package: PackageId, name: &str, version: &str) -> Self {
        Self::new(
            vec![package],
            RuleType::Job,
            RuleReason::JobFix {
                name: name.to_string(),
                version: version.to_string(),
            },
        )
    }

    pub fn remove_job(package: PackageId, name: &str) -> Self {
        Self::new(
            vec![-package],
            RuleType::Job,
            RuleReason::JobRemove {
                name: name.to_string(),
            },
        )
    }

    /// If source is installed, one of targets must be
    pub fn requires(source: PackageId, targets: Vec<PackageId>, target: &str, constraint: &str) -> Self {
        let mut literals = vec![-source];
        literals.extend(targets);
        Self::new(
            literals,
            RuleType::Package,
            RuleReason::PackageRequires {
                source,
                target: target.to_string(),
                constraint: constraint.to_string(),
            },
        )
    }

    /// Source and other cannot both be installed
    pub fn conflict(source: PackageId, other: PackageId, target: &str, constraint: &str) -> Self {
        Self::new(
            vec![-source, -other],
            RuleType::Package,
            RuleReason::PackageConflict {
                source,
                target: target.to_string(),
                constraint: constraint.to_string(),
            },
        )
    }

    pub fn same_name(a: PackageId, b: PackageId, name: &str) -> Self {
        Self::new(
            vec![-a, -b],
            RuleType::Package,
            RuleReason::PackageSameName {
                name: name.to_string(),
            },
        )
    }

    pub fn replaces(a: PackageId, b: PackageId, name: &str) -> Self {
        Self::new(
            vec![-a, -b],
            RuleType::Package,
            RuleReason::PackageReplaces {
                name: name.to_string(),
            },
        )
    }

    pub fn choice(a: PackageId, b: PackageId, name: &str) -> Self {
        Self::new(
            vec![-a, -b],
            RuleType::Choice,
            RuleReason::Choice {
                name: name.to_string(),
            },
        )
    }

    /// Preference to keep an installed package
    pub fn keep_installed(package: PackageId) -> Self {
        Self::new(vec![package], RuleType::Feature, RuleReason::InstalledKeep)
    }

    /// Learned clause from conflict analysis
    pub fn learned(literals: Vec<Literal>) -> Self {
        Self::new(literals, RuleType::Learned, RuleReason::Learned)
    }

    pub(crate) fn set_id(&mut self, id: RuleId) {
        self.id = id;
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn reason(&self) -> &RuleReason {
        &self.reason
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Check if this is an assertion (single literal)
    pub fn is_assertion(&self) -> bool {
        self.literals.len() == 1
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Hash of the sorted literals, used for deduplication
    pub fn literal_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();

        let mut sorted = self.literals.clone();
        sorted.sort_unstable();
        sorted.hash(&mut hasher);

        hasher.finish()
    }

    /// Same literal multiset, regardless of order and type.
    ///
    /// Empty rules carry nothing but their reason, so they only equal a rule
    /// with the same reason.
    pub fn equals_literals(&self, other: &Rule) -> bool {
        if self.literals.len() != other.literals.len() {
            return false;
        }
        if self.literals.is_empty() {
            return self.reason == other.reason;
        }

        let mut a = self.literals.clone();
        let mut b = other.literals.clone();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    /// Text form used in diagnostics: `TYPE : (+name-version -name-version)`.
    pub fn to_text(&self, pool: &Pool) -> String {
        let literals: Vec<String> = self
            .literals
            .iter()
            .map(|&literal| pool.literal_to_string(literal))
            .collect();
        format!("{} : ({})", self.rule_type, literals.join(" "))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({:?}, {:?})", self.rule_type, self.literals)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literals: Vec<String> = self
            .literals
            .iter()
            .map(|&l| if l > 0 { format!("+{}", l) } else { l.to_string() })
            .collect();
        write!(f, "{} : ({})", self.rule_type, literals.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::repository::ArrayRepository;

    #[test]
    fn test_rule_requires() {
        let rule = Rule::requires(1, vec![2, 3, 4], "b", "^1.0");
        assert_eq!(rule.literals(), &[-1, 2, 3, 4]);
        assert_eq!(rule.rule_type(), RuleType::Package);
        assert!(matches!(rule.reason(), RuleReason::PackageRequires { source: 1, .. }));
    }

    #[test]
    fn test_rule_conflict_and_same_name() {
        assert_eq!(Rule::conflict(1, 2, "b", "*").literals(), &[-1, -2]);
        assert_eq!(Rule::same_name(1, 2, "a").literals(), &[-1, -2]);
        assert_eq!(Rule::choice(3, 4, "a").rule_type(), RuleType::Choice);
    }

    #[test]
    fn test_rule_assertion() {
        let rule = Rule::fix_job(5, "php", "8.3.0.0");
        assert!(rule.is_assertion());
        assert_eq!(rule.literals(), &[5]);
        assert_eq!(Rule::remove_job(5, "a").literals(), &[-5]);
    }

    #[test]
    fn test_rule_literal_hash() {
        let rule1 = Rule::learned(vec![1, 2, 3]);
        let rule2 = Rule::learned(vec![3, 1, 2]);
        let rule3 = Rule::learned(vec![1, 2, 4]);

        assert_eq!(rule1.literal_hash(), rule2.literal_hash());
        assert_ne!(rule1.literal_hash(), rule3.literal_hash());
    }

    #[test]
    fn test_rule_equals_literals_ignores_type() {
        let rule1 = Rule::requires(1, vec![2, 3], "b", "*");
        let rule2 = Rule::learned(vec![3, -1, 2]);
        let rule3 = Rule::learned(vec![-1, 2]);

        assert!(rule1.equals_literals(&rule2));
        assert!(!rule1.equals_literals(&rule3));
    }

    #[test]
    fn test_empty_rules_compare_by_reason() {
        let a = Rule::install_job(vec![], "a", Some("^1.0"));
        let b = Rule::install_job(vec![], "b", Some("^1.0"));
        assert!(!a.equals_literals(&b));
        assert!(a.equals_literals(&a.clone()));
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::requires(1, vec![2, 3], "b", "*");
        assert_eq!(rule.to_string(), "PACKAGE : (-1 +2 +3)");
    }

    #[test]
    fn test_rule_text() {
        let mut pool = Pool::new();
        pool.add_repository(ArrayRepository::with_packages(
            "remote",
            vec![Package::new("a", "1.0.0"), Package::new("b", "1.0.0")],
        ))
        .unwrap();

        let rule = Rule::conflict(1, 2, "b", "1.0.0");
        assert_eq!(rule.to_text(&pool), "PACKAGE : (-a-1.0.0.0 -b-1.0.0.0)");
        assert_eq!(Rule::install_job(vec![2], "b", None).to_text(&pool), "JOB : (+b-1.0.0.0)");
    }
}
