use super::pool::PackageId;
use super::rule::{Literal, RuleId};

/// The solver's assignment: which packages are selected, at what decision
/// level, and because of which rule.
///
/// `decision_map` is a flat Vec indexed by PackageId: 0 = undecided,
/// level + 1 for selected and -(level + 1) for not selected. The trail keeps
/// decisions in the order they were made, so its levels never decrease.
#[derive(Debug, Clone, Default)]
pub struct Decisions {
    decision_map: Vec<i32>,

    /// Implying rule per package, None for free decisions
    reasons: Vec<Option<RuleId>>,

    /// Decisions in order made [(literal, rule_id)]
    trail: Vec<(Literal, Option<RuleId>)>,

    level: u32,
}

impl Decisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new decisions tracker sized for a pool
    pub fn with_capacity(max_package_id: usize) -> Self {
        Self {
            decision_map: vec![0; max_package_id + 1],
            reasons: vec![None; max_package_id + 1],
            trail: Vec::with_capacity(max_package_id),
            level: 0,
        }
    }

    #[inline]
    fn ensure_capacity(&mut self, package_id: usize) {
        if package_id >= self.decision_map.len() {
            self.decision_map.resize(package_id + 1, 0);
            self.reasons.resize(package_id + 1, None);
        }
    }

    #[inline]
    fn value(&self, literal: Literal) -> i32 {
        self.decision_map
            .get(literal.unsigned_abs() as usize)
            .copied()
            .unwrap_or(0)
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn increment_level(&mut self) {
        self.level += 1;
    }

    /// Record a literal at the current level.
    ///
    /// Returns false if this conflicts with an existing decision
    pub fn decide(&mut self, literal: Literal, rule_id: Option<RuleId>) -> bool {
        let id = literal.unsigned_abs() as usize;
        self.ensure_capacity(id);

        let existing = self.decision_map[id];
        if existing != 0 {
            return (existing > 0) == (literal > 0);
        }

        let level_value = (self.level + 1) as i32;
        self.decision_map[id] = if literal > 0 { level_value } else { -level_value };
        self.reasons[id] = rule_id;
        self.trail.push((literal, rule_id));

        true
    }

    /// Check if a literal is satisfied by current decisions
    #[inline]
    pub fn satisfied(&self, literal: Literal) -> bool {
        let decision = self.value(literal);
        decision != 0 && (decision > 0) == (literal > 0)
    }

    /// Check if a literal conflicts with current decisions
    #[inline]
    pub fn conflict(&self, literal: Literal) -> bool {
        let decision = self.value(literal);
        decision != 0 && (decision > 0) != (literal > 0)
    }

    #[inline]
    pub fn decided(&self, package_id: PackageId) -> bool {
        self.value(package_id) != 0
    }

    #[inline]
    pub fn undecided(&self, package_id: PackageId) -> bool {
        !self.decided(package_id)
    }

    #[inline]
    pub fn decided_install(&self, package_id: PackageId) -> bool {
        self.value(package_id) > 0
    }

    /// Level at which a literal's package was decided
    #[inline]
    pub fn decision_level(&self, literal: Literal) -> Option<u32> {
        match self.value(literal) {
            0 => None,
            decision => Some(decision.unsigned_abs() - 1),
        }
    }

    /// Rule that implied a literal's package, None for free decisions
    pub fn decision_rule(&self, literal: Literal) -> Option<RuleId> {
        if self.value(literal) == 0 {
            return None;
        }
        self.reasons
            .get(literal.unsigned_abs() as usize)
            .copied()
            .flatten()
    }

    /// Undo every decision made above `target_level`.
    pub fn revert_to_level(&mut self, target_level: u32) {
        while let Some(&(literal, _)) = self.trail.last() {
            if self.decision_level(literal).is_some_and(|level| level <= target_level) {
                break;
            }
            let id = literal.unsigned_abs() as usize;
            self.decision_map[id] = 0;
            self.reasons[id] = None;
            self.trail.pop();
        }

        self.level = target_level;
    }

    /// Selected package ids in ascending order
    pub fn installed_packages(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.decision_map
            .iter()
            .enumerate()
            .filter(|(_, &d)| d > 0)
            .map(|(id, _)| id as PackageId)
    }

    /// Decisions in the order they were made
    pub fn trail(&self) -> &[(Literal, Option<RuleId>)] {
        &self.trail
    }

    pub fn len(&self) -> usize {
        self.trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }
}
