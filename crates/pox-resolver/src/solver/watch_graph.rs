use std::mem;

use super::decisions::Decisions;
use super::rule::{Literal, Rule, RuleId, RuleType};
use super::rule_set::RuleSet;

/// Two-watched literals graph for efficient unit propagation.
///
/// Each rule with at least two literals watches two of them. When a watched
/// literal becomes false, we try to find another literal to watch; if none is
/// left the rule is either unit (the other watch gets forced) or conflicting.
/// Feature rules never take part in propagation.
#[derive(Debug, Default)]
pub struct WatchGraph {
    /// Maps literal index -> list of watch nodes
    watches: Vec<Vec<WatchNode>>,
}

/// A watch node linking a rule to a watched literal
#[derive(Debug, Clone, Copy)]
struct WatchNode {
    rule_id: RuleId,
    /// The other watched literal in this rule
    other_watch: Literal,
}

impl WatchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert literal to index (handles positive and negative literals)
    fn literal_to_index(literal: Literal) -> usize {
        let abs = literal.unsigned_abs() as usize;
        if literal > 0 {
            abs * 2
        } else {
            abs * 2 + 1
        }
    }

    fn watches_mut(&mut self, literal: Literal) -> &mut Vec<WatchNode> {
        let idx = Self::literal_to_index(literal);
        if idx >= self.watches.len() {
            self.watches.resize(idx + 1, Vec::new());
        }
        &mut self.watches[idx]
    }

    /// Build the watch graph from a rule set
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> Self {
        let mut graph = Self::new();
        for rule in rules {
            graph.add_rule(rule);
        }
        graph
    }

    /// Watch the first two literals of a rule. Learned rules put the literal
    /// that becomes unit after backjumping first, so that is always correct.
    pub fn add_rule(&mut self, rule: &Rule) {
        let literals = rule.literals();
        if literals.len() < 2 || rule.rule_type() == RuleType::Feature {
            return;
        }

        let rule_id = rule.id();
        let (watch1, watch2) = (literals[0], literals[1]);
        self.watches_mut(watch1).push(WatchNode {
            rule_id,
            other_watch: watch2,
        });
        self.watches_mut(watch2).push(WatchNode {
            rule_id,
            other_watch: watch1,
        });
    }

    /// Number of rules watching a literal
    pub fn watch_count(&self, literal: Literal) -> usize {
        self.watches
            .get(Self::literal_to_index(literal))
            .map_or(0, Vec::len)
    }

    /// Propagate a literal that just became true.
    ///
    /// Every rule watching its negation is visited: satisfied rules are left
    /// alone, rules with another non-false literal move their watch, and the
    /// rest force their other watched literal. Returns the id of a rule whose
    /// literals are all false.
    pub fn propagate_literal(
        &mut self,
        literal: Literal,
        rules: &RuleSet,
        decisions: &mut Decisions,
    ) -> Option<RuleId> {
        let false_literal = -literal;
        let idx = Self::literal_to_index(false_literal);
        if idx >= self.watches.len() {
            return None;
        }

        let mut pending = mem::take(&mut self.watches[idx]);
        let mut kept = Vec::with_capacity(pending.len());
        let mut conflict = None;

        let mut nodes = pending.drain(..);
        for node in nodes.by_ref() {
            if decisions.satisfied(node.other_watch) {
                kept.push(node);
                continue;
            }

            let Some(rule) = rules.get(node.rule_id) else {
                continue;
            };

            let replacement = rule.literals().iter().copied().find(|&candidate| {
                candidate != false_literal
                    && candidate != node.other_watch
                    && !decisions.conflict(candidate)
            });

            if let Some(new_watch) = replacement {
                let (rule_id, other_watch) = (node.rule_id, node.other_watch);
                self.watches_mut(new_watch).push(WatchNode {
                    rule_id,
                    other_watch,
                });
                self.update_other_watch(other_watch, rule_id, new_watch);
                continue;
            }

            kept.push(node);
            if decisions.conflict(node.other_watch) {
                conflict = Some(node.rule_id);
                break;
            }
            decisions.decide(node.other_watch, Some(node.rule_id));
        }

        kept.extend(nodes);
        self.watches[idx] = kept;
        conflict
    }

    /// The node on `literal` for `rule_id` now pairs with `new_other`.
    fn update_other_watch(&mut self, literal: Literal, rule_id: RuleId, new_other: Literal) {
        if let Some(node) = self
            .watches_mut(literal)
            .iter_mut()
            .find(|node| node.rule_id == rule_id)
        {
            node.other_watch = new_other;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_set(rules: Vec<Rule>) -> RuleSet {
        let mut set = RuleSet::new();
        for rule in rules {
            set.add(rule);
        }
        set
    }

    #[test]
    fn test_watch_graph_watches_two_literals() {
        let rules = rule_set(vec![
            Rule::requires(1, vec![2, 3], "b", "*"),
            Rule::fix_job(4, "php", "8.0.0.0"),
            Rule::keep_installed(5),
        ]);
        let graph = WatchGraph::from_rules(rules.iter());

        assert_eq!(graph.watch_count(-1), 1);
        assert_eq!(graph.watch_count(2), 1);
        assert_eq!(graph.watch_count(3), 0);
        assert_eq!(graph.watch_count(4), 0);
        assert_eq!(graph.watch_count(5), 0);
    }

    #[test]
    fn test_propagate_unit() {
        // 1 requires 2
        let rules = rule_set(vec![Rule::requires(1, vec![2], "b", "*")]);
        let mut graph = WatchGraph::from_rules(rules.iter());
        let mut decisions = Decisions::new();

        decisions.decide(1, None);
        assert_eq!(graph.propagate_literal(1, &rules, &mut decisions), None);
        assert!(decisions.decided_install(2));
        assert_eq!(decisions.decision_rule(2), Some(0));
    }

    #[test]
    fn test_propagate_moves_watch() {
        // 1 requires 2 or 3
        let rules = rule_set(vec![Rule::requires(1, vec![2, 3], "b", "*")]);
        let mut graph = WatchGraph::from_rules(rules.iter());
        let mut decisions = Decisions::new();

        decisions.decide(1, None);
        assert_eq!(graph.propagate_literal(1, &rules, &mut decisions), None);
        assert!(decisions.undecided(2));
        assert!(decisions.undecided(3));
        assert_eq!(graph.watch_count(-1), 0);
        assert_eq!(graph.watch_count(3), 1);

        decisions.decide(-2, None);
        assert_eq!(graph.propagate_literal(-2, &rules, &mut decisions), None);
        assert!(decisions.decided_install(3));
    }

    #[test]
    fn test_propagate_conflict() {
        // 1 conflicts with 2
        let rules = rule_set(vec![Rule::conflict(1, 2, "b", "*")]);
        let mut graph = WatchGraph::from_rules(rules.iter());
        let mut decisions = Decisions::new();

        decisions.decide(2, None);
        decisions.decide(1, None);
        assert_eq!(graph.propagate_literal(1, &rules, &mut decisions), Some(0));
        assert_eq!(graph.watch_count(-1), 1);
    }
}
