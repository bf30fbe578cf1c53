//! Version constraints and their intersection semantics

use std::fmt;

use crate::comparator::compare_versions;
use crate::Operator;

/// A parsed version constraint.
///
/// `matches` answers whether two constraints have at least one version in common.
/// Checking a concrete version is the special case where the other side is an
/// `==` constraint on that version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Matches every version (`*`).
    Any,
    /// Matches nothing.
    None,
    Single { operator: Operator, version: String },
    Multi {
        constraints: Vec<Constraint>,
        conjunctive: bool,
    },
}

impl Constraint {
    pub fn single(operator: Operator, version: impl Into<String>) -> Self {
        Constraint::Single {
            operator,
            version: version.into(),
        }
    }

    /// Exact match on a normalized version.
    pub fn exact(version: impl Into<String>) -> Self {
        Self::single(Operator::Equal, version)
    }

    /// Builds a multi constraint, collapsing the trivial shapes.
    pub fn multi(mut constraints: Vec<Constraint>, conjunctive: bool) -> Self {
        match constraints.len() {
            0 if conjunctive => Constraint::Any,
            0 => Constraint::None,
            1 => constraints.remove(0),
            _ => Constraint::Multi {
                constraints,
                conjunctive,
            },
        }
    }

    /// True when this constraint and `provider` intersect.
    pub fn matches(&self, provider: &Constraint) -> bool {
        match (self, provider) {
            (Constraint::None, _) | (_, Constraint::None) => false,
            (Constraint::Any, _) | (_, Constraint::Any) => true,
            (
                Constraint::Single { operator, version },
                Constraint::Single {
                    operator: p_operator,
                    version: p_version,
                },
            ) => match_specific(*operator, version, *p_operator, p_version),
            (Constraint::Single { .. }, Constraint::Multi { .. }) => provider.matches(self),
            (
                Constraint::Multi {
                    constraints,
                    conjunctive,
                },
                _,
            ) => {
                if !conjunctive {
                    return constraints.iter().any(|c| provider.matches(c));
                }
                if let Constraint::Multi {
                    conjunctive: false, ..
                } = provider
                {
                    return provider.matches(self);
                }
                constraints.iter().all(|c| provider.matches(c))
            }
        }
    }

    /// True when the normalized `version` satisfies this constraint.
    pub fn matches_version(&self, version: &str) -> bool {
        self.matches(&Constraint::exact(version))
    }
}

/// Two-sided comparison where dev branches only ever equal themselves.
fn version_compare(a: &str, b: &str, operator: Operator) -> bool {
    let a_branch = a.starts_with("dev-");
    let b_branch = b.starts_with("dev-");

    if operator == Operator::NotEqual && (a_branch || b_branch) {
        return a != b;
    }
    if a_branch || b_branch {
        return operator == Operator::Equal && a == b;
    }

    let ord = compare_versions(a, b);
    match operator {
        Operator::Equal => ord.is_eq(),
        Operator::NotEqual => ord.is_ne(),
        Operator::LessThan => ord.is_lt(),
        Operator::LessThanOrEqual => ord.is_le(),
        Operator::GreaterThan => ord.is_gt(),
        Operator::GreaterThanOrEqual => ord.is_ge(),
    }
}

fn match_specific(op: Operator, version: &str, p_op: Operator, p_version: &str) -> bool {
    let is_eq = op == Operator::Equal;
    let is_ne = op == Operator::NotEqual;
    let p_is_eq = p_op == Operator::Equal;
    let p_is_ne = p_op == Operator::NotEqual;

    if is_ne || p_is_ne {
        if is_ne && !p_is_ne && !p_is_eq && p_version.starts_with("dev-") {
            return false;
        }
        if p_is_ne && !is_ne && !is_eq && version.starts_with("dev-") {
            return false;
        }
        if !is_eq && !p_is_eq {
            return true;
        }
        return version_compare(p_version, version, Operator::NotEqual);
    }

    // Ranges pointing the same way always overlap.
    if (op.is_lower_bound() && p_op.is_lower_bound())
        || (op.is_upper_bound() && p_op.is_upper_bound())
    {
        return !(version.starts_with("dev-") || p_version.starts_with("dev-"));
    }

    let (left, right, cmp_op) = if is_eq {
        (version, p_version, p_op)
    } else {
        (p_version, version, op)
    };

    if !version_compare(left, right, cmp_op) {
        return false;
    }

    // Opposite ranges meeting at one version overlap only when both include it.
    if !is_eq && !p_is_eq && compare_versions(version, p_version).is_eq() {
        return op.is_inclusive() && p_op.is_inclusive();
    }

    true
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => f.write_str("*"),
            Constraint::None => f.write_str("[]"),
            Constraint::Single { operator, version } => write!(f, "{} {}", operator, version),
            Constraint::Multi {
                constraints,
                conjunctive,
            } => {
                let glue = if *conjunctive { " " } else { " || " };
                let parts: Vec<String> = constraints.iter().map(|c| c.to_string()).collect();
                write!(f, "[{}]", parts.join(glue))
            }
        }
    }
}
