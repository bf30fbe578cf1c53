//! Version normalization and constraint parsing

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::{Constraint, Operator, Stability};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParserError {
    #[error("Invalid version string \"{0}\"")]
    InvalidVersion(String),
    #[error("Invalid stability \"{0}\"")]
    InvalidStability(String),
    #[error("Could not parse version constraint {constraint}: {reason}")]
    InvalidConstraint { constraint: String, reason: String },
}

/// Pre-release/patch modifier: groups are (word, number, dev suffix).
const MODIFIER: &str = r"[._-]?(?:(stable|beta|b|rc|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?";

lazy_static! {
    static ref CLASSICAL_RE: Regex = Regex::new(&format!(
        r"(?i)^v?(\d{{1,5}})(\.\d+)?(\.\d+)?(\.\d+)?{}$",
        MODIFIER
    ))
    .unwrap();

    static ref DATE_RE: Regex = Regex::new(&format!(
        r"(?i)^v?(\d{{4}}(?:[.:-]?\d{{2}}){{1,6}}(?:[.:-]?\d{{1,3}}){{0,2}}){}$",
        MODIFIER
    ))
    .unwrap();

    static ref STABILITY_RE: Regex = Regex::new(&format!(r"(?i){}(?:\+.*)?$", MODIFIER)).unwrap();

    static ref DEV_SUFFIX_RE: Regex = Regex::new(r"(?i)^(.*?)[.-]?dev$").unwrap();
    static ref BRANCH_RE: Regex =
        Regex::new(r"(?i)^v?(\d+)(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?$").unwrap();
    static ref ALIAS_RE: Regex = Regex::new(r"^([^,\s]+) +as +([^,\s]+)$").unwrap();
    static ref TRAILING_FLAG_RE: Regex = Regex::new(r"(?i)@(?:stable|rc|beta|alpha|dev)$").unwrap();
    static ref BUILD_RE: Regex = Regex::new(r"^([^,\s+]+)\+[^\s]+$").unwrap();

    /// Full version as accepted inside tilde, caret and hyphen ranges.
    /// Groups 1-4 are the numeric parts, 5-7 the modifier, 8 an `.x-dev` suffix.
    static ref RANGE_VERSION: String = format!(
        r"v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.(\d+))?(?:{}|\.([x*][.-]?dev))(?:\+[^\s]+)?",
        MODIFIER
    );
    static ref TILDE_RE: Regex = Regex::new(&format!(r"(?i)^~{}$", *RANGE_VERSION)).unwrap();
    static ref CARET_RE: Regex = Regex::new(&format!(r"(?i)^\^{}$", *RANGE_VERSION)).unwrap();
    static ref PLAIN_VERSION_RE: Regex = Regex::new(&format!(r"(?i)^{}$", *RANGE_VERSION)).unwrap();

    static ref X_RANGE_RE: Regex = Regex::new(r"(?i)^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.[x*])+$").unwrap();
    static ref WILDCARD_RE: Regex = Regex::new(r"(?i)^v?[x*](\.[x*])*$").unwrap();
    static ref OR_SPLIT_RE: Regex = Regex::new(r"\s*\|\|?\s*").unwrap();
    static ref OPERATOR_ONLY_RE: Regex = Regex::new(r"^(<>|!=|>=?|<=?|==?|~|\^)$").unwrap();
    static ref CONSTRAINT_FLAG_RE: Regex =
        Regex::new(r"(?i)^([^,\s]*?)@(stable|rc|beta|alpha|dev)$").unwrap();
    static ref EXPLICIT_FLAG_RE: Regex = Regex::new(r"(?i)@(stable|rc|beta|alpha|dev)\b").unwrap();
    static ref REFERENCE_RE: Regex = Regex::new(r"(?i)^(dev-[^,\s@]+?|[^,\s@]+?\.x-dev)#.+$").unwrap();
    static ref BASIC_RE: Regex = Regex::new(r"^(<>|!=|>=?|<=?|==?)?\s*(.*)$").unwrap();
    static ref DEV_NAME_RE: Regex = Regex::new(r"^[A-Za-z0-9./_-]+$").unwrap();
}

fn present(caps: &Captures, index: usize) -> bool {
    caps.get(index).is_some_and(|m| !m.as_str().is_empty())
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn invalid(constraint: &str, reason: impl Into<String>) -> VersionParserError {
    VersionParserError::InvalidConstraint {
        constraint: constraint.to_string(),
        reason: reason.into(),
    }
}

fn expand_stability(word: &str) -> String {
    match word.to_ascii_lowercase().as_str() {
        "a" => "alpha".to_string(),
        "b" => "beta".to_string(),
        "p" | "pl" => "patch".to_string(),
        "rc" => "RC".to_string(),
        other => other.to_string(),
    }
}

/// Appends the modifier captured at `index` (word, number, dev) to a numeric version.
fn with_modifiers(mut result: String, caps: &Captures, index: usize) -> String {
    if let Some(word) = caps.get(index) {
        if word.as_str().eq_ignore_ascii_case("stable") {
            return result;
        }
        result.push('-');
        result.push_str(&expand_stability(word.as_str()));
        result.push_str(group(caps, index + 1).trim_start_matches(['.', '-']));
    }
    if present(caps, index + 2) {
        result.push_str("-dev");
    }
    result
}

/// Bumps the numeric part at `position` (1-based) and zeroes every part after it.
fn bump(caps: &Captures, position: usize, increment: u64) -> String {
    let mut parts = [0u64; 4];
    for (i, part) in parts.iter_mut().enumerate() {
        let value = group(caps, i + 1).parse().unwrap_or(0);
        *part = match (i + 1).cmp(&position) {
            std::cmp::Ordering::Less => value,
            std::cmp::Ordering::Equal => value + increment,
            std::cmp::Ordering::Greater => 0,
        };
    }
    format!("{}.{}.{}.{}", parts[0], parts[1], parts[2], parts[3])
}

/// Splits one alternative on `,`/whitespace, keeping `>= 1.0`, `1.0 - 2.0` and
/// `1.0 as 2.0` together.
fn split_and(input: &str) -> Vec<String> {
    let raw: Vec<&str> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    let mut tokens = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let mut token = raw[i].to_string();
        i += 1;
        if OPERATOR_ONLY_RE.is_match(&token) && i < raw.len() {
            token.push_str(raw[i]);
            i += 1;
        }
        if i + 1 < raw.len() && (raw[i] == "-" || raw[i] == "as") {
            token = format!("{} {} {}", token, raw[i], raw[i + 1]);
            i += 2;
        }
        tokens.push(token);
    }
    tokens
}

/// Parses versions and constraints into Composer's normalized forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionParser;

impl VersionParser {
    pub fn new() -> Self {
        VersionParser
    }

    pub fn is_valid(&self, version: &str) -> bool {
        self.normalize(version).is_ok()
    }

    /// Returns the stability implied by a (raw or normalized) version string.
    pub fn parse_stability(version: &str) -> Stability {
        let version = version.split('#').next().unwrap_or(version);

        if version.starts_with("dev-") || version.ends_with("-dev") {
            return Stability::Dev;
        }

        let lower = version.to_ascii_lowercase();
        let Some(caps) = STABILITY_RE.captures(&lower) else {
            return Stability::Stable;
        };
        if present(&caps, 3) {
            return Stability::Dev;
        }
        match group(&caps, 1) {
            "beta" | "b" => Stability::Beta,
            "alpha" | "a" => Stability::Alpha,
            "rc" => Stability::RC,
            _ => Stability::Stable,
        }
    }

    /// Least stable stability requested by a root constraint.
    ///
    /// Explicit `@flag` suffixes win; otherwise a constraint naming an unstable
    /// version (`1.0.x-dev`, `2.0.0-beta1`) implies that version's stability.
    pub fn stability_flag(constraints: &str) -> Option<Stability> {
        let explicit = EXPLICIT_FLAG_RE
            .captures_iter(constraints)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<Stability>().ok())
            .min();
        if explicit.is_some() {
            return explicit;
        }

        constraints
            .split(|c: char| c == ',' || c == '|' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.trim_start_matches(['<', '>', '=', '!', '~', '^']))
            .map(Self::parse_stability)
            .filter(|stability| *stability != Stability::Stable)
            .min()
    }

    /// Normalizes a version string so it can be compared.
    pub fn normalize(&self, version: &str) -> Result<String, VersionParserError> {
        let original = version.trim();
        if original.is_empty() {
            return Err(VersionParserError::InvalidVersion(version.to_string()));
        }

        let version = match ALIAS_RE.captures(original) {
            Some(caps) => group(&caps, 1),
            None => original,
        };
        let version = TRAILING_FLAG_RE.replace(version, "");
        let version: &str = &version;

        if matches!(version, "master" | "trunk" | "default") {
            return Ok(format!("dev-{}", version));
        }
        if version
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("dev-"))
        {
            return Ok(format!("dev-{}", &version[4..]));
        }

        let version = match BUILD_RE.captures(version) {
            Some(caps) => group(&caps, 1),
            None => version,
        };

        if let Some(caps) = CLASSICAL_RE.captures(version) {
            let mut result = group(&caps, 1).to_string();
            for index in 2..=4 {
                match caps.get(index) {
                    Some(m) => result.push_str(m.as_str()),
                    None => result.push_str(".0"),
                }
            }
            return Ok(with_modifiers(result, &caps, 5));
        }

        if let Some(caps) = DATE_RE.captures(version) {
            let result: String = group(&caps, 1)
                .chars()
                .map(|c| if c.is_ascii_digit() { c } else { '.' })
                .collect();
            return Ok(with_modifiers(result, &caps, 2));
        }

        if let Some(caps) = DEV_SUFFIX_RE.captures(version) {
            let branch = self.normalize_branch(group(&caps, 1));
            if !branch.starts_with("dev-") {
                return Ok(branch);
            }
        }

        Err(VersionParserError::InvalidVersion(original.to_string()))
    }

    /// Normalizes a branch name: numeric branches become `x.y.9999999.9999999-dev`,
    /// anything else `dev-<name>`.
    pub fn normalize_branch(&self, name: &str) -> String {
        let name = name.trim();
        let Some(caps) = BRANCH_RE.captures(name) else {
            return format!("dev-{}", name);
        };

        let parts: Vec<String> = (1..=4)
            .map(|index| {
                let part = group(&caps, index).trim_start_matches('.');
                if part.is_empty() || part == "*" || part.eq_ignore_ascii_case("x") {
                    "9999999".to_string()
                } else {
                    part.to_string()
                }
            })
            .collect();

        format!("{}-dev", parts.join("."))
    }

    /// Parses a constraint string such as `^1.2 || >=2.0,<2.5`.
    pub fn parse_constraints(&self, constraints: &str) -> Result<Constraint, VersionParserError> {
        let input = constraints.trim();
        if input.is_empty() {
            return Err(invalid(constraints, "empty constraint"));
        }

        let alternatives: Vec<&str> = OR_SPLIT_RE.split(input).collect();
        if alternatives.iter().any(|alt| alt.trim().is_empty()) {
            return Err(invalid(input, "empty alternative around \"||\""));
        }

        let mut parsed = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            let mut all = Vec::new();
            for token in split_and(alternative) {
                all.extend(self.parse_single(&token)?);
            }
            parsed.push(Constraint::multi(all, true));
        }

        Ok(Constraint::multi(parsed, false))
    }

    fn parse_single(&self, token: &str) -> Result<Vec<Constraint>, VersionParserError> {
        let mut token = token.trim();

        if let Some(caps) = ALIAS_RE.captures(token) {
            token = group(&caps, 1);
        }
        if let Some(caps) = CONSTRAINT_FLAG_RE.captures(token) {
            token = match group(&caps, 1) {
                "" => "*",
                rest => rest,
            };
        }
        if let Some(caps) = REFERENCE_RE.captures(token) {
            token = group(&caps, 1);
        }

        if WILDCARD_RE.is_match(token) {
            if token.contains('.') || token.starts_with(['v', 'V']) {
                return Ok(vec![Constraint::single(
                    Operator::GreaterThanOrEqual,
                    "0.0.0.0-dev",
                )]);
            }
            return Ok(vec![Constraint::Any]);
        }

        if token.starts_with("~>") {
            return Err(invalid(
                token,
                "invalid operator \"~>\", you probably meant to use the \"~\" operator",
            ));
        }

        if let Some(caps) = TILDE_RE.captures(token) {
            return self.parse_tilde(&caps, &token[1..]);
        }
        if let Some(caps) = CARET_RE.captures(token) {
            return self.parse_caret(&caps, &token[1..]);
        }
        if let Some(caps) = X_RANGE_RE.captures(token) {
            return Ok(Self::parse_x_range(&caps));
        }
        if let Some((from, to)) = token.split_once(" - ") {
            return self.parse_hyphen(token, from.trim(), to.trim());
        }

        self.parse_comparison(token)
    }

    /// Suffix that makes a lower bound include pre-releases of that version.
    fn lower_bound_suffix(caps: &Captures) -> &'static str {
        if present(caps, 5) || present(caps, 7) || present(caps, 8) {
            ""
        } else {
            "-dev"
        }
    }

    fn parse_tilde(&self, caps: &Captures, version: &str) -> Result<Vec<Constraint>, VersionParserError> {
        let mut position = (1..=4).rev().find(|&i| present(caps, i)).unwrap_or(1);
        if present(caps, 8) {
            position += 1;
        }

        let low = self.normalize(&format!("{}{}", version, Self::lower_bound_suffix(caps)))?;
        let high = format!("{}-dev", bump(caps, position.saturating_sub(1).max(1), 1));

        Ok(vec![
            Constraint::single(Operator::GreaterThanOrEqual, low),
            Constraint::single(Operator::LessThan, high),
        ])
    }

    fn parse_caret(&self, caps: &Captures, version: &str) -> Result<Vec<Constraint>, VersionParserError> {
        let position = if group(caps, 1) != "0" || !present(caps, 2) {
            1
        } else if group(caps, 2) != "0" || !present(caps, 3) {
            2
        } else {
            3
        };

        let low = self.normalize(&format!("{}{}", version, Self::lower_bound_suffix(caps)))?;
        let high = format!("{}-dev", bump(caps, position, 1));

        Ok(vec![
            Constraint::single(Operator::GreaterThanOrEqual, low),
            Constraint::single(Operator::LessThan, high),
        ])
    }

    fn parse_x_range(caps: &Captures) -> Vec<Constraint> {
        let position = (1..=3).rev().find(|&i| present(caps, i)).unwrap_or(1);
        let low = format!("{}-dev", bump(caps, position, 0));
        let high = format!("{}-dev", bump(caps, position, 1));

        if low == "0.0.0.0-dev" {
            return vec![Constraint::single(Operator::LessThan, high)];
        }
        vec![
            Constraint::single(Operator::GreaterThanOrEqual, low),
            Constraint::single(Operator::LessThan, high),
        ]
    }

    fn parse_hyphen(&self, token: &str, from: &str, to: &str) -> Result<Vec<Constraint>, VersionParserError> {
        let from_caps = PLAIN_VERSION_RE
            .captures(from)
            .ok_or_else(|| invalid(token, format!("invalid range start \"{}\"", from)))?;
        let to_caps = PLAIN_VERSION_RE
            .captures(to)
            .ok_or_else(|| invalid(token, format!("invalid range end \"{}\"", to)))?;

        let low = format!("{}{}", self.normalize(from)?, Self::lower_bound_suffix(&from_caps));
        let lower = Constraint::single(Operator::GreaterThanOrEqual, low);

        let complete = present(&to_caps, 2) && present(&to_caps, 3);
        let upper = if complete || present(&to_caps, 5) || present(&to_caps, 7) || present(&to_caps, 8) {
            Constraint::single(Operator::LessThanOrEqual, self.normalize(to)?)
        } else {
            let position = if present(&to_caps, 2) { 2 } else { 1 };
            Constraint::single(Operator::LessThan, format!("{}-dev", bump(&to_caps, position, 1)))
        };

        Ok(vec![lower, upper])
    }

    fn parse_comparison(&self, token: &str) -> Result<Vec<Constraint>, VersionParserError> {
        let caps = BASIC_RE
            .captures(token)
            .ok_or_else(|| invalid(token, "could not parse constraint"))?;
        let version_str = group(&caps, 2).trim();
        if version_str.is_empty() {
            return Err(invalid(token, "empty version"));
        }

        let operator: Operator = group(&caps, 1)
            .parse()
            .map_err(|e: crate::InvalidOperatorError| invalid(token, e.to_string()))?;

        let mut version = match self.normalize(version_str) {
            Ok(version) => version,
            Err(err) => match version_str.strip_suffix("-dev") {
                Some(name) if DEV_NAME_RE.is_match(name) => format!("dev-{}", name),
                _ => return Err(invalid(token, err.to_string())),
            },
        };

        if matches!(operator, Operator::LessThan | Operator::GreaterThanOrEqual)
            && !version.contains('-')
        {
            version.push_str("-dev");
        }

        Ok(vec![Constraint::single(operator, version)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(constraint: &str) -> String {
        VersionParser::new().parse_constraints(constraint).unwrap().to_string()
    }

    #[test]
    fn test_normalize_versions() {
        let parser = VersionParser::new();
        let cases = [
            ("1.0.0", "1.0.0.0"),
            ("v1.2", "1.2.0.0"),
            ("1.2.3.4", "1.2.3.4"),
            ("1.0.0-beta2", "1.0.0.0-beta2"),
            ("1.0.0RC1", "1.0.0.0-RC1"),
            ("1.0.0-rc.1", "1.0.0.0-RC1"),
            ("1.0.0-alpha", "1.0.0.0-alpha"),
            ("1.0.0-pl3", "1.0.0.0-patch3"),
            ("1.0-dev", "1.0.0.0-dev"),
            ("1.0.x-dev", "1.0.9999999.9999999-dev"),
            ("dev-master", "dev-master"),
            ("master", "dev-master"),
            ("dev-Feature/Foo", "dev-Feature/Foo"),
            ("2010-01-02", "2010.01.02"),
            ("1.0.0+build.5", "1.0.0.0"),
            ("1.0.0-beta.5+foo", "1.0.0.0-beta5"),
            ("1.0.0 as 2.0.0", "1.0.0.0"),
            ("1.0@dev", "1.0.0.0"),
        ];

        for (input, expected) in cases {
            assert_eq!(parser.normalize(input).unwrap(), expected, "normalizing {}", input);
        }
    }

    #[test]
    fn test_normalize_fails() {
        let parser = VersionParser::new();
        for input in ["", "a", "1.0.0-meh", "1.0.0.0.0", "feature-dev"] {
            assert!(parser.normalize(input).is_err(), "{} should not normalize", input);
        }
    }

    #[test]
    fn test_parse_stability() {
        assert_eq!(VersionParser::parse_stability("1.0.0"), Stability::Stable);
        assert_eq!(VersionParser::parse_stability("1.0.0-dev"), Stability::Dev);
        assert_eq!(VersionParser::parse_stability("dev-master"), Stability::Dev);
        assert_eq!(VersionParser::parse_stability("1.0.0.0-beta2"), Stability::Beta);
        assert_eq!(VersionParser::parse_stability("1.0.0-RC1"), Stability::RC);
        assert_eq!(VersionParser::parse_stability("1.2.0-a"), Stability::Alpha);
        assert_eq!(VersionParser::parse_stability("3.1.2-pl2"), Stability::Stable);
        assert_eq!(VersionParser::parse_stability("dev-foo#abc"), Stability::Dev);
    }

    #[test]
    fn test_stability_flag() {
        assert_eq!(VersionParser::stability_flag("^1.0@dev"), Some(Stability::Dev));
        assert_eq!(VersionParser::stability_flag("^1.0"), None);
        assert_eq!(VersionParser::stability_flag("1.0.x-dev"), Some(Stability::Dev));
        assert_eq!(
            VersionParser::stability_flag("^2.0@beta || ^1.0@alpha"),
            Some(Stability::Alpha)
        );
        assert_eq!(VersionParser::stability_flag(">=2.0.0-RC1"), Some(Stability::RC));
    }

    #[test]
    fn test_parse_simple_constraints() {
        assert_eq!(parse("1.0.0"), "== 1.0.0.0");
        assert_eq!(parse("=1.0"), "== 1.0.0.0");
        assert_eq!(parse(">=1.0"), ">= 1.0.0.0-dev");
        assert_eq!(parse("< 2.0"), "< 2.0.0.0-dev");
        assert_eq!(parse("!=1.2.3"), "!= 1.2.3.0");
        assert_eq!(parse("dev-master"), "== dev-master");
        assert_eq!(parse("dev-master#abc123"), "== dev-master");
        assert_eq!(parse("foo-dev"), "== dev-foo");
    }

    #[test]
    fn test_parse_wildcards() {
        assert_eq!(parse("*"), "*");
        assert_eq!(parse("@dev"), "*");
        assert_eq!(parse("*.*"), ">= 0.0.0.0-dev");
        assert_eq!(parse("1.0.*"), "[>= 1.0.0.0-dev < 1.1.0.0-dev]");
        assert_eq!(parse("2.x"), "[>= 2.0.0.0-dev < 3.0.0.0-dev]");
        assert_eq!(parse("0.*"), "< 1.0.0.0-dev");
    }

    #[test]
    fn test_parse_tilde_and_caret() {
        assert_eq!(parse("~1.2"), "[>= 1.2.0.0-dev < 2.0.0.0-dev]");
        assert_eq!(parse("~1.2.3"), "[>= 1.2.3.0-dev < 1.3.0.0-dev]");
        assert_eq!(parse("~1.2-beta"), "[>= 1.2.0.0-beta < 2.0.0.0-dev]");
        assert_eq!(parse("^1.2.3"), "[>= 1.2.3.0-dev < 2.0.0.0-dev]");
        assert_eq!(parse("^0.3"), "[>= 0.3.0.0-dev < 0.4.0.0-dev]");
        assert_eq!(parse("^0.0.3"), "[>= 0.0.3.0-dev < 0.0.4.0-dev]");
    }

    #[test]
    fn test_parse_hyphen_ranges() {
        assert_eq!(parse("1.0 - 2.0"), "[>= 1.0.0.0-dev < 2.1.0.0-dev]");
        assert_eq!(parse("1.2.3 - 2.3.4"), "[>= 1.2.3.0-dev <= 2.3.4.0]");
        assert_eq!(parse("1 - 2"), "[>= 1.0.0.0-dev < 3.0.0.0-dev]");
    }

    #[test]
    fn test_parse_multi_constraints() {
        assert_eq!(parse(">=1.0,<2.0"), "[>= 1.0.0.0-dev < 2.0.0.0-dev]");
        assert_eq!(parse(">= 1.0 < 2.0"), "[>= 1.0.0.0-dev < 2.0.0.0-dev]");
        assert_eq!(
            parse("^1.0 || ^2.0"),
            "[[>= 1.0.0.0-dev < 2.0.0.0-dev] || [>= 2.0.0.0-dev < 3.0.0.0-dev]]"
        );
        assert_eq!(parse("1.0|2.0"), "[== 1.0.0.0 || == 2.0.0.0]");
        assert_eq!(parse("^1.0@dev"), "[>= 1.0.0.0-dev < 2.0.0.0-dev]");
    }

    #[test]
    fn test_parse_constraints_fails() {
        let parser = VersionParser::new();
        for input in ["", "~>1.0", "^1.0 ||", "|| ^1.0", ">=", "1.0.0-meh", "=>1.0"] {
            assert!(parser.parse_constraints(input).is_err(), "{} should not parse", input);
        }
    }

    #[test]
    fn test_constraint_matches_normalized_versions() {
        let parser = VersionParser::new();
        let range = parser.parse_constraints(">=1.0,<2.0").unwrap();
        assert!(range.matches_version("1.0.0.0"));
        assert!(range.matches_version("1.9.9.9"));
        assert!(!range.matches_version("2.0.0.0"));
        assert!(!range.matches_version("2.0.0.0-beta1"));

        let tilde = parser.parse_constraints("~1.2.1").unwrap();
        assert!(tilde.matches_version("1.2.5.0"));
        assert!(!tilde.matches_version("1.3.0.0"));
    }
}
