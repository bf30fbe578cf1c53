//! Version ordering compatible with PHP's `version_compare`

use std::cmp::Ordering;

use crate::Operator;

/// Order of the number placeholder among the special version words.
const NUMBER_ORDER: i8 = 4;

#[derive(Debug, Clone, Copy)]
enum Part<'a> {
    Number(&'a str),
    Word(&'a str),
}

/// Splits a version into numeric and alphabetic runs; every other character separates.
fn parts(version: &str) -> Vec<Part<'_>> {
    let bytes = version.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_alphanumeric() {
            i += 1;
            continue;
        }
        let start = i;
        let digit = bytes[i].is_ascii_digit();
        while i < bytes.len()
            && bytes[i].is_ascii_alphanumeric()
            && bytes[i].is_ascii_digit() == digit
        {
            i += 1;
        }
        let text = &version[start..i];
        out.push(if digit { Part::Number(text) } else { Part::Word(text) });
    }

    out
}

fn special_order(word: &str) -> i8 {
    let lower = word.to_ascii_lowercase();
    if lower.starts_with("dev") {
        0
    } else if lower.starts_with("alpha") || lower == "a" {
        1
    } else if lower.starts_with("beta") || lower == "b" {
        2
    } else if lower.starts_with("rc") {
        3
    } else if lower.starts_with("pl") || lower.starts_with('p') {
        5
    } else {
        -1
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_parts(a: Part<'_>, b: Part<'_>) -> Ordering {
    match (a, b) {
        (Part::Number(x), Part::Number(y)) => compare_numbers(x, y),
        (Part::Number(_), Part::Word(w)) => NUMBER_ORDER.cmp(&special_order(w)),
        (Part::Word(w), Part::Number(_)) => special_order(w).cmp(&NUMBER_ORDER),
        (Part::Word(x), Part::Word(y)) => special_order(x).cmp(&special_order(y)),
    }
}

/// Orders two version strings the way PHP's `version_compare` does.
///
/// A missing trailing part is treated as a number placeholder, so `1.0` sorts after
/// `1.0-beta` but before `1.0.1` and `1.0-patch1`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let pa = parts(a);
    let pb = parts(b);

    for i in 0..pa.len().max(pb.len()) {
        let ord = match (pa.get(i), pb.get(i)) {
            (Some(&x), Some(&y)) => compare_parts(x, y),
            (Some(Part::Number(_)), None) => Ordering::Greater,
            (None, Some(Part::Number(_))) => Ordering::Less,
            (Some(Part::Word(w)), None) => special_order(w).cmp(&NUMBER_ORDER),
            (None, Some(Part::Word(w))) => NUMBER_ORDER.cmp(&special_order(w)),
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

/// Operator-based comparisons over normalized versions.
///
/// Dev branches (`dev-*`) only compare equal to themselves and sort below every
/// numbered version.
pub struct Comparator;

impl Comparator {
    pub fn greater_than(a: &str, b: &str) -> bool {
        Self::compare(a, Operator::GreaterThan, b)
    }

    pub fn less_than(a: &str, b: &str) -> bool {
        Self::compare(a, Operator::LessThan, b)
    }

    pub fn equal_to(a: &str, b: &str) -> bool {
        Self::compare(a, Operator::Equal, b)
    }

    pub fn compare(a: &str, operator: Operator, b: &str) -> bool {
        let ord = Self::order(a, b);
        match operator {
            Operator::Equal => ord == Ordering::Equal,
            Operator::NotEqual => ord != Ordering::Equal,
            Operator::LessThan => ord == Ordering::Less,
            Operator::LessThanOrEqual => ord != Ordering::Greater,
            Operator::GreaterThan => ord == Ordering::Greater,
            Operator::GreaterThanOrEqual => ord != Ordering::Less,
        }
    }

    /// Total order used for sorting candidate versions.
    pub fn order(a: &str, b: &str) -> Ordering {
        match (a.starts_with("dev-"), b.starts_with("dev-")) {
            (true, true) => a.cmp(b),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_versions(a, b),
        }
    }
}
