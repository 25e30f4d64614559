//! Number tokens, pattern compilation, and context windows shared by the
//! extraction rules.

use regex::{Match, Regex};

use crate::domain::Role;

/// A number as written in prose: digits, optional thousands separators,
/// optional decimal part.
const NUM: &str = r"([0-9][0-9,]*(?:\.[0-9]+)?)";

/// Markdown emphasis delimiter.
const EMPH: &str = r"(?:\*\*|__)";

/// Hedging words between an assignment and its number.
const QUAL: &str = r"(?:(?:approximately|approx\.?|about|roughly|around|at\s+least|a\s+minimum\s+of|~)\s*)?";

/// Nouns that may sit between a count and its "per group" phrase.
const NOUN: &str = r"(?:participants?|subjects?|patients?|individuals?|people|persons?|observations?|children|students|women|men|animals|mice|clusters?|sites?|schools?|practices|pairs?|units?)";

/// "per group" phrasing, including arms, cells, clusters, and conditions.
const UNIT: &str = r"(?:per[\s-]+|/\s*|in\s+each\s+|for\s+each\s+|each\s+)(?:treatment\s+|study\s+)?(?:group|arm|cell|cluster|condition)s?\b";

const PER_GROUP_KEYWORDS: &[&str] = &[
    "per group",
    "per-group",
    "per arm",
    "per-arm",
    "per cell",
    "per cluster",
    "per condition",
    "each group",
    "each arm",
    "in each",
];

const TOTAL_KEYWORDS: &[&str] = &["total", "overall", "combined", "altogether", "in all"];

/// Compile an extraction pattern, expanding the `{NUM}`, `{EMPH}`, `{QUAL}`,
/// `{NOUN}` and `{UNIT}` placeholders. Patterns are compile-time constants.
pub(crate) fn rule(pattern: &str) -> Regex {
    let expanded = pattern
        .replace("{NUM}", NUM)
        .replace("{EMPH}", EMPH)
        .replace("{QUAL}", QUAL)
        .replace("{NOUN}", NOUN)
        .replace("{UNIT}", UNIT);
    Regex::new(&expanded).unwrap_or_else(|e| panic!("invalid extraction pattern {pattern:?}: {e}"))
}

/// A parsed number and what surrounds it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NumberToken {
    pub value: f64,
    pub start: usize,
    pub end: usize,
    /// Followed by `%` or "percent".
    pub percent: bool,
    /// Written with a decimal point.
    pub decimal: bool,
    /// Left operand of an arithmetic expression (`2 × 64`, `1 - β`).
    pub operand: bool,
    /// Counts groups rather than subjects (`2 groups`, `3 treatment arms`).
    pub group_count: bool,
}

/// Numbers captured by `group` of every match of `re`.
pub(crate) fn numbers<'a>(
    re: &'a Regex,
    text: &'a str,
    group: usize,
) -> impl Iterator<Item = NumberToken> + 'a {
    re.captures_iter(text)
        .filter_map(move |caps| caps.get(group).and_then(|m| token(text, m)))
}

/// Parse a captured number, rejecting captures that start inside a larger
/// token (`1.96` captured from its fraction, `n1` subscripts).
pub(crate) fn token(text: &str, m: Match<'_>) -> Option<NumberToken> {
    let start = m.start();
    if let Some(prev) = text[..start].chars().next_back() {
        if prev.is_alphanumeric() || prev == '.' {
            return None;
        }
    }

    let literal = grouped_prefix(m.as_str().trim_end_matches(','));
    let value: f64 = literal.replace(',', "").parse().ok()?;
    let end = start + literal.len();

    Some(NumberToken {
        value,
        start,
        end,
        percent: is_percent(&text[end..]),
        decimal: literal.contains('.'),
        operand: is_operand(&text[end..]),
        group_count: is_group_count(&text[end..]),
    })
}

/// Keep `1,234` and `12,345.6` whole; cut malformed groupings such as
/// `64,1280` at the first comma.
fn grouped_prefix(raw: &str) -> &str {
    let Some(first_comma) = raw.find(',') else {
        return raw;
    };
    let integer = raw.split('.').next().unwrap_or(raw);
    let mut groups = integer.split(',');
    let lead_ok = groups.next().is_some_and(|g| (1..=3).contains(&g.len()));
    if lead_ok && groups.all(|g| g.len() == 3) {
        raw
    } else {
        &raw[..first_comma]
    }
}

fn skip_blanks(s: &str) -> &str {
    s.trim_start_matches([' ', '\t'])
}

fn is_percent(rest: &str) -> bool {
    let rest = skip_blanks(rest);
    rest.starts_with('%')
        || rest.get(..7).is_some_and(|w| w.eq_ignore_ascii_case("percent"))
        || rest.get(..8).is_some_and(|w| w.eq_ignore_ascii_case("per cent"))
}

fn is_operand(rest: &str) -> bool {
    let rest = skip_blanks(rest);
    let mut chars = rest.chars();
    let Some(op) = chars.next() else {
        return false;
    };
    let next = skip_blanks(chars.as_str()).chars().next();
    match op {
        '×' | '·' | '^' => next.is_some_and(|c| c.is_alphanumeric() || c == '('),
        '*' | '/' | 'x' | 'X' => next.is_some_and(|c| c.is_ascii_digit() || c == '('),
        '+' | '-' | '−' | '–' => {
            next.is_some_and(|c| c.is_ascii_digit() || (c.is_alphabetic() && !c.is_ascii()))
        }
        _ => false,
    }
}

fn is_group_count(rest: &str) -> bool {
    let rest = skip_blanks(rest);
    if !rest.starts_with(char::is_alphabetic) {
        return false;
    }
    let mut words = rest
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase);
    let mut word = words.next();
    if matches!(word.as_deref(), Some("treatment" | "study" | "intervention")) {
        word = words.next();
    }
    matches!(
        word.as_deref(),
        Some("group" | "groups" | "arm" | "arms" | "condition" | "conditions" | "cells")
    )
}

fn floor_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(text: &str, mut i: usize) -> usize {
    i = i.min(text.len());
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Lowercased text before and after a token, `width` bytes each way.
fn window(text: &str, start: usize, end: usize, width: usize) -> (String, String) {
    let from = floor_boundary(text, start.saturating_sub(width));
    let to = ceil_boundary(text, end.saturating_add(width));
    (
        text[from..start].to_ascii_lowercase(),
        text[end..to].to_ascii_lowercase(),
    )
}

fn nearest(before: &str, after: &str, keywords: &[&str]) -> Option<usize> {
    keywords
        .iter()
        .flat_map(|kw| {
            let left = before.rfind(kw).map(|p| before.len() - p - kw.len());
            let right = after.find(kw);
            left.into_iter().chain(right)
        })
        .min()
}

/// Infer a token's role from the role keyword nearest to it within the
/// window. Per-group wins ties.
pub(crate) fn nearest_role(text: &str, tok: &NumberToken, width: usize) -> Role {
    let (before, after) = window(text, tok.start, tok.end, width);
    match (
        nearest(&before, &after, PER_GROUP_KEYWORDS),
        nearest(&before, &after, TOTAL_KEYWORDS),
    ) {
        (Some(pg), Some(total)) if pg <= total => Role::PerGroup,
        (Some(_), Some(_)) => Role::Total,
        (Some(_), None) => Role::PerGroup,
        (None, Some(_)) => Role::Total,
        (None, None) => Role::Unknown,
    }
}

/// Whether any of `words` appears within the window around a token.
pub(crate) fn window_mentions(text: &str, tok: &NumberToken, width: usize, words: &[&str]) -> bool {
    let (before, after) = window(text, tok.start, tok.end, width);
    words
        .iter()
        .any(|w| before.contains(w) || after.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(text: &str) -> NumberToken {
        let re = rule(r"{NUM}");
        let token = numbers(&re, text, 1).next().expect("token");
        token
    }

    #[test]
    fn test_thousands_separator() {
        let tok = first("screened 1,250 patients");
        assert_eq!(tok.value, 1250.0);
        assert!(!tok.decimal);
    }

    #[test]
    fn test_list_comma_is_not_a_separator() {
        let tok = first("64,1280");
        assert_eq!(tok.value, 64.0);
        assert_eq!(tok.end, 2);

        let tok = first("12,345.5");
        assert_eq!(tok.value, 12345.5);
    }

    #[test]
    fn test_trailing_comma_and_period() {
        let tok = first("64, then");
        assert_eq!(tok.value, 64.0);
        let tok = first("need 64.");
        assert_eq!(tok.value, 64.0);
    }

    #[test]
    fn test_percent_detection() {
        assert!(first("80% power").percent);
        assert!(first("80 percent power").percent);
        assert!(!first("80 participants").percent);
    }

    #[test]
    fn test_operand_detection() {
        assert!(first("2 × 64 = 128").operand);
        assert!(first("2 x 64").operand);
        assert!(first("n = 2 × (1.96 + 0.84)²").operand);
        assert!(first("1 - β").operand);
        assert!(!first("64 per group").operand);
        assert!(!first("64** per group").operand);
        assert!(!first("64/group").operand);
    }

    #[test]
    fn test_group_count_detection() {
        assert!(first("2 groups of 64").group_count);
        assert!(first("3 treatment arms").group_count);
        assert!(!first("64 per group").group_count);
        assert!(!first("64/group").group_count);
        assert!(!first("12 clusters per arm").group_count);
        assert!(!first("64, groups").group_count);
    }

    #[test]
    fn test_capture_inside_token_rejected() {
        let re = rule(r"\.{NUM}");
        assert!(numbers(&re, "x1.96", 1).next().is_none());
        let re = rule(r"n{NUM}");
        assert!(numbers(&re, "n1 = 50", 1).next().is_none());
    }

    fn tok_at(text: &str, needle: &str) -> NumberToken {
        let start = text.find(needle).expect("needle present");
        NumberToken {
            value: needle.parse().expect("numeric needle"),
            start,
            end: start + needle.len(),
            percent: false,
            decimal: false,
            operand: false,
            group_count: false,
        }
    }

    #[test]
    fn test_nearest_role_prefers_closest_keyword() {
        let text = "randomized into groups of **64** per arm, total N=128";
        assert_eq!(nearest_role(text, &tok_at(text, "64"), 80), Role::PerGroup);

        let text = "per group estimate was revised; the total is **128**";
        assert_eq!(nearest_role(text, &tok_at(text, "128"), 80), Role::Total);

        let text = "the answer is **64**";
        assert_eq!(nearest_role(text, &tok_at(text, "64"), 80), Role::Unknown);
    }

    #[test]
    fn test_window_respects_char_boundaries() {
        let text = "β≈ **64** ≈β power";
        let tok = tok_at(text, "64");
        assert_eq!(nearest_role(text, &tok, 4), Role::Unknown);
        assert!(!window_mentions(text, &tok, 4, &["power"]));
        assert!(window_mentions(text, &tok, 80, &["power"]));
    }
}
