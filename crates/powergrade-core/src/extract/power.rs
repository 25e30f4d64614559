//! Statistical power candidates.
//!
//! Power is reported either as a fraction (`0.82`) or as a percentage
//! (`82%`, `82 percent`). Percentages are normalized to fractions here so the
//! disambiguator only ever compares fractions against the oracle.

use std::sync::LazyLock;

use regex::Regex;

use super::scan::{numbers, rule, token, window_mentions, NumberToken};
use crate::config::ExtractionConfig;
use crate::domain::{Candidate, Role};

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i)\bpower\b\s*(?:\([^)\n]{0,15}\)\s*)?(?:(?:level|value|achieved|attained|obtained|estimate|would|will|comes?|out)\s+)*(?:=|≈|~|:|\\approx|\bis\b|\bof\b|\bbe\b|\bto\b|\bat\b)\s*{EMPH}?\s*{QUAL}{EMPH}?\s*{NUM}",
    )
});

/// `power for this design = 0.82`: free words between "power" and a symbolic
/// operator. The gap never crosses a digit, a sentence break or another
/// operator.
static GAP_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i)\bpower\b([^\n.0-9=≈~:\\()]{1,40}?)(?:=|≈|~|:|\\approx)\s*{EMPH}?\s*{QUAL}{EMPH}?\s*{NUM}",
    )
});

/// `power (80%)`
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| rule(r"(?i)\bpower\s*\(\s*{QUAL}{NUM}\s*%"));

/// Parameter names that, inside a gap, mean the number belongs to them.
const OTHER_PARAMETERS: &[&str] = &[
    "alpha", "α", "beta", "β", "significance", "effect", "d", "n", "sd", "sigma", "σ", "icc",
    "rho", "ρ", "correlation",
];

static PERCENT_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    rule(r"(?i){NUM}\s*(?:%|percent|per\s+cent)\s*{EMPH}?\s*(?:statistical\s+)?power\b")
});

static DECIMAL_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| rule(r"(?i){NUM}\s*{EMPH}?\s+(?:statistical\s+)?power\b"));

static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    rule(r"(?i){EMPH}\s*(?:power\s*(?:=|≈|:)\s*)?~?\s*{NUM}\s*%?\s*{EMPH}")
});

static BOXED: LazyLock<Regex> = LazyLock::new(|| rule(r"\\boxed\{[^\}0-9]*{NUM}"));

/// Whether a gap names something to assign besides power.
fn gap_is_free(gap: &str) -> bool {
    let words: Vec<String> = gap
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    !words.is_empty() && !words.iter().any(|w| OTHER_PARAMETERS.contains(&w.as_str()))
}

/// Fraction for a power token, or `None` when it cannot be a power value.
fn normalize(tok: &NumberToken) -> Option<f64> {
    if tok.operand {
        return None;
    }
    if tok.percent || tok.value > 1.0 {
        (tok.value > 50.0 && tok.value <= 100.0).then(|| tok.value / 100.0)
    } else {
        (tok.value >= 0.0).then_some(tok.value)
    }
}

pub(super) fn extract(text: &str, config: &ExtractionConfig) -> Vec<Candidate> {
    let mut out = Vec::new();

    let anchored: [(&Regex, &'static str); 3] = [
        (&*ASSIGNMENT, "power_assignment"),
        (&*PERCENT_BEFORE, "power_percent"),
        (&*PARENTHETICAL, "power_percent"),
    ];
    for (re, name) in anchored {
        out.extend(numbers(re, text, 1).filter_map(|tok| {
            normalize(&tok).map(|v| Candidate::new(v, Role::Unknown, tok.start, name))
        }));
    }

    // Loose gaps only count fractions and percentages, never bare integers.
    let gapped: Vec<Candidate> = GAP_ASSIGNMENT
        .captures_iter(text)
        .filter(|caps| caps.get(1).is_some_and(|gap| gap_is_free(gap.as_str())))
        .filter_map(|caps| caps.get(2).and_then(|m| token(text, m)))
        .filter(|tok| tok.decimal || tok.percent)
        .filter(|tok| !out.iter().any(|c: &Candidate| c.offset == tok.start))
        .filter_map(|tok| {
            normalize(&tok)
                .map(|v| Candidate::new(v, Role::Unknown, tok.start, "power_assignment"))
        })
        .collect();
    out.extend(gapped);

    out.extend(
        numbers(&DECIMAL_BEFORE, text, 1)
            .filter(|tok| tok.decimal && !tok.percent)
            .filter_map(|tok| {
                normalize(&tok)
                    .map(|v| Candidate::new(v, Role::Unknown, tok.start, "power_decimal"))
            }),
    );

    let emphasized: [(&Regex, &'static str); 2] = [(&*EMPHASIS, "emphasis"), (&*BOXED, "boxed")];
    for (re, name) in emphasized {
        out.extend(
            numbers(re, text, 1)
                .filter(|tok| window_mentions(text, tok, config.context_window, &["power"]))
                .filter_map(|tok| {
                    normalize(&tok).map(|v| Candidate::new(v, Role::Unknown, tok.start, name))
                }),
        );
    }

    out
}
