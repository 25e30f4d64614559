//! Minimum detectable effect size candidates.

use std::sync::LazyLock;

use regex::Regex;

use super::scan::{numbers, rule, window_mentions, NumberToken};
use crate::config::ExtractionConfig;
use crate::domain::{Candidate, Role};

const EFFECT_WORDS: &[&str] = &["effect", "detectable", "cohen", "mde", "d =", "d="];

static DETECTABLE: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i)\bdetectable\b[^\n]{0,60}?(?:=|≈|~|:|\\approx|\bis\b|\bof\b)\s*{EMPH}?\s*{QUAL}{EMPH}?\s*(?:d\s*=\s*)?{NUM}",
    )
});

static D_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    rule(r"(?i)(?:cohen'?s\s+)?\bd\s*(?:=|≈|~|:|\\approx)\s*{EMPH}?\s*{QUAL}{EMPH}?\s*{NUM}")
});

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i)\b(?:mdes?|minimum\s+detectable\s+effect(?:\s+size)?|effect\s+size)\b\s*(?:\([^)\n]{0,12}\)\s*)?(?:=|≈|~|:|\\approx|\bis\b|\bof\b|\bwould\s+be\b)\s*{EMPH}?\s*{QUAL}{EMPH}?\s*(?:d\s*=\s*)?{NUM}",
    )
});

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| rule(r"(?i){EMPH}\s*(?:d\s*=\s*)?~?\s*{NUM}\s*{EMPH}"));

static BOXED: LazyLock<Regex> = LazyLock::new(|| rule(r"\\boxed\{[^\}0-9]*{NUM}"));

pub(super) fn extract(text: &str, config: &ExtractionConfig) -> Vec<Candidate> {
    let accept = |tok: &NumberToken| {
        !tok.percent && !tok.operand && tok.value > 0.0 && tok.value <= config.max_effect_size
    };
    let mut out = Vec::new();

    let anchored: [(&Regex, &'static str); 3] = [
        (&*DETECTABLE, "detectable"),
        (&*D_ASSIGNMENT, "d_assignment"),
        (&*LABEL, "effect_label"),
    ];
    for (re, name) in anchored {
        out.extend(
            numbers(re, text, 1)
                .filter(|tok| accept(tok))
                .map(|tok| Candidate::new(tok.value, Role::Unknown, tok.start, name)),
        );
    }

    let emphasized: [(&Regex, &'static str); 2] = [(&*EMPHASIS, "emphasis"), (&*BOXED, "boxed")];
    for (re, name) in emphasized {
        out.extend(
            numbers(re, text, 1)
                .filter(|tok| {
                    accept(tok) && window_mentions(text, tok, config.context_window, EFFECT_WORDS)
                })
                .map(|tok| Candidate::new(tok.value, Role::Unknown, tok.start, name)),
        );
    }

    out
}
