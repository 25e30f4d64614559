//! Required event counts (survival and time-to-event designs).

use std::sync::LazyLock;

use regex::Regex;

use super::scan::{numbers, rule, window_mentions, NumberToken};
use crate::config::ExtractionConfig;
use crate::domain::{Candidate, Role};

static COUNT: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i){NUM}\s*{EMPH}?\s*(?:(?:total|primary|observed|required|outcome|death|deaths)\s+)?events?\b",
    )
});

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i)\b(?:number\s+of\s+)?events?\b\s*(?:needed|required|necessary)?\s*(?:=|:|≈|~|\bis\b|\bof\b|\bwould\s+be\b)\s*{EMPH}?\s*{QUAL}{EMPH}?\s*{NUM}",
    )
});

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| rule(r"(?i){EMPH}\s*~?\s*{NUM}\s*{EMPH}"));

static BOXED: LazyLock<Regex> = LazyLock::new(|| rule(r"\\boxed\{[^\}0-9]*{NUM}"));

pub(super) fn extract(text: &str, config: &ExtractionConfig) -> Vec<Candidate> {
    let accept = |tok: &NumberToken| {
        !tok.percent && !tok.operand && !tok.decimal && config.is_plausible_count(tok.value)
    };
    let mut out = Vec::new();

    let anchored: [(&Regex, &'static str); 2] =
        [(&*COUNT, "event_count"), (&*ASSIGNMENT, "event_assignment")];
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
                    accept(tok) && window_mentions(text, tok, config.context_window, &["event"])
                })
                .map(|tok| Candidate::new(tok.value, Role::Unknown, tok.start, name)),
        );
    }

    out
}
