//! Sample-size cascade (per-group and total counts).
//!
//! Rules in priority order:
//! (a) counts followed by "per group/arm/cell/cluster", tagged per-group;
//! (b) counts introduced by "total/overall/combined", tagged total;
//! (c) emphasized counts, role taken from the nearest role keyword;
//! (d) counts after assignment language ("n =", "need", "require");
//! (e) every plausible standalone integer, only when (a)-(d) found nothing.

use std::sync::LazyLock;

use regex::Regex;

use super::scan::{nearest_role, numbers, rule, NumberToken};
use crate::config::ExtractionConfig;
use crate::domain::{Candidate, Role};

static PER_GROUP_AFTER: LazyLock<Regex> =
    LazyLock::new(|| rule(r"(?i){NUM}\s*{EMPH}?\s*(?:{NOUN}\s*)?{EMPH}?\s*{UNIT}"));

static PER_GROUP_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i)\b(?:per[\s-]+(?:group|arm|cell|cluster|condition)|each\s+(?:group|arm|cell|condition))\b\s*(?:\(\s*n\s*\)\s*)?(?:sample\s+size\s*)?(?:=|:|≈|~|\bof\b|\bis\b|\bwould\s+be\b|\bneeds?\b|\brequires?\b)\s*{EMPH}?\s*{QUAL}{EMPH}?\s*(?:n\s*=\s*)?{NUM}",
    )
});

static TOTAL_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i)\b(?:total|overall|combined|altogether)\b\s*(?:(?:sample\s+size|sample|enrollment|enrolment|number\s+of\s+{NOUN}|{NOUN}|n)\s*)?(?:\(\s*n\s*\)\s*)?(?:required\s+|needed\s+)?(?:=|:|≈|~|\bof\b|\bis\b|\bwould\s+be\b)?\s*{EMPH}?\s*{QUAL}{EMPH}?\s*(?:n\s*=\s*)?{NUM}",
    )
});

static TOTAL_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    rule(r"(?i){NUM}\s*{EMPH}?\s*(?:{NOUN}\s+)?(?:in\s+)?(?:total|overall|altogether|combined)\b")
});

/// `2 × 64 = 128`: the product of a group count and a per-group size.
static GROUP_PRODUCT: LazyLock<Regex> = LazyLock::new(|| {
    rule(r"(?i)(?:^|[^0-9.,])[2-9]\s*[×x*·]\s*[0-9][0-9,]*\s*=\s*{EMPH}?\s*{NUM}")
});

static CLUSTER_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    rule(r"(?i)\b(?:clusters?|sites?)\s*(?:per\s+(?:arm|group)\s*)?(?:=|:)\s*{EMPH}?\s*{NUM}")
});

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| rule(r"(?i){EMPH}\s*(?:n\s*=\s*)?~?\s*{NUM}\s*{EMPH}"));

static BOXED: LazyLock<Regex> = LazyLock::new(|| rule(r"\\boxed\{[^\}0-9]*{NUM}"));

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    rule(
        r"(?i)(?:\b(?:n|sample\s+size|total\s+n)\s*(?:\(\s*per\s+group\s*\)\s*)?(?:=|≈|:|~)|\b(?:needs?|needed|requires?|required|recommends?|recommended|enrol{1,2}|recruit|sample\s+size\s+(?:of|is|would\s+be))\b[^0-9\n.]{0,30}?)\s*{EMPH}?\s*{QUAL}{EMPH}?\s*{NUM}",
    )
});

static STANDALONE: LazyLock<Regex> = LazyLock::new(|| rule(r"{NUM}"));

pub(super) fn extract(text: &str, config: &ExtractionConfig) -> Vec<Candidate> {
    let accept = |tok: &NumberToken| {
        !tok.percent
            && !tok.operand
            && !tok.group_count
            && config.is_plausible_count(tok.value)
    };
    let mut out = Vec::new();

    let fixed: [(&Regex, Role, &'static str); 6] = [
        (&*PER_GROUP_AFTER, Role::PerGroup, "per_group_phrase"),
        (&*PER_GROUP_BEFORE, Role::PerGroup, "per_group_label"),
        (&*CLUSTER_ASSIGNMENT, Role::PerGroup, "cluster_assignment"),
        (&*TOTAL_BEFORE, Role::Total, "total_label"),
        (&*TOTAL_AFTER, Role::Total, "total_phrase"),
        (&*GROUP_PRODUCT, Role::Total, "group_product"),
    ];
    for (re, role, name) in fixed {
        out.extend(
            numbers(re, text, 1)
                .filter(|tok| accept(tok))
                .map(|tok| Candidate::new(tok.value, role, tok.start, name)),
        );
    }

    let contextual: [(&Regex, &'static str); 3] = [
        (&*EMPHASIS, "emphasis"),
        (&*BOXED, "boxed"),
        (&*ASSIGNMENT, "assignment"),
    ];
    for (re, name) in contextual {
        out.extend(numbers(re, text, 1).filter(|tok| accept(tok)).map(|tok| {
            let role = nearest_role(text, &tok, config.context_window);
            Candidate::new(tok.value, role, tok.start, name)
        }));
    }

    if out.is_empty() {
        out.extend(
            numbers(&STANDALONE, text, 1)
                .filter(|tok| {
                    accept(tok)
                        && !tok.decimal
                        && tok.value >= config.fallback_min as f64
                        && !config.is_noise(tok.value)
                })
                .map(|tok| Candidate::new(tok.value, Role::Unknown, tok.start, "standalone")),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Vec<Candidate> {
        extract(text, &ExtractionConfig::default())
    }

    fn has(cands: &[Candidate], value: f64, role: Role) -> bool {
        cands.iter().any(|c| c.value == value && c.role == role)
    }

    #[test]
    fn test_patterns_compile() {
        for re in [
            &PER_GROUP_AFTER,
            &PER_GROUP_BEFORE,
            &TOTAL_BEFORE,
            &TOTAL_AFTER,
            &GROUP_PRODUCT,
            &CLUSTER_ASSIGNMENT,
            &EMPHASIS,
            &BOXED,
            &ASSIGNMENT,
            &STANDALONE,
        ] {
            LazyLock::force(re);
        }
    }

    #[test]
    fn test_per_group_phrases() {
        let cands = run("You need **45** participants per group.");
        assert!(has(&cands, 45.0, Role::PerGroup));

        let cands = run("n = 64 per arm");
        assert!(has(&cands, 64.0, Role::PerGroup));

        let cands = run("Sample size per group: **86**");
        assert!(has(&cands, 86.0, Role::PerGroup));

        let cands = run("enroll 12 clusters per arm");
        assert!(has(&cands, 12.0, Role::PerGroup));
    }

    #[test]
    fn test_total_phrases() {
        let cands = run("The total sample size is 128.");
        assert!(has(&cands, 128.0, Role::Total));

        let cands = run("(64 per group, 128 participants in total)");
        assert!(has(&cands, 128.0, Role::Total));
        assert!(has(&cands, 64.0, Role::PerGroup));

        let cands = run("N = 2 × 64 = 128");
        assert!(has(&cands, 128.0, Role::Total));
        assert!(!cands.iter().any(|c| c.value == 2.0));
    }

    #[test]
    fn test_emphasis_role_from_context() {
        let cands = run("Final answer: **210**");
        assert!(has(&cands, 210.0, Role::Unknown));

        let cands = run("Overall you should plan for **210** subjects.");
        assert!(has(&cands, 210.0, Role::Total));

        let cands = run("\\boxed{n = 52}");
        assert!(has(&cands, 52.0, Role::Unknown));
    }

    #[test]
    fn test_assignment_language() {
        let cands = run("We would need at least 73 to be safe.");
        assert!(has(&cands, 73.0, Role::Unknown));

        let cands = run("So n = 2 × 36 gives us the design.");
        assert!(!cands.iter().any(|c| c.value == 2.0));
    }

    #[test]
    fn test_group_counts_are_not_sample_sizes() {
        let cands = run("We need 2 groups of 64");
        assert!(!cands.iter().any(|c| c.value == 2.0));
        assert!(has(&cands, 64.0, Role::Unknown));

        let cands = run("Recruit 3 treatment arms, 40 per arm");
        assert!(!cands.iter().any(|c| c.value == 3.0));
        assert!(has(&cands, 40.0, Role::PerGroup));
    }

    #[test]
    fn test_percentages_are_not_counts() {
        let cands = run("We require 90% power and a total of 95% coverage.");
        assert!(!cands.iter().any(|c| c.value == 90.0 || c.value == 95.0));
    }

    #[test]
    fn test_last_resort_only_when_nothing_tagged() {
        let cands = run("alpha 0.05, 80 percent, answer 5 or 37 or 2024");
        let values: Vec<f64> = cands.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![37.0, 2024.0]);
        assert!(cands.iter().all(|c| c.rule == "standalone"));

        let cands = run("need 40, maybe 300 or 500");
        assert!(cands.iter().all(|c| c.rule != "standalone"));
    }

    #[test]
    fn test_noise_literal_is_configurable() {
        let config = ExtractionConfig {
            noise_literals: vec![],
            ..ExtractionConfig::default()
        };
        let cands = extract("it is 80 here", &config);
        assert!(has(&cands, 80.0, Role::Unknown));
        assert!(run("it is 80 here").is_empty());
    }
}
