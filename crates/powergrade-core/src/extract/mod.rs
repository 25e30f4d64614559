//! Candidate extraction.
//!
//! Each answer kind has its own rule cascade. Every rule scans the whole text
//! and the outputs are unioned; a number matched by several rules at the same
//! offset with the same role collapses to one candidate, keeping the name of
//! the first rule that produced it.
//!
//! Extraction is a pure function of the text, the kind, and the
//! [`ExtractionConfig`].

mod effect;
mod events;
mod power;
mod sample_size;
mod scan;

use crate::config::ExtractionConfig;
use crate::domain::{AnswerKind, Candidate};

/// Extract every candidate number for `kind` from `text`, ordered by offset.
pub fn extract(text: &str, kind: AnswerKind, config: &ExtractionConfig) -> Vec<Candidate> {
    let mut candidates = match kind {
        AnswerKind::PerGroup | AnswerKind::Total => sample_size::extract(text, config),
        AnswerKind::Power => power::extract(text, config),
        AnswerKind::EffectSize => effect::extract(text, config),
        AnswerKind::Events => events::extract(text, config),
    };

    // Stable sort: rule priority order survives among equal keys.
    candidates.sort_by(|a, b| {
        a.offset
            .cmp(&b.offset)
            .then(a.role.cmp(&b.role))
            .then(a.value.total_cmp(&b.value))
    });
    candidates.dedup_by(|a, b| a.offset == b.offset && a.role == b.role && a.value == b.value);

    for c in &candidates {
        tracing::trace!(
            kind = %kind,
            value = c.value,
            role = %c.role,
            offset = c.offset,
            rule = c.rule,
            "candidate"
        );
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn test_duplicates_collapse_to_first_rule() {
        let config = ExtractionConfig::default();
        let cands = extract("\\boxed{n = 52}", AnswerKind::PerGroup, &config);
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].value, 52.0);
        assert_eq!(cands[0].rule, "boxed");
    }

    #[test]
    fn test_ordered_by_offset() {
        let config = ExtractionConfig::default();
        let text = "Total N = 128, which is 64 per group.";
        let cands = extract(text, AnswerKind::PerGroup, &config);
        let offsets: Vec<usize> = cands.iter().map(|c| c.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
        assert!(cands.iter().any(|c| c.value == 64.0 && c.role == Role::PerGroup));
        assert!(cands.iter().any(|c| c.value == 128.0 && c.role == Role::Total));
    }

    #[test]
    fn test_idempotent() {
        let config = ExtractionConfig::default();
        let text = "We need **45** participants per group (90 total) for 80% power.";
        for kind in AnswerKind::ALL {
            assert_eq!(
                extract(text, kind, &config),
                extract(text, kind, &config),
                "{kind}"
            );
        }
    }

    #[test]
    fn test_dispatch_by_kind() {
        let config = ExtractionConfig::default();
        let text = "Power = 0.84 with 64 per group.";
        let power = extract(text, AnswerKind::Power, &config);
        assert_eq!(power.iter().map(|c| c.value).collect::<Vec<_>>(), vec![0.84]);
        let per_group = extract(text, AnswerKind::PerGroup, &config);
        assert!(per_group.iter().all(|c| c.value == 64.0));
    }
}
