//! Answer-kind classification.
//!
//! Decides which ground-truth field a task is graded on by testing field
//! names in a fixed priority order: per-group fields, then totals, then
//! power, effect size, and event counts. Most tasks in the benchmark pose
//! per-group questions, so per-group fields win when a derived total is also
//! recorded. Power is only reachable when no sample-size field is populated.

use serde::Serialize;

use crate::config::ToleranceDefaults;
use crate::domain::{AnswerKind, GroundTruth, Tolerances};

pub const PER_GROUP_FIELDS: &[&str] = &[
    "sample_size_per_group",
    "subjects_per_group",
    "subjects_per_arm",
    "per_cell",
    "subjects_per_cluster",
    "patients_per_cluster",
];

pub const TOTAL_FIELDS: &[&str] = &[
    "sample_size",
    "total_sample_size",
    "total_subjects",
    "subjects",
];

pub const POWER_FIELDS: &[&str] = &["power"];

pub const EFFECT_SIZE_FIELDS: &[&str] = &["detectable_effect_d"];

pub const EVENT_FIELDS: &[&str] = &["events_needed", "events"];

const FIELD_PRIORITY: &[(AnswerKind, &[&str])] = &[
    (AnswerKind::PerGroup, PER_GROUP_FIELDS),
    (AnswerKind::Total, TOTAL_FIELDS),
    (AnswerKind::Power, POWER_FIELDS),
    (AnswerKind::EffectSize, EFFECT_SIZE_FIELDS),
    (AnswerKind::Events, EVENT_FIELDS),
];

/// The quantity a task is graded on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub kind: AnswerKind,
    pub oracle: f64,
    pub field: &'static str,
}

/// Classify a ground-truth record. `None` means no recognized field holds a
/// numeric value, which is a data-integrity failure for that task.
pub fn classify(ground_truth: &GroundTruth) -> Option<Classification> {
    FIELD_PRIORITY.iter().find_map(|(kind, fields)| {
        fields.iter().find_map(|&field| {
            ground_truth.number(field).map(|oracle| Classification {
                kind: *kind,
                oracle,
                field,
            })
        })
    })
}

/// Tolerance for `kind`, from the task's record or the configured default.
pub fn resolve_tolerance(
    kind: AnswerKind,
    tolerances: &Tolerances,
    defaults: &ToleranceDefaults,
) -> f64 {
    match kind {
        AnswerKind::Power => tolerances.first_of(&["power"]).unwrap_or(defaults.power),
        AnswerKind::EffectSize => tolerances
            .first_of(&["effect_size"])
            .unwrap_or(defaults.effect_size),
        AnswerKind::Events => tolerances
            .first_of(&["events", "sample_size"])
            .unwrap_or(defaults.events),
        AnswerKind::PerGroup | AnswerKind::Total => tolerances
            .first_of(&["sample_size", "subjects", "clusters"])
            .unwrap_or(defaults.sample_size),
    }
}
