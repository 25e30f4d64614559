//! Answer kinds, contextual roles, and extraction candidates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The semantic kind of number a task asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Sample size per group, arm, cell, or cluster.
    PerGroup,
    /// Total sample size across all groups.
    Total,
    /// Statistical power as a fraction in [0, 1].
    Power,
    /// Minimum detectable effect size.
    EffectSize,
    /// Required number of events.
    Events,
}

impl AnswerKind {
    pub const ALL: [AnswerKind; 5] = [
        AnswerKind::PerGroup,
        AnswerKind::Total,
        AnswerKind::Power,
        AnswerKind::EffectSize,
        AnswerKind::Events,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerGroup => "per_group",
            Self::Total => "total",
            Self::Power => "power",
            Self::EffectSize => "effect_size",
            Self::Events => "events",
        }
    }

    /// The role a candidate must carry to win the first disambiguation tier.
    pub fn desired_role(&self) -> Role {
        match self {
            Self::PerGroup => Role::PerGroup,
            Self::Total => Role::Total,
            Self::Power | Self::EffectSize | Self::Events => Role::Unknown,
        }
    }

    /// Whether answers of this kind are whole-number counts.
    pub fn is_count(&self) -> bool {
        matches!(self, Self::PerGroup | Self::Total | Self::Events)
    }

    /// Whether this kind belongs to the sample-size family.
    pub fn is_sample_size(&self) -> bool {
        matches!(self, Self::PerGroup | Self::Total)
    }
}

impl fmt::Display for AnswerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contextual role of a matched number, inferred from surrounding text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PerGroup,
    Total,
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerGroup => "per_group",
            Self::Total => "total",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A number found in response text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Parsed value, already normalized (percent power divided by 100).
    pub value: f64,
    /// Inferred contextual role.
    pub role: Role,
    /// Byte offset of the number in the source text.
    pub offset: usize,
    /// Name of the pattern rule that produced the candidate.
    pub rule: &'static str,
}

impl Candidate {
    pub fn new(value: f64, role: Role, offset: usize, rule: &'static str) -> Self {
        Self {
            value,
            role,
            offset,
            rule,
        }
    }
}
