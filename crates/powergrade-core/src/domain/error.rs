//! Error taxonomy for powergrade.
//!
//! [`PowerGradeError`] covers the fatal paths (the task repository or the
//! response store cannot be loaded at all). [`TaskFailure`] covers the
//! per-task outcomes that are logged and skipped without stopping a batch.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::answer::AnswerKind;

/// powergrade library errors.
#[derive(Debug, thiserror::Error)]
pub enum PowerGradeError {
    #[error("invalid task repository {path:?}: {reason}")]
    InvalidTaskRepository { path: PathBuf, reason: String },

    #[error("invalid results file {path:?}: {reason}")]
    InvalidResults { path: PathBuf, reason: String },

    #[error("response store unavailable: {0:?} is not a directory")]
    ResponseStoreUnavailable(PathBuf),

    #[error("invalid task id for response lookup: {0:?}")]
    InvalidTaskId(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for powergrade library operations.
pub type Result<T> = std::result::Result<T, PowerGradeError>;

/// Why a single task did not pass.
///
/// All variants are recoverable at the batch level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskFailure {
    /// No raw response could be read for the task id.
    #[error("missing input: {reason}")]
    MissingInput { reason: String },

    /// The ground truth has none of the recognized answer fields.
    #[error("unclassifiable task: no recognized ground-truth field")]
    UnclassifiableTask,

    /// The extractor found no candidate in any fallback tier.
    #[error("no {kind} candidate found in response")]
    NoCandidateFound { kind: AnswerKind },

    /// A value was extracted but lies outside the tolerance.
    #[error("difference {difference} exceeds tolerance ±{tolerance}")]
    ToleranceExceeded { difference: f64, tolerance: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_grade_error_display() {
        let err = PowerGradeError::ResponseStoreUnavailable(PathBuf::from("results/raw"));
        assert!(err.to_string().contains("response store unavailable"));
        assert!(err.to_string().contains("results/raw"));

        let err = PowerGradeError::InvalidTaskRepository {
            path: PathBuf::from("all_tasks.json"),
            reason: "expected an array".to_string(),
        };
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn test_task_failure_display() {
        let err = TaskFailure::NoCandidateFound {
            kind: AnswerKind::PerGroup,
        };
        assert_eq!(err.to_string(), "no per_group candidate found in response");

        let err = TaskFailure::ToleranceExceeded {
            difference: 12.0,
            tolerance: 5.0,
        };
        assert!(err.to_string().contains("±5"));
    }

    #[test]
    fn test_task_failure_serializes_with_type_tag() {
        let raw = serde_json::to_value(TaskFailure::MissingInput {
            reason: "no raw response".to_string(),
        })
        .expect("serialize");
        assert_eq!(raw["type"], "missing_input");
        assert_eq!(raw["reason"], "no raw response");
    }
}
