//! Batch runner: grade every task in a repository against its raw response.
//!
//! Per task: fetch the response, classify the ground truth, resolve the
//! tolerance, extract candidates, disambiguate, optionally consult the
//! fallback, grade. A task that cannot be graded is recorded with its
//! [`TaskFailure`] and the batch moves on; the runner itself never fails.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::classify::{classify, resolve_tolerance, Classification};
use crate::config::GraderConfig;
use crate::disambiguate::resolve;
use crate::domain::{AnswerKind, Candidate, Task, TaskFailure, TaskSet};
use crate::extract::extract;
use crate::fallback::AnswerFallback;
use crate::grade::{grade, Verdict};
use crate::obs::{self, TaskSpan};
use crate::source::ResponseSource;

/// Final status of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pass,
    Fail,
    NoExtract,
    MissingInput,
    Unclassifiable,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::NoExtract => "NO_EXTRACT",
            Self::MissingInput => "MISSING_INPUT",
            Self::Unclassifiable => "NO_FIELD",
        }
    }

    /// Whether the task was graded at all and belongs in the results mapping.
    pub fn is_graded(&self) -> bool {
        matches!(self, Self::Pass | Self::Fail | Self::NoExtract)
    }
}

impl From<Verdict> for TaskStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => Self::Pass,
            Verdict::Fail => Self::Fail,
            Verdict::NoExtract => Self::NoExtract,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the extracted value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Cascade,
    Fallback,
}

/// Everything known about one task after grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnswerKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub extracted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<TaskFailure>,
}

impl TaskOutcome {
    fn skipped(task_id: &str, status: TaskStatus, failure: TaskFailure) -> Self {
        Self {
            task_id: task_id.to_string(),
            status,
            kind: None,
            field: None,
            oracle: None,
            tolerance: None,
            extracted: None,
            difference: None,
            method: None,
            failure: Some(failure),
        }
    }

    /// One human-readable verdict line.
    pub fn log_line(&self) -> String {
        let mut line = format!("{}: ", self.task_id);
        match (self.status, self.extracted, self.oracle) {
            (TaskStatus::Pass | TaskStatus::Fail, Some(value), Some(oracle)) => {
                let _ = write!(
                    line,
                    "extracted={value}, expected={oracle}, diff={:.2}, tol={}, {}",
                    self.difference.unwrap_or_default(),
                    self.tolerance.unwrap_or_default(),
                    self.status
                );
            }
            (TaskStatus::NoExtract, _, Some(oracle)) => {
                let _ = write!(line, "NO_EXTRACT (expected={oracle})");
            }
            (TaskStatus::MissingInput, ..) => line.push_str("MISSING_INPUT"),
            (TaskStatus::Unclassifiable, ..) => line.push_str("no expected field in ground truth"),
            _ => line.push_str(self.status.as_str()),
        }
        if self.method == Some(Method::Fallback) {
            line.push_str(" [fallback]");
        }
        line
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub extracted: usize,
    pub passed: usize,
    pub failed: usize,
    pub no_extract: usize,
    pub missing_input: usize,
    pub unclassifiable: usize,
    /// `passed / total`, 0 for an empty batch.
    pub pass_rate: f64,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[TaskOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                TaskStatus::Pass => summary.passed += 1,
                TaskStatus::Fail => summary.failed += 1,
                TaskStatus::NoExtract => summary.no_extract += 1,
                TaskStatus::MissingInput => summary.missing_input += 1,
                TaskStatus::Unclassifiable => summary.unclassifiable += 1,
            }
            if outcome.extracted.is_some() {
                summary.extracted += 1;
            }
        }
        if summary.total > 0 {
            summary.pass_rate = summary.passed as f64 / summary.total as f64;
        }
        summary
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// Per-task outcomes in task id order.
    pub outcomes: Vec<TaskOutcome>,
    /// Task id to extracted value; `null` when extraction failed. Tasks with
    /// missing input or no classifiable field are absent.
    pub results: BTreeMap<String, Value>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn non_passing(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status != TaskStatus::Pass)
    }
}

/// JSON value for the results mapping: integers for count kinds.
pub fn result_value(kind: AnswerKind, value: f64) -> Value {
    if kind.is_count() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Grades a task set against a response source.
pub struct BatchRunner<'a> {
    source: &'a dyn ResponseSource,
    config: &'a GraderConfig,
    fallback: Option<&'a dyn AnswerFallback>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(source: &'a dyn ResponseSource, config: &'a GraderConfig) -> Self {
        Self {
            source,
            config,
            fallback: None,
        }
    }

    /// Consult `fallback` for tasks where the cascade finds no candidate.
    pub fn with_fallback(mut self, fallback: &'a dyn AnswerFallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn run(&self, tasks: &TaskSet) -> BatchReport {
        obs::emit_batch_started(tasks.len());

        let mut outcomes = Vec::with_capacity(tasks.len());
        let mut results = BTreeMap::new();
        for task in tasks.iter() {
            let outcome = self.grade_task(task);
            if outcome.status.is_graded() {
                let value = match (outcome.kind, outcome.extracted) {
                    (Some(kind), Some(v)) => result_value(kind, v),
                    _ => Value::Null,
                };
                results.insert(outcome.task_id.clone(), value);
            }
            outcomes.push(outcome);
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        obs::emit_batch_finished(
            summary.total,
            summary.passed,
            summary.failed,
            summary.pass_rate,
        );
        BatchReport {
            outcomes,
            results,
            summary,
        }
    }

    /// Grade a single task.
    pub fn grade_task(&self, task: &Task) -> TaskOutcome {
        let _span = TaskSpan::enter(&task.id);

        let text = match self.source.fetch(&task.id) {
            Ok(Some(text)) => text,
            Ok(None) => {
                return self.skip(task, TaskStatus::MissingInput, "no raw response recorded".into())
            }
            Err(e) => return self.skip(task, TaskStatus::MissingInput, e.to_string()),
        };

        let Some(classification) = classify(&task.ground_truth) else {
            let failure = TaskFailure::UnclassifiableTask;
            obs::emit_task_skipped(&task.id, &failure);
            return TaskOutcome::skipped(&task.id, TaskStatus::Unclassifiable, failure);
        };
        let kind = classification.kind;
        let tolerance = resolve_tolerance(kind, &task.tolerance, &self.config.tolerance);

        let candidates = extract(&text, kind, &self.config.extraction);
        debug!(kind = %kind, candidates = candidates.len(), "extracted candidates");

        let mut method = None;
        let mut extracted = resolve(&candidates, kind.desired_role(), classification.oracle)
            .map(|c| c.value);
        if extracted.is_some() {
            method = Some(Method::Cascade);
        } else if let Some(fallback) = self.fallback {
            extracted = fallback.extract(&text, classification.field, kind);
            if extracted.is_some() {
                method = Some(Method::Fallback);
            }
        }
        if kind.is_count() {
            extracted = extracted.map(f64::round);
        }

        let graded = grade(extracted, classification.oracle, tolerance);
        obs::emit_task_graded(&task.id, kind, extracted, classification.oracle, graded.verdict);

        let failure = match (graded.verdict, graded.difference) {
            (Verdict::NoExtract, _) => Some(TaskFailure::NoCandidateFound { kind }),
            (Verdict::Fail, Some(difference)) => Some(TaskFailure::ToleranceExceeded {
                difference,
                tolerance,
            }),
            _ => None,
        };

        TaskOutcome {
            task_id: task.id.clone(),
            status: graded.verdict.into(),
            kind: Some(kind),
            field: Some(classification.field.to_string()),
            oracle: Some(classification.oracle),
            tolerance: Some(tolerance),
            extracted,
            difference: graded.difference,
            method,
            failure,
        }
    }

    fn skip(&self, task: &Task, status: TaskStatus, reason: String) -> TaskOutcome {
        let failure = TaskFailure::MissingInput { reason };
        obs::emit_task_skipped(&task.id, &failure);
        TaskOutcome::skipped(&task.id, status, failure)
    }
}

/// Intermediate state of the cascade for one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub task_id: String,
    pub classification: Option<Classification>,
    pub tolerance: Option<f64>,
    pub candidates: Vec<Candidate>,
    pub chosen: Option<Candidate>,
}

/// Run classification, extraction and disambiguation on one response without
/// grading it.
pub fn inspect(task: &Task, text: &str, config: &GraderConfig) -> Inspection {
    let Some(classification) = classify(&task.ground_truth) else {
        return Inspection {
            task_id: task.id.clone(),
            classification: None,
            tolerance: None,
            candidates: Vec::new(),
            chosen: None,
        };
    };
    let kind = classification.kind;
    let candidates = extract(text, kind, &config.extraction);
    let chosen = resolve(&candidates, kind.desired_role(), classification.oracle).cloned();
    Inspection {
        task_id: task.id.clone(),
        tolerance: Some(resolve_tolerance(kind, &task.tolerance, &config.tolerance)),
        classification: Some(classification),
        candidates,
        chosen,
    }
}
