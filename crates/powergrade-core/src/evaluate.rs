//! Grade a results file that was produced elsewhere.
//!
//! Skips extraction entirely: each submitted value is classified against its
//! task's ground truth and graded with the same tolerance rules as a batch
//! run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::{classify, resolve_tolerance};
use crate::config::ToleranceDefaults;
use crate::domain::{AnswerKind, PowerGradeError, Result, TaskSet};
use crate::grade::grade;
use crate::runner::TaskStatus;

/// Submitted values keyed by task id. `None` marks an entry with no usable
/// number.
pub type SubmittedResults = BTreeMap<String, Option<f64>>;

/// Parse a results mapping. Values may be numbers or objects carrying a
/// numeric `value` (with an optional `unit`).
pub fn parse_results(raw: Value) -> Result<SubmittedResults> {
    let Value::Object(entries) = raw else {
        return Err(PowerGradeError::InvalidResults {
            path: Default::default(),
            reason: "results must be an object keyed by task id".to_string(),
        });
    };
    Ok(entries
        .into_iter()
        .map(|(id, value)| {
            let number = match &value {
                Value::Object(obj) => obj.get("value").and_then(Value::as_f64),
                other => other.as_f64(),
            };
            (id, number)
        })
        .collect())
}

pub fn load_results(path: &Path) -> Result<SubmittedResults> {
    let content = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&content)?;
    parse_results(raw).map_err(|e| match e {
        PowerGradeError::InvalidResults { reason, .. } => {
            PowerGradeError::InvalidResults {
                path: path.to_path_buf(),
                reason,
            }
        }
        other => other,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnswerKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    pub submitted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
    /// `difference / |oracle| * 100`, undefined for a zero oracle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_error: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierTally {
    pub total: usize,
    pub passed: usize,
}

impl TierTally {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub outcomes: Vec<EvaluationOutcome>,
    pub passed: usize,
    pub failed: usize,
    /// Graded tasks with no submitted value.
    pub missing_value: usize,
    pub unclassifiable: usize,
    pub by_tier: BTreeMap<String, TierTally>,
    pub mean_percent_error: Option<f64>,
}

/// Grade `submitted` against every task in `tasks`.
pub fn evaluate(
    tasks: &TaskSet,
    submitted: &SubmittedResults,
    defaults: &ToleranceDefaults,
) -> EvaluationReport {
    let mut report = EvaluationReport::default();
    let mut percent_errors = Vec::new();

    for task in tasks.iter() {
        let tier = task.tier_label();
        let submitted_value = submitted.get(&task.id).copied().flatten();

        let Some(classification) = classify(&task.ground_truth) else {
            report.unclassifiable += 1;
            report.outcomes.push(EvaluationOutcome {
                task_id: task.id.clone(),
                status: TaskStatus::Unclassifiable,
                tier,
                kind: None,
                oracle: None,
                tolerance: None,
                submitted: submitted_value,
                difference: None,
                percent_error: None,
            });
            continue;
        };

        let tolerance = resolve_tolerance(classification.kind, &task.tolerance, defaults);
        let graded = grade(submitted_value, classification.oracle, tolerance);
        let status = TaskStatus::from(graded.verdict);
        let percent_error = graded
            .difference
            .filter(|_| classification.oracle != 0.0)
            .map(|d| d / classification.oracle.abs() * 100.0);

        match status {
            TaskStatus::Pass => report.passed += 1,
            TaskStatus::Fail => report.failed += 1,
            _ => report.missing_value += 1,
        }
        if let Some(tier) = &tier {
            let tally = report.by_tier.entry(tier.clone()).or_default();
            tally.total += 1;
            if status == TaskStatus::Pass {
                tally.passed += 1;
            }
        }
        percent_errors.extend(percent_error);

        report.outcomes.push(EvaluationOutcome {
            task_id: task.id.clone(),
            status,
            tier,
            kind: Some(classification.kind),
            oracle: Some(classification.oracle),
            tolerance: Some(tolerance),
            submitted: submitted_value,
            difference: graded.difference,
            percent_error,
        });
    }

    if !percent_errors.is_empty() {
        report.mean_percent_error =
            Some(percent_errors.iter().sum::<f64>() / percent_errors.len() as f64);
    }
    tracing::info!(
        event = "evaluate.finished",
        passed = report.passed,
        failed = report.failed,
        missing_value = report.missing_value,
    );
    report
}

/// Render the evaluation as console text.
pub fn render_evaluation(report: &EvaluationReport) -> String {
    let graded = report.passed + report.failed + report.missing_value;
    let mut out = format!(
        "=== EVALUATION ===\nPassed: {}/{}\nFailed: {}\nMissing value: {}\nNo expected field: {}\n",
        report.passed, graded, report.failed, report.missing_value, report.unclassifiable,
    );
    if let Some(mpe) = report.mean_percent_error {
        out.push_str(&format!("Mean percent error: {mpe:.1}%\n"));
    }
    if !report.by_tier.is_empty() {
        out.push_str("\n=== BY TIER ===\n");
        for (tier, tally) in &report.by_tier {
            out.push_str(&format!(
                "  {}: {}/{} ({:.1}%)\n",
                tier,
                tally.passed,
                tally.total,
                tally.pass_rate() * 100.0
            ));
        }
    }
    out
}
