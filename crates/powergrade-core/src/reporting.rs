use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::runner::{BatchReport, BatchSummary, Inspection, TaskOutcome, TaskStatus};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Machine-readable batch report persisted next to the results mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub outcomes: Vec<TaskOutcome>,
}

impl BatchReportArtifact {
    pub fn from_report(report: &BatchReport, generated_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at,
            summary: report.summary.clone(),
            outcomes: report.outcomes.clone(),
        }
    }

    /// Artifact stamped with the current time.
    pub fn now(report: &BatchReport) -> Self {
        Self::from_report(report, Utc::now())
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(value).with_context(|| format!("serialize {what}"))?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write the results mapping (task id to extracted value) as pretty JSON.
pub fn write_results_json(path: &Path, results: &BTreeMap<String, Value>) -> Result<()> {
    write_pretty(path, results, "results mapping")
}

/// Write the full batch report as pretty JSON.
pub fn write_batch_report_json(path: &Path, artifact: &BatchReportArtifact) -> Result<()> {
    write_pretty(path, artifact, "batch report")
}

/// Render the console summary: aggregate counts and the non-passing tasks.
pub fn render_summary(report: &BatchReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    out.push_str("=== EXTRACTION SUMMARY ===\n");
    out.push_str(&format!(
        "Extracted: {}/{}\nPassed: {}/{} ({:.1}%)\nFailed (wrong answer): {}\nNo extract: {}\nMissing response: {}\nNo expected field: {}\n",
        s.extracted,
        s.total,
        s.passed,
        s.total,
        s.pass_rate * 100.0,
        s.failed,
        s.no_extract,
        s.missing_input,
        s.unclassifiable,
    ));

    let failures: Vec<&TaskOutcome> = report.non_passing().collect();
    out.push_str(&format!("\n=== NON-PASS ({}) ===\n", failures.len()));
    for o in failures {
        let want = o.oracle.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
        match (o.status, o.extracted) {
            (TaskStatus::Fail, Some(got)) => out.push_str(&format!(
                "  {}: got={}, want={}, diff={:.2}, tol=±{}, FAIL\n",
                o.task_id,
                got,
                want,
                o.difference.unwrap_or_default(),
                o.tolerance.unwrap_or_default(),
            )),
            _ => out.push_str(&format!("  {}: {} (want={})\n", o.task_id, o.status, want)),
        }
    }
    out
}

/// Render the per-task verdict log, one line per task.
pub fn render_log(report: &BatchReport) -> String {
    let total = report.outcomes.len();
    report
        .outcomes
        .iter()
        .enumerate()
        .map(|(i, o)| format!("[{}/{}] {}\n", i + 1, total, o.log_line()))
        .collect()
}

/// Render an [`Inspection`]: classification, every candidate, and the choice.
pub fn render_inspection(inspection: &Inspection) -> String {
    let mut out = format!("task: {}\n", inspection.task_id);
    let Some(c) = &inspection.classification else {
        out.push_str("no recognized ground-truth field\n");
        return out;
    };
    out.push_str(&format!(
        "kind: {} (field {}, oracle {}, tolerance ±{})\n",
        c.kind,
        c.field,
        c.oracle,
        inspection.tolerance.unwrap_or_default()
    ));
    out.push_str(&format!("candidates ({}):\n", inspection.candidates.len()));
    for cand in &inspection.candidates {
        let marker = if inspection.chosen.as_ref() == Some(cand) { "*" } else { " " };
        out.push_str(&format!(
            " {} {:>10} {:<9} @{:<6} {}\n",
            marker,
            cand.value,
            cand.role.as_str(),
            cand.offset,
            cand.rule
        ));
    }
    match &inspection.chosen {
        Some(cand) => out.push_str(&format!("chosen: {}\n", cand.value)),
        None => out.push_str("chosen: none\n"),
    }
    out
}
