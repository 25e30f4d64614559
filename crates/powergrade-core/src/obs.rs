//! Structured observability hooks for batch grading.
//!
//! This module provides:
//! - Task-scoped tracing spans via the `TaskSpan` RAII guard
//! - Emission functions for batch lifecycle events: start, task graded,
//!   task skipped, finish
//!
//! Events are emitted at `info!` level, skips at `warn!`. Filtering follows
//! `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{info, warn};

use crate::domain::{AnswerKind, TaskFailure};
use crate::grade::Verdict;

/// RAII guard that enters a task-scoped span while one task is graded.
///
/// ```ignore
/// let _span = TaskSpan::enter("t2-ancova-03");
/// // tracing calls here carry task_id = "t2-ancova-03"
/// ```
pub struct TaskSpan {
    _span: tracing::span::EnteredSpan,
}

impl TaskSpan {
    pub fn enter(task_id: &str) -> Self {
        let span = tracing::info_span!("powergrade.task", task_id = %task_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_batch_started(total_tasks: usize) {
    info!(event = "batch.started", total_tasks = total_tasks);
}

/// Emit event: a task was graded.
pub fn emit_task_graded(
    task_id: &str,
    kind: AnswerKind,
    extracted: Option<f64>,
    oracle: f64,
    verdict: Verdict,
) {
    info!(
        event = "task.graded",
        task_id = %task_id,
        kind = %kind,
        extracted = ?extracted,
        oracle = oracle,
        verdict = %verdict,
    );
}

/// Emit event: a task was excluded from grading (warning level).
pub fn emit_task_skipped(task_id: &str, failure: &TaskFailure) {
    warn!(event = "task.skipped", task_id = %task_id, reason = %failure);
}

/// Emit event: batch finished with its pass rate.
pub fn emit_batch_finished(total: usize, passed: usize, failed: usize, pass_rate: f64) {
    info!(
        event = "batch.finished",
        total = total,
        passed = passed,
        failed = failed,
        pass_rate = pass_rate,
    );
}
