//! Observability tests for batch lifecycle tracing.
//!
//! These tests verify that structured tracing events are emitted without
//! panicking for the batch lifecycle: start, task graded, task skipped, finish.

use powergrade_core::obs::{
    emit_batch_finished, emit_batch_started, emit_task_graded, emit_task_skipped, TaskSpan,
};
use powergrade_core::{
    AnswerKind, BatchRunner, GraderConfig, GroundTruth, MemoryResponseStore, Task, TaskFailure,
    TaskSet, Tolerances, Verdict,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_batch_started() {
    emit_batch_started(42);
}

#[traced_test]
#[test]
fn test_emit_task_graded_without_value() {
    emit_task_graded("t1-a", AnswerKind::PerGroup, None, 64.0, Verdict::NoExtract);
}

#[traced_test]
#[test]
fn test_emit_task_skipped_logs_warning() {
    emit_task_skipped(
        "t4-missing",
        &TaskFailure::MissingInput {
            reason: "no raw response recorded".to_string(),
        },
    );
}

#[traced_test]
#[test]
fn test_emit_batch_finished() {
    emit_batch_finished(10, 7, 2, 0.7);
}

#[traced_test]
#[test]
fn test_task_span_enter_creates_span() {
    let span = TaskSpan::enter("t2-span");
    drop(span);
}

#[traced_test]
#[test]
fn test_batch_run_under_subscriber() {
    let tasks = TaskSet::new(vec![Task::new(
        "t1",
        GroundTruth::default().with("subjects_per_arm", 30),
        Tolerances::default(),
    )]);
    let store = MemoryResponseStore::new().with("t1", "30 subjects per arm");
    let report = BatchRunner::new(&store, &GraderConfig::default()).run(&tasks);
    assert_eq!(report.summary.passed, 1);
}
