//! powergrade core library
//!
//! Extraction, disambiguation and grading of numeric answers in free-form
//! model responses to power-analysis questions.

pub mod classify;
pub mod config;
pub mod disambiguate;
pub mod domain;
pub mod evaluate;
pub mod extract;
pub mod fallback;
pub mod grade;
pub mod obs;
pub mod reporting;
pub mod runner;
pub mod source;
pub mod telemetry;

pub use classify::{classify, resolve_tolerance, Classification};
pub use config::{
    ExtractionConfig, FallbackConfig, GraderConfig, PathsConfig, ToleranceDefaults,
    DEFAULT_CONFIG_FILE,
};
pub use disambiguate::resolve;
pub use domain::{
    AnswerKind, Candidate, GroundTruth, PowerGradeError, Result, Role, Task, TaskFailure, TaskSet,
    Tolerances,
};
pub use evaluate::{
    evaluate, load_results, parse_results, render_evaluation, EvaluationOutcome,
    EvaluationReport, SubmittedResults, TierTally,
};
pub use extract::extract;
pub use fallback::{
    AnswerFallback, CompletionClient, CompletionRequest, SecondaryExtractor,
};
pub use grade::{grade, Grade, Verdict};
pub use reporting::{
    render_inspection, render_log, render_summary, write_batch_report_json, write_results_json,
    BatchReportArtifact,
};
pub use runner::{
    inspect, BatchReport, BatchRunner, BatchSummary, Inspection, Method, TaskOutcome, TaskStatus,
};
pub use source::{FsResponseStore, MemoryResponseStore, ResponseSource};
pub use telemetry::init_tracing;

/// powergrade version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
