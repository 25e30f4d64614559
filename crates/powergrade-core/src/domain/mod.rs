//! Domain models for powergrade.
//!
//! Canonical definitions for the core entities:
//! - `Task`: a benchmark task with its ground truth and tolerances
//! - `TaskSet`: the loaded task repository, ordered by task id
//! - `AnswerKind` / `Role`: what kind of number is sought and what a match looks like
//! - `Candidate`: a number found in response text, awaiting disambiguation

pub mod answer;
pub mod error;
pub mod task;

// Re-export main types and errors
pub use answer::{AnswerKind, Candidate, Role};
pub use error::{PowerGradeError, Result, TaskFailure};
pub use task::{GroundTruth, Task, TaskSet, Tolerances};
