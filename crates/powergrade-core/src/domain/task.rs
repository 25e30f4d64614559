//! Benchmark task definitions and the task repository.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{PowerGradeError, Result};

/// Named ground-truth fields of a task. Values may be null or non-numeric;
/// only numeric values count as populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct GroundTruth(BTreeMap<String, Value>);

impl GroundTruth {
    /// The numeric value of `field`, if present and numeric.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maximum allowed absolute deviation, keyed by the same field vocabulary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Tolerances(BTreeMap<String, Value>);

impl Tolerances {
    pub fn number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    /// First numeric entry among `names`, in order.
    pub fn first_of(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|name| self.number(name))
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }
}

/// A single benchmark task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,

    #[serde(default)]
    pub ground_truth: GroundTruth,

    #[serde(default)]
    pub tolerance: Tolerances,

    /// Difficulty tier, as a number or a label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, ground_truth: GroundTruth, tolerance: Tolerances) -> Self {
        Self {
            id: id.into(),
            ground_truth,
            tolerance,
            tier: None,
            template: None,
        }
    }

    /// Normalized tier label (`tier2` for both `2` and `"tier2"`).
    pub fn tier_label(&self) -> Option<String> {
        match self.tier.as_ref()? {
            Value::Number(n) => Some(format!("tier{}", n)),
            Value::String(s) if s.starts_with("tier") => Some(s.clone()),
            Value::String(s) => Some(format!("tier{}", s)),
            _ => None,
        }
    }
}

/// The loaded task repository, ordered by task id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSet {
    tasks: BTreeMap<String, Task>,
}

impl TaskSet {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut set = Self::default();
        for task in tasks {
            set.insert(task);
        }
        set
    }

    /// Load tasks from a JSON file holding either an array of tasks or an
    /// object with a `tasks` array.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: Value = serde_json::from_str(&content)?;
        let set = Self::from_value(raw).map_err(|e| match e {
            PowerGradeError::InvalidTaskRepository { reason, .. } => {
                PowerGradeError::InvalidTaskRepository {
                    path: path.to_path_buf(),
                    reason,
                }
            }
            other => other,
        })?;
        tracing::debug!(path = %path.display(), tasks = set.len(), "loaded task repository");
        Ok(set)
    }

    pub fn from_value(raw: Value) -> Result<Self> {
        let list = match raw {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("tasks") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(PowerGradeError::InvalidTaskRepository {
                        path: Default::default(),
                        reason: "object without a `tasks` array".to_string(),
                    })
                }
            },
            _ => {
                return Err(PowerGradeError::InvalidTaskRepository {
                    path: Default::default(),
                    reason: "expected an array of tasks or an object with `tasks`".to_string(),
                })
            }
        };

        let tasks = list
            .into_iter()
            .map(serde_json::from_value::<Task>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(tasks))
    }

    /// Insert a task. A later task with the same id replaces the earlier one.
    pub fn insert(&mut self, task: Task) {
        if let Some(previous) = self.tasks.insert(task.id.clone(), task) {
            tracing::warn!(
                task_id = %previous.id,
                "duplicate task id, keeping the last definition"
            );
        }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Tasks in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
