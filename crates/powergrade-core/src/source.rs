//! Raw response stores.
//!
//! Responses are collected elsewhere and stored as one text record per task
//! id. The grader only reads them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::{PowerGradeError, Result};

/// Read access to raw model responses, keyed by task id.
pub trait ResponseSource {
    /// The raw response for `task_id`, or `None` when none was recorded.
    fn fetch(&self, task_id: &str) -> Result<Option<String>>;
}

/// Responses stored as `<dir>/<task id>.txt`.
#[derive(Debug, Clone)]
pub struct FsResponseStore {
    dir: PathBuf,
}

impl FsResponseStore {
    /// Open a store rooted at `dir`. Fails when `dir` is not a directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(PowerGradeError::ResponseStoreUnavailable(dir));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, task_id: &str) -> Result<PathBuf> {
        if task_id.is_empty()
            || task_id.contains(['/', '\\'])
            || task_id.contains("..")
        {
            return Err(PowerGradeError::InvalidTaskId(task_id.to_string()));
        }
        Ok(self.dir.join(format!("{task_id}.txt")))
    }
}

impl ResponseSource for FsResponseStore {
    fn fetch(&self, task_id: &str) -> Result<Option<String>> {
        let path = self.path_for(task_id)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory responses, for tests and library callers that already hold the
/// text.
#[derive(Debug, Clone, Default)]
pub struct MemoryResponseStore {
    responses: HashMap<String, String>,
}

impl MemoryResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, task_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(task_id, text);
        self
    }

    pub fn insert(&mut self, task_id: impl Into<String>, text: impl Into<String>) {
        self.responses.insert(task_id.into(), text.into());
    }
}

impl ResponseSource for MemoryResponseStore {
    fn fetch(&self, task_id: &str) -> Result<Option<String>> {
        Ok(self.responses.get(task_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_store_reads_and_reports_absence() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("t1-a.txt"), "need 64 per group").expect("write");

        let store = FsResponseStore::open(dir.path()).expect("open");
        assert_eq!(
            store.fetch("t1-a").expect("fetch").as_deref(),
            Some("need 64 per group")
        );
        assert!(store.fetch("t1-b").expect("fetch").is_none());
    }

    #[test]
    fn test_fs_store_missing_dir_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FsResponseStore::open(dir.path().join("raw")).unwrap_err();
        assert!(matches!(err, PowerGradeError::ResponseStoreUnavailable(_)));
    }

    #[test]
    fn test_fs_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsResponseStore::open(dir.path()).expect("open");
        for id in ["../secret", "a/b", "a\\b", ""] {
            let err = store.fetch(id).unwrap_err();
            assert!(matches!(err, PowerGradeError::InvalidTaskId(_)), "{id}");
        }
    }

    #[test]
    fn test_fs_store_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("t.txt"), b"n = 40 \xff per group").expect("write");
        let store = FsResponseStore::open(dir.path()).expect("open");
        let text = store.fetch("t").expect("fetch").expect("present");
        assert!(text.contains("per group"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryResponseStore::new().with("t1", "power = 0.8");
        assert_eq!(store.fetch("t1").expect("fetch").as_deref(), Some("power = 0.8"));
        assert!(store.fetch("t2").expect("fetch").is_none());
    }
}
