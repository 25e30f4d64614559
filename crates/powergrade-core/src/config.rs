//! Grader configuration.
//!
//! Loaded from an optional `powergrade.toml`; every section falls back to
//! defaults so an empty or absent file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Result;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "powergrade.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    pub paths: PathsConfig,
    pub extraction: ExtractionConfig,
    pub tolerance: ToleranceDefaults,
    pub fallback: FallbackConfig,
}

impl GraderConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the default location (./powergrade.toml) or return defaults.
    pub fn load_default() -> Result<Self> {
        let local_path = Path::new(DEFAULT_CONFIG_FILE);
        if local_path.exists() {
            return Self::load(local_path);
        }
        Ok(Self::default())
    }
}

/// Input and output locations for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Task repository (JSON).
    pub tasks: PathBuf,
    /// Directory holding one `<task id>.txt` raw response per task.
    pub raw_dir: PathBuf,
    /// Results mapping written at the end of a batch.
    pub output: PathBuf,
    /// Optional full batch report.
    pub report: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tasks: PathBuf::from("all_tasks.json"),
            raw_dir: PathBuf::from("results/raw"),
            output: PathBuf::from("results/agent_results.json"),
            report: None,
        }
    }
}

/// Tuning knobs for the candidate extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Bytes of text on each side of a number scanned for role keywords.
    pub context_window: usize,
    /// Smallest count accepted from a role-tagged rule.
    pub min_count: u64,
    /// Largest count accepted from any rule.
    pub max_count: u64,
    /// Smallest count accepted by the last-resort scan.
    pub fallback_min: u64,
    /// Literals the last-resort scan never proposes (confidence and power
    /// levels that pepper the prose of this benchmark's answers).
    pub noise_literals: Vec<u64>,
    /// Upper bound of a plausible effect size.
    pub max_effect_size: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            context_window: 80,
            min_count: 2,
            max_count: 50_000,
            fallback_min: 5,
            noise_literals: vec![5, 80, 95],
            max_effect_size: 5.0,
        }
    }
}

impl ExtractionConfig {
    pub(crate) fn is_plausible_count(&self, value: f64) -> bool {
        value >= self.min_count as f64 && value <= self.max_count as f64
    }

    pub(crate) fn is_noise(&self, value: f64) -> bool {
        self.noise_literals.iter().any(|n| *n as f64 == value)
    }
}

/// Tolerances used when a task's own tolerance record has no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceDefaults {
    pub power: f64,
    pub effect_size: f64,
    pub events: f64,
    pub sample_size: f64,
}

impl Default for ToleranceDefaults {
    fn default() -> Self {
        Self {
            power: 0.03,
            effect_size: 0.03,
            events: 5.0,
            sample_size: 10.0,
        }
    }
}

/// Settings for the secondary-model extraction fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Model identifier passed to the completion client. Empty means the
    /// client's own default.
    pub model: String,
    pub max_tokens: u32,
    /// Response text beyond this many characters is cut from the prompt.
    pub max_response_chars: usize,
    /// Calls between throttling pauses.
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 200,
            max_response_chars: 3000,
            batch_size: 10,
            batch_delay_ms: 500,
        }
    }
}

impl FallbackConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraderConfig::default();
        assert_eq!(config.paths.raw_dir, PathBuf::from("results/raw"));
        assert_eq!(config.extraction.context_window, 80);
        assert_eq!(config.extraction.noise_literals, vec![5, 80, 95]);
        assert_eq!(config.tolerance.power, 0.03);
        assert_eq!(config.tolerance.sample_size, 10.0);
        assert_eq!(config.fallback.batch_size, 10);
        assert_eq!(config.fallback.batch_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: GraderConfig = toml::from_str(
            r#"
            [paths]
            raw_dir = "runs/gpt/raw"

            [extraction]
            noise_literals = [80, 90, 95]

            [tolerance]
            events = 3
            "#,
        )
        .expect("parse");

        assert_eq!(config.paths.raw_dir, PathBuf::from("runs/gpt/raw"));
        assert_eq!(config.paths.tasks, PathBuf::from("all_tasks.json"));
        assert_eq!(config.extraction.noise_literals, vec![80, 90, 95]);
        assert_eq!(config.extraction.max_count, 50_000);
        assert_eq!(config.tolerance.events, 3.0);
        assert_eq!(config.tolerance.power, 0.03);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("powergrade.toml");
        std::fs::write(&path, "[paths]\noutput = \"out.json\"\n").expect("write");

        let config = GraderConfig::load(&path).expect("load");
        assert_eq!(config.paths.output, PathBuf::from("out.json"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("powergrade.toml");
        std::fs::write(&path, "[paths\n").expect("write");

        let err = GraderConfig::load(&path).unwrap_err();
        assert!(matches!(err, crate::domain::PowerGradeError::Config(_)));
    }

    #[test]
    fn test_noise_and_count_range() {
        let config = ExtractionConfig::default();
        assert!(config.is_noise(80.0));
        assert!(!config.is_noise(64.0));
        assert!(config.is_plausible_count(2.0));
        assert!(!config.is_plausible_count(1.0));
        assert!(!config.is_plausible_count(50_001.0));
    }
}
