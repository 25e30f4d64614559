//! Tolerance grading.

use serde::{Deserialize, Serialize};

/// Allowance for binary floating-point representation error at the
/// tolerance boundary.
pub const BOUNDARY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Pass,
    Fail,
    NoExtract,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::NoExtract => "NO_EXTRACT",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing an extracted value to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// `|extracted - oracle|`, undefined when nothing was extracted.
    pub difference: Option<f64>,
    pub verdict: Verdict,
}

/// Grade an extracted value. The tolerance boundary is inclusive.
pub fn grade(extracted: Option<f64>, oracle: f64, tolerance: f64) -> Grade {
    match extracted {
        None => Grade {
            difference: None,
            verdict: Verdict::NoExtract,
        },
        Some(value) => {
            let difference = (value - oracle).abs();
            let verdict = if difference <= tolerance + BOUNDARY_EPSILON {
                Verdict::Pass
            } else {
                Verdict::Fail
            };
            Grade {
                difference: Some(difference),
                verdict,
            }
        }
    }
}
