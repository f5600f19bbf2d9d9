//! Per-check results and the aggregated report of one run.

use std::fmt;
use std::str::FromStr;

use crate::{Sample, SchemaVersion, Severity};

/// Outcome of a corrective action taken against a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Remediation {
    /// What was attempted (e.g. "restart mcp-github.service").
    pub action: String,
    pub succeeded: bool,
    /// Error text when the action failed.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub detail: Option<String>,
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.succeeded, &self.detail) {
            (true, _) => write!(f, "{}: succeeded", self.action),
            (false, Some(detail)) => write!(f, "{}: failed: {}", self.action, detail),
            (false, None) => write!(f, "{}: failed", self.action),
        }
    }
}

/// The classified outcome of one check in one run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckResult {
    /// Check name, in configuration order within a report.
    pub check: String,
    pub sample: Sample,
    pub severity: Severity,
    /// Human-readable explanation of the severity.
    pub message: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub remediation: Option<Remediation>,
}

impl CheckResult {
    pub fn new(
        check: impl Into<String>,
        sample: Sample,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            sample,
            severity,
            message: message.into(),
            remediation: None,
        }
    }
}

/// Overall banding of a report's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Rating {
    Critical,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl Rating {
    /// Band a score: >=90 excellent, >=80 good, >=70 acceptable, >=60 poor,
    /// anything lower critical.
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Rating::Excellent,
            80..=89 => Rating::Good,
            70..=79 => Rating::Acceptable,
            60..=69 => Rating::Poor,
            _ => Rating::Critical,
        }
    }

    /// Lower-case label used in the summary line.
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Acceptable => "acceptable",
            Rating::Poor => "poor",
            Rating::Critical => "critical",
        }
    }

    /// Returns true when a scheduler should treat the run as successful.
    pub fn is_passing(&self) -> bool {
        *self >= Rating::Acceptable
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a rating label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRatingError(pub String);

impl fmt::Display for ParseRatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown rating label: {}", self.0)
    }
}

impl std::error::Error for ParseRatingError {}

impl FromStr for Rating {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excellent" => Ok(Rating::Excellent),
            "good" => Ok(Rating::Good),
            "acceptable" => Ok(Rating::Acceptable),
            "poor" => Ok(Rating::Poor),
            "critical" => Ok(Rating::Critical),
            _ => Err(ParseRatingError(s.to_string())),
        }
    }
}

/// The aggregated result of one evaluation run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Report {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,
    /// Unix timestamp in milliseconds when the report was produced.
    pub generated_at_ms: u64,
    /// One result per configured check, in configuration order.
    pub results: Vec<CheckResult>,
    /// Mean of per-result scores, in 0..=100.
    pub overall_score: u8,
    pub overall_rating: Rating,
}

impl Report {
    /// Number of results with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.results.iter().filter(|r| r.severity == severity).count()
    }

    /// The worst severity in the report, or `None` when it is empty.
    pub fn worst(&self) -> Option<Severity> {
        self.results.iter().map(|r| r.severity).max()
    }

    /// Look up a result by check name.
    pub fn result(&self, check: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.check == check)
    }

    /// Returns true when a scheduler should treat the run as successful.
    pub fn is_passing(&self) -> bool {
        self.overall_rating.is_passing()
    }
}
