//! Severity levels for a single check.

use core::fmt;
use core::str::FromStr;

/// Classification of one check's current state.
///
/// Variants are ordered from best to worst, with `Unknown` ranked above
/// `Critical`: a check whose collaborator could not be reached is treated as
/// at least as bad as a failing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    /// All severities, best first.
    pub const ALL: [Severity; 4] = [
        Severity::Ok,
        Severity::Warning,
        Severity::Critical,
        Severity::Unknown,
    ];

    /// The upper-case label used in rendered report lines.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Contribution of a result with this severity to the overall score.
    ///
    /// `Unknown` counts as a failure so that silent collector outages lower
    /// the score instead of being ignored.
    pub fn score(&self) -> u32 {
        match self {
            Severity::Ok => 100,
            Severity::Warning => 60,
            Severity::Critical | Severity::Unknown => 0,
        }
    }

    /// Returns true for anything other than `Ok`.
    pub fn is_failure(&self) -> bool {
        *self != Severity::Ok
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a severity label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSeverityError(pub String);

impl fmt::Display for ParseSeverityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown severity label: {}", self.0)
    }
}

impl std::error::Error for ParseSeverityError {}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    /// Parses a label case-insensitively. `WARN` and `CRIT` are accepted as
    /// short forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(Severity::Ok),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "CRITICAL" | "CRIT" => Ok(Severity::Critical),
            "UNKNOWN" => Ok(Severity::Unknown),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}
