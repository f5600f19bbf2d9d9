//! Raw readings taken from collaborators.

use std::fmt;

/// What a collaborator reported.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value", rename_all = "lowercase"))]
pub enum Reading {
    /// A numeric value (percentage or count).
    Number(f64),
    /// Service state: `true` when up.
    Up(bool),
    /// The collaborator could not be reached or returned garbage.
    /// Carries the reason for the operator.
    Unreachable(String),
}

impl Reading {
    /// Returns true for the unreachable sentinel.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Reading::Unreachable(_))
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Number(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{:.2}", v)
                }
            }
            Reading::Up(true) => f.write_str("up"),
            Reading::Up(false) => f.write_str("down"),
            Reading::Unreachable(_) => f.write_str("n/a"),
        }
    }
}

/// One reading for one check, taken at a point in time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Name of the check this sample belongs to.
    pub check: String,
    pub reading: Reading,
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl Sample {
    /// Create a sample stamped with the current time.
    pub fn new(check: impl Into<String>, reading: Reading) -> Self {
        Self::with_timestamp(check, reading, current_timestamp_ms())
    }

    /// Create a sample with a specific timestamp.
    pub fn with_timestamp(check: impl Into<String>, reading: Reading, timestamp_ms: u64) -> Self {
        Self {
            check: check.into(),
            reading,
            timestamp_ms,
        }
    }

    /// An unreachable sample stamped with the current time.
    pub fn unreachable(check: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(check, Reading::Unreachable(reason.into()))
    }
}

/// Milliseconds since the Unix epoch.
pub fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
