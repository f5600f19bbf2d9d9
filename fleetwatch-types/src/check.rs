//! Checks, their collaborators and thresholds.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::Severity;

/// What kind of reading a check produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CheckKind {
    /// Boolean up/down state of a service.
    Service,
    /// A usage ratio in the range 0..=100.
    Percentage,
    /// A plain count (files, connections, open issues...).
    Count,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckKind::Service => "service",
            CheckKind::Percentage => "percentage",
            CheckKind::Count => "count",
        })
    }
}

/// Which side of a threshold is bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Higher values are worse (disk usage, error counts).
    Above,
    /// Lower values are worse (free space, backup counts).
    Below,
}

/// Warning and critical bounds for a numeric check.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Threshold {
    pub warning: f64,
    pub critical: f64,
    pub direction: Direction,
}

impl Threshold {
    /// Create a threshold. Use [`Threshold::is_ordered`] to check that the
    /// warning bound is not stricter than the critical one.
    pub fn new(warning: f64, critical: f64, direction: Direction) -> Self {
        Self {
            warning,
            critical,
            direction,
        }
    }

    /// Shorthand for an `Above` threshold.
    pub fn above(warning: f64, critical: f64) -> Self {
        Self::new(warning, critical, Direction::Above)
    }

    /// Shorthand for a `Below` threshold.
    pub fn below(warning: f64, critical: f64) -> Self {
        Self::new(warning, critical, Direction::Below)
    }

    /// Returns true when the warning band is reached before the critical one.
    ///
    /// Equal bounds are allowed and simply remove the warning tier.
    pub fn is_ordered(&self) -> bool {
        match self.direction {
            Direction::Above => self.warning <= self.critical,
            Direction::Below => self.warning >= self.critical,
        }
    }

    /// Classify a value against this threshold.
    ///
    /// A value sitting exactly on a bound belongs to the more severe band.
    pub fn classify(&self, value: f64) -> Severity {
        match self.direction {
            Direction::Above => {
                if value >= self.critical {
                    Severity::Critical
                } else if value >= self.warning {
                    Severity::Warning
                } else {
                    Severity::Ok
                }
            }
            Direction::Below => {
                if value <= self.critical {
                    Severity::Critical
                } else if value <= self.warning {
                    Severity::Warning
                } else {
                    Severity::Ok
                }
            }
        }
    }

    /// The bound that was crossed for the given severity, if any.
    pub fn bound_for(&self, severity: Severity) -> Option<f64> {
        match severity {
            Severity::Warning => Some(self.warning),
            Severity::Critical => Some(self.critical),
            _ => None,
        }
    }
}

/// The external collaborator a check reads from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Source {
    /// A systemd unit, queried with `systemctl is-active`.
    Systemd { unit: String },

    /// An HTTP health endpoint. Up when the response status matches
    /// `expect_status`, or is any 2xx when unset.
    Http {
        url: String,
        #[cfg_attr(feature = "serde", serde(default))]
        expect_status: Option<u16>,
    },

    /// A numeric field of a JSON stats endpoint, addressed by JSON pointer
    /// (e.g. `/connections/active`).
    HttpJson { url: String, pointer: String },

    /// Used space of the filesystem holding `path`, as reported by `df`.
    Disk { path: PathBuf },

    /// Used memory, computed from a meminfo file.
    Memory {
        #[cfg_attr(feature = "serde", serde(default))]
        meminfo: Option<PathBuf>,
    },

    /// Number of regular files in a directory, optionally filtered by
    /// suffix and maximum age.
    FileCount {
        dir: PathBuf,
        #[cfg_attr(feature = "serde", serde(default))]
        suffix: Option<String>,
        #[cfg_attr(feature = "serde", serde(default))]
        max_age: Option<Duration>,
    },

    /// The first token of a command's standard output, parsed as a number.
    Command {
        program: String,
        #[cfg_attr(feature = "serde", serde(default))]
        args: Vec<String>,
    },
}

impl Source {
    /// The kind of reading this source produces when it is unambiguous.
    ///
    /// Sources that yield arbitrary numbers return `None`; their kind must be
    /// stated explicitly.
    pub fn natural_kind(&self) -> Option<CheckKind> {
        match self {
            Source::Systemd { .. } | Source::Http { .. } => Some(CheckKind::Service),
            Source::Disk { .. } | Source::Memory { .. } => Some(CheckKind::Percentage),
            Source::FileCount { .. } => Some(CheckKind::Count),
            Source::HttpJson { .. } | Source::Command { .. } => None,
        }
    }

    /// Returns true if a check of `kind` can read from this source.
    pub fn accepts(&self, kind: CheckKind) -> bool {
        match self.natural_kind() {
            Some(natural) => natural == kind,
            None => kind != CheckKind::Service,
        }
    }

    /// Returns true if the collaborator can be asked to restart.
    pub fn is_restartable(&self) -> bool {
        matches!(self, Source::Systemd { .. })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Systemd { unit } => write!(f, "systemd:{}", unit),
            Source::Http { url, .. } => write!(f, "http:{}", url),
            Source::HttpJson { url, pointer } => write!(f, "http:{}#{}", url, pointer),
            Source::Disk { path } => write!(f, "disk:{}", path.display()),
            Source::Memory { meminfo } => match meminfo {
                Some(path) => write!(f, "memory:{}", path.display()),
                None => f.write_str("memory"),
            },
            Source::FileCount { dir, .. } => write!(f, "files:{}", dir.display()),
            Source::Command { program, .. } => write!(f, "command:{}", program),
        }
    }
}

/// A named thing being monitored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Check {
    pub name: String,
    pub kind: CheckKind,
    pub source: Source,
    /// Required for numeric kinds, absent for service checks.
    #[cfg_attr(feature = "serde", serde(default))]
    pub threshold: Option<Threshold>,
    /// Ask the collaborator to restart when the check fails.
    #[cfg_attr(feature = "serde", serde(default))]
    pub restart_on_failure: bool,
}

impl Check {
    /// A service (up/down) check.
    pub fn service(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            kind: CheckKind::Service,
            source,
            threshold: None,
            restart_on_failure: false,
        }
    }

    /// A percentage check.
    pub fn percentage(name: impl Into<String>, source: Source, threshold: Threshold) -> Self {
        Self {
            name: name.into(),
            kind: CheckKind::Percentage,
            source,
            threshold: Some(threshold),
            restart_on_failure: false,
        }
    }

    /// A count check.
    pub fn count(name: impl Into<String>, source: Source, threshold: Threshold) -> Self {
        Self {
            name: name.into(),
            kind: CheckKind::Count,
            source,
            threshold: Some(threshold),
            restart_on_failure: false,
        }
    }

    /// Enable restart-on-failure remediation.
    pub fn with_restart_on_failure(mut self) -> Self {
        self.restart_on_failure = true;
        self
    }
}
