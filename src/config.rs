//! Configuration loading and validation.
//!
//! The configuration is a list of checks plus run settings. It is read with
//! the `config` crate (any format it supports, TOML in practice), overlaid
//! with `FLEETWATCH__*` environment variables, and validated before any run
//! starts: a misconfigured threshold is a load-time error, never a per-run
//! one.
//!
//! ```toml
//! [settings]
//! sample_timeout = "10s"
//! run_budget = "60s"
//! log_path = "/var/log/fleetwatch/report.log"
//!
//! [[checks]]
//! name = "disk-root"
//! source = { type = "disk", path = "/" }
//! threshold = { warning = 80, critical = 90, direction = "above" }
//!
//! [[checks]]
//! name = "mcp-github"
//! source = { type = "systemd", unit = "mcp-github.service" }
//! restart_on_failure = true
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::data::duration::parse_duration;
use fleetwatch_types::{Check, CheckKind, Direction, Source, Threshold};

/// Default bound on a single collaborator call.
pub const DEFAULT_SAMPLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on a whole run.
pub const DEFAULT_RUN_BUDGET: Duration = Duration::from_secs(60);

/// Errors detected while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A threshold is missing a bound or direction, or its bounds are
    /// inverted.
    #[error("check '{check}': threshold misconfigured: {reason}")]
    ThresholdMisconfigured { check: String, reason: String },

    #[error("check #{index} has an invalid name {name:?}: names must be non-empty and contain no whitespace")]
    InvalidName { index: usize, name: String },

    #[error("check '{0}' is defined more than once")]
    DuplicateCheck(String),

    #[error("check '{check}': a {kind} check cannot read from {collaborator}")]
    KindMismatch {
        check: String,
        kind: CheckKind,
        collaborator: String,
    },

    #[error("check '{check}': {collaborator} produces arbitrary numbers, set kind to percentage or count")]
    KindRequired { check: String, collaborator: String },

    #[error("check '{0}': restart_on_failure requires a systemd source")]
    NotRestartable(String),

    #[error("invalid duration for {field}: {value:?} ({reason})")]
    InvalidDuration {
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: String, reason: String },

    #[error("unknown check '{0}'")]
    UnknownCheck(String),
}

/// Run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Bound on every collaborator call.
    pub sample_timeout: Duration,
    /// Bound on a whole run; pending samples are abandoned after it.
    pub run_budget: Duration,
    /// Append every rendered report to this file.
    pub log_path: Option<PathBuf>,
    /// Write the latest report as JSON to this file.
    pub export_path: Option<PathBuf>,
    /// Refuse to start while another run holds this lock file.
    pub lock_path: Option<PathBuf>,
    /// A lock older than this is considered abandoned. Defaults to twice the
    /// run budget.
    pub stale_lock_after: Option<Duration>,
    /// Run repeatedly at this interval instead of once.
    pub interval: Option<Duration>,
    /// Allow corrective actions such as restarting failed units.
    pub remediate: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_timeout: DEFAULT_SAMPLE_TIMEOUT,
            run_budget: DEFAULT_RUN_BUDGET,
            log_path: None,
            export_path: None,
            lock_path: None,
            stale_lock_after: None,
            interval: None,
            remediate: false,
        }
    }
}

impl Settings {
    /// Age after which a leftover lock file is reclaimed.
    pub fn stale_lock_age(&self) -> Duration {
        self.stale_lock_after.unwrap_or(self.run_budget * 2)
    }

    /// Check that the durations make sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_timeout.is_zero() {
            return Err(invalid_setting("sample_timeout", "must be greater than zero"));
        }
        if self.run_budget.is_zero() {
            return Err(invalid_setting("run_budget", "must be greater than zero"));
        }
        if let Some(interval) = self.interval {
            if interval.is_zero() {
                return Err(invalid_setting("interval", "must be greater than zero"));
            }
            if self.run_budget > interval {
                return Err(invalid_setting(
                    "run_budget",
                    "must not exceed the interval, or runs would overlap",
                ));
            }
        }
        Ok(())
    }
}

fn invalid_setting(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Validated configuration: settings plus checks in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetConfig {
    pub settings: Settings,
    pub checks: Vec<Check>,
}

impl FleetConfig {
    /// Validate programmatically built checks and settings.
    pub fn new(settings: Settings, checks: Vec<Check>) -> Result<Self, ConfigError> {
        settings.validate()?;
        validate_checks(&checks)?;
        Ok(Self { settings, checks })
    }

    /// Load from an optional file plus `FLEETWATCH__*` environment variables
    /// (e.g. `FLEETWATCH__SETTINGS__RUN_BUDGET=30s`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("FLEETWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(config)
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(content, config::FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let raw: RawConfig = config.try_deserialize()?;
        raw.into_validated()
    }

    /// Keep only the named checks, preserving configuration order.
    pub fn retain_checks(&mut self, names: &[String]) -> Result<(), ConfigError> {
        if names.is_empty() {
            return Ok(());
        }
        for name in names {
            if !self.checks.iter().any(|c| &c.name == name) {
                return Err(ConfigError::UnknownCheck(name.clone()));
            }
        }
        self.checks.retain(|c| names.contains(&c.name));
        Ok(())
    }
}

/// Validate a set of checks: names, kinds, thresholds and remediation.
pub fn validate_checks(checks: &[Check]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (index, check) in checks.iter().enumerate() {
        if check.name.is_empty() || check.name.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ConfigError::InvalidName {
                index,
                name: check.name.clone(),
            });
        }
        if !seen.insert(check.name.as_str()) {
            return Err(ConfigError::DuplicateCheck(check.name.clone()));
        }
        validate_check(check)?;
    }
    Ok(())
}

/// Validate a single check.
pub fn validate_check(check: &Check) -> Result<(), ConfigError> {
    if !check.source.accepts(check.kind) {
        return Err(ConfigError::KindMismatch {
            check: check.name.clone(),
            kind: check.kind,
            collaborator: check.source.to_string(),
        });
    }

    if check.restart_on_failure && !check.source.is_restartable() {
        return Err(ConfigError::NotRestartable(check.name.clone()));
    }

    let misconfigured = |reason: &str| ConfigError::ThresholdMisconfigured {
        check: check.name.clone(),
        reason: reason.to_string(),
    };

    match (check.kind, &check.threshold) {
        (CheckKind::Service, Some(_)) => {
            Err(misconfigured("service checks are up/down and take no threshold"))
        }
        (CheckKind::Service, None) => Ok(()),
        (_, None) => Err(misconfigured("numeric checks require a threshold")),
        (kind, Some(threshold)) => validate_threshold(kind, threshold).map_err(|r| misconfigured(&r)),
    }
}

fn validate_threshold(kind: CheckKind, threshold: &Threshold) -> Result<(), String> {
    if !threshold.warning.is_finite() || !threshold.critical.is_finite() {
        return Err("bounds must be finite numbers".to_string());
    }
    if !threshold.is_ordered() {
        return Err(match threshold.direction {
            Direction::Above => format!(
                "warning ({}) must not be above critical ({}) when direction is above",
                threshold.warning, threshold.critical
            ),
            Direction::Below => format!(
                "warning ({}) must not be below critical ({}) when direction is below",
                threshold.warning, threshold.critical
            ),
        });
    }
    if kind == CheckKind::Percentage {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(threshold.warning) || !in_range(threshold.critical) {
            return Err("percentage bounds must be within 0..=100".to_string());
        }
    }
    if kind == CheckKind::Count && (threshold.warning < 0.0 || threshold.critical < 0.0) {
        return Err("count bounds must not be negative".to_string());
    }
    Ok(())
}

// Raw, unvalidated shapes as they appear in configuration files.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    settings: RawSettings,
    checks: Vec<RawCheck>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    sample_timeout: Option<String>,
    run_budget: Option<String>,
    log_path: Option<PathBuf>,
    export_path: Option<PathBuf>,
    lock_path: Option<PathBuf>,
    stale_lock_after: Option<String>,
    interval: Option<String>,
    remediate: bool,
}

#[derive(Debug, Deserialize)]
struct RawCheck {
    name: String,
    #[serde(default)]
    kind: Option<CheckKind>,
    source: RawSource,
    #[serde(default)]
    threshold: Option<RawThreshold>,
    #[serde(default)]
    restart_on_failure: bool,
}

#[derive(Debug, Deserialize)]
struct RawThreshold {
    warning: Option<f64>,
    critical: Option<f64>,
    direction: Option<Direction>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawSource {
    Systemd {
        unit: String,
    },
    Http {
        url: String,
        #[serde(default)]
        expect_status: Option<u16>,
    },
    HttpJson {
        url: String,
        pointer: String,
    },
    Disk {
        path: PathBuf,
    },
    Memory {
        #[serde(default)]
        meminfo: Option<PathBuf>,
    },
    FileCount {
        dir: PathBuf,
        #[serde(default)]
        suffix: Option<String>,
        #[serde(default)]
        max_age: Option<String>,
    },
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

fn duration_field(field: &str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    value
        .map(|v| {
            parse_duration(&v).map_err(|e| ConfigError::InvalidDuration {
                field: field.to_string(),
                value: v.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

impl RawConfig {
    fn into_validated(self) -> Result<FleetConfig, ConfigError> {
        let settings = self.settings.into_settings()?;
        let checks = self
            .checks
            .into_iter()
            .map(RawCheck::into_check)
            .collect::<Result<Vec<_>, _>>()?;
        FleetConfig::new(settings, checks)
    }
}

impl RawSettings {
    fn into_settings(self) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();
        Ok(Settings {
            sample_timeout: duration_field("sample_timeout", self.sample_timeout)?
                .unwrap_or(defaults.sample_timeout),
            run_budget: duration_field("run_budget", self.run_budget)?
                .unwrap_or(defaults.run_budget),
            log_path: self.log_path,
            export_path: self.export_path,
            lock_path: self.lock_path,
            stale_lock_after: duration_field("stale_lock_after", self.stale_lock_after)?,
            interval: duration_field("interval", self.interval)?,
            remediate: self.remediate,
        })
    }
}

impl RawSource {
    fn into_source(self, check: &str) -> Result<Source, ConfigError> {
        Ok(match self {
            RawSource::Systemd { unit } => Source::Systemd { unit },
            RawSource::Http { url, expect_status } => Source::Http { url, expect_status },
            RawSource::HttpJson { url, pointer } => Source::HttpJson { url, pointer },
            RawSource::Disk { path } => Source::Disk { path },
            RawSource::Memory { meminfo } => Source::Memory { meminfo },
            RawSource::FileCount {
                dir,
                suffix,
                max_age,
            } => Source::FileCount {
                dir,
                suffix,
                max_age: duration_field(&format!("checks.{}.max_age", check), max_age)?,
            },
            RawSource::Command { program, args } => Source::Command { program, args },
        })
    }
}

impl RawCheck {
    fn into_check(self) -> Result<Check, ConfigError> {
        let source = self.source.into_source(&self.name)?;
        let kind = match self.kind.or_else(|| source.natural_kind()) {
            Some(kind) => kind,
            None => {
                return Err(ConfigError::KindRequired {
                    check: self.name,
                    collaborator: source.to_string(),
                })
            }
        };

        let threshold = match self.threshold {
            None => None,
            Some(raw) => {
                let misconfigured = |reason: &str| ConfigError::ThresholdMisconfigured {
                    check: self.name.clone(),
                    reason: reason.to_string(),
                };
                let direction = raw.direction.ok_or_else(|| misconfigured("missing direction"))?;
                let warning = raw.warning.ok_or_else(|| misconfigured("missing warning bound"))?;
                let critical = raw
                    .critical
                    .ok_or_else(|| misconfigured("missing critical bound"))?;
                Some(Threshold::new(warning, critical, direction))
            }
        };

        Ok(Check {
            name: self.name,
            kind,
            source,
            threshold,
            restart_on_failure: self.restart_on_failure,
        })
    }
}
