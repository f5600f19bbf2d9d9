//! Application: one run, or periodic runs in watch mode.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use fleetwatch_types::Report;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::config::FleetConfig;
use crate::data::render;
use crate::lock::RunLock;
use crate::output::{export_json, ReportLog};
use crate::runner::Runner;
use crate::source::Sampler;

/// Exit status when the overall rating is acceptable or better.
pub const EXIT_OK: u8 = 0;
/// Exit status when the overall rating is poor or critical.
pub const EXIT_UNHEALTHY: u8 = 1;
/// Exit status for failures of the tool itself (configuration, lock, I/O).
pub const EXIT_ERROR: u8 = 2;

/// Exit status for a finished report.
pub fn exit_code(report: &Report) -> u8 {
    if report.is_passing() {
        EXIT_OK
    } else {
        EXIT_UNHEALTHY
    }
}

/// Application state: validated configuration plus the runner built from it.
#[derive(Debug)]
pub struct App {
    config: FleetConfig,
    runner: Runner,
    log: Option<ReportLog>,
}

impl App {
    pub fn new(config: FleetConfig, sampler: Arc<dyn Sampler>) -> Self {
        let runner = Runner::new(sampler, &config.settings);
        let log = config.settings.log_path.clone().map(ReportLog::new);
        Self {
            config,
            runner,
            log,
        }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Execute one run: take the lock, sample, then write the rendered
    /// report to `out`, the report log and the JSON export.
    pub async fn run_once<W: Write>(&self, out: &mut W) -> Result<Report> {
        let settings = &self.config.settings;
        let _lock = match &settings.lock_path {
            Some(path) => Some(RunLock::acquire(path, settings.stale_lock_age())?),
            None => None,
        };

        let report = self.runner.run(&self.config.checks).await;
        let rendered = render::render(&report);

        out.write_all(rendered.as_bytes())
            .and_then(|()| out.flush())
            .context("writing report")?;
        if let Some(log) = &self.log {
            log.append(&rendered)?;
        }
        if let Some(path) = &settings.export_path {
            export_json(&report, path)?;
            info!(path = %path.display(), "exported report");
        }
        Ok(report)
    }

    /// Run at the configured interval until `shutdown` resolves.
    ///
    /// A run that overruns its slot delays the next one instead of stacking
    /// up; failed runs are logged and do not stop the loop. Returns the exit
    /// status of the last run.
    pub async fn watch<W, F>(&self, out: &mut W, shutdown: F) -> Result<u8>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let period = self
            .config
            .settings
            .interval
            .context("watch mode requires an interval")?;
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut last = EXIT_OK;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutting down");
                    return Ok(last);
                }
                _ = ticker.tick() => {
                    last = match self.run_once(out).await {
                        Ok(report) => exit_code(&report),
                        Err(err) => {
                            error!(error = %format!("{:#}", err), "run failed");
                            EXIT_ERROR
                        }
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::source::StaticSampler;
    use fleetwatch_types::{Check, Reading, Source, Threshold};
    use std::time::Duration;

    fn disk() -> Check {
        Check::percentage(
            "disk-root",
            Source::Disk { path: "/".into() },
            Threshold::above(80.0, 90.0),
        )
    }

    fn app(settings: Settings, used: f64) -> App {
        let config = FleetConfig::new(settings, vec![disk()]).unwrap();
        let sampler = StaticSampler::new().with_reading("disk-root", Reading::Number(used));
        App::new(config, Arc::new(sampler))
    }

    #[tokio::test]
    async fn test_run_once_writes_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            log_path: Some(dir.path().join("report.log")),
            export_path: Some(dir.path().join("report.json")),
            lock_path: Some(dir.path().join("fleetwatch.lock")),
            ..Settings::default()
        };
        let app = app(settings, 95.0);

        let mut out = Vec::new();
        let report = app.run_once(&mut out).await.unwrap();
        assert_eq!(exit_code(&report), EXIT_UNHEALTHY);

        let stdout = String::from_utf8(out).unwrap();
        assert!(stdout.contains("CRITICAL: disk-root = 95 (>= critical 90)"));
        let log = std::fs::read_to_string(dir.path().join("report.log")).unwrap();
        assert_eq!(log, stdout);
        assert!(dir.path().join("report.json").exists());
        assert!(!dir.path().join("fleetwatch.lock").exists());
    }

    #[tokio::test]
    async fn test_lock_contention_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("fleetwatch.lock");
        let _held = RunLock::acquire(&lock_path, Duration::from_secs(600)).unwrap();

        let settings = Settings {
            lock_path: Some(lock_path),
            ..Settings::default()
        };
        let mut out = Vec::new();
        let err = app(settings, 10.0).run_once(&mut out).await.unwrap_err();
        assert!(err.downcast_ref::<crate::lock::LockError>().is_some());
        assert!(out.is_empty());
    }

    #[test]
    fn test_exit_codes() {
        let report = crate::data::aggregate(vec![]);
        assert_eq!(exit_code(&report), EXIT_UNHEALTHY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_runs_each_interval() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            run_budget: Duration::from_secs(5),
            interval: Some(Duration::from_secs(10)),
            log_path: Some(dir.path().join("report.log")),
            ..Settings::default()
        };
        let app = app(settings, 10.0);

        let mut out = Vec::new();
        let code = app
            .watch(&mut out, tokio::time::sleep(Duration::from_secs(35)))
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);

        let log = std::fs::read_to_string(dir.path().join("report.log")).unwrap();
        assert_eq!(log.matches("REPORT: 1 checks").count(), 4);
    }

    #[tokio::test]
    async fn test_watch_requires_interval() {
        let app = app(Settings::default(), 10.0);
        let mut out = Vec::new();
        assert!(app.watch(&mut out, std::future::pending()).await.is_err());
    }
}
