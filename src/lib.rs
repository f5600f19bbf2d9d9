//! # fleetwatch
//!
//! A health-check and maintenance-status aggregator for a fleet of MCP
//! servers and the host they run on.
//!
//! Each run samples every configured check concurrently, classifies the
//! samples against their thresholds, and aggregates the results into a
//! scored report that is rendered as stable, line-oriented text.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Application                         │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐ │
//! │  │ config  │───▶│  runner  │───▶│   data   │───▶│  output  │ │
//! │  │ (load)  │    │(sampling)│    │(evaluate,│    │ (stdout, │ │
//! │  └─────────┘    └────┬─────┘    │aggregate,│    │ log,json)│ │
//! │                      │          │ render)  │    └──────────┘ │
//! │                      ▼          └──────────┘                 │
//! │                 ┌─────────┐                                  │
//! │                 │ source  │◀── SystemSampler | StaticSampler │
//! │                 │(Sampler)│                                  │
//! │                 └─────────┘                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: Loading and load-time validation of checks and settings
//! - **[`source`]**: The [`Sampler`] trait, the host-backed [`SystemSampler`] and
//!   the fixed-reading [`StaticSampler`]
//! - **[`runner`]**: Concurrent sampling bounded by the sample timeout and run
//!   budget, plus remediation
//! - **[`data`]**: Threshold evaluation, report aggregation, and rendering
//! - **[`lock`]**: The single-run lock file
//! - **[`output`]**: The append-only report log and JSON export
//! - **[`app`]**: One run or watch mode, and exit statuses
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # One run, report on stdout, exit status from the rating
//! fleetwatch --config /etc/fleetwatch.toml
//!
//! # Every 15 minutes, appending to a report log and restarting failed units
//! fleetwatch --config /etc/fleetwatch.toml --interval 15m \
//!     --log /var/log/fleetwatch/report.log --remediate
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fleetwatch::{render, Runner, StaticSampler};
//! use fleetwatch_types::{Check, Rating, Reading, Source, Threshold};
//!
//! # tokio_test::block_on(async {
//! let checks = vec![
//!     Check::percentage("disk-root", Source::Disk { path: "/".into() }, Threshold::above(80.0, 90.0)),
//!     Check::percentage("cpu", Source::Command { program: "cpu-load".into(), args: vec![] }, Threshold::above(80.0, 95.0)),
//! ];
//! let sampler = StaticSampler::new()
//!     .with_reading("disk-root", Reading::Number(50.0))
//!     .with_reading("cpu", Reading::Number(82.0));
//!
//! let runner = Runner::with_limits(Arc::new(sampler), Duration::from_secs(10), Duration::from_secs(60));
//! let report = runner.run(&checks).await;
//!
//! assert_eq!(report.overall_score, 80);
//! assert_eq!(report.overall_rating, Rating::Good);
//! println!("{}", render(&report));
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod lock;
pub mod output;
pub mod runner;
pub mod source;

// Re-export main types for convenience
pub use app::{exit_code, App, EXIT_ERROR, EXIT_OK, EXIT_UNHEALTHY};
pub use config::{ConfigError, FleetConfig, Settings};
pub use data::{aggregate, evaluate, parse_severities, render};
pub use lock::{LockError, RunLock};
pub use output::ReportLog;
pub use runner::Runner;
pub use source::{Sampler, StaticSampler, SystemSampler};
