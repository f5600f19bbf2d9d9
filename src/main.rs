use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use fleetwatch::data::duration::{format_duration, parse_duration};
use fleetwatch::{exit_code, App, FleetConfig, SystemSampler, EXIT_ERROR};

#[derive(Parser, Debug)]
#[command(name = "fleetwatch")]
#[command(about = "Health-check and maintenance-status aggregator for MCP servers")]
#[command(version)]
struct Args {
    /// Configuration file (TOML or any format the extension names)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append every rendered report to this file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Write the report as JSON to this file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Refuse to run while another run holds this lock file
    #[arg(long)]
    lock: Option<PathBuf>,

    /// Bound on a whole run (e.g., "60s", "2m")
    #[arg(long, value_parser = parse_duration)]
    budget: Option<Duration>,

    /// Bound on each collaborator call (e.g., "10s", "500ms")
    #[arg(long, value_parser = parse_duration)]
    sample_timeout: Option<Duration>,

    /// Run repeatedly at this interval until interrupted (e.g., "15m")
    #[arg(short, long, value_parser = parse_duration)]
    interval: Option<Duration>,

    /// Restart failed services flagged with restart_on_failure
    #[arg(long)]
    remediate: bool,

    /// Only run the named check (repeatable)
    #[arg(long = "check", value_name = "NAME")]
    checks: Vec<String>,

    /// Log debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut FleetConfig) -> Result<()> {
        let settings = &mut config.settings;
        if let Some(path) = &self.log {
            settings.log_path = Some(path.clone());
        }
        if let Some(path) = &self.export {
            settings.export_path = Some(path.clone());
        }
        if let Some(path) = &self.lock {
            settings.lock_path = Some(path.clone());
        }
        if let Some(budget) = self.budget {
            settings.run_budget = budget;
        }
        if let Some(limit) = self.sample_timeout {
            settings.sample_timeout = limit;
        }
        if let Some(interval) = self.interval {
            settings.interval = Some(interval);
        }
        settings.remediate |= self.remediate;
        settings.validate()?;

        config.retain_checks(&self.checks)?;
        Ok(())
    }
}

/// Default log level when `RUST_LOG` is unset.
fn log_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (_, true) => "warn",
        (true, false) => "debug",
        (false, false) => "info",
    }
}

/// Log to stderr so stdout carries only the report.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(verbose, quiet)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!(error = %format!("{:#}", err), "fleetwatch failed");
            eprintln!("Error: {:#}", err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(args: Args) -> Result<u8> {
    let mut config = FleetConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config)?;

    if config.checks.is_empty() {
        warn!("no checks configured, the report will be rated critical");
    }

    let sampler = SystemSampler::new(config.settings.sample_timeout)
        .context("building the system sampler")?;
    let interval = config.settings.interval;
    let app = App::new(config, Arc::new(sampler));

    let runtime = tokio::runtime::Runtime::new().context("starting the async runtime")?;
    runtime.block_on(async {
        let mut out = std::io::stdout();
        match interval {
            Some(period) => {
                tracing::info!(interval = %format_duration(period), "watch mode");
                app.watch(&mut out, async {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        error!(error = %err, "failed to listen for ctrl-c");
                        std::future::pending::<()>().await;
                    }
                })
                .await
            }
            None => app.run_once(&mut out).await.map(|report| exit_code(&report)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch::Settings;

    fn config() -> FleetConfig {
        FleetConfig::from_toml(
            r#"
            [[checks]]
            name = "disk-root"
            source = { type = "disk", path = "/" }
            threshold = { warning = 80, critical = 90, direction = "above" }

            [[checks]]
            name = "mcp-github"
            source = { type = "systemd", unit = "mcp-github.service" }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "fleetwatch",
            "--budget",
            "30s",
            "--sample-timeout",
            "5s",
            "--log",
            "/tmp/report.log",
            "--remediate",
            "--check",
            "mcp-github",
        ]);
        let mut config = config();
        args.apply(&mut config).unwrap();

        assert_eq!(config.settings.run_budget, Duration::from_secs(30));
        assert_eq!(config.settings.sample_timeout, Duration::from_secs(5));
        assert_eq!(config.settings.log_path, Some(PathBuf::from("/tmp/report.log")));
        assert!(config.settings.remediate);
        assert_eq!(config.checks.len(), 1);
        assert_eq!(config.checks[0].name, "mcp-github");
    }

    #[test]
    fn test_defaults_are_kept() {
        let args = Args::parse_from(["fleetwatch"]);
        let mut config = config();
        args.apply(&mut config).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.checks.len(), 2);
    }

    #[test]
    fn test_unknown_check_is_rejected() {
        let args = Args::parse_from(["fleetwatch", "--check", "nope"]);
        assert!(args.apply(&mut config()).is_err());
    }

    #[test]
    fn test_budget_longer_than_interval_is_rejected() {
        let args = Args::parse_from(["fleetwatch", "--interval", "30s", "--budget", "1m"]);
        assert!(args.apply(&mut config()).is_err());
    }

    #[test]
    fn test_log_directive() {
        assert_eq!(log_directive(false, false), "info");
        assert_eq!(log_directive(true, false), "debug");
        assert_eq!(log_directive(false, true), "warn");
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["fleetwatch", "--verbose", "--quiet"]).is_err());
    }

    #[test]
    fn test_bad_duration_is_a_parse_error() {
        assert!(Args::try_parse_from(["fleetwatch", "--budget", "soon"]).is_err());
    }
}
