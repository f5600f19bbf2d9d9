//! systemd unit probe.
//!
//! Queries unit state with `systemctl is-active` and, when remediation is
//! enabled, restarts units with `systemctl restart`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fleetwatch_adapters::systemd::SystemdProbe;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let probe = SystemdProbe::new();
//!     if !probe.is_active("mcp-filesystem.service").await? {
//!         probe.restart("mcp-filesystem.service").await?;
//!     }
//!     Ok(())
//! }
//! ```

use tracing::{debug, info};

use crate::process;
use crate::AdapterError;

/// Unit states reported by `systemctl is-active` that count as up.
const UP_STATES: &[&str] = &["active", "reloading"];

/// Every state `systemctl is-active` can print.
const KNOWN_STATES: &[&str] = &[
    "active",
    "reloading",
    "inactive",
    "failed",
    "activating",
    "deactivating",
    "maintenance",
    "refreshing",
];

/// Probe for systemd units.
#[derive(Debug, Clone)]
pub struct SystemdProbe {
    systemctl: String,
    /// Arguments placed before the subcommand.
    prefix: Vec<String>,
}

impl Default for SystemdProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemdProbe {
    /// A probe using `systemctl` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("systemctl")
    }

    /// A probe using a specific `systemctl` binary.
    pub fn with_program(systemctl: impl Into<String>) -> Self {
        Self::with_command(systemctl, Vec::<String>::new())
    }

    /// A probe running `program prefix... <subcommand> <unit>`, e.g.
    /// `ssh host systemctl` or `sudo systemctl`.
    pub fn with_command<I, S>(program: impl Into<String>, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            systemctl: program.into(),
            prefix: prefix.into_iter().map(Into::into).collect(),
        }
    }

    fn args<'a>(&'a self, subcommand: &'a str, unit: &'a str) -> Vec<&'a str> {
        let mut args: Vec<&str> = self.prefix.iter().map(String::as_str).collect();
        args.push(subcommand);
        args.push(unit);
        args
    }

    /// Returns whether the unit is up.
    ///
    /// `systemctl is-active` exits non-zero for stopped units, so the exit
    /// status alone is not an error; only output that is not a unit state is.
    pub async fn is_active(&self, unit: &str) -> Result<bool, AdapterError> {
        let output = process::run(&self.systemctl, self.args("is-active", unit)).await?;
        match parse_is_active(&output.stdout) {
            Some(up) => {
                debug!(unit, state = output.stdout.trim(), up, "unit state");
                Ok(up)
            }
            None => Err(AdapterError::Command {
                program: self.systemctl.clone(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            }),
        }
    }

    /// Restart the unit.
    pub async fn restart(&self, unit: &str) -> Result<(), AdapterError> {
        info!(unit, "restarting unit");
        process::run(&self.systemctl, self.args("restart", unit))
            .await?
            .into_success(&self.systemctl)?;
        Ok(())
    }
}

/// Parse the first line of `systemctl is-active` output.
///
/// Returns `None` when the output is not a unit state.
pub fn parse_is_active(stdout: &str) -> Option<bool> {
    let state = stdout.lines().next()?.trim();
    if UP_STATES.contains(&state) {
        Some(true)
    } else if KNOWN_STATES.contains(&state) || state == "unknown" {
        Some(false)
    } else {
        None
    }
}
