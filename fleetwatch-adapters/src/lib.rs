//! # fleetwatch-adapters
//!
//! Probes for collecting raw health readings from the collaborators a fleet
//! of MCP servers depends on.
//!
//! Every probe is read-only except [`systemd::SystemdProbe::restart`], which
//! is only called when remediation is explicitly enabled. Probes return
//! [`AdapterError`] on failure; deciding what a failure means (an unreachable
//! reading) is left to the caller.
//!
//! ## Supported Collaborators
//!
//! - **HTTP** (`http` feature) - health endpoints (up/down by status) and
//!   JSON stats endpoints (a number addressed by JSON pointer)
//! - **System** (`system` feature) - systemd units, `df` filesystem usage,
//!   meminfo memory usage, directory file counts, and arbitrary commands
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleetwatch_adapters::disk::DiskProbe;
//! use fleetwatch_adapters::systemd::SystemdProbe;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let used = DiskProbe::new().usage_percent(Path::new("/")).await?;
//!     let up = SystemdProbe::new().is_active("mcp-github.service").await?;
//!
//!     println!("disk {}% used, mcp-github up: {}", used, up);
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "system")]
pub mod command;
#[cfg(feature = "system")]
pub mod disk;
#[cfg(feature = "system")]
pub mod files;
#[cfg(feature = "system")]
pub mod memory;
#[cfg(feature = "system")]
pub mod process;
#[cfg(feature = "system")]
pub mod systemd;

pub use error::AdapterError;

// Re-export types for convenience
pub use fleetwatch_types::{Reading, Sample, Source};
