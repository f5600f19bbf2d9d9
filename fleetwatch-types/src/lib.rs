//! # fleetwatch-types
//!
//! Core types for fleet health checks. This crate defines the data model shared
//! by the fleetwatch samplers, evaluator and report renderer: what is checked,
//! how a reading is classified, and what a finished run looks like.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature for JSON export and config loading
//! - **Immutable values**: Checks are fixed once configured; samples, results and
//!   reports are produced once per run and never mutated afterwards
//! - **Versioned schema**: Reports include version info for forward compatibility
//!
//! ## Features
//!
//! - `serde`: serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use fleetwatch_types::{Check, Direction, Severity, Source, Threshold};
//!
//! let disk = Check::percentage(
//!     "disk-root",
//!     Source::Disk { path: "/".into() },
//!     Threshold::new(80.0, 90.0, Direction::Above),
//! );
//!
//! assert_eq!(disk.threshold.unwrap().classify(95.0), Severity::Critical);
//! assert_eq!(disk.threshold.unwrap().classify(85.0), Severity::Warning);
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. The version is included in exported
//! reports so downstream consumers can handle format evolution gracefully.

mod check;
mod report;
mod sample;
mod severity;
mod version;

pub use check::*;
pub use report::*;
pub use sample::*;
pub use severity::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the exported report format.
pub const SCHEMA_VERSION: u32 = 1;
