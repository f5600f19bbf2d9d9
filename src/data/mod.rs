//! Evaluation, aggregation and rendering of check results.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "10s", "500ms")
//! - [`evaluate`]: Classifies a [`Sample`](fleetwatch_types::Sample) into a severity
//! - [`aggregate`]: Builds a scored [`Report`](fleetwatch_types::Report) from results
//! - [`render`]: Stable text rendering, its parser, and JSON export
//!
//! ## Data Flow
//!
//! ```text
//! Sample (from a Sampler)
//!        │
//!        ▼
//! evaluate(check, sample) ──▶ CheckResult
//!        │
//!        ▼
//! aggregate(results) ──▶ Report (overall score + rating)
//!        │
//!        ▼
//! render(report) ──▶ text lines for stdout / the report log
//! ```

pub mod aggregate;
pub mod duration;
pub mod evaluate;
pub mod render;

pub use aggregate::{aggregate, aggregate_at, overall_score};
pub use evaluate::{classify, evaluate};
pub use render::{parse_result_line, parse_severities, parse_summary, render, to_json, ParsedResult};
