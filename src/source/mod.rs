//! Sampler abstraction for reading the current state of a check's collaborator.
//!
//! A sampler never fails: any collaborator error is reported as an
//! [`Reading::Unreachable`] sample so that one bad check cannot sink a run.

mod fixed;
mod system;

pub use fixed::StaticSampler;
pub use system::SystemSampler;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use fleetwatch_types::{Check, Reading, Sample};

/// Trait for taking samples from a check's collaborator.
///
/// Implementations dispatch on [`Check::source`]. Besides the built-in
/// [`SystemSampler`], [`StaticSampler`] serves fixed readings for tests and
/// dry runs.
///
/// # Example
///
/// ```
/// use fleetwatch::{Sampler, StaticSampler};
/// use fleetwatch_types::{Check, Reading, Source, Threshold};
///
/// # tokio_test::block_on(async {
/// let check = Check::percentage(
///     "disk-root",
///     Source::Disk { path: "/".into() },
///     Threshold::above(80.0, 90.0),
/// );
/// let sampler = StaticSampler::new().with_reading("disk-root", Reading::Number(42.0));
/// let sample = sampler.sample(&check).await;
/// assert_eq!(sample.reading, Reading::Number(42.0));
/// # });
/// ```
#[async_trait]
pub trait Sampler: Send + Sync + Debug {
    /// Take one sample for the check.
    ///
    /// Must not fail: collaborator errors become an unreachable reading.
    async fn sample(&self, check: &Check) -> Sample;

    /// Restart the check's collaborator.
    ///
    /// Only called for checks flagged `restart_on_failure` when remediation
    /// is enabled.
    async fn restart(&self, check: &Check) -> anyhow::Result<()> {
        anyhow::bail!("{} cannot restart {}", self.description(), check.source)
    }

    /// Returns a human-readable description of the sampler.
    fn description(&self) -> &str;
}

/// Take a sample, giving up after `limit`.
///
/// A sample that does not arrive in time is unreachable. The pending probe
/// is dropped, which kills any child process it spawned.
pub async fn sample_with_timeout(sampler: &dyn Sampler, check: &Check, limit: Duration) -> Sample {
    match tokio::time::timeout(limit, sampler.sample(check)).await {
        Ok(sample) => sample,
        Err(_) => Sample::new(
            check.name.clone(),
            Reading::Unreachable(format!(
                "timed out after {}",
                crate::data::duration::format_duration(limit)
            )),
        ),
    }
}
