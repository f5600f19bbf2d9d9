//! Sampler serving preconfigured readings.
//!
//! Used by tests and for exercising report rendering without touching the
//! host. Readings can be delayed to simulate slow collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fleetwatch_types::{Check, Reading, Sample};

use super::Sampler;

/// A sampler that returns fixed readings by check name.
///
/// Checks without a configured reading are unreachable. Restart requests
/// are recorded and succeed unless marked as failing.
#[derive(Debug, Default)]
pub struct StaticSampler {
    readings: HashMap<String, (Reading, Duration)>,
    failing_restarts: HashSet<String>,
    restart_delay: Duration,
    restarts: Mutex<Vec<String>>,
}

impl StaticSampler {
    /// Create a sampler with no readings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `reading` immediately for the named check.
    pub fn with_reading(self, check: impl Into<String>, reading: Reading) -> Self {
        self.with_delayed_reading(check, reading, Duration::ZERO)
    }

    /// Serve `reading` for the named check after `delay`.
    pub fn with_delayed_reading(
        mut self,
        check: impl Into<String>,
        reading: Reading,
        delay: Duration,
    ) -> Self {
        self.readings.insert(check.into(), (reading, delay));
        self
    }

    /// Make restarts of the named check fail.
    pub fn with_failing_restart(mut self, check: impl Into<String>) -> Self {
        self.failing_restarts.insert(check.into());
        self
    }

    /// Make every restart take `delay` before it completes.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Names of the checks a restart was requested for, in request order.
    pub fn restarts(&self) -> Vec<String> {
        self.restarts
            .lock()
            .map(|restarts| restarts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sampler for StaticSampler {
    async fn sample(&self, check: &Check) -> Sample {
        match self.readings.get(&check.name) {
            Some((reading, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Sample::new(check.name.clone(), reading.clone())
            }
            None => Sample::unreachable(check.name.clone(), "no reading configured"),
        }
    }

    async fn restart(&self, check: &Check) -> anyhow::Result<()> {
        if let Ok(mut restarts) = self.restarts.lock() {
            restarts.push(check.name.clone());
        }
        if !self.restart_delay.is_zero() {
            tokio::time::sleep(self.restart_delay).await;
        }
        if self.failing_restarts.contains(&check.name) {
            anyhow::bail!("restart of {} refused", check.source);
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "static readings"
    }
}
