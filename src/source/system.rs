//! Sampler backed by the host: systemd, HTTP endpoints, `df`, meminfo,
//! directories and commands.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use fleetwatch_adapters::disk::DiskProbe;
use fleetwatch_adapters::files::{count_files, FileFilter};
use fleetwatch_adapters::http::HttpProbe;
use fleetwatch_adapters::memory::{MemoryProbe, DEFAULT_MEMINFO};
use fleetwatch_adapters::systemd::SystemdProbe;
use fleetwatch_adapters::{command, AdapterError};
use fleetwatch_types::{Check, Reading, Sample, Source};
use tracing::{debug, warn};

use super::Sampler;

/// Dispatches each check's [`Source`] to the matching adapter.
#[derive(Debug, Clone)]
pub struct SystemSampler {
    http: HttpProbe,
    systemd: SystemdProbe,
    disk: DiskProbe,
    description: String,
}

impl SystemSampler {
    /// Create a sampler whose HTTP requests are bounded by `sample_timeout`.
    pub fn new(sample_timeout: Duration) -> Result<Self, AdapterError> {
        let http = HttpProbe::builder().timeout(sample_timeout).build()?;
        Ok(Self::with_probes(http, SystemdProbe::new(), DiskProbe::new()))
    }

    /// Create a sampler from preconfigured probes.
    pub fn with_probes(http: HttpProbe, systemd: SystemdProbe, disk: DiskProbe) -> Self {
        Self {
            http,
            systemd,
            disk,
            description: "system".to_string(),
        }
    }

    async fn read(&self, source: &Source) -> Result<Reading, AdapterError> {
        let reading = match source {
            Source::Systemd { unit } => Reading::Up(self.systemd.is_active(unit).await?),
            Source::Http { url, expect_status } => {
                Reading::Up(self.http.is_up(url, *expect_status).await?)
            }
            Source::HttpJson { url, pointer } => {
                Reading::Number(self.http.json_value(url, pointer).await?)
            }
            Source::Disk { path } => Reading::Number(self.disk.usage_percent(path).await?),
            Source::Memory { meminfo } => {
                let path = meminfo.as_deref().unwrap_or(Path::new(DEFAULT_MEMINFO));
                Reading::Number(MemoryProbe::new(path).usage_percent().await?)
            }
            Source::FileCount {
                dir,
                suffix,
                max_age,
            } => {
                let filter = FileFilter {
                    suffix: suffix.clone(),
                    max_age: *max_age,
                };
                Reading::Number(count_files(dir, &filter).await? as f64)
            }
            Source::Command { program, args } => {
                Reading::Number(command::command_value(program, args).await?)
            }
        };
        Ok(reading)
    }
}

#[async_trait]
impl Sampler for SystemSampler {
    async fn sample(&self, check: &Check) -> Sample {
        match self.read(&check.source).await {
            Ok(reading) => {
                debug!(check = %check.name, source = %check.source, %reading, "sampled");
                Sample::new(check.name.clone(), reading)
            }
            Err(err) => {
                warn!(check = %check.name, source = %check.source, error = %err, "collaborator unreachable");
                Sample::unreachable(check.name.clone(), err.to_string())
            }
        }
    }

    async fn restart(&self, check: &Check) -> anyhow::Result<()> {
        match &check.source {
            Source::Systemd { unit } => Ok(self.systemd.restart(unit).await?),
            other => anyhow::bail!("{} cannot be restarted", other),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}
