//! Concurrent execution of one run.
//!
//! Every check is sampled on its own task. Samples are bounded by the sample
//! timeout and the run as a whole by the run budget. Results are collected in
//! configuration order no matter which task finishes first, and a task still
//! pending when the budget runs out is aborted and reported as unreachable,
//! so each configured check yields exactly one result. Remediation shares the
//! same deadline: a run never outlives its budget.

use std::sync::Arc;
use std::time::Duration;

use fleetwatch_types::{Check, CheckResult, Remediation, Report, Sample, Severity, Source};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::data::{aggregate, evaluate};
use crate::source::{sample_with_timeout, Sampler};

/// Reason recorded for checks abandoned at the end of the run budget.
pub const ABANDONED: &str = "abandoned: run budget exceeded";

/// Runs checks against a sampler and produces reports.
#[derive(Debug, Clone)]
pub struct Runner {
    sampler: Arc<dyn Sampler>,
    sample_timeout: Duration,
    run_budget: Duration,
    remediate: bool,
}

impl Runner {
    /// A runner using the limits and remediation switch from `settings`.
    pub fn new(sampler: Arc<dyn Sampler>, settings: &Settings) -> Self {
        Self {
            sampler,
            sample_timeout: settings.sample_timeout,
            run_budget: settings.run_budget,
            remediate: settings.remediate,
        }
    }

    /// A runner with explicit limits and remediation disabled.
    pub fn with_limits(sampler: Arc<dyn Sampler>, sample_timeout: Duration, run_budget: Duration) -> Self {
        Self {
            sampler,
            sample_timeout,
            run_budget,
            remediate: false,
        }
    }

    /// Enable or disable remediation of failed restartable checks.
    pub fn remediate(mut self, enabled: bool) -> Self {
        self.remediate = enabled;
        self
    }

    /// Run every check once and aggregate the results.
    pub async fn run(&self, checks: &[Check]) -> Report {
        info!(
            checks = checks.len(),
            sampler = self.sampler.description(),
            "starting run"
        );

        let deadline = Instant::now() + self.run_budget;
        let samples = self.sample_until(checks, deadline).await;
        let mut results: Vec<CheckResult> = checks
            .iter()
            .zip(samples)
            .map(|(check, sample)| evaluate(check, sample))
            .collect();

        if self.remediate {
            self.remediate_failures(checks, &mut results, deadline).await;
        }

        let report = aggregate(results);
        info!(
            score = report.overall_score,
            rating = %report.overall_rating,
            critical = report.count(Severity::Critical),
            unknown = report.count(Severity::Unknown),
            "run finished"
        );
        report
    }

    /// Sample every check concurrently, returning samples in check order.
    pub async fn sample_all(&self, checks: &[Check]) -> Vec<Sample> {
        self.sample_until(checks, Instant::now() + self.run_budget)
            .await
    }

    async fn sample_until(&self, checks: &[Check], deadline: Instant) -> Vec<Sample> {
        let handles: Vec<_> = checks
            .iter()
            .map(|check| {
                let sampler = Arc::clone(&self.sampler);
                let check = check.clone();
                let limit = self.sample_timeout;
                tokio::spawn(async move { sample_with_timeout(sampler.as_ref(), &check, limit).await })
            })
            .collect();

        let mut samples = Vec::with_capacity(checks.len());
        for (check, mut handle) in checks.iter().zip(handles) {
            let sample = match timeout_at(deadline, &mut handle).await {
                Ok(Ok(sample)) => sample,
                Ok(Err(err)) => {
                    warn!(check = %check.name, error = %err, "sampling task failed");
                    Sample::unreachable(check.name.clone(), format!("sampling task failed: {}", err))
                }
                Err(_) => {
                    handle.abort();
                    warn!(check = %check.name, budget = ?self.run_budget, "abandoning check");
                    Sample::unreachable(check.name.clone(), ABANDONED)
                }
            };
            samples.push(sample);
        }
        samples
    }

    /// Restart failed flagged checks concurrently within what is left of
    /// the run budget. Restarts still pending at the deadline are aborted.
    async fn remediate_failures(
        &self,
        checks: &[Check],
        results: &mut [CheckResult],
        deadline: Instant,
    ) {
        let pending: Vec<_> = checks
            .iter()
            .zip(results.iter_mut())
            .filter(|(check, result)| {
                check.restart_on_failure && result.severity == Severity::Critical
            })
            .map(|(check, result)| {
                let action = format!("restart {}", restart_target(&check.source));
                let handle = (Instant::now() < deadline).then(|| {
                    let sampler = Arc::clone(&self.sampler);
                    let check = check.clone();
                    let action = action.clone();
                    let limit = self.sample_timeout;
                    tokio::spawn(async move { restart(sampler.as_ref(), &check, action, limit).await })
                });
                (check, result, action, handle)
            })
            .collect();

        for (check, result, action, handle) in pending {
            let outcome = match handle {
                Some(mut handle) => match timeout_at(deadline, &mut handle).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(err)) => failed(action, format!("restart task failed: {}", err)),
                    Err(_) => {
                        handle.abort();
                        warn!(check = %check.name, %action, "abandoning remediation");
                        failed(action, ABANDONED.to_string())
                    }
                },
                None => {
                    warn!(check = %check.name, %action, "no run budget left for remediation");
                    failed(action, ABANDONED.to_string())
                }
            };
            debug!(check = %check.name, outcome = %outcome, "recorded remediation");
            result.remediation = Some(outcome);
        }
    }
}

async fn restart(sampler: &dyn Sampler, check: &Check, action: String, limit: Duration) -> Remediation {
    match timeout(limit, sampler.restart(check)).await {
        Ok(Ok(())) => {
            info!(check = %check.name, %action, "remediation succeeded");
            Remediation {
                action,
                succeeded: true,
                detail: None,
            }
        }
        Ok(Err(err)) => {
            warn!(check = %check.name, %action, error = %err, "remediation failed");
            failed(action, format!("{:#}", err))
        }
        Err(_) => {
            warn!(check = %check.name, %action, "remediation timed out");
            failed(action, "timed out".to_string())
        }
    }
}

fn failed(action: String, detail: String) -> Remediation {
    Remediation {
        action,
        succeeded: false,
        detail: Some(detail),
    }
}

fn restart_target(source: &Source) -> String {
    match source {
        Source::Systemd { unit } => unit.clone(),
        other => other.to_string(),
    }
}
