//! End-to-end runs against fixed readings.

use std::sync::Arc;
use std::time::Duration;

use fleetwatch::data::{parse_summary, render};
use fleetwatch::{exit_code, parse_severities, FleetConfig, Runner, StaticSampler, EXIT_OK, EXIT_UNHEALTHY};
use fleetwatch_types::{Check, Rating, Reading, Severity, Source, Threshold};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn runner(sampler: StaticSampler) -> Runner {
    Runner::with_limits(
        Arc::new(sampler),
        Duration::from_secs(10),
        Duration::from_secs(60),
    )
}

fn disk(name: &str) -> Check {
    Check::percentage(
        name,
        Source::Disk { path: "/".into() },
        Threshold::above(80.0, 90.0),
    )
}

fn service(name: &str) -> Check {
    Check::service(
        name,
        Source::Systemd {
            unit: format!("{}.service", name),
        },
    )
}

fn severities(report: &fleetwatch_types::Report) -> Vec<Severity> {
    report.results.iter().map(|r| r.severity).collect()
}

#[tokio::test]
async fn full_disk_and_stopped_service() {
    let sampler = StaticSampler::new()
        .with_reading("disk-root", Reading::Number(95.0))
        .with_reading("mcp-github", Reading::Up(false));
    let report = runner(sampler)
        .run(&[disk("disk-root"), service("mcp-github")])
        .await;

    assert_eq!(severities(&report), [Severity::Critical, Severity::Critical]);
    assert_eq!(report.overall_score, 0);
    assert_eq!(report.overall_rating, Rating::Critical);
    assert_eq!(exit_code(&report), EXIT_UNHEALTHY);
}

#[tokio::test]
async fn healthy_disk_and_busy_cpu() {
    let cpu = Check::percentage(
        "cpu",
        Source::Command {
            program: "cpu-load".to_string(),
            args: vec![],
        },
        Threshold::above(80.0, 95.0),
    );
    let sampler = StaticSampler::new()
        .with_reading("disk-root", Reading::Number(50.0))
        .with_reading("cpu", Reading::Number(82.0));
    let report = runner(sampler).run(&[disk("disk-root"), cpu]).await;

    assert_eq!(severities(&report), [Severity::Ok, Severity::Warning]);
    assert_eq!(report.overall_score, 80);
    assert_eq!(report.overall_rating, Rating::Good);
    assert_eq!(exit_code(&report), EXIT_OK);
}

#[tokio::test]
async fn stopped_service_is_never_a_warning() {
    for name in ["mcp-github", "mcp-jira", "mcp-notion"] {
        let sampler = StaticSampler::new().with_reading(name, Reading::Up(false));
        let report = runner(sampler).run(&[service(name)]).await;
        assert_eq!(report.results[0].severity, Severity::Critical);
    }
}

#[tokio::test]
async fn empty_check_set_is_critical() {
    let report = runner(StaticSampler::new()).run(&[]).await;
    assert_eq!(report.overall_score, 0);
    assert_eq!(report.overall_rating, Rating::Critical);
    assert_eq!(exit_code(&report), EXIT_UNHEALTHY);
}

fn delays(seed: u64, count: usize) -> Vec<Duration> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Duration::from_millis(rng.gen_range(0..5_000)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn results_follow_configuration_order_under_random_delays() {
    let names: Vec<String> = (0..12).map(|i| format!("check-{:02}", i)).collect();
    let checks: Vec<Check> = names.iter().map(|n| disk(n)).collect();

    for seed in [1, 7, 42, 1234, 98_765] {
        let mut sampler = StaticSampler::new();
        for (i, (name, delay)) in names.iter().zip(delays(seed, names.len())).enumerate() {
            sampler = sampler.with_delayed_reading(name.clone(), Reading::Number(i as f64 * 8.0), delay);
        }
        let report = runner(sampler).run(&checks).await;

        let order: Vec<&str> = report.results.iter().map(|r| r.check.as_str()).collect();
        assert_eq!(order, names.iter().map(String::as_str).collect::<Vec<_>>(), "seed {}", seed);
    }
}

#[tokio::test(start_paused = true)]
async fn unreachable_and_abandoned_checks_are_unknown() {
    let sampler = StaticSampler::new()
        .with_reading("disk-root", Reading::Number(10.0))
        .with_delayed_reading("stats", Reading::Number(1.0), Duration::from_secs(30))
        .with_delayed_reading("backups", Reading::Number(1.0), Duration::from_secs(300));
    let runner = Runner::with_limits(
        Arc::new(sampler),
        Duration::from_secs(20),
        Duration::from_secs(60),
    );
    let checks = [
        disk("disk-root"),
        disk("stats"),
        disk("missing"),
        Check::count(
            "backups",
            Source::FileCount {
                dir: "/backups".into(),
                suffix: None,
                max_age: None,
            },
            Threshold::below(2.0, 0.0),
        ),
    ];
    let report = runner.run(&checks).await;

    assert_eq!(
        severities(&report),
        [Severity::Ok, Severity::Unknown, Severity::Unknown, Severity::Unknown]
    );
    assert_eq!(report.overall_score, 25);
    assert_eq!(report.overall_rating, Rating::Critical);
}

#[tokio::test]
async fn rendered_report_round_trips() {
    let sampler = StaticSampler::new()
        .with_reading("disk-root", Reading::Number(85.0))
        .with_reading("mcp-github", Reading::Up(true))
        .with_reading("memory", Reading::Number(97.5));
    let checks = [disk("disk-root"), service("mcp-github"), disk("memory"), disk("gone")];
    let report = runner(sampler).run(&checks).await;

    let text = render(&report);
    let expected: Vec<(String, Severity)> = report
        .results
        .iter()
        .map(|r| (r.check.clone(), r.severity))
        .collect();
    assert_eq!(parse_severities(&text), expected);
    assert_eq!(
        parse_summary(&text),
        Some((report.overall_score, report.overall_rating))
    );
}

#[tokio::test]
async fn configured_checks_run_in_file_order() {
    let config = FleetConfig::from_toml(
        r#"
        [settings]
        sample_timeout = "5s"
        run_budget = "30s"

        [[checks]]
        name = "mcp-github"
        source = { type = "systemd", unit = "mcp-github.service" }

        [[checks]]
        name = "disk-root"
        source = { type = "disk", path = "/" }
        threshold = { warning = 80, critical = 90, direction = "above" }
        "#,
    )
    .unwrap();

    let sampler = StaticSampler::new()
        .with_reading("disk-root", Reading::Number(90.0))
        .with_reading("mcp-github", Reading::Up(true));
    let runner = Runner::new(Arc::new(sampler), &config.settings);
    let report = runner.run(&config.checks).await;

    let names: Vec<&str> = report.results.iter().map(|r| r.check.as_str()).collect();
    assert_eq!(names, ["mcp-github", "disk-root"]);
    assert_eq!(report.results[1].severity, Severity::Critical);
    assert_eq!(report.overall_score, 50);
}
