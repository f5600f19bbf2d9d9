//! Line-oriented text rendering of reports, and the matching parser.
//!
//! The text format is the payload forwarded to alert channels, so it is kept
//! stable:
//!
//! ```text
//! [2026-03-01T04:00:00Z] REPORT: 2 checks
//! [2026-03-01T04:00:00Z] CRITICAL: disk-root = 95 (>= critical 90)
//! [2026-03-01T04:00:01Z] OK: mcp-github = up (service is up)
//! [2026-03-01T04:00:01Z] SUMMARY: overall_score=50 overall_rating=critical
//! ```

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use fleetwatch_types::{Rating, Report, Severity};

const REMEDIATION_MARKER: &str = "); remediation: ";

/// Format a millisecond timestamp as RFC 3339 in UTC, to the second.
pub fn format_timestamp(ms: u64) -> String {
    let ms = i64::try_from(ms).unwrap_or(i64::MAX);
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render a report as text, one line per result between a header and a
/// summary line. The output always ends with a newline.
pub fn render(report: &Report) -> String {
    let generated = format_timestamp(report.generated_at_ms);
    let mut out = String::new();

    let _ = writeln!(out, "[{}] REPORT: {} checks", generated, report.results.len());
    for result in &report.results {
        let _ = write!(
            out,
            "[{}] {}: {} = {} ({})",
            format_timestamp(result.sample.timestamp_ms),
            result.severity.label(),
            result.check,
            result.sample.reading,
            single_line(&result.message),
        );
        if let Some(remediation) = &result.remediation {
            let _ = write!(out, "; remediation: {}", single_line(&remediation.to_string()));
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "[{}] SUMMARY: overall_score={} overall_rating={}",
        generated, report.overall_score, report.overall_rating
    );
    out
}

/// Serialize a report as pretty-printed JSON.
pub fn to_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// One per-check line recovered from rendered text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResult {
    pub timestamp: Option<DateTime<Utc>>,
    pub severity: Severity,
    pub name: String,
    pub value: String,
    pub message: String,
    pub remediation: Option<String>,
}

/// Parse one per-check line. Header, summary and foreign lines yield `None`.
pub fn parse_result_line(line: &str) -> Option<ParsedResult> {
    let (timestamp, rest) = split_timestamp(line)?;
    let (level, rest) = rest.split_once(": ")?;
    let severity = level.parse::<Severity>().ok()?;
    // Rendered labels are upper case; the lenient FromStr must not let
    // "ok: ..." prose through.
    if level != severity.label() {
        return None;
    }

    let (name, rest) = rest.split_once(" = ")?;
    let (value, rest) = rest.split_once(" (")?;

    let (message, remediation) = match rest.rfind(REMEDIATION_MARKER) {
        Some(idx) => (
            &rest[..idx],
            Some(rest[idx + REMEDIATION_MARKER.len()..].to_string()),
        ),
        None => (rest.strip_suffix(')')?, None),
    };

    Some(ParsedResult {
        timestamp: DateTime::parse_from_rfc3339(timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        severity,
        name: name.to_string(),
        value: value.to_string(),
        message: message.to_string(),
        remediation,
    })
}

/// Recover `(check name, severity)` for every per-check line, in order.
pub fn parse_severities(text: &str) -> Vec<(String, Severity)> {
    text.lines()
        .filter_map(parse_result_line)
        .map(|parsed| (parsed.name, parsed.severity))
        .collect()
}

/// Recover the overall score and rating from the summary line.
pub fn parse_summary(text: &str) -> Option<(u8, Rating)> {
    text.lines().find_map(|line| {
        let (_, rest) = split_timestamp(line)?;
        let rest = rest.strip_prefix("SUMMARY: ")?;
        let (score, rating) = rest.split_once(' ')?;
        let score = score.strip_prefix("overall_score=")?.parse().ok()?;
        let rating = rating.strip_prefix("overall_rating=")?.parse().ok()?;
        Some((score, rating))
    })
}

fn split_timestamp(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('[')?;
    let (timestamp, rest) = rest.split_once("] ")?;
    Some((timestamp, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::aggregate_at;
    use fleetwatch_types::{CheckResult, Reading, Remediation, Sample};

    // 2026-03-01T04:00:00Z
    const T0: u64 = 1_772_337_600_000;

    fn result(name: &str, reading: Reading, severity: Severity, message: &str) -> CheckResult {
        CheckResult::new(name, Sample::with_timestamp(name, reading, T0), severity, message)
    }

    fn sample_report() -> Report {
        aggregate_at(
            vec![
                result("disk-root", Reading::Number(95.0), Severity::Critical, ">= critical 90"),
                result("mcp-github", Reading::Up(true), Severity::Ok, "service is up"),
                result("cpu", Reading::Number(82.5), Severity::Warning, ">= warning 80"),
                result(
                    "stats",
                    Reading::Unreachable("timed out".to_string()),
                    Severity::Unknown,
                    "unreachable: timed out",
                ),
            ],
            T0,
        )
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(T0), "2026-03-01T04:00:00Z");
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_render_layout() {
        let text = render(&sample_report());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "[2026-03-01T04:00:00Z] REPORT: 4 checks");
        assert_eq!(
            lines[1],
            "[2026-03-01T04:00:00Z] CRITICAL: disk-root = 95 (>= critical 90)"
        );
        assert_eq!(lines[2], "[2026-03-01T04:00:00Z] OK: mcp-github = up (service is up)");
        assert_eq!(lines[3], "[2026-03-01T04:00:00Z] WARNING: cpu = 82.50 (>= warning 80)");
        assert_eq!(
            lines[4],
            "[2026-03-01T04:00:00Z] UNKNOWN: stats = n/a (unreachable: timed out)"
        );
        assert_eq!(
            lines[5],
            "[2026-03-01T04:00:00Z] SUMMARY: overall_score=40 overall_rating=critical"
        );
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_round_trip_severities() {
        let report = sample_report();
        let parsed = parse_severities(&render(&report));
        let expected: Vec<(String, Severity)> = report
            .results
            .iter()
            .map(|r| (r.check.clone(), r.severity))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_round_trip_summary() {
        let report = sample_report();
        assert_eq!(
            parse_summary(&render(&report)),
            Some((report.overall_score, report.overall_rating))
        );
    }

    #[test]
    fn test_empty_report() {
        let text = render(&aggregate_at(vec![], T0));
        assert_eq!(
            text,
            "[2026-03-01T04:00:00Z] REPORT: 0 checks\n\
             [2026-03-01T04:00:00Z] SUMMARY: overall_score=0 overall_rating=critical\n"
        );
        assert!(parse_severities(&text).is_empty());
        assert_eq!(parse_summary(&text), Some((0, Rating::Critical)));
    }

    #[test]
    fn test_multiline_message_stays_on_one_line() {
        let report = aggregate_at(
            vec![result(
                "backups",
                Reading::Unreachable("x".into()),
                Severity::Unknown,
                "unreachable: ls failed\nNo such file",
            )],
            T0,
        );
        let text = render(&report);
        assert_eq!(text.lines().count(), 3);
        let parsed = parse_result_line(text.lines().nth(1).unwrap()).unwrap();
        assert_eq!(parsed.message, "unreachable: ls failed No such file");
    }

    #[test]
    fn test_remediation_suffix() {
        let mut failed = result("mcp-github", Reading::Up(false), Severity::Critical, "service is down");
        failed.remediation = Some(Remediation {
            action: "restart mcp-github.service".to_string(),
            succeeded: true,
            detail: None,
        });
        let text = render(&aggregate_at(vec![failed], T0));
        let line = text.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "[2026-03-01T04:00:00Z] CRITICAL: mcp-github = down (service is down); \
             remediation: restart mcp-github.service: succeeded"
        );

        let parsed = parse_result_line(line).unwrap();
        assert_eq!(parsed.severity, Severity::Critical);
        assert_eq!(parsed.value, "down");
        assert_eq!(parsed.message, "service is down");
        assert_eq!(
            parsed.remediation.as_deref(),
            Some("restart mcp-github.service: succeeded")
        );
    }

    #[test]
    fn test_parse_rejects_other_lines() {
        assert!(parse_result_line("[2026-03-01T04:00:00Z] REPORT: 2 checks").is_none());
        assert!(parse_result_line("[2026-03-01T04:00:00Z] SUMMARY: overall_score=0").is_none());
        assert!(parse_result_line("ok: disk = 5 (fine)").is_none());
        assert!(parse_result_line("[ts] ok: disk = 5 (fine)").is_none());
        assert!(parse_result_line("").is_none());
    }

    #[test]
    fn test_parsed_timestamp() {
        let text = render(&sample_report());
        let parsed = parse_result_line(text.lines().nth(1).unwrap()).unwrap();
        assert_eq!(
            parsed.timestamp.map(|ts| ts.timestamp_millis() as u64),
            Some(T0)
        );
    }

    #[test]
    fn test_json_export() {
        let json = to_json(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["overall_rating"], "critical");
        assert_eq!(value["results"][0]["severity"], "critical");
        assert_eq!(value["results"][1]["check"], "mcp-github");
    }
}
