//! Report aggregation: per-check results into one scored report.

use fleetwatch_types::{current_timestamp_ms, CheckResult, Rating, Report, SchemaVersion};

/// Mean of per-result scores, truncated to an integer.
///
/// An empty result set scores 0: absence of data is never healthy.
pub fn overall_score(results: &[CheckResult]) -> u8 {
    if results.is_empty() {
        return 0;
    }
    let total: u64 = results.iter().map(|r| u64::from(r.severity.score())).sum();
    (total / results.len() as u64).min(100) as u8
}

/// Aggregate results into a report stamped with the current time.
pub fn aggregate(results: Vec<CheckResult>) -> Report {
    aggregate_at(results, current_timestamp_ms())
}

/// Aggregate results into a report with a specific timestamp.
///
/// Results keep the order they are given in.
pub fn aggregate_at(results: Vec<CheckResult>, generated_at_ms: u64) -> Report {
    let overall_score = overall_score(&results);
    Report {
        version: SchemaVersion::current(),
        generated_at_ms,
        results,
        overall_score,
        overall_rating: Rating::from_score(overall_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_types::{Reading, Sample, Severity};

    fn result(name: &str, severity: Severity) -> CheckResult {
        CheckResult::new(
            name,
            Sample::with_timestamp(name, Reading::Number(0.0), 0),
            severity,
            "",
        )
    }

    #[test]
    fn test_empty_is_critical() {
        let report = aggregate(vec![]);
        assert_eq!(report.overall_score, 0);
        assert_eq!(report.overall_rating, Rating::Critical);
        assert!(report.results.is_empty());
    }

    #[test]
    fn test_ok_and_warning_is_good() {
        let report = aggregate_at(
            vec![result("disk", Severity::Ok), result("cpu", Severity::Warning)],
            1,
        );
        assert_eq!(report.overall_score, 80);
        assert_eq!(report.overall_rating, Rating::Good);
        assert_eq!(report.generated_at_ms, 1);
    }

    #[test]
    fn test_unknown_counts_as_failure() {
        let report = aggregate(vec![
            result("a", Severity::Ok),
            result("b", Severity::Unknown),
        ]);
        assert_eq!(report.overall_score, 50);
        assert_eq!(report.overall_rating, Rating::Critical);
    }

    #[test]
    fn test_score_truncates() {
        // (100 + 100 + 60) / 3 = 86.67
        let report = aggregate(vec![
            result("a", Severity::Ok),
            result("b", Severity::Ok),
            result("c", Severity::Warning),
        ]);
        assert_eq!(report.overall_score, 86);
        assert_eq!(report.overall_rating, Rating::Good);
    }

    #[test]
    fn test_all_ok_is_excellent() {
        let report = aggregate(vec![result("a", Severity::Ok), result("b", Severity::Ok)]);
        assert_eq!(report.overall_score, 100);
        assert_eq!(report.overall_rating, Rating::Excellent);
    }

    #[test]
    fn test_order_preserved() {
        let report = aggregate(vec![
            result("z", Severity::Critical),
            result("a", Severity::Ok),
            result("m", Severity::Warning),
        ]);
        let names: Vec<&str> = report.results.iter().map(|r| r.check.as_str()).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }
}
