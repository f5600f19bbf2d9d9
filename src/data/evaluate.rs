//! Threshold evaluation: turn a sample into a severity and a message.

use fleetwatch_types::{Check, CheckKind, CheckResult, Direction, Reading, Sample, Severity, Threshold};

/// Classify a sample against a threshold.
///
/// The unreachable sentinel maps to `Unknown`; a value exactly on a bound
/// belongs to the more severe band.
pub fn classify(sample: &Sample, threshold: &Threshold) -> Severity {
    match &sample.reading {
        Reading::Number(value) if value.is_finite() => threshold.classify(*value),
        _ => Severity::Unknown,
    }
}

/// Evaluate one sample for its check.
///
/// Never fails: any reading that cannot be judged (unreachable collaborator,
/// wrong reading shape, missing threshold) is `Unknown` with an explanation.
pub fn evaluate(check: &Check, sample: Sample) -> CheckResult {
    let (severity, message) = judge(check, &sample.reading);
    CheckResult::new(check.name.clone(), sample, severity, message)
}

fn judge(check: &Check, reading: &Reading) -> (Severity, String) {
    if let Reading::Unreachable(reason) = reading {
        return (Severity::Unknown, format!("unreachable: {}", reason));
    }

    match (check.kind, reading) {
        (CheckKind::Service, Reading::Up(true)) => (Severity::Ok, "service is up".to_string()),
        (CheckKind::Service, Reading::Up(false)) => {
            (Severity::Critical, "service is down".to_string())
        }
        (CheckKind::Service, other) => (
            Severity::Unknown,
            format!("expected an up/down reading, got {}", other),
        ),
        (_, Reading::Number(value)) => match &check.threshold {
            Some(threshold) => judge_number(*value, threshold),
            None => (Severity::Unknown, "no threshold configured".to_string()),
        },
        (kind, other) => (
            Severity::Unknown,
            format!("expected a {} reading, got {}", kind, other),
        ),
    }
}

fn judge_number(value: f64, threshold: &Threshold) -> (Severity, String) {
    if !value.is_finite() {
        return (
            Severity::Unknown,
            "reading is not a finite number".to_string(),
        );
    }

    let severity = threshold.classify(value);
    let op = match threshold.direction {
        Direction::Above => ">=",
        Direction::Below => "<=",
    };
    let message = match threshold.bound_for(severity) {
        Some(bound) => format!(
            "{} {} {}",
            op,
            severity.label().to_ascii_lowercase(),
            number(bound)
        ),
        None => {
            let within = match threshold.direction {
                Direction::Above => "<",
                Direction::Below => ">",
            };
            format!("{} warning {}", within, number(threshold.warning))
        }
    };
    (severity, message)
}

fn number(value: f64) -> String {
    Reading::Number(value).to_string()
}
