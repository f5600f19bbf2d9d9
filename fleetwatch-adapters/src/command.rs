//! Generic command probe: the first token of stdout is the reading.
//!
//! This covers the ad-hoc scripts operators already have, such as a
//! documentation quality-score script or `find ... | wc -l`.

use crate::process;
use crate::AdapterError;

/// Run `program args...` and parse the leading number of its output.
pub async fn command_value(program: &str, args: &[String]) -> Result<f64, AdapterError> {
    let stdout = process::run(program, args).await?.into_success(program)?;
    parse_leading_number(&stdout)
}

/// Parse the first whitespace-separated token as a number.
///
/// A trailing `%` is accepted so scripts may print `87%`.
pub fn parse_leading_number(stdout: &str) -> Result<f64, AdapterError> {
    let token = stdout
        .split_whitespace()
        .next()
        .ok_or_else(|| AdapterError::Parse("command printed nothing".to_string()))?;

    token
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| AdapterError::Parse(format!("not a number: {:?}", token)))
}
