//! Filesystem usage probe backed by `df -P`.

use std::path::Path;

use crate::process;
use crate::AdapterError;

/// Probe for filesystem usage.
#[derive(Debug, Clone)]
pub struct DiskProbe {
    df: String,
}

impl Default for DiskProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskProbe {
    /// A probe using `df` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("df")
    }

    /// A probe using a specific `df` binary.
    pub fn with_program(df: impl Into<String>) -> Self {
        Self { df: df.into() }
    }

    /// Used space, in percent, of the filesystem holding `path`.
    pub async fn usage_percent(&self, path: &Path) -> Result<f64, AdapterError> {
        let stdout = process::run(&self.df, [std::ffi::OsStr::new("-P"), path.as_os_str()])
            .await?
            .into_success(&self.df)?;
        parse_df_output(&stdout)
    }
}

/// Parse POSIX `df -P` output and return the capacity column of the first
/// filesystem row.
///
/// ```text
/// Filesystem     1024-blocks      Used Available Capacity Mounted on
/// /dev/sda1         41152736  34980824   6171912      86% /
/// ```
pub fn parse_df_output(stdout: &str) -> Result<f64, AdapterError> {
    let row = stdout
        .lines()
        .skip(1)
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| AdapterError::Parse("df printed no filesystem row".to_string()))?;

    // The mount point may contain spaces, so count columns from the left.
    let capacity = row
        .split_whitespace()
        .nth(4)
        .ok_or_else(|| AdapterError::Parse(format!("unexpected df row: {}", row)))?;

    capacity
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| AdapterError::Parse(format!("bad capacity column: {}", capacity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_df_output() {
        let out = "Filesystem     1024-blocks      Used Available Capacity Mounted on\n\
                   /dev/sda1         41152736  34980824   6171912      86% /\n";
        assert_eq!(parse_df_output(out).unwrap(), 86.0);
    }

    #[test]
    fn test_parse_df_mount_with_spaces() {
        let out = "Filesystem 1024-blocks Used Available Capacity Mounted on\n\
                   /dev/sdb1 1000 950 50 95% /mnt/backup disk\n";
        assert_eq!(parse_df_output(out).unwrap(), 95.0);
    }

    #[test]
    fn test_parse_df_errors() {
        assert!(parse_df_output("Filesystem 1024-blocks Used\n").is_err());
        assert!(parse_df_output("header\n/dev/sda1 1 2\n").is_err());
        assert!(parse_df_output("header\n/dev/sda1 1 2 3 lots /\n").is_err());
    }

    #[tokio::test]
    async fn test_usage_of_current_dir() {
        let usage = DiskProbe::new().usage_percent(Path::new(".")).await.unwrap();
        assert!((0.0..=100.0).contains(&usage));
    }

    #[tokio::test]
    async fn test_missing_path_is_error() {
        let err = DiskProbe::new()
            .usage_percent(Path::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Command { .. }));
    }
}
