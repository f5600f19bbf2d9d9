//! Memory usage probe reading a meminfo file.

use std::path::{Path, PathBuf};

use crate::AdapterError;

/// Default location of the kernel's memory statistics.
pub const DEFAULT_MEMINFO: &str = "/proc/meminfo";

/// Probe for memory usage.
#[derive(Debug, Clone)]
pub struct MemoryProbe {
    meminfo: PathBuf,
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new(DEFAULT_MEMINFO)
    }
}

impl MemoryProbe {
    /// A probe reading the given meminfo file.
    pub fn new(meminfo: impl AsRef<Path>) -> Self {
        Self {
            meminfo: meminfo.as_ref().to_path_buf(),
        }
    }

    /// Used memory in percent: `100 * (MemTotal - MemAvailable) / MemTotal`.
    pub async fn usage_percent(&self) -> Result<f64, AdapterError> {
        let content = tokio::fs::read_to_string(&self.meminfo).await?;
        parse_meminfo(&content)
    }
}

/// Compute used memory from meminfo content.
///
/// Falls back to `MemFree + Buffers + Cached` on kernels that do not report
/// `MemAvailable`.
pub fn parse_meminfo(content: &str) -> Result<f64, AdapterError> {
    let field = |name: &str| -> Option<f64> {
        content.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            rest.split_whitespace().next()?.parse::<f64>().ok()
        })
    };

    let total = field("MemTotal")
        .ok_or_else(|| AdapterError::Parse("meminfo has no MemTotal".to_string()))?;
    if total <= 0.0 {
        return Err(AdapterError::Parse("MemTotal is zero".to_string()));
    }

    let available = match field("MemAvailable") {
        Some(available) => available,
        None => {
            let free = field("MemFree")
                .ok_or_else(|| AdapterError::Parse("meminfo has no MemFree".to_string()))?;
            free + field("Buffers").unwrap_or(0.0) + field("Cached").unwrap_or(0.0)
        }
    };

    let used = (total - available).max(0.0);
    Ok(used / total * 100.0)
}
