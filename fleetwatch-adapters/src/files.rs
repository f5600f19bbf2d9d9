//! Directory file-count probe, e.g. for counting recent backups.

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::AdapterError;

/// Filter applied to directory entries before counting.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// Only count files whose name ends with this suffix.
    pub suffix: Option<String>,
    /// Only count files modified within this window.
    pub max_age: Option<Duration>,
}

impl FileFilter {
    fn matches(&self, name: &str, modified: Option<SystemTime>, now: SystemTime) -> bool {
        if let Some(suffix) = &self.suffix {
            if !name.ends_with(suffix.as_str()) {
                return false;
            }
        }
        match (self.max_age, modified) {
            (None, _) => true,
            (Some(max_age), Some(modified)) => now
                .duration_since(modified)
                .map(|age| age <= max_age)
                // Modified in the future (clock skew): count it as fresh.
                .unwrap_or(true),
            (Some(_), None) => false,
        }
    }
}

/// Count regular files directly inside `dir` that pass the filter.
///
/// Subdirectories are not descended into.
pub async fn count_files(dir: &Path, filter: &FileFilter) -> Result<u64, AdapterError> {
    let now = SystemTime::now();
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            // The file may vanish between listing and stat (rotation).
            Err(_) => continue,
        };
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if filter.matches(&name, metadata.modified().ok(), now) {
            count += 1;
        }
    }

    Ok(count)
}
