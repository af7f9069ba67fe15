//! Summary of what a reconciliation run changed.

use serde::{Deserialize, Serialize};

/// Counters collected while reconciling two trees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Directory pairs taken off the work list.
    pub dirs_visited: u64,
    /// Directories created in the destination.
    pub dirs_created: u64,
    /// Files created in the destination.
    pub files_created: u64,
    /// Existing destination files whose content was overwritten.
    pub files_updated: u64,
    /// Existing destination files left untouched by the compare policy.
    pub files_skipped: u64,
    /// Destination entries removed because the source has no such name.
    pub entries_removed: u64,
    /// Destination entries removed because the source has a different kind.
    pub entries_replaced: u64,
    /// Bytes written to destination files.
    pub bytes_written: u64,
}

impl SyncReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store mutations the counters account for.
    pub fn mutation_count(&self) -> u64 {
        self.dirs_created
            + self.files_created
            + self.files_updated
            + self.entries_removed
            + self.entries_replaced
    }

    /// Check whether the run left the destination untouched.
    pub fn is_noop(&self) -> bool {
        self.mutation_count() == 0
    }

    /// Get a human-readable summary of the run.
    pub fn summary(&self) -> String {
        if self.is_noop() {
            return format!(
                "Already in sync ({} directories checked, {} files skipped)",
                self.dirs_visited, self.files_skipped
            );
        }

        let mut summary = format!(
            "Created {} directories and {} files, updated {}, removed {}",
            self.dirs_created,
            self.files_created,
            self.files_updated,
            self.entries_removed
        );
        if self.entries_replaced > 0 {
            summary.push_str(&format!(", replaced {}", self.entries_replaced));
        }
        summary.push_str(&format!(
            " ({} written, {} skipped)",
            humansize::format_size(self.bytes_written, humansize::BINARY),
            self.files_skipped
        ));
        summary
    }
}
