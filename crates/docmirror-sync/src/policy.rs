//! File update policy for files present on both sides.
//!
//! The default [`CompareMode::Heuristic`] never reads content: a transfer is
//! skipped only when the source timestamp is known, both lengths are equal,
//! and the source is strictly newer than the destination. It is an
//! approximation. Equal-length files whose content differs are not detected
//! when the source is newer, and identical files are rewritten whenever the
//! destination is at least as new. [`CompareMode::Checksum`] trades two full
//! reads for an exact answer.

use docmirror_core::{CompareMode, DocumentProvider, Entry, MirrorError};

/// What to do with a destination file that already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDecision {
    /// Leave the destination untouched.
    Skip,
    /// Overwrite the destination. Carries the source content when the
    /// policy already had to read it.
    Transfer(Option<Vec<u8>>),
}

/// Size-and-timestamp freshness check.
///
/// True only when `source.modified` is known, the lengths are equal, and
/// `source.modified` is strictly greater than `dest.modified`. An unknown
/// destination timestamp never satisfies the comparison.
pub fn is_fresh(source: &Entry, dest: &Entry) -> bool {
    match (source.modified, dest.modified) {
        (Some(source_modified), Some(dest_modified)) => {
            source.length == dest.length && source_modified > dest_modified
        }
        _ => false,
    }
}

/// Decide whether `dest` needs the content of `source`.
pub fn decide<P: DocumentProvider + ?Sized>(
    provider: &P,
    mode: CompareMode,
    source: &Entry,
    dest: &Entry,
) -> Result<FileDecision, MirrorError> {
    match mode {
        CompareMode::Heuristic => {
            if is_fresh(source, dest) {
                Ok(FileDecision::Skip)
            } else {
                Ok(FileDecision::Transfer(None))
            }
        }
        CompareMode::Checksum => {
            if let (Some(source_len), Some(dest_len)) = (source.length, dest.length) {
                if source_len != dest_len {
                    return Ok(FileDecision::Transfer(None));
                }
            }

            let content = provider.read_file(source)?;
            let existing = provider.read_file(dest)?;
            if blake3::hash(&content) == blake3::hash(&existing) {
                Ok(FileDecision::Skip)
            } else {
                Ok(FileDecision::Transfer(Some(content)))
            }
        }
        CompareMode::Always => Ok(FileDecision::Transfer(None)),
    }
}
