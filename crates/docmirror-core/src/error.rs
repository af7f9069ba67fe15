//! Error types for store and mirroring operations.

use compact_str::CompactString;
use thiserror::Error;

use crate::entry::{EntryKind, Locator};

/// Errors that can occur while talking to a store or mirroring a tree.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// An operation was called on an entry of the wrong kind.
    #[error("Cannot {operation} on {name}: expected {expected}")]
    Precondition {
        operation: &'static str,
        name: CompactString,
        expected: EntryKind,
    },

    /// Entry not found.
    #[error("Entry not found: {locator}")]
    NotFound { locator: Locator },

    /// Permission denied for an entry.
    #[error("Permission denied: {locator}")]
    PermissionDenied { locator: Locator },

    /// Generic I/O error.
    #[error("I/O error at {locator}: {source}")]
    Io {
        locator: Locator,
        #[source]
        source: std::io::Error,
    },

    /// An external store command exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The store answered with a payload that could not be understood.
    #[error("Malformed response for {locator}: {message}")]
    Malformed { locator: Locator, message: String },

    /// An entry had to be recreated in place but has no parent.
    #[error("Cannot recreate {name}: entry has no parent")]
    OrphanedEntry { name: CompactString },

    /// A failure injected by a test store.
    #[error("Injected failure during {operation} of {name}")]
    InjectedFailure {
        operation: &'static str,
        name: CompactString,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl MirrorError {
    /// Create an I/O error with locator context.
    pub fn io(locator: impl Into<Locator>, source: std::io::Error) -> Self {
        let locator = locator.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { locator },
            std::io::ErrorKind::NotFound => Self::NotFound { locator },
            _ => Self::Io { locator, source },
        }
    }

    /// Create a malformed-response error.
    pub fn malformed(locator: impl Into<Locator>, message: impl Into<String>) -> Self {
        Self::Malformed {
            locator: locator.into(),
            message: message.into(),
        }
    }

    /// Check whether this error is a caller bug rather than a store failure.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_error_io() {
        let err = MirrorError::io(
            "content://tree/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, MirrorError::PermissionDenied { .. }));

        let err = MirrorError::io(
            "content://tree/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, MirrorError::NotFound { .. }));

        let err = MirrorError::io("x", std::io::Error::other("boom"));
        assert!(matches!(err, MirrorError::Io { .. }));
    }

    #[test]
    fn test_precondition_message() {
        let err = MirrorError::Precondition {
            operation: "create file",
            name: "notes.txt".into(),
            expected: EntryKind::Directory,
        };
        assert!(err.is_precondition());
        assert_eq!(
            err.to_string(),
            "Cannot create file on notes.txt: expected DIR"
        );
    }
}
