//! Entry and locator types shared by every store.

use std::fmt;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::MirrorError;

/// Type tag a store reports for directories.
pub const DIRECTORY_TYPE_TAG: &str = "vnd.android.document/directory";

/// Opaque handle a store uses to address one entry.
///
/// Locators are never interpreted by the reconciler; only the provider that
/// produced one knows what it means (a content URI, a path, a key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Create a locator from any string-like value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the raw locator string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the locator is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Locator {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Type of entry in a document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    /// Regular document.
    File,
    /// Container of other entries.
    Directory,
}

impl EntryKind {
    /// Map a store type tag to an entry kind.
    ///
    /// Only the directory tag maps to [`EntryKind::Directory`]; every other
    /// tag, including unknown MIME types, is a file.
    pub fn from_type_tag(tag: &str) -> Self {
        if tag == DIRECTORY_TYPE_TAG {
            Self::Directory
        } else {
            Self::File
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Check if this is a file.
    pub fn is_file(self) -> bool {
        matches!(self, Self::File)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "FILE"),
            Self::Directory => write!(f, "DIR"),
        }
    }
}

/// Non-owning reference to the directory that contains an entry.
///
/// Carries just enough to re-derive the parent as a directory [`Entry`] when
/// an entry has to be recreated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// Locator of the containing directory.
    pub locator: Locator,
    /// Name of the containing directory.
    pub name: CompactString,
}

impl ParentRef {
    /// Re-derive the parent as a directory entry.
    ///
    /// The derived entry has no parent of its own.
    pub fn to_entry(&self) -> Entry {
        Entry::directory(self.locator.clone(), self.name.clone())
    }
}

/// One node of a source or destination tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Display name, unique among siblings.
    pub name: CompactString,

    /// Store handle for this node.
    pub locator: Locator,

    /// File or directory.
    pub kind: EntryKind,

    /// Containing directory, `None` for a root.
    pub parent: Option<ParentRef>,

    /// Length in bytes (files only, when known).
    pub length: Option<u64>,

    /// Last modification in milliseconds since the Unix epoch (files only, when known).
    pub modified: Option<i64>,
}

impl Entry {
    /// Create a directory entry with no parent.
    pub fn directory(locator: impl Into<Locator>, name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
            kind: EntryKind::Directory,
            parent: None,
            length: None,
            modified: None,
        }
    }

    /// Create a file entry with no parent and no metadata.
    pub fn file(locator: impl Into<Locator>, name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
            kind: EntryKind::File,
            parent: None,
            length: None,
            modified: None,
        }
    }

    /// Create an entry of the given kind.
    pub fn new(
        locator: impl Into<Locator>,
        name: impl Into<CompactString>,
        kind: EntryKind,
    ) -> Self {
        match kind {
            EntryKind::File => Self::file(locator, name),
            EntryKind::Directory => Self::directory(locator, name),
        }
    }

    /// Attach the containing directory.
    pub fn with_parent(mut self, parent: &Entry) -> Self {
        self.parent = Some(parent.as_parent());
        self
    }

    /// Attach length and modification time. Directories ignore both.
    pub fn with_metadata(mut self, length: Option<u64>, modified: Option<i64>) -> Self {
        if self.kind.is_file() {
            self.length = length;
            self.modified = modified;
        }
        self
    }

    /// Build the back-reference children of this entry carry.
    pub fn as_parent(&self) -> ParentRef {
        ParentRef {
            locator: self.locator.clone(),
            name: self.name.clone(),
        }
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this entry is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Modification time as a calendar timestamp, if known and representable.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified.and_then(DateTime::from_timestamp_millis)
    }

    /// Fail with a precondition error unless this entry is a directory.
    pub fn require_directory(&self, operation: &'static str) -> Result<(), MirrorError> {
        self.require(operation, EntryKind::Directory)
    }

    /// Fail with a precondition error unless this entry is a file.
    pub fn require_file(&self, operation: &'static str) -> Result<(), MirrorError> {
        self.require(operation, EntryKind::File)
    }

    fn require(&self, operation: &'static str, expected: EntryKind) -> Result<(), MirrorError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(MirrorError::Precondition {
                operation,
                name: self.name.clone(),
                expected,
            })
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} at {}", self.kind, self.name, self.locator)
    }
}

/// Out-of-band metadata for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStat {
    /// Kind reported by the store.
    pub kind: EntryKind,
    /// Length in bytes.
    pub length: u64,
    /// Last modification in milliseconds since the Unix epoch, if reported.
    pub modified: Option<i64>,
}

impl EntryStat {
    /// Create a new stat result.
    pub fn new(kind: EntryKind, length: u64, modified: Option<i64>) -> Self {
        Self {
            kind,
            length,
            modified,
        }
    }
}
