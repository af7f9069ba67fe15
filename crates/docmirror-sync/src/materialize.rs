//! Construction of destination entries that mirror a source entry.

use tracing::info;

use docmirror_core::{DocumentProvider, Entry, EntryKind, MirrorError};

/// A source directory paired with its destination counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPair {
    pub source: Entry,
    pub dest: Entry,
}

impl WorkPair {
    /// Pair a source directory with a destination entry.
    pub fn new(source: Entry, dest: Entry) -> Self {
        Self { source, dest }
    }
}

/// Outcome of [`materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// An empty directory was created; its children are still to be reconciled.
    Directory(WorkPair),
    /// A file was created with the full source content.
    File { entry: Entry, bytes: u64 },
}

impl Materialized {
    /// The directory pair that still needs reconciling, if any.
    pub fn into_pending(self) -> Option<WorkPair> {
        match self {
            Self::Directory(pair) => Some(pair),
            Self::File { .. } => None,
        }
    }
}

/// Create a new entry under `dest_parent` mirroring `source`.
///
/// Directories are created empty. Files are created with the complete source
/// content in a single `create_file` call.
pub fn materialize<P: DocumentProvider + ?Sized>(
    provider: &P,
    source: &Entry,
    dest_parent: &Entry,
) -> Result<Materialized, MirrorError> {
    dest_parent.require_directory("materialize")?;
    info!("Creating {} in {} to match", source.name, dest_parent.name);

    match source.kind {
        EntryKind::Directory => {
            let created = provider.create_directory(dest_parent, &source.name)?;
            Ok(Materialized::Directory(WorkPair::new(source.clone(), created)))
        }
        EntryKind::File => {
            let content = provider.read_file(source)?;
            let entry = provider.create_file(dest_parent, &source.name, Some(&content))?;
            Ok(Materialized::File {
                entry,
                bytes: content.len() as u64,
            })
        }
    }
}
