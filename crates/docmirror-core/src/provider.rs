//! The capability interface every store implements.

use crate::entry::{Entry, EntryStat};
use crate::error::MirrorError;

/// Primitive operations against a hierarchical document store.
///
/// Every method is a single blocking round trip. Implementations check the
/// kind preconditions with [`Entry::require_directory`] and
/// [`Entry::require_file`] before touching the store.
pub trait DocumentProvider {
    /// List the children of a directory.
    ///
    /// Returned entries carry `dir` as their parent. Order is unspecified and
    /// a store may return duplicate names.
    fn list(&self, dir: &Entry) -> Result<Vec<Entry>, MirrorError>;

    /// Create an empty directory named `name` inside `parent`.
    fn create_directory(&self, parent: &Entry, name: &str) -> Result<Entry, MirrorError>;

    /// Create a file named `name` inside `parent`, writing `content` if given.
    fn create_file(
        &self,
        parent: &Entry,
        name: &str,
        content: Option<&[u8]>,
    ) -> Result<Entry, MirrorError>;

    /// Read the full content of a file.
    fn read_file(&self, file: &Entry) -> Result<Vec<u8>, MirrorError>;

    /// Replace the full content of a file.
    fn write_file(&self, file: &Entry, content: &[u8]) -> Result<(), MirrorError>;

    /// Remove an entry, including the subtree of a directory.
    fn remove(&self, entry: &Entry) -> Result<(), MirrorError>;

    /// Query metadata for a single file.
    fn stat(&self, file: &Entry) -> Result<EntryStat, MirrorError>;
}

impl<P: DocumentProvider + ?Sized> DocumentProvider for &P {
    fn list(&self, dir: &Entry) -> Result<Vec<Entry>, MirrorError> {
        (**self).list(dir)
    }

    fn create_directory(&self, parent: &Entry, name: &str) -> Result<Entry, MirrorError> {
        (**self).create_directory(parent, name)
    }

    fn create_file(
        &self,
        parent: &Entry,
        name: &str,
        content: Option<&[u8]>,
    ) -> Result<Entry, MirrorError> {
        (**self).create_file(parent, name, content)
    }

    fn read_file(&self, file: &Entry) -> Result<Vec<u8>, MirrorError> {
        (**self).read_file(file)
    }

    fn write_file(&self, file: &Entry, content: &[u8]) -> Result<(), MirrorError> {
        (**self).write_file(file, content)
    }

    fn remove(&self, entry: &Entry) -> Result<(), MirrorError> {
        (**self).remove(entry)
    }

    fn stat(&self, file: &Entry) -> Result<EntryStat, MirrorError> {
        (**self).stat(file)
    }
}

impl<P: DocumentProvider + ?Sized> DocumentProvider for Box<P> {
    fn list(&self, dir: &Entry) -> Result<Vec<Entry>, MirrorError> {
        (**self).list(dir)
    }

    fn create_directory(&self, parent: &Entry, name: &str) -> Result<Entry, MirrorError> {
        (**self).create_directory(parent, name)
    }

    fn create_file(
        &self,
        parent: &Entry,
        name: &str,
        content: Option<&[u8]>,
    ) -> Result<Entry, MirrorError> {
        (**self).create_file(parent, name, content)
    }

    fn read_file(&self, file: &Entry) -> Result<Vec<u8>, MirrorError> {
        (**self).read_file(file)
    }

    fn write_file(&self, file: &Entry, content: &[u8]) -> Result<(), MirrorError> {
        (**self).write_file(file, content)
    }

    fn remove(&self, entry: &Entry) -> Result<(), MirrorError> {
        (**self).remove(entry)
    }

    fn stat(&self, file: &Entry) -> Result<EntryStat, MirrorError> {
        (**self).stat(file)
    }
}
