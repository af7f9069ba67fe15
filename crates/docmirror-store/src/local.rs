//! Local filesystem store.
//!
//! Locators are plain paths. Lets a tree on disk be mirrored with the same
//! engine that drives remote stores.
//!
//! A path that is not valid UTF-8 gets a locator made of a NUL marker and the
//! hex-encoded raw path bytes. No real path contains NUL, so the two forms
//! never collide. Entry names stay lossy, so such an entry is recreated on
//! the other side under its lossy name.

use std::fs::{self, Metadata};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::debug;

use docmirror_core::{DocumentProvider, Entry, EntryKind, EntryStat, Locator, MirrorError};

/// Store backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProvider;

impl LocalProvider {
    /// Create a new local provider.
    pub fn new() -> Self {
        Self
    }

    /// Open an existing path as an entry.
    ///
    /// The entry kind comes from the path's metadata; the entry has no parent.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Entry, MirrorError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| MirrorError::io(locator_for(path), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(entry_from_metadata(path, name, &metadata))
    }

    /// Open an existing directory as a tree root.
    pub fn open_root(&self, path: impl AsRef<Path>) -> Result<Entry, MirrorError> {
        let entry = self.open(path)?;
        entry.require_directory("open root")?;
        Ok(entry)
    }
}

/// Marks a locator holding hex-encoded raw path bytes.
const RAW_MARKER: char = '\0';

fn locator_for(path: &Path) -> Locator {
    match path.to_str() {
        Some(path) => Locator::new(path),
        None => Locator::new(encode_raw(path)),
    }
}

#[cfg(unix)]
fn encode_raw(path: &Path) -> String {
    use std::os::unix::ffi::OsStrExt;

    let bytes = path.as_os_str().as_bytes();
    let mut encoded = String::with_capacity(1 + bytes.len() * 2);
    encoded.push(RAW_MARKER);
    for byte in bytes {
        encoded.push_str(&format!("{byte:02x}"));
    }
    encoded
}

#[cfg(not(unix))]
fn encode_raw(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn path_of(entry: &Entry) -> Result<PathBuf, MirrorError> {
    let locator = entry.locator.as_str();
    match locator.strip_prefix(RAW_MARKER) {
        Some(hex) => decode_raw(hex).ok_or_else(|| {
            MirrorError::malformed(entry.locator.clone(), "undecodable raw path locator")
        }),
        None => Ok(PathBuf::from(locator)),
    }
}

#[cfg(unix)]
fn decode_raw(hex: &str) -> Option<PathBuf> {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    if hex.len() % 2 != 0 {
        return None;
    }
    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect::<Option<Vec<u8>>>()?;
    Some(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn decode_raw(_hex: &str) -> Option<PathBuf> {
    None
}

/// Metadata of a listed child, following symlinks when the target exists.
///
/// A dangling symlink is reported through its own metadata and lists as a
/// file, so it can still be removed.
fn child_metadata(path: &Path) -> Result<Metadata, MirrorError> {
    fs::metadata(path)
        .or_else(|_| fs::symlink_metadata(path))
        .map_err(|e| MirrorError::io(locator_for(path), e))
}

fn modified_millis(metadata: &Metadata) -> Option<i64> {
    metadata
        .modified()
        .ok()
        .map(|time: SystemTime| DateTime::<Utc>::from(time).timestamp_millis())
}

fn entry_from_metadata(path: &Path, name: String, metadata: &Metadata) -> Entry {
    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    Entry::new(locator_for(path), name, kind)
        .with_metadata(Some(metadata.len()), modified_millis(metadata))
}

/// Write `content` next to `target` and move it into place in one rename.
fn write_atomic(target: &Path, content: &[u8]) -> Result<(), MirrorError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| MirrorError::io(locator_for(dir), e))?;
    temp.write_all(content)
        .map_err(|e| MirrorError::io(locator_for(target), e))?;
    temp.persist(target)
        .map_err(|e| MirrorError::io(locator_for(target), e.error))?;
    Ok(())
}

impl DocumentProvider for LocalProvider {
    fn list(&self, dir: &Entry) -> Result<Vec<Entry>, MirrorError> {
        dir.require_directory("list")?;
        let path = path_of(dir)?;
        let read_dir = fs::read_dir(&path).map_err(|e| MirrorError::io(dir.locator.clone(), e))?;

        let mut children = Vec::new();
        for item in read_dir {
            let item = item.map_err(|e| MirrorError::io(dir.locator.clone(), e))?;
            let child_path = item.path();
            let metadata = child_metadata(&child_path)?;
            let name = item.file_name().to_string_lossy().into_owned();
            children.push(entry_from_metadata(&child_path, name, &metadata).with_parent(dir));
        }

        debug!("Listed {} entries in {}", children.len(), path.display());
        Ok(children)
    }

    fn create_directory(&self, parent: &Entry, name: &str) -> Result<Entry, MirrorError> {
        parent.require_directory("create directory")?;
        let path = path_of(parent)?.join(name);
        fs::create_dir(&path).map_err(|e| MirrorError::io(locator_for(&path), e))?;
        Ok(Entry::directory(locator_for(&path), name).with_parent(parent))
    }

    fn create_file(
        &self,
        parent: &Entry,
        name: &str,
        content: Option<&[u8]>,
    ) -> Result<Entry, MirrorError> {
        parent.require_directory("create file")?;
        let path = path_of(parent)?.join(name);
        match content {
            Some(content) => write_atomic(&path, content)?,
            None => {
                fs::File::create(&path).map_err(|e| MirrorError::io(locator_for(&path), e))?;
            }
        }

        let metadata = fs::metadata(&path).map_err(|e| MirrorError::io(locator_for(&path), e))?;
        Ok(entry_from_metadata(&path, name.to_string(), &metadata).with_parent(parent))
    }

    fn read_file(&self, file: &Entry) -> Result<Vec<u8>, MirrorError> {
        file.require_file("read")?;
        fs::read(path_of(file)?).map_err(|e| MirrorError::io(file.locator.clone(), e))
    }

    fn write_file(&self, file: &Entry, content: &[u8]) -> Result<(), MirrorError> {
        file.require_file("write")?;
        write_atomic(&path_of(file)?, content)
    }

    fn remove(&self, entry: &Entry) -> Result<(), MirrorError> {
        let path = path_of(entry)?;
        let metadata =
            fs::symlink_metadata(&path).map_err(|e| MirrorError::io(entry.locator.clone(), e))?;
        let result = if metadata.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| MirrorError::io(entry.locator.clone(), e))
    }

    fn stat(&self, file: &Entry) -> Result<EntryStat, MirrorError> {
        file.require_file("stat")?;
        let metadata =
            fs::metadata(path_of(file)?).map_err(|e| MirrorError::io(file.locator.clone(), e))?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Ok(EntryStat::new(kind, metadata.len(), modified_millis(&metadata)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_root_requires_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();

        let provider = LocalProvider::new();
        assert!(provider.open_root(temp.path()).unwrap().is_dir());
        assert!(provider.open_root(&file).unwrap_err().is_precondition());
    }

    #[test]
    fn test_create_file_with_content() {
        let temp = TempDir::new().unwrap();
        let provider = LocalProvider::new();
        let root = provider.open_root(temp.path()).unwrap();

        let file = provider.create_file(&root, "a.txt", Some(b"hello".as_slice())).unwrap();
        assert_eq!(file.length, Some(5));
        assert_eq!(fs::read(temp.path().join("a.txt")).unwrap(), b"hello");

        // No temporary files left behind.
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_list_and_remove() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/a.md"), b"a").unwrap();
        fs::write(temp.path().join("b.txt"), b"bb").unwrap();

        let provider = LocalProvider::new();
        let root = provider.open_root(temp.path()).unwrap();
        let mut listing = provider.list(&root).unwrap();
        listing.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "b.txt");
        assert_eq!(listing[0].length, Some(2));
        assert!(listing[0].modified.is_some());
        assert!(listing[1].is_dir());

        provider.remove(&listing[1]).unwrap();
        assert!(!temp.path().join("docs").exists());
    }

    #[test]
    fn test_utf8_paths_are_plain_locators() {
        let path = Path::new("/tmp/docs/report.csv");
        let locator = locator_for(path);
        assert_eq!(locator.as_str(), "/tmp/docs/report.csv");
        assert_eq!(path_of(&Entry::file(locator, "report.csv")).unwrap(), path);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_locator_is_lossless() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/tmp").join(OsStr::from_bytes(b"caf\xe9.txt"));
        let locator = locator_for(&path);
        assert!(locator.as_str().starts_with(RAW_MARKER));
        assert_eq!(path_of(&Entry::file(locator, "caf.txt")).unwrap(), path);
    }

    #[test]
    fn test_corrupt_raw_locator_is_malformed() {
        let entry = Entry::file("\0zz", "broken");
        let err = path_of(&entry).unwrap_err();
        assert!(matches!(err, MirrorError::Malformed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_lists_as_file() {
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", temp.path().join("stale")).unwrap();

        let provider = LocalProvider::new();
        let root = provider.open_root(temp.path()).unwrap();
        let listing = provider.list(&root).unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing[0].is_file());

        provider.remove(&listing[0]).unwrap();
        assert!(fs::symlink_metadata(temp.path().join("stale")).is_err());
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let temp = TempDir::new().unwrap();
        let provider = LocalProvider::new();
        let err = provider.open(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, MirrorError::NotFound { .. }));
    }
}
