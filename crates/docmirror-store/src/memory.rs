//! In-memory document store.
//!
//! Backs the reconciler's tests: trees are seeded directly, every primitive
//! call is recorded in an operation log, and individual operations can be
//! made to fail on demand.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use compact_str::CompactString;

use docmirror_core::{DocumentProvider, Entry, EntryKind, EntryStat, Locator, MirrorError};

/// Primitive operation kinds, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    List,
    CreateDirectory,
    CreateFile,
    Read,
    Write,
    Remove,
    Stat,
}

impl OpKind {
    /// Short lowercase name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::CreateDirectory => "create directory",
            Self::CreateFile => "create file",
            Self::Read => "read",
            Self::Write => "write",
            Self::Remove => "remove",
            Self::Stat => "stat",
        }
    }

    /// Check whether operations of this kind change the store.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::CreateDirectory | Self::CreateFile | Self::Write | Self::Remove
        )
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded primitive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOp {
    /// Which primitive was called.
    pub kind: OpKind,
    /// Name of the entry the call addressed (the new child for creations).
    pub name: CompactString,
    /// Locator of the addressed entry (the parent for creations).
    pub locator: Locator,
}

impl ProviderOp {
    /// Check whether this call changed the store.
    pub fn is_mutation(&self) -> bool {
        self.kind.is_mutation()
    }
}

impl fmt::Display for ProviderOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Content of one node in a [`MemoryProvider::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotNode {
    Directory,
    File(Vec<u8>),
}

#[derive(Debug)]
struct Node {
    name: CompactString,
    kind: EntryKind,
    parent: Option<Locator>,
    children: Vec<Locator>,
    content: Vec<u8>,
    modified: i64,
}

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<Locator, Node>,
    next_id: u64,
    clock: i64,
    ops: Vec<ProviderOp>,
    failures: Vec<(OpKind, CompactString)>,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn observe(&mut self, modified: i64) {
        self.clock = self.clock.max(modified);
    }

    fn record(&mut self, kind: OpKind, name: &str, locator: &Locator) -> Result<(), MirrorError> {
        self.ops.push(ProviderOp {
            kind,
            name: name.into(),
            locator: locator.clone(),
        });

        let injected = self
            .failures
            .iter()
            .any(|(op, target)| *op == kind && target == name);
        if injected {
            return Err(MirrorError::InjectedFailure {
                operation: kind.as_str(),
                name: name.into(),
            });
        }
        Ok(())
    }

    fn node(&self, locator: &Locator) -> Result<&Node, MirrorError> {
        self.nodes.get(locator).ok_or_else(|| MirrorError::NotFound {
            locator: locator.clone(),
        })
    }

    fn node_mut(&mut self, locator: &Locator) -> Result<&mut Node, MirrorError> {
        self.nodes
            .get_mut(locator)
            .ok_or_else(|| MirrorError::NotFound {
                locator: locator.clone(),
            })
    }

    fn insert(
        &mut self,
        parent: Option<&Locator>,
        name: &str,
        kind: EntryKind,
        content: Vec<u8>,
        modified: i64,
    ) -> Result<Locator, MirrorError> {
        if let Some(parent) = parent {
            let node = self.node(parent)?;
            if !node.kind.is_dir() {
                return Err(MirrorError::Precondition {
                    operation: "insert child",
                    name: node.name.clone(),
                    expected: EntryKind::Directory,
                });
            }
        }

        self.next_id += 1;
        let locator = Locator::new(format!("mem://{}", self.next_id));
        self.nodes.insert(
            locator.clone(),
            Node {
                name: name.into(),
                kind,
                parent: parent.cloned(),
                children: Vec::new(),
                content,
                modified,
            },
        );
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(locator.clone());
        }
        Ok(locator)
    }

    fn detach(&mut self, locator: &Locator) -> Result<(), MirrorError> {
        let parent = self.node(locator)?.parent.clone();
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|child| child != locator);
            }
        }

        let mut pending = vec![locator.clone()];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    fn to_entry(&self, locator: &Locator, parent: Option<&Entry>) -> Result<Entry, MirrorError> {
        let node = self.node(locator)?;
        let mut entry = Entry::new(locator.clone(), node.name.clone(), node.kind)
            .with_metadata(Some(node.content.len() as u64), Some(node.modified));
        if let Some(parent) = parent {
            entry = entry.with_parent(parent);
        }
        Ok(entry)
    }
}

/// A document store held entirely in memory.
///
/// Modification times come from a logical clock that advances by one on every
/// write and never runs behind a timestamp supplied when seeding.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    state: Mutex<State>,
}

impl MemoryProvider {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a root directory.
    pub fn add_root(&self, name: &str) -> Entry {
        let mut state = self.state();
        let modified = state.tick();
        state.next_id += 1;
        let locator = Locator::new(format!("mem://{}", state.next_id));
        state.nodes.insert(
            locator.clone(),
            Node {
                name: name.into(),
                kind: EntryKind::Directory,
                parent: None,
                children: Vec::new(),
                content: Vec::new(),
                modified,
            },
        );
        Entry::directory(locator, name)
    }

    /// Seed a directory below `parent` without recording an operation.
    pub fn add_directory(&self, parent: &Entry, name: &str) -> Result<Entry, MirrorError> {
        let mut state = self.state();
        let modified = state.tick();
        let locator = state.insert(
            Some(&parent.locator),
            name,
            EntryKind::Directory,
            Vec::new(),
            modified,
        )?;
        state.to_entry(&locator, Some(parent))
    }

    /// Seed a file below `parent` without recording an operation.
    pub fn add_file(
        &self,
        parent: &Entry,
        name: &str,
        content: impl Into<Vec<u8>>,
    ) -> Result<Entry, MirrorError> {
        let modified = self.state().tick();
        self.add_file_with_modified(parent, name, content, modified)
    }

    /// Seed a file with an explicit modification time.
    pub fn add_file_with_modified(
        &self,
        parent: &Entry,
        name: &str,
        content: impl Into<Vec<u8>>,
        modified: i64,
    ) -> Result<Entry, MirrorError> {
        let mut state = self.state();
        state.observe(modified);
        let locator = state.insert(
            Some(&parent.locator),
            name,
            EntryKind::File,
            content.into(),
            modified,
        )?;
        state.to_entry(&locator, Some(parent))
    }

    /// Replace a file's content out of band, advancing its modification time.
    pub fn set_content(
        &self,
        locator: &Locator,
        content: impl Into<Vec<u8>>,
    ) -> Result<(), MirrorError> {
        let mut state = self.state();
        let modified = state.tick();
        let node = state.node_mut(locator)?;
        node.content = content.into();
        node.modified = modified;
        Ok(())
    }

    /// Make every future call of `kind` addressing `name` fail.
    pub fn fail_on(&self, kind: OpKind, name: &str) {
        self.state().failures.push((kind, name.into()));
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// All primitive calls recorded so far, oldest first.
    pub fn operations(&self) -> Vec<ProviderOp> {
        self.state().ops.clone()
    }

    /// Recorded calls that changed the store.
    pub fn mutations(&self) -> Vec<ProviderOp> {
        self.state()
            .ops
            .iter()
            .filter(|op| op.is_mutation())
            .cloned()
            .collect()
    }

    /// Forget all recorded calls.
    pub fn clear_operations(&self) {
        self.state().ops.clear();
    }

    /// Check whether a locator still addresses a live entry.
    pub fn exists(&self, locator: &Locator) -> bool {
        self.state().nodes.contains_key(locator)
    }

    /// Content of a file, if the locator addresses one.
    pub fn content(&self, locator: &Locator) -> Option<Vec<u8>> {
        let state = self.state();
        state
            .nodes
            .get(locator)
            .filter(|node| node.kind.is_file())
            .map(|node| node.content.clone())
    }

    /// Flatten the subtree below `root` into slash-separated relative paths.
    ///
    /// Duplicate sibling names collapse to the one listed last.
    pub fn snapshot(&self, root: &Entry) -> BTreeMap<String, SnapshotNode> {
        let state = self.state();
        let mut snapshot = BTreeMap::new();
        let mut pending = vec![(root.locator.clone(), String::new())];

        while let Some((locator, prefix)) = pending.pop() {
            let Some(node) = state.nodes.get(&locator) else {
                continue;
            };
            for child in &node.children {
                let Some(child_node) = state.nodes.get(child) else {
                    continue;
                };
                let path = if prefix.is_empty() {
                    child_node.name.to_string()
                } else {
                    format!("{prefix}/{}", child_node.name)
                };
                match child_node.kind {
                    EntryKind::Directory => {
                        snapshot.insert(path.clone(), SnapshotNode::Directory);
                        pending.push((child.clone(), path));
                    }
                    EntryKind::File => {
                        snapshot.insert(path, SnapshotNode::File(child_node.content.clone()));
                    }
                }
            }
        }

        snapshot
    }
}

impl DocumentProvider for MemoryProvider {
    fn list(&self, dir: &Entry) -> Result<Vec<Entry>, MirrorError> {
        dir.require_directory("list")?;
        let mut state = self.state();
        state.record(OpKind::List, &dir.name, &dir.locator)?;

        let children = state.node(&dir.locator)?.children.clone();
        children
            .iter()
            .map(|child| state.to_entry(child, Some(dir)))
            .collect()
    }

    fn create_directory(&self, parent: &Entry, name: &str) -> Result<Entry, MirrorError> {
        parent.require_directory("create directory")?;
        let mut state = self.state();
        state.record(OpKind::CreateDirectory, name, &parent.locator)?;

        let modified = state.tick();
        let locator = state.insert(
            Some(&parent.locator),
            name,
            EntryKind::Directory,
            Vec::new(),
            modified,
        )?;
        state.to_entry(&locator, Some(parent))
    }

    fn create_file(
        &self,
        parent: &Entry,
        name: &str,
        content: Option<&[u8]>,
    ) -> Result<Entry, MirrorError> {
        parent.require_directory("create file")?;
        let mut state = self.state();
        state.record(OpKind::CreateFile, name, &parent.locator)?;

        let modified = state.tick();
        let locator = state.insert(
            Some(&parent.locator),
            name,
            EntryKind::File,
            content.map(<[u8]>::to_vec).unwrap_or_default(),
            modified,
        )?;
        state.to_entry(&locator, Some(parent))
    }

    fn read_file(&self, file: &Entry) -> Result<Vec<u8>, MirrorError> {
        file.require_file("read")?;
        let mut state = self.state();
        state.record(OpKind::Read, &file.name, &file.locator)?;
        Ok(state.node(&file.locator)?.content.clone())
    }

    fn write_file(&self, file: &Entry, content: &[u8]) -> Result<(), MirrorError> {
        file.require_file("write")?;
        let mut state = self.state();
        state.record(OpKind::Write, &file.name, &file.locator)?;

        let modified = state.tick();
        let node = state.node_mut(&file.locator)?;
        node.content = content.to_vec();
        node.modified = modified;
        Ok(())
    }

    fn remove(&self, entry: &Entry) -> Result<(), MirrorError> {
        let mut state = self.state();
        state.record(OpKind::Remove, &entry.name, &entry.locator)?;
        state.detach(&entry.locator)
    }

    fn stat(&self, file: &Entry) -> Result<EntryStat, MirrorError> {
        file.require_file("stat")?;
        let mut state = self.state();
        state.record(OpKind::Stat, &file.name, &file.locator)?;

        let node = state.node(&file.locator)?;
        Ok(EntryStat::new(
            node.kind,
            node.content.len() as u64,
            Some(node.modified),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_and_list() {
        let store = MemoryProvider::new();
        let root = store.add_root("root");
        store.add_file(&root, "a.txt", b"hello".to_vec()).unwrap();
        store.add_directory(&root, "docs").unwrap();

        let listing = store.list(&root).unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "a.txt");
        assert_eq!(listing[0].length, Some(5));
        assert!(listing[1].is_dir());
        assert!(listing[1].length.is_none());
        assert_eq!(listing[1].parent.as_ref().unwrap().locator, root.locator);
    }

    #[test]
    fn test_seeding_is_not_recorded() {
        let store = MemoryProvider::new();
        let root = store.add_root("root");
        store.add_file(&root, "a", b"x".to_vec()).unwrap();
        assert!(store.operations().is_empty());
    }

    #[test]
    fn test_clock_is_monotonic() {
        let store = MemoryProvider::new();
        let root = store.add_root("root");
        let old = store
            .add_file_with_modified(&root, "old", b"x".to_vec(), 500)
            .unwrap();
        let new = store.create_file(&root, "new", Some(b"y".as_slice())).unwrap();
        assert!(new.modified.unwrap() > old.modified.unwrap());
    }

    #[test]
    fn test_remove_drops_subtree() {
        let store = MemoryProvider::new();
        let root = store.add_root("root");
        let docs = store.add_directory(&root, "docs").unwrap();
        let inner = store.add_file(&docs, "inner.md", b"#".to_vec()).unwrap();

        store.remove(&docs).unwrap();
        assert!(!store.exists(&docs.locator));
        assert!(!store.exists(&inner.locator));
        assert!(store.list(&root).unwrap().is_empty());
    }

    #[test]
    fn test_stale_locator_is_not_found() {
        let store = MemoryProvider::new();
        let root = store.add_root("root");
        let file = store.add_file(&root, "gone", b"x".to_vec()).unwrap();
        store.remove(&file).unwrap();

        let err = store.read_file(&file).unwrap_err();
        assert!(matches!(err, MirrorError::NotFound { .. }));
    }

    #[test]
    fn test_preconditions() {
        let store = MemoryProvider::new();
        let root = store.add_root("root");
        let file = store.add_file(&root, "f", b"x".to_vec()).unwrap();

        assert!(store.create_file(&file, "g", None).unwrap_err().is_precondition());
        assert!(store.create_directory(&file, "d").unwrap_err().is_precondition());
        assert!(store.read_file(&root).unwrap_err().is_precondition());
        assert!(store.write_file(&root, b"x").unwrap_err().is_precondition());
        assert!(store.stat(&root).unwrap_err().is_precondition());
    }

    #[test]
    fn test_fail_on() {
        let store = MemoryProvider::new();
        let root = store.add_root("root");
        let file = store.add_file(&root, "f", b"x".to_vec()).unwrap();
        store.fail_on(OpKind::Read, "f");

        let err = store.read_file(&file).unwrap_err();
        assert!(matches!(
            err,
            MirrorError::InjectedFailure {
                operation: "read",
                ..
            }
        ));

        store.clear_failures();
        assert_eq!(store.read_file(&file).unwrap(), b"x");
    }

    #[test]
    fn test_snapshot_paths() {
        let store = MemoryProvider::new();
        let root = store.add_root("root");
        let docs = store.add_directory(&root, "docs").unwrap();
        store.add_file(&docs, "a.md", b"a".to_vec()).unwrap();

        let snapshot = store.snapshot(&root);
        assert_eq!(snapshot.get("docs"), Some(&SnapshotNode::Directory));
        assert_eq!(
            snapshot.get("docs/a.md"),
            Some(&SnapshotNode::File(b"a".to_vec()))
        );
    }
}
