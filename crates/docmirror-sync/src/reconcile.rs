//! Work-list driven tree reconciliation.

use compact_str::CompactString;
use indexmap::IndexMap;
use tracing::{debug, info};

use docmirror_core::{CompareMode, DocumentProvider, Entry, MirrorError};

use crate::materialize::{Materialized, WorkPair, materialize};
use crate::policy::{FileDecision, decide};
use crate::report::SyncReport;

/// Children of one directory keyed by name. Later duplicates replace earlier ones.
type Listing = IndexMap<CompactString, Entry>;

/// Makes a destination tree match a source tree.
///
/// Directory pairs wait on an explicit LIFO work list instead of the call
/// stack: the most recently discovered pair is processed next. Every provider
/// failure aborts the run; changes already applied stay in place.
pub struct Reconciler<P> {
    provider: P,
    compare: CompareMode,
    pending: Vec<WorkPair>,
    report: SyncReport,
}

impl<P: DocumentProvider> Reconciler<P> {
    /// Create a reconciler using the default compare mode.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            compare: CompareMode::default(),
            pending: Vec::new(),
            report: SyncReport::new(),
        }
    }

    /// Set the file compare mode.
    pub fn with_compare(mut self, compare: CompareMode) -> Self {
        self.compare = compare;
        self
    }

    /// Mirror `source_root` onto `dest_root` and return what changed.
    ///
    /// Both roots must be directories.
    pub fn reconcile(
        mut self,
        source_root: Entry,
        dest_root: Entry,
    ) -> Result<SyncReport, MirrorError> {
        self.seed(source_root, dest_root)?;
        self.run()?;
        Ok(self.report)
    }

    /// Push a root pair onto the work list.
    pub fn seed(&mut self, source_root: Entry, dest_root: Entry) -> Result<(), MirrorError> {
        source_root.require_directory("reconcile")?;
        self.pending.push(WorkPair::new(source_root, dest_root));
        Ok(())
    }

    /// Process pairs until the work list is empty.
    pub fn run(&mut self) -> Result<(), MirrorError> {
        while self.step()?.is_some() {}
        Ok(())
    }

    /// Number of directory pairs waiting on the work list.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Counters collected so far.
    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    /// Pop and reconcile one directory pair.
    ///
    /// Returns the processed pair, with the destination as it stands after
    /// any replacement, or `None` when the work list was already empty.
    pub fn step(&mut self) -> Result<Option<WorkPair>, MirrorError> {
        let Some(WorkPair { source, mut dest }) = self.pending.pop() else {
            return Ok(None);
        };
        info!("Syncing {source} -> {dest}");
        self.report.dirs_visited += 1;

        // Only directory pairs are ever scheduled.
        source.require_directory("reconcile")?;

        if !dest.is_dir() {
            dest = self.recreate_as_directory(&source, dest)?;
        }

        let source_children = self.list_by_name(&source)?;
        let dest_children = self.list_by_name(&dest)?;

        for (name, child) in &source_children {
            match dest_children.get(name) {
                None => self.create_to_match(child, &dest)?,
                Some(existing) if existing.kind != child.kind => {
                    info!(
                        "{name} is {} in source but {} in destination; replacing",
                        child.kind, existing.kind
                    );
                    self.provider.remove(existing)?;
                    self.report.entries_replaced += 1;
                    self.create_to_match(child, &dest)?;
                }
                Some(existing) if child.is_dir() => {
                    self.pending
                        .push(WorkPair::new(child.clone(), existing.clone()));
                }
                Some(existing) => self.update_file(child, existing)?,
            }
        }

        for (name, existing) in &dest_children {
            if source_children.contains_key(name) {
                continue;
            }
            info!("{name} does not exist in source; removing");
            self.provider.remove(existing)?;
            self.report.entries_removed += 1;
        }

        Ok(Some(WorkPair::new(source, dest)))
    }

    /// Replace a destination file sitting where the source has a directory.
    fn recreate_as_directory(&mut self, source: &Entry, dest: Entry) -> Result<Entry, MirrorError> {
        let parent = dest
            .parent
            .as_ref()
            .map(|parent| parent.to_entry())
            .ok_or_else(|| MirrorError::OrphanedEntry {
                name: dest.name.clone(),
            })?;

        info!(
            "Source {} is a directory but destination {} is not; removing and recreating",
            source.name, dest.name
        );
        self.provider.remove(&dest)?;
        self.report.entries_replaced += 1;

        let created = self.provider.create_directory(&parent, &dest.name)?;
        self.report.dirs_created += 1;
        Ok(created)
    }

    fn list_by_name(&self, dir: &Entry) -> Result<Listing, MirrorError> {
        let mut listing = Listing::new();
        for entry in self.provider.list(dir)? {
            listing.insert(entry.name.clone(), entry);
        }
        debug!("{} has {} children", dir.name, listing.len());
        Ok(listing)
    }

    fn create_to_match(&mut self, source: &Entry, dest_parent: &Entry) -> Result<(), MirrorError> {
        match materialize(&self.provider, source, dest_parent)? {
            Materialized::Directory(pair) => {
                self.report.dirs_created += 1;
                self.pending.push(pair);
            }
            Materialized::File { bytes, .. } => {
                self.report.files_created += 1;
                self.report.bytes_written += bytes;
            }
        }
        Ok(())
    }

    fn update_file(&mut self, source: &Entry, dest: &Entry) -> Result<(), MirrorError> {
        match decide(&self.provider, self.compare, source, dest)? {
            FileDecision::Skip => {
                debug!(
                    "Skipping transfer of {} because destination is the same size and older",
                    source.name
                );
                self.report.files_skipped += 1;
            }
            FileDecision::Transfer(content) => {
                let content = match content {
                    Some(content) => content,
                    None => self.provider.read_file(source)?,
                };
                info!("Writing content for {}", dest.name);
                self.provider.write_file(dest, &content)?;
                self.report.files_updated += 1;
                self.report.bytes_written += content.len() as u64;
            }
        }
        Ok(())
    }
}

/// Mirror `source_root` onto `dest_root` with the default compare mode.
pub fn reconcile<P: DocumentProvider>(
    provider: P,
    source_root: Entry,
    dest_root: Entry,
) -> Result<SyncReport, MirrorError> {
    Reconciler::new(provider).reconcile(source_root, dest_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmirror_store::{MemoryProvider, OpKind};

    #[test]
    fn test_step_on_empty_work_list() {
        let store = MemoryProvider::new();
        let mut reconciler = Reconciler::new(&store);
        assert!(reconciler.step().unwrap().is_none());
        assert_eq!(reconciler.pending(), 0);
    }

    #[test]
    fn test_seed_requires_directory_source() {
        let store = MemoryProvider::new();
        let root = store.add_root("src");
        let file = store.add_file(&root, "f", b"x".to_vec()).unwrap();
        let dest = store.add_root("dst");

        let mut reconciler = Reconciler::new(&store);
        assert!(reconciler.seed(file, dest).unwrap_err().is_precondition());
    }

    #[test]
    fn test_root_file_destination_is_orphaned() {
        let store = MemoryProvider::new();
        let src = store.add_root("src");
        let holder = store.add_root("holder");
        let file = store.add_file(&holder, "dst", b"x".to_vec()).unwrap();
        // Strip the parent so the destination looks like a root.
        let mut dest = file.clone();
        dest.parent = None;

        let err = reconcile(&store, src, dest).unwrap_err();
        assert!(matches!(err, MirrorError::OrphanedEntry { .. }));
        // Nothing was removed before the error.
        assert!(store.exists(&file.locator));
    }

    #[test]
    fn test_file_destination_slot_is_recreated() {
        let store = MemoryProvider::new();
        let src = store.add_root("src");
        let docs = store.add_directory(&src, "docs").unwrap();
        store.add_file(&docs, "a.md", b"a".to_vec()).unwrap();

        let holder = store.add_root("holder");
        let stale = store.add_file(&holder, "docs", b"not a dir".to_vec()).unwrap();

        let mut reconciler = Reconciler::new(&store);
        reconciler.seed(docs, stale.clone()).unwrap();
        let pair = reconciler.step().unwrap().unwrap();

        assert!(pair.dest.is_dir());
        assert_eq!(pair.dest.name, "docs");
        assert_ne!(pair.dest.locator, stale.locator);
        assert!(!store.exists(&stale.locator));
        assert_eq!(
            pair.dest.parent.as_ref().unwrap().locator,
            holder.locator
        );

        let kinds: Vec<OpKind> = store.mutations().iter().map(|op| op.kind).collect();
        assert_eq!(
            kinds,
            vec![OpKind::Remove, OpKind::CreateDirectory, OpKind::CreateFile]
        );
    }
}
