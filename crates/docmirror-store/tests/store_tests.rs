use std::fs;

use docmirror_store::{
    DocumentProvider, EntryKind, LocalProvider, MemoryProvider, MirrorError, OpKind, SnapshotNode,
};
use tempfile::TempDir;

#[test]
fn test_memory_operation_log() {
    let store = MemoryProvider::new();
    let root = store.add_root("root");

    let dir = store.create_directory(&root, "docs").unwrap();
    let file = store
        .create_file(&dir, "a.md", Some(b"# title".as_slice()))
        .unwrap();
    store.read_file(&file).unwrap();
    store.write_file(&file, b"# other").unwrap();
    store.stat(&file).unwrap();
    store.list(&dir).unwrap();
    store.remove(&dir).unwrap();

    let kinds: Vec<OpKind> = store.operations().iter().map(|op| op.kind).collect();
    assert_eq!(
        kinds,
        vec![
            OpKind::CreateDirectory,
            OpKind::CreateFile,
            OpKind::Read,
            OpKind::Write,
            OpKind::Stat,
            OpKind::List,
            OpKind::Remove,
        ]
    );
    assert_eq!(store.mutations().len(), 4);

    store.clear_operations();
    assert!(store.operations().is_empty());
}

#[test]
fn test_memory_duplicate_siblings_are_listed() {
    let store = MemoryProvider::new();
    let root = store.add_root("root");
    store.add_file(&root, "dup", b"first".to_vec()).unwrap();
    store.add_file(&root, "dup", b"second".to_vec()).unwrap();

    let listing = store.list(&root).unwrap();
    assert_eq!(listing.len(), 2);

    // The snapshot keeps the later sibling.
    let snapshot = store.snapshot(&root);
    assert_eq!(
        snapshot.get("dup"),
        Some(&SnapshotNode::File(b"second".to_vec()))
    );
}

#[test]
fn test_memory_stat_reports_metadata() {
    let store = MemoryProvider::new();
    let root = store.add_root("root");
    let file = store
        .add_file_with_modified(&root, "report.csv", vec![0u8; 100], 200)
        .unwrap();

    let stat = store.stat(&file).unwrap();
    assert_eq!(stat.kind, EntryKind::File);
    assert_eq!(stat.length, 100);
    assert_eq!(stat.modified, Some(200));
}

#[test]
fn test_memory_injected_failure_is_logged() {
    let store = MemoryProvider::new();
    let root = store.add_root("root");
    store.fail_on(OpKind::CreateDirectory, "docs");

    let err = store.create_directory(&root, "docs").unwrap_err();
    assert!(matches!(err, MirrorError::InjectedFailure { .. }));
    assert_eq!(store.operations().len(), 1);
    assert!(store.list(&root).unwrap().is_empty());
}

#[test]
fn test_local_round_trip() {
    let temp = TempDir::new().unwrap();
    let provider = LocalProvider::new();
    let root = provider.open_root(temp.path()).unwrap();

    let dir = provider.create_directory(&root, "docs").unwrap();
    let file = provider
        .create_file(&dir, "notes.txt", Some(b"first".as_slice()))
        .unwrap();
    provider.write_file(&file, b"second version").unwrap();

    assert_eq!(provider.read_file(&file).unwrap(), b"second version");
    assert_eq!(provider.stat(&file).unwrap().length, 14);
    assert_eq!(
        fs::read_to_string(temp.path().join("docs/notes.txt")).unwrap(),
        "second version"
    );

    let empty = provider.create_file(&root, "empty", None).unwrap();
    assert_eq!(empty.length, Some(0));
}

#[test]
fn test_local_preconditions() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("plain"), b"x").unwrap();

    let provider = LocalProvider::new();
    let root = provider.open_root(temp.path()).unwrap();
    let file = provider.open(temp.path().join("plain")).unwrap();

    assert!(provider.create_directory(&file, "d").unwrap_err().is_precondition());
    assert!(provider.read_file(&root).unwrap_err().is_precondition());
    assert!(provider.list(&file).unwrap_err().is_precondition());
}
