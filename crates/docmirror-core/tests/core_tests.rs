use docmirror_core::{
    CompareMode, DIRECTORY_TYPE_TAG, Entry, EntryKind, EntryStat, Locator, MirrorConfig,
    MirrorError,
};

#[test]
fn test_locator_operations() {
    let a = Locator::new("content://tree/primary%3ADocs");
    let b: Locator = "content://tree/primary%3ADocs".into();

    assert_eq!(a, b);
    assert_eq!(a.as_str(), "content://tree/primary%3ADocs");
    assert!(!a.is_empty());
    assert!(Locator::new("").is_empty());
}

#[test]
fn test_entry_kind_discrimination() {
    assert!(EntryKind::Directory.is_dir());
    assert!(!EntryKind::Directory.is_file());
    assert!(EntryKind::File.is_file());

    assert_eq!(
        EntryKind::from_type_tag(DIRECTORY_TYPE_TAG),
        EntryKind::Directory
    );
    assert_eq!(
        EntryKind::from_type_tag("application/octet-stream"),
        EntryKind::File
    );
    assert_eq!(
        EntryKind::from_type_tag("vnd.android.document/directory "),
        EntryKind::File
    );
}

#[test]
fn test_entry_constructors() {
    let root = Entry::directory("content://root", "<source_root>");
    assert!(root.is_dir());
    assert!(root.parent.is_none());

    let child = Entry::new("content://root/a.txt", "a.txt", EntryKind::File)
        .with_parent(&root)
        .with_metadata(Some(10), Some(100));

    assert!(child.is_file());
    assert_eq!(child.length, Some(10));
    assert_eq!(child.modified, Some(100));

    let parent = child.parent.as_ref().unwrap();
    assert_eq!(parent.locator, root.locator);
    assert_eq!(parent.to_entry(), root);
}

#[test]
fn test_modified_at() {
    let file = Entry::file("f", "f").with_metadata(Some(1), Some(1_700_000_000_000));
    let at = file.modified_at().unwrap();
    assert_eq!(at.timestamp(), 1_700_000_000);

    let unknown = Entry::file("g", "g");
    assert!(unknown.modified_at().is_none());
}

#[test]
fn test_entry_stat() {
    let stat = EntryStat::new(EntryKind::File, 42, None);
    assert_eq!(stat.length, 42);
    assert!(stat.modified.is_none());
}

#[test]
fn test_preconditions() {
    let dir = Entry::directory("d", "docs");
    let err = dir.require_file("write").unwrap_err();
    assert!(err.is_precondition());
    assert!(matches!(
        err,
        MirrorError::Precondition {
            operation: "write",
            expected: EntryKind::File,
            ..
        }
    ));
}

#[test]
fn test_config_validation() {
    assert!(
        MirrorConfig::builder()
            .source("")
            .destination("content://dst")
            .build()
            .is_err()
    );

    let config = MirrorConfig::builder()
        .source("content://src")
        .destination("content://dst")
        .build()
        .unwrap();
    assert_eq!(config.compare, CompareMode::Heuristic);
}
