//! Tree reconciliation engine for docmirror.
//!
//! This crate makes a destination tree match a source tree through any
//! [`DocumentProvider`]:
//!
//! - **Reconciler** - drains an explicit LIFO work list of directory pairs,
//!   diffing the two listings at each level
//! - **Materializer** - creates destination entries for names the
//!   destination lacks
//! - **Policy** - decides whether an existing destination file needs the
//!   source content
//!
//! # Example
//!
//! ```rust
//! use docmirror_store::MemoryProvider;
//! use docmirror_sync::Reconciler;
//!
//! let store = MemoryProvider::new();
//! let source = store.add_root("source");
//! let dest = store.add_root("dest");
//! store.add_file(&source, "a.txt", b"hello".to_vec()).unwrap();
//!
//! let report = Reconciler::new(&store).reconcile(source, dest).unwrap();
//! assert_eq!(report.files_created, 1);
//! ```

mod materialize;
mod policy;
mod reconcile;
mod report;

pub use materialize::{Materialized, WorkPair, materialize};
pub use policy::{FileDecision, decide, is_fresh};
pub use reconcile::{Reconciler, reconcile};
pub use report::SyncReport;

// Re-export core types for convenience
pub use docmirror_core::{CompareMode, DocumentProvider, Entry, EntryKind, MirrorError};
