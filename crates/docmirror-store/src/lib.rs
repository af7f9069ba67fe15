//! Document store providers for docmirror.
//!
//! Every provider implements [`DocumentProvider`] from `docmirror-core`:
//!
//! - [`TermuxSafProvider`] - Android Storage Access Framework trees through
//!   the `termux-saf-*` command suite
//! - [`LocalProvider`] - directories on the local filesystem
//! - [`MemoryProvider`] - an in-memory tree with an operation log and
//!   failure injection, used to test the reconciler
//!
//! # Example
//!
//! ```rust
//! use docmirror_store::{DocumentProvider, MemoryProvider};
//!
//! let store = MemoryProvider::new();
//! let root = store.add_root("root");
//! store.add_file(&root, "a.txt", b"hello".to_vec()).unwrap();
//!
//! let listing = store.list(&root).unwrap();
//! assert_eq!(listing[0].name, "a.txt");
//! ```

mod local;
mod memory;
mod termux;

pub use local::LocalProvider;
pub use memory::{MemoryProvider, OpKind, ProviderOp, SnapshotNode};
pub use termux::TermuxSafProvider;

// Re-export core types for convenience
pub use docmirror_core::{DocumentProvider, Entry, EntryKind, EntryStat, Locator, MirrorError};
