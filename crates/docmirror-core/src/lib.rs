//! Core types and traits for docmirror.
//!
//! This crate provides the data model shared by every store and by the
//! reconciliation engine: tree entries, the [`DocumentProvider`] capability
//! trait, error types, and run configuration.

mod config;
mod entry;
mod error;
mod provider;

pub use config::{CompareMode, MirrorConfig, MirrorConfigBuilder};
pub use entry::{DIRECTORY_TYPE_TAG, Entry, EntryKind, EntryStat, Locator, ParentRef};
pub use error::MirrorError;
pub use provider::DocumentProvider;
