//! Android Storage Access Framework store via the Termux command suite.
//!
//! Each primitive is one invocation of a `termux-saf-*` tool. Listings and
//! stat results arrive as JSON on stdout; new entries are announced by
//! printing their content URI.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::debug;

use docmirror_core::{DocumentProvider, Entry, EntryKind, EntryStat, Locator, MirrorError};

/// One element of a `termux-saf-ls` listing.
#[derive(Debug, Deserialize)]
struct ListedDocument {
    name: String,
    #[serde(rename = "type")]
    type_tag: String,
    uri: String,
    #[serde(default)]
    length: Option<u64>,
    #[serde(default)]
    last_modified: Option<i64>,
}

/// Body of a `termux-saf-stat` response.
#[derive(Debug, Deserialize)]
struct StatResponse {
    #[serde(rename = "type")]
    type_tag: String,
    length: u64,
    #[serde(default)]
    last_modified: Option<i64>,
}

/// Store that drives the `termux-saf-*` tools.
#[derive(Debug, Clone, Default)]
pub struct TermuxSafProvider {
    bin_dir: Option<PathBuf>,
}

impl TermuxSafProvider {
    /// Create a provider resolving the tools from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the tools from a specific directory instead of `PATH`.
    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(dir.into());
        self
    }

    /// Build a root directory entry for a tree URI.
    pub fn root(&self, uri: impl Into<Locator>, name: &str) -> Entry {
        Entry::directory(uri, name)
    }

    fn program(&self, tool: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(tool),
            None => PathBuf::from(tool),
        }
    }

    /// Run one tool to completion and return its stdout.
    fn run(
        &self,
        tool: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
        locator: &Locator,
    ) -> Result<Vec<u8>, MirrorError> {
        let mut command = Command::new(self.program(tool));
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| MirrorError::io(locator.clone(), e))?;

        // The pipe is dropped at the end of the arm so the tool sees EOF.
        let written = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => pipe.write_all(input),
            _ => Ok(()),
        };

        // Always reap the child; its stderr explains an early exit better
        // than a broken pipe does.
        let output = child
            .wait_with_output()
            .map_err(|e| MirrorError::io(locator.clone(), e))?;

        if !output.status.success() {
            return Err(MirrorError::CommandFailed {
                command: format!("{tool} {}", args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written.map_err(|e| MirrorError::io(locator.clone(), e))?;
        Ok(output.stdout)
    }

    /// Run a creation tool and read back the URI it prints.
    fn run_create(&self, tool: &str, parent: &Entry, name: &str) -> Result<Locator, MirrorError> {
        let stdout = self.run(tool, &[parent.locator.as_str(), name], None, &parent.locator)?;
        parse_created_uri(&parent.locator, &stdout)
    }
}

fn parse_listing(dir: &Entry, raw: &[u8]) -> Result<Vec<Entry>, MirrorError> {
    let documents: Vec<ListedDocument> = serde_json::from_slice(raw)
        .map_err(|e| MirrorError::malformed(dir.locator.clone(), e.to_string()))?;

    Ok(documents
        .into_iter()
        .map(|doc| {
            Entry::new(doc.uri, doc.name, EntryKind::from_type_tag(&doc.type_tag))
                .with_parent(dir)
                .with_metadata(doc.length, doc.last_modified)
        })
        .collect())
}

fn parse_stat(locator: &Locator, raw: &[u8]) -> Result<EntryStat, MirrorError> {
    let stat: StatResponse = serde_json::from_slice(raw)
        .map_err(|e| MirrorError::malformed(locator.clone(), e.to_string()))?;
    Ok(EntryStat::new(
        EntryKind::from_type_tag(&stat.type_tag),
        stat.length,
        stat.last_modified,
    ))
}

fn parse_created_uri(parent: &Locator, raw: &[u8]) -> Result<Locator, MirrorError> {
    let uri = String::from_utf8_lossy(raw).trim().to_string();
    if uri.is_empty() {
        return Err(MirrorError::malformed(
            parent.clone(),
            "no URI printed for new document",
        ));
    }
    Ok(Locator::new(uri))
}

impl DocumentProvider for TermuxSafProvider {
    fn list(&self, dir: &Entry) -> Result<Vec<Entry>, MirrorError> {
        dir.require_directory("list")?;
        let stdout = self.run("termux-saf-ls", &[dir.locator.as_str()], None, &dir.locator)?;
        let entries = parse_listing(dir, &stdout)?;
        debug!("Listed {} entries in {}", entries.len(), dir.name);
        Ok(entries)
    }

    fn create_directory(&self, parent: &Entry, name: &str) -> Result<Entry, MirrorError> {
        parent.require_directory("create directory")?;
        let locator = self.run_create("termux-saf-mkdir", parent, name)?;
        Ok(Entry::directory(locator, name).with_parent(parent))
    }

    fn create_file(
        &self,
        parent: &Entry,
        name: &str,
        content: Option<&[u8]>,
    ) -> Result<Entry, MirrorError> {
        parent.require_directory("create file")?;
        let locator = self.run_create("termux-saf-create", parent, name)?;
        let entry = Entry::file(locator, name).with_parent(parent);
        // SAF has no create-with-content call; write immediately after creation.
        if let Some(content) = content {
            self.write_file(&entry, content)?;
        }
        Ok(entry)
    }

    fn read_file(&self, file: &Entry) -> Result<Vec<u8>, MirrorError> {
        file.require_file("read")?;
        self.run("termux-saf-read", &[file.locator.as_str()], None, &file.locator)
    }

    fn write_file(&self, file: &Entry, content: &[u8]) -> Result<(), MirrorError> {
        file.require_file("write")?;
        self.run(
            "termux-saf-write",
            &[file.locator.as_str()],
            Some(content),
            &file.locator,
        )?;
        Ok(())
    }

    fn remove(&self, entry: &Entry) -> Result<(), MirrorError> {
        self.run("termux-saf-rm", &[entry.locator.as_str()], None, &entry.locator)?;
        Ok(())
    }

    fn stat(&self, file: &Entry) -> Result<EntryStat, MirrorError> {
        file.require_file("stat")?;
        let stdout = self.run("termux-saf-stat", &[file.locator.as_str()], None, &file.locator)?;
        parse_stat(&file.locator, &stdout)
    }
}
