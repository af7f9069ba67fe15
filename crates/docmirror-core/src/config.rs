//! Mirror configuration types.

use std::fmt;

use derive_builder::{Builder, UninitializedFieldError};
use serde::{Deserialize, Serialize};

use crate::entry::Locator;
use crate::error::MirrorError;

/// How two files with the same name are compared before transferring content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Skip when lengths match and the source is strictly newer.
    #[default]
    Heuristic,
    /// Skip when the BLAKE3 digests of both sides match.
    Checksum,
    /// Never skip.
    Always,
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heuristic => write!(f, "heuristic"),
            Self::Checksum => write!(f, "checksum"),
            Self::Always => write!(f, "always"),
        }
    }
}

/// Configuration for a mirror run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(
    setter(into),
    build_fn(validate = "Self::validate", error = "MirrorError")
)]
pub struct MirrorConfig {
    /// Root of the tree to copy from.
    pub source: Locator,

    /// Root of the tree to make identical to the source.
    pub destination: Locator,

    /// File comparison policy.
    #[builder(default)]
    #[serde(default)]
    pub compare: CompareMode,
}

impl MirrorConfigBuilder {
    fn validate(&self) -> Result<(), MirrorError> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| invalid("Source locator is required"))?;
        let destination = self
            .destination
            .as_ref()
            .ok_or_else(|| invalid("Destination locator is required"))?;

        if source.is_empty() || destination.is_empty() {
            return Err(invalid("Locators cannot be empty"));
        }
        if source == destination {
            return Err(invalid("Source and destination must differ"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> MirrorError {
    MirrorError::InvalidConfig {
        message: message.to_string(),
    }
}

impl From<UninitializedFieldError> for MirrorError {
    fn from(err: UninitializedFieldError) -> Self {
        invalid(&err.to_string())
    }
}

impl MirrorConfig {
    /// Create a new config builder.
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }

    /// Create a config with the default compare mode.
    pub fn new(source: impl Into<Locator>, destination: impl Into<Locator>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            compare: CompareMode::default(),
        }
    }
}
