//! Node-level conflict policies and edge-level import strategies

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a node whose `(id, domain)` already exists is reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Leave the stored entity untouched
    Skip,
    /// Fill fields that are empty in the stored entity from the incoming record
    MergeData,
    /// Store the incoming record under a freshly allocated id
    #[default]
    AutoId,
}

impl ConflictPolicy {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::MergeData => "merge_data",
            Self::AutoId => "auto_id",
        }
    }

    /// Parse from string, rejecting unknown values
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "merge_data" => Ok(Self::MergeData),
            "auto_id" => Ok(Self::AutoId),
            other => Err(Error::InvalidPayload(format!(
                "Unknown conflict_resolution '{}'. Valid options: {}",
                other,
                Self::all()
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Get all policies
    pub fn all() -> &'static [ConflictPolicy] {
        &[Self::Skip, Self::MergeData, Self::AutoId]
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// How an edge whose `(source, target, type, domain)` already exists is reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStrategy {
    /// Fill an empty stored description from the incoming record
    #[default]
    Merge,
    /// Leave the stored relationship untouched
    Skip,
    /// Replace the stored description with a non-empty incoming one
    Overwrite,
    /// Only create relationships that do not exist yet
    CreateNew,
}

impl ImportStrategy {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::CreateNew => "create_new",
        }
    }

    /// Parse from string, rejecting unknown values
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "merge" => Ok(Self::Merge),
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "create_new" => Ok(Self::CreateNew),
            other => Err(Error::InvalidPayload(format!(
                "Unknown strategy '{}'. Valid options: {}",
                other,
                Self::all()
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Get all strategies
    pub fn all() -> &'static [ImportStrategy] {
        &[Self::Merge, Self::Skip, Self::Overwrite, Self::CreateNew]
    }
}

impl std::fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ImportStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
