//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for tabsync identifiers. Each type
//! ensures type safety and provides validation for format compliance.

use crate::domain::errors::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remote target identifier newtype wrapper
///
/// Names the remote structure a record set is published into. Also used to
/// derive checkpoint and snapshot file names, so it must be expressible as a
/// safe file stem.
///
/// # Examples
///
/// ```
/// use tabsync::domain::ids::TargetId;
/// use std::str::FromStr;
///
/// let target = TargetId::from_str("roster_2024").unwrap();
/// assert_eq!(target.as_str(), "roster_2024");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a new TargetId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is empty or contains control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, SyncError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SyncError::Configuration(
                "Target ID cannot be empty".to_string(),
            ));
        }
        if id.chars().any(|c| c == '\t' || c == '\n' || c == '\r') {
            return Err(SyncError::Configuration(
                "Target ID cannot contain tabs or newlines".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Returns the target ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns a filesystem-safe stem for checkpoint and snapshot files
    ///
    /// Every character outside `[A-Za-z0-9._-]` is replaced with `_` so the
    /// target name can be embedded in a file name on any platform.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TargetId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TargetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
