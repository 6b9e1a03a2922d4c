//! Strongly-typed identifiers used across the workspace.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a backend user (vendor or admin).
///
/// Ids are issued by the backend and are opaque here; the only structure
/// enforced is that they are non-blank and not a stringified absent marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an id without validation.
    ///
    /// Prefer [`UserId::parse`] for values that come from storage or the network.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        raw.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stored values a browser-era client may have written in place of "no value".
pub(crate) const SENTINELS: [&str; 2] = ["undefined", "null"];

/// `true` when a persisted string should be read as absent.
///
/// Matches exactly: a value of `"  "` is a stored value, not a marker.
pub fn is_absent_marker(raw: &str) -> bool {
    raw.is_empty() || SENTINELS.contains(&raw)
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if is_absent_marker(trimmed) {
            return Err(DomainError::invalid_id(format!("UserId: {s:?}")));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}
