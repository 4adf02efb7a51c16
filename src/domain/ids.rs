//! Domain identifier types
//!
//! Newtype wrappers that keep identifiers from being mixed up with plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Import session identifier
///
/// Generated once when a ledger is first created for a working folder and
/// sent with every remote upload so the server can group the files of one
/// export together, across any number of runs.
///
/// # Examples
///
/// ```
/// use sfm_importer::domain::ids::SessionId;
/// use std::str::FromStr;
///
/// let session = SessionId::from_str("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
/// assert_eq!(session.to_string(), "0f8fad5b-d9cb-469f-a165-70867728950e");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid session ID '{s}': {e}"))
    }
}

/// Short identifier for an upload worker, used only in log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(Uuid);

impl WorkerId {
    /// Creates a new random worker identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
