//! Artifact identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a persisted artifact.
///
/// Doubles as the filename stem under the output directory, so two
/// concurrent generations can never write to the same file.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Generate a fresh unique id (UUID v4, hex form without hyphens)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Create an ArtifactId from a raw string (for deserialization/testing)
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
