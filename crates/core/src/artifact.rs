//! Audio artifact identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Opaque artifact identifier
///
/// Only canonical lower-case hyphenated UUIDs parse, so an id can be joined
/// onto a directory path without any chance of escaping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    /// Mint a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// File name of the artifact inside the store directory
    pub fn file_name(&self) -> String {
        format!("output_{}.wav", self.0.hyphenated())
    }

    /// Recover an id from a store file name (`output_<id>.wav`)
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.strip_prefix("output_")
            .and_then(|rest| rest.strip_suffix(".wav"))
            .and_then(|id| id.parse().ok())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ArtifactId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s)
            .map_err(|_| Error::InputValidation(format!("invalid artifact id: {s:?}")))?;
        // Uuid::parse_str also accepts simple, braced and urn forms
        if uuid.hyphenated().to_string() != s {
            return Err(Error::InputValidation(format!("invalid artifact id: {s:?}")));
        }
        Ok(Self(uuid))
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.to_string()
    }
}

/// Generated audio file owned by the artifact store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub id: ArtifactId,
    pub file_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id_parses() {
        let id = ArtifactId::new();
        let parsed: ArtifactId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_non_canonical_ids_rejected() {
        let id = ArtifactId::new();
        let upper = id.to_string().to_uppercase();
        let simple = id.as_uuid().simple().to_string();
        let braced = format!("{{{}}}", id);

        for bad in [
            upper.as_str(),
            simple.as_str(),
            braced.as_str(),
            "../etc/passwd",
            "",
            "output_1.wav",
        ] {
            let result: Result<ArtifactId, _> = bad.parse();
            assert!(
                matches!(result, Err(Error::InputValidation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_file_name_round_trip() {
        let id = ArtifactId::new();
        let name = id.file_name();
        assert!(name.starts_with("output_") && name.ends_with(".wav"));
        assert_eq!(ArtifactId::from_file_name(&name), Some(id));
        assert_eq!(ArtifactId::from_file_name("notes.txt"), None);
    }
}
