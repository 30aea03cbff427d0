use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::error::ApiError;

/// Number of hex characters in a SHA-256 content digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 of an evidence file's full content.
///
/// Only constructed from a hash computation or by validating a stored value;
/// there is no way to build one from arbitrary user text without the format check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        let is_hex = value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if value.len() != DIGEST_HEX_LEN || !is_hex {
            return Err(ApiError::validation(format!(
                "Digest must be {} lowercase hex characters",
                DIGEST_HEX_LEN
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub(crate) fn from_hex_unchecked(hex: String) -> Self {
        debug_assert_eq!(hex.len(), DIGEST_HEX_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form shown in listings and case reports.
    pub fn preview(&self) -> String {
        format!("{}...", &self.0[..16])
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ContentDigest::parse(&value)
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.0
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: Uuid,
    pub case_id: Uuid,
    pub evidence_type: String,
    pub file_name: Option<String>,
    pub file_size: i64,
    pub file_hash: Option<ContentDigest>,
    pub storage_location: Option<String>,
    pub description: Option<String>,
    pub collection_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}

/// Row handed to the store at intake. The store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct EvidenceCreate {
    pub case_id: Uuid,
    pub evidence_type: String,
    pub file_name: Option<String>,
    pub file_size: i64,
    pub file_hash: Option<ContentDigest>,
    pub storage_location: Option<String>,
    pub description: Option<String>,
    pub collection_time: DateTime<Utc>,
    pub created_by: Uuid,
}

/// Editable metadata. The digest is not part of this type on purpose:
/// a body that tries to send `file_hash` is rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceUpdate {
    pub evidence_type: Option<String>,
    pub description: Option<String>,
    pub storage_location: Option<String>,
    pub collection_time: Option<DateTime<Utc>>,
}

impl EvidenceUpdate {
    pub fn is_empty(&self) -> bool {
        self.evidence_type.is_none()
            && self.description.is_none()
            && self.storage_location.is_none()
            && self.collection_time.is_none()
    }
}

/// Result of re-reading a stored blob and recomputing its digest.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub evidence_id: Uuid,
    pub storage_location: String,
    pub expected: ContentDigest,
    pub actual: ContentDigest,
    pub matches: bool,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceListQuery {
    pub case_id: Option<Uuid>,
}
