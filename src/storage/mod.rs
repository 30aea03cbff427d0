pub mod local;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::error::ApiError;

pub use local::LocalBlobStore;

const LOCATOR_SUFFIX_LEN: usize = 10;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Object storage for evidence file bytes, addressed by locator.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes a new object. Fails if the locator is already taken.
    async fn upload(&self, locator: &str, content: Bytes) -> Result<(), ApiError>;
    /// Returns `ApiError::NotFound` when no object exists at the locator.
    async fn download(&self, locator: &str) -> Result<Bytes, ApiError>;
    async fn delete(&self, locator: &str) -> Result<(), ApiError>;
}

/// Builds `{user_id}/{unix_millis}-{random}` plus `.{ext}` when the original
/// name has a usable extension.
pub fn generate_locator(user_id: Uuid, file_name: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..LOCATOR_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    let base = format!("{}/{}-{}", user_id, now.timestamp_millis(), suffix);
    match file_extension(file_name) {
        Some(ext) => format!("{}.{}", base, ext),
        None => base,
    }
}

/// Text after the last dot, restricted to ASCII alphanumerics and lowercased.
fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Rejects locators that could escape the storage root.
pub(crate) fn validate_locator(locator: &str) -> Result<(), ApiError> {
    if locator.is_empty()
        || locator.starts_with('/')
        || locator.contains('\\')
        || locator.contains('\0')
        || locator.split('/').any(|part| part.is_empty() || part == "." || part == "..")
    {
        return Err(ApiError::validation(format!(
            "Invalid storage locator: {}",
            locator
        )));
    }
    Ok(())
}
