use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ApiError;
use crate::models::ContentDigest;

const READ_CHUNK: usize = 64 * 1024;

/// SHA-256 of an in-memory buffer as lowercase hex.
pub fn fingerprint_bytes(content: &[u8]) -> ContentDigest {
    let digest = Sha256::digest(content);
    ContentDigest::from_hex_unchecked(format!("{:x}", digest))
}

/// Hashes everything the reader yields.
///
/// When `expected_len` is given, a short or long read is reported as
/// `DigestComputationFailed` so that a partial upload never gets a digest.
pub async fn fingerprint_reader<R>(
    mut reader: R,
    expected_len: Option<u64>,
) -> Result<(ContentDigest, u64), ApiError>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_CHUNK];
    let mut consumed: u64 = 0;

    loop {
        let read = reader
            .read(&mut buffer)
            .await
            .map_err(|e| ApiError::DigestComputationFailed(format!("read failed: {}", e)))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        consumed += read as u64;
    }

    if let Some(expected) = expected_len {
        if consumed != expected {
            return Err(ApiError::DigestComputationFailed(format!(
                "read {} bytes, expected {}",
                consumed, expected
            )));
        }
    }

    let digest = ContentDigest::from_hex_unchecked(format!("{:x}", hasher.finalize()));
    Ok((digest, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "device gone")))
        }
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            fingerprint_bytes(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            fingerprint_bytes(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_single_bit_flip_changes_digest() {
        let original = b"chain of custody".to_vec();
        let mut flipped = original.clone();
        flipped[3] ^= 0x01;
        assert_ne!(fingerprint_bytes(&original), fingerprint_bytes(&flipped));
    }

    #[tokio::test]
    async fn test_reader_matches_buffer_across_chunks() {
        let content: Vec<u8> = (0..(READ_CHUNK * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let (digest, len) = fingerprint_reader(&content[..], Some(content.len() as u64))
            .await
            .unwrap();
        assert_eq!(len, content.len() as u64);
        assert_eq!(digest, fingerprint_bytes(&content));
    }

    #[tokio::test]
    async fn test_short_read_fails() {
        let content = b"truncated".to_vec();
        let result = fingerprint_reader(&content[..], Some(100)).await;
        assert!(matches!(result, Err(ApiError::DigestComputationFailed(_))));
    }

    #[tokio::test]
    async fn test_read_error_fails() {
        let result = fingerprint_reader(BrokenReader, None).await;
        assert!(matches!(result, Err(ApiError::DigestComputationFailed(_))));
    }
}
