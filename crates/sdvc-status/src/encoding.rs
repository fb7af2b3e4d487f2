//! Transport encoding: zlib (DEFLATE) compression, then base64url without
//! padding.

use std::io::{Read, Write};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{StatusError, StatusResult};

/// Compress and encode a packed status buffer.
pub fn encode_bytes(bytes: &[u8]) -> StatusResult<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(bytes)
        .map_err(|e| StatusError::Encode(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| StatusError::Encode(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Upper bound on a decompressed status list: 16 MiB, or 128 Mi entries at
/// one bit each.
pub const MAX_DECODED_BYTES: usize = 16 * 1024 * 1024;

/// Reverse of `encode_bytes`, bounded by `MAX_DECODED_BYTES`.
pub fn decode_bytes(encoded: &str) -> StatusResult<Vec<u8>> {
    decode_bytes_limited(encoded, MAX_DECODED_BYTES)
}

/// Reverse of `encode_bytes`. Fails once the decompressed output would
/// exceed `limit` bytes, without inflating the rest of the stream.
pub fn decode_bytes_limited(encoded: &str, limit: usize) -> StatusResult<Vec<u8>> {
    let compressed = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
        tracing::warn!(error = %e, "status list is not valid base64url");
        StatusError::Decode(format!("invalid base64url: {e}"))
    })?;

    let mut bytes = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| {
            tracing::warn!(error = %e, "status list failed to decompress");
            StatusError::Decode(format!("invalid zlib stream: {e}"))
        })?;
    if bytes.len() > limit {
        tracing::warn!(limit, "decompressed status list exceeds limit");
        return Err(StatusError::Decode(format!(
            "decompressed status list exceeds {limit} bytes"
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_bytes() {
        let bytes = vec![0xb9, 0xa3];
        let encoded = encode_bytes(&bytes).unwrap();
        assert_eq!(decode_bytes(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_encoded_is_unpadded_base64url() {
        let encoded = encode_bytes(&[0xffu8; 1000]).unwrap();
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_compression_shrinks_uniform_lists() {
        let encoded = encode_bytes(&[0u8; 16 * 1024]).unwrap();
        assert!(encoded.len() < 200, "got {} chars", encoded.len());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode_bytes("not*base64").unwrap_err(),
            StatusError::Decode(_)
        ));
    }

    #[test]
    fn test_decode_stops_at_limit() {
        let encoded = encode_bytes(&vec![0u8; 64 * 1024]).unwrap();
        assert!(matches!(
            decode_bytes_limited(&encoded, 1024).unwrap_err(),
            StatusError::Decode(_)
        ));
        assert_eq!(decode_bytes_limited(&encoded, 64 * 1024).unwrap().len(), 64 * 1024);
    }

    #[test]
    fn test_decode_rejects_oversized_stream() {
        // Highly compressible, so the encoded form is small
        let encoded = encode_bytes(&vec![0u8; MAX_DECODED_BYTES + 1]).unwrap();
        assert!(encoded.len() < 64 * 1024);
        assert!(matches!(
            decode_bytes(&encoded).unwrap_err(),
            StatusError::Decode(_)
        ));
    }

    #[test]
    fn test_decode_rejects_non_zlib() {
        let encoded = URL_SAFE_NO_PAD.encode(b"plain bytes, not compressed");
        assert!(matches!(
            decode_bytes(&encoded).unwrap_err(),
            StatusError::Decode(_)
        ));
    }
}
