//! `data:` URL text form for sample payloads.
//!
//! Samples travel through the recorder as `data:<mime>;base64,<payload>`
//! strings. Conversion works over bounded chunks so very large frames are
//! never pushed through the engine in a single call.

use base64::{engine::general_purpose, Engine as _};

use crate::error::{DmcError, Result};

const SCHEME: &str = "data:";
const BASE64_TAG: &str = ";base64";

/// Raw bytes per encode step. Must stay a multiple of 3 so that chunk
/// encodings concatenate without padding in the middle of the payload.
const CHUNK_SIZE: usize = 3 * 2730;

/// Base64 characters per decode step, the encoded size of one `CHUNK_SIZE`.
const DECODE_CHUNK_SIZE: usize = CHUNK_SIZE / 3 * 4;

/// Encode `bytes` as a base64 `data:` URL tagged with `mime_type`.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    let encoded_len = (bytes.len() + 2) / 3 * 4;
    let mut out = String::with_capacity(SCHEME.len() + mime_type.len() + BASE64_TAG.len() + 1 + encoded_len);
    out.push_str(SCHEME);
    out.push_str(mime_type);
    out.push_str(BASE64_TAG);
    out.push(',');

    for chunk in bytes.chunks(CHUNK_SIZE) {
        general_purpose::STANDARD.encode_string(chunk, &mut out);
    }
    out
}

/// Split a `data:` URL into its MIME type and decoded bytes.
pub fn decode(text: &str) -> Result<(String, Vec<u8>)> {
    let rest = text
        .strip_prefix(SCHEME)
        .ok_or_else(|| DmcError::decode("missing data: scheme"))?;
    let (tag, payload) = rest
        .split_once(',')
        .ok_or_else(|| DmcError::decode("missing ',' before payload"))?;
    let mime_type = tag
        .strip_suffix(BASE64_TAG)
        .ok_or_else(|| DmcError::decode(format!("unsupported encoding in '{}'", tag)))?;
    if mime_type.is_empty() {
        return Err(DmcError::decode("empty MIME type"));
    }

    let payload = payload.as_bytes();
    let mut bytes = Vec::with_capacity(payload.len() / 4 * 3);
    for (idx, chunk) in payload.chunks(DECODE_CHUNK_SIZE).enumerate() {
        general_purpose::STANDARD
            .decode_vec(chunk, &mut bytes)
            .map_err(|e| DmcError::decode(format!("chunk {}: {}", idx, e)))?;
    }

    Ok((mime_type.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 + i / 7) as u8).collect()
    }

    #[test]
    fn test_roundtrip_across_chunk_boundaries() {
        for len in [0usize, 1, 2, 3, 8191, 8192, 8193, CHUNK_SIZE, CHUNK_SIZE + 1, 100_000] {
            let bytes = pattern(len);
            let url = encode("image/png", &bytes);
            let (mime, decoded) = decode(&url).unwrap();
            assert_eq!(mime, "image/png");
            assert_eq!(decoded, bytes, "length {}", len);
        }
    }

    #[test]
    fn test_chunked_output_matches_single_pass() {
        let bytes = pattern(3 * CHUNK_SIZE + 17);
        let url = encode("image/jpeg", &bytes);
        let single = general_purpose::STANDARD.encode(&bytes);
        assert_eq!(url, format!("data:image/jpeg;base64,{}", single));
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(encode("image/png", &[]), "data:image/png;base64,");
        let (mime, bytes) = decode("data:image/png;base64,").unwrap();
        assert_eq!(mime, "image/png");
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_text() {
        let cases = [
            "image/png;base64,AAAA",
            "data:image/png;base64AAAA",
            "data:image/png,AAAA",
            "data:;base64,AAAA",
            "data:image/png;base64,AA*A",
            "data:image/png;base64,AAAAA",
            "data:image/png;base64,ü",
        ];
        for text in cases {
            match decode(text) {
                Err(DmcError::Decode { .. }) => {}
                other => panic!("expected decode error for {:?}, got {:?}", text, other),
            }
        }
    }
}
