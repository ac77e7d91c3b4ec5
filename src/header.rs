use bytes::BufMut;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DmcError, Result};
use crate::record::read_u32_le;

pub const MAGIC: u32 = 1337;

/// Size of the fixed part of the container header: magic, count, metadata length.
pub const FIXED_HEADER_LEN: usize = 12;

/// Optional descriptive data stored once per archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Decoded container header.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerHeader {
    pub sample_count: u32,
    pub metadata_length: u32,
    pub metadata: ArchiveMetadata,
    /// Bytes consumed by the header; the first record starts here.
    pub header_len: usize,
}

pub fn encode(sample_count: u32, metadata: Option<&ArchiveMetadata>) -> Result<Vec<u8>> {
    let metadata_bytes = match metadata {
        Some(m) => serde_json::to_vec(m).map_err(DmcError::Encode)?,
        None => Vec::new(),
    };
    let metadata_len = u32::try_from(metadata_bytes.len())
        .map_err(|_| DmcError::LengthOverflow { what: "archive metadata" })?;

    let mut buf = Vec::with_capacity(FIXED_HEADER_LEN + metadata_bytes.len());
    buf.put_u32_le(MAGIC);
    buf.put_u32_le(sample_count);
    buf.put_u32_le(metadata_len);
    buf.put_slice(&metadata_bytes);
    Ok(buf)
}

pub fn decode(buf: &[u8]) -> Result<ContainerHeader> {
    if buf.len() < FIXED_HEADER_LEN {
        return Err(DmcError::truncated(0, FIXED_HEADER_LEN, buf.len()));
    }

    let magic = read_u32_le(buf, 0);
    if magic != MAGIC {
        return Err(DmcError::InvalidMagic { found: magic });
    }
    let sample_count = read_u32_le(buf, 4);
    let metadata_length = read_u32_le(buf, 8);

    let header_len = FIXED_HEADER_LEN
        .checked_add(metadata_length as usize)
        .filter(|end| *end <= buf.len())
        .ok_or_else(|| {
            DmcError::truncated(
                FIXED_HEADER_LEN,
                metadata_length as usize,
                buf.len() - FIXED_HEADER_LEN,
            )
        })?;

    let metadata = if metadata_length == 0 {
        ArchiveMetadata::default()
    } else {
        serde_json::from_slice(&buf[FIXED_HEADER_LEN..header_len]).map_err(|source| {
            DmcError::MalformedHeader { offset: FIXED_HEADER_LEN, source }
        })?
    };

    Ok(ContainerHeader { sample_count, metadata_length, metadata, header_len })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ArchiveMetadata {
        let mut meta = Map::new();
        meta.insert("foo".into(), Value::from("bar"));
        ArchiveMetadata {
            filename: Some("session.dmc".into()),
            description: Some("kitchen camera".into()),
            meta: Some(meta),
        }
    }

    #[test]
    fn test_absent_metadata_is_exactly_twelve_bytes() {
        let buf = encode(3, None).unwrap();
        assert_eq!(buf.len(), FIXED_HEADER_LEN);
        assert_eq!(&buf[0..4], &1337u32.to_le_bytes());
        assert_eq!(&buf[4..8], &3u32.to_le_bytes());
        assert_eq!(&buf[8..12], &0u32.to_le_bytes());

        let header = decode(&buf).unwrap();
        assert_eq!(header.sample_count, 3);
        assert_eq!(header.metadata_length, 0);
        assert_eq!(header.metadata, ArchiveMetadata::default());
        assert_eq!(header.header_len, 12);
    }

    #[test]
    fn test_metadata_length_matches_appended_bytes() {
        let buf = encode(2, Some(&metadata())).unwrap();
        let declared = read_u32_le(&buf, 8) as usize;
        assert_eq!(buf.len(), FIXED_HEADER_LEN + declared);

        let header = decode(&buf).unwrap();
        assert_eq!(header.metadata, metadata());
        assert_eq!(header.header_len, buf.len());
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let only_meta = ArchiveMetadata { meta: Some(Map::new()), ..Default::default() };
        let buf = encode(0, Some(&only_meta)).unwrap();
        assert_eq!(&buf[FIXED_HEADER_LEN..], br#"{"meta":{}}"#);
    }

    #[test]
    fn test_invalid_magic() {
        let mut buf = encode(1, None).unwrap();
        buf[0] ^= 0xFF;
        assert!(matches!(decode(&buf), Err(DmcError::InvalidMagic { .. })));
    }

    #[test]
    fn test_short_buffers() {
        assert!(matches!(decode(&[0x39, 0x05]), Err(DmcError::TruncatedRecord { .. })));

        let buf = encode(1, Some(&metadata())).unwrap();
        assert!(matches!(
            decode(&buf[..buf.len() - 1]),
            Err(DmcError::TruncatedRecord { offset: 12, .. })
        ));
    }

    #[test]
    fn test_malformed_metadata() {
        let mut buf = Vec::new();
        buf.put_u32_le(MAGIC);
        buf.put_u32_le(0);
        buf.put_u32_le(5);
        buf.put_slice(b"{oops");
        assert!(matches!(decode(&buf), Err(DmcError::MalformedHeader { offset: 12, .. })));
    }
}
