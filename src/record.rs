//! Per-sample record framing.
//!
//! A record is `u32 LE header length`, a JSON header, then the raw payload:
//!
//! ```text
//! +--------+----------------------+-------------------+
//! | len:4  | header: len bytes    | payload: byteLen  |
//! +--------+----------------------+-------------------+
//! ```

use bytes::BufMut;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data_url;
use crate::error::{DmcError, Result};
use crate::sample::Sample;

pub const DEFAULT_MIME_TYPE: &str = "image/png";

const LEN_PREFIX: usize = 4;

/// JSON header stored in front of every payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordHeader {
    timestamp: u64,
    width: u32,
    height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<Map<String, Value>>,
}

/// Encode one sample as a length-prefixed record.
pub fn package_sample(sample: &Sample) -> Result<Vec<u8>> {
    let (mime_type, payload) = data_url::decode(&sample.data_url)?;
    sample.validate(payload.len())?;

    let header = RecordHeader {
        timestamp: sample.timestamp,
        width: sample.width,
        height: sample.height,
        mime_type: Some(mime_type),
        byte_length: payload.len(),
        meta: sample.meta.clone(),
    };
    let header_bytes = serde_json::to_vec(&header).map_err(DmcError::Encode)?;
    let header_len = u32::try_from(header_bytes.len())
        .map_err(|_| DmcError::LengthOverflow { what: "record header" })?;
    if u32::try_from(payload.len()).is_err() {
        return Err(DmcError::LengthOverflow { what: "record payload" });
    }

    let mut buf = Vec::with_capacity(LEN_PREFIX + header_bytes.len() + payload.len());
    buf.put_u32_le(header_len);
    buf.put_slice(&header_bytes);
    buf.put_slice(&payload);
    Ok(buf)
}

/// Decode the record starting at `offset`, returning the sample and the
/// offset just past its payload.
pub fn unpackage_record(buf: &[u8], offset: usize) -> Result<(Sample, usize)> {
    let available = buf.len().saturating_sub(offset);
    let header_start = end_of(offset, LEN_PREFIX, buf.len(), available)?;
    let header_len = read_u32_le(buf, offset) as usize;

    let header_end = end_of(header_start, header_len, buf.len(), available)
        .map_err(|_| DmcError::truncated(offset, LEN_PREFIX + header_len, available))?;
    let header: RecordHeader = serde_json::from_slice(&buf[header_start..header_end])
        .map_err(|source| DmcError::MalformedHeader { offset: header_start, source })?;

    let payload_end = end_of(header_end, header.byte_length, buf.len(), available).map_err(|_| {
        DmcError::truncated(
            offset,
            LEN_PREFIX.saturating_add(header_len).saturating_add(header.byte_length),
            available,
        )
    })?;
    let payload = &buf[header_end..payload_end];

    let mime_type = header.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE);
    let sample = Sample {
        timestamp: header.timestamp,
        width: header.width,
        height: header.height,
        data_url: data_url::encode(mime_type, payload),
        byte_length: payload.len(),
        meta: header.meta,
    };

    Ok((sample, payload_end))
}

pub(crate) fn read_u32_le(buf: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(word)
}

/// `start + len`, provided that range fits inside a buffer of `buf_len` bytes.
fn end_of(start: usize, len: usize, buf_len: usize, available: usize) -> Result<usize> {
    match start.checked_add(len) {
        Some(end) if end <= buf_len => Ok(end),
        _ => Err(DmcError::truncated(start, len, available)),
    }
}
