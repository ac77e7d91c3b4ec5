use thiserror::Error;

/// Everything that can go wrong while encoding or decoding a DMC archive.
#[derive(Error, Debug)]
pub enum DmcError {
    #[error("invalid magic number: expected 1337, found {found}")]
    InvalidMagic { found: u32 },

    #[error("malformed header at offset {offset}: {source}")]
    MalformedHeader {
        offset: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("truncated record at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("data URL decode failed: {reason}")]
    Decode { reason: String },

    #[error("invalid sample: {reason}")]
    InvalidSample { reason: String },

    #[error("{what} does not fit in a u32 length field")]
    LengthOverflow { what: &'static str },

    #[error("JSON encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

impl DmcError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        DmcError::Decode { reason: reason.into() }
    }

    pub(crate) fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        DmcError::TruncatedRecord { offset, needed, available }
    }

    /// True for the errors that mean the input is not a well-formed archive.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DmcError::InvalidMagic { .. }
                | DmcError::MalformedHeader { .. }
                | DmcError::TruncatedRecord { .. }
                | DmcError::Decode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DmcError>;
