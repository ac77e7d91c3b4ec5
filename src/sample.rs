use serde_json::{Map, Value};

use crate::data_url;
use crate::error::{DmcError, Result};

/// One captured frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Capture instant, milliseconds since the UNIX epoch.
    pub timestamp: u64,
    pub width: u32,
    pub height: u32,
    /// Payload in `data:<mime>;base64,...` form.
    pub data_url: String,
    /// Length of the decoded payload in bytes.
    pub byte_length: usize,
    pub meta: Option<Map<String, Value>>,
}

impl Sample {
    pub fn from_image(timestamp: u64, width: u32, height: u32, mime_type: &str, bytes: &[u8]) -> Self {
        Sample {
            timestamp,
            width,
            height,
            data_url: data_url::encode(mime_type, bytes),
            byte_length: bytes.len(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn mime_type(&self) -> Result<String> {
        data_url::decode(&self.data_url).map(|(mime, _)| mime)
    }

    pub fn payload(&self) -> Result<Vec<u8>> {
        data_url::decode(&self.data_url).map(|(_, bytes)| bytes)
    }

    /// Checks dimensions and that `byte_length` matches `payload_len`.
    pub(crate) fn validate(&self, payload_len: usize) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DmcError::InvalidSample {
                reason: format!("dimensions must be positive, got {}x{}", self.width, self.height),
            });
        }
        if self.byte_length != payload_len {
            return Err(DmcError::InvalidSample {
                reason: format!(
                    "byteLength {} does not match payload of {} bytes",
                    self.byte_length, payload_len
                ),
            });
        }
        Ok(())
    }
}
