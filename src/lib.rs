//! Capture image samples and store them in DMC archives.
//!
//! A DMC archive is a 12-byte container header (magic `1337`, sample count,
//! metadata length), optional JSON metadata, then one length-prefixed record
//! per sample. All integers are little-endian `u32`.

pub mod config;
pub mod data_url;
pub mod error;
pub mod header;
pub mod reader;
pub mod record;
pub mod recorder;
pub mod sample;
pub mod storage;
pub mod utils;
pub mod writer;

pub use error::{DmcError, Result};
pub use header::{ArchiveMetadata, ContainerHeader, MAGIC};
pub use reader::LoadedArchive;
pub use sample::Sample;
