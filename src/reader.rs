//! Linear, single-pass archive parser.
//!
//! Decoded samples go to a sink. Batch loading is the same scan with a sink
//! that pushes into a local `Vec`, so the two modes cannot drift apart.

use crate::error::Result;
use crate::header::{self, ArchiveMetadata, ContainerHeader};
use crate::record;
use crate::sample::Sample;

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedArchive {
    /// Count declared in the container header.
    pub sample_count: u32,
    pub metadata: ArchiveMetadata,
    /// Present only when no sink was supplied.
    pub samples: Option<Vec<Sample>>,
}

enum ReadState {
    ReadHeader,
    ReadingRecords { header: ContainerHeader, offset: usize, delivered: usize },
    Done { header: ContainerHeader },
}

/// Parse `buf`. With a sink every sample is handed over as soon as it is
/// decoded and the result carries no samples; without one they are collected.
pub fn parse(buf: &[u8], sink: Option<&mut dyn FnMut(Sample)>) -> Result<LoadedArchive> {
    match sink {
        Some(sink) => {
            let header = scan(buf, sink)?;
            Ok(LoadedArchive {
                sample_count: header.sample_count,
                metadata: header.metadata,
                samples: None,
            })
        }
        None => {
            let mut samples = Vec::new();
            let header = scan(buf, &mut |s: Sample| samples.push(s))?;
            Ok(LoadedArchive {
                sample_count: header.sample_count,
                metadata: header.metadata,
                samples: Some(samples),
            })
        }
    }
}

/// Batch mode.
pub fn load(buf: &[u8]) -> Result<LoadedArchive> {
    parse(buf, None)
}

/// Streaming mode.
pub fn stream<F: FnMut(Sample)>(buf: &[u8], mut sink: F) -> Result<LoadedArchive> {
    parse(buf, Some(&mut sink as &mut dyn FnMut(Sample)))
}

fn scan(buf: &[u8], sink: &mut dyn FnMut(Sample)) -> Result<ContainerHeader> {
    let mut state = ReadState::ReadHeader;
    loop {
        state = match state {
            ReadState::ReadHeader => {
                let header = header::decode(buf).map_err(|e| {
                    tracing::warn!("archive header rejected: {}", e);
                    e
                })?;
                tracing::debug!(
                    "archive header: {} samples, {} metadata bytes",
                    header.sample_count,
                    header.metadata_length
                );
                let offset = header.header_len;
                ReadState::ReadingRecords { header, offset, delivered: 0 }
            }
            ReadState::ReadingRecords { header, offset, delivered } => {
                let remaining = buf.len() - offset;
                if remaining < 4 {
                    if remaining > 0 {
                        tracing::debug!("ignoring {} trailing bytes at offset {}", remaining, offset);
                    }
                    if delivered != header.sample_count as usize {
                        tracing::warn!(
                            "header declares {} samples but {} were read",
                            header.sample_count,
                            delivered
                        );
                    }
                    ReadState::Done { header }
                } else {
                    let (sample, next) = record::unpackage_record(buf, offset).map_err(|e| {
                        tracing::warn!("record {} rejected: {}", delivered, e);
                        e
                    })?;
                    sink(sample);
                    ReadState::ReadingRecords { header, offset: next, delivered: delivered + 1 }
                }
            }
            ReadState::Done { header } => return Ok(header),
        };
    }
}
