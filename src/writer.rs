use crate::error::{DmcError, Result};
use crate::header::{self, ArchiveMetadata};
use crate::record;
use crate::sample::Sample;

/// Build a complete archive: container header followed by one record per
/// sample, in the order given. Any sample that fails to encode aborts the
/// whole build.
pub fn build(samples: Vec<Sample>, metadata: Option<ArchiveMetadata>) -> Result<Vec<u8>> {
    let count = u32::try_from(samples.len()).map_err(|_| DmcError::LengthOverflow { what: "sample count" })?;

    let mut out = header::encode(count, metadata.as_ref())?;
    for (idx, sample) in samples.into_iter().enumerate() {
        let record = record::package_sample(&sample).map_err(|e| {
            tracing::warn!("sample {} could not be packaged: {}", idx, e);
            e
        })?;
        out.extend_from_slice(&record);
    }

    tracing::debug!("built archive: {} samples, {} bytes", count, out.len());
    Ok(out)
}
