use crate::config::StorageConfig;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ARCHIVE_EXTENSION: &str = "dmc";

/// Directory of saved `.dmc` archives.
#[derive(Clone)]
pub struct ArchiveStore {
    pub root: Arc<PathBuf>,
}

impl ArchiveStore {
    pub async fn new(cfg: &StorageConfig) -> Result<Self> {
        let root = cfg.path.clone();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("creating archive directory {}", root.display()))?;
        Ok(ArchiveStore { root: Arc::new(root) })
    }

    /// Write `bytes` to `<root>/<name>.dmc` via a temporary file and rename.
    pub async fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(archive_file_name(name));
        let tmp_path = path.with_extension("dmc.tmp");
        tokio::fs::write(&tmp_path, bytes)
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &path).await?;
        tracing::info!("saved archive {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    pub async fn load(path: &Path) -> Result<Vec<u8>> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        tracing::debug!("loaded {} bytes from {}", data.len(), path.display());
        Ok(data)
    }

    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&*self.root).await?;
        let mut out = Vec::new();
        while let Some(ent) = entries.next_entry().await? {
            let p = ent.path();
            if p.extension().and_then(|e| e.to_str()) == Some(ARCHIVE_EXTENSION) {
                out.push(p);
            }
        }
        out.sort();
        Ok(out)
    }

    pub async fn checksum(path: &Path) -> Result<String> {
        let data = tokio::fs::read(path).await?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn archive_file_name(name: &str) -> String {
    let suffix = format!(".{}", ARCHIVE_EXTENSION);
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader;
    use crate::sample::Sample;
    use crate::writer;
    use tempfile::TempDir;

    async fn store(tmpdir: &TempDir) -> Result<ArchiveStore> {
        let cfg = StorageConfig { path: tmpdir.path().join("archives") };
        ArchiveStore::new(&cfg).await
    }

    #[tokio::test]
    async fn test_save_and_load_archive() -> Result<()> {
        let tmpdir = TempDir::new()?;
        let store = store(&tmpdir).await?;

        let samples = vec![Sample::from_image(1, 2, 2, "image/png", b"pixels")];
        let bytes = writer::build(samples.clone(), None)?;
        let path = store.save("session", &bytes).await?;
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("session.dmc"));

        let data = ArchiveStore::load(&path).await?;
        let loaded = reader::load(&data)?;
        assert_eq!(loaded.samples, Some(samples));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_only_dmc_files() -> Result<()> {
        let tmpdir = TempDir::new()?;
        let store = store(&tmpdir).await?;

        let bytes = writer::build(Vec::new(), None)?;
        store.save("b", &bytes).await?;
        store.save("a.dmc", &bytes).await?;
        tokio::fs::write(store.root.join("notes.txt"), b"x").await?;

        let listed = store.list().await?;
        let names: Vec<_> = listed
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a.dmc", "b.dmc"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_checksum_is_stable() -> Result<()> {
        let tmpdir = TempDir::new()?;
        let store = store(&tmpdir).await?;

        let bytes = writer::build(vec![Sample::from_image(5, 1, 1, "image/png", b"z")], None)?;
        let path = store.save("sum", &bytes).await?;

        let first = ArchiveStore::checksum(&path).await?;
        let second = ArchiveStore::checksum(&path).await?;
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        Ok(())
    }
}
