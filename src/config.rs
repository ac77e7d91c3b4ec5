use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

fn default_interval_ms() -> u64 {
    500
}

fn default_mime_type() -> String {
    "image/x-rgba".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveConfig {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl AppConfig {
    pub fn load_default() -> anyhow::Result<Self> {
        let default = include_str!("../config/default.toml");
        let cfg: AppConfig = toml::from_str(default)?;
        Ok(cfg)
    }

    pub fn load_from(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let p = path.into();
        let s = fs::read_to_string(&p)?;
        let cfg: AppConfig = toml::from_str(&s)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_parses() {
        let cfg = AppConfig::load_default().unwrap();
        assert_eq!(cfg.capture.interval_ms, 500);
        assert_eq!(cfg.storage.path, PathBuf::from("recordings"));
        assert!(cfg.archive.description.is_some());
    }

    #[test]
    fn test_load_from_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\nwidth = 8\nheight = 4\n\n[storage]\npath = \"/tmp/dmc\"").unwrap();

        let cfg = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.capture.interval_ms, 500);
        assert_eq!(cfg.capture.mime_type, "image/x-rgba");
        assert_eq!(cfg.capture.width, 8);
        assert!(cfg.archive.description.is_none());
    }
}
