use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dmc_recorder::config::AppConfig;
use dmc_recorder::recorder::{MockFrameSource, SampleRecorder};
use dmc_recorder::storage::ArchiveStore;
use dmc_recorder::utils::{extension_for, unix_millis};
use dmc_recorder::{reader, writer, ArchiveMetadata};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sets a custom config file path
    #[arg(short, long, value_name = "FILE_PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture samples from the synthetic source and save them as a .dmc archive
    Record {
        #[arg(long, default_value_t = 5)]
        duration_secs: u64,
        /// Archive name, `.dmc` is appended when missing
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Print metadata and a summary of every sample in an archive
    Inspect { file: PathBuf },
    /// Write every sample payload of an archive into a directory
    Extract { file: PathBuf, out_dir: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load_default()?,
    };

    match cli.command {
        Command::Record { duration_secs, output, description } => {
            record(&config, duration_secs, output, description).await
        }
        Command::Inspect { file } => inspect(&file).await,
        Command::Extract { file, out_dir } => extract(&file, &out_dir).await,
    }
}

async fn record(
    config: &AppConfig,
    duration_secs: u64,
    output: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let store = ArchiveStore::new(&config.storage).await?;
    let name = output.unwrap_or_else(|| format!("session-{}", unix_millis()));

    let mut recorder = SampleRecorder::new(&config.capture);
    recorder.start(MockFrameSource::new(&config.capture));
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;
    recorder.stop().await;

    let samples = recorder.take_samples().await;
    info!("captured {} samples", samples.len());

    let metadata = ArchiveMetadata {
        filename: Some(format!("{}.dmc", name.trim_end_matches(".dmc"))),
        description: description.or_else(|| config.archive.description.clone()),
        meta: None,
    };
    let bytes = writer::build(samples, Some(metadata)).context("building archive")?;
    let path = store.save(&name, &bytes).await?;
    println!("{}", path.display());
    Ok(())
}

async fn inspect(file: &Path) -> Result<()> {
    let data = ArchiveStore::load(file).await?;
    let mut index = 0usize;
    let loaded = reader::stream(&data, |sample| {
        let mime = sample.mime_type().unwrap_or_default();
        println!(
            "#{:<5} t={} {}x{} {} {} bytes",
            index, sample.timestamp, sample.width, sample.height, mime, sample.byte_length
        );
        index += 1;
    })
    .with_context(|| format!("{} is not a valid archive", file.display()))?;

    println!("samples:  {}", loaded.sample_count);
    println!("metadata: {}", serde_json::to_string_pretty(&loaded.metadata)?);
    println!("sha256:   {}", ArchiveStore::checksum(file).await?);
    Ok(())
}

async fn extract(file: &Path, out_dir: &Path) -> Result<()> {
    let data = ArchiveStore::load(file).await?;
    let loaded = reader::load(&data).with_context(|| format!("{} is not a valid archive", file.display()))?;
    tokio::fs::create_dir_all(out_dir).await?;

    let samples = loaded.samples.unwrap_or_default();
    for (idx, sample) in samples.iter().enumerate() {
        let mime = sample.mime_type()?;
        let path = out_dir.join(format!("sample-{:05}.{}", idx, extension_for(&mime)));
        tokio::fs::write(&path, sample.payload()?).await?;
    }
    info!("extracted {} samples to {}", samples.len(), out_dir.display());
    Ok(())
}
