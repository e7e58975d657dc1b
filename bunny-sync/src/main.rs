use std::path::PathBuf;

use anyhow::Context;
use bunny_sync::{CleanMode, DEFAULT_UPLOAD_CONCURRENCY, SyncConfig, SyncEngine};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Upload a local directory to a Bunny storage zone.
#[derive(Debug, Parser)]
#[command(name = "bunny-upload", version, about)]
struct Cli {
    /// Local directory to upload
    #[arg(long, default_value = ".")]
    source: PathBuf,

    /// Remote directory path
    #[arg(long, default_value = "/")]
    target: String,

    /// Storage zone name
    #[arg(long, env = "BUNNY_STORAGE_ZONE_NAME")]
    zone: Option<String>,

    /// Storage zone access key
    #[arg(long, env = "BUNNY_ACCESS_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Storage region, e.g. ny, la or sg
    #[arg(long, env = "BUNNY_STORAGE_REGION")]
    region: Option<String>,

    /// Clean destination before uploading: none, simple (delete everything)
    /// or avoid-deletes (remove only what no longer exists locally)
    #[arg(long, default_value = "avoid-deletes")]
    clean: CleanMode,

    /// Maximum number of concurrent uploads
    #[arg(long, env = "BUNNY_MAX_CONCURRENT_UPLOADS", default_value_t = DEFAULT_UPLOAD_CONCURRENCY)]
    concurrency: usize,

    /// Storage API base URL, overrides --region
    #[arg(long, env = "BUNNY_STORAGE_ENDPOINT", hide = true)]
    endpoint: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_parts(self) -> (PathBuf, String, SyncConfig) {
        let mut config = SyncConfig::new(
            self.zone.unwrap_or_default(),
            self.key.unwrap_or_default(),
        )
        .with_clean(self.clean)
        .with_max_concurrent_uploads(self.concurrency);
        config.region = self.region.filter(|region| !region.trim().is_empty());
        config.endpoint = self.endpoint;
        (self.source, self.target, config)
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (source, target, config) = cli.into_parts();
    config.validate()?;

    info!(
        "uploading {} to {}{}",
        source.display(),
        config.storage_zone,
        target
    );
    let engine = SyncEngine::from_config(&config)?;
    let report = engine
        .synchronize(&source, &target)
        .await
        .with_context(|| format!("failed to upload {}", source.display()))?;

    println!(
        "Upload complete: {} files uploaded, {} remote entries removed.",
        report.uploaded, report.cleaned.deleted
    );
    Ok(())
}
