use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use runway::thumbnails::default_workers;
use runway::{build_gallery, BuildOptions, GalleryConfig};

/// Lay out a justified photo gallery and write its thumbnails.
#[derive(Debug, Parser)]
#[command(name = "runway", version)]
struct Cli {
    /// Gallery configuration (JSON).
    config: PathBuf,

    /// Directory the config's folders are relative to [default: current directory].
    #[arg(long)]
    context: Option<PathBuf>,

    /// Write the manifest here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Resize worker threads.
    #[arg(long, default_value_t = default_workers())]
    workers: usize,

    /// Only compute the layout.
    #[arg(long)]
    no_thumbnails: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("runway=info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns false when the gallery was built but some thumbnails failed.
async fn run(cli: Cli) -> Result<bool> {
    let config = GalleryConfig::load(&cli.config)?;
    let options = BuildOptions {
        workers: cli.workers,
        skip_thumbnails: cli.no_thumbnails,
    };

    let context = cli.context.clone().unwrap_or_default();
    let build = build_gallery(&config, &context, &options).await?;
    let json = serde_json::to_string_pretty(&build.manifest).context("Failed to encode manifest")?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write manifest: {:?}", path))?;
            info!(?path, "Wrote gallery manifest");
        }
        None => println!("{json}"),
    }

    for failure in &build.failures {
        error!(
            dst = ?failure.dst,
            "Thumbnail failed: {}",
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(build.failures.is_empty())
}
