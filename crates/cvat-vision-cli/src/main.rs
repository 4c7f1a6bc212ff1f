//! `cvat-vision` command-line front end.

mod commands;
mod frames;
mod output;
mod page;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cvat_vision::{Loader, LoaderConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Computer-vision helpers of the annotation client, on the command line.
#[derive(Parser, Debug)]
#[command(name = "cvat-vision")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend API URL (e.g. https://app.cvat.ai/api)
    #[arg(long, global = true, env = "CVAT_BACKEND_API")]
    backend: Option<String>,

    /// How long to wait for the vision library, in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Use the bundled library instead of fetching it from the backend
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the backend's name, description and version
    About,

    /// List the backend's annotation import and export formats
    Formats,

    /// Extract the longest external contour and its simplified polygon
    Contours {
        image: PathBuf,

        /// Douglas-Peucker distance used to simplify the contour
        #[arg(long, default_value_t = 1.0)]
        threshold: f64,

        /// Gray level at or above which a pixel is foreground
        #[arg(long, default_value_t = 128)]
        binarize: u8,
    },

    /// Histogram-equalize an image file
    Equalize { input: PathBuf, output: PathBuf },

    /// Track a box across a sequence of frames
    Track {
        #[arg(required = true)]
        frames: Vec<PathBuf>,

        /// Initial box on the first frame as x,y,width,height
        #[arg(long, value_parser = commands::track::parse_bbox)]
        bbox: [f64; 4],
    },
}

impl Cli {
    fn config(&self) -> Result<LoaderConfig> {
        let mut config = LoaderConfig::from_env().context("invalid CVAT_* environment")?;
        if let Some(backend) = &self.backend {
            config.backend_api = backend.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        config.validate().context("invalid loader configuration")?;
        Ok(config)
    }

    /// Loader for the vision library, initialized and ready for use.
    async fn vision(&self) -> Result<Loader> {
        let config = self.config()?;
        let loader = if self.offline {
            Loader::new(config, Arc::new(page::BundledPage::new()))?
        } else {
            Loader::http(config)?
        };
        loader
            .initialize()
            .await
            .with_context(|| format!("failed to load {}", loader.script_url()))?;
        Ok(loader)
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("cvat_vision=info".parse()?))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match &cli.command {
        Command::About => commands::server::about(&cli.config()?).await,
        Command::Formats => commands::server::formats(&cli.config()?).await,
        Command::Contours {
            image,
            threshold,
            binarize,
        } => {
            let loader = cli.vision().await?;
            commands::contours::run(&loader, image, *threshold, *binarize)
        }
        Command::Equalize { input, output } => {
            let loader = cli.vision().await?;
            commands::equalize::run(&loader, input, output)
        }
        Command::Track { frames, bbox } => {
            let loader = cli.vision().await?;
            commands::track::run(&loader, frames, *bbox)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track() {
        let cli = Cli::try_parse_from([
            "cvat-vision",
            "--offline",
            "track",
            "a.png",
            "b.png",
            "--bbox",
            "10,20,5,6",
        ])
        .unwrap();
        assert!(cli.offline);
        match cli.command {
            Command::Track { frames, bbox } => {
                assert_eq!(frames.len(), 2);
                assert_eq!(bbox, [10.0, 20.0, 15.0, 26.0]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_track_requires_frames() {
        assert!(Cli::try_parse_from(["cvat-vision", "track", "--bbox", "1,2,3,4"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "cvat-vision",
            "--backend",
            "https://app.cvat.ai/api",
            "--timeout-ms",
            "1500",
            "about",
        ])
        .unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.backend_api, "https://app.cvat.ai/api");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }
}
