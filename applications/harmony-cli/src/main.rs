/// Harmony - probe track resolution and session configuration
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use harmony_playback::{SessionConfig, StreamSource, TrackResolver};
use harmony_resolver::{is_absolute_url, ChainResolver, UrlKind, YtDlp};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "harmony")]
#[command(about = "Inspect how Harmony resolves tracks", long_about = None)]
struct Cli {
    /// yt-dlp binary to run
    #[arg(long, global = true, env = "HARMONY_YTDLP", default_value = "yt-dlp")]
    ytdlp: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a query or URL to the URL a session would play
    Search {
        /// Free text or URL
        query: Vec<String>,
    },
    /// Print metadata for a URL as JSON
    Info {
        url: String,
    },
    /// Print which platform a URL belongs to
    Classify {
        url: String,
    },
    /// Open an audio stream and read from it
    Stream {
        url: String,
        /// Stop after this many bytes
        #[arg(short, long, default_value_t = 1 << 20)]
        bytes: usize,
    },
    /// Print the effective session configuration
    Config {
        /// Configuration file path (HARMONY_* variables still apply)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harmony=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { query } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                bail!("empty query");
            }
            let chain = resolver(&cli.ytdlp)?;

            // Absolute URLs play as given, same as a session
            let url = if is_absolute_url(&query) {
                Some(query.trim().to_string())
            } else {
                chain.search(&query).await
            };

            match url {
                Some(url) => println!("{}", url),
                None => bail!("No result found for \"{}\"", query),
            }
        }
        Commands::Info { url } => {
            let chain = resolver(&cli.ytdlp)?;
            let metadata = chain.fetch_metadata(&url).await;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Classify { url } => {
            println!("{}", UrlKind::classify(&url));
        }
        Commands::Stream { url, bytes } => {
            let chain = resolver(&cli.ytdlp)?;
            let Some(mut stream) = chain.open_stream(&url).await else {
                bail!("No audio stream available for {}", url);
            };

            let mut buf = vec![0u8; 64 * 1024];
            let mut total = 0usize;
            while total < bytes {
                let read = stream.read(&mut buf).await.context("stream read failed")?;
                if read == 0 {
                    break;
                }
                total += read;
            }
            info!(url = %url, bytes = total, "Stream probe finished");
            println!("{} bytes", total);
        }
        Commands::Config { config } => {
            let config = SessionConfig::load(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn resolver(ytdlp: &str) -> anyhow::Result<ChainResolver> {
    let chain = ChainResolver::standard_with(YtDlp::new().with_program(ytdlp))
        .context("failed to set up resolver")?;
    tracing::debug!(?chain, "Resolver ready");
    Ok(chain)
}
