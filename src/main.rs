//! Edge content-hash injector.
//!
//! ```text
//!  invoke:  event JSON ──▶ handle_event ──▶ request JSON (stdout)
//!
//!  serve:   client ──▶ request id ─▶ body limit ─▶ edge handler ──▶ upstream origin
//!                                                   │
//!                                                   └─ x-amz-content-sha256 on POST/PATCH/PUT
//! ```

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use content_hash_edge::config::{load_config, EdgeConfig, ObservabilityConfig};
use content_hash_edge::edge::{handle_event, EdgeEvent};
use content_hash_edge::lifecycle;
use content_hash_edge::observability::logging;

#[derive(Parser)]
#[command(name = "content-hash-edge")]
#[command(about = "Adds x-amz-content-sha256 to request bodies at the edge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the edge proxy in front of an upstream origin
    Serve {
        /// TOML configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Process one origin-request event and print the resulting request
    Invoke {
        /// Event JSON file (reads stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => EdgeConfig::default(),
            };
            logging::init_logging(&config.observability)?;

            tracing::info!(
                bind_address = %config.listener.bind_address,
                upstream = %config.upstream.address,
                request_timeout_secs = config.timeouts.request_secs,
                max_body_bytes = config.limits.max_body_bytes,
                "Configuration loaded"
            );

            lifecycle::serve(config).await?;
            tracing::info!("Shutdown complete");
        }
        Commands::Invoke { event } => {
            logging::init_logging(&ObservabilityConfig::default())?;

            let raw = match event {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let event: EdgeEvent = serde_json::from_str(&raw)?;
            let request = handle_event(event)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
    }

    Ok(())
}
