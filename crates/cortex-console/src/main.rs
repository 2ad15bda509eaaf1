//! Cortex Console - terminal front end for the orchestrator backend.
//!
//! Wires the headless core (session sync, explorer, document loader,
//! plugin host) to a line-oriented shell: plain input is sent as a chat
//! message, `/commands` drive everything else.

mod app;

use anyhow::Result;
use clap::Parser;
use cortex_core::config::{NetworkConfig, PathsConfig};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cortex")]
#[command(about = "Chat console for the Cortex orchestrator")]
struct Args {
    /// Orchestrator base URL (overrides CORTEX_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory for local state such as the notes draft
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Run without a backend (empty lists, no sends)
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let api_url = args.api_url.unwrap_or_else(|| {
        std::env::var(NetworkConfig::BASE_URL_ENV)
            .unwrap_or_else(|_| NetworkConfig::DEFAULT_BASE_URL.to_string())
    });

    let data_dir = args.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(PathsConfig::DATA_DIR_NAME)
    });

    info!("Connecting to orchestrator at {}", api_url);
    let app = app::ConsoleApp::new(&api_url, &data_dir, args.offline)?;
    app.start();

    println!("Cortex console ready. Type a message, /help for commands, /quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !app.handle_line(&line).await {
                            break;
                        }
                    }
                    // stdin closed
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    app.shutdown();
    info!("Bye");
    Ok(())
}
