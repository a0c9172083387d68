//! Reflow Grid host process
//!
//! Reads one JSON command per line from stdin (or a script file) and writes
//! one JSON response per line to stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use reflow_grid_host::{Config, Session};
use reflow_grid_ipc::{decode_command, encode_response, HostCommand, HostResponse};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "reflow-grid")]
#[command(author, version, about = "Drive reorderable ragged grids over a JSON line protocol")]
struct Args {
    /// Configuration file (skips the standard search locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read commands from a file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (needed for log level)
    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|e| {
            // Can't use tracing yet, fall back to eprintln
            eprintln!("Failed to load configuration: {}. Using defaults.", e);
            Config::default()
        }),
    };

    let level = args
        .log_level
        .as_deref()
        .unwrap_or(config.behavior.log_level.as_str());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Validate and clamp config values
    for w in config.validate() {
        warn!("Config: {} - {}", w.field, w.message);
    }

    let mut session = Session::from_config(&config).context("Failed to build grid board")?;
    info!(
        "Reflow Grid host ready with grids: {}",
        session.grid_names().join(", ")
    );

    match &args.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open script: {}", path.display()))?;
            run(BufReader::new(file), &mut session).await?;
        }
        None => run(BufReader::new(tokio::io::stdin()), &mut session).await?,
    }

    info!("Reflow Grid host stopped");
    Ok(())
}

/// Process commands until `stop`, end of input, or Ctrl+C.
async fn run<R: AsyncBufRead + Unpin>(reader: R, session: &mut Session) -> Result<()> {
    let mut lines = reader.lines();
    let mut stdout = tokio::io::stdout();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read command")?,
            _ = &mut shutdown => {
                info!("Ctrl+C received, shutting down...");
                break;
            }
        };
        let Some(line) = line else {
            info!("End of input");
            break;
        };

        let trimmed = line.trim();
        // Blank lines and `#` comments keep scripts readable.
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (response, stop) = match decode_command(trimmed) {
            Ok(cmd) => {
                let stop = matches!(cmd, HostCommand::Stop);
                (session.handle_command(cmd), stop)
            }
            Err(e) => {
                warn!("Rejected command: {}", e);
                (HostResponse::error(e.to_string()), false)
            }
        };

        stdout
            .write_all(encode_response(&response).as_bytes())
            .await
            .context("Failed to write response")?;
        stdout.flush().await?;

        if stop {
            break;
        }
    }

    Ok(())
}
