//! CLI binary for brick-finder.
//!
//! A thin shim over the library crate: `serve` runs the MCP tool server on
//! stdio, `identify` runs one identification and prints the result.

use anyhow::{Context, Result};
use brick_finder::{BrickognizeClient, McpServer, OutputFormat, RecognitionConfig};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run as an MCP server on stdio (what MCP hosts launch)
  brick-finder
  brick-finder serve --format text

  # Identify a brick once and print the candidates
  brick-finder identify ~/Pictures/brick.jpg

  # Same, as JSON
  brick-finder identify --json ~/Pictures/brick.png > result.json

MCP HOST CONFIGURATION:
  {
    "mcpServers": {
      "brick-finder": { "command": "brick-finder", "args": ["serve"] }
    }
  }

ENVIRONMENT VARIABLES:
  BRICK_FINDER_ENDPOINT   Override the recognition endpoint
  BRICK_FINDER_FORMAT     Tool result text format: json (default) or text
  RUST_LOG                Log filter (logs always go to stderr)
"#;

/// Identify LEGO bricks from photos via Brickognize.
#[derive(Parser, Debug)]
#[command(
    name = "brick-finder",
    version,
    about = "Identify LEGO bricks from photos via Brickognize (MCP server + CLI)",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Recognition endpoint URL.
    #[arg(long, global = true, env = "BRICK_FINDER_ENDPOINT")]
    endpoint: Option<String>,

    /// Text block format of successful tool results (serve only).
    #[arg(long, global = true, env = "BRICK_FINDER_FORMAT", value_enum, default_value = "json")]
    format: FormatArg,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "BRICK_FINDER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "BRICK_FINDER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP tool server on stdin/stdout (default).
    Serve,
    /// Identify the brick in one photo and print the candidates.
    Identify {
        /// Path to a .jpg, .jpeg or .png photo.
        file: String,

        /// Print the structured result as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Json,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout carries the protocol stream (serve) or the result (identify);
    // logs always go to stderr.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = build_config(cli.endpoint.as_deref(), cli.format.into())?;
            McpServer::new(&config)
                .context("Failed to start server")?
                .serve_stdio()
                .await
                .context("Tool server stopped with an error")?;
        }
        Command::Identify { file, json } => {
            let config = build_config(cli.endpoint.as_deref(), OutputFormat::Json)?;
            let client = BrickognizeClient::new(&config).context("Failed to build client")?;

            let progress = (!cli.quiet && !json).then(|| spinner(&file));
            let outcome = client.identify(&file).await;
            if let Some(bar) = progress {
                bar.finish_and_clear();
            }
            let result = outcome.map_err(|e| {
                let kind = e.kind();
                anyhow::Error::new(e).context(format!("Identification failed [{kind}]"))
            })?;

            let rendered = if json {
                serde_json::to_string_pretty(&result).context("Failed to serialise result")?
            } else {
                result.to_text()
            };
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", rendered.trim_end()).context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Map CLI args to `RecognitionConfig`.
fn build_config(endpoint: Option<&str>, format: OutputFormat) -> Result<RecognitionConfig> {
    let mut builder = RecognitionConfig::builder().output_format(format);
    if let Some(url) = endpoint {
        builder = builder.endpoint(url);
    }
    builder.build().context("Invalid configuration")
}

fn spinner(file: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(format!("Identifying {file}…"));
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
