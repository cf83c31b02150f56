//! # brick-finder
//!
//! Identify LEGO bricks from a photo using the
//! [Brickognize](https://brickognize.com) recognition service, as a library,
//! a CLI, or an MCP tool server exposing a single `find_brick` tool.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file_path
//!  │
//!  ├─ 1. Validate   non-empty, exists, .jpg / .jpeg / .png
//!  ├─ 2. Upload     multipart POST to api.brickognize.com (one attempt)
//!  ├─ 3. Normalize  detected_items × candidate_items → ordered candidates
//!  └─ 4. Output     ResultSet as JSON or as a text listing
//! ```
//!
//! Every stage is request-scoped: nothing is cached or remembered between
//! calls, so concurrent identifications need no coordination.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brick_finder::{identify, RecognitionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RecognitionConfig::default();
//!     let result = identify("photos/brick.jpg", &config).await?;
//!     println!("{}", result.to_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `brick-finder` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! brick-finder = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod identify;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OutputFormat, RecognitionConfig, RecognitionConfigBuilder};
pub use error::{BrickFinderError, ErrorKind};
pub use identify::{identify, identify_sync};
pub use output::{CandidateMatch, ResultSet, TopColor};
pub use pipeline::normalize::normalize;
pub use pipeline::upload::{BrickognizeClient, RecognitionResponse};
pub use pipeline::validate::{validate, ImageReference};
pub use server::McpServer;
