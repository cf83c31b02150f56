//! Identification entry points.
//!
//! One invocation runs the three pipeline stages strictly in order and keeps
//! nothing afterwards:
//!
//! ```text
//! file_path ──▶ validate ──▶ upload ──▶ normalize ──▶ ResultSet
//! ```
//!
//! Validation failures return before the file is opened or any connection is
//! made.

use crate::config::RecognitionConfig;
use crate::error::BrickFinderError;
use crate::output::ResultSet;
use crate::pipeline::upload::BrickognizeClient;
use crate::pipeline::{normalize, validate};
use std::time::Instant;
use tracing::{info, warn};

impl BrickognizeClient {
    /// Validate `file_path`, upload it, and normalise the reply.
    pub async fn identify(&self, file_path: &str) -> Result<ResultSet, BrickFinderError> {
        let start = Instant::now();
        info!("Identifying brick in: {}", file_path);

        let image = validate::validate(file_path).inspect_err(|e| {
            warn!("Rejected '{}' ({}): {}", file_path, e.kind(), e);
        })?;

        let raw = self.upload(&image).await.inspect_err(|e| {
            warn!("Upload of '{}' failed ({}): {}", file_path, e.kind(), e);
        })?;

        let result = normalize::normalize(&raw);
        info!(
            "Found {} candidates in {}ms",
            result.count,
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}

/// Identify the brick(s) in a local JPEG or PNG photo.
///
/// Builds a fresh client from `config`. Callers running many identifications
/// should build one [`BrickognizeClient`] and call
/// [`BrickognizeClient::identify`] instead, which reuses connections.
///
/// # Errors
/// - [`BrickFinderError::MissingArgument`] / [`BrickFinderError::NotFound`] /
///   [`BrickFinderError::UnsupportedFormat`] before any network call
/// - [`BrickFinderError::AccessError`] if the file cannot be read
/// - [`BrickFinderError::TransportError`] / [`BrickFinderError::UpstreamError`]
///   if the recognition service call fails
pub async fn identify(
    file_path: impl AsRef<str>,
    config: &RecognitionConfig,
) -> Result<ResultSet, BrickFinderError> {
    BrickognizeClient::new(config)?
        .identify(file_path.as_ref())
        .await
}

/// Blocking wrapper around [`identify`] for non-async callers.
///
/// Must not be called from inside a tokio runtime.
pub fn identify_sync(
    file_path: impl AsRef<str>,
    config: &RecognitionConfig,
) -> Result<ResultSet, BrickFinderError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BrickFinderError::TransportError {
            reason: format!("failed to start async runtime: {e}"),
        })?
        .block_on(identify(file_path, config))
}
