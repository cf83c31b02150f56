//! Upload: send one validated image to the recognition service.
//!
//! This is the only stage with network I/O. Exactly one POST is made per
//! call; there is no retry and no timeout beyond the HTTP client's default,
//! so callers that need bounded latency wrap the future themselves.
//!
//! ## Request shape
//!
//! ```text
//! POST {endpoint}?external_catalogs=bricklink&predict_color=true
//! accept: application/json
//! user-agent: <fixed browser string>
//! content-type: multipart/form-data; boundary=…
//!
//! query_image = <raw file bytes>   (filename + image/png | image/jpeg)
//! ```

use crate::config::{RecognitionConfig, IMAGE_FIELD, QUERY_PARAMS};
use crate::error::BrickFinderError;
use crate::pipeline::validate::ImageReference;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// Raw JSON returned by the recognition service.
///
/// Kept as an untyped tree; [`crate::pipeline::normalize`] owns the walk.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResponse(Value);

impl RecognitionResponse {
    pub fn from_value(v: Value) -> Self {
        Self(v)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Client for the Brickognize search endpoint.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its connection
/// pool. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct BrickognizeClient {
    client: Client,
    endpoint: String,
    user_agent: String,
}

impl BrickognizeClient {
    /// Build a client from a validated configuration.
    pub fn new(config: &RecognitionConfig) -> Result<Self, BrickFinderError> {
        let client = Client::builder().build().map_err(|e| {
            BrickFinderError::InvalidConfig(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload `image` and return the service's JSON reply.
    pub async fn upload(
        &self,
        image: &ImageReference,
    ) -> Result<RecognitionResponse, BrickFinderError> {
        let bytes = read_image(image).await?;
        debug!(
            "Uploading {} ({} bytes, {}) to {}",
            image.file_name(),
            bytes.len(),
            image.mime_type(),
            self.endpoint
        );

        let part = Part::bytes(bytes)
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| BrickFinderError::TransportError {
                reason: format!("invalid multipart part: {e}"),
            })?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&QUERY_PARAMS)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .ok()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty());
            warn!("Recognition service returned HTTP {}", status);
            return Err(BrickFinderError::UpstreamError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| BrickFinderError::TransportError {
                reason: format!("response is not valid JSON: {e}"),
            })?;

        info!("Recognition succeeded for {}", image.file_name());
        Ok(RecognitionResponse(value))
    }
}

/// Read the whole file. The handle is dropped at the end of this function,
/// before the upload is awaited, on success and on every error path.
async fn read_image(image: &ImageReference) -> Result<Vec<u8>, BrickFinderError> {
    let access_error = |source| BrickFinderError::AccessError {
        path: image.path().to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(image.path())
        .await
        .map_err(access_error)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await.map_err(access_error)?;
    Ok(buf)
}
