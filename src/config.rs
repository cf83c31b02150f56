//! Configuration for brick identification.
//!
//! All tunable behaviour lives in [`RecognitionConfig`], built via
//! [`RecognitionConfigBuilder`]. The defaults reproduce the Brickognize
//! contract exactly; the endpoint override exists for self-hosted mirrors
//! and for pointing tests at a local mock server.
//!
//! The query parameters and the multipart field name are part of the
//! service contract and are not configurable.

use crate::error::BrickFinderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Brickognize search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.brickognize.com/internal/search/";

/// User agent sent with every recognition request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Fixed query parameters appended to every recognition request.
pub const QUERY_PARAMS: [(&str, &str); 2] =
    [("external_catalogs", "bricklink"), ("predict_color", "true")];

/// Multipart field carrying the image bytes.
pub const IMAGE_FIELD: &str = "query_image";

/// Configuration for a recognition client.
///
/// # Example
/// ```rust
/// use brick_finder::{OutputFormat, RecognitionConfig};
///
/// let config = RecognitionConfig::builder()
///     .output_format(OutputFormat::Text)
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint, brick_finder::config::DEFAULT_ENDPOINT);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Full URL of the search endpoint. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// `user-agent` header value. Default: [`DEFAULT_USER_AGENT`].
    pub user_agent: String,

    /// How the tool server renders the text block of a successful result.
    /// The structured result is always attached as well. Default: JSON.
    pub output_format: OutputFormat,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            output_format: OutputFormat::default(),
        }
    }
}

impl RecognitionConfig {
    /// Create a new builder for `RecognitionConfig`.
    pub fn builder() -> RecognitionConfigBuilder {
        RecognitionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RecognitionConfig`].
#[derive(Debug)]
pub struct RecognitionConfigBuilder {
    config: RecognitionConfig,
}

impl RecognitionConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RecognitionConfig, BrickFinderError> {
        let c = &self.config;
        let url = reqwest::Url::parse(&c.endpoint).map_err(|e| {
            BrickFinderError::InvalidConfig(format!("endpoint '{}' is not a URL: {}", c.endpoint, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(BrickFinderError::InvalidConfig(format!(
                "endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.user_agent.trim().is_empty() {
            return Err(BrickFinderError::InvalidConfig(
                "user agent must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Rendering used for the text block of a tool result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON of the result set. (default)
    #[default]
    Json,
    /// Human-readable candidate listing.
    Text,
}

impl FromStr for OutputFormat {
    type Err = BrickFinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "structured" => Ok(OutputFormat::Json),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(BrickFinderError::InvalidConfig(format!(
                "unknown output format '{other}' (expected json or text)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Text => f.write_str("text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let c = RecognitionConfig::default();
        assert_eq!(c.endpoint, "https://api.brickognize.com/internal/search/");
        assert!(c.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(c.output_format, OutputFormat::Json);
        assert_eq!(QUERY_PARAMS[0], ("external_catalogs", "bricklink"));
        assert_eq!(QUERY_PARAMS[1], ("predict_color", "true"));
    }

    #[test]
    fn builder_accepts_local_endpoint() {
        let c = RecognitionConfig::builder()
            .endpoint("http://127.0.0.1:9000/internal/search/")
            .build()
            .expect("valid config");
        assert_eq!(c.endpoint, "http://127.0.0.1:9000/internal/search/");
    }

    #[test]
    fn builder_rejects_non_http_endpoint() {
        let err = RecognitionConfig::builder()
            .endpoint("ftp://example.com/search")
            .build()
            .unwrap_err();
        assert!(matches!(err, BrickFinderError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_garbage_endpoint() {
        assert!(RecognitionConfig::builder().endpoint("not a url").build().is_err());
    }

    #[test]
    fn builder_rejects_blank_user_agent() {
        assert!(RecognitionConfig::builder().user_agent("  ").build().is_err());
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }
}
