//! Error types for the brick-finder library.
//!
//! Every failure of a `find_brick` invocation is terminal: nothing is retried
//! and no partial result is returned. Errors fall into two phases:
//!
//! * **Validation**: the caller-supplied path is empty, does not exist, or
//!   does not name a supported image type. No I/O beyond an existence check
//!   has happened and no network call is attempted.
//!
//! * **Upload**: the file could not be read, the recognition service could
//!   not be reached or replied with garbage, or it replied with a non-2xx
//!   status.
//!
//! Normalisation of the service's response never fails, so it has no variant
//! here. The tool server turns any of these into a single human-readable
//! message; [`BrickFinderError::kind`] exposes a stable code for callers who
//! want to branch on the failure class.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// All errors returned by the brick-finder library.
#[derive(Debug, Error)]
pub enum BrickFinderError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The `file_path` argument was empty.
    #[error("file_path is required")]
    MissingArgument,

    /// Nothing exists at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is spelled correctly.")]
    NotFound { path: PathBuf },

    /// The file name does not end in `.jpg`, `.jpeg` or `.png`.
    #[error("Only PNG and JPEG images are supported (got extension '{extension}' for '{path}')")]
    UnsupportedFormat { path: PathBuf, extension: String },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The file passed validation but could not be opened or read.
    /// Permission failures get their own wording.
    #[error("{}", access_message(.path, .source))]
    AccessError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The recognition service could not be reached, or its reply could not
    /// be read or decoded as JSON.
    #[error("Error contacting recognition service: {reason}")]
    TransportError { reason: String },

    /// The recognition service answered with a non-2xx status.
    #[error("Recognition service returned HTTP {status}{}", body_suffix(.body))]
    UpstreamError { status: u16, body: Option<String> },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Server I/O ────────────────────────────────────────────────────────
    /// Reading from or writing to the tool-protocol transport failed.
    #[error("Tool transport I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The MCP session could not be established or ended abnormally.
    #[error("MCP session failed: {0}")]
    Session(String),
}

fn access_message(path: &Path, source: &io::Error) -> String {
    if source.kind() == io::ErrorKind::PermissionDenied {
        format!("Permission denied accessing file: '{}'", path.display())
    } else {
        format!("Cannot read image file '{}': {source}", path.display())
    }
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(b) => format!(": {b}"),
        None => String::new(),
    }
}

/// Failure class of a [`BrickFinderError`], stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingArgument,
    NotFound,
    UnsupportedFormat,
    AccessError,
    TransportError,
    UpstreamError,
    InvalidConfig,
    Io,
    Session,
}

impl ErrorKind {
    /// Snake-case code suitable for logs and machine consumers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingArgument => "missing_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::AccessError => "access_error",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::InvalidConfig => "invalid_config",
            ErrorKind::Io => "io",
            ErrorKind::Session => "session",
        }
    }

    /// True for failures detected before any file content is read.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorKind::MissingArgument | ErrorKind::NotFound | ErrorKind::UnsupportedFormat
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BrickFinderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrickFinderError::MissingArgument => ErrorKind::MissingArgument,
            BrickFinderError::NotFound { .. } => ErrorKind::NotFound,
            BrickFinderError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            BrickFinderError::AccessError { .. } => ErrorKind::AccessError,
            BrickFinderError::TransportError { .. } => ErrorKind::TransportError,
            BrickFinderError::UpstreamError { .. } => ErrorKind::UpstreamError,
            BrickFinderError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            BrickFinderError::Io(_) => ErrorKind::Io,
            BrickFinderError::Session(_) => ErrorKind::Session,
        }
    }
}

impl From<reqwest::Error> for BrickFinderError {
    fn from(e: reqwest::Error) -> Self {
        let reason = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        };
        BrickFinderError::TransportError { reason }
    }
}
