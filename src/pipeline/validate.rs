//! Input validation: turn an untrusted path string into an [`ImageReference`].
//!
//! The extension check is purely lexical. File content is never sniffed, so a
//! renamed non-image passes here and is left to the recognition service to
//! reject.

use crate::error::BrickFinderError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions accepted by the recognition service (lower-case).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A local image that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    path: PathBuf,
    file_name: String,
    extension: String,
}

impl ImageReference {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Lower-case extension, one of [`SUPPORTED_EXTENSIONS`].
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// MIME type sent with the multipart upload.
    pub fn mime_type(&self) -> &'static str {
        match self.extension.as_str() {
            "png" => "image/png",
            _ => "image/jpeg",
        }
    }
}

/// Validate a caller-supplied image path.
///
/// Checks, in order: the path is non-empty, something exists there, and the
/// file name carries a supported extension.
pub fn validate(path: &str) -> Result<ImageReference, BrickFinderError> {
    if path.is_empty() {
        return Err(BrickFinderError::MissingArgument);
    }

    let path = PathBuf::from(path);
    if !path.exists() {
        return Err(BrickFinderError::NotFound { path });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = lexical_extension(&file_name);

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(BrickFinderError::UnsupportedFormat { path, extension });
    }

    debug!("Validated image: {} ({})", path.display(), extension);
    Ok(ImageReference {
        path,
        file_name,
        extension,
    })
}

/// Text after the last `.` of the file name, lower-cased; empty without a dot.
///
/// Unlike [`Path::extension`], a dot-file such as `.png` yields `png`.
fn lexical_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> String {
        let p = dir.path().join(name);
        fs::write(&p, b"not really an image").unwrap();
        p.to_string_lossy().into_owned()
    }

    #[test]
    fn empty_path_is_missing_argument() {
        assert!(matches!(validate(""), Err(BrickFinderError::MissingArgument)));
    }

    #[test]
    fn nonexistent_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("ghost.png");
        let err = validate(p.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, BrickFinderError::NotFound { .. }), "got {err:?}");
    }

    #[test]
    fn gif_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let p = touch(&dir, "photo.gif");
        match validate(&p) {
            Err(BrickFinderError::UnsupportedFormat { extension, .. }) => {
                assert_eq!(extension, "gif")
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn no_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let p = touch(&dir, "README");
        match validate(&p) {
            Err(BrickFinderError::UnsupportedFormat { extension, .. }) => {
                assert_eq!(extension, "")
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        for name in ["a.JPG", "b.Jpeg", "c.PNG", "d.tar.png"] {
            let p = touch(&dir, name);
            let image = validate(&p).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(SUPPORTED_EXTENSIONS.contains(&image.extension()));
            assert_eq!(image.file_name(), name);
        }
    }

    #[test]
    fn renamed_non_image_passes() {
        let dir = TempDir::new().unwrap();
        let p = touch(&dir, "actually_text.jpg");
        let image = validate(&p).expect("lexical check only");
        assert_eq!(image.mime_type(), "image/jpeg");
    }

    #[test]
    fn mime_types() {
        let dir = TempDir::new().unwrap();
        assert_eq!(validate(&touch(&dir, "x.png")).unwrap().mime_type(), "image/png");
        assert_eq!(validate(&touch(&dir, "x.jpeg")).unwrap().mime_type(), "image/jpeg");
    }

    #[test]
    fn lexical_extension_rules() {
        assert_eq!(lexical_extension("photo.PNG"), "png");
        assert_eq!(lexical_extension("archive.tar.gz"), "gz");
        assert_eq!(lexical_extension(".png"), "png");
        assert_eq!(lexical_extension("noext"), "");
        assert_eq!(lexical_extension("trailing."), "");
    }
}
