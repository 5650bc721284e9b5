//! Image kind classification
//!
//! Files are classified purely by extension; the contents are never decoded.

use crate::constants::{JPEG_EXTENSIONS, PNG_EXTENSIONS};
use std::fmt;
use std::path::Path;

/// Image kinds handled by an external compressor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Quantized with pngquant over a quality ladder
    Png,
    /// Re-encoded with mozjpeg's cjpeg
    Jpeg,
}

impl ImageKind {
    /// Classify a path by its case-insensitive extension.
    ///
    /// Returns `None` for anything that is not `.png`, `.jpg` or `.jpeg`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.to_lowercase();
        if PNG_EXTENSIONS.contains(&ext.as_str()) {
            Some(ImageKind::Png)
        } else if JPEG_EXTENSIONS.contains(&ext.as_str()) {
            Some(ImageKind::Jpeg)
        } else {
            None
        }
    }

    /// Whether `path` carries an extension belonging to this kind
    pub fn matches(&self, path: &Path) -> bool {
        Self::from_path(path) == Some(*self)
    }

    /// The external binary responsible for this kind
    pub fn tool_name(&self) -> &'static str {
        match self {
            ImageKind::Png => "pngquant",
            ImageKind::Jpeg => "cjpeg",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Png => "PNG",
            ImageKind::Jpeg => "JPEG",
        };
        write!(f, "{}", name)
    }
}
