//! Capture file formats.
//!
//! A capture is the concatenation of deciphered frames, each beginning with the
//! magic word. `gtr` files hold the bytes as-is and `gtz` files hold them
//! gzip-compressed.

use std::path::Path;

/// On-disk capture encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureFormat {
    /// `.gtr`: raw frames
    Raw,
    /// `.gtz`: gzip-compressed frames
    Gzip,
}

impl CaptureFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Raw => "gtr",
            Self::Gzip => "gtz",
        }
    }

    /// Map an extension (without the dot, case-insensitive) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gtr" => Some(Self::Raw),
            "gtz" => Some(Self::Gzip),
            _ => None,
        }
    }

    /// Format of `path`, if its extension names one.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Extension of `path` as text, empty when there is none.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}
