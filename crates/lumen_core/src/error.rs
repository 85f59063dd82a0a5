//! Resource loading errors
//!
//! Loading failures are fatal to the caller: nothing here is retried.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Error type for resource loading
#[derive(Debug)]
pub enum ResourceLoadError {
    /// IO error (file not found, permission denied, etc.)
    Io { path: PathBuf, source: io::Error },
    /// The file extension names a format no importer handles
    UnsupportedFormat(PathBuf),
    /// The file was read but its contents could not be decoded
    Decode { path: PathBuf, message: String },
}

impl ResourceLoadError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn decode(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn unsupported(path: impl AsRef<Path>) -> Self {
        Self::UnsupportedFormat(path.as_ref().to_path_buf())
    }

    /// The file the failure refers to
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
            Self::UnsupportedFormat(path) => path,
            Self::Decode { path, .. } => path,
        }
    }
}

impl fmt::Display for ResourceLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Failed to read resource {}: {}", path.display(), source)
            }
            Self::UnsupportedFormat(path) => {
                write!(f, "Unsupported resource format: {}", path.display())
            }
            Self::Decode { path, message } => {
                write!(f, "Failed to decode resource {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ResourceLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::UnsupportedFormat(_) => None,
            Self::Decode { .. } => None,
        }
    }
}

/// Lowercased file extension, used to pick an importer
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
