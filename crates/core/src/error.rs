//! Resource error taxonomy shared by loaders and caches.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// No indexed file matches the requested logical name.
    #[error("No resource found for '{0}'")]
    NotFound(String),

    /// Two files share the same bare name; the first one was kept.
    #[error("Asset named '{name}' already exists at {kept:?} (ignored {ignored:?})")]
    NameConflict {
        name: String,
        kept: PathBuf,
        ignored: PathBuf,
    },

    #[error("Failed to decode '{name}': {reason}")]
    Decode { name: String, reason: String },

    #[error("Unable to open archive {path:?}: {reason}")]
    ArchiveOpen { path: PathBuf, reason: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The GPU backend refused an upload or a compilation.
    #[error("GPU error for '{name}': {reason}")]
    Gpu { name: String, reason: String },
}

impl AssetError {
    pub fn decode(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn gpu(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Gpu {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
