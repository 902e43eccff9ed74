//! Error types for virtmod-rs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using VirtModError.
pub type VirtModResult<T> = Result<T, VirtModError>;

/// Errors that halt the current build session.
///
/// Recoverable conditions (malformed icons outside strict mode, duplicate
/// symbol ids, patches whose target text is gone) are logged instead.
#[derive(Debug, Error)]
pub enum VirtModError {
    /// A canonical id reached the synthesizer that the resolver never produced.
    #[error("virtual module synthesizer: unknown module id `{id}` (specifier `{specifier}`)")]
    UnknownModule { id: String, specifier: String },

    /// No loader in the chain claimed an import.
    #[error("Failed to resolve import `{specifier}`{}", referrer_suffix(.referrer))]
    UnresolvedImport {
        specifier: String,
        referrer: Option<PathBuf>,
    },

    /// Icon file rejected while building the sprite in strict mode.
    #[error("sprite builder: invalid icon {}: {reason}", .path.display())]
    InvalidIcon { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid patch pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl VirtModError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VirtModError::Io {
            path: path.into(),
            source,
        }
    }
}

fn referrer_suffix(referrer: &Option<PathBuf>) -> String {
    match referrer {
        Some(path) => format!(" from {}", path.display()),
        None => String::new(),
    }
}
