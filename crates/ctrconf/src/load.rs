//! Reading render inputs from files.
//!
//! Models (and [`Limits`](crate::Limits)) can be written as JSON or TOML; the
//! format is picked from the file extension.

use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Format for a path, by extension (`.json`, `.toml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported model format for {0} (expected .json or .toml)")]
    UnknownFormat(String),

    #[error("invalid JSON model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML model: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Parses a model from text.
pub fn parse_model<T: DeserializeOwned>(text: &str, format: Format) -> Result<T, LoadError> {
    match format {
        Format::Json => Ok(serde_json::from_str(text)?),
        Format::Toml => Ok(toml::from_str(text)?),
    }
}

/// Reads and parses a model file.
pub fn load_model<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let format =
        Format::from_path(path)
            .ok_or_else(|| LoadError::UnknownFormat(path.display().to_string()))?;
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), ?format, "loading model");
    parse_model(&text, format)
}
