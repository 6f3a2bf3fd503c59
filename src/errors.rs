use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid UTF-8 in file {file}")]
    InvalidUtf8 { file: PathBuf },
}

#[derive(Debug, Error)]
pub enum LinkGraphError {
    #[error("Parse error in file {file}: {source}")]
    ParseError { file: PathBuf, source: ParseError },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The external rasterizer could not produce the image. Already written
    /// artifacts (the DOT file) are left in place.
    #[error("Rendering {format} failed: {message}")]
    Rasterize { format: String, message: String },

    #[error("Site generation error: {0}")]
    Site(String),
}

impl LinkGraphError {
    /// Whether this error came from the rasterizer collaborator.
    #[must_use]
    pub fn is_rasterize(&self) -> bool {
        matches!(self, Self::Rasterize { .. })
    }
}
