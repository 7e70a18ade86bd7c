use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input directory not found: {0}")]
    InputMissing(PathBuf),

    #[error("Manifest not found: {0}")]
    ManifestMissing(PathBuf),

    #[error("Nothing to pack: no images")]
    Empty,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
