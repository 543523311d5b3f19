use std::path::PathBuf;

use burn::{config::ConfigError, record::RecorderError};

use crate::idx::IdxError;

/// Result type used across the crate.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid IDX file `{path}`: {source}")]
    Idx {
        path: PathBuf,
        #[source]
        source: IdxError,
    },

    #[error("Split `{split}` has {images} images but {labels} labels")]
    CountMismatch {
        split: &'static str,
        images: usize,
        labels: usize,
    },

    #[error("Missing dataset file `{0}` (also looked for a `.gz` variant)")]
    MissingFile(PathBuf),

    #[error("Invalid training config: {0}")]
    InvalidConfig(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("Serde error: {0}")]
    Json(#[from] serde_json::Error),
}
