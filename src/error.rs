use thiserror::Error;

/// Errors surfaced by config, preset, capture and quiz loading
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to encode GIF: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("invalid question bank: {0}")]
    InvalidQuestionBank(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("preset '{name}' would overwrite '{existing}'")]
    PresetConflict { name: String, existing: String },

    #[error("could not determine config directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, Error>;
