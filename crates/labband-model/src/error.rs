use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown sex: {0}")]
    UnknownSex(String),
    #[error("invalid age band '{key}': {message}")]
    InvalidAgeBand { key: String, message: String },
    #[error("unknown band: {0}")]
    UnknownBand(String),
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
