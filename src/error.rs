use thiserror::Error;

#[derive(Debug, Error)]
pub enum LosError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("antenna {antenna_id}: beam name {beam_name:?} carries no sector width")]
    BeamName { antenna_id: u32, beam_name: String },

    #[error("antenna file line {line}, column {column}: {message}")]
    AntennaRecord {
        line: u64,
        column: usize,
        message: String,
    },

    #[error("computation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LosError>;
