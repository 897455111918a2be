use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstimatorError {
    /// The bus transaction failed or returned fewer bytes than required.
    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Trace error at line {line}: {message}")]
    Trace { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
