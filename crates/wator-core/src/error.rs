//! Error types for the simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Rejected at construction time, never raised while stepping.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A worker failed while computing a generation. The in-progress next
    /// buffer has been discarded and the last completed generation is intact.
    #[error("Fatal step error at generation {generation}: {reason}")]
    FatalStep { generation: u64, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Error::Configuration(reason.into())
    }

    pub fn is_fatal_step(&self) -> bool {
        matches!(self, Error::FatalStep { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
