use super::files::IoError;
use super::options::ConfigError;
use crate::core::models::topology::ModelError;
use crate::core::utils::parse::ParseError;
use thiserror::Error;

/// Every failure a trajectory operation can report.
///
/// Errors are never repaired or retried internally; the caller decides
/// whether to abort or skip the offending frame.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid molecular graph: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed on-disk content: bad header, inconsistent atom count,
    /// truncated payload, unexpected token count.
    #[error("Format error: {0}")]
    Format(String),

    #[error("Can not read step {step}: the file only contains {nsteps} steps")]
    OutOfBounds { step: u64, nsteps: u64 },

    /// The external identifier toolkit reported an error.
    #[error("Toolkit error: {0}")]
    Toolkit(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(IoError::Stream(error))
    }
}

impl Error {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
