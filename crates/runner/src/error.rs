use std::path::PathBuf;

use protocol::{ProtocolError, TransportError};
use thiserror::Error;

/// Why a refactor request was refused. The display text goes back to the
/// core verbatim.
#[derive(Debug, Error)]
pub enum RefactorError {
    #[error("Step implementation not found")]
    StepNotFound,

    #[error("Duplicate step implementation found")]
    DuplicateImplementation,

    #[error("Source location not available for step")]
    SourceUnavailable,

    #[error("Invalid parameter position")]
    InvalidParameterPosition,

    #[error("Refactor request is missing {0}")]
    MissingStepValue(&'static str),

    #[error("Line range {start_line}-{end_line} is outside {path}")]
    InvalidSpan {
        path: PathBuf,
        start_line: usize,
        end_line: usize,
    },

    #[error("Failed to rewrite {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end the router loop.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<protocol::Error> for RunnerError {
    fn from(err: protocol::Error) -> Self {
        match err {
            protocol::Error::Transport(e) => RunnerError::Transport(e),
            protocol::Error::Protocol(e) => RunnerError::Protocol(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
