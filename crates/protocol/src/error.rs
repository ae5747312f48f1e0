use thiserror::Error;

/// Socket-level failures. The connection is unusable after any of these.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stream closed while reading frame length")]
    TruncatedLength,

    #[error("Stream closed mid-frame: expected {expected} bytes, received {received}")]
    TruncatedPayload { expected: usize, received: usize },

    #[error("Frame length prefix is not a valid varint")]
    MalformedLength,

    #[error("Could not connect to {address} after {attempts} attempts")]
    RetriesExhausted { address: String, attempts: u32 },

    #[error("Connection closed")]
    Closed,
}

/// A frame arrived intact but its content is not what the exchange expects.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Failed to decode message: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Unexpected message kind: expected {expected}, got {actual}")]
    UnexpectedKind { expected: String, actual: String },

    #[error("Message {kind} is missing its body")]
    MissingBody { kind: String },

    #[error("Required field {field} is missing")]
    MissingField { field: &'static str },

    #[error("Correlation mismatch: sent {sent}, received {received}")]
    CorrelationMismatch { sent: i64, received: i64 },

    #[error("Unsupported message kind: {0}")]
    Unsupported(i32),
}

impl ProtocolError {
    pub fn unexpected(expected: impl std::fmt::Debug, actual: impl std::fmt::Debug) -> Self {
        Self::UnexpectedKind {
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    pub fn missing_body(kind: impl std::fmt::Debug) -> Self {
        Self::MissingBody {
            kind: format!("{:?}", kind),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
