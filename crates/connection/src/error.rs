use protocol::{ProtocolError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A well-formed error reply from the core.
    #[error("Core returned an error: {0}")]
    Application(String),
}

impl From<protocol::Error> for ApiError {
    fn from(err: protocol::Error) -> Self {
        match err {
            protocol::Error::Transport(e) => ApiError::Transport(e),
            protocol::Error::Protocol(e) => ApiError::Protocol(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_keeps_its_category() {
        let err: ApiError = protocol::Error::Transport(TransportError::Closed).into();
        assert!(matches!(err, ApiError::Transport(TransportError::Closed)));

        let err: ApiError =
            protocol::Error::Protocol(ProtocolError::MissingField { field: "path" }).into();
        assert!(matches!(err, ApiError::Protocol(_)));
    }

    #[test]
    fn test_application_error_display() {
        let err = ApiError::Application("plugin not installed".to_string());
        assert_eq!(err.to_string(), "Core returned an error: plugin not installed");
    }
}
