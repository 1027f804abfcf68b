use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Endpoint returned status {status}: {body}")]
    ResponseStatusError { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification of a failed generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    ResponseStatus,
    MalformedResponse,
    Other,
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::TransportError(_) => FailureKind::Transport,
            GenerationError::ResponseStatusError { .. } => FailureKind::ResponseStatus,
            GenerationError::MalformedResponse(_) => FailureKind::MalformedResponse,
            GenerationError::ConfigError(_) | GenerationError::SerializationError(_) => {
                FailureKind::Other
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GenerationError::TransportError("refused".into()).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            GenerationError::ResponseStatusError {
                status: 500,
                body: String::new()
            }
            .kind(),
            FailureKind::ResponseStatus
        );
        assert_eq!(
            GenerationError::MalformedResponse("no message".into()).kind(),
            FailureKind::MalformedResponse
        );
    }

    #[test]
    fn test_error_display() {
        let err = GenerationError::ResponseStatusError {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "Endpoint returned status 502: bad gateway");
    }
}
