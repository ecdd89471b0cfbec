//! Semantic error types for engine communication and step resolution.
//!
//! The taxonomy keeps "could not determine" strictly separate from
//! "determined unimplemented": connection and protocol failures surface as
//! [`ResolveError::Unavailable`] and are never folded into a negative
//! resolution result.

use thiserror::Error;

use crate::messages::MessageKind;

/// Errors raised while exchanging messages with the engine process.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The connection failed while sending or receiving a frame.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be serialized or deserialized.
    #[error("malformed message: {0}")]
    Message(#[from] serde_json::Error),

    /// The response carried a different id than the request.
    #[error("response id {received} does not correlate with request id {expected}")]
    Correlation {
        /// Id the request was sent with.
        expected: i64,
        /// Id the response arrived with.
        received: i64,
    },

    /// The response carried an unexpected message type.
    #[error("expected a {expected:?} message, received {received:?}")]
    UnexpectedKind {
        /// Kind the caller was waiting for.
        expected: MessageKind,
        /// Kind the envelope declared.
        received: MessageKind,
    },

    /// The envelope declared a type but omitted the matching payload.
    #[error("envelope of type {0:?} is missing its payload")]
    MissingPayload(MessageKind),
}

/// Errors raised while resolving canonical step text.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The engine could not be reached or answered out of protocol. Callers
    /// must treat this as "implementation status unknown", never as
    /// "unimplemented".
    #[error("step resolution unavailable: {0}")]
    Unavailable(#[from] ProtocolError),

    /// The engine answered, but no catalog entry matches the step value.
    #[error("no catalog entry matches step value '{0}'")]
    StepValueNotFound(String),
}

/// Errors raised while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_error_names_both_ids() {
        let error = ProtocolError::Correlation {
            expected: 7,
            received: 9,
        };
        assert_eq!(
            error.to_string(),
            "response id 9 does not correlate with request id 7"
        );
    }

    #[test]
    fn io_error_converts_from_std_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
        let error: ProtocolError = io_err.into();
        assert!(error.to_string().contains("read timed out"));
    }

    #[test]
    fn unavailable_wraps_protocol_failures() {
        let error = ResolveError::from(ProtocolError::MissingPayload(
            MessageKind::GetStepValueResponse,
        ));
        assert!(error.to_string().starts_with("step resolution unavailable"));
    }

    #[test]
    fn step_value_not_found_names_the_step() {
        let error = ResolveError::StepValueNotFound("say {} to {}".to_string());
        assert!(error.to_string().contains("say {} to {}"));
    }
}
