//! Blocking request/response client for the engine protocol.

use tracing::debug;

use crate::connection::Connection;
use crate::error::ProtocolError;
use crate::messages::{Envelope, StepValuePair};

/// Drives one blocking round trip at a time over a connection.
///
/// Each call builds an envelope with a fresh message id, sends it, blocks
/// for exactly one response frame, and verifies the response correlates with
/// the request before handing back its payload. The client never opens or
/// closes connections; pass it a pooled connection (or a `&mut` borrow of
/// one) and drop it when done.
#[derive(Debug)]
pub struct ProtocolClient<C> {
    connection: C,
}

impl<C: Connection> ProtocolClient<C> {
    /// Wrap `connection` for request/response use.
    #[must_use]
    pub fn new(connection: C) -> Self {
        Self { connection }
    }

    /// Fetch the engine's full step catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the transport fails or the response
    /// does not correlate with the request.
    pub fn all_steps(&mut self) -> Result<Vec<StepValuePair>, ProtocolError> {
        let request = Envelope::all_steps_request();
        self.round_trip(&request)?.into_all_steps()
    }

    /// Ask the engine to normalize `step_text` into its step value.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the transport fails or the response
    /// does not correlate with the request.
    pub fn step_value(&mut self, step_text: &str) -> Result<String, ProtocolError> {
        let request = Envelope::step_value_request(step_text);
        self.round_trip(&request)?.into_step_value()
    }

    fn round_trip(&mut self, request: &Envelope) -> Result<Envelope, ProtocolError> {
        let frame = serde_json::to_vec(request)?;
        self.connection.send(&frame)?;
        let reply = self.connection.receive()?;
        let response: Envelope = serde_json::from_slice(&reply)?;
        if response.message_id != request.message_id {
            return Err(ProtocolError::Correlation {
                expected: request.message_id,
                received: response.message_id,
            });
        }
        debug!(
            message_id = request.message_id,
            message_type = ?request.message_type,
            "round trip complete"
        );
        Ok(response)
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests assert on frames they constructed"
)]
mod tests {
    use std::io;

    use crate::messages::{AllStepsResponse, MessageKind};

    use super::*;

    /// Parses each sent frame and answers with a configurable envelope.
    struct ScriptedEngine {
        last_request: Option<Envelope>,
        skew_reply_id: bool,
        answer_with_kind: Option<MessageKind>,
        fail_on_send: bool,
    }

    impl ScriptedEngine {
        fn well_behaved() -> Self {
            Self {
                last_request: None,
                skew_reply_id: false,
                answer_with_kind: None,
                fail_on_send: false,
            }
        }
    }

    impl Connection for ScriptedEngine {
        fn send(&mut self, frame: &[u8]) -> io::Result<()> {
            if self.fail_on_send {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "engine gone"));
            }
            self.last_request = Some(serde_json::from_slice(frame).map_err(io::Error::other)?);
            Ok(())
        }

        fn receive(&mut self) -> io::Result<Vec<u8>> {
            let request = self
                .last_request
                .take()
                .ok_or_else(|| io::Error::other("receive before send"))?;
            let mut reply = Envelope {
                message_id: if self.skew_reply_id {
                    request.message_id + 1
                } else {
                    request.message_id
                },
                message_type: self
                    .answer_with_kind
                    .unwrap_or(MessageKind::GetAllStepsResponse),
                all_steps_request: None,
                all_steps_response: None,
                step_value_request: None,
                step_value_response: None,
            };
            if reply.message_type == MessageKind::GetAllStepsResponse {
                reply.all_steps_response = Some(AllStepsResponse { steps: Vec::new() });
            }
            serde_json::to_vec(&reply).map_err(io::Error::other)
        }
    }

    #[test]
    fn all_steps_round_trip_succeeds() {
        let mut client = ProtocolClient::new(ScriptedEngine::well_behaved());
        assert_eq!(client.all_steps().unwrap(), Vec::new());
    }

    #[test]
    fn mismatched_reply_id_is_a_correlation_error() {
        let mut engine = ScriptedEngine::well_behaved();
        engine.skew_reply_id = true;
        let mut client = ProtocolClient::new(engine);
        let error = client.all_steps().unwrap_err();
        assert!(matches!(error, ProtocolError::Correlation { .. }));
    }

    #[test]
    fn wrong_reply_kind_is_rejected() {
        let mut engine = ScriptedEngine::well_behaved();
        engine.answer_with_kind = Some(MessageKind::GetStepValueResponse);
        let mut client = ProtocolClient::new(engine);
        let error = client.all_steps().unwrap_err();
        assert!(matches!(error, ProtocolError::UnexpectedKind { .. }));
    }

    #[test]
    fn transport_failure_surfaces_as_io_error() {
        let mut engine = ScriptedEngine::well_behaved();
        engine.fail_on_send = true;
        let mut client = ProtocolClient::new(engine);
        let error = client.step_value("any step").unwrap_err();
        assert!(matches!(error, ProtocolError::Io(_)));
    }
}
