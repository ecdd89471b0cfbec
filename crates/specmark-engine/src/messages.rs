//! Typed protocol messages exchanged with the engine process.
//!
//! Every frame on the wire is one [`Envelope`]: a message id, a message
//! type, and exactly one payload field matching that type. Responses are
//! correlated with their request by id and type, so ids must be unique per
//! outstanding request on a connection; [`next_message_id`] derives them
//! from wall-clock milliseconds and keeps them strictly increasing even
//! when the clock stalls or steps backwards.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Discriminates the payload carried by an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Request for the full step catalog.
    GetAllStepsRequest,
    /// Response carrying the full step catalog.
    GetAllStepsResponse,
    /// Request to normalize one step's text into its step value.
    GetStepValueRequest,
    /// Response carrying the normalized step value.
    GetStepValueResponse,
}

/// One normalized step from the engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValuePair {
    /// The matching key: step text with parameters normalized away.
    pub step_value: String,
    /// The display form with parameter placeholders spelled out.
    pub parameterized_step_value: String,
}

/// Payload of a [`MessageKind::GetAllStepsRequest`]. Carries no fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllStepsRequest {}

/// Payload of a [`MessageKind::GetAllStepsResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllStepsResponse {
    /// Every step the engine currently knows.
    pub steps: Vec<StepValuePair>,
}

/// Payload of a [`MessageKind::GetStepValueRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValueRequest {
    /// Canonical step text to normalize.
    pub step_text: String,
}

/// Payload of a [`MessageKind::GetStepValueResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValueResponse {
    /// The engine's normalized view of the requested step.
    pub step_value: StepValueDetail,
}

/// Normalized step value nested inside a [`StepValueResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValueDetail {
    /// The matching key for catalog lookups.
    pub step_value: String,
}

/// One protocol frame: id, type, and exactly one payload.
///
/// Serialization omits the absent payload fields, so the wire form carries
/// only the payload matching `message_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Unique id per outstanding request on a connection.
    pub message_id: i64,
    /// Which payload field is populated.
    pub message_type: MessageKind,
    /// Populated for [`MessageKind::GetAllStepsRequest`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_steps_request: Option<AllStepsRequest>,
    /// Populated for [`MessageKind::GetAllStepsResponse`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_steps_response: Option<AllStepsResponse>,
    /// Populated for [`MessageKind::GetStepValueRequest`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_value_request: Option<StepValueRequest>,
    /// Populated for [`MessageKind::GetStepValueResponse`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_value_response: Option<StepValueResponse>,
}

impl Envelope {
    fn bare(message_id: i64, message_type: MessageKind) -> Self {
        Self {
            message_id,
            message_type,
            all_steps_request: None,
            all_steps_response: None,
            step_value_request: None,
            step_value_response: None,
        }
    }

    /// Build a catalog request with a fresh message id.
    #[must_use]
    pub fn all_steps_request() -> Self {
        let mut envelope = Self::bare(next_message_id(), MessageKind::GetAllStepsRequest);
        envelope.all_steps_request = Some(AllStepsRequest {});
        envelope
    }

    /// Build a step-value request for `step_text` with a fresh message id.
    #[must_use]
    pub fn step_value_request(step_text: impl Into<String>) -> Self {
        let mut envelope = Self::bare(next_message_id(), MessageKind::GetStepValueRequest);
        envelope.step_value_request = Some(StepValueRequest {
            step_text: step_text.into(),
        });
        envelope
    }

    /// Extract the step catalog from a [`MessageKind::GetAllStepsResponse`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedKind`] when the envelope declares a
    /// different type and [`ProtocolError::MissingPayload`] when the declared
    /// payload is absent.
    pub fn into_all_steps(self) -> Result<Vec<StepValuePair>, ProtocolError> {
        if self.message_type != MessageKind::GetAllStepsResponse {
            return Err(ProtocolError::UnexpectedKind {
                expected: MessageKind::GetAllStepsResponse,
                received: self.message_type,
            });
        }
        self.all_steps_response
            .map(|payload| payload.steps)
            .ok_or(ProtocolError::MissingPayload(
                MessageKind::GetAllStepsResponse,
            ))
    }

    /// Extract the normalized step value from a
    /// [`MessageKind::GetStepValueResponse`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedKind`] when the envelope declares a
    /// different type and [`ProtocolError::MissingPayload`] when the declared
    /// payload is absent.
    pub fn into_step_value(self) -> Result<String, ProtocolError> {
        if self.message_type != MessageKind::GetStepValueResponse {
            return Err(ProtocolError::UnexpectedKind {
                expected: MessageKind::GetStepValueResponse,
                received: self.message_type,
            });
        }
        self.step_value_response
            .map(|payload| payload.step_value.step_value)
            .ok_or(ProtocolError::MissingPayload(
                MessageKind::GetStepValueResponse,
            ))
    }
}

static LAST_MESSAGE_ID: AtomicI64 = AtomicI64::new(0);

/// Next request id: wall-clock milliseconds since the epoch, bumped past the
/// previously issued id so concurrent or rapid calls never repeat.
#[must_use]
pub fn next_message_id() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| {
        i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
    });
    match LAST_MESSAGE_ID.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |prev| {
        Some(now.max(prev.saturating_add(1)))
    }) {
        Ok(prev) | Err(prev) => now.max(prev.saturating_add(1)),
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests assert on payloads they constructed"
)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn request_wire_form_carries_exactly_one_payload() {
        let envelope = Envelope::step_value_request("Click \"Submit\"");
        let wire: Value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire.get("messageType").unwrap(), "GetStepValueRequest");
        assert_eq!(
            wire.get("stepValueRequest").unwrap().get("stepText").unwrap(),
            "Click \"Submit\"",
        );
        assert!(wire.get("allStepsRequest").is_none());
        assert!(wire.get("allStepsResponse").is_none());
        assert!(wire.get("stepValueResponse").is_none());
    }

    #[test]
    fn catalog_response_deserializes_from_wire_form() {
        let wire = json!({
            "messageId": 42,
            "messageType": "GetAllStepsResponse",
            "allStepsResponse": {
                "steps": [
                    {"stepValue": "say {} to {}", "parameterizedStepValue": "say <greeting> to <name>"},
                ],
            },
        });
        let envelope: Envelope = serde_json::from_value(wire).unwrap();
        let steps = envelope.into_all_steps().unwrap();
        assert_eq!(
            steps,
            [StepValuePair {
                step_value: "say {} to {}".to_string(),
                parameterized_step_value: "say <greeting> to <name>".to_string(),
            }],
        );
    }

    #[test]
    fn step_value_extraction_rejects_other_kinds() {
        let envelope = Envelope::all_steps_request();
        let error = envelope.into_step_value().unwrap_err();
        assert!(matches!(error, ProtocolError::UnexpectedKind { .. }));
    }

    #[test]
    fn declared_payload_must_be_present() {
        let wire = json!({
            "messageId": 7,
            "messageType": "GetAllStepsResponse",
        });
        let envelope: Envelope = serde_json::from_value(wire).unwrap();
        let error = envelope.into_all_steps().unwrap_err();
        assert!(matches!(error, ProtocolError::MissingPayload(_)));
    }

    #[test]
    fn message_ids_strictly_increase() {
        let first = next_message_id();
        let second = next_message_id();
        let third = next_message_id();
        assert!(first < second);
        assert!(second < third);
    }
}
