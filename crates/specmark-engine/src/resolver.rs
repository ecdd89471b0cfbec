//! Step resolution against the engine catalog and a local implementation
//! index.
//!
//! Resolution answers one question for a canonical step text: is the step
//! bound to a project implementation, known to the engine catalog without a
//! binding, or unimplemented? The local index is consulted first since it
//! needs no round trip; the engine is only asked when no binding exists.

use std::path::PathBuf;

use tracing::debug;

use crate::client::ProtocolClient;
use crate::connection::Connection;
use crate::error::ResolveError;

/// Location of a step implementation within the project source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationHandle {
    /// Source file containing the implementation.
    pub source_path: PathBuf,
    /// One-based line of the implementing function.
    pub line: u32,
    /// Name of the implementing function.
    pub function: String,
}

/// Project-level lookup from step text to implementations.
///
/// A step is considered bound when a known implementation's source text
/// contains the canonical step text.
pub trait ImplementationIndex {
    /// The implementation whose source text contains `step_text`, if any.
    fn implementation_for(&self, step_text: &str) -> Option<ImplementationHandle>;
}

/// In-memory [`ImplementationIndex`] over scanned source entries.
#[derive(Debug, Default)]
pub struct InMemoryImplementationIndex {
    entries: Vec<(String, ImplementationHandle)>,
}

impl InMemoryImplementationIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `handle` implements steps whose text occurs in
    /// `source_text`.
    pub fn insert(&mut self, source_text: impl Into<String>, handle: ImplementationHandle) {
        self.entries.push((source_text.into(), handle));
    }
}

impl ImplementationIndex for InMemoryImplementationIndex {
    fn implementation_for(&self, step_text: &str) -> Option<ImplementationHandle> {
        self.entries
            .iter()
            .find(|(source, _)| source.contains(step_text))
            .map(|(_, handle)| handle.clone())
    }
}

/// Outcome of resolving canonical step text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResolution {
    /// The step is bound to a project implementation.
    KnownWithImplementation(ImplementationHandle),
    /// The engine catalog knows the step but no local binding exists.
    Known {
        /// Catalog display form with parameter placeholders spelled out.
        parameterized_value: String,
    },
    /// Neither the project nor the engine catalog knows the step.
    Unimplemented,
}

/// Resolves canonical step text against an implementation index and the
/// engine's step catalog.
///
/// Outcomes are derived fresh per call from a live round trip; nothing is
/// cached here. Callers that want caching layer it outside.
pub struct StepResolver<'index, C> {
    client: ProtocolClient<C>,
    index: &'index dyn ImplementationIndex,
}

impl<'index, C: Connection> StepResolver<'index, C> {
    /// Resolve over `connection`, consulting `index` for local bindings.
    #[must_use]
    pub fn new(connection: C, index: &'index dyn ImplementationIndex) -> Self {
        Self {
            client: ProtocolClient::new(connection),
            index,
        }
    }

    /// Resolve `canonical_text` into a [`StepResolution`].
    ///
    /// A catalog miss resolves to [`StepResolution::Unimplemented`]; an
    /// unreachable engine does not.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unavailable`] when the engine cannot be
    /// reached or answers out of protocol. Callers must not treat that as
    /// "unimplemented".
    pub fn resolve(&mut self, canonical_text: &str) -> Result<StepResolution, ResolveError> {
        if let Some(handle) = self.index.implementation_for(canonical_text) {
            debug!(step = canonical_text, "resolved to local implementation");
            return Ok(StepResolution::KnownWithImplementation(handle));
        }
        let step_value = self.client.step_value(canonical_text)?;
        let catalog = self.client.all_steps()?;
        Ok(catalog
            .into_iter()
            .find(|pair| pair.step_value == step_value)
            .map_or(StepResolution::Unimplemented, |pair| {
                StepResolution::Known {
                    parameterized_value: pair.parameterized_step_value,
                }
            }))
    }

    /// The catalog's parameterized display form for `canonical_text`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unavailable`] when the engine cannot be
    /// reached and [`ResolveError::StepValueNotFound`] when no catalog entry
    /// matches the normalized step value.
    pub fn parsed_step_value(&mut self, canonical_text: &str) -> Result<String, ResolveError> {
        let step_value = self.client.step_value(canonical_text)?;
        let catalog = self.client.all_steps()?;
        catalog
            .into_iter()
            .find(|pair| pair.step_value == step_value)
            .map(|pair| pair.parameterized_step_value)
            .ok_or_else(|| ResolveError::StepValueNotFound(step_value))
    }

    /// Every catalog entry's parameterized display form, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unavailable`] when the engine cannot be
    /// reached.
    pub fn all_parameterized_steps(&mut self) -> Result<Vec<String>, ResolveError> {
        let catalog = self.client.all_steps()?;
        Ok(catalog
            .into_iter()
            .map(|pair| pair.parameterized_step_value)
            .collect())
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests assert on resolutions they scripted"
)]
mod tests {
    use std::io;

    use rstest::rstest;

    use crate::messages::{
        AllStepsResponse, Envelope, MessageKind, StepValueDetail, StepValuePair,
        StepValueResponse,
    };

    use super::*;

    /// In-memory engine with a fixed catalog. Step values normalize to the
    /// request text unchanged, which keeps scripted catalogs readable.
    struct FakeEngine {
        catalog: Vec<StepValuePair>,
        unreachable: bool,
        last_request: Option<Envelope>,
    }

    impl FakeEngine {
        fn with_catalog(catalog: Vec<StepValuePair>) -> Self {
            Self {
                catalog,
                unreachable: false,
                last_request: None,
            }
        }

        fn unreachable() -> Self {
            let mut engine = Self::with_catalog(Vec::new());
            engine.unreachable = true;
            engine
        }
    }

    impl Connection for FakeEngine {
        fn send(&mut self, frame: &[u8]) -> io::Result<()> {
            if self.unreachable {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "engine not running",
                ));
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
                message_id: request.message_id,
                message_type: MessageKind::GetAllStepsResponse,
                all_steps_request: None,
                all_steps_response: None,
                step_value_request: None,
                step_value_response: None,
            };
            match request.message_type {
                MessageKind::GetStepValueRequest => {
                    let step_text = request
                        .step_value_request
                        .map(|payload| payload.step_text)
                        .unwrap_or_default();
                    reply.message_type = MessageKind::GetStepValueResponse;
                    reply.step_value_response = Some(StepValueResponse {
                        step_value: StepValueDetail {
                            step_value: step_text,
                        },
                    });
                }
                _ => {
                    reply.all_steps_response = Some(AllStepsResponse {
                        steps: self.catalog.clone(),
                    });
                }
            }
            serde_json::to_vec(&reply).map_err(io::Error::other)
        }
    }

    fn pair(step_value: &str, parameterized: &str) -> StepValuePair {
        StepValuePair {
            step_value: step_value.to_string(),
            parameterized_step_value: parameterized.to_string(),
        }
    }

    fn sample_handle() -> ImplementationHandle {
        ImplementationHandle {
            source_path: PathBuf::from("steps/login.rs"),
            line: 12,
            function: "log_in".to_string(),
        }
    }

    #[test]
    fn local_binding_wins_without_a_round_trip() {
        let mut index = InMemoryImplementationIndex::new();
        index.insert("fn log_in() covers Sign in as admin", sample_handle());
        let engine = FakeEngine::unreachable();
        let mut resolver = StepResolver::new(engine, &index);
        let resolution = resolver.resolve("Sign in as admin").unwrap();
        assert_eq!(
            resolution,
            StepResolution::KnownWithImplementation(sample_handle())
        );
    }

    #[rstest]
    #[case(
        &[("Sign in as admin", "Sign in as <role>"), ("Log out", "Log out")],
        Some("Sign in as <role>")
    )]
    #[case(&[("Log out", "Log out")], None)]
    fn catalog_membership_decides_known_or_unimplemented(
        #[case] catalog: &[(&str, &str)],
        #[case] display: Option<&str>,
    ) {
        let index = InMemoryImplementationIndex::new();
        let catalog = catalog
            .iter()
            .map(|(value, shown)| pair(value, shown))
            .collect();
        let mut resolver = StepResolver::new(FakeEngine::with_catalog(catalog), &index);
        let expected = display.map_or(StepResolution::Unimplemented, |shown| {
            StepResolution::Known {
                parameterized_value: shown.to_string(),
            }
        });
        assert_eq!(resolver.resolve("Sign in as admin").unwrap(), expected);
    }

    #[test]
    fn unreachable_engine_is_unavailable_not_unimplemented() {
        let index = InMemoryImplementationIndex::new();
        let mut resolver = StepResolver::new(FakeEngine::unreachable(), &index);
        let error = resolver.resolve("Sign in as admin").unwrap_err();
        assert!(matches!(error, ResolveError::Unavailable(_)));
    }

    #[test]
    fn parsed_step_value_errors_on_catalog_miss() {
        let index = InMemoryImplementationIndex::new();
        let engine = FakeEngine::with_catalog(vec![pair("Log out", "Log out")]);
        let mut resolver = StepResolver::new(engine, &index);
        let error = resolver.parsed_step_value("Sign in as admin").unwrap_err();
        assert!(matches!(error, ResolveError::StepValueNotFound(_)));
    }

    #[test]
    fn parsed_step_value_returns_display_form() {
        let index = InMemoryImplementationIndex::new();
        let engine = FakeEngine::with_catalog(vec![pair("Sign in as admin", "Sign in as <role>")]);
        let mut resolver = StepResolver::new(engine, &index);
        assert_eq!(
            resolver.parsed_step_value("Sign in as admin").unwrap(),
            "Sign in as <role>"
        );
    }

    #[test]
    fn all_parameterized_steps_lists_catalog_order() {
        let index = InMemoryImplementationIndex::new();
        let engine = FakeEngine::with_catalog(vec![
            pair("Log out", "Log out"),
            pair("Sign in as admin", "Sign in as <role>"),
        ]);
        let mut resolver = StepResolver::new(engine, &index);
        assert_eq!(
            resolver.all_parameterized_steps().unwrap(),
            ["Log out", "Sign in as <role>"]
        );
    }
}
