//! Test-case discovery and sequential execution for specification
//! documents.
//!
//! Discovery fans out across document paths, derives one [`TestCase`] per
//! scenario heading, and can stream cases to a [`DiscoverySink`] as they are
//! found. Execution hands the discovered cases to an [`ExecutionSequencer`],
//! which runs them strictly one at a time through a [`CaseRunner`]
//! collaborator and honours cancellation at case boundaries. The bundled
//! [`ProcessRunner`] spawns a configured command per case and maps its exit
//! status to a [`TestOutcome`].

pub mod case;
pub mod discovery;
pub mod execution;
pub mod process;

pub use case::TestCase;
pub use discovery::{DiscoverySink, discover, find_specification_files, is_specification_file};
pub use execution::{CaseRunner, ExecutionSequencer, RunReporter, TestOutcome};
pub use process::{DEBUG_ENV_VAR, ProcessRunner};
