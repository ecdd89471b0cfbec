//! Strictly sequential execution of test cases with cooperative
//! cancellation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::case::TestCase;
use crate::discovery::discover;

/// Verdict for one executed test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// The runner reported success.
    Passed,
    /// The runner reported failure.
    Failed {
        /// Diagnostic output captured from the runner, when any.
        message: Option<String>,
    },
}

/// Receives one verdict per executed case.
pub trait RunReporter {
    /// Called exactly once per case handed to the runner.
    fn case_finished(&self, case: &TestCase, outcome: &TestOutcome);
}

/// Executes a single case and reports its verdict.
///
/// Implementations must report exactly one outcome per invocation, through
/// the supplied reporter, and must not panic on runner failure.
pub trait CaseRunner {
    /// Run `case`, forwarding debug-attach intent via `debugging`.
    fn run_case(&self, case: &TestCase, debugging: bool, reporter: &dyn RunReporter);
}

/// Runs test cases one at a time in input order.
///
/// Cancellation is cooperative: [`cancel`](Self::cancel) may be called from
/// any thread and is observed at the next case boundary. A started case is
/// never interrupted. The pending request is consumed by the run that
/// observes it, so a cancellation issued while no run is in flight stops the
/// next run before its first case.
#[derive(Debug, Default)]
pub struct ExecutionSequencer {
    cancelled: AtomicBool,
}

impl ExecutionSequencer {
    /// Create a sequencer with no cancellation pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the current (or next) run stops at its next case
    /// boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Run `cases` strictly one at a time, checking for cancellation before
    /// each case, the first included. Cases skipped by cancellation are
    /// never reported.
    pub fn run(
        &self,
        cases: &[TestCase],
        debugging: bool,
        runner: &dyn CaseRunner,
        reporter: &dyn RunReporter,
    ) {
        for case in cases {
            if self.cancelled.load(Ordering::SeqCst) {
                debug!(identifier = %case.identifier, "cancellation observed, stopping run");
                break;
            }
            runner.run_case(case, debugging, reporter);
        }
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Discover cases under `paths`, then run them.
    ///
    /// The discovery half runs without a sink; the run half behaves exactly
    /// like [`run`](Self::run).
    pub fn run_paths(
        &self,
        paths: &[PathBuf],
        debugging: bool,
        runner: &dyn CaseRunner,
        reporter: &dyn RunReporter,
    ) {
        let cases = discover(paths, None);
        self.run(&cases, debugging, runner, reporter);
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests assert on reporter state they populated"
)]
mod tests {
    use std::sync::Mutex;

    use super::{CaseRunner, ExecutionSequencer, RunReporter, TestOutcome};
    use crate::case::TestCase;

    #[derive(Default)]
    struct RecordingReporter {
        finished: Mutex<Vec<(String, TestOutcome)>>,
    }

    impl RecordingReporter {
        fn identifiers(&self) -> Vec<String> {
            self.finished
                .lock()
                .unwrap()
                .iter()
                .map(|(identifier, _)| identifier.clone())
                .collect()
        }
    }

    impl RunReporter for RecordingReporter {
        fn case_finished(&self, case: &TestCase, outcome: &TestOutcome) {
            self.finished
                .lock()
                .unwrap()
                .push((case.identifier.clone(), outcome.clone()));
        }
    }

    struct PassingRunner;

    impl CaseRunner for PassingRunner {
        fn run_case(&self, case: &TestCase, _debugging: bool, reporter: &dyn RunReporter) {
            reporter.case_finished(case, &TestOutcome::Passed);
        }
    }

    /// Cancels its own sequencer while the first case is still executing.
    struct CancellingRunner<'sequencer> {
        sequencer: &'sequencer ExecutionSequencer,
    }

    impl CaseRunner for CancellingRunner<'_> {
        fn run_case(&self, case: &TestCase, _debugging: bool, reporter: &dyn RunReporter) {
            self.sequencer.cancel();
            reporter.case_finished(case, &TestOutcome::Passed);
        }
    }

    struct DebugAssertingRunner {
        expected: bool,
    }

    impl CaseRunner for DebugAssertingRunner {
        fn run_case(&self, case: &TestCase, debugging: bool, reporter: &dyn RunReporter) {
            assert_eq!(debugging, self.expected);
            reporter.case_finished(case, &TestOutcome::Passed);
        }
    }

    fn cases(names: &[&str]) -> Vec<TestCase> {
        names
            .iter()
            .map(|name| TestCase::new("# Spec", name, "spec.spec"))
            .collect()
    }

    #[test]
    fn runs_every_case_in_order() {
        let sequencer = ExecutionSequencer::new();
        let reporter = RecordingReporter::default();

        sequencer.run(&cases(&["## a", "## b", "## c"]), false, &PassingRunner, &reporter);

        assert_eq!(
            reporter.identifiers(),
            vec!["# Spec.## a", "# Spec.## b", "# Spec.## c"]
        );
    }

    #[test]
    fn cancellation_before_the_run_executes_zero_cases() {
        let sequencer = ExecutionSequencer::new();
        let reporter = RecordingReporter::default();

        sequencer.cancel();
        sequencer.run(&cases(&["## a", "## b"]), false, &PassingRunner, &reporter);

        assert!(reporter.identifiers().is_empty());
    }

    #[test]
    fn cancellation_during_the_first_case_executes_exactly_one() {
        let sequencer = ExecutionSequencer::new();
        let reporter = RecordingReporter::default();
        let runner = CancellingRunner {
            sequencer: &sequencer,
        };

        sequencer.run(&cases(&["## a", "## b", "## c"]), false, &runner, &reporter);

        assert_eq!(reporter.identifiers(), vec!["# Spec.## a"]);
    }

    #[test]
    fn a_cancelled_run_consumes_the_request() {
        let sequencer = ExecutionSequencer::new();
        let reporter = RecordingReporter::default();

        sequencer.cancel();
        sequencer.run(&cases(&["## a"]), false, &PassingRunner, &reporter);
        sequencer.run(&cases(&["## a"]), false, &PassingRunner, &reporter);

        assert_eq!(reporter.identifiers(), vec!["# Spec.## a"]);
    }

    #[test]
    fn forwards_debug_intent_to_the_runner() {
        let sequencer = ExecutionSequencer::new();
        let reporter = RecordingReporter::default();

        sequencer.run(
            &cases(&["## a"]),
            true,
            &DebugAssertingRunner { expected: true },
            &reporter,
        );

        assert_eq!(reporter.identifiers().len(), 1);
    }
}
