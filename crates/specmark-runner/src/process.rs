//! Default runner collaborator that spawns an engine command per case.

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::case::TestCase;
use crate::execution::{CaseRunner, RunReporter, TestOutcome};

/// Environment variable carrying debug-attach intent to the spawned command.
pub const DEBUG_ENV_VAR: &str = "SPECMARK_DEBUG";

/// Trailing stderr lines kept as the failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Runs each case by spawning a configured command.
///
/// The command line is the program, its fixed arguments, then the case's
/// source path and display name. Exit status maps to the outcome; the tail
/// of stderr becomes the failure message. A command that cannot be launched
/// reports a failure rather than panicking.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessRunner {
    /// Create a runner that spawns `program` once per case.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Fixed arguments placed before the per-case ones.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl CaseRunner for ProcessRunner {
    fn run_case(&self, case: &TestCase, debugging: bool, reporter: &dyn RunReporter) {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&case.source_path)
            .arg(&case.display_name);
        if debugging {
            command.env(DEBUG_ENV_VAR, "true");
        }
        debug!(
            identifier = %case.identifier,
            program = %self.program.display(),
            "spawning case runner"
        );
        let outcome = match command.output() {
            Ok(output) if output.status.success() => TestOutcome::Passed,
            Ok(output) => TestOutcome::Failed {
                message: stderr_tail(&output.stderr),
            },
            Err(error) => TestOutcome::Failed {
                message: Some(format!(
                    "failed to launch {}: {error}",
                    self.program.display()
                )),
            },
        };
        info!(
            identifier = %case.identifier,
            passed = matches!(outcome, TestOutcome::Passed),
            "case finished"
        );
        reporter.case_finished(case, &outcome);
    }
}

/// Last lines of a failed command's stderr, or `None` when it was empty.
fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    Some(lines.get(start..).unwrap_or_default().join("\n"))
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests assert on reporter state they populated"
)]
mod tests {
    use std::sync::Mutex;

    use super::{ProcessRunner, stderr_tail};
    use crate::case::TestCase;
    use crate::execution::{CaseRunner, RunReporter, TestOutcome};

    #[derive(Default)]
    struct CapturingReporter {
        outcomes: Mutex<Vec<TestOutcome>>,
    }

    impl RunReporter for CapturingReporter {
        fn case_finished(&self, _case: &TestCase, outcome: &TestOutcome) {
            self.outcomes.lock().unwrap().push(outcome.clone());
        }
    }

    #[test]
    fn empty_stderr_yields_no_message() {
        assert_eq!(stderr_tail(b""), None);
        assert_eq!(stderr_tail(b"  \n \n"), None);
    }

    #[test]
    fn short_stderr_is_kept_whole() {
        assert_eq!(
            stderr_tail(b"first\nsecond\n"),
            Some("first\nsecond".to_owned())
        );
    }

    #[test]
    fn long_stderr_keeps_only_the_tail() {
        let noisy = (0..40).map(|n| format!("line {n}\n")).collect::<String>();
        let tail = stderr_tail(noisy.as_bytes()).unwrap();
        assert!(tail.starts_with("line 20"));
        assert!(tail.ends_with("line 39"));
    }

    #[cfg(unix)]
    #[test]
    fn appends_source_path_and_display_name_to_the_command() {
        let runner = ProcessRunner::new("sh").with_args([
            "-c",
            r###"test "$1" = spec.spec && test "$2" = "## First""###,
            "argv0",
        ]);
        let reporter = CapturingReporter::default();
        let case = TestCase::new("# Spec", "## First", "spec.spec");

        runner.run_case(&case, false, &reporter);

        assert_eq!(
            reporter.outcomes.lock().unwrap().first(),
            Some(&TestOutcome::Passed)
        );
    }

    #[test]
    fn unlaunchable_program_reports_failure() {
        let runner = ProcessRunner::new("/nonexistent/specmark-engine-fixture");
        let reporter = CapturingReporter::default();
        let case = TestCase::new("# Spec", "## First", "spec.spec");

        runner.run_case(&case, false, &reporter);

        let outcomes = reporter.outcomes.lock().unwrap();
        match outcomes.first().unwrap() {
            TestOutcome::Failed { message } => {
                let message = message.as_deref().unwrap();
                assert!(message.contains("failed to launch"));
            }
            TestOutcome::Passed => panic!("launch failure must not pass"),
        }
    }
}
