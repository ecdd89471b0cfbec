//! Helpers for rendering command output.
//!
//! Everything writes through a caller-supplied handle so the rendering can
//! be exercised against in-memory buffers. Identifiers and covered text are
//! written with `{:?}` because headings may span lines.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use eyre::{Context, Result};
use specmark_engine::StepResolution;
use specmark_runner::{RunReporter, TestCase, TestOutcome};
use specmark_syntax::Token;

pub(crate) fn write_tokens(writer: &mut dyn Write, tokens: &[Token], text: &str) -> Result<()> {
    for token in tokens {
        let covered = token.span.slice(text).unwrap_or_default();
        writeln!(
            writer,
            "{:?} {}..{} {covered:?}",
            token.kind,
            token.span.offset,
            token.span.end()
        )
        .wrap_err("failed to write token listing")?;
    }
    Ok(())
}

pub(crate) fn write_tokens_json(writer: &mut dyn Write, tokens: &[Token]) -> Result<()> {
    serde_json::to_writer(&mut *writer, tokens).wrap_err("failed to serialize tokens to JSON")?;
    writer
        .write_all(b"\n")
        .wrap_err("failed to terminate JSON output with newline")
}

pub(crate) fn write_cases(writer: &mut dyn Write, cases: &[TestCase]) -> Result<()> {
    for case in cases {
        writeln!(
            writer,
            "{:?} ({})",
            case.identifier,
            case.source_path.display()
        )
        .wrap_err_with(|| format!("failed to write case {}", case.identifier))?;
    }
    Ok(())
}

pub(crate) fn write_cases_json(writer: &mut dyn Write, cases: &[TestCase]) -> Result<()> {
    serde_json::to_writer(&mut *writer, cases).wrap_err("failed to serialize cases to JSON")?;
    writer
        .write_all(b"\n")
        .wrap_err("failed to terminate JSON output with newline")
}

pub(crate) fn write_resolution(
    writer: &mut dyn Write,
    step_text: &str,
    resolution: &StepResolution,
) -> Result<()> {
    writeln!(writer, "step: {step_text:?}").wrap_err("failed to write step text")?;
    let line = match resolution {
        StepResolution::KnownWithImplementation(handle) => format!(
            "implemented: {} ({}:{})",
            handle.function,
            handle.source_path.display(),
            handle.line
        ),
        StepResolution::Known {
            parameterized_value,
        } => format!("known: {parameterized_value}"),
        StepResolution::Unimplemented => "unimplemented".to_owned(),
    };
    writeln!(writer, "{line}").wrap_err("failed to write resolution outcome")
}

pub(crate) fn write_case_outcome(
    writer: &mut dyn Write,
    case: &TestCase,
    outcome: &TestOutcome,
) -> Result<()> {
    let line = match outcome {
        TestOutcome::Passed => format!("pass {:?}", case.identifier),
        TestOutcome::Failed {
            message: Some(message),
        } => format!("fail {:?} - {message}", case.identifier),
        TestOutcome::Failed { message: None } => format!("fail {:?}", case.identifier),
    };
    writeln!(writer, "{line}")
        .wrap_err_with(|| format!("failed to write outcome for {}", case.identifier))
}

pub(crate) fn write_run_summary(
    writer: &mut dyn Write,
    total: usize,
    finished: usize,
    failed: usize,
) -> Result<()> {
    let passed = finished.saturating_sub(failed);
    writeln!(writer, "{passed} passed, {failed} failed, {total} discovered")
        .wrap_err("failed to write run summary")
}

/// Streams one line per finished case to stdout and counts verdicts.
#[derive(Default)]
pub(crate) struct ConsoleReporter {
    finished: AtomicUsize,
    failed: AtomicUsize,
}

impl ConsoleReporter {
    pub(crate) fn finished(&self) -> usize {
        self.finished.load(Ordering::Relaxed)
    }

    pub(crate) fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

impl RunReporter for ConsoleReporter {
    fn case_finished(&self, case: &TestCase, outcome: &TestOutcome) {
        self.finished.fetch_add(1, Ordering::Relaxed);
        if matches!(outcome, TestOutcome::Failed { .. }) {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        // A stdout write failure must not abort the remaining cases.
        let mut stdout = io::stdout();
        let _ = write_case_outcome(&mut stdout, case, outcome);
        let _ = stdout.flush();
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests assert on buffers they rendered"
)]
mod tests {
    use specmark_engine::StepResolution;
    use specmark_runner::{RunReporter, TestCase, TestOutcome};
    use specmark_syntax::parse_document;

    use super::{
        ConsoleReporter, write_case_outcome, write_cases, write_cases_json, write_resolution,
        write_run_summary, write_tokens, write_tokens_json,
    };

    fn rendered(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn token_listing_shows_kind_span_and_text() {
        let text = "# Login\n";
        let tokens = parse_document(text);
        let mut buffer = Vec::new();

        write_tokens(&mut buffer, &tokens, text).unwrap();

        assert_eq!(rendered(buffer), "Specification 0..7 \"# Login\"\n");
    }

    #[test]
    fn token_json_uses_wire_casing() {
        let text = "* Sign in as <role>\n";
        let tokens = parse_document(text);
        let mut buffer = Vec::new();

        write_tokens_json(&mut buffer, &tokens).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let kinds: Vec<&str> = parsed
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|token| token.get("kind").and_then(serde_json::Value::as_str))
            .collect();
        assert_eq!(kinds, vec!["step", "dynamicParameter"]);
        let span = parsed.pointer("/0/span").unwrap();
        assert_eq!(span.get("offset"), Some(&serde_json::Value::from(0_u64)));
    }

    #[test]
    fn case_listing_quotes_identifiers() {
        let cases = vec![TestCase::new("# Login", "## Valid password", "login.spec")];
        let mut buffer = Vec::new();

        write_cases(&mut buffer, &cases).unwrap();

        assert_eq!(
            rendered(buffer),
            "\"# Login.## Valid password\" (login.spec)\n"
        );
    }

    #[test]
    fn case_json_uses_camel_case_fields() {
        let cases = vec![TestCase::new("# Login", "## Valid password", "login.spec")];
        let mut buffer = Vec::new();

        write_cases_json(&mut buffer, &cases).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let entry = parsed.as_array().and_then(|array| array.first()).unwrap();
        assert_eq!(
            entry.get("identifier"),
            Some(&serde_json::Value::String("# Login.## Valid password".into()))
        );
        assert_eq!(
            entry.get("sourcePath"),
            Some(&serde_json::Value::String("login.spec".into()))
        );
        assert_eq!(
            entry.get("displayName"),
            Some(&serde_json::Value::String("## Valid password".into()))
        );
    }

    #[test]
    fn resolution_outcomes_render_distinctly() {
        let mut known = Vec::new();
        write_resolution(
            &mut known,
            "Sign in as <role>",
            &StepResolution::Known {
                parameterized_value: "Sign in as <role>".to_owned(),
            },
        )
        .unwrap();
        assert_eq!(
            rendered(known),
            "step: \"Sign in as <role>\"\nknown: Sign in as <role>\n"
        );

        let mut unimplemented = Vec::new();
        write_resolution(&mut unimplemented, "Missing", &StepResolution::Unimplemented).unwrap();
        assert!(rendered(unimplemented).ends_with("unimplemented\n"));
    }

    #[test]
    fn outcome_lines_carry_failure_messages() {
        let case = TestCase::new("# Spec", "## First", "spec.spec");
        let mut buffer = Vec::new();

        write_case_outcome(
            &mut buffer,
            &case,
            &TestOutcome::Failed {
                message: Some("assertion failed".to_owned()),
            },
        )
        .unwrap();

        assert_eq!(
            rendered(buffer),
            "fail \"# Spec.## First\" - assertion failed\n"
        );
    }

    #[test]
    fn summary_counts_add_up() {
        let mut buffer = Vec::new();
        write_run_summary(&mut buffer, 5, 4, 1).unwrap();
        assert_eq!(rendered(buffer), "3 passed, 1 failed, 5 discovered\n");
    }

    #[test]
    fn reporter_counts_finished_and_failed() {
        let reporter = ConsoleReporter::default();
        let case = TestCase::new("# Spec", "## First", "spec.spec");

        reporter.case_finished(&case, &TestOutcome::Passed);
        reporter.case_finished(&case, &TestOutcome::Failed { message: None });

        assert_eq!(reporter.finished(), 2);
        assert_eq!(reporter.failed(), 1);
    }
}
