//! Canonical step text derivation.
//!
//! A step line is normalized before resolution: markup stars become spaces,
//! surrounding whitespace is trimmed, and a trailing table parameter is
//! signalled with a literal ` <table>` suffix when the next non-blank line
//! is a table row.

use std::sync::LazyLock;

use regex::Regex;

static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ ]*\|[\w ]+\|").unwrap_or_else(|_| unreachable!()));

/// Whether `line` looks like a table row (`| cell |` with word or space
/// characters between pipes).
#[must_use]
pub fn is_table_row(line: &str) -> bool {
    TABLE_ROW.is_match(line)
}

/// Normalize one step line into the canonical text used as a resolution key.
///
/// Every `*` is replaced with a space and the result trimmed. When
/// `next_non_blank_line` is a table row, the literal suffix ` <table>` is
/// appended so the engine resolves the step with its trailing table
/// parameter.
///
/// # Examples
///
/// ```
/// use specmark_syntax::canonical_step_text;
///
/// assert_eq!(
///     canonical_step_text("* Click \"Submit\"", None),
///     "Click \"Submit\"",
/// );
/// assert_eq!(
///     canonical_step_text("* Import users", Some("| name | role |")),
///     "Import users <table>",
/// );
/// ```
#[must_use]
pub fn canonical_step_text(line: &str, next_non_blank_line: Option<&str>) -> String {
    let unstarred = line.replace('*', " ");
    let mut text = unstarred.trim().to_owned();
    if next_non_blank_line.is_some_and(is_table_row) {
        text.push_str(" <table>");
    }
    text
}

/// Canonical step text for the line at `line_index` within `document`.
///
/// Performs the table lookahead itself: lines after `line_index` are walked
/// until the first non-blank one, so blank lines between a step and its
/// table do not hide the table. The walk stops at the end of the document,
/// which counts as "no table". Returns `None` when `line_index` is past the
/// last line.
#[must_use]
pub fn canonical_step_text_at(document: &str, line_index: usize) -> Option<String> {
    let mut lines = document.lines();
    let line = lines.by_ref().nth(line_index)?;
    let next = lines.find(|candidate| !candidate.trim().is_empty());
    Some(canonical_step_text(line, next))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("| a | b |", true)]
    #[case("  | cell |", true)]
    #[case("|--|--|", false)]
    #[case("plain text", false)]
    fn table_rows_need_word_cells(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(is_table_row(line), expected);
    }

    #[rstest]
    #[case("* Click \"Submit\"", None, "Click \"Submit\"")]
    #[case("** nested step", None, "nested step")]
    #[case("  * padded  ", None, "padded")]
    #[case("* Import users", Some("| name | role |"), "Import users <table>")]
    #[case("* Import users", Some("not a table"), "Import users")]
    fn step_lines_normalize(
        #[case] line: &str,
        #[case] next: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(canonical_step_text(line, next), expected);
    }

    #[test]
    fn lookahead_skips_blank_lines() {
        let document = "# Spec\n* Import users\n\n   \n| name |\n";
        assert_eq!(
            canonical_step_text_at(document, 1).as_deref(),
            Some("Import users <table>"),
        );
    }

    #[test]
    fn lookahead_stops_at_document_end() {
        let document = "* trailing step\n\n\n";
        assert_eq!(
            canonical_step_text_at(document, 0).as_deref(),
            Some("trailing step"),
        );
    }

    #[test]
    fn next_non_blank_line_must_be_the_table() {
        let document = "* step\nnarrative\n| a |\n";
        assert_eq!(canonical_step_text_at(document, 0).as_deref(), Some("step"));
    }

    #[test]
    fn out_of_bounds_line_is_none() {
        assert_eq!(canonical_step_text_at("* only\n", 3), None);
    }
}
