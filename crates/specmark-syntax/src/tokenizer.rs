//! Regex-pass classification of specification documents.
//!
//! The scanner applies four independent passes over the same text rather
//! than one combined grammar, keeping each heading/step/tag rule orthogonal
//! and testable in isolation. The cost is that output is grouped by pass,
//! not by document position; [`parse_document_ordered`] provides the sorted
//! view for positional consumers.

use std::sync::LazyLock;

use regex::Regex;

use crate::span::Span;
use crate::token::{Token, TokenKind};

static SPECIFICATION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(#.*)$").unwrap_or_else(|_| unreachable!()));

static SPECIFICATION_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+[\n\r]=+").unwrap_or_else(|_| unreachable!()));

static SCENARIO_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(##.*)$").unwrap_or_else(|_| unreachable!()));

static SCENARIO_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+[\n\r]-+").unwrap_or_else(|_| unreachable!()));

static STEP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[ ]*\*(?:[\w ]*(?:"[\w ]+")*(?:<[\w ]+>)*)*"#).unwrap_or_else(|_| unreachable!())
});

static STATIC_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[\w ]+""#).unwrap_or_else(|_| unreachable!()));

static DYNAMIC_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[\w ]+>").unwrap_or_else(|_| unreachable!()));

static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ ]*tags[ ]*:[ ]*([\w ]+(?:,[\w ]+)*)").unwrap_or_else(|_| unreachable!())
});

/// Scan a document and classify every recognized span.
///
/// Empty or whitespace-only input yields an empty vector. Repeated calls on
/// unchanged input yield identical sequences.
///
/// Tokens are returned grouped by scanning pass: all `Specification`
/// headings, then all `Scenario` headings, then each `Step` followed by its
/// `StaticParameter` and `DynamicParameter` tokens, then each `Tag` followed
/// by its `TagValue` tokens. Consumers that need document order must re-sort
/// by span offset (or call [`parse_document_ordered`]).
///
/// A `##` heading line also satisfies the specification-heading pattern, so
/// such a line yields both a `Specification` and a `Scenario` token;
/// consumers disambiguate by preferring the more specific kind.
#[must_use]
pub fn parse_document(text: &str) -> Vec<Token> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut tokens = Vec::new();
    collect_headings(
        text,
        &SPECIFICATION_HEADING,
        &SPECIFICATION_UNDERLINE,
        TokenKind::Specification,
        &mut tokens,
    );
    collect_headings(
        text,
        &SCENARIO_HEADING,
        &SCENARIO_UNDERLINE,
        TokenKind::Scenario,
        &mut tokens,
    );
    collect_steps(text, &mut tokens);
    collect_tags(text, &mut tokens);
    tokens
}

/// Scan a document and return its tokens sorted by span offset.
///
/// Convenience over [`parse_document`] for positional consumers. The sort is
/// stable, so tokens sharing an offset keep their pass order.
#[must_use]
pub fn parse_document_ordered(text: &str) -> Vec<Token> {
    let mut tokens = parse_document(text);
    tokens.sort_by_key(|token| token.span.offset);
    tokens
}

/// The raw matched text of the document's first specification heading.
///
/// The `#` heading form is tried first, then the `=`-underlined form.
/// Returns `None` when the document has no specification heading.
#[must_use]
pub fn specification_name(text: &str) -> Option<&str> {
    SPECIFICATION_HEADING
        .find(text)
        .or_else(|| SPECIFICATION_UNDERLINE.find(text))
        .map(|found| found.as_str())
}

/// All scenario headings in the document, each as its raw matched text.
///
/// Yields every `##` heading in document order, then every `-`-underlined
/// heading in document order. The iterator is lazy and finite; calling the
/// function again restarts the scan.
pub fn scenario_headings(text: &str) -> impl Iterator<Item = &str> {
    SCENARIO_HEADING
        .find_iter(text)
        .chain(SCENARIO_UNDERLINE.find_iter(text))
        .map(|found| found.as_str())
}

/// Whether any heading in the document uses the two-line underlined form.
///
/// Callers use this to decide whether a paragraph-level region needs
/// multi-line handling before re-scanning it.
#[must_use]
pub fn contains_multiline_heading(text: &str) -> bool {
    SPECIFICATION_UNDERLINE.is_match(text) || SCENARIO_UNDERLINE.is_match(text)
}

fn collect_headings(
    text: &str,
    heading: &Regex,
    underline: &Regex,
    kind: TokenKind,
    tokens: &mut Vec<Token>,
) {
    for found in heading.find_iter(text) {
        tokens.push(Token::new(kind, Span::new(found.start(), found.len())));
    }
    for found in underline.find_iter(text) {
        tokens.push(Token::new(kind, Span::new(found.start(), found.len())));
    }
}

fn collect_steps(text: &str, tokens: &mut Vec<Token>) {
    for step in STEP_LINE.find_iter(text) {
        tokens.push(Token::new(
            TokenKind::Step,
            Span::new(step.start(), step.len()),
        ));
        // The step pattern admits quotes and angle brackets only as
        // parameter delimiters, so scanning the matched text directly
        // recovers exactly the parameter captures.
        for param in STATIC_PARAMETER.find_iter(step.as_str()) {
            tokens.push(Token::new(
                TokenKind::StaticParameter,
                Span::new(step.start() + param.start(), param.len()),
            ));
        }
        for param in DYNAMIC_PARAMETER.find_iter(step.as_str()) {
            tokens.push(Token::new(
                TokenKind::DynamicParameter,
                Span::new(step.start() + param.start(), param.len()),
            ));
        }
    }
}

fn collect_tags(text: &str, tokens: &mut Vec<Token>) {
    for caps in TAG_LINE.captures_iter(text) {
        let Some(line) = caps.get(0) else { continue };
        tokens.push(Token::new(
            TokenKind::Tag,
            Span::new(line.start(), line.len()),
        ));
        let Some(values) = caps.get(1) else { continue };
        let mut cursor = values.start();
        for segment in values.as_str().split(',') {
            let trimmed = segment.trim();
            if !trimmed.is_empty() {
                let lead = segment.len() - segment.trim_start().len();
                tokens.push(Token::new(
                    TokenKind::TagValue,
                    Span::new(cursor + lead, trimmed.len()),
                ));
            }
            cursor += segment.len() + 1;
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    reason = "tests assert on spans and tokens they created"
)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn covered<'a>(text: &'a str, token: &Token) -> &'a str {
        token.span.slice(text).unwrap()
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|token| token.kind).collect()
    }

    #[rstest]
    #[case("")]
    #[case("   \n\t\n  ")]
    fn blank_documents_yield_no_tokens(#[case] text: &str) {
        assert!(parse_document(text).is_empty());
    }

    #[test]
    fn repeated_scans_are_identical() {
        let text = "# Spec\n## Scenario\n* step \"a\" <b>\ntags: t\n";
        assert_eq!(parse_document(text), parse_document(text));
    }

    #[test]
    fn spans_stay_within_the_document() {
        let text = "Title\n=====\n## S\n* do \"x\"\ntags: a, b\n";
        for token in parse_document(text) {
            assert!(token.span.end() <= text.len());
        }
    }

    #[rstest]
    #[case("# Title\nbody", Some("# Title"))]
    #[case("Title\n=====\nbody", Some("Title\n====="))]
    #[case("no heading here", None)]
    fn specification_name_prefers_hash_form(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(specification_name(text), expected);
    }

    #[test]
    fn hash_form_wins_over_underline_form() {
        let text = "Underlined\n====\n# Hashed\n";
        assert_eq!(specification_name(text), Some("# Hashed"));
    }

    #[test]
    fn scenario_headings_in_document_order() {
        let text = "## First\nbody\n## Second\nbody\n";
        let headings: Vec<_> = scenario_headings(text).collect();
        assert_eq!(headings, ["## First", "## Second"]);
    }

    #[test]
    fn underlined_scenarios_follow_hash_scenarios() {
        let text = "Late\n----\n## Early\n";
        let headings: Vec<_> = scenario_headings(text).collect();
        assert_eq!(headings, ["## Early", "Late\n----"]);
    }

    #[test]
    fn scenario_headings_restart_on_each_call() {
        let text = "## Only\n";
        assert_eq!(scenario_headings(text).count(), 1);
        assert_eq!(scenario_headings(text).count(), 1);
    }

    #[rstest]
    #[case("Title\n=====\n", true)]
    #[case("Scenario\n---\n", true)]
    #[case("# Title\n## Scenario\n", false)]
    fn multiline_headings_are_detected(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(contains_multiline_heading(text), expected);
    }

    #[test]
    fn double_hash_lines_classify_as_both_heading_kinds() {
        let tokens = parse_document("## Both\n");
        assert_eq!(
            kinds(&tokens),
            [TokenKind::Specification, TokenKind::Scenario]
        );
        assert_eq!(covered("## Both\n", &tokens[0]), "## Both");
        assert_eq!(covered("## Both\n", &tokens[1]), "## Both");
    }

    #[test]
    fn step_parameters_get_their_own_spans() {
        let text = "* Click <button> \"Submit\"";
        let tokens = parse_document(text);
        assert_eq!(
            kinds(&tokens),
            [
                TokenKind::Step,
                TokenKind::StaticParameter,
                TokenKind::DynamicParameter,
            ]
        );
        assert_eq!(covered(text, &tokens[0]), text);
        assert_eq!(covered(text, &tokens[1]), "\"Submit\"");
        assert_eq!(covered(text, &tokens[2]), "<button>");
    }

    #[test]
    fn step_with_repeated_parameters_emits_one_token_each() {
        let text = "* move \"a\" to \"b\" via <x> and <y>\n";
        let tokens = parse_document(text);
        let statics: Vec<_> = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::StaticParameter)
            .map(|token| covered(text, token))
            .collect();
        let dynamics: Vec<_> = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::DynamicParameter)
            .map(|token| covered(text, token))
            .collect();
        assert_eq!(statics, ["\"a\"", "\"b\""]);
        assert_eq!(dynamics, ["<x>", "<y>"]);
    }

    #[test]
    fn indented_steps_keep_their_leading_spaces() {
        let text = "  * trimmed later\n";
        let tokens = parse_document(text);
        assert_eq!(tokens[0].kind, TokenKind::Step);
        assert_eq!(covered(text, &tokens[0]), "  * trimmed later");
    }

    #[test]
    fn tag_values_are_trimmed() {
        let text = "tags: smoke, regression\n";
        let tokens = parse_document(text);
        assert_eq!(
            kinds(&tokens),
            [TokenKind::Tag, TokenKind::TagValue, TokenKind::TagValue]
        );
        assert_eq!(covered(text, &tokens[0]), "tags: smoke, regression");
        assert_eq!(covered(text, &tokens[1]), "smoke");
        assert_eq!(covered(text, &tokens[2]), "regression");
    }

    #[rstest]
    #[case("Tags : a , b\n", &["a", "b"])]
    #[case("  TAGS: one\n", &["one"])]
    #[case("tags: a, , b\n", &["a", "b"])]
    fn tag_keyword_is_case_insensitive_and_values_trim(
        #[case] text: &str,
        #[case] expected: &[&str],
    ) {
        let tokens = parse_document(text);
        let values: Vec<_> = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::TagValue)
            .map(|token| covered(text, token))
            .collect();
        assert_eq!(values, expected);
    }

    #[rstest]
    #[case("see the tags: note\n")]
    #[case("tags:\n")]
    fn non_tag_lines_emit_no_tag_tokens(#[case] text: &str) {
        assert!(
            parse_document(text)
                .iter()
                .all(|token| token.kind != TokenKind::Tag)
        );
    }

    #[test]
    fn tokens_group_by_pass_not_by_offset() {
        let text = "tags: early\n# Spec\n* step\n";
        let tokens = parse_document(text);
        assert_eq!(
            kinds(&tokens),
            [
                TokenKind::Specification,
                TokenKind::Step,
                TokenKind::Tag,
                TokenKind::TagValue,
            ]
        );
    }

    #[test]
    fn ordered_view_sorts_by_offset() {
        let text = "tags: early\n# Spec\n* step\n";
        let tokens = parse_document_ordered(text);
        let offsets: Vec<_> = tokens.iter().map(|token| token.span.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
        assert_eq!(tokens[0].kind, TokenKind::Tag);
    }
}
