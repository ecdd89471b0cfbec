//! Classified tokens emitted by the document scanner.

use crate::span::Span;

/// Classification attached to a span of document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
pub enum TokenKind {
    /// Reserved for commented-out regions. No scanning pass currently
    /// produces it; the variant is kept so downstream consumers can match
    /// exhaustively against the full classification.
    Comment,
    /// A specification heading (`#` form or `=`-underlined form).
    Specification,
    /// A scenario heading (`##` form or `-`-underlined form).
    Scenario,
    /// A step line, including its markup and parameters.
    Step,
    /// A whole `tags:` line.
    Tag,
    /// A single trimmed value within a `tags:` line.
    TagValue,
    /// A double-quoted literal parameter inside a step.
    StaticParameter,
    /// An angle-bracketed placeholder parameter inside a step.
    DynamicParameter,
}

/// A classified span of document text.
///
/// Tokens are immutable once produced. Their ordering within a scan result
/// follows the pass that produced them, not document position; see
/// [`parse_document`](crate::parse_document) for the ordering contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Token {
    /// What the covered text was classified as.
    pub kind: TokenKind,
    /// Where the classified text sits in the document.
    pub span: Span,
}

impl Token {
    /// Create a token classifying `span` as `kind`.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
