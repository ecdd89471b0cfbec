//! Span classification and step-text normalization for plain-text
//! specification documents.
//!
//! The crate scans documents written in a lightweight markdown-like syntax
//! and classifies spans of text (specification headings, scenario headings,
//! steps, parameters, tags) without building a syntax tree. It also derives
//! the canonical step text used as the resolution key when asking an engine
//! process whether a step has an implementation.
//!
//! All scanning is pure computation over the input text; the crate performs
//! no I/O and never mutates the document.

mod span;
mod step_text;
mod token;
mod tokenizer;

pub use span::Span;
pub use step_text::{canonical_step_text, canonical_step_text_at, is_table_row};
pub use token::{Token, TokenKind};
pub use tokenizer::{
    contains_multiline_heading, parse_document, parse_document_ordered, scenario_headings,
    specification_name,
};
