//! Runnable test cases derived from specification documents.

use std::path::PathBuf;

/// One scenario of one specification document, addressable by a stable
/// identifier.
///
/// The identifier joins the document's specification name and the scenario
/// heading with a `.`, both exactly as matched in the document. A document
/// without a specification heading contributes an empty name, so its
/// identifiers start with the separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
pub struct TestCase {
    /// Stable identifier: specification name, `.`, scenario heading.
    pub identifier: String,
    /// Document the scenario was discovered in.
    pub source_path: PathBuf,
    /// The scenario heading as matched, shown to people.
    pub display_name: String,
}

impl TestCase {
    /// Build the case for `scenario_heading` under `specification_name`.
    #[must_use]
    pub fn new(
        specification_name: &str,
        scenario_heading: &str,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identifier: format!("{specification_name}.{scenario_heading}"),
            source_path: source_path.into(),
            display_name: scenario_heading.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::TestCase;

    #[test]
    fn joins_specification_name_and_heading() {
        let case = TestCase::new("# Login", "## Valid password", "specs/login.spec");
        assert_eq!(case.identifier, "# Login.## Valid password");
        assert_eq!(case.display_name, "## Valid password");
        assert_eq!(case.source_path, Path::new("specs/login.spec"));
    }

    #[test]
    fn missing_specification_name_leaves_a_leading_separator() {
        let case = TestCase::new("", "## Orphan", "orphan.md");
        assert_eq!(case.identifier, ".## Orphan");
    }
}
