//! Parallel discovery of test cases across specification documents.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use specmark_syntax::{scenario_headings, specification_name};
use tracing::warn;

use crate::case::TestCase;

/// Receives test cases incrementally as discovery produces them.
///
/// Discovery runs documents in parallel, so implementations are called from
/// worker threads in no particular order across documents.
pub trait DiscoverySink: Sync {
    /// Called once per discovered case.
    fn case_found(&self, case: &TestCase);
}

/// File extensions recognized as specification documents.
const SPECIFICATION_EXTENSIONS: [&str; 2] = ["spec", "md"];

/// Whether `path` names a specification document, judged by extension.
#[must_use]
pub fn is_specification_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            SPECIFICATION_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

/// Recursively collect specification documents under `root`, sorted by path.
#[must_use]
pub fn find_specification_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect_specification_files(root, &mut found);
    found.sort();
    found
}

fn collect_specification_files(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if path.is_dir() {
            collect_specification_files(&path, found);
        } else if is_specification_file(&path) {
            found.push(path);
        }
    }
}

/// Derive one [`TestCase`] per scenario heading across `paths`.
///
/// Documents are processed in parallel and independently: a path that cannot
/// be read is logged at warn level and contributes nothing, without
/// disturbing its siblings. Scenario order within one document follows the
/// heading scan; order across documents is not part of the contract. When a
/// sink is supplied it is notified per case as cases are produced; the full
/// list is returned either way.
pub fn discover(paths: &[PathBuf], sink: Option<&dyn DiscoverySink>) -> Vec<TestCase> {
    paths
        .par_iter()
        .flat_map(|path| discover_document(path, sink))
        .collect()
}

fn discover_document(path: &Path, sink: Option<&dyn DiscoverySink>) -> Vec<TestCase> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            warn!(path = %path.display(), %error, "skipping unreadable document");
            return Vec::new();
        }
    };
    let name = specification_name(&text).unwrap_or_default();
    scenario_headings(&text)
        .map(|heading| {
            let case = TestCase::new(name, heading, path);
            if let Some(sink) = sink {
                sink.case_found(&case);
            }
            case
        })
        .collect()
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "test fixtures panic on filesystem setup failure"
)]
mod tests {
    use std::fs;
    use std::path::Path;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::{find_specification_files, is_specification_file};

    #[rstest]
    #[case("login.spec", true)]
    #[case("notes.md", true)]
    #[case("LOGIN.SPEC", true)]
    #[case("archive.tar.md", true)]
    #[case("readme.txt", false)]
    #[case("spec", false)]
    #[case("md", false)]
    fn recognizes_documents_by_extension(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_specification_file(Path::new(name)), expected);
    }

    #[test]
    fn walks_nested_directories_and_skips_other_files() {
        let root = TempDir::new().expect("failed to create temp dir");
        let nested = root.path().join("features").join("auth");
        fs::create_dir_all(&nested).expect("failed to create nested dir");
        fs::write(root.path().join("top.spec"), "# Top").expect("failed to write");
        fs::write(nested.join("login.md"), "# Login").expect("failed to write");
        fs::write(nested.join("notes.txt"), "ignore me").expect("failed to write");

        let found = find_specification_files(root.path());

        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|path| path.ends_with("login.md")));
        assert!(found.iter().any(|path| path.ends_with("top.spec")));
    }

    #[test]
    fn missing_root_yields_no_documents() {
        let root = TempDir::new().expect("failed to create temp dir");
        let gone = root.path().join("absent");
        assert!(find_specification_files(&gone).is_empty());
    }
}
