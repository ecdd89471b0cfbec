//! Discovery over a real document tree on disk.

#![expect(
    clippy::expect_used,
    reason = "fixtures panic on filesystem setup failure"
)]

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use specmark_runner::{DiscoverySink, TestCase, discover, find_specification_files};
use tempfile::TempDir;

const LOGIN_SPEC: &str = "\
# Login
* Open the app
## Valid password
* Sign in as <role>
## Locked account
* See the lockout notice
";

const CHECKOUT_MD: &str = "\
Checkout flow
=============

Pay by card
-----------
* Pay \"42\" dollars
";

struct CollectingSink {
    seen: Mutex<Vec<String>>,
}

impl DiscoverySink for CollectingSink {
    fn case_found(&self, case: &TestCase) {
        self.seen
            .lock()
            .expect("sink lock")
            .push(case.identifier.clone());
    }
}

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("failed to write fixture");
    path
}

fn sorted_identifiers(cases: &[TestCase]) -> Vec<String> {
    let mut identifiers: Vec<String> = cases
        .iter()
        .map(|case| case.identifier.clone())
        .collect();
    identifiers.sort();
    identifiers
}

#[test]
fn derives_one_case_per_scenario_in_heading_order() {
    let dir = TempDir::new().expect("temp dir");
    let login = write_fixture(&dir, "login.spec", LOGIN_SPEC);

    let cases = discover(&[login.clone()], None);

    let identifiers: Vec<&str> = cases.iter().map(|case| case.identifier.as_str()).collect();
    assert_eq!(
        identifiers,
        vec!["# Login.## Valid password", "# Login.## Locked account"]
    );
    assert!(cases.iter().all(|case| case.source_path == login));
    assert_eq!(
        cases.first().expect("first case").display_name,
        "## Valid password"
    );
}

#[test]
fn underlined_headings_name_cases_too() {
    let dir = TempDir::new().expect("temp dir");
    let checkout = write_fixture(&dir, "checkout.md", CHECKOUT_MD);

    let cases = discover(&[checkout], None);

    assert_eq!(
        sorted_identifiers(&cases),
        vec!["Checkout flow\n=============.Pay by card\n-----------"]
    );
}

#[test]
fn sink_observes_every_case_exactly_once() {
    let dir = TempDir::new().expect("temp dir");
    let login = write_fixture(&dir, "login.spec", LOGIN_SPEC);
    let checkout = write_fixture(&dir, "checkout.md", CHECKOUT_MD);
    let sink = CollectingSink {
        seen: Mutex::new(Vec::new()),
    };

    let cases = discover(&[login, checkout], Some(&sink));

    let mut seen = sink.seen.lock().expect("sink lock").clone();
    seen.sort();
    assert_eq!(seen, sorted_identifiers(&cases));
    assert_eq!(seen.len(), 3);
}

#[test]
fn unreadable_document_does_not_disturb_siblings() {
    let dir = TempDir::new().expect("temp dir");
    let login = write_fixture(&dir, "login.spec", LOGIN_SPEC);
    let missing = dir.path().join("missing.spec");

    let cases = discover(&[missing, login], None);

    assert_eq!(cases.len(), 2);
}

#[test]
fn document_without_scenarios_contributes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let steps_only = write_fixture(&dir, "steps.spec", "* Lonely step\n");

    assert!(discover(&[steps_only], None).is_empty());
}

#[test]
fn rediscovery_of_an_unchanged_tree_is_idempotent() {
    let dir = TempDir::new().expect("temp dir");
    write_fixture(&dir, "login.spec", LOGIN_SPEC);
    write_fixture(&dir, "checkout.md", CHECKOUT_MD);

    let paths = find_specification_files(dir.path());
    let first = discover(&paths, None);
    let second = discover(&paths, None);

    assert_eq!(sorted_identifiers(&first), sorted_identifiers(&second));
    assert_eq!(first.len(), 3);
}
