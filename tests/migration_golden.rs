//! Golden fixture tests
//!
//! Each `tests/fixtures/<name>.input` is migrated and compared byte-for-byte
//! with `<name>.expected`.

use field_migrator::{Pipeline, RecordName, StepStatus};
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

fn nfs() -> RecordName {
    RecordName::new("BlocklistNfsFields").unwrap()
}

#[test]
fn test_blocklist_nfs_matches_expected() {
    let input = fixture("blocklist_nfs.rs.input");
    let expected = fixture("blocklist_nfs.rs.expected");

    let result = Pipeline::session_fields().run(&input, &nfs()).unwrap();
    assert!(result.changed);
    assert_eq!(result.final_text, expected);
    assert!(result
        .steps
        .iter()
        .all(|r| r.status == StepStatus::Applied));
}

#[test]
fn test_expected_fixture_is_a_fixed_point() {
    let expected = fixture("blocklist_nfs.rs.expected");

    let result = Pipeline::session_fields().run(&expected, &nfs()).unwrap();
    assert!(!result.changed);
    assert_eq!(result.final_text, expected);
    assert!(result
        .steps
        .iter()
        .all(|r| r.status == StepStatus::AlreadyApplied));
}

#[test]
fn test_wrong_record_leaves_fixture_alone() {
    let input = fixture("blocklist_nfs.rs.input");
    let smtp = RecordName::new("BlocklistSmtpFields").unwrap();

    let result = Pipeline::session_fields().run(&input, &smtp).unwrap();
    // Only the record-independent import step applies.
    assert_eq!(result.applied_steps().collect::<Vec<_>>(), ["import"]);
}

#[test]
fn test_crlf_fixture_keeps_crlf() {
    let input = fixture("blocklist_nfs.rs.input").replace('\n', "\r\n");
    let expected = fixture("blocklist_nfs.rs.expected").replace('\n', "\r\n");

    let result = Pipeline::session_fields().run(&input, &nfs()).unwrap();
    assert_eq!(result.final_text, expected);
}
