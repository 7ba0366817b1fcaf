//! Integration tests for the batch driver
//!
//! Files are processed in manifest order; one file's failure never stops the
//! rest of the batch.

use field_migrator::config::load_from_str;
use field_migrator::{migrate_manifest, FileStatus, WriteMode};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    fs::read_to_string(
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name),
    )
    .unwrap()
}

/// `src/event/{nfs,smtp,broken}.rs`; `ssh.rs` is listed but never created.
fn setup_event_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("src/event");
    fs::create_dir_all(&events).unwrap();

    let nfs = fixture("blocklist_nfs.rs.input");
    fs::write(events.join("nfs.rs"), &nfs).unwrap();
    fs::write(
        events.join("smtp.rs"),
        nfs.replace("BlocklistNfs", "BlocklistSmtp"),
    )
    .unwrap();
    fs::write(
        events.join("broken.rs"),
        nfs.replace("BlocklistNfs", "BlocklistRdp")
            .replacen("    pub start_time: i64,\n", "", 1),
    )
    .unwrap();

    dir
}

const MANIFEST: &str = r#"
[meta]
name = "test"
base_dir = "src/event"

[[files]]
path = "smtp.rs"
record = "BlocklistSmtpFields"

[[files]]
path = "ssh.rs"
record = "BlocklistSshFields"

[[files]]
path = "broken.rs"
record = "BlocklistRdpFields"

[[files]]
path = "nfs.rs"
record = "BlocklistNfsFields"
"#;

fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join("src/event").join(name)).unwrap()
}

#[test]
fn test_batch_continues_past_failures() {
    let dir = setup_event_dir();
    let broken_before = read(dir.path(), "broken.rs");
    let manifest = load_from_str(MANIFEST).unwrap();

    let summary = migrate_manifest(&manifest, dir.path(), WriteMode::Write);

    let statuses: Vec<_> = summary
        .outcomes()
        .map(|o| matches!(o.status, FileStatus::Failed { .. }))
        .collect();
    assert_eq!(statuses, [false, true, true, false]);
    assert_eq!(summary.updated(), 2);
    assert_eq!(summary.failed(), 2);
    assert_eq!(summary.total(), 4);

    assert_eq!(read(dir.path(), "nfs.rs"), fixture("blocklist_nfs.rs.expected"));
    assert_eq!(
        read(dir.path(), "smtp.rs"),
        fixture("blocklist_nfs.rs.expected").replace("BlocklistNfs", "BlocklistSmtp")
    );
    assert_eq!(read(dir.path(), "broken.rs"), broken_before);
}

#[test]
fn test_second_run_is_unchanged() {
    let dir = setup_event_dir();
    let manifest = load_from_str(MANIFEST).unwrap();

    let first = migrate_manifest(&manifest, dir.path(), WriteMode::Write);
    assert_eq!(first.updated(), 2);

    let nfs_after_first = read(dir.path(), "nfs.rs");
    let second = migrate_manifest(&manifest, dir.path(), WriteMode::Write);
    assert_eq!(second.updated(), 0);
    assert_eq!(second.unchanged(), 2);
    assert_eq!(second.failed(), 2);
    assert_eq!(read(dir.path(), "nfs.rs"), nfs_after_first);
}

#[test]
fn test_dry_run_reports_without_writing() {
    let dir = setup_event_dir();
    let manifest = load_from_str(MANIFEST).unwrap();
    let before = read(dir.path(), "nfs.rs");

    let summary = migrate_manifest(&manifest, dir.path(), WriteMode::DryRun);
    assert_eq!(summary.updated(), 2);
    assert_eq!(read(dir.path(), "nfs.rs"), before);

    let nfs = summary
        .runs
        .iter()
        .find(|r| r.outcome.path.ends_with("nfs.rs"))
        .unwrap();
    assert_eq!(nfs.original, before);
    assert_eq!(nfs.final_text, fixture("blocklist_nfs.rs.expected"));
}

#[cfg(unix)]
#[test]
fn test_write_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = setup_event_dir();
    let nfs = dir.path().join("src/event/nfs.rs");
    fs::set_permissions(&nfs, fs::Permissions::from_mode(0o644)).unwrap();
    let manifest = load_from_str(MANIFEST).unwrap();

    let summary = migrate_manifest(&manifest, dir.path(), WriteMode::Write);
    assert_eq!(summary.updated(), 2);

    let mode = fs::metadata(&nfs).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
