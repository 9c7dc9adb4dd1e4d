//! Directory ingestion used by the `run` subcommand

mod helpers;

use rolemine_common::config::DEFAULT_MAX_FILE_SIZE_BYTES;
use rolemine_common::models::EntityKind;
use rolemine_wizard::ingest::{load_directory, summarize, validate_batch};
use tempfile::TempDir;

fn write_batch(dir: &TempDir) {
    for file in helpers::csv_batch() {
        std::fs::write(dir.path().join(&file.name), &file.contents).unwrap();
    }
}

#[test]
fn test_load_directory_reads_csv_files() {
    let dir = TempDir::new().unwrap();
    write_batch(&dir);
    // nested directories are not part of the batch
    std::fs::create_dir(dir.path().join("archive")).unwrap();

    let files = load_directory(dir.path()).unwrap();
    assert_eq!(files.len(), 5);
    assert_eq!(files[0].name, "applications.csv");

    let set = validate_batch(files, DEFAULT_MAX_FILE_SIZE_BYTES).unwrap();
    let summary = summarize(&set).unwrap();
    assert_eq!(summary.get(EntityKind::Users).unwrap().count, 3);
    assert_eq!(summary.get(EntityKind::Assignments).unwrap().count, 4);
}

#[test]
fn test_extra_file_in_directory_fails_validation() {
    let dir = TempDir::new().unwrap();
    write_batch(&dir);
    std::fs::write(dir.path().join("notes.txt"), "not data").unwrap();

    let files = load_directory(dir.path()).unwrap();
    assert_eq!(files.len(), 6);
    assert!(validate_batch(files, DEFAULT_MAX_FILE_SIZE_BYTES).is_err());
}

#[test]
fn test_missing_directory_is_error() {
    let dir = TempDir::new().unwrap();
    assert!(load_directory(&dir.path().join("absent")).is_err());
}
