use std::fs;

use chat_engine::StateFile;
use tempfile::TempDir;

#[test]
fn missing_file_reads_as_none() {
    let temp = TempDir::new().unwrap();
    let file = StateFile::new(temp.path().join("state.json"));
    assert!(file.read().unwrap().is_none());
}

#[test]
fn write_creates_parent_and_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let file = StateFile::new(temp.path().join("nested").join("state.json"));

    file.write("{\"v\":1}").unwrap();
    assert_eq!(file.read().unwrap().as_deref(), Some("{\"v\":1}"));

    file.write("{\"v\":2}").unwrap();
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "{\"v\":2}");

    // Only the target remains; temp files were renamed away.
    let entries = fs::read_dir(temp.path().join("nested")).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn unsynced_write_still_replaces_atomically() {
    let temp = TempDir::new().unwrap();
    let file = StateFile::new(temp.path().join("state.json"));

    file.write("{\"v\":1}").unwrap();
    file.write_unsynced("{\"v\":2}").unwrap();

    assert_eq!(file.read().unwrap().as_deref(), Some("{\"v\":2}"));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn parent_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let file = StateFile::new(blocker.join("state.json"));
    assert!(file.write("data").is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}
