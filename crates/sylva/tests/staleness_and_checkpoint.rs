//! Tests for modification-time staleness and the last-good-run checkpoint.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use sylva::cache::{CacheStore, FileCacheStore};
use sylva::RunCheckpoint;
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, modified: SystemTime) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "fn main() {}\n").expect("write source");
    File::options()
        .write(true)
        .open(&path)
        .and_then(|file| file.set_modified(modified))
        .expect("set mtime");
    path
}

#[test]
fn checkpoint_persists_across_store_instances() {
    let dir = TempDir::new().expect("create temp dir");
    let at = Utc::now();

    let mut checkpoint = RunCheckpoint::load(&FileCacheStore::new(dir.path()));
    assert_eq!(checkpoint.last_good_run(), None);
    checkpoint
        .advance(&FileCacheStore::new(dir.path()), at)
        .expect("record checkpoint");

    let reloaded = RunCheckpoint::load(&FileCacheStore::new(dir.path()));
    assert_eq!(reloaded.last_good_run(), Some(at));
}

#[test]
fn only_files_touched_after_the_checkpoint_are_stale() {
    let dir = TempDir::new().expect("create temp dir");
    let hour_ago = SystemTime::now() - Duration::from_secs(3600);
    let now = SystemTime::now();

    let untouched = write_file(dir.path(), "untouched.rs", hour_ago);
    let edited = write_file(dir.path(), "edited.rs", now);
    let checkpoint = RunCheckpoint::new(Some(
        DateTime::<Utc>::from(hour_ago) + chrono::TimeDelta::minutes(30),
    ));

    assert!(!checkpoint.has_changed(&untouched));
    assert!(checkpoint.has_changed(&edited));
    assert_eq!(
        checkpoint.stale_files(&[untouched, edited.clone()]),
        vec![edited]
    );
}

#[test]
fn without_a_checkpoint_everything_is_stale() {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileCacheStore::new(dir.path().join("cache"));
    let old = write_file(dir.path(), "old.rs", SystemTime::UNIX_EPOCH);

    let checkpoint = RunCheckpoint::load(&store);

    assert!(checkpoint.has_changed(&old));
}

#[test]
fn corrupt_checkpoint_makes_everything_stale() {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileCacheStore::new(dir.path());
    fs::write(dir.path().join("last_good_run"), "not a timestamp").expect("write checkpoint");
    let old = write_file(dir.path(), "old.rs", SystemTime::UNIX_EPOCH);

    assert!(store.last_good_run().is_err());
    let checkpoint = RunCheckpoint::load(&store);

    assert_eq!(checkpoint.last_good_run(), None);
    assert!(checkpoint.has_changed(&old));
}

#[test]
fn deleted_file_is_stale() {
    let dir = TempDir::new().expect("create temp dir");
    let checkpoint = RunCheckpoint::new(Some(Utc::now()));

    assert!(checkpoint.has_changed(&dir.path().join("deleted.rs")));
}
