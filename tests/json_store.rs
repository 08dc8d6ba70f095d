use std::fs;
use std::path::Path;

use tempfile::TempDir;

use waymark::migration::Migration;
use waymark::store::json::JsonStore;
use waymark::store::{ResultStore, StoreError};

fn write_migration(dir: &Path, file_name: &str, body: &str) -> Migration {
    fs::write(dir.join(file_name), body).expect("write migration");
    Migration::from_file(dir, file_name).expect("parse migration")
}

#[test]
fn missing_store_file_reads_as_empty() {
    let tmp = TempDir::new().expect("tmp");
    let mut store = JsonStore::new(tmp.path().join("db.json"));

    assert!(store.all_results().expect("all").is_empty());
    assert!(!store.last_outcome(1, "init").expect("last"));
}

#[test]
fn add_snapshots_identity_fields() {
    let tmp = TempDir::new().expect("tmp");
    let migration = write_migration(tmp.path(), "001-init.sh", "# Sets up.\nexit 0\n");
    let mut store = JsonStore::new(tmp.path().join("db.json"));

    store.add(&migration, true).expect("add");

    let all = store.all_results().expect("all");
    assert_eq!(all.len(), 1);
    let record = &all[0];
    assert_eq!(record.num, 1);
    assert_eq!(record.name, "init");
    assert_eq!(record.source, "# Sets up.\nexit 0\n");
    assert_eq!(record.digest, migration.digest().expect("digest"));
    assert!(record.outcome);
    // The flat file does not carry the description snapshot.
    assert_eq!(record.short, None);
    assert_eq!(record.long, None);
}

#[test]
fn last_outcome_is_last_write_wins() {
    let tmp = TempDir::new().expect("tmp");
    let migration = write_migration(tmp.path(), "001-init.sh", "exit 0\n");
    let mut store = JsonStore::new(tmp.path().join("db.json"));

    store.add(&migration, false).expect("add");
    store.add(&migration, true).expect("add");
    assert!(store.last_outcome(1, "init").expect("last"));

    let other = write_migration(tmp.path(), "002-other.sh", "exit 0\n");
    store.add(&other, true).expect("add");
    store.add(&other, false).expect("add");
    assert!(!store.last_outcome(2, "other").expect("last"));
}

#[test]
fn find_isolates_identities() {
    let tmp = TempDir::new().expect("tmp");
    let a = write_migration(tmp.path(), "001-init.sh", "exit 0\n");
    let b = write_migration(tmp.path(), "002-init.sh", "exit 0\n");
    let mut store = JsonStore::new(tmp.path().join("db.json"));

    store.add(&a, true).expect("add");
    store.add(&b, false).expect("add");
    store.add(&a, false).expect("add");

    let found = store.find(1, "init").expect("find");
    assert_eq!(found.len(), 2);
    assert_eq!(
        found.iter().map(|r| r.outcome).collect::<Vec<_>>(),
        vec![true, false]
    );
    assert_eq!(store.find(2, "init").expect("find").len(), 1);
    assert!(store.find(3, "init").expect("find").is_empty());
}

#[test]
fn records_survive_reopen_in_order() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("db.json");
    let a = write_migration(tmp.path(), "001-init.sh", "# First.\nexit 0\n");
    let b = write_migration(tmp.path(), "002-users.sh", "# Second.\nexit 0\n");

    let written = {
        let mut store = JsonStore::new(&path);
        store.add(&a, true).expect("add");
        store.add(&b, false).expect("add");
        store.add(&a, false).expect("add");
        store.all_results().expect("all")
    };

    let mut reopened = JsonStore::new(&path);
    let read_back = reopened.all_results().expect("all");

    assert_eq!(read_back, written);
    assert!(read_back.windows(2).all(|w| w[0].ts <= w[1].ts));
}

#[test]
fn corrupt_store_file_is_fatal() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("db.json");
    fs::write(&path, "{ not json []").expect("write");

    let mut store = JsonStore::new(&path);
    assert!(matches!(
        store.all_results(),
        Err(StoreError::Corrupt { .. })
    ));
}

#[test]
fn force_style_reruns_accumulate_records() {
    let tmp = TempDir::new().expect("tmp");
    let migration = write_migration(tmp.path(), "001-init.sh", "exit 0\n");
    let mut store = JsonStore::new(tmp.path().join("db.json"));

    for _ in 0..5 {
        store.add(&migration, true).expect("add");
    }
    assert_eq!(store.find(1, "init").expect("find").len(), 5);
}
