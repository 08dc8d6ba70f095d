use std::fs;
use std::path::Path;

use tempfile::TempDir;

use waymark::discover;
use waymark::migration::{Migration, MigrationError};

fn write_file(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write file");
}

#[test]
fn candidates_exclude_hidden_and_extensionless_entries() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "002-users.sh", "exit 0\n");
    write_file(tmp.path(), "001-init.sh", "exit 0\n");
    write_file(tmp.path(), ".hidden.sh", "exit 0\n");
    write_file(tmp.path(), "README", "not a migration\n");

    let names = discover::candidate_files(tmp.path()).expect("candidates");
    assert_eq!(names, vec!["001-init.sh", "002-users.sh"]);
}

#[test]
fn missing_directory_degrades_to_empty() {
    let tmp = TempDir::new().expect("tmp");
    let gone = tmp.path().join("nope");

    assert!(discover::candidate_files(&gone).expect("candidates").is_empty());
    assert!(discover::list_all(&gone).expect("list").is_empty());
}

#[test]
fn identities_parse_num_and_dashed_names() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "003-add-user-table.sh", "exit 0\n");

    let all = discover::list_all(tmp.path()).expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].num(), 3);
    assert_eq!(all[0].name(), "add-user-table");
    assert_eq!(all[0].file_name(), "003-add-user-table.sh");
}

#[test]
fn list_all_orders_numerically_not_lexicographically() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "999-old.sh", "exit 0\n");
    write_file(tmp.path(), "1000-new.sh", "exit 0\n");

    // Raw file names sort the other way around.
    let names = discover::candidate_files(tmp.path()).expect("candidates");
    assert_eq!(names, vec!["1000-new.sh", "999-old.sh"]);

    let all = discover::list_all(tmp.path()).expect("list");
    let nums: Vec<u32> = all.iter().map(Migration::num).collect();
    assert_eq!(nums, vec![999, 1000]);
}

#[test]
fn equal_nums_order_by_name() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "001-beta.sh", "exit 0\n");
    write_file(tmp.path(), "001-alpha.sh", "exit 0\n");

    let all = discover::list_all(tmp.path()).expect("list");
    let names: Vec<&str> = all.iter().map(Migration::name).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[test]
fn invalid_file_names_fail_the_scan() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "nodash.sh", "exit 0\n");

    match discover::list_all(tmp.path()) {
        Err(discover::DiscoverError::Migration(MigrationError::InvalidFileName(name))) => {
            assert_eq!(name, "nodash.sh");
        }
        other => panic!("expected InvalidFileName, got {other:?}"),
    }
}

#[test]
fn non_numeric_prefix_is_invalid() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "abc-foo.sh", "exit 0\n");

    assert!(matches!(
        discover::list_all(tmp.path()),
        Err(discover::DiscoverError::Migration(
            MigrationError::InvalidFileName(_)
        ))
    ));
}

#[test]
fn unsupported_extension_is_rejected() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "001-init.py", "pass\n");

    match discover::list_all(tmp.path()) {
        Err(discover::DiscoverError::Migration(MigrationError::UnsupportedExtension(ext))) => {
            assert_eq!(ext, "py");
        }
        other => panic!("expected UnsupportedExtension, got {other:?}"),
    }
}

#[test]
fn source_and_digest_are_lazy_and_cached() {
    let tmp = TempDir::new().expect("tmp");
    let body = "#!/bin/sh\nexit 0\n";
    write_file(tmp.path(), "001-init.sh", body);

    let migration = Migration::from_file(tmp.path(), "001-init.sh").expect("parse");
    assert_eq!(migration.source().expect("source"), body);

    let digest = migration.digest().expect("digest").to_string();
    assert_eq!(digest.len(), 64);
    assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));

    // Deleting the file after the first read must not matter.
    fs::remove_file(tmp.path().join("001-init.sh")).expect("remove");
    assert_eq!(migration.source().expect("cached source"), body);
    assert_eq!(migration.digest().expect("cached digest"), digest);
}

#[test]
fn vanished_file_is_source_unreadable() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "001-init.sh", "exit 0\n");

    let migration = Migration::from_file(tmp.path(), "001-init.sh").expect("parse");
    fs::remove_file(tmp.path().join("001-init.sh")).expect("remove");

    assert!(matches!(
        migration.source(),
        Err(MigrationError::SourceUnreadable { .. })
    ));
}

#[test]
fn doc_block_splits_into_short_and_long() {
    let tmp = TempDir::new().expect("tmp");
    let body = "#!/bin/sh\n# Creates the users table.\n#\n# Also seeds the admin\n# account.\n\nexit 0\n";
    write_file(tmp.path(), "002-users.sh", body);

    let migration = Migration::from_file(tmp.path(), "002-users.sh").expect("parse");
    assert_eq!(migration.short().expect("short"), "Creates the users table.");
    assert_eq!(
        migration.long().expect("long"),
        "Also seeds the admin\naccount."
    );
}

#[test]
fn missing_doc_block_yields_empty_descriptions() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "001-bare.sh", "exit 0\n");

    let migration = Migration::from_file(tmp.path(), "001-bare.sh").expect("parse");
    assert_eq!(migration.short().expect("short"), "");
    assert_eq!(migration.long().expect("long"), "");
}

#[test]
fn one_line_doc_has_empty_long() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "001-one.sh", "# Just one line.\nexit 0\n");

    let migration = Migration::from_file(tmp.path(), "001-one.sh").expect("parse");
    assert_eq!(migration.short().expect("short"), "Just one line.");
    assert_eq!(migration.long().expect("long"), "");
}

#[test]
fn identity_equality_ignores_content() {
    let tmp = TempDir::new().expect("tmp");
    write_file(tmp.path(), "001-init.sh", "exit 0\n");

    let a = Migration::from_file(tmp.path(), "001-init.sh").expect("parse");
    let b = Migration::from_file(tmp.path(), "001-init.sh").expect("parse");
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "1-init");
}
