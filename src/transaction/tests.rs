//! Tests for transaction support

use super::*;
use tempfile::TempDir;

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_transaction_commit_creates_output() {
    let temp = TempDir::new().unwrap();

    let transaction = Transaction::begin(temp.path(), "_package").unwrap();
    transaction.write_file("template.js", "var a=1;").unwrap();
    let output = transaction.commit().unwrap();

    assert_eq!(output, temp.path().join("_package"));
    assert_eq!(
        fs::read_to_string(output.join("template.js")).unwrap(),
        "var a=1;"
    );
    assert_eq!(entries(temp.path()), vec!["_package"]);
}

#[test]
fn test_transaction_commit_replaces_previous_output() {
    let temp = TempDir::new().unwrap();
    let old = temp.path().join("_package");
    fs::create_dir_all(&old).unwrap();
    fs::write(old.join("stale.js"), "old").unwrap();

    let transaction = Transaction::begin(temp.path(), "_package").unwrap();
    transaction.write_file("template.js", "new").unwrap();
    transaction.commit().unwrap();

    assert_eq!(entries(&old), vec!["template.js"]);
    assert_eq!(entries(temp.path()), vec!["_package"]);
}

#[test]
fn test_transaction_rollback_on_drop() {
    let temp = TempDir::new().unwrap();

    {
        let transaction = Transaction::begin(temp.path(), "_package").unwrap();
        transaction.write_file("template.js", "var a=1;").unwrap();
        assert!(transaction.staging_path().exists());

        // Don't commit - staging is discarded on drop
    }

    assert!(entries(temp.path()).is_empty());
}

#[test]
fn test_transaction_rollback_keeps_previous_output() {
    let temp = TempDir::new().unwrap();
    let old = temp.path().join("_package");
    fs::create_dir_all(&old).unwrap();
    fs::write(old.join("template.js"), "old").unwrap();

    {
        let transaction = Transaction::begin(temp.path(), "_package").unwrap();
        transaction.write_file("template.js", "new").unwrap();
    }

    assert_eq!(fs::read_to_string(old.join("template.js")).unwrap(), "old");
    assert_eq!(entries(temp.path()), vec!["_package"]);
}

#[test]
fn test_transaction_staging_is_hidden_sibling() {
    let temp = TempDir::new().unwrap();
    let transaction = Transaction::begin(temp.path(), "_package").unwrap();

    let name = transaction
        .staging_path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with(STAGING_PREFIX));
    assert_eq!(transaction.staging_path().parent(), Some(temp.path()));
    assert_eq!(transaction.target(), temp.path().join("_package"));
}
