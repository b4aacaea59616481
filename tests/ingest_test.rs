use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_source(path: &Path) {
    let rows = [
        r#"{"authors": ["Karin Larsson 1", "Erik Berg 2 3"], "title": "Fjord Sediments", "doi": "10.1/fjord", "year": 2019}"#,
        r#"{"authors": "Ada Lovelace 4", "title": "Analytical Notes", "doi": "10.1/notes", "year": 2021}"#,
        r#"{"authors": ["Nobody"], "title": null, "doi": "10.1/broken", "year": 2020}"#,
    ];
    fs::write(path, format!("{}\n", rows.join("\n"))).expect("write source");
}

#[test]
fn ingest_writes_both_stores_and_drops_incomplete_rows() {
    let tmp = tempdir().expect("tempdir");
    let shelf_home = tmp.path().join("shelf");
    let source = tmp.path().join("papers.jsonl");
    write_source(&source);

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(tmp.path())
        .env("PAPERSHELF_HOME", &shelf_home)
        .env("PAPERSHELF_CONFIG_PATH", tmp.path().join("absent.toml"))
        .arg("ingest")
        .arg("--source")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("upserted=2"))
        .stdout(predicate::str::contains("dropped=1"));

    let corpus = fs::read_to_string(shelf_home.join("db/papers.jsonl")).expect("corpus");
    assert!(corpus.contains("\"Erik Berg\""));
    assert!(!corpus.contains("10.1/broken"));
    let timeline = fs::read_to_string(shelf_home.join("db/metas.jsonl")).expect("timeline");
    assert_eq!(timeline.lines().count(), 2);

    let audit = fs::read_to_string(shelf_home.join("logs/audit.log")).expect("audit log");
    assert!(audit.contains("\"phase\":\"ingest\""));
}

#[test]
fn ingest_twice_is_idempotent() {
    let tmp = tempdir().expect("tempdir");
    let shelf_home = tmp.path().join("shelf");
    let source = tmp.path().join("papers.jsonl");
    write_source(&source);

    for _ in 0..2 {
        assert_cmd::cargo::cargo_bin_cmd!("papershelf")
            .current_dir(tmp.path())
            .env("PAPERSHELF_HOME", &shelf_home)
            .env("PAPERSHELF_CONFIG_PATH", tmp.path().join("absent.toml"))
            .args(["ingest", "--source"])
            .arg(&source)
            .assert()
            .success();
    }

    let corpus = fs::read_to_string(shelf_home.join("db/papers.jsonl")).expect("corpus");
    assert_eq!(corpus.lines().count(), 2);
}

#[test]
fn dry_run_leaves_shelf_untouched() {
    let tmp = tempdir().expect("tempdir");
    let shelf_home = tmp.path().join("shelf");
    let source = tmp.path().join("papers.jsonl");
    write_source(&source);

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(tmp.path())
        .env("PAPERSHELF_HOME", &shelf_home)
        .env("PAPERSHELF_CONFIG_PATH", tmp.path().join("absent.toml"))
        .args(["ingest", "--dry-run", "--source"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted=2"));

    assert!(!shelf_home.join("db/papers.jsonl").exists());
}

#[test]
fn missing_source_aborts_with_source_code() {
    let tmp = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(tmp.path())
        .env("PAPERSHELF_HOME", tmp.path().join("shelf"))
        .env("PAPERSHELF_CONFIG_PATH", tmp.path().join("absent.toml"))
        .args(["ingest", "--source"])
        .arg(tmp.path().join("nope.jsonl"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("E001_SOURCE_UNAVAILABLE"));
}
