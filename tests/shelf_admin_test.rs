use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn ingest(root: &Path, shelf_home: &Path) {
    let source = root.join("papers.json");
    fs::write(
        &source,
        r#"[
            {"authors": ["Grace Hopper 1"], "title": "Compilers", "doi": "10.1/c", "year": 1700000000},
            {"authors": "Alan Turing", "title": "Computable Numbers", "doi": "10.1/t", "year": 1600000000}
        ]"#,
    )
    .expect("write source");

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(root)
        .env("PAPERSHELF_HOME", shelf_home)
        .env("PAPERSHELF_CONFIG_PATH", root.join("absent.toml"))
        .args(["ingest", "--source"])
        .arg(&source)
        .assert()
        .success();
}

#[test]
fn stats_reports_corpus_size() {
    let tmp = tempdir().expect("tempdir");
    let shelf_home = tmp.path().join("shelf");
    ingest(tmp.path(), &shelf_home);

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(tmp.path())
        .env("PAPERSHELF_HOME", &shelf_home)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("num_papers=2"))
        .stdout(predicate::str::contains("thr_96=0"));
}

#[test]
fn show_renders_one_paper_and_flags_unknown_ids() {
    let tmp = tempdir().expect("tempdir");
    let shelf_home = tmp.path().join("shelf");
    ingest(tmp.path(), &shelf_home);

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(tmp.path())
        .env("PAPERSHELF_HOME", &shelf_home)
        .args(["show", "10.1/c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("authors=Grace Hopper"))
        .stdout(predicate::str::contains("time=1700000000"));

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(tmp.path())
        .env("PAPERSHELF_HOME", &shelf_home)
        .args(["show", "10.1/missing"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("no paper with id"));
}

#[test]
fn compact_and_status_describe_the_shelf() {
    let tmp = tempdir().expect("tempdir");
    let shelf_home = tmp.path().join("shelf");
    ingest(tmp.path(), &shelf_home);

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(tmp.path())
        .env("PAPERSHELF_HOME", &shelf_home)
        .env("PAPERSHELF_CONFIG_PATH", tmp.path().join("absent.toml"))
        .arg("compact")
        .assert()
        .success()
        .stdout(predicate::str::contains("corpus.live=2"));

    assert_cmd::cargo::cargo_bin_cmd!("papershelf")
        .current_dir(tmp.path())
        .env("PAPERSHELF_HOME", &shelf_home)
        .env("PAPERSHELF_CONFIG_PATH", tmp.path().join("absent.toml"))
        .arg("--json")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("corpus.records=2"))
        .stdout(predicate::str::contains("corpus.writer_active=false"))
        .stdout(predicate::str::contains("PAPERSHELF_HOME"));
}
