use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tagsel(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tagsel").expect("binary exists");
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("HOME", dir)
        .env_remove("TAGSEL_BACKEND")
        .env_remove("TAGSEL_NO_SELECT_FOR_ONE_MATCH")
        .env_remove("TAGSEL_LOG");
    cmd
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("src")).expect("src dir");
    fs::write(
        dir.path().join("src/a.rs"),
        "fn render() {}\nfn solo() {}\n",
    )
    .expect("write a.rs");
    fs::write(dir.path().join("src/b.rs"), "let x = render();\n").expect("write b.rs");
    dir
}

#[test]
fn help_displays_usage() {
    let dir = project();
    tagsel(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn list_prints_grouped_numbered_matches() {
    let dir = project();
    tagsel(dir.path())
        .args(["find", "render", "--list"])
        .assert()
        .success()
        .stdout(
            "Finding tag: render\n\nIn: src/a.rs\n1 fn render() {}\n\nIn: src/b.rs\n2 let x = render();\n",
        );
}

#[test]
fn single_match_jumps_and_back_returns() {
    let dir = project();
    tagsel(dir.path())
        .args(["find", "solo", "--from", "src/b.rs:1"])
        .assert()
        .success()
        .stdout("src/a.rs:2:4\n");

    tagsel(dir.path())
        .arg("marks")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 src/b.rs:1:1"));

    tagsel(dir.path())
        .arg("back")
        .assert()
        .success()
        .stdout("src/b.rs:1:1\n");

    tagsel(dir.path())
        .arg("back")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mark stack is empty"));
}

#[test]
fn pick_selects_by_exact_number() {
    let dir = project();
    tagsel(dir.path())
        .args(["find", "render", "--pick", "2"])
        .assert()
        .success()
        .stdout("src/b.rs:1:9\n");

    tagsel(dir.path())
        .args(["find", "render", "--pick", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no tag numbered 7"));
}

#[test]
fn missing_identifier_fails() {
    let dir = project();
    tagsel(dir.path())
        .args(["find", "nothing_here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no matches for tag `nothing_here`"));
}

#[test]
fn selector_without_terminal_falls_back_to_listing() {
    let dir = project();
    tagsel(dir.path())
        .args(["find", "render"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 fn render() {}"))
        .stderr(predicate::str::contains("--pick"));
}

#[test]
fn table_backend_reads_tag_file() {
    let dir = project();
    fs::create_dir_all(dir.path().join(".tagsel")).expect("state dir");
    fs::write(
        dir.path().join(".tagsel/tags.json"),
        r#"[
            {"name": "render", "path": "src/b.rs", "line": 1, "column": 9, "text": "let x = render();"},
            {"name": "solo", "path": "src/a.rs", "line": 2}
        ]"#,
    )
    .expect("write table");

    tagsel(dir.path())
        .args(["find", "render", "--backend", "table"])
        .assert()
        .success()
        .stdout("src/b.rs:1:9\n");
}

#[test]
fn completions_are_generated() {
    let dir = project();
    tagsel(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagsel"));
}
