//! The `cindex` and `csearch` binaries: flags, exit codes, output.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn cindex(index: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cindex"))
        .arg("--index")
        .arg(index)
        .args(args)
        .env_remove("CSEARCHINDEX")
        .env_remove("CSEARCH_SHARD_SIZE")
        .output()
        .unwrap()
}

fn csearch(index: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_csearch"))
        .arg("--index")
        .arg(index)
        .args(args)
        .env_remove("CSEARCHINDEX")
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn test_index_then_search_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), "foo\n").unwrap();
    fs::write(src.join("b.txt"), "bar\n").unwrap();
    let index = dir.path().join("idx");

    let out = cindex(&index, &[src.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let out = cindex(&index, &["--list"]);
    assert_eq!(stdout(&out), format!("{}\n", src.display()));

    let out = csearch(&index, &["-n", "foo"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), format!("{}:1:foo\n", src.join("a.txt").display()));

    let out = csearch(&index, &["-h", "-c", "ba"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "1\n");

    let out = csearch(&index, &["-l", "-f", ".*b\\.txt", "."]);
    assert_eq!(stdout(&out), format!("{}\n", src.join("b.txt").display()));

    let out = csearch(&index, &["nothing-like-this"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn test_usage_errors_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let index = dir.path().join("idx");
    // Missing pattern.
    assert_eq!(csearch(&index, &[]).status.code(), Some(2));
    // Malformed pattern.
    assert_eq!(csearch(&index, &["("]).status.code(), Some(2));
    // No index at the configured location.
    assert_eq!(csearch(&index, &["foo"]).status.code(), Some(2));
}

#[test]
fn test_fatal_errors_reach_stderr_without_logging() {
    let dir = tempfile::tempdir().unwrap();
    let index = dir.path().join("idx");
    for pattern in ["(", "foo"] {
        let out = Command::new(env!("CARGO_BIN_EXE_csearch"))
            .arg("--index")
            .arg(&index)
            .arg(pattern)
            .env_remove("CSEARCHINDEX")
            .env("RUST_LOG", "off")
            .output()
            .unwrap();
        assert_eq!(out.status.code(), Some(2), "{pattern}");
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.starts_with("csearch: "), "{pattern}: {stderr:?}");
    }
}

#[test]
fn test_single_dash_long_flags() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), "foo\n").unwrap();
    let index_dir = dir.path().join("shards");

    let run = |bin: &str, args: &[&str]| {
        Command::new(bin)
            .arg("-indexdir")
            .arg(&index_dir)
            .args(args)
            .env_remove("CSEARCHINDEX")
            .env_remove("CSEARCH_SHARD_SIZE")
            .output()
            .unwrap()
    };

    let out = run(env!("CARGO_BIN_EXE_cindex"), &[src.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let out = run(env!("CARGO_BIN_EXE_cindex"), &["-list"]);
    assert_eq!(stdout(&out), format!("{}\n", src.display()));

    let out = run(env!("CARGO_BIN_EXE_csearch"), &["-concur", "-brute", "foo"]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout(&out), format!("{}:foo\n", src.join("a.txt").display()));
}

#[test]
fn test_indexdir_with_shards() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    for i in 0..4 {
        fs::write(src.join(format!("f{i}.txt")), format!("line {i} marker\n")).unwrap();
    }
    let index_dir = dir.path().join("shards");

    let out = Command::new(env!("CARGO_BIN_EXE_cindex"))
        .arg("--indexdir")
        .arg(&index_dir)
        .args(["--shard-size", "1"])
        .arg(&src)
        .env_remove("CSEARCHINDEX")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    // Every shard was merged into the master and cleaned up.
    let names: Vec<String> = fs::read_dir(&index_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["csearch.idx"]);

    for mode in [&[][..], &["--concur"][..]] {
        let out = Command::new(env!("CARGO_BIN_EXE_csearch"))
            .arg("--indexdir")
            .arg(&index_dir)
            .args(mode)
            .args(["-l", "marker"])
            .env_remove("CSEARCHINDEX")
            .output()
            .unwrap();
        assert_eq!(out.status.code(), Some(0));
        assert_eq!(stdout(&out).lines().count(), 4);
    }
}

#[test]
fn test_reset_without_paths_removes_index() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), "foo\n").unwrap();
    let index = dir.path().join("idx");

    assert!(cindex(&index, &[src.to_str().unwrap()]).status.success());
    assert!(index.exists());
    assert!(cindex(&index, &["--reset"]).status.success());
    assert!(!index.exists());
}
