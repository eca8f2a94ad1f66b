#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::exports::{demo_export, dir, file, write_export};
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_build_and_update() {
    let tmp = tempdir().unwrap();
    let docs = vec![
        dir(1, "src", vec![file(2, "{{interface.name}}.js", 1, "{{interface.path}}")]),
        file(3, "README.md", 0, "{{args.title}}"),
        dir(20, "mock", vec![]),
    ];
    let export = write_export(tmp.path(), "export.json", &demo_export(docs));
    let out = tmp.path().join("app");

    let exe = env!("CARGO_BIN_EXE_stubsmith");
    let output = Command::new(exe)
        .arg("build")
        .arg("--input")
        .arg(&export)
        .arg("--output")
        .arg(&out)
        .args(["--key", "demo", "--arg", "title=Hello"])
        .env("STUBSMITH_LOG_LEVEL", "warn")
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("written:"));
    assert!(stdout.contains("rules:     2 interface, 1 view"));

    assert_eq!(fs::read_to_string(out.join("src/getUser.js")).unwrap(), "/user");
    assert_eq!(fs::read_to_string(out.join("README.md")).unwrap(), "Hello");
    assert!(out.join("mock/get/user/data.json").exists());
    assert!(out.join(".stubsmith/stubsmith.json").exists());

    let status = Command::new(exe)
        .arg("update")
        .arg("--input")
        .arg(&export)
        .arg("--output")
        .arg(&out)
        .arg("--previous")
        .arg(&export)
        .args(["--key", "demo"])
        .env("STUBSMITH_LOG_LEVEL", "warn")
        .status()
        .expect("run cli");
    assert!(status.success());
}

#[test]
fn test_cli_fails_on_missing_input() {
    let tmp = tempdir().unwrap();
    let exe = env!("CARGO_BIN_EXE_stubsmith");
    let status = Command::new(exe)
        .arg("build")
        .arg("--input")
        .arg(tmp.path().join("missing.json"))
        .arg("--output")
        .arg(tmp.path().join("out"))
        .status()
        .expect("run cli");
    assert!(!status.success());
}
