#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        Self::with_key(Some("cli-test-secret"))
    }

    fn with_key(key: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let key = key.map(|k| format!("key = {k:?}\n")).unwrap_or_default();
        let body = format!(
            "[storage]\npath = {:?}\n{key}\n[log]\nlevel = \"warn\"\n",
            data.display().to_string()
        );
        let config = dir.path().join("strongbox.toml");
        std::fs::write(&config, body).unwrap();
        Self { dir, config }
    }

    fn source(&self, name: &str, body: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("strongbox").unwrap();
        cmd.env_remove("SBOX__STORAGE__KEY").arg("--config").arg(&self.config);
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        String::from_utf8(output.stdout).unwrap().trim().to_owned()
    }

    fn data(&self) -> &Path {
        self.dir.path()
    }
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("strongbox")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("put"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("url"));
}

#[test]
fn put_never_overwrites() {
    let fx = Fixture::new();
    let src = fx.source("a.txt", b"hello");
    let src = src.to_str().unwrap();

    assert_eq!(fx.stdout(&["put", src, "--path", "docs/a.txt"]), "docs/a.txt");
    assert_eq!(fx.stdout(&["put", src, "--path", "docs/a.txt"]), "docs/_a.txt");

    let stored = fx.data().join("data/workspace/docs/_a.txt");
    assert_eq!(std::fs::read(stored).unwrap(), b"hello");
}

#[test]
fn put_with_subfolder_uses_dated_path() {
    let fx = Fixture::new();
    let src = fx.source("me.png", b"png");

    let saved = fx.stdout(&["put", src.to_str().unwrap(), "--subfolder", "avatars", "-a", "vault"]);
    assert!(saved.starts_with("avatars/"), "{saved}");
    assert!(saved.ends_with("/me.png"), "{saved}");
    assert!(fx.data().join("data/vault").join(&saved).is_file());
}

#[test]
fn put_rejects_traversal() {
    let fx = Fixture::new();
    let src = fx.source("a.txt", b"x");

    fx.cmd()
        .args(["put", src.to_str().unwrap(), "--path", "../escape.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path traversal"));
}

#[test]
fn token_round_trips_through_verify() {
    let fx = Fixture::new();
    let token = fx.stdout(&["token", "reports/q1.pdf"]);

    assert_eq!(fx.stdout(&["verify", "reports/q1.pdf", &token]), "valid");

    fx.cmd()
        .args(["verify", "reports/q2.pdf", &token])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Token rejected"));
}

#[test]
fn url_renders_both_areas() {
    let fx = Fixture::new();

    assert_eq!(fx.stdout(&["url", "docs/my file.txt"]), "/download/docs/my%20file.txt");

    let private = fx.stdout(&[
        "url",
        "secret.pdf",
        "--area",
        "vault",
        "--base",
        "https://files.example.com",
    ]);
    assert!(private.starts_with("https://files.example.com/download-private/secret.pdf?token="));
}

#[test]
fn resolve_prints_a_path_inside_the_area() {
    let fx = Fixture::new();
    let resolved = fx.stdout(&["resolve", "a/b.txt"]);

    assert!(resolved.ends_with("b.txt"), "{resolved}");
    assert!(resolved.contains("workspace"), "{resolved}");
}

#[test]
fn missing_key_fails_startup() {
    let fx = Fixture::with_key(None);

    fx.cmd()
        .args(["token", "a.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Token codec failure"));
    assert!(!fx.data().join("data").exists());
}
