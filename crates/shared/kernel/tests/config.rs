use config::{Environment, Map};
use sbox_kernel::config::{ConfigError, ENV_PREFIX, load_config, load_layered};
use sbox_kernel::domain::config::AppConfig;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("strongbox.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn loads_file_and_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[storage]
path = "/srv/files"
key = "from-file"
"#,
    );

    let cfg: AppConfig = load_config(Some(&path)).unwrap();

    assert_eq!(cfg.storage.key.as_deref(), Some("from-file"));
    assert_eq!(cfg.storage.vault_root(), PathBuf::from("/srv/files/vault"));
    assert_eq!(cfg.token.ttl_seconds, 3600);
    assert_eq!(cfg.log.level, "info");
}

#[test]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[storage]
key = "from-file"

[token]
ttl_seconds = 60
"#,
    );

    let env: Map<String, String> = [
        ("SBOX__STORAGE__KEY".to_owned(), "from-env".to_owned()),
        ("SBOX__TOKEN__TTL_SECONDS".to_owned(), "900".to_owned()),
        ("SBOX__LOG__LEVEL".to_owned(), "debug".to_owned()),
    ]
    .into_iter()
    .collect();

    let cfg: AppConfig =
        load_layered(Some(&path), Environment::with_prefix(ENV_PREFIX).source(Some(env))).unwrap();

    assert_eq!(cfg.storage.key.as_deref(), Some("from-env"));
    assert_eq!(cfg.token.ttl_seconds, 900);
    assert_eq!(cfg.log.level, "debug");
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result: Result<AppConfig, ConfigError> = load_config(Some(dir.path().join("absent.toml")));

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to build config"));
}
