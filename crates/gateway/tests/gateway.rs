use chrono::Utc;
use sbox_gateway::domain::config::AppConfig;
use sbox_gateway::storage::StorageError;
use sbox_gateway::token::TokenError;
use sbox_gateway::{Area, FileGateway, GatewayError, Url};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

fn config(tmp: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.path = tmp.path().to_path_buf();
    config.storage.key = Some("gateway-test-secret".to_owned());
    config
}

async fn gateway(tmp: &TempDir) -> FileGateway {
    FileGateway::connect(&config(tmp)).await.unwrap()
}

#[tokio::test]
async fn test_missing_key_fails_before_touching_disk() {
    let tmp = TempDir::new().unwrap();
    let mut config = config(&tmp);
    config.storage.key = None;

    let err = FileGateway::connect(&config).await.unwrap_err();

    assert!(matches!(err, GatewayError::Token { source: TokenError::InvalidConfiguration { .. }, .. }));
    assert!(!tmp.path().join("workspace").exists());
    assert!(!tmp.path().join("vault").exists());
}

#[tokio::test]
async fn test_empty_key_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut config = config(&tmp);
    config.storage.key = Some(String::new());

    assert!(matches!(FileGateway::connect(&config).await, Err(GatewayError::Token { .. })));
}

#[tokio::test]
async fn test_areas_are_separate_roots() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;

    let public = gateway.save("a.txt", &mut &b"public"[..], Area::Workspace).await.unwrap();
    let private = gateway.save("a.txt", &mut &b"private"[..], Area::Vault).await.unwrap();

    assert_eq!(public, "a.txt");
    assert_eq!(private, "a.txt", "areas must not collide with each other");
    assert_ne!(gateway.root(Area::Workspace), gateway.root(Area::Vault));

    let on_disk = std::fs::read(gateway.physical_path(&private, Area::Vault).unwrap()).unwrap();
    assert_eq!(on_disk, b"private");
}

#[tokio::test]
async fn test_physical_path_rejects_traversal() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;

    let err = gateway.physical_path("../vault/a.txt", Area::Workspace).unwrap_err();
    assert!(matches!(err, GatewayError::Storage { source: StorageError::PathTraversalAttempt { .. }, .. }));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_upload_uses_dated_path_and_collision_prefix() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;
    let today = Utc::now().format("%Y/%m/%d").to_string();

    let first = gateway.upload("avatars", "me.png", &mut &b"1"[..], Area::Workspace).await.unwrap();
    let second = gateway.upload("avatars", "me.png", &mut &b"2"[..], Area::Workspace).await.unwrap();

    assert_eq!(first, format!("avatars/{today}/me.png"));
    assert_eq!(second, format!("avatars/{today}/_me.png"));
}

#[tokio::test]
async fn test_upload_rejects_bad_file_names() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;

    let err = gateway.upload("avatars", "../me.png", &mut &b"1"[..], Area::Workspace).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_open_private_requires_valid_token() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;
    let saved = gateway.save("secret/report.pdf", &mut &b"%PDF-1.7"[..], Area::Vault).await.unwrap();

    let token = gateway.issue_token(&saved);
    let mut file = gateway.open_private(&saved, &token).await.unwrap();
    let mut body = Vec::new();
    file.read_to_end(&mut body).await.unwrap();
    assert_eq!(body, b"%PDF-1.7");

    let err = gateway.open_private(&saved, "bogus").await.unwrap_err();
    assert!(matches!(err, GatewayError::Unauthorized { .. }));

    let other = gateway.issue_token("secret/other.pdf");
    assert!(matches!(
        gateway.open_private(&saved, &other).await,
        Err(GatewayError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn test_open_private_never_reads_the_workspace() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;
    let saved = gateway.save("only-public.txt", &mut &b"x"[..], Area::Workspace).await.unwrap();

    let token = gateway.issue_token(&saved);
    let err = gateway.open_private(&saved, &token).await.unwrap_err();
    assert!(matches!(err, GatewayError::Storage { source: StorageError::FileNotFound { .. }, .. }));
}

#[tokio::test]
async fn test_workspace_url_is_relative_and_escaped() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;

    let url = gateway.internet_url("/avatars\\2024/my photo.png", Area::Workspace, None).unwrap();
    assert_eq!(url, "/download/avatars/2024/my%20photo.png");
}

#[tokio::test]
async fn test_vault_url_carries_a_working_token() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;
    let base = Url::parse("https://files.example.com").unwrap();

    let rendered = gateway.internet_url("secret/report.pdf", Area::Vault, Some(&base)).unwrap();
    let url = Url::parse(&rendered).unwrap();

    assert_eq!(url.host_str(), Some("files.example.com"));
    assert_eq!(url.path(), "/download-private/secret/report.pdf");

    let token = url.query_pairs().find(|(k, _)| k == "token").map(|(_, v)| v.into_owned()).unwrap();
    assert!(gateway.validate_token("secret/report.pdf", &token));
}

#[tokio::test]
async fn test_url_rejects_empty_and_relative_segments() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;

    assert!(gateway.internet_url("", Area::Workspace, None).is_err());
    assert!(gateway.internet_url("a/../b", Area::Vault, None).is_err());
}

#[tokio::test]
async fn test_clones_share_locks_and_key() {
    let tmp = TempDir::new().unwrap();
    let gateway = gateway(&tmp).await;
    let clone = gateway.clone();

    let token = gateway.issue_token("x.txt");
    assert!(clone.validate_token("x.txt", &token));
    assert!(std::ptr::eq(
        gateway.storage(Area::Workspace).locks(),
        clone.storage(Area::Workspace).locks()
    ));
}
