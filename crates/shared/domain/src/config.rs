use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub storage: StorageConfig,
    pub token: TokenConfig,
    pub log: LogConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Storage roots and the download-token signing secret.
///
/// `key` has no default on purpose: a missing key must stop the gateway from starting.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub workspace_dir: String,
    pub vault_dir: String,
    pub key: Option<String>,
}

impl StorageConfig {
    /// Root of publicly downloadable files.
    #[must_use]
    pub fn workspace_root(&self) -> PathBuf {
        self.path.join(&self.workspace_dir)
    }

    /// Root of private files served only with a download token.
    #[must_use]
    pub fn vault_root(&self) -> PathBuf {
        self.path.join(&self.vault_dir)
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("path", &self.path)
            .field("workspace_dir", &self.workspace_dir)
            .field("vault_dir", &self.vault_dir)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub ttl_seconds: u64,
}

impl TokenConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub path: Option<PathBuf>,
    pub json: bool,
}

// --- Default ---

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            workspace_dir: "workspace".to_owned(),
            vault_dir: "vault".to_owned(),
            key: None,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self { ttl_seconds: 60 * 60 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), path: None, json: false }
    }
}
