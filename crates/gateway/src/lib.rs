//! Facade over the Strongbox storage and token crates.
//! Upload and download handlers talk to [`FileGateway`] only; it composes the public
//! *workspace* root, the private *vault* root, one shared directory lock registry and the
//! download token codec.
//!
//! Keep this crate thin: path rules live in `sbox-storage`, token rules in `sbox-token`.
//!
//! ```rust
//! use sbox_gateway::{Area, FileGateway, GatewayError};
//! use sbox_gateway::domain::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GatewayError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     let mut config = AppConfig::default();
//!     config.storage.path = tmp.path().to_path_buf();
//!     config.storage.key = Some("server-secret".to_owned());
//!
//!     let gateway = FileGateway::connect(&config).await?;
//!
//!     let saved = gateway.save("reports/q1.pdf", &mut &b"%PDF"[..], Area::Vault).await?;
//!     let token = gateway.issue_token(&saved);
//!     assert!(gateway.validate_token(&saved, &token));
//!     Ok(())
//! }
//! ```

mod error;
mod paths;

pub use error::{GatewayError, GatewayErrorExt};
pub use paths::upload_path;
pub use sbox_domain as domain;
pub use sbox_domain::area::Area;
pub use sbox_storage as storage;
pub use sbox_token as token;
pub use url::Url;

use chrono::Utc;
use sbox_domain::config::AppConfig;
use sbox_storage::{LockRegistry, Storage};
use sbox_token::{TokenCodec, TokenError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{info, warn};

#[derive(Debug)]
struct GatewayInner {
    workspace: Storage,
    vault: Storage,
    tokens: TokenCodec,
}

/// The operation set consumed by upload and download handlers.
///
/// Cheap to clone; every clone shares the same roots, locks and key.
#[derive(Debug, Clone)]
pub struct FileGateway {
    inner: Arc<GatewayInner>,
}

impl FileGateway {
    /// Builds the gateway from configuration.
    ///
    /// The signing key is checked first, so a missing `storage.key` fails startup before
    /// any directory is touched. Both roots are then created if needed, canonicalized, and
    /// given one shared [`LockRegistry`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Token`] if `storage.key` is missing or empty, or the TTL is
    /// zero. Returns [`GatewayError::Storage`] if a root cannot be created or resolved.
    pub async fn connect(config: &AppConfig) -> Result<Self, GatewayError> {
        let key = config.storage.key.as_deref().ok_or_else(TokenError::missing_secret)?;
        let tokens = TokenCodec::builder().secret(key).ttl(config.token.ttl()).build()?;

        let locks = LockRegistry::new();
        let workspace = Storage::builder()
            .root(config.storage.workspace_root())
            .locks(locks.clone())
            .connect()
            .await
            .context("Failed to open workspace root")?;
        let vault = Storage::builder()
            .root(config.storage.vault_root())
            .locks(locks)
            .connect()
            .await
            .context("Failed to open vault root")?;

        info!(
            workspace = %workspace.root().display(),
            vault = %vault.root().display(),
            "File gateway ready"
        );

        Ok(Self::new(workspace, vault, tokens))
    }

    /// Assembles a gateway from already opened parts.
    #[must_use]
    pub fn new(workspace: Storage, vault: Storage, tokens: TokenCodec) -> Self {
        Self { inner: Arc::new(GatewayInner { workspace, vault, tokens }) }
    }

    #[must_use]
    pub fn storage(&self, area: Area) -> &Storage {
        match area {
            Area::Workspace => &self.inner.workspace,
            Area::Vault => &self.inner.vault,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenCodec {
        &self.inner.tokens
    }

    /// Saves `reader` at `logical_path` in `area` without overwriting anything.
    ///
    /// Returns the final logical path, which gains `_` prefixes on name collisions.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on traversal attempts or filesystem failures.
    pub async fn save<R>(
        &self,
        logical_path: &str,
        reader: &mut R,
        area: Area,
    ) -> Result<String, GatewayError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        Ok(self.storage(area).save(logical_path, reader).await?)
    }

    /// Saves an uploaded file under `subfolder/YYYY/MM/DD/file_name` (today, UTC).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] for a malformed subfolder or file name, and
    /// otherwise the same errors as [`Self::save`].
    pub async fn upload<R>(
        &self,
        subfolder: &str,
        file_name: &str,
        reader: &mut R,
        area: Area,
    ) -> Result<String, GatewayError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let path = upload_path(subfolder, file_name, Utc::now())?;
        self.save(&path, reader, area).await
    }

    /// Resolves a logical path to its physical location inside `area`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] if the path escapes the root.
    pub fn physical_path(&self, logical_path: &str, area: Area) -> Result<PathBuf, GatewayError> {
        Ok(self.storage(area).resolve(logical_path)?)
    }

    /// Issues a download token for `authorized_path` with the configured lifetime.
    ///
    /// The token also authorizes every path that starts with `authorized_path`.
    #[must_use]
    pub fn issue_token(&self, authorized_path: &str) -> String {
        self.inner.tokens.issue_default(authorized_path)
    }

    #[must_use]
    pub fn validate_token(&self, requested_path: &str, token: &str) -> bool {
        self.inner.tokens.validate(requested_path, token)
    }

    /// Opens a vault file after checking `token` against `requested_path`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] for any token failure, without saying which.
    /// Returns [`GatewayError::Storage`] if the path escapes the vault or does not exist.
    pub async fn open_private(
        &self,
        requested_path: &str,
        token: &str,
    ) -> Result<tokio::fs::File, GatewayError> {
        if !self.validate_token(requested_path, token) {
            warn!(path = requested_path, "Private download refused");
            return Err(GatewayError::Unauthorized {
                message: "invalid or expired download token".into(),
                context: None,
            });
        }

        Ok(self.inner.vault.open(requested_path).await?)
    }

    /// Builds the download URL for a stored file.
    ///
    /// Workspace files map to `/download/<path>`. Vault files map to
    /// `/download-private/<path>?token=<token>` with a freshly issued token. With a `base`,
    /// the URL is absolute on that scheme and host.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] for an empty path, a `.`/`..` segment, or a
    /// base URL that cannot have a path.
    pub fn internet_url(
        &self,
        relative_path: &str,
        area: Area,
        base: Option<&Url>,
    ) -> Result<String, GatewayError> {
        let segments = paths::url_segments(relative_path)?;

        match area {
            Area::Workspace => paths::render_url(paths::PUBLIC_ROUTE, &segments, None, base),
            Area::Vault => {
                let token = self.issue_token(&segments.join("/"));
                paths::render_url(paths::PRIVATE_ROUTE, &segments, Some(&token), base)
            },
        }
    }

    /// The canonical root of `area`.
    #[must_use]
    pub fn root(&self, area: Area) -> &Path {
        self.storage(area).root()
    }
}
