use crate::engine::{Storage, StorageInner};
use crate::error::{StorageError, StorageErrorExt};
use crate::locks::LockRegistry;
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone)]
struct StorageConfig {
    create: bool,
    locks: Option<LockRegistry>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { create: true, locks: None }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct StorageBuilder<S: Sealed = NoRoot> {
    state: S,
    config: StorageConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> StorageBuilder<S> {
    #[must_use = "Sets whether the storage root should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    /// Shares a lock registry with other storages.
    ///
    /// Without this, the storage gets a private registry of its own.
    #[must_use = "Sets the directory lock registry used for name reservation"]
    pub fn locks(mut self, registry: LockRegistry) -> Self {
        self.config.locks = Some(registry);
        self
    }

    fn transition<N: Sealed>(self, state: N) -> StorageBuilder<N> {
        StorageBuilder { state, config: self.config }
    }
}

impl StorageBuilder<NoRoot> {
    #[must_use = "Creates a new storage builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory path for the storage"]
    pub fn root(self, path: impl Into<PathBuf>) -> StorageBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl StorageBuilder<WithRoot> {
    /// Consumes the configuration and opens the storage root.
    ///
    /// The root is created when `create(true)` is set (the default) and then canonicalized,
    /// so every later containment check compares against the physical location on disk.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DirectoryNotFound`] if the root does not exist and `create`
    /// is false. Returns [`StorageError::Io`] if the root cannot be created or resolved.
    pub async fn connect(self) -> Result<Storage, StorageError> {
        let root = &self.state.0;

        if self.config.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
            info!(path = %root.display(), "Bootstrapped storage root directory");
        }

        let canonical = match fs::canonicalize(root).await {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::DirectoryNotFound {
                    message: root.display().to_string().into(),
                    context: Some("Storage root does not exist".into()),
                });
            },
            Err(e) => {
                return Err(StorageError::Io {
                    source: e,
                    context: Some(
                        format!("Failed to resolve storage root: {}", root.display()).into(),
                    ),
                });
            },
        };

        Ok(Storage {
            inner: Arc::new(StorageInner {
                root: canonical,
                locks: self.config.locks.unwrap_or_default(),
            }),
        })
    }
}
