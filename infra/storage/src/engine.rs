//! Core storage handle: sandboxed resolution and collision-safe saves.
//!
//! [`Storage`] owns one canonical root and a handle to a [`LockRegistry`]. Every path it
//! touches goes through the sandbox first, and every save reserves its final file name
//! under the lock of the target directory before any bytes are written.

use crate::builder::StorageBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::locks::LockRegistry;
use crate::security;
use std::ffi::{OsStr, OsString};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

/// Prepended to a file name each time the candidate is already taken.
const COLLISION_PREFIX: &str = "_";

/// The internal shared state of a [`Storage`] instance.
#[derive(Debug)]
pub struct StorageInner {
    /// The canonicalized physical path on the disk where all data is stored.
    pub(crate) root: PathBuf,
    pub(crate) locks: LockRegistry,
}

/// A thread-safe handle to a sandboxed storage root.
///
/// This handle is internally reference-counted (`Arc`) and can be cheaply cloned
/// across threads or tasks.
///
/// # Example
///
/// ```rust
/// use sbox_storage::{Storage, StorageError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     # let root = tmp.path().join("data");
///     let storage = Storage::builder().root(&root).connect().await?;
///
///     let first = storage.save("docs/a.txt", &mut &b"one"[..]).await?;
///     let second = storage.save("docs/a.txt", &mut &b"two"[..]).await?;
///
///     assert_eq!(first, "docs/a.txt");
///     assert_eq!(second, "docs/_a.txt");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Storage {
    #[must_use = "The storage is not initialized until you call .connect()"]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    /// The canonical root every resolved path is confined to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// Resolves an untrusted logical path to a physical path within the storage root.
    ///
    /// 1. Rooted paths, drive prefixes and any `..` segment are rejected outright.
    /// 2. The path is joined to the root and canonicalized. For paths that do not exist
    ///    yet, the deepest existing ancestor is canonicalized instead.
    /// 3. The canonical form must still lie under the root, compared component by
    ///    component and ignoring case.
    ///
    /// The returned path is the lexical join, not the canonical form: a symlink inside
    /// the root is named as the link, never as its target.
    ///
    /// Only metadata is read; nothing is created.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] if the path tries to escape the sandbox.
    /// Returns [`StorageError::Io`] if the path or its parent cannot be verified on the filesystem.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        security::resolve_path(&self.root, path)
    }

    /// Saves the content of `reader` under `path` without ever overwriting an existing file.
    ///
    /// While a file with the requested name exists in the target directory, `_` is
    /// prepended to the name. The winning name is reserved by creating an empty
    /// placeholder while holding the directory lock; the content is streamed into it
    /// after the lock is released, so slow uploads never block other writers.
    ///
    /// Returns the final logical path relative to the root, with `/` separators.
    ///
    /// # Limitations
    ///
    /// - The reserved file is visible with zero length until streaming completes.
    /// - Dropping the returned future after the reservation leaves the placeholder on disk.
    /// - On a streaming failure the partially written file is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] before any I/O if the path escapes
    /// the sandbox. Returns [`StorageError::FileNotFound`] if the path names the root itself.
    /// Returns [`StorageError::Io`] if the directory, the placeholder or the content
    /// cannot be written.
    pub async fn save<R>(&self, path: impl AsRef<Path>, reader: &mut R) -> Result<String, StorageError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let resolved = self.resolve(path)?;

        let (Some(directory), Some(file_name)) = (resolved.parent(), resolved.file_name()) else {
            return Err(not_a_file(&resolved));
        };
        if resolved == self.root {
            return Err(not_a_file(&resolved));
        }

        fs::create_dir_all(directory)
            .await
            .context(format!("Failed to create directory {}", directory.display()))?;

        let reserved = {
            let _guard = self.locks.acquire(directory).await;
            reserve_name(directory, file_name).await?
        };
        debug!(path = %reserved.display(), "File name reserved");

        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&reserved)
            .await
            .context(format!("Failed to open reserved file {}", reserved.display()))?;
        let written = tokio::io::copy(reader, &mut file)
            .await
            .context(format!("Failed to stream content into {}", reserved.display()))?;
        file.flush().await.context("Flush failed")?;
        file.sync_all().await.context("Hardware sync failed")?;

        let logical = self.logical_path(&reserved)?;
        debug!(path = %logical, bytes = written, "File saved");
        Ok(logical)
    }

    /// Opens an existing file inside the sandbox for reading.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] if the path escapes the sandbox.
    /// Returns [`StorageError::FileNotFound`] if the target does not exist.
    /// Returns [`StorageError::Io`] for any other open failure.
    pub async fn open(&self, path: impl AsRef<Path>) -> Result<fs::File, StorageError> {
        let resolved = self.resolve(path)?;
        match fs::File::open(&resolved).await {
            Ok(file) => Ok(file),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::FileNotFound {
                    message: resolved.display().to_string().into(),
                    context: None,
                })
            },
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Open failed: {}", resolved.display()).into()),
            }),
        }
    }

    /// Checks if a file exists within the storage sandbox.
    ///
    /// # Errors
    ///
    /// Returns an `Err` only if path resolution fails.
    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        let resolved = self.resolve(path)?;
        Ok(resolved.exists())
    }

    /// # Errors
    ///
    /// Returns [`StorageError::FileNotFound`] if the target does not exist.
    /// Returns [`StorageError::Io`] if a hardware or permission error occurs.
    pub async fn metadata(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<std::fs::Metadata, StorageError> {
        let resolved = self.resolve(path)?;
        match fs::metadata(&resolved).await {
            Ok(meta) => Ok(meta),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::FileNotFound {
                    message: resolved.display().to_string().into(),
                    context: None,
                })
            },
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to get metadata: {}", resolved.display()).into()),
            }),
        }
    }

    /// Converts a physical path under the root back into its `/`-separated logical form.
    fn logical_path(&self, physical: &Path) -> Result<String, StorageError> {
        let relative = physical.strip_prefix(&self.root).map_err(|_| {
            warn!(path = %physical.display(), "Reserved path lies outside the root");
            StorageError::traversal(
                physical.display().to_string(),
                "Reserved path is outside sandbox boundaries",
            )
        })?;

        let segments: Vec<_> =
            relative.components().map(|c| c.as_os_str().to_string_lossy()).collect();
        Ok(segments.join("/"))
    }
}

/// Finds the first free name in `directory`, prefixing `file_name` until nothing is there.
///
/// Must run under the directory lock. `create_new` guards against files created by
/// other processes between the existence check and the placeholder creation.
async fn reserve_name(directory: &Path, file_name: &OsStr) -> Result<PathBuf, StorageError> {
    let mut name = file_name.to_os_string();

    loop {
        let candidate = directory.join(&name);

        let taken = fs::try_exists(&candidate)
            .await
            .context(format!("Failed to probe {}", candidate.display()))?;

        if !taken {
            match fs::OpenOptions::new().write(true).create_new(true).open(&candidate).await {
                Ok(_) => return Ok(candidate),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {},
                Err(err) => {
                    return Err(StorageError::Io {
                        source: err,
                        context: Some(
                            format!("Failed to reserve {}", candidate.display()).into(),
                        ),
                    });
                },
            }
        }

        let mut prefixed = OsString::from(COLLISION_PREFIX);
        prefixed.push(&name);
        name = prefixed;
    }
}

fn not_a_file(path: &Path) -> StorageError {
    StorageError::FileNotFound {
        message: path.display().to_string().into(),
        context: Some("Target must name a file".into()),
    }
}
