//! Per-directory asynchronous locks used to serialize file name reservation.

use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// A shared registry mapping a normalized directory path to its exclusive lock.
///
/// Entries are created lazily on first request and are never removed, so the map grows
/// with the number of distinct directories ever written to, not with request volume.
///
/// The registry is a cheap, cloneable handle. Every [`crate::Storage`] built with the same
/// registry serializes name reservation against the others.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    locks: Arc<Mutex<FxHashMap<PathBuf, Arc<AsyncMutex<()>>>>>,
}

impl LockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `directory`, creating it if this is the first request.
    ///
    /// Get-or-create happens under a single map lock, so concurrent first requesters
    /// always receive the same instance.
    pub fn get(&self, directory: impl AsRef<Path>) -> Arc<AsyncMutex<()>> {
        let key = normalize_key(directory.as_ref());
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key).or_default())
    }

    /// Waits for exclusive access to `directory` without blocking the runtime thread.
    pub async fn acquire(&self, directory: impl AsRef<Path>) -> DirectoryGuard {
        let directory = directory.as_ref();
        let guard = self.get(directory).lock_owned().await;
        trace!(directory = %directory.display(), "Directory lock acquired");
        DirectoryGuard { _guard: guard }
    }

    /// Number of distinct directories that have been locked so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// Holds a directory lock until dropped.
#[must_use = "The directory is unlocked as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DirectoryGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Keys are normalized lexically and are not case-folded, even though sandbox containment
/// ignores case. On a case-insensitive filesystem `Uploads/` and `uploads/` (or a symlinked
/// alias of a directory) get separate locks, so reservation into them is not strictly
/// serialized. No overwrite can follow from that: `create_new` still refuses a taken name
/// and the writer moves on to the next prefix.
fn normalize_key(directory: &Path) -> PathBuf {
    directory.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn same_directory_yields_same_lock() {
        let registry = LockRegistry::new();
        let a = registry.get("/srv/data/uploads");
        let b = registry.get("/srv/data/./uploads/");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_directories_yield_distinct_locks() {
        let registry = LockRegistry::new();
        let a = registry.get("/srv/data/a");
        let b = registry.get("/srv/data/b");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clones_share_the_same_map() {
        let registry = LockRegistry::new();
        let clone = registry.clone();
        let a = registry.get("/srv/shared");
        let b = clone.get("/srv/shared");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_requesters_share_one_lock() {
        let registry = LockRegistry::new();
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get("/srv/race") })
            })
            .collect();

        let mut locks = Vec::new();
        for handle in handles {
            locks.push(handle.await.unwrap());
        }

        assert!(locks.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn other_directories_do_not_wait() {
        let registry = LockRegistry::new();
        let _held = registry.acquire("/srv/busy").await;

        let other = tokio::time::timeout(Duration::from_millis(200), registry.acquire("/srv/idle"))
            .await;
        assert!(other.is_ok(), "unrelated directory must not contend");

        let same = tokio::time::timeout(Duration::from_millis(50), registry.acquire("/srv/busy"))
            .await;
        assert!(same.is_err(), "same directory must wait for the holder");
    }
}
