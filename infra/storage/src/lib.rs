//! Sandboxed storage roots with collision-safe, concurrent uploads.
//!
//! # Core Features
//!
//! - **Sandbox Security**: Untrusted logical paths are rejected if they are absolute or
//!   contain `..`, and the canonical result must stay under the root.
//! - **Directory Locks**: A shared [`LockRegistry`] hands out one async lock per directory,
//!   so only writers targeting the same directory contend.
//! - **Collision-Safe Saves**: Existing files are never overwritten. A taken name gets a
//!   `_` prefix until a free one is found, and the winner is reserved under the lock.
//!
//! # Examples
//!
//! ```rust
//! use sbox_storage::{LockRegistry, Storage, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     let locks = LockRegistry::new();
//!     let public = Storage::builder()
//!         .root(tmp.path().join("workspace"))
//!         .locks(locks.clone())
//!         .connect()
//!         .await?;
//!
//!     let saved = public.save("uploads/2024/05/01/a.txt", &mut &b"hello"[..]).await?;
//!     assert_eq!(saved, "uploads/2024/05/01/a.txt");
//!
//!     assert!(public.resolve("../outside.txt").is_err());
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;
mod error;
mod locks;
mod security;

pub use builder::StorageBuilder;
pub use engine::Storage;
pub use error::{StorageError, StorageErrorExt};
pub use locks::{DirectoryGuard, LockRegistry};
