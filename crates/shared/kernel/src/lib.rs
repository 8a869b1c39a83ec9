//! Kernel utilities shared across applications.
//! Keep this crate lightweight; it re-exports the domain models and the layered config loader.
//!
//! ## Config loading
//! ```rust,no_run
//! use sbox_kernel::config::load_config;
//! use sbox_kernel::domain::config::AppConfig;
//!
//! let cfg: AppConfig = load_config(Some("strongbox.toml")).unwrap();
//! assert_eq!(cfg.storage.workspace_dir, "workspace");
//! ```
pub mod config;

pub use sbox_domain as domain;
