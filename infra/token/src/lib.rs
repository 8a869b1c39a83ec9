//! Stateless, time-boxed download tokens signed with HMAC-SHA256.
//!
//! A token binds an authorized path to an absolute expiry and is verified purely by
//! recomputing its signature, so no token store is needed. The flip side: tokens cannot
//! be revoked, only left to expire.
//!
//! - The signing secret is mandatory. An empty secret fails [`TokenCodecBuilder::build`].
//! - Signature comparison is constant-time.
//! - [`TokenCodec::validate`] never errors; every failure is a plain `false`.
//!
//! ```rust
//! use sbox_token::TokenCodec;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), sbox_token::TokenError> {
//! let codec = TokenCodec::builder()
//!     .secret("server-secret")
//!     .ttl(Duration::from_secs(15 * 60))
//!     .build()?;
//!
//! let token = codec.issue_default("vault/invoices/2024-05.pdf");
//! assert!(codec.validate("vault/invoices/2024-05.pdf", &token));
//! assert!(!codec.validate("vault/invoices/2024-05.pdf", "garbage"));
//! # Ok(())
//! # }
//! ```

mod builder;
mod codec;
mod error;

pub use builder::TokenCodecBuilder;
pub use codec::TokenCodec;
pub use error::{TokenError, TokenErrorExt};
