//! Issuing and validating signed download tokens.
//!
//! Wire format, before base64 (standard alphabet, padded):
//!
//! ```text
//! <authorized path>|<expiry, unix seconds>|<HEX-UPPER HMAC-SHA256 of "<path>|<expiry>">
//! ```
//!
//! The path itself may contain `|`; parsing always takes the last two fields as expiry
//! and signature.

use crate::builder::TokenCodecBuilder;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use ring::hmac;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tracing::debug;

pub(crate) const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
const SEPARATOR: char = '|';

#[derive(Debug)]
pub struct TokenCodecInner {
    pub(crate) key: hmac::Key,
    pub(crate) ttl: Duration,
}

/// Signs and verifies stateless, time-boxed download tokens.
///
/// Tokens are bearer credentials: anyone holding one can download until it expires.
/// There is no revocation.
///
/// # Prefix authorization
///
/// A token authorizes every requested path that *starts with* its authorized path,
/// ignoring case. A token for `secret/report.pdf` therefore also opens
/// `secret/report.pdf.bak`, and a token for `secret/` opens the whole directory.
///
/// # Example
///
/// ```rust
/// use sbox_token::TokenCodec;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), sbox_token::TokenError> {
/// let codec = TokenCodec::builder().secret("server-secret").build()?;
///
/// let token = codec.issue("secret/report.pdf", Duration::from_secs(60));
/// assert!(codec.validate("secret/report.pdf", &token));
/// assert!(!codec.validate("secret/other.pdf", &token));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenCodec {
    pub(crate) inner: Arc<TokenCodecInner>,
}

impl Deref for TokenCodec {
    type Target = TokenCodecInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl TokenCodec {
    #[must_use = "The codec is not usable until you call .build()"]
    pub fn builder() -> TokenCodecBuilder {
        TokenCodecBuilder::new()
    }

    /// The lifetime applied by [`Self::issue_default`].
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Issues a token for `authorized_path` that expires `ttl` from now.
    #[must_use]
    pub fn issue(&self, authorized_path: &str, ttl: Duration) -> String {
        self.issue_at(authorized_path, ttl, Utc::now())
    }

    /// Issues a token with the configured default lifetime.
    #[must_use]
    pub fn issue_default(&self, authorized_path: &str) -> String {
        self.issue(authorized_path, self.inner.ttl)
    }

    /// Issues a token as if the current time were `now`.
    #[must_use]
    pub fn issue_at(&self, authorized_path: &str, ttl: Duration, now: DateTime<Utc>) -> String {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expiry = now.timestamp().saturating_add(ttl);

        let payload = format!("{authorized_path}{SEPARATOR}{expiry}");
        let signature = self.sign(&payload);

        STANDARD.encode(format!("{payload}{SEPARATOR}{signature}"))
    }

    /// Returns `true` only if `token` is well-formed, unexpired, correctly signed and
    /// authorizes `requested_path`.
    ///
    /// Every failure collapses to `false`; the reason is only logged.
    #[must_use]
    pub fn validate(&self, requested_path: &str, token: &str) -> bool {
        self.validate_at(requested_path, token, Utc::now())
    }

    /// Validates `token` as if the current time were `now`.
    #[must_use]
    pub fn validate_at(&self, requested_path: &str, token: &str, now: DateTime<Utc>) -> bool {
        match self.check(requested_path, token, now) {
            Ok(()) => true,
            Err(reason) => {
                debug!(reason, "Download token rejected");
                false
            },
        }
    }

    fn check(&self, requested_path: &str, token: &str, now: DateTime<Utc>) -> Result<(), &'static str> {
        let decoded = STANDARD.decode(token.trim()).map_err(|_| "not base64")?;
        let decoded = String::from_utf8(decoded).map_err(|_| "not utf-8")?;

        let mut fields = decoded.rsplitn(3, SEPARATOR);
        let (Some(signature), Some(expiry), Some(authorized_path)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err("too few fields");
        };

        let expires_at: i64 = expiry.parse().map_err(|_| "malformed expiry")?;
        if now.timestamp() > expires_at {
            return Err("expired");
        }

        let expected = self.sign(&format!("{authorized_path}{SEPARATOR}{expiry}"));
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return Err("signature mismatch");
        }

        if !starts_with_ignore_case(requested_path, authorized_path) {
            return Err("path not authorized");
        }

        Ok(())
    }

    fn sign(&self, payload: &str) -> String {
        let tag = hmac::sign(&self.inner.key, payload.as_bytes());
        hex::encode_upper(tag.as_ref())
    }
}

fn starts_with_ignore_case(path: &str, prefix: &str) -> bool {
    path.to_lowercase().starts_with(&prefix.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn codec() -> TokenCodec {
        TokenCodec::builder().secret("unit-test-secret").build().unwrap()
    }

    fn decode(token: &str) -> String {
        String::from_utf8(STANDARD.decode(token).unwrap()).unwrap()
    }

    #[test]
    fn token_layout_is_path_expiry_signature() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = codec().issue_at("a/b.pdf", Duration::from_secs(60), now);

        let decoded = decode(&token);
        let parts: Vec<_> = decoded.split('|').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "a/b.pdf");
        assert_eq!(parts[1], "1700000060");
        assert_eq!(parts[2].len(), 64);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue_at("x", Duration::from_secs(30), now);

        assert!(codec.validate_at("x", &token, now + TimeDelta::seconds(29)));
        assert!(codec.validate_at("x", &token, now + TimeDelta::seconds(30)));
        assert!(!codec.validate_at("x", &token, now + TimeDelta::seconds(31)));
    }

    #[test]
    fn lowercase_signature_is_rejected() {
        let codec = codec();
        let decoded = decode(&codec.issue("doc.pdf", Duration::from_secs(60)));
        let forged = STANDARD.encode(decoded.to_lowercase());

        assert!(!codec.validate("doc.pdf", &forged));
    }

    #[test]
    fn prefix_match_ignores_case() {
        assert!(starts_with_ignore_case("Secret/Report.PDF", "secret/report.pdf"));
        assert!(starts_with_ignore_case("secret/report.pdf.bak", "secret/report.pdf"));
        assert!(!starts_with_ignore_case("secret/rep", "secret/report.pdf"));
    }
}
