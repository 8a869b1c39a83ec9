use crate::codec::{DEFAULT_TTL, TokenCodec, TokenCodecInner};
use crate::error::TokenError;
use private::Sealed;
use ring::hmac;
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroizing;

#[derive(Debug, Default)]
pub struct NoSecret;
pub struct WithSecret(Zeroizing<Vec<u8>>);

impl std::fmt::Debug for WithSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WithSecret(<redacted>)")
    }
}

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoSecret {}
impl Sealed for WithSecret {}

/// A builder for [`TokenCodec`].
///
/// The raw secret is held in a [`Zeroizing`] buffer and wiped as soon as the builder is
/// consumed or dropped; afterwards it only lives inside the HMAC key.
#[allow(private_bounds)]
#[derive(Debug)]
pub struct TokenCodecBuilder<S: Sealed = NoSecret> {
    state: S,
    ttl: Duration,
}

impl Default for TokenCodecBuilder {
    fn default() -> Self {
        Self { state: NoSecret, ttl: DEFAULT_TTL }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> TokenCodecBuilder<S> {
    /// Lifetime of tokens issued through [`TokenCodec::issue_default`].
    #[must_use]
    pub const fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl TokenCodecBuilder<NoSecret> {
    #[must_use = "Builder must be configured with `secret` before use"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the HMAC signing secret"]
    pub fn secret(self, secret: impl AsRef<[u8]>) -> TokenCodecBuilder<WithSecret> {
        TokenCodecBuilder {
            state: WithSecret(Zeroizing::new(secret.as_ref().to_vec())),
            ttl: self.ttl,
        }
    }
}

impl TokenCodecBuilder<WithSecret> {
    /// Derives the HMAC-SHA256 key and finalizes the codec.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidConfiguration`] if the secret is empty or the TTL is zero.
    pub fn build(self) -> Result<TokenCodec, TokenError> {
        if self.state.0.is_empty() {
            return Err(TokenError::missing_secret());
        }
        if self.ttl.is_zero() {
            return Err(TokenError::InvalidConfiguration {
                message: "token TTL must be positive".into(),
                context: None,
            });
        }

        let key = hmac::Key::new(hmac::HMAC_SHA256, &self.state.0);

        Ok(TokenCodec { inner: Arc::new(TokenCodecInner { key, ttl: self.ttl }) })
    }
}
