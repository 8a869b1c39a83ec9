use sbox_storage::StorageError;
use sbox_token::TokenError;
use std::borrow::Cow;

/// Errors surfaced to upload and download handlers.
#[sbox_derive::sbox_error]
pub enum GatewayError {
    #[error("Storage failure{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    /// The token codec could not be built, almost always a missing `storage.key`.
    #[error("Token codec failure{}: {source}", format_context(.context))]
    Token { source: TokenError, context: Option<Cow<'static, str>> },

    /// A private download was attempted without a valid token. Carries no reason.
    #[error("Unauthorized{}: {message}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl GatewayError {
    pub(crate) fn invalid_input(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput { message: message.into(), context: None }
    }

    /// Returns `true` when the caller, not the host, is at fault.
    ///
    /// Handlers map these to 4xx-style responses and everything else to 5xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::Storage { source, .. } => source.is_client_error(),
            Self::Token { .. } => false,
            Self::Unauthorized { .. } | Self::InvalidInput { .. } => true,
        }
    }
}
