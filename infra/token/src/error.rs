use std::borrow::Cow;

/// A specialized [`TokenError`] enum for token codec construction.
///
/// Validation never produces one of these; an invalid token is simply rejected.
#[sbox_derive::sbox_error]
pub enum TokenError {
    /// The signing secret is missing or empty.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl TokenError {
    /// The error returned when no usable secret is configured.
    #[must_use]
    pub const fn missing_secret() -> Self {
        Self::InvalidConfiguration {
            message: Cow::Borrowed("download token secret is not configured"),
            context: None,
        }
    }
}
