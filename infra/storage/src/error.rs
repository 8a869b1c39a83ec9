use std::borrow::Cow;

/// A specialized [`StorageError`] enum of this crate.
#[sbox_derive::sbox_error]
pub enum StorageError {
    #[error("Directory not found{}: {message}", format_context(.context))]
    DirectoryNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("File not found{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The logical path is absolute, contains `..`, or resolves outside the root.
    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Disk full, permission denied, name too long after collision prefixing, etc.
    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

impl StorageError {
    pub(crate) fn traversal(
        message: impl Into<Cow<'static, str>>,
        context: &'static str,
    ) -> Self {
        Self::PathTraversalAttempt { message: message.into(), context: Some(context.into()) }
    }

    /// Returns `true` for errors caused by untrusted input rather than the host.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::PathTraversalAttempt { .. } | Self::FileNotFound { .. })
    }
}
