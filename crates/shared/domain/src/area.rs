use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Which storage root an operation targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    /// Public files, downloadable by anyone who knows the path.
    #[default]
    Workspace,
    /// Private files, downloadable only with a valid token.
    Vault,
}

impl Area {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Vault => "vault",
        }
    }

    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, Self::Vault)
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Area {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "workspace" | "public" => Ok(Self::Workspace),
            "vault" | "private" => Ok(Self::Vault),
            other => Err(format!("unknown storage area: {other}")),
        }
    }
}
