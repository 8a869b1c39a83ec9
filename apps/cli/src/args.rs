//! # CLI Argument Definitions
//!
//! Every subcommand maps onto one [`FileGateway`](sbox_gateway::FileGateway) operation.

use clap::{Parser, Subcommand};
use sbox_gateway::{Area, Url};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "strongbox")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Sandboxed file storage with signed download links")]
pub struct Cli {
    /// Configuration file (defaults to `strongbox.*` in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store a local file without overwriting anything, print its final logical path
    Put {
        /// Local file to read
        source: PathBuf,
        /// Logical target path inside the area
        #[arg(long, conflicts_with = "subfolder", required_unless_present = "subfolder")]
        path: Option<String>,
        /// Store under `<subfolder>/YYYY/MM/DD/<file name>` instead
        #[arg(long)]
        subfolder: Option<String>,
        /// Target area: workspace (public) or vault (private)
        #[arg(short, long, default_value_t = Area::Workspace)]
        area: Area,
    },
    /// Print the physical location of a logical path
    Resolve {
        path: String,
        #[arg(short, long, default_value_t = Area::Workspace)]
        area: Area,
    },
    /// Issue a download token for a vault path
    Token { path: String },
    /// Check a download token against a requested path
    Verify { path: String, token: String },
    /// Print the download URL of a stored file
    Url {
        path: String,
        #[arg(short, long, default_value_t = Area::Workspace)]
        area: Area,
        /// Scheme and host to make the URL absolute, e.g. `https://files.example.com`
        #[arg(long)]
        base: Option<Url>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn put_requires_a_target() {
        assert!(Cli::try_parse_from(["strongbox", "put", "a.txt"]).is_err());
        assert!(
            Cli::try_parse_from(["strongbox", "put", "a.txt", "--path", "a", "--subfolder", "b"])
                .is_err()
        );
    }

    #[test]
    fn area_accepts_aliases() {
        let cli = Cli::try_parse_from(["strongbox", "resolve", "a.txt", "-a", "private"]).unwrap();
        assert!(matches!(cli.command, Commands::Resolve { area: Area::Vault, .. }));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["strongbox", "token", "a.pdf", "-c", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
