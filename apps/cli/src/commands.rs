//! Subcommand handlers. Each returns the line printed on stdout.

use crate::args::Commands;
use anyhow::{Context, Result, bail};
use sbox_gateway::{Area, FileGateway, Url};
use std::path::Path;
use tracing::info;

/// Runs one subcommand against `gateway`.
///
/// # Errors
///
/// Propagates gateway failures; `verify` fails when the token is rejected.
pub async fn dispatch(gateway: &FileGateway, command: Commands) -> Result<String> {
    match command {
        Commands::Put { source, path, subfolder, area } => {
            put(gateway, &source, path.as_deref(), subfolder.as_deref(), area).await
        },
        Commands::Resolve { path, area } => {
            Ok(gateway.physical_path(&path, area)?.display().to_string())
        },
        Commands::Token { path } => Ok(gateway.issue_token(&path)),
        Commands::Verify { path, token } => verify(gateway, &path, &token),
        Commands::Url { path, area, base } => url(gateway, &path, area, base.as_ref()),
    }
}

async fn put(
    gateway: &FileGateway,
    source: &Path,
    path: Option<&str>,
    subfolder: Option<&str>,
    area: Area,
) -> Result<String> {
    let mut file = tokio::fs::File::open(source)
        .await
        .with_context(|| format!("Cannot open {}", source.display()))?;

    let saved = match (path, subfolder) {
        (Some(path), _) => gateway.save(path, &mut file, area).await?,
        (None, Some(subfolder)) => {
            let name = source
                .file_name()
                .and_then(|n| n.to_str())
                .context("Source file name is not valid UTF-8")?;
            gateway.upload(subfolder, name, &mut file, area).await?
        },
        (None, None) => bail!("Either --path or --subfolder is required"),
    };

    info!(%area, path = %saved, "Stored file");
    Ok(saved)
}

fn verify(gateway: &FileGateway, path: &str, token: &str) -> Result<String> {
    if !gateway.validate_token(path, token) {
        bail!("Token rejected for {path}");
    }
    Ok("valid".to_owned())
}

fn url(gateway: &FileGateway, path: &str, area: Area, base: Option<&Url>) -> Result<String> {
    Ok(gateway.internet_url(path, area, base)?)
}
