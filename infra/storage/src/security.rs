//! The path sandbox: maps untrusted logical paths onto a trusted root.

use crate::error::StorageError;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Lexically normalizes an untrusted relative path.
///
/// `.` segments are dropped. Any `..` segment is rejected outright, even one that would
/// stay inside the root, as are rooted paths and drive/device prefixes.
fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for c in path.components() {
        match c {
            Component::CurDir => {},
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                return Err(StorageError::traversal(
                    path.display().to_string(),
                    "Parent directory segments are not allowed in sandbox",
                ));
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::traversal(
                    path.display().to_string(),
                    "Absolute paths are not allowed in sandbox",
                ));
            },
        }
    }

    Ok(out)
}

/// Resolves `path` against `root` and guarantees the result stays under `root`.
///
/// `root` must already be canonical. Symlinks are followed only for the containment
/// check: existing targets are canonicalized, and for targets that do not exist yet the
/// deepest existing ancestor is. The returned path is always the lexical join of `root`
/// and the normalized `path`, so callers name the entry the user asked for, not a link
/// target.
pub(crate) fn resolve_path(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let path = path.as_ref();

    let relative = normalize_relative(path).inspect_err(|_| {
        warn!(path = %path.display(), "Rejected logical path");
    })?;
    let joined = root.join(relative);

    match joined.canonicalize() {
        Ok(canonical) => validate_canonical(root, &canonical)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => validate_ancestors(root, &joined)?,
        Err(e) => {
            return Err(StorageError::Io {
                source: e,
                context: Some(format!("Failed to canonicalize {}", joined.display()).into()),
            });
        },
    }

    Ok(joined)
}

/// Case-insensitive, component-wise prefix test.
///
/// Component matching keeps `/data/root-evil` from passing as a child of `/data/root`.
pub(crate) fn is_within(root: &Path, candidate: &Path) -> bool {
    let mut candidate = candidate.components();
    root.components().all(|r| {
        candidate.next().is_some_and(|c| eq_ignore_case(r.as_os_str(), c.as_os_str()))
    })
}

/// Case folding applies only when both names are valid UTF-8; anything else must match
/// byte for byte.
fn eq_ignore_case(a: &OsStr, b: &OsStr) -> bool {
    if a == b {
        return true;
    }
    match (a.to_str(), b.to_str()) {
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

fn validate_canonical(root: &Path, canonical: &Path) -> Result<(), StorageError> {
    if is_within(root, canonical) {
        Ok(())
    } else {
        warn!(path = %canonical.display(), "Resolved path escaped the sandbox");
        Err(StorageError::traversal(
            canonical.display().to_string(),
            "Resolved path is a symlink outside sandbox",
        ))
    }
}

/// Validates a path that does not exist yet by canonicalizing its deepest existing ancestor.
fn validate_ancestors(root: &Path, joined: &Path) -> Result<(), StorageError> {
    if !is_within(root, joined) {
        return Err(StorageError::traversal(
            joined.display().to_string(),
            "Path is outside sandbox boundaries",
        ));
    }

    for ancestor in joined.ancestors().skip(1) {
        if ancestor == root {
            return Ok(());
        }
        if !ancestor.exists() {
            continue;
        }

        return match ancestor.canonicalize() {
            Ok(canonical) if is_within(root, &canonical) => Ok(()),
            Ok(canonical) => {
                warn!(path = %canonical.display(), "Existing ancestor escaped the sandbox");
                Err(StorageError::traversal(
                    canonical.display().to_string(),
                    "Existing parent directory is a symlink outside sandbox",
                ))
            },
            Err(e) => Err(StorageError::Io {
                source: e,
                context: Some("Failed to verify parent directory".into()),
            }),
        };
    }

    Err(StorageError::traversal(
        joined.display().to_string(),
        "No valid parent directory found within sandbox",
    ))
}
