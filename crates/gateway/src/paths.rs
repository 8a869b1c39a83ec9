//! Building logical paths and public URLs.

use crate::error::GatewayError;
use chrono::{DateTime, Datelike, Utc};
use url::{Position, Url};

pub(crate) const PUBLIC_ROUTE: &str = "download";
pub(crate) const PRIVATE_ROUTE: &str = "download-private";
const TOKEN_PARAM: &str = "token";

/// Only used to drive the URL serializer when no base is given; never exposed.
const PLACEHOLDER_BASE: &str = "http://localhost/";

/// Builds the date-partitioned upload path `subfolder/YYYY/MM/DD/file_name` in UTC.
///
/// ```
/// # use chrono::{TimeZone, Utc};
/// let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
/// let path = sbox_gateway::upload_path("avatars", "me.png", now).unwrap();
/// assert_eq!(path, "avatars/2024/05/01/me.png");
/// ```
///
/// # Errors
///
/// Returns [`GatewayError::InvalidInput`] if either part is empty, is `.` or `..`, or
/// contains a path separator.
pub fn upload_path(
    subfolder: &str,
    file_name: &str,
    now: DateTime<Utc>,
) -> Result<String, GatewayError> {
    check_segment("subfolder", subfolder)?;
    check_segment("file name", file_name)?;

    Ok(format!(
        "{subfolder}/{:04}/{:02}/{:02}/{file_name}",
        now.year(),
        now.month(),
        now.day()
    ))
}

/// Splits a logical path on `/` and `\`, dropping empty segments.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidInput`] for an empty path or a `.`/`..` segment.
pub(crate) fn url_segments(relative: &str) -> Result<Vec<&str>, GatewayError> {
    let segments: Vec<&str> = relative.split(['/', '\\']).filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return Err(GatewayError::invalid_input("URL path cannot be empty"));
    }
    if segments.iter().any(|s| matches!(*s, "." | "..")) {
        return Err(GatewayError::invalid_input(format!(
            "URL path cannot contain relative segments: {relative}"
        )));
    }

    Ok(segments)
}

/// Renders `/<route>/<segments...>[?token=..]`, absolute when `base` is given.
///
/// Each segment is percent-encoded on its own, so the separators survive as `/`.
/// Only the scheme, host and port of `base` are kept.
pub(crate) fn render_url(
    route: &str,
    segments: &[&str],
    token: Option<&str>,
    base: Option<&Url>,
) -> Result<String, GatewayError> {
    let mut url = match base {
        Some(base) => base.clone(),
        None => Url::parse(PLACEHOLDER_BASE)
            .map_err(|e| GatewayError::invalid_input(e.to_string()))?,
    };

    url.path_segments_mut()
        .map_err(|()| GatewayError::invalid_input("Base URL cannot carry a path"))?
        .clear()
        .push(route)
        .extend(segments);

    url.set_query(None);
    url.set_fragment(None);
    if let Some(token) = token {
        url.query_pairs_mut().append_pair(TOKEN_PARAM, token);
    }

    Ok(match base {
        Some(_) => url.into(),
        None => url[Position::BeforePath..].to_owned(),
    })
}

fn check_segment(kind: &str, value: &str) -> Result<(), GatewayError> {
    if value.is_empty() || matches!(value, "." | "..") || value.contains(['/', '\\']) {
        return Err(GatewayError::invalid_input(format!("Invalid {kind}: {value:?}")));
    }
    Ok(())
}
