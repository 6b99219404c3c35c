//! Album shortcodes and file identifiers

use crate::error::{Error, Result};
use reqwest::Url;

/// Return the album shortcode (final path segment) of an album URL.
///
/// Pure string handling, no request is made.
pub fn extract_shortcode(album_url: &str) -> Result<String> {
    let url = Url::parse(album_url.trim())
        .map_err(|e| Error::InvalidArgument(format!("Not a valid URL '{}': {}", album_url, e)))?;

    last_segment(&url).ok_or_else(|| {
        Error::InvalidArgument(format!("URL has no path segment: {}", album_url))
    })
}

/// Check a bare shortcode before it is sent as the `short` field
pub fn validate_shortcode(shortcode: &str) -> Result<&str> {
    let shortcode = shortcode.trim();
    if shortcode.is_empty() {
        return Err(Error::InvalidArgument("Album shortcode cannot be empty".to_string()));
    }
    if !is_bare_identifier(shortcode) {
        return Err(Error::InvalidArgument(format!(
            "'{}' is not an album shortcode (use extract_shortcode for album URLs)",
            shortcode
        )));
    }
    Ok(shortcode)
}

/// Resolve an album given either as a bare shortcode or as a URL under
/// `album_prefix` (`https://catbox.moe/c`). URLs elsewhere are rejected.
pub fn album_shortcode(album: &str, album_prefix: &str) -> Result<String> {
    let album = album.trim();
    if !album.contains("://") {
        return validate_shortcode(album).map(|s| s.to_string());
    }

    let prefix = Url::parse(album_prefix).map_err(|e| {
        Error::InvalidArgument(format!("Invalid album prefix '{}': {}", album_prefix, e))
    })?;
    let url = Url::parse(album)
        .map_err(|e| Error::InvalidArgument(format!("Not a valid URL '{}': {}", album, e)))?;

    let base = prefix.path().trim_end_matches('/');
    let under_prefix = url.host_str() == prefix.host_str()
        && url
            .path()
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'));
    if !under_prefix {
        return Err(Error::InvalidArgument(format!(
            "'{}' is not an album URL under {}",
            album, album_prefix
        )));
    }

    extract_shortcode(album)
}

/// Reduce a list of uploaded files to the identifiers the album and delete
/// endpoints expect, joined by single spaces.
///
/// Accepts bare identifiers (`abc123.png`) and URLs on `file_host`
/// (`https://files.catbox.moe/abc123.png`). URLs on any other host are
/// rejected rather than silently truncated.
pub fn file_identifiers<S: AsRef<str>>(files: &[S], file_host: &str) -> Result<String> {
    let file_host = Url::parse(file_host)
        .map_err(|e| Error::InvalidArgument(format!("Invalid file host '{}': {}", file_host, e)))?;

    let identifiers = files
        .iter()
        .map(|f| file_identifier(f.as_ref(), &file_host))
        .collect::<Result<Vec<_>>>()?;

    Ok(identifiers.join(" "))
}

fn file_identifier(file: &str, file_host: &Url) -> Result<String> {
    let file = file.trim();
    if file.is_empty() {
        return Err(Error::InvalidArgument("File identifier cannot be empty".to_string()));
    }

    if file.contains("://") {
        let url = Url::parse(file)
            .map_err(|e| Error::InvalidArgument(format!("Not a valid URL '{}': {}", file, e)))?;

        if url.host_str() != file_host.host_str() {
            return Err(Error::InvalidArgument(format!(
                "'{}' is not a file URL on {}",
                file,
                file_host.host_str().unwrap_or_default()
            )));
        }

        return last_segment(&url).ok_or_else(|| {
            Error::InvalidArgument(format!("File URL has no file name: {}", file))
        });
    }

    if !is_bare_identifier(file) {
        return Err(Error::InvalidArgument(format!(
            "'{}' is neither a file name nor a file URL",
            file
        )));
    }

    Ok(file.to_string())
}

fn last_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}

fn is_bare_identifier(s: &str) -> bool {
    !s.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\')
}
