//! Identifier extraction for gallery routes
//!
//! The id may come from a trailing path segment (`/api/gallery/5`) or from an
//! `id` query parameter (`/api/gallery?id=5`). The path segment wins when both
//! are present.

use crate::error::{ApiError, ApiResult};

/// Match `path` against the gallery collection prefix
///
/// Returns the raw identifier segment (empty for the collection itself), or
/// `None` when the path is not a gallery route at all.
pub fn gallery_segment<'a>(path: &'a str, api_prefix: &str) -> Option<&'a str> {
    let prefix = api_prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('/')
}

/// Value of the `id` query parameter, if any
pub fn query_id(query: Option<&str>) -> Option<&str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| *key == "id")
        .map(|(_, value)| value)
}

/// Parse a raw identifier; empty means "no identifier"
///
/// No range check: zero and negative ids parse fine and simply match nothing.
pub fn parse_id(raw: &str) -> ApiResult<Option<i64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>().map(Some).map_err(|_| ApiError::InvalidId)
}

/// Resolve the request identifier from path segment and query string
pub fn resolve_id(segment: &str, query: Option<&str>) -> ApiResult<Option<i64>> {
    if segment.is_empty() {
        parse_id(query_id(query).unwrap_or(""))
    } else {
        parse_id(segment)
    }
}
