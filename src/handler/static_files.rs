//! Static image serving module
//!
//! Strips the images URL prefix and resolves the remainder under the images directory.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a file from `dir` for a path under `url_prefix`
pub async fn serve_image(ctx: &RequestContext<'_>, dir: &str, url_prefix: &str) -> Response<Full<Bytes>> {
    let Some(relative) = strip_url_prefix(ctx.path, url_prefix) else {
        return http::build_404_response();
    };
    let Some(relative) = decode_path(relative) else {
        return http::build_404_response();
    };
    let Some(file_path) = resolve_in_dir(dir, &relative).await else {
        return http::build_404_response();
    };

    let metadata = match fs::metadata(&file_path).await {
        Ok(m) if m.is_file() => m,
        // Directories are not listed
        Ok(_) => return http::build_404_response(),
        Err(e) => {
            logger::log_error(&format!("Failed to stat '{}': {e}", file_path.display()));
            return http::build_404_response();
        }
    };

    let etag = cache::file_etag(metadata.len(), metadata.modified().ok());
    if cache::not_modified(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    let content = if ctx.is_head {
        Vec::new()
    } else {
        match fs::read(&file_path).await {
            Ok(c) => c,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {e}",
                    file_path.display()
                ));
                return http::build_404_response();
            }
        }
    };

    http::build_file_response(
        Bytes::from(content),
        metadata.len(),
        mime::content_type_for(&file_path),
        &etag,
    )
}

/// Remainder of `path` after the images prefix, without leading slashes
fn strip_url_prefix<'a>(path: &'a str, url_prefix: &str) -> Option<&'a str> {
    let prefix = url_prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?.strip_prefix('/')?;
    let rest = rest.trim_start_matches('/');
    (!rest.is_empty()).then_some(rest)
}

/// Percent-decode the request path; `None` when the bytes are not UTF-8
fn decode_path(raw: &str) -> Option<Cow<'_, str>> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            logger::log_warning(&format!("Undecodable image path '{raw}': {e}"));
            None
        }
    }
}

/// Join `relative` onto `dir`, refusing anything that escapes `dir`
async fn resolve_in_dir(dir: &str, relative: &str) -> Option<PathBuf> {
    let dir_canonical = match fs::canonicalize(dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Images directory not found or inaccessible '{dir}': {e}"
            ));
            return None;
        }
    };

    // Missing files are the common 404 case, not worth a log line
    let file_canonical = fs::canonicalize(Path::new(dir).join(relative)).await.ok()?;
    if !file_canonical.starts_with(&dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {relative} -> {}",
            file_canonical.display()
        ));
        return None;
    }
    Some(file_canonical)
}
