//! Conditional request support for served files.
//!
//! The validator is derived from file metadata so the file body never has to
//! be hashed.

use std::time::{SystemTime, UNIX_EPOCH};

/// Weak `ETag` from file size and modification time, e.g. `W/"1a2b-65f0c3d1"`
pub fn file_etag(len: u64, modified: Option<SystemTime>) -> String {
    let mtime = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());
    format!("W/\"{len:x}-{mtime:x}\"")
}

/// Whether the client's `If-None-Match` header matches `etag` (weak comparison)
///
/// Accepts a comma-separated list and the `*` wildcard.
pub fn not_modified(if_none_match: Option<&str>, etag: &str) -> bool {
    let Some(header) = if_none_match else {
        return false;
    };
    let ours = strip_weak(etag);
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || strip_weak(candidate) == ours
    })
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_file_etag_format() {
        let modified = UNIX_EPOCH + Duration::from_secs(0x10);
        assert_eq!(file_etag(255, Some(modified)), "W/\"ff-10\"");
        assert_eq!(file_etag(1, None), "W/\"1-0\"");
    }

    #[test]
    fn test_file_etag_changes_with_size() {
        let modified = Some(SystemTime::now());
        assert_ne!(file_etag(10, modified), file_etag(11, modified));
    }

    #[test]
    fn test_not_modified() {
        let etag = "W/\"ff-10\"";
        assert!(not_modified(Some("W/\"ff-10\""), etag));
        assert!(not_modified(Some("\"ff-10\""), etag));
        assert!(not_modified(Some("\"abc\", W/\"ff-10\""), etag));
        assert!(not_modified(Some("*"), etag));
        assert!(!not_modified(Some("W/\"ff-11\""), etag));
        assert!(!not_modified(None, etag));
    }
}
