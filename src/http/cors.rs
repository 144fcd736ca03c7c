//! Response header decoration
//!
//! CORS and `Server` headers go on every response, including errors and preflights.

use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;

use crate::config::HttpConfig;

/// Attach CORS headers and the `Server` header
pub fn apply_headers<B>(resp: &mut Response<B>, http: &HttpConfig) {
    let pairs = [
        ("access-control-allow-origin", http.cors.allow_origin.as_str()),
        ("access-control-allow-methods", http.cors.allow_methods.as_str()),
        ("access-control-allow-headers", http.cors.allow_headers.as_str()),
        ("server", http.server_name.as_str()),
    ];

    let headers = resp.headers_mut();
    for (name, value) in pairs {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                headers.insert(HeaderName::from_static(name), v);
            }
            Err(e) => {
                crate::logger::log_warning(&format!("Skipping invalid {name} header value '{value}': {e}"));
            }
        }
    }
}
