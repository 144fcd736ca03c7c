//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the gallery logic.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cors::apply_headers;
pub use response::{
    build_304_response, build_404_response, build_file_response, build_options_response,
    error_response, json_response, message_response,
};
