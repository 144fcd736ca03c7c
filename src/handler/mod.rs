//! Request handler module
//!
//! Responsible for request routing dispatch and the gallery and image handlers.

pub mod gallery;
pub mod params;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
