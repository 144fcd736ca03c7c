//! Request error taxonomy
//!
//! Every failure in request handling ends up as one of these and is rendered
//! as a status code plus a `{"message": ...}` JSON body.

use hyper::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Invalid ID")]
    InvalidId,
    #[error("Gallery not found")]
    NotFound,
    /// Carries the value for the `Allow` header
    #[error("Method not allowed")]
    MethodNotAllowed(&'static str),
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Failed to read request body")]
    BodyRead,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::InvalidId | Self::BodyRead => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
        }
    }
}
