//! Gallery CRUD handlers
//!
//! Dispatch on (method, identifier present) and talk to the record store.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Response, StatusCode};

use crate::config::AppState;
use crate::error::{ApiError, ApiResult};
use crate::http;
use crate::store::GalleryPayload;

/// Verbs accepted on `/api/gallery`
pub const COLLECTION_METHODS: &str = "GET, POST, OPTIONS";
/// Verbs accepted on `/api/gallery/{id}`
pub const ITEM_METHODS: &str = "GET, PUT, DELETE, OPTIONS";

/// Handle a gallery request whose identifier has already been parsed
pub async fn dispatch<B>(
    method: &Method,
    id: Option<i64>,
    body: B,
    state: &AppState,
) -> ApiResult<Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;

    match (method, id) {
        (&Method::GET, None) => {
            let items = state.store.list_all().await;
            Ok(http::json_response(StatusCode::OK, &items))
        }
        (&Method::GET, Some(id)) => {
            let item = state.store.get(id).await?;
            Ok(http::json_response(StatusCode::OK, &item))
        }
        (&Method::POST, None) => {
            let payload = read_payload(body, max_body_size).await?;
            let item = state.store.insert(payload).await;
            Ok(http::json_response(StatusCode::CREATED, &item))
        }
        (&Method::PUT, Some(id)) => {
            let payload = read_payload(body, max_body_size).await?;
            let item = state.store.update(id, payload).await?;
            Ok(http::json_response(StatusCode::OK, &item))
        }
        (&Method::DELETE, Some(id)) => {
            state.store.delete(id).await?;
            Ok(http::message_response(StatusCode::OK, "Deleted successfully"))
        }
        (_, None) => Err(ApiError::MethodNotAllowed(COLLECTION_METHODS)),
        (_, Some(_)) => Err(ApiError::MethodNotAllowed(ITEM_METHODS)),
    }
}

/// Read the whole body (bounded by `max_body_size`) and decode it
async fn read_payload<B>(body: B, max_body_size: u64) -> ApiResult<GalleryPayload>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(ApiError::PayloadTooLarge);
        }
        Err(e) => {
            crate::logger::log_warning(&format!("Failed to read request body: {e}"));
            return Err(ApiError::BodyRead);
        }
    };

    serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidJson)
}
