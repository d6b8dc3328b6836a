//! Request extractors whose rejections become [`ApiError`]s.
//!
//! axum's own `Path`, `Query` and `Json` reject bad input with plain-text
//! bodies (and 422 for some JSON failures). These wrappers run the same
//! extraction but answer with a JSON `400 Bad Request`.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query},
};

use crate::error::ApiError;

/// Path parameters, e.g. the session id.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// A JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
