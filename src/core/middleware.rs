use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::core::error::{ApiError, ErrorBody};

/// JSON body extractor whose rejections render as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Fills `path` into error payloads produced further down the stack.
pub async fn error_path_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(mut body) = response.extensions().get::<ErrorBody>().cloned() else {
        return response;
    };

    let status = response.status();
    body.path = path;
    let mut rebuilt = (status, Json(body.clone())).into_response();
    rebuilt.extensions_mut().insert(body);
    rebuilt
}

pub async fn not_found_fallback() -> ApiError {
    ApiError::not_found("No handler found for this path")
}
