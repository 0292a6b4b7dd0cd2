use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::core::{FetchError, StoreError};

/// A failed `/cotacao` request.
///
/// The underlying cause is passed through to the caller as-is; this endpoint
/// is meant for internal use and does not scrub upstream or storage errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("error fetching quote: {0}")]
    Fetch(#[from] FetchError),

    #[error("error saving quote: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
