use analytics_store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::routes::Message;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No body provided")]
    NoBody,
    #[error("Invalid body provided")]
    InvalidBody(String),
    #[error("Invalid query provided")]
    InvalidQuery(String),
    #[error("Failed to record event")]
    Record(#[source] StoreError),
    #[error("Failed to retrieve events")]
    Retrieve(#[source] StoreError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::InvalidBody(reason) => {
                tracing::debug!(%reason, "rejected event document");
            }
            Error::InvalidQuery(reason) => {
                tracing::debug!(%reason, "rejected query string");
            }
            Error::Record(e) | Error::Retrieve(e) => {
                error!(error = ?e, "{self}");
            }
            Error::NoBody => {}
        }

        // Only the generic message reaches the client
        let status = StatusCode::from(&self);
        (status, Json(Message::new(self.to_string()))).into_response()
    }
}

impl From<&Error> for StatusCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::NoBody | Error::InvalidBody(_) | Error::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Record(_) | Error::Retrieve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
