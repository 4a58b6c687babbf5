//! Error types for the HTTP scaffold.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plinth_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Result type for the HTTP scaffold.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised by the scaffold itself or surfaced from the store.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The route table names a handler nobody registered.
    #[error("no handler registered for '{0}'")]
    UnknownHandler(String),

    /// The request body could not be parsed.
    #[error("body parse error: {0}")]
    BodyParse(String),

    /// Malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// IO error while starting the server.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Store(err) => {
                let status = if err.is_connection_error() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                tracing::error!("store error: {}", err);
                (status, self.to_string())
            }
            ServerError::UnknownHandler(_) => {
                tracing::error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ServerError::BodyParse(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, format!("body parse error: {}", msg))
            }
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Io(err) => {
                tracing::error!("io error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
