//! HTTP mapping of relayer errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::RelayerError;

impl RelayerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayerError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayerError::Unauthorized(_) => StatusCode::FORBIDDEN,
            RelayerError::DuplicateKey(_) => StatusCode::CONFLICT,
            RelayerError::Watcher(_) | RelayerError::Registry(_) => StatusCode::BAD_GATEWAY,
            RelayerError::Decode { .. }
            | RelayerError::Storage(_)
            | RelayerError::Serialization(_)
            | RelayerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            RelayerError::Validation(validation) => json!({
                "code": 100,
                "reason": "Validation Failed",
                "validationErrors": [validation],
            }),
            other if status.is_server_error() => {
                error!(error = %other, "Request failed");
                json!({ "reason": status.canonical_reason().unwrap_or("Internal Server Error") })
            }
            other => json!({ "reason": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
