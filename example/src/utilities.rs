use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;
use vapid_native::ErrorKind;

/// Failure reported to API clients as `{"error": ..., "kind": ...}`.
#[derive(Debug)]
pub struct ApiError(pub vapid_native::Error);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::SignatureMismatch | ErrorKind::ExpiredClaim => StatusCode::UNAUTHORIZED,
            ErrorKind::KeyGenerationFailure | ErrorKind::SigningFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(error = %self.0, %status, "request rejected");
        (
            status,
            Json(json!({
                "error": self.0.to_string(),
                "kind": self.0.kind().to_string(),
            })),
        )
            .into_response()
    }
}

impl From<vapid_native::Error> for ApiError {
    fn from(inner: vapid_native::Error) -> Self {
        Self(inner)
    }
}
