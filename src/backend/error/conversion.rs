/**
 * Error Conversion
 *
 * Converts `ApiError` values into HTTP responses. Every error response
 * carries the standard `{success:false, message}` JSON body with the status
 * code from `ApiError::status_code`.
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::backend::error::ApiError;
use crate::shared::ApiResponse;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("[Server] Internal error: {self}");
        } else {
            tracing::debug!("[Server] Request failed ({}): {self}", status.as_u16());
        }

        let body: ApiResponse<()> = ApiResponse::error(self.public_message());
        (status, Json(body)).into_response()
    }
}
