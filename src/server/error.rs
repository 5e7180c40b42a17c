use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::errors::{MindMapError, MindMapErrorKind};

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_ar: Option<String>,
}

/// Domain error on its way out through axum
#[derive(Debug)]
pub struct ApiError(pub MindMapError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            MindMapErrorKind::Validation
            | MindMapErrorKind::CycleRejected
            | MindMapErrorKind::Forbidden => StatusCode::BAD_REQUEST,
            MindMapErrorKind::NotFound => StatusCode::NOT_FOUND,
            MindMapErrorKind::Conflict => StatusCode::CONFLICT,
            MindMapErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MindMapError> for ApiError {
    fn from(err: MindMapError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = ErrorBody {
            error: self.0.public_message(),
            code: self.0.error_code().to_string(),
            message_ar: self.0.message_ar().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}
