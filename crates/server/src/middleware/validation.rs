use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use miniread_core::{
    contract::ReadRequest,
    middleware::{validate_read_request, ValidationError},
};
use serde_json::{json, Value};

/// A contract read body that passed validation.
///
/// The body is parsed as JSON by hand so that a malformed body is reported like any other
/// validation failure instead of axum's plain-text JSON rejection.
#[derive(Debug, Clone)]
pub struct ValidatedRead(pub ReadRequest);

/// Why a body was turned away before reaching the handler.
#[derive(Debug)]
pub enum ReadRejection {
    /// The body could not be read (too large, aborted connection).
    Body(BytesRejection),
    Invalid(ValidationError),
}

impl From<ValidationError> for ReadRejection {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

impl IntoResponse for ReadRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Body(rejection) => rejection.into_response(),
            Self::Invalid(err) => validation_error_response(&err),
        }
    }
}

/// `400 {"error": "Invalid request", "details": [...]}`.
#[must_use]
pub fn validation_error_response(err: &ValidationError) -> Response {
    tracing::debug!(issues = err.issues.len(), error = %err, "request rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request", "details": err.issues })),
    )
        .into_response()
}

impl<S> FromRequest<S> for ValidatedRead
where
    S: Send + Sync,
{
    type Rejection = ReadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(ReadRejection::Body)?;
        let body: Value = serde_json::from_slice(&bytes).map_err(ValidationError::invalid_json)?;
        Ok(Self(validate_read_request(&body)?))
    }
}
