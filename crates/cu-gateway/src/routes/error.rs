use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cu_evaluator::EngineError;
use cu_source::SourceError;

use super::types::{ErrorCode, ErrorResponse, HttpError};

#[derive(Debug)]
pub struct HttpApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl HttpApiError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        let status = match self.code {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Upstream => StatusCode::BAD_GATEWAY,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            error: HttpError {
                code: self.code,
                message: self.message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Maps the engine's fatal taxonomy (distilled spec §7) onto HTTP status
/// codes. An `IntegrityError` is a 409 — the process needs operator
/// intervention, not a retry by the caller. Everything else that reaches
/// here is either a misconfigured process or an upstream failure.
impl From<EngineError> for HttpApiError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::Cache(cache_err) if err.is_integrity_conflict() => {
                Self::new(ErrorCode::Conflict, cache_err.to_string())
            }
            EngineError::Host(_) => Self::new(ErrorCode::InvalidRequest, err.to_string()),
            EngineError::Source(source_err) => Self::from(SourceErrorRef(source_err)),
            EngineError::Cache(_) => Self::new(ErrorCode::Internal, err.to_string()),
        }
    }
}

struct SourceErrorRef<'a>(&'a SourceError);

impl From<SourceErrorRef<'_>> for HttpApiError {
    fn from(err: SourceErrorRef<'_>) -> Self {
        match err.0 {
            SourceError::NotFound(_) => Self::new(ErrorCode::NotFound, err.0.to_string()),
            SourceError::Malformed(_) => Self::new(ErrorCode::Internal, err.0.to_string()),
            SourceError::Transient(_) | SourceError::RetryExhausted { .. } => {
                Self::new(ErrorCode::Upstream, err.0.to_string())
            }
        }
    }
}

impl From<SourceError> for HttpApiError {
    fn from(err: SourceError) -> Self {
        Self::from(SourceErrorRef(&err))
    }
}

impl std::fmt::Display for HttpApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for HttpApiError {}
