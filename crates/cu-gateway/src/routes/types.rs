use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ReadStateQuery {
    /// The sort key to fold through, inclusive. Omitted means "the latest
    /// known interaction" (distilled spec §6 `upToSortKey?`).
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadStateResponse {
    pub state: serde_json::Value,
    pub output: serde_json::Value,
    pub last_sort_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WriteInteractionRequest {
    pub action: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct WriteInteractionResponse {
    pub sort_key: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: HttpError,
}

#[derive(Debug, Serialize)]
pub struct HttpError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    NotFound,
    Conflict,
    Upstream,
    Internal,
}
