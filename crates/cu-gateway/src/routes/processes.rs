use axum::{
    extract::{Path, Query, State},
    Json,
};
use cu_core::{ProcessId, SortKey};

use crate::state::AppState;

use super::error::HttpApiError;
use super::types::{
    ReadStateQuery, ReadStateResponse, WriteInteractionRequest, WriteInteractionResponse,
};

/// `readState(processId, upToSortKey?)` (distilled spec §6), exposed as
/// `GET /processes/:id/state`.
pub async fn read_state(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
    Query(query): Query<ReadStateQuery>,
) -> Result<Json<ReadStateResponse>, HttpApiError> {
    let process_id = ProcessId::from(process_id);
    let up_to = query.to.map(SortKey::from);

    let result = state.evaluator.read_state(&process_id, up_to).await?;

    let output = serde_json::to_value(&result.output)
        .map_err(|e| HttpApiError::invalid_request(format!("unrepresentable output: {e}")))?;

    Ok(Json(ReadStateResponse {
        state: result.state,
        output,
        last_sort_key: result.last_sort_key.map(|sk| sk.0),
    }))
}

/// `writeInteraction(processId, action)` (distilled spec §6): a pure
/// forward to the Scheduler Unit, opaque to the core — no business logic
/// beyond request parsing and error-code mapping.
pub async fn write_interaction(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
    Json(req): Json<WriteInteractionRequest>,
) -> Result<Json<WriteInteractionResponse>, HttpApiError> {
    let process_id = ProcessId::from(process_id);

    let sort_key = state
        .scheduler
        .submit_interaction(&process_id, &req.action)
        .await?;

    Ok(Json(WriteInteractionResponse {
        sort_key: sort_key.0,
    }))
}
