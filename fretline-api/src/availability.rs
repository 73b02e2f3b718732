use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use fretline_catalog::AvailabilityRecord;
use uuid::Uuid;

pub async fn check_availability(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<AvailabilityRecord>, AppError> {
    state
        .ledger
        .snapshot(item_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no availability record for item {item_id}")))
}
