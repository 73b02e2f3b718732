use crate::auth::AuthPrincipal;
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use fretline_shared::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub item_id: Uuid,
    pub unit_price: Money,
    /// Point in time the price was computed for; promos are evaluated
    /// against it.
    pub as_of: DateTime<Utc>,
}

pub async fn resolve_price(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(item_id): Path<Uuid>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceResponse>, AppError> {
    let currency = query.currency.unwrap_or_else(|| principal.currency.clone());
    let as_of = Utc::now();
    let unit_price = state
        .resolver
        .resolve(item_id, &principal, &currency, as_of)
        .await?;
    Ok(Json(PriceResponse {
        item_id,
        unit_price,
        as_of,
    }))
}
