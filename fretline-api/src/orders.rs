use crate::auth::AuthPrincipal;
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fretline_catalog::Selection;
use fretline_order::{DraftLine, Order, OrderStatus};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub item_id: Uuid,
    #[serde(default)]
    pub selected_options: HashMap<String, Selection>,
    pub quantity: u32,
}

impl From<LineRequest> for DraftLine {
    fn from(req: LineRequest) -> Self {
        DraftLine {
            item_id: req.item_id,
            selected_options: req.selected_options,
            quantity: req.quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub lines: Vec<LineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub target: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub account: Option<Uuid>,
}

pub async fn create_order(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    // The claims are trusted for role/tier, but the account itself must be
    // known to the directory before it can own orders.
    let known = state
        .accounts
        .account(principal.account_id)
        .await
        .map_err(fretline_order::OrderError::from)?;
    if known.is_none() {
        return Err(AppError::Authentication(format!(
            "unknown account {}",
            principal.account_id
        )));
    }

    let lines = req.lines.into_iter().map(DraftLine::from).collect();
    let order = state.manager.create_draft(&principal, lines).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.manager.get_order(order_id, &principal).await?;
    Ok(Json(order))
}

pub async fn list_orders(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let account_id = query.account.unwrap_or(principal.account_id);
    let orders = state.manager.list_orders(account_id, &principal).await?;
    Ok(Json(orders))
}

pub async fn update_lines(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(order_id): Path<Uuid>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let lines = req.lines.into_iter().map(DraftLine::from).collect();
    let order = state
        .manager
        .update_lines(order_id, &principal, lines)
        .await?;
    Ok(Json(order))
}

pub async fn submit_order(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.manager.submit(order_id, &principal).await?;
    Ok(Json(order))
}

pub async fn transition_order(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(order_id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .manager
        .transition(order_id, req.target, &principal)
        .await?;
    Ok(Json(order))
}
