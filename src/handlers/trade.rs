/// Purchase/sale lifecycle endpoints. Refused preconditions come back as a
/// 200 with a `warning`, never an error status.
// region:    --- Imports
use crate::auth::AuthAccount;
use crate::error::Result;
use crate::trade::commands::{self, StepResult};
use crate::trade::machine::{Action, Role};
use crate::trade::model::TransactionView;
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

// endregion: --- Imports

#[derive(Debug, Deserialize)]
pub struct NewPurchasePayload {
    pub item_pk: i64,
}

/// `POST /purchases`
pub async fn create_purchase(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Json(payload): Json<NewPurchasePayload>,
) -> Result<Json<StepResult>> {
    let result = commands::create_purchase(&state, &account, payload.item_pk).await?;
    Ok(Json(result))
}

async fn step(
    state: &AppState,
    account: &crate::account::Account,
    transaction_pk: i64,
    role: Role,
    action: Action,
) -> Result<Json<StepResult>> {
    let result = commands::apply_step(state, account, transaction_pk, role, action).await?;
    Ok(Json(result))
}

/// `POST /sales/:pk/acknowledge`
pub async fn acknowledge_sale(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(transaction_pk): Path<i64>,
) -> Result<Json<StepResult>> {
    step(&state, &account, transaction_pk, Role::Seller, Action::Acknowledge).await
}

/// `POST /purchases/:pk/confirm`
pub async fn confirm_purchase(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(transaction_pk): Path<i64>,
) -> Result<Json<StepResult>> {
    step(&state, &account, transaction_pk, Role::Buyer, Action::Confirm).await
}

/// `POST /sales/:pk/confirm`
pub async fn confirm_sale(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(transaction_pk): Path<i64>,
) -> Result<Json<StepResult>> {
    step(&state, &account, transaction_pk, Role::Seller, Action::Confirm).await
}

/// `POST /purchases/:pk/cancel`
pub async fn cancel_purchase(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(transaction_pk): Path<i64>,
) -> Result<Json<StepResult>> {
    step(&state, &account, transaction_pk, Role::Buyer, Action::Cancel).await
}

/// `POST /sales/:pk/cancel`
pub async fn cancel_sale(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(transaction_pk): Path<i64>,
) -> Result<Json<StepResult>> {
    step(&state, &account, transaction_pk, Role::Seller, Action::Cancel).await
}

pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<Vec<TransactionView>>> {
    Ok(Json(commands::list_purchases(&state, account.id).await?))
}

pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<Vec<TransactionView>>> {
    Ok(Json(commands::list_sales(&state, account.id).await?))
}
