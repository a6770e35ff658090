// region:    --- Imports
use crate::account::{self, Account};
use crate::auth::AuthAccount;
use crate::error::{Error, Result};
use crate::messaging::{self, Message, ThreadPage};
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

// endregion: --- Imports

#[derive(Debug, Deserialize)]
pub struct ThreadPageParams {
    pub contact_pk: Option<i64>,
    pub count: Option<i64>,
    pub direction: Option<String>,
    pub base_message_pk: Option<i64>,
}

/// `GET /messages/get_relative`
pub async fn get_relative(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Query(params): Query<ThreadPageParams>,
) -> Result<Json<ThreadPage>> {
    let contact_pk = params
        .contact_pk
        .ok_or_else(|| Error::validation("contact pk is required"))?;
    let req = super::page_request(
        params.count,
        params.direction.as_deref(),
        params.base_message_pk,
    )?;
    let page = messaging::thread_page(&state.db.pool(), account.id, contact_pk, &req).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct SendPayload {
    pub receiver_pk: i64,
    pub text: String,
}

/// `POST /messages`
pub async fn send(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Json(payload): Json<SendPayload>,
) -> Result<Json<Message>> {
    let message = messaging::send_message(
        &state.db.pool(),
        &state.config,
        &account,
        payload.receiver_pk,
        &payload.text,
    )
    .await?;
    Ok(Json(message))
}

pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<Vec<Account>>> {
    let contacts = account::list_contacts(&state.db.pool(), account.id).await?;
    Ok(Json(contacts))
}
