// region:    --- Imports
use crate::account::Account;
use crate::auth::{self, AuthAccount};
use crate::error::Result;
use crate::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// endregion: --- Imports

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub ticket: String,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: Account,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>> {
    let (token, account) = auth::login(&state, &payload.ticket, &payload.service).await?;
    Ok(Json(LoginResponse { token, account }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AuthAccount(_account): AuthAccount,
) -> Json<serde_json::Value> {
    if let Some(token) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        auth::logout(&state, token);
    }
    Json(serde_json::json!({ "message": "logged out" }))
}
