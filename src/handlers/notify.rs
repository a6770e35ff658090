// region:    --- Imports
use crate::auth::AuthAccount;
use crate::error::Result;
use crate::notify::{self, Notification};
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

// endregion: --- Imports

pub async fn count_unseen(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<Value>> {
    let count = notify::count_unseen(&state.db.pool(), account.id).await?;
    Ok(Json(json!({ "count": count })))
}

#[derive(Debug, Deserialize)]
pub struct SeePayload {
    /// Absent means "mark all seen".
    pub notification_pks: Option<Vec<i64>>,
}

/// The body itself is optional too: a bare POST marks everything seen.
pub async fn see(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    payload: Option<Json<SeePayload>>,
) -> Result<Json<Value>> {
    let pks = payload.and_then(|Json(p)| p.notification_pks);
    notify::see(&state.db.pool(), account.id, pks.as_deref()).await?;
    Ok(Json(json!({ "message": "Notifications marked seen." })))
}

#[derive(Debug, Deserialize)]
pub struct NotificationPageParams {
    pub count: Option<i64>,
    pub direction: Option<String>,
    pub base_notification_pk: Option<i64>,
}

/// `GET /notifications/get_relative`
pub async fn get_relative(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Query(params): Query<NotificationPageParams>,
) -> Result<Json<Vec<Notification>>> {
    let req = super::page_request(
        params.count,
        params.direction.as_deref(),
        params.base_notification_pk,
    )?;
    let page = notify::page(&state.db.pool(), account.id, &req).await?;
    Ok(Json(page))
}
