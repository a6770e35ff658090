/// Moderation endpoints; only configured admins pass the extractor.
// region:    --- Imports
use crate::account;
use crate::auth::AdminAccount;
use crate::catalog::model::{Item, ItemRequest, ItemStatus};
use crate::catalog::queries;
use crate::error::{Error, Result};
use crate::mailer;
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Flag Queue

/// One entry in the moderation queue, for either flavor of listing.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FlagView {
    pub pk: i64,
    pub listing_pk: i64,
    pub listing_name: String,
    pub reporter: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct FlagQueue {
    pub item_flags: Vec<FlagView>,
    pub item_request_flags: Vec<FlagView>,
}

/// `GET /admin/flags`
pub async fn list_flags(
    State(state): State<Arc<AppState>>,
    AdminAccount(_admin): AdminAccount,
) -> Result<Json<FlagQueue>> {
    let pool = state.db.pool();
    let item_flags = sqlx::query_as::<_, FlagView>(
        "SELECT f.id AS pk, i.id AS listing_pk, i.name AS listing_name,
                a.username AS reporter, f.text
         FROM item_flags f
         JOIN items i ON i.id = f.item_id
         LEFT JOIN accounts a ON a.id = f.reporter_id
         ORDER BY f.id",
    )
    .fetch_all(&*pool)
    .await?;
    let item_request_flags = sqlx::query_as::<_, FlagView>(
        "SELECT f.id AS pk, r.id AS listing_pk, r.name AS listing_name,
                a.username AS reporter, f.text
         FROM item_request_flags f
         JOIN item_requests r ON r.id = f.item_request_id
         LEFT JOIN accounts a ON a.id = f.reporter_id
         ORDER BY f.id",
    )
    .fetch_all(&*pool)
    .await?;
    Ok(Json(FlagQueue {
        item_flags,
        item_request_flags,
    }))
}

/// `DELETE /admin/flags/item/:pk` - dismiss a report without touching the item.
pub async fn dismiss_item_flag(
    State(state): State<Arc<AppState>>,
    AdminAccount(_admin): AdminAccount,
    Path(flag_pk): Path<i64>,
) -> Result<Json<Value>> {
    let affected = sqlx::query("DELETE FROM item_flags WHERE id = $1")
        .bind(flag_pk)
        .execute(&*state.db.pool())
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(Error::validation("no such flag"));
    }
    Ok(Json(json!({ "message": "Flag dismissed." })))
}

/// `DELETE /admin/flags/item_request/:pk`
pub async fn dismiss_item_request_flag(
    State(state): State<Arc<AppState>>,
    AdminAccount(_admin): AdminAccount,
    Path(flag_pk): Path<i64>,
) -> Result<Json<Value>> {
    let affected = sqlx::query("DELETE FROM item_request_flags WHERE id = $1")
        .bind(flag_pk)
        .execute(&*state.db.pool())
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(Error::validation("no such flag"));
    }
    Ok(Json(json!({ "message": "Flag dismissed." })))
}

// endregion: --- Flag Queue

/// `DELETE /admin/items/:pk` - remove a flagged item and tell its seller.
/// An item mid-transaction is refused; the transaction owns it.
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    AdminAccount(admin): AdminAccount,
    Path(item_pk): Path<i64>,
) -> Result<Json<Value>> {
    let pool = state.db.pool();

    // same row lock as the owner path: a purchase racing this delete either
    // freezes the item first (we refuse) or waits for the commit
    let mut tx = pool.begin().await?;
    let item = sqlx::query_as::<_, Item>(queries::GET_ITEM_FOR_UPDATE)
        .bind(item_pk)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::validation("no such item"))?;
    if item.status != ItemStatus::Available.as_i16() {
        return Ok(Json(json!({
            "warning": "Cannot delete an item in the unavailable state."
        })));
    }

    info!("{:<12} --> admin {} removing item {}", "Admin", admin.username, item.id);
    sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(item.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if let Some(seller) = account::get_by_pk(&pool, item.seller_id).await? {
        mailer::send_mail(
            state.mailer.as_ref(),
            "Item Removed by Admins",
            &format!(
                "Your item '{}' was removed by the admins after a report. Reply to this email if you believe this was a mistake.",
                item.name
            ),
            &[seller.email],
        )
        .await;
    }
    Ok(Json(json!({ "message": "Item deleted." })))
}

/// `DELETE /admin/item_requests/:pk`
pub async fn delete_item_request(
    State(state): State<Arc<AppState>>,
    AdminAccount(admin): AdminAccount,
    Path(item_request_pk): Path<i64>,
) -> Result<Json<Value>> {
    let pool = state.db.pool();
    let item_request = sqlx::query_as::<_, ItemRequest>(queries::GET_ITEM_REQUEST)
        .bind(item_request_pk)
        .fetch_optional(&*pool)
        .await?
        .ok_or_else(|| Error::validation("no such item request"))?;

    info!(
        "{:<12} --> admin {} removing item request {}",
        "Admin", admin.username, item_request.id
    );
    sqlx::query("DELETE FROM item_requests WHERE id = $1")
        .bind(item_request.id)
        .execute(&*pool)
        .await?;

    if let Some(requester) = account::get_by_pk(&pool, item_request.requester_id).await? {
        mailer::send_mail(
            state.mailer.as_ref(),
            "Item Request Removed by Admins",
            &format!(
                "Your item request for '{}' was removed by the admins after a report. Reply to this email if you believe this was a mistake.",
                item_request.name
            ),
            &[requester.email],
        )
        .await;
    }
    Ok(Json(json!({ "message": "Item request deleted." })))
}
