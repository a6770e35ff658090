/// Listing lifecycle: create / edit / delete for items and item requests,
/// plus moderation flags.
// region:    --- Imports
use crate::account::Account;
use crate::audit::{log_item_action, log_item_request_action};
use crate::catalog::model::{Condition, Item, ItemRequest, ItemStatus, MAX_DEADLINE_DAYS};
use crate::catalog::queries::{GET_ITEM_FOR_UPDATE, GET_ITEM_REQUEST};
use crate::error::{Error, Result};
use crate::mailer;
use crate::scheduler;
use crate::AppState;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Payload & Validation

#[derive(Debug, Deserialize)]
pub struct ListingPayload {
    pub name: String,
    pub deadline: NaiveDate,
    /// Price in cents.
    pub price: i64,
    pub negotiable: bool,
    pub condition_index: i64,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub album: Vec<String>,
    #[serde(default)]
    pub category_pks: Vec<i64>,
}

/// Field validation shared by items and item requests. The deadline must lie
/// between today and a year out, checked against "today" at submission time.
pub fn validate_listing(payload: &ListingPayload, today: NaiveDate) -> std::result::Result<(), String> {
    if payload.name.is_empty() || payload.name.len() > 50 {
        return Err("name must be 1-50 characters".into());
    }
    if payload.description.len() > 1000 {
        return Err("description must be at most 1000 characters".into());
    }
    if payload.price < 0 {
        return Err("price must not be negative".into());
    }
    if Condition::from_index(payload.condition_index).is_none() {
        return Err("unknown condition index".into());
    }
    if payload.deadline < today {
        return Err("deadline must not be in the past".into());
    }
    if payload.deadline > today + Duration::days(MAX_DEADLINE_DAYS) {
        return Err(format!("deadline must be within {MAX_DEADLINE_DAYS} days"));
    }
    if payload.image.is_empty() {
        return Err("a lead image is required".into());
    }
    Ok(())
}

/// Outcome of an owner mutation; `Refused` is a warning, not an error.
#[derive(Debug)]
pub enum ListingOutcome<T> {
    Done(T),
    Refused(&'static str),
}

fn expiry_notice_run_at(deadline: NaiveDate) -> DateTime<Utc> {
    // the day after the deadline, midnight UTC
    Utc.from_utc_datetime(&deadline.and_hms_opt(0, 0, 0).expect("midnight is valid"))
        + Duration::days(1)
}

// endregion: --- Payload & Validation

// region:    --- Items

pub async fn create_item(state: &AppState, account: &Account, payload: ListingPayload) -> Result<Item> {
    validate_listing(&payload, Utc::now().date_naive()).map_err(Error::Validation)?;
    info!("{:<12} --> new item '{}' by {}", "Catalog", payload.name, account.username);
    let pool = state.db.pool();

    let mut tx = pool.begin().await?;
    let item = sqlx::query_as::<_, Item>(
        "INSERT INTO items (seller_id, name, posted_date, deadline, price, negotiable, condition, description, image, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING id, seller_id, name, posted_date, deadline, price, negotiable, condition, description, image, status",
    )
    .bind(account.id)
    .bind(&payload.name)
    .bind(Utc::now())
    .bind(payload.deadline)
    .bind(payload.price)
    .bind(payload.negotiable)
    .bind(payload.condition_index as i16)
    .bind(&payload.description)
    .bind(&payload.image)
    .bind(ItemStatus::Available.as_i16())
    .fetch_one(&mut *tx)
    .await?;

    set_item_categories(&mut tx, item.id, &payload.category_pks).await?;
    replace_album(&mut tx, item.id, &payload.album, state.config.album_limit).await?;
    log_item_action(&mut tx, item.id, account.id, "created").await?;
    tx.commit().await?;

    mailer::send_mail_activity(
        state.mailer.as_ref(),
        &state.config,
        "Item Posted",
        &format!("You have posted your new item '{}' for sale!", item.name),
        &[account],
    )
    .await;
    schedule_expiry_notice(state, scheduler::TASK_ITEM_EXPIRY_NOTICE, item.id, item.deadline).await;

    Ok(item)
}

pub async fn edit_item(
    state: &AppState,
    account: &Account,
    item_pk: i64,
    payload: ListingPayload,
) -> Result<ListingOutcome<Item>> {
    let pool = state.db.pool();

    let mut tx = pool.begin().await?;
    let item = sqlx::query_as::<_, Item>(GET_ITEM_FOR_UPDATE)
        .bind(item_pk)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::validation("no such item"))?;
    if item.seller_id != account.id {
        return Err(Error::Forbidden);
    }
    // a frozen or completed item belongs to its transaction
    if item.status != ItemStatus::Available.as_i16() {
        return Ok(ListingOutcome::Refused("Cannot edit an item in the unavailable state."));
    }
    validate_listing(&payload, Utc::now().date_naive()).map_err(Error::Validation)?;

    let deadline_changed = item.deadline != payload.deadline;
    let item = sqlx::query_as::<_, Item>(
        "UPDATE items SET name = $1, deadline = $2, price = $3, negotiable = $4, condition = $5, description = $6, image = $7
         WHERE id = $8
         RETURNING id, seller_id, name, posted_date, deadline, price, negotiable, condition, description, image, status",
    )
    .bind(&payload.name)
    .bind(payload.deadline)
    .bind(payload.price)
    .bind(payload.negotiable)
    .bind(payload.condition_index as i16)
    .bind(&payload.description)
    .bind(&payload.image)
    .bind(item.id)
    .fetch_one(&mut *tx)
    .await?;

    set_item_categories(&mut tx, item.id, &payload.category_pks).await?;
    replace_album(&mut tx, item.id, &payload.album, state.config.album_limit).await?;
    log_item_action(&mut tx, item.id, account.id, "edited").await?;
    tx.commit().await?;

    if deadline_changed {
        schedule_expiry_notice(state, scheduler::TASK_ITEM_EXPIRY_NOTICE, item.id, item.deadline)
            .await;
    }
    Ok(ListingOutcome::Done(item))
}

pub async fn delete_item(
    state: &AppState,
    account: &Account,
    item_pk: i64,
) -> Result<ListingOutcome<()>> {
    let pool = state.db.pool();

    let mut tx = pool.begin().await?;
    let item = sqlx::query_as::<_, Item>(GET_ITEM_FOR_UPDATE)
        .bind(item_pk)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::validation("no such item"))?;
    if item.seller_id != account.id {
        return Err(Error::Forbidden);
    }
    if item.status != ItemStatus::Available.as_i16() {
        return Ok(ListingOutcome::Refused("Cannot delete an item in the unavailable state."));
    }

    // album images, logs and flags go with it
    sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(item.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    mailer::send_mail_activity(
        state.mailer.as_ref(),
        &state.config,
        "Item Deleted",
        &format!("You have removed your item '{}' from sale.", item.name),
        &[account],
    )
    .await;
    Ok(ListingOutcome::Done(()))
}

async fn set_item_categories(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_pk: i64,
    category_pks: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM item_categories WHERE item_id = $1")
        .bind(item_pk)
        .execute(&mut **tx)
        .await?;
    // unknown category pks are ignored rather than failing the insert
    sqlx::query(
        "INSERT INTO item_categories (item_id, category_id)
         SELECT $1, id FROM categories WHERE id = ANY($2)",
    )
    .bind(item_pk)
    .bind(category_pks)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn replace_album(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_pk: i64,
    album: &[String],
    limit: usize,
) -> Result<()> {
    sqlx::query("DELETE FROM album_images WHERE item_id = $1")
        .bind(item_pk)
        .execute(&mut **tx)
        .await?;
    for image in album.iter().take(limit) {
        sqlx::query("INSERT INTO album_images (item_id, image) VALUES ($1, $2)")
            .bind(item_pk)
            .bind(image)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn schedule_expiry_notice(state: &AppState, kind: &str, pk: i64, deadline: NaiveDate) {
    let pool = state.db.pool();
    if let Err(e) = scheduler::schedule(
        &pool,
        kind,
        serde_json::json!({ "pk": pk }),
        expiry_notice_run_at(deadline),
    )
    .await
    {
        warn!("{:<12} --> could not schedule expiry notice: {:?}", "Catalog", e);
    }
}

// endregion: --- Items

// region:    --- Item Requests

pub async fn create_item_request(
    state: &AppState,
    account: &Account,
    payload: ListingPayload,
) -> Result<ItemRequest> {
    validate_listing(&payload, Utc::now().date_naive()).map_err(Error::Validation)?;
    info!(
        "{:<12} --> new item request '{}' by {}",
        "Catalog", payload.name, account.username
    );
    let pool = state.db.pool();

    let mut tx = pool.begin().await?;
    let item_request = sqlx::query_as::<_, ItemRequest>(
        "INSERT INTO item_requests (requester_id, name, posted_date, deadline, price, negotiable, condition, description, image)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id, requester_id, name, posted_date, deadline, price, negotiable, condition, description, image",
    )
    .bind(account.id)
    .bind(&payload.name)
    .bind(Utc::now())
    .bind(payload.deadline)
    .bind(payload.price)
    .bind(payload.negotiable)
    .bind(payload.condition_index as i16)
    .bind(&payload.description)
    .bind(&payload.image)
    .fetch_one(&mut *tx)
    .await?;

    set_item_request_categories(&mut tx, item_request.id, &payload.category_pks).await?;
    log_item_request_action(&mut tx, item_request.id, account.id, "created").await?;
    tx.commit().await?;

    mailer::send_mail_activity(
        state.mailer.as_ref(),
        &state.config,
        "Item Request Posted",
        &format!("You have posted a new item request for '{}'!", item_request.name),
        &[account],
    )
    .await;
    schedule_expiry_notice(
        state,
        scheduler::TASK_ITEM_REQUEST_EXPIRY_NOTICE,
        item_request.id,
        item_request.deadline,
    )
    .await;

    Ok(item_request)
}

pub async fn edit_item_request(
    state: &AppState,
    account: &Account,
    item_request_pk: i64,
    payload: ListingPayload,
) -> Result<ItemRequest> {
    let pool = state.db.pool();

    let mut tx = pool.begin().await?;
    let existing = sqlx::query_as::<_, ItemRequest>(GET_ITEM_REQUEST)
        .bind(item_request_pk)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::validation("no such item request"))?;
    if existing.requester_id != account.id {
        return Err(Error::Forbidden);
    }
    validate_listing(&payload, Utc::now().date_naive()).map_err(Error::Validation)?;

    let deadline_changed = existing.deadline != payload.deadline;
    let item_request = sqlx::query_as::<_, ItemRequest>(
        "UPDATE item_requests SET name = $1, deadline = $2, price = $3, negotiable = $4, condition = $5, description = $6, image = $7
         WHERE id = $8
         RETURNING id, requester_id, name, posted_date, deadline, price, negotiable, condition, description, image",
    )
    .bind(&payload.name)
    .bind(payload.deadline)
    .bind(payload.price)
    .bind(payload.negotiable)
    .bind(payload.condition_index as i16)
    .bind(&payload.description)
    .bind(&payload.image)
    .bind(existing.id)
    .fetch_one(&mut *tx)
    .await?;

    set_item_request_categories(&mut tx, item_request.id, &payload.category_pks).await?;
    log_item_request_action(&mut tx, item_request.id, account.id, "edited").await?;
    tx.commit().await?;

    if deadline_changed {
        schedule_expiry_notice(
            state,
            scheduler::TASK_ITEM_REQUEST_EXPIRY_NOTICE,
            item_request.id,
            item_request.deadline,
        )
        .await;
    }
    Ok(item_request)
}

pub async fn delete_item_request(state: &AppState, account: &Account, item_request_pk: i64) -> Result<()> {
    let pool = state.db.pool();
    let existing = sqlx::query_as::<_, ItemRequest>(GET_ITEM_REQUEST)
        .bind(item_request_pk)
        .fetch_optional(&*pool)
        .await?
        .ok_or_else(|| Error::validation("no such item request"))?;
    if existing.requester_id != account.id {
        return Err(Error::Forbidden);
    }
    sqlx::query("DELETE FROM item_requests WHERE id = $1")
        .bind(existing.id)
        .execute(&*pool)
        .await?;

    mailer::send_mail_activity(
        state.mailer.as_ref(),
        &state.config,
        "Item Request Deleted",
        &format!("You have removed your item request for '{}'.", existing.name),
        &[account],
    )
    .await;
    Ok(())
}

async fn set_item_request_categories(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_request_pk: i64,
    category_pks: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM item_request_categories WHERE item_request_id = $1")
        .bind(item_request_pk)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "INSERT INTO item_request_categories (item_request_id, category_id)
         SELECT $1, id FROM categories WHERE id = ANY($2)",
    )
    .bind(item_request_pk)
    .bind(category_pks)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// endregion: --- Item Requests

// region:    --- Flags

/// Report a listing to the admins; the report lands in the moderation queue
/// and the admin mailbox.
pub async fn flag_item(state: &AppState, reporter: &Account, item_pk: i64, text: &str) -> Result<()> {
    let pool = state.db.pool();
    let item = sqlx::query_as::<_, Item>(crate::catalog::queries::GET_ITEM)
        .bind(item_pk)
        .fetch_optional(&*pool)
        .await?
        .ok_or_else(|| Error::validation("no such item"))?;

    sqlx::query("INSERT INTO item_flags (reporter_id, item_id, text) VALUES ($1, $2, $3)")
        .bind(reporter.id)
        .bind(item.id)
        .bind(text)
        .execute(&*pool)
        .await?;

    mailer::send_mail(
        state.mailer.as_ref(),
        "Item Flagged",
        &format!(
            "Item flagged\n\nName: {}\nPrice: {}\nDescription: {}\n\nReporter: {}\nExplanation: {}",
            item.name, item.price, item.description, reporter.username, text
        ),
        &state.config.admin_emails,
    )
    .await;
    Ok(())
}

pub async fn flag_item_request(
    state: &AppState,
    reporter: &Account,
    item_request_pk: i64,
    text: &str,
) -> Result<()> {
    let pool = state.db.pool();
    let item_request = sqlx::query_as::<_, ItemRequest>(GET_ITEM_REQUEST)
        .bind(item_request_pk)
        .fetch_optional(&*pool)
        .await?
        .ok_or_else(|| Error::validation("no such item request"))?;

    sqlx::query(
        "INSERT INTO item_request_flags (reporter_id, item_request_id, text) VALUES ($1, $2, $3)",
    )
    .bind(reporter.id)
    .bind(item_request.id)
    .bind(text)
    .execute(&*pool)
    .await?;

    mailer::send_mail(
        state.mailer.as_ref(),
        "Item Request Flagged",
        &format!(
            "Item request flagged\n\nName: {}\nPrice: {}\nDescription: {}\n\nReporter: {}\nExplanation: {}",
            item_request.name, item_request.price, item_request.description, reporter.username, text
        ),
        &state.config.admin_emails,
    )
    .await;
    Ok(())
}

// endregion: --- Flags

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(deadline: NaiveDate) -> ListingPayload {
        ListingPayload {
            name: "desk lamp".into(),
            deadline,
            price: 1500,
            negotiable: true,
            condition_index: 1,
            description: "warm white, barely used".into(),
            image: "https://images.example/lamp.jpg".into(),
            album: vec![],
            category_pks: vec![],
        }
    }

    #[test]
    fn deadline_window_is_enforced() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        assert!(validate_listing(&payload(today), today).is_ok());
        assert!(validate_listing(&payload(today + Duration::days(365)), today).is_ok());
        assert!(validate_listing(&payload(today - Duration::days(1)), today).is_err());
        assert!(validate_listing(&payload(today + Duration::days(366)), today).is_err());
    }

    #[test]
    fn field_limits_are_enforced() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let mut p = payload(today);
        p.name = String::new();
        assert!(validate_listing(&p, today).is_err());

        let mut p = payload(today);
        p.name = "x".repeat(51);
        assert!(validate_listing(&p, today).is_err());

        let mut p = payload(today);
        p.price = -1;
        assert!(validate_listing(&p, today).is_err());

        let mut p = payload(today);
        p.condition_index = 5;
        assert!(validate_listing(&p, today).is_err());

        let mut p = payload(today);
        p.description = "x".repeat(1001);
        assert!(validate_listing(&p, today).is_err());
    }

    #[test]
    fn expiry_notice_fires_the_day_after_deadline() {
        let deadline = NaiveDate::from_ymd_opt(2026, 9, 10).unwrap();
        let run_at = expiry_notice_run_at(deadline);
        assert_eq!(run_at.date_naive(), NaiveDate::from_ymd_opt(2026, 9, 11).unwrap());
    }
}

// endregion: --- Tests
