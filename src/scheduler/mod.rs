/// Background work: the durable task queue (delayed notification emails,
/// expiry notices) and the expiry sweep that removes listings past their
/// deadline plus grace period.
///
/// Tasks are claimed with a single `UPDATE ... RETURNING`, so concurrent
/// sweepers never run the same task twice, and every handler re-checks its
/// precondition at run time rather than trusting the state at schedule time.
// region:    --- Imports
use crate::account;
use crate::catalog::model::{Item, ItemRequest, ItemStatus};
use crate::catalog::queries::{GET_ITEM, GET_ITEM_REQUEST};
use crate::mailer;
use crate::notify;
use crate::AppState;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Task Queue

pub const TASK_UNREAD_EMAIL: &str = "unread_email";
pub const TASK_ITEM_EXPIRY_NOTICE: &str = "item_expiry_notice";
pub const TASK_ITEM_REQUEST_EXPIRY_NOTICE: &str = "item_request_expiry_notice";

#[derive(Debug, sqlx::FromRow)]
struct Task {
    id: i64,
    kind: String,
    payload: serde_json::Value,
}

/// Enqueue a task to run at or after `run_at`.
pub async fn schedule(
    pool: &PgPool,
    kind: &str,
    payload: serde_json::Value,
    run_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tasks (kind, payload, run_at) VALUES ($1, $2, $3)")
        .bind(kind)
        .bind(payload)
        .bind(run_at)
        .execute(pool)
        .await?;
    Ok(())
}

// endregion: --- Task Queue

// region:    --- Sweeper

/// Periodic background driver: claims due tasks and runs the expiry sweep.
pub struct Sweeper {
    state: Arc<AppState>,
}

impl Sweeper {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn start(&self) {
        let state = Arc::clone(&self.state);
        let period = state.config.sweep_interval;
        tokio::spawn(async move {
            let mut interval = interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = run_once(&state).await {
                    error!("{:<12} --> sweep pass failed: {:?}", "Scheduler", e);
                }
            }
        });
    }
}

/// One pass: run every due task, then sweep expired listings.
pub async fn run_once(state: &AppState) -> Result<(), sqlx::Error> {
    let pool = state.db.pool();

    let due = sqlx::query_as::<_, Task>(
        "UPDATE tasks SET done = TRUE
         WHERE done = FALSE AND run_at <= $1
         RETURNING id, kind, payload",
    )
    .bind(Utc::now())
    .fetch_all(&*pool)
    .await?;

    for task in due {
        debug!("{:<12} --> running task {} ({})", "Scheduler", task.id, task.kind);
        let outcome = match task.kind.as_str() {
            TASK_UNREAD_EMAIL => unread_email(state, &task.payload).await,
            TASK_ITEM_EXPIRY_NOTICE => item_expiry_notice(state, &task.payload).await,
            TASK_ITEM_REQUEST_EXPIRY_NOTICE => item_request_expiry_notice(state, &task.payload).await,
            other => {
                warn!("{:<12} --> unknown task kind '{}'", "Scheduler", other);
                Ok(())
            }
        };
        if let Err(e) = outcome {
            error!("{:<12} --> task {} failed: {:?}", "Scheduler", task.id, e);
        }
    }

    sweep_expired(state).await
}

// endregion: --- Sweeper

// region:    --- Task Handlers

fn payload_pk(payload: &serde_json::Value, key: &str) -> Option<i64> {
    payload.get(key).and_then(|v| v.as_i64())
}

/// Delayed "you have unread notifications" email. A user who saw the
/// notification in the meantime gets nothing.
async fn unread_email(state: &AppState, payload: &serde_json::Value) -> Result<(), sqlx::Error> {
    let pool = state.db.pool();
    let Some(pk) = payload_pk(payload, "notification_pk") else {
        return Ok(());
    };

    let row: Option<(i64, bool)> =
        sqlx::query_as("SELECT account_id, seen FROM notifications WHERE id = $1")
            .bind(pk)
            .fetch_optional(&*pool)
            .await?;
    let Some((account_pk, seen)) = row else { return Ok(()) };
    if seen {
        return Ok(());
    }
    let Some(account) = account::get_by_pk(&pool, account_pk).await? else {
        return Ok(());
    };
    if !account.email_unread_notification {
        return Ok(());
    }

    mailer::send_mail(
        state.mailer.as_ref(),
        "Unread Notifications",
        &format!(
            "You have unread notifications waiting for you: {}/notifications\n\nYou can change your email notification settings here: {}/account/edit",
            state.config.public_url, state.config.public_url
        ),
        &[account.email.clone()],
    )
    .await;
    Ok(())
}

/// Day-after-deadline notice that a still-available item will be removed once
/// the grace period runs out. Skipped when the deadline moved or the item is
/// mid-transaction.
async fn item_expiry_notice(state: &AppState, payload: &serde_json::Value) -> Result<(), sqlx::Error> {
    let pool = state.db.pool();
    let Some(pk) = payload_pk(payload, "pk") else { return Ok(()) };

    let Some(item) = sqlx::query_as::<_, Item>(GET_ITEM)
        .bind(pk)
        .fetch_optional(&*pool)
        .await?
    else {
        return Ok(());
    };
    let today = Utc::now().date_naive();
    if item.deadline >= today || item.status != ItemStatus::Available.as_i16() {
        return Ok(());
    }
    let Some(seller) = account::get_by_pk(&pool, item.seller_id).await? else {
        return Ok(());
    };

    let buffer = state.config.expiration_buffer_days;
    let text = format!(
        "Your item '{}' has passed its deadline and will be removed in {} days unless you extend it",
        item.name, buffer
    );
    if let Err(e) = notify::notify(
        &pool,
        &state.config,
        &seller,
        &text,
        &format!("{}/items", state.config.public_url),
        true,
    )
    .await
    {
        warn!("{:<12} --> expiry notice failed: {:?}", "Scheduler", e);
    }
    mailer::send_mail_activity(state.mailer.as_ref(), &state.config, "Item Expiring", &text, &[&seller])
        .await;
    Ok(())
}

async fn item_request_expiry_notice(
    state: &AppState,
    payload: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    let pool = state.db.pool();
    let Some(pk) = payload_pk(payload, "pk") else { return Ok(()) };

    let Some(item_request) = sqlx::query_as::<_, ItemRequest>(GET_ITEM_REQUEST)
        .bind(pk)
        .fetch_optional(&*pool)
        .await?
    else {
        return Ok(());
    };
    if item_request.deadline >= Utc::now().date_naive() {
        return Ok(());
    }
    let Some(requester) = account::get_by_pk(&pool, item_request.requester_id).await? else {
        return Ok(());
    };

    let buffer = state.config.expiration_buffer_days;
    let text = format!(
        "Your item request for '{}' has passed its deadline and will be removed in {} days unless you extend it",
        item_request.name, buffer
    );
    if let Err(e) = notify::notify(
        &pool,
        &state.config,
        &requester,
        &text,
        &format!("{}/item_requests", state.config.public_url),
        true,
    )
    .await
    {
        warn!("{:<12} --> expiry notice failed: {:?}", "Scheduler", e);
    }
    mailer::send_mail_activity(
        state.mailer.as_ref(),
        &state.config,
        "Item Request Expiring",
        &text,
        &[&requester],
    )
    .await;
    Ok(())
}

// endregion: --- Task Handlers

// region:    --- Expiry Sweep

/// An item is removable once the grace period past its deadline has elapsed,
/// and only while it is still available. A frozen or completed item belongs
/// to its transaction and is never swept.
pub fn sweep_eligible(status: i16, deadline: NaiveDate, today: NaiveDate, buffer_days: i64) -> bool {
    status == ItemStatus::Available.as_i16() && deadline + ChronoDuration::days(buffer_days) < today
}

async fn sweep_expired(state: &AppState) -> Result<(), sqlx::Error> {
    let pool = state.db.pool();
    let today = Utc::now().date_naive();
    let cutoff = today - ChronoDuration::days(state.config.expiration_buffer_days);

    let expired_items = sqlx::query_as::<_, Item>(&format!(
        "{GET_ITEM_LIST_PREFIX} WHERE status = 0 AND deadline < $1"
    ))
    .bind(cutoff)
    .fetch_all(&*pool)
    .await?;
    for item in expired_items {
        info!("{:<12} --> removing expired item {} '{}'", "Scheduler", item.id, item.name);
        if let Some(seller) = account::get_by_pk(&pool, item.seller_id).await? {
            let text = format!("Your expired item '{}' has been removed", item.name);
            mailer::send_mail_activity(state.mailer.as_ref(), &state.config, "Item Expired", &text, &[&seller])
                .await;
            if let Err(e) = notify::notify(
                &pool,
                &state.config,
                &seller,
                &text,
                &format!("{}/items", state.config.public_url),
                true,
            )
            .await
            {
                warn!("{:<12} --> expiry notification failed: {:?}", "Scheduler", e);
            }
        }
        sqlx::query("DELETE FROM items WHERE id = $1 AND status = 0")
            .bind(item.id)
            .execute(&*pool)
            .await?;
    }

    let expired_requests = sqlx::query_as::<_, ItemRequest>(&format!(
        "{GET_ITEM_REQUEST_LIST_PREFIX} WHERE deadline < $1"
    ))
    .bind(cutoff)
    .fetch_all(&*pool)
    .await?;
    for item_request in expired_requests {
        info!(
            "{:<12} --> removing expired item request {} '{}'",
            "Scheduler", item_request.id, item_request.name
        );
        if let Some(requester) = account::get_by_pk(&pool, item_request.requester_id).await? {
            let text = format!(
                "Your expired item request for '{}' has been removed",
                item_request.name
            );
            mailer::send_mail_activity(
                state.mailer.as_ref(),
                &state.config,
                "Item Request Expired",
                &text,
                &[&requester],
            )
            .await;
            if let Err(e) = notify::notify(
                &pool,
                &state.config,
                &requester,
                &text,
                &format!("{}/item_requests", state.config.public_url),
                true,
            )
            .await
            {
                warn!("{:<12} --> expiry notification failed: {:?}", "Scheduler", e);
            }
        }
        sqlx::query("DELETE FROM item_requests WHERE id = $1")
            .bind(item_request.id)
            .execute(&*pool)
            .await?;
    }

    Ok(())
}

const GET_ITEM_LIST_PREFIX: &str =
    "SELECT id, seller_id, name, posted_date, deadline, price, negotiable, condition, description, image, status FROM items";
const GET_ITEM_REQUEST_LIST_PREFIX: &str =
    "SELECT id, requester_id, name, posted_date, deadline, price, negotiable, condition, description, image FROM item_requests";

// endregion: --- Expiry Sweep

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn available_item_is_swept_after_grace_period() {
        let today = d(2026, 9, 20);
        assert!(sweep_eligible(0, d(2026, 9, 1), today, 14));
    }

    #[test]
    fn grace_period_protects_recently_expired() {
        let today = d(2026, 9, 10);
        assert!(!sweep_eligible(0, d(2026, 9, 1), today, 14));
        // exactly at the boundary is still kept
        assert!(!sweep_eligible(0, d(2026, 9, 1), d(2026, 9, 15), 14));
        assert!(sweep_eligible(0, d(2026, 9, 1), d(2026, 9, 16), 14));
    }

    #[test]
    fn frozen_and_complete_items_are_never_swept() {
        let today = d(2027, 1, 1);
        assert!(!sweep_eligible(1, d(2026, 9, 1), today, 14));
        assert!(!sweep_eligible(2, d(2026, 9, 1), today, 14));
    }
}

// endregion: --- Tests
