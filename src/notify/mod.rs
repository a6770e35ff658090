/// In-app notifications: sparse creation, unseen counting, marking seen, and
/// relative paging. The "unread notifications" email is delayed through the
/// task queue so a user who reads the notification first suppresses it.
// region:    --- Imports
use crate::account::Account;
use crate::config::Config;
use crate::paging::{self, PageRequest};
use crate::scheduler;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

// endregion: --- Imports

// region:    --- Model

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub account_id: i64,
    pub datetime: DateTime<Utc>,
    pub text: String,
    pub seen: bool,
    pub url: String,
}

// endregion: --- Model

// region:    --- Creation

/// An identical unseen notification created within the cooldown suppresses a
/// sparse re-creation.
pub fn suppress_sparse(
    last_unseen_same_text: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: ChronoDuration,
) -> bool {
    matches!(last_unseen_same_text, Some(recent) if now < recent + cooldown)
}

/// Create a notification for `account`; with `sparse`, identical unseen text
/// within the cooldown window is not re-created. Failure to schedule the
/// follow-up email never fails the caller.
pub async fn notify(
    pool: &PgPool,
    config: &Config,
    account: &Account,
    text: &str,
    url: &str,
    sparse: bool,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    if sparse {
        let recent: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT MAX(datetime) FROM notifications WHERE account_id = $1 AND text = $2 AND NOT seen",
        )
        .bind(account.id)
        .bind(text)
        .fetch_one(pool)
        .await?;
        let cooldown = ChronoDuration::from_std(config.notification_cooldown)
            .unwrap_or_else(|_| ChronoDuration::minutes(5));
        if suppress_sparse(recent, now, cooldown) {
            return Ok(());
        }
    }

    // the delayed email fires only for the first unseen notification, so the
    // inbox has to be checked before the insert
    let had_unseen: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM notifications WHERE account_id = $1 AND NOT seen)",
    )
    .bind(account.id)
    .fetch_one(pool)
    .await?;

    let pk: i64 = sqlx::query_scalar(
        "INSERT INTO notifications (account_id, datetime, text, seen, url)
         VALUES ($1, $2, $3, FALSE, $4) RETURNING id",
    )
    .bind(account.id)
    .bind(now)
    .bind(text)
    .bind(url)
    .fetch_one(pool)
    .await?;

    if !had_unseen && account.email_unread_notification {
        let delay = ChronoDuration::from_std(config.unread_email_delay)
            .unwrap_or_else(|_| ChronoDuration::minutes(5));
        if let Err(e) = scheduler::schedule(
            pool,
            scheduler::TASK_UNREAD_EMAIL,
            serde_json::json!({ "notification_pk": pk }),
            now + delay,
        )
        .await
        {
            warn!("{:<12} --> could not schedule unread email: {:?}", "Notify", e);
        }
    }

    Ok(())
}

// endregion: --- Creation

// region:    --- Queries

pub async fn count_unseen(pool: &PgPool, account_pk: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE account_id = $1 AND NOT seen")
        .bind(account_pk)
        .fetch_one(pool)
        .await
}

/// Mark the given notifications seen; `None` means all of the account's.
pub async fn see(pool: &PgPool, account_pk: i64, pks: Option<&[i64]>) -> Result<(), sqlx::Error> {
    match pks {
        Some(pks) => {
            sqlx::query(
                "UPDATE notifications SET seen = TRUE WHERE account_id = $1 AND id = ANY($2)",
            )
            .bind(account_pk)
            .bind(pks)
            .execute(pool)
            .await?;
        }
        None => {
            sqlx::query("UPDATE notifications SET seen = TRUE WHERE account_id = $1")
                .bind(account_pk)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

/// Relative page over the account's notifications, ordered by datetime then
/// pk ascending.
pub async fn page(
    pool: &PgPool,
    account_pk: i64,
    req: &PageRequest,
) -> Result<Vec<Notification>, crate::error::Error> {
    let mut rows = sqlx::query_as::<_, Notification>(
        "SELECT id, account_id, datetime, text, seen, url FROM notifications WHERE account_id = $1",
    )
    .bind(account_pk)
    .fetch_all(pool)
    .await?;

    paging::order_rows(&mut rows, |a, b| a.datetime.cmp(&b.datetime), |r| r.id);
    paging::window(rows, |r| r.id, req)
        .map_err(|e| crate::error::Error::validation(e.to_string()))
}

// endregion: --- Queries

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_suppression_inside_cooldown() {
        let now = Utc::now();
        let cooldown = ChronoDuration::minutes(5);
        assert!(suppress_sparse(Some(now - ChronoDuration::minutes(2)), now, cooldown));
    }

    #[test]
    fn sparse_allows_after_cooldown() {
        let now = Utc::now();
        let cooldown = ChronoDuration::minutes(5);
        assert!(!suppress_sparse(Some(now - ChronoDuration::minutes(9)), now, cooldown));
    }

    #[test]
    fn sparse_allows_when_no_unseen_duplicate() {
        assert!(!suppress_sparse(None, Utc::now(), ChronoDuration::minutes(5)));
    }
}

// endregion: --- Tests
