/// Accounts, the symmetric contact relation, and the email-verification
/// token store.
// region:    --- Imports
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// endregion: --- Imports

// region:    --- Model

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub email_activity: bool,
    pub email_unread_notification: bool,
}

const SELECT_ACCOUNT: &str = "SELECT id, username, name, email, contact, email_activity, email_unread_notification FROM accounts";

pub async fn get_by_username(pool: &PgPool, username: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE username = $1"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_pk(pool: &PgPool, pk: i64) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE id = $1"))
        .bind(pk)
        .fetch_optional(pool)
        .await
}

/// Fetch the account for a username, creating it on first login.
pub async fn ensure_account(
    pool: &PgPool,
    username: &str,
    name: &str,
    email: &str,
) -> Result<Account, sqlx::Error> {
    if let Some(account) = get_by_username(pool, username).await? {
        return Ok(account);
    }
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (username, name, email) VALUES ($1, $2, $3)
         RETURNING id, username, name, email, contact, email_activity, email_unread_notification",
    )
    .bind(username)
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await
}

/// Profile fields an account may edit directly. A changed email is handled
/// separately behind a verification token.
#[derive(Debug, Deserialize)]
pub struct AccountUpdate {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub email_activity: bool,
    pub email_unread_notification: bool,
}

pub async fn update_profile(
    pool: &PgPool,
    account: &Account,
    update: &AccountUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE accounts SET name = $1, contact = $2, email_activity = $3, email_unread_notification = $4 WHERE id = $5",
    )
    .bind(&update.name)
    .bind(&update.contact)
    .bind(update.email_activity)
    .bind(update.email_unread_notification)
    .bind(account.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_email(pool: &PgPool, account_pk: i64, email: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE accounts SET email = $1 WHERE id = $2")
        .bind(email)
        .bind(account_pk)
        .execute(pool)
        .await?;
    Ok(())
}

// endregion: --- Model

// region:    --- Contacts

/// Open the symmetric contact relation; both directions are stored so either
/// side can enumerate its contacts with one indexed lookup.
pub async fn add_contact(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    a: i64,
    b: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO contacts (account_id, contact_id) VALUES ($1, $2), ($2, $1)
         ON CONFLICT DO NOTHING",
    )
    .bind(a)
    .bind(b)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn are_contacts(pool: &PgPool, a: i64, b: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM contacts WHERE account_id = $1 AND contact_id = $2)",
    )
    .bind(a)
    .bind(b)
    .fetch_one(pool)
    .await
}

pub async fn list_contacts(pool: &PgPool, account_pk: i64) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "{SELECT_ACCOUNT} WHERE id IN (SELECT contact_id FROM contacts WHERE account_id = $1) ORDER BY name"
    ))
    .bind(account_pk)
    .fetch_all(pool)
    .await
}

// endregion: --- Contacts

// region:    --- Activity Log

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub datetime: DateTime<Utc>,
    pub log: String,
    pub subject: String,
}

/// Audit trail visible to the account: its own actions plus actions taken on
/// objects it owns.
pub async fn activity(pool: &PgPool, account_pk: i64) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    sqlx::query_as::<_, ActivityEntry>(
        r#"
        SELECT l.datetime, l.log, i.name AS subject
        FROM item_logs l JOIN items i ON i.id = l.item_id
        WHERE l.account_id = $1 OR i.seller_id = $1
        UNION ALL
        SELECT l.datetime, l.log, i.name AS subject
        FROM transaction_logs l
        JOIN transactions t ON t.id = l.transaction_id
        JOIN items i ON i.id = t.item_id
        WHERE l.account_id = $1 OR t.buyer_id = $1
        UNION ALL
        SELECT l.datetime, l.log, r.name AS subject
        FROM item_request_logs l JOIN item_requests r ON r.id = l.item_request_id
        WHERE l.account_id = $1 OR r.requester_id = $1
        ORDER BY datetime DESC
        "#,
    )
    .bind(account_pk)
    .fetch_all(pool)
    .await
}

// endregion: --- Activity Log

// region:    --- Verification Token Store

#[derive(Debug, Clone)]
pub struct PendingEmail {
    pub username: String,
    pub email: String,
    expires_at: Instant,
}

/// In-process TTL store for email-verification tokens. Owned here rather than
/// living in a global cache; entries expire after the configured TTL.
pub struct TokenStore {
    entries: Mutex<HashMap<String, PendingEmail>>,
    ttl: Duration,
}

impl TokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Store a pending email change and hand back its one-time token.
    pub fn issue(&self, username: &str, email: &str) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, p| p.expires_at > Instant::now());
        entries.insert(
            token.clone(),
            PendingEmail {
                username: username.to_string(),
                email: email.to_string(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Consume a token, returning its pending change if still valid.
    pub fn redeem(&self, token: &str) -> Option<PendingEmail> {
        let mut entries = self.entries.lock().unwrap();
        let pending = entries.remove(token)?;
        if pending.expires_at <= Instant::now() {
            return None;
        }
        Some(pending)
    }
}

// endregion: --- Verification Token Store

// region:    --- Tests


// endregion: --- Tests
