/// Direct messages between contacts: relative paging over a two-party thread
/// and contact-gated sending.
// region:    --- Imports
use crate::account::{self, Account};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::notify;
use crate::paging::{self, PageRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

// endregion: --- Imports

// region:    --- Model

pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub datetime: DateTime<Utc>,
    pub text: String,
}

/// One page of a thread, split by direction. Both sides stay in thread order
/// and carry their pk, so the client can interleave them and page on from
/// `last_message_pk`.
#[derive(Debug, Serialize)]
pub struct ThreadPage {
    pub sent: Vec<Message>,
    pub received: Vec<Message>,
    pub last_message_pk: Option<i64>,
}

/// Split a windowed thread into the caller's sent and received halves.
pub fn split_thread(window: Vec<Message>, my_pk: i64) -> ThreadPage {
    let last_message_pk = window.last().map(|m| m.id);
    let (sent, received) = window.into_iter().partition(|m| m.sender_id == my_pk);
    ThreadPage {
        sent,
        received,
        last_message_pk,
    }
}

// endregion: --- Model

// region:    --- Operations

/// Relative page over the thread between `me` and `other_pk`, ordered by
/// datetime then pk ascending.
pub async fn thread_page(
    pool: &PgPool,
    me: i64,
    other_pk: i64,
    req: &PageRequest,
) -> Result<ThreadPage> {
    let mut rows = sqlx::query_as::<_, Message>(
        "SELECT id, sender_id, receiver_id, datetime, text FROM messages
         WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)",
    )
    .bind(me)
    .bind(other_pk)
    .fetch_all(pool)
    .await?;

    paging::order_rows(&mut rows, |a, b| a.datetime.cmp(&b.datetime), |r| r.id);
    let window = paging::window(rows, |r| r.id, req)
        .map_err(|e| Error::validation(e.to_string()))?;
    Ok(split_thread(window, me))
}

/// Send a message to a contact. Only accounts connected through an
/// acknowledged transaction may message each other.
pub async fn send_message(
    pool: &PgPool,
    config: &Config,
    sender: &Account,
    receiver_pk: i64,
    text: &str,
) -> Result<Message> {
    if text.is_empty() || text.len() > MAX_MESSAGE_LEN {
        return Err(Error::validation(format!(
            "message must be 1-{MAX_MESSAGE_LEN} characters"
        )));
    }
    if sender.id == receiver_pk {
        return Err(Error::validation("cannot message yourself"));
    }
    if !account::are_contacts(pool, sender.id, receiver_pk).await? {
        return Err(Error::Forbidden);
    }
    let receiver = account::get_by_pk(pool, receiver_pk)
        .await?
        .ok_or_else(|| Error::validation("no such account"))?;

    let message = sqlx::query_as::<_, Message>(
        "INSERT INTO messages (sender_id, receiver_id, datetime, text)
         VALUES ($1, $2, $3, $4)
         RETURNING id, sender_id, receiver_id, datetime, text",
    )
    .bind(sender.id)
    .bind(receiver.id)
    .bind(Utc::now())
    .bind(text)
    .fetch_one(pool)
    .await?;

    // sparse: a burst of messages collapses to one unseen notification
    let url = format!("{}/messages/{}", config.public_url, sender.id);
    if let Err(e) = notify::notify(
        pool,
        config,
        &receiver,
        &format!("You have a new message from {}", sender.name),
        &url,
        true,
    )
    .await
    {
        warn!("{:<12} --> message notification failed: {:?}", "Messaging", e);
    }

    Ok(message)
}

// endregion: --- Operations

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(id: i64, sender: i64, receiver: i64) -> Message {
        Message {
            id,
            sender_id: sender,
            receiver_id: receiver,
            datetime: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, id as u32 % 60).unwrap(),
            text: format!("m{id}"),
        }
    }

    #[test]
    fn split_preserves_order_within_each_direction() {
        let window = vec![msg(1, 7, 9), msg(2, 9, 7), msg(3, 7, 9), msg(4, 9, 7)];
        let page = split_thread(window, 7);
        assert_eq!(page.sent.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(page.received.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(page.last_message_pk, Some(4));
    }

    #[test]
    fn split_of_empty_window() {
        let page = split_thread(vec![], 7);
        assert!(page.sent.is_empty());
        assert!(page.received.is_empty());
        assert_eq!(page.last_message_pk, None);
    }
}

// endregion: --- Tests
