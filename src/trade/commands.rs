/// Purchase/sale lifecycle commands.
///
/// Every state change re-checks the machine's precondition against the row
/// locked at the moment of the write: the transaction row and its item are
/// taken `FOR UPDATE` in one database transaction, so two racing confirms
/// serialize and the loser receives the precondition warning.
// region:    --- Imports
use crate::account::{self, Account};
use crate::audit::{log_item_action, log_transaction_action};
use crate::catalog::model::{Item, ItemStatus};
use crate::catalog::queries::GET_ITEM_FOR_UPDATE;
use crate::error::{Error, Result};
use crate::mailer;
use crate::notify;
use crate::trade::machine::{self, Action, Applied, Outcome, Role, TransactionStatus};
use crate::trade::model::{TransactionRow, TransactionView, LIST_PURCHASES, LIST_SALES};
use crate::AppState;
use serde::Serialize;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Step Result

/// What a lifecycle endpoint reports back. A `Warning` is a refused
/// precondition: the request itself succeeded and nothing was mutated.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StepResult {
    Applied { message: &'static str },
    Warning { warning: &'static str },
}

// endregion: --- Step Result

// region:    --- Create

/// Buyer starts a purchase: freezes the item and opens an initiated
/// transaction.
pub async fn create_purchase(state: &AppState, buyer: &Account, item_pk: i64) -> Result<StepResult> {
    info!("{:<12} --> purchase create item {}", "Trade", item_pk);
    let pool = state.db.pool();

    let mut tx = pool.begin().await?;
    let item = sqlx::query_as::<_, Item>(GET_ITEM_FOR_UPDATE)
        .bind(item_pk)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::validation("no such item"))?;
    let status = ItemStatus::from_i16(item.status)
        .ok_or_else(|| Error::validation("unknown item status"))?;

    if let Err(warning) = machine::check_create(status, item.seller_id == buyer.id) {
        tx.rollback().await?;
        return Ok(StepResult::Warning { warning });
    }

    sqlx::query("UPDATE items SET status = $1 WHERE id = $2")
        .bind(ItemStatus::Frozen.as_i16())
        .bind(item.id)
        .execute(&mut *tx)
        .await?;
    log_item_action(&mut tx, item.id, buyer.id, "froze").await?;

    let transaction_pk: i64 = sqlx::query_scalar(
        "INSERT INTO transactions (item_id, buyer_id, status) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(item.id)
    .bind(buyer.id)
    .bind(TransactionStatus::Initiated.as_i16())
    .fetch_one(&mut *tx)
    .await?;
    log_transaction_action(&mut tx, transaction_pk, buyer.id, "created").await?;
    tx.commit().await?;

    // side effects never block the mutation
    if let Ok(Some(seller)) = account::get_by_pk(&pool, item.seller_id).await {
        mailer::send_mail_activity(
            state.mailer.as_ref(),
            &state.config,
            "Purchase Requested",
            &format!(
                "You have requested to purchase the item '{}' from {}.",
                item.name, seller.name
            ),
            &[buyer],
        )
        .await;
        mailer::send_mail_activity(
            state.mailer.as_ref(),
            &state.config,
            "Sale Requested by a Buyer",
            &format!(
                "Your item '{}' has been requested for sale by {}!",
                item.name, buyer.name
            ),
            &[&seller],
        )
        .await;
        let url = format!("{}/items", state.config.public_url);
        if let Err(e) = notify::notify(
            &pool,
            &state.config,
            &seller,
            &format!("{} has requested to purchase '{}'", buyer.name, item.name),
            &url,
            false,
        )
        .await
        {
            warn!("{:<12} --> seller notification failed: {:?}", "Trade", e);
        }
    }

    Ok(StepResult::Applied {
        message: "Purchase started!",
    })
}

// endregion: --- Create

// region:    --- Steps

/// Apply one actor-gated machine step to a transaction.
pub async fn apply_step(
    state: &AppState,
    actor: &Account,
    transaction_pk: i64,
    role: Role,
    action: Action,
) -> Result<StepResult> {
    info!(
        "{:<12} --> step {:?}/{:?} on transaction {}",
        "Trade", role, action, transaction_pk
    );
    let pool = state.db.pool();

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, TransactionRow>(
        "SELECT id, item_id, buyer_id, status FROM transactions WHERE id = $1 FOR UPDATE",
    )
    .bind(transaction_pk)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| Error::validation("no such transaction"))?;

    let item = sqlx::query_as::<_, Item>(GET_ITEM_FOR_UPDATE)
        .bind(row.item_id)
        .fetch_one(&mut *tx)
        .await?;

    // actor must be the owning party for its role
    let authorized = match role {
        Role::Buyer => row.buyer_id == actor.id,
        Role::Seller => item.seller_id == actor.id,
    };
    if !authorized {
        return Err(Error::Forbidden);
    }

    let status = TransactionStatus::from_i16(row.status)
        .ok_or_else(|| Error::validation("unknown transaction status"))?;

    match machine::step(status, role, action) {
        Outcome::Rejected { warning } => {
            tx.rollback().await?;
            Ok(StepResult::Warning { warning })
        }
        Outcome::Applied(applied) => {
            sqlx::query("UPDATE transactions SET status = $1 WHERE id = $2")
                .bind(applied.transaction_status.as_i16())
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
            log_transaction_action(&mut tx, row.id, actor.id, applied.transaction_log).await?;

            if let Some(item_status) = applied.item_status {
                sqlx::query("UPDATE items SET status = $1 WHERE id = $2")
                    .bind(item_status.as_i16())
                    .bind(item.id)
                    .execute(&mut *tx)
                    .await?;
                if let Some(item_log) = applied.item_log {
                    log_item_action(&mut tx, item.id, actor.id, item_log).await?;
                }
            }

            // acknowledgement opens the buyer<->seller contact relation
            if action == Action::Acknowledge {
                account::add_contact(&mut tx, item.seller_id, row.buyer_id).await?;
            }
            tx.commit().await?;

            side_effects(state, actor, &item, &row, role, &applied).await;
            Ok(StepResult::Applied {
                message: applied.message,
            })
        }
    }
}

/// Best-effort emails + counterparty notification for an accepted step.
async fn side_effects(
    state: &AppState,
    actor: &Account,
    item: &Item,
    row: &TransactionRow,
    role: Role,
    applied: &Applied,
) {
    let pool = state.db.pool();
    let counterparty_pk = match role {
        Role::Buyer => item.seller_id,
        Role::Seller => row.buyer_id,
    };
    let other = match account::get_by_pk(&pool, counterparty_pk).await {
        Ok(Some(a)) => a,
        _ => return,
    };

    let (actor_subject, other_subject, notice) = match (role, applied.transaction_status) {
        (Role::Seller, TransactionStatus::Acknowledged) => (
            "Sale Accepted",
            "Purchase Request Accepted by Seller",
            format!(
                "{} has accepted your purchase request for '{}'",
                actor.name, item.name
            ),
        ),
        (Role::Buyer, TransactionStatus::SellerPending) => (
            "Purchase Confirmed",
            "Sale Awaiting Confirmation",
            format!(
                "{} has confirmed the purchase of '{}' and awaits your confirmation",
                actor.name, item.name
            ),
        ),
        (Role::Seller, TransactionStatus::BuyerPending) => (
            "Sale Confirmed",
            "Purchase Awaiting Confirmation",
            format!(
                "{} has confirmed your purchase of '{}' and awaits your confirmation",
                actor.name, item.name
            ),
        ),
        (Role::Buyer, TransactionStatus::Complete) => (
            "Purchase Completed",
            "Sale Completed",
            format!(
                "{} has confirmed and completed the purchase of '{}'",
                actor.name, item.name
            ),
        ),
        (Role::Seller, TransactionStatus::Complete) => (
            "Sale Completed",
            "Purchase Completed",
            format!(
                "{} has confirmed and completed your purchase of '{}'",
                actor.name, item.name
            ),
        ),
        (Role::Buyer, TransactionStatus::Cancelled) => (
            "Purchase Cancelled",
            "Sale Cancelled by Buyer",
            format!("{} has cancelled the purchase of '{}'", actor.name, item.name),
        ),
        (Role::Seller, TransactionStatus::Cancelled) => (
            "Sale Cancelled",
            "Purchase Cancelled by Seller",
            format!("{} has cancelled your purchase of '{}'", actor.name, item.name),
        ),
        _ => return,
    };

    mailer::send_mail_activity(
        state.mailer.as_ref(),
        &state.config,
        actor_subject,
        applied.message,
        &[actor],
    )
    .await;
    mailer::send_mail_activity(
        state.mailer.as_ref(),
        &state.config,
        other_subject,
        &notice,
        &[&other],
    )
    .await;

    let url = match role {
        // the counterparty of a buyer action reads its sales page
        Role::Buyer => format!("{}/items", state.config.public_url),
        Role::Seller => format!("{}/purchases", state.config.public_url),
    };
    if let Err(e) = notify::notify(&pool, &state.config, &other, &notice, &url, false).await {
        warn!("{:<12} --> counterparty notification failed: {:?}", "Trade", e);
    }
}

// endregion: --- Steps

// region:    --- Listings

pub async fn list_purchases(state: &AppState, buyer_pk: i64) -> Result<Vec<TransactionView>> {
    Ok(sqlx::query_as::<_, TransactionView>(LIST_PURCHASES)
        .bind(buyer_pk)
        .fetch_all(&*state.db.pool())
        .await?)
}

pub async fn list_sales(state: &AppState, seller_pk: i64) -> Result<Vec<TransactionView>> {
    Ok(sqlx::query_as::<_, TransactionView>(LIST_SALES)
        .bind(seller_pk)
        .fetch_all(&*state.db.pool())
        .await?)
}

// endregion: --- Listings
