/// Immutable audit-trail appends; every accepted mutation records one.
// region:    --- Imports
use chrono::Utc;

// endregion: --- Imports

pub async fn log_item_action(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_pk: i64,
    account_pk: i64,
    log: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO item_logs (item_id, account_id, datetime, log) VALUES ($1, $2, $3, $4)")
        .bind(item_pk)
        .bind(account_pk)
        .bind(Utc::now())
        .bind(log)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn log_transaction_action(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    transaction_pk: i64,
    account_pk: i64,
    log: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO transaction_logs (transaction_id, account_id, datetime, log) VALUES ($1, $2, $3, $4)",
    )
    .bind(transaction_pk)
    .bind(account_pk)
    .bind(Utc::now())
    .bind(log)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn log_item_request_action(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_request_pk: i64,
    account_pk: i64,
    log: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO item_request_logs (item_request_id, account_id, datetime, log) VALUES ($1, $2, $3, $4)",
    )
    .bind(item_request_pk)
    .bind(account_pk)
    .bind(Utc::now())
    .bind(log)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
