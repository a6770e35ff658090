// region:    --- Imports
use serde::Serialize;

// endregion: --- Imports

// region:    --- Rows

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub item_id: i64,
    pub buyer_id: i64,
    pub status: i16,
}

/// One entry on the purchases/sales pages.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TransactionView {
    pub pk: i64,
    pub item_pk: i64,
    pub item_name: String,
    pub buyer_pk: i64,
    pub seller_pk: i64,
    pub status: i16,
    pub status_label: String,
}

pub const LIST_PURCHASES: &str = r#"
    SELECT t.id AS pk, t.item_id AS item_pk, i.name AS item_name,
           t.buyer_id AS buyer_pk, i.seller_id AS seller_pk, t.status,
           CASE t.status
               WHEN 0 THEN 'initiated' WHEN 1 THEN 'acknowledged'
               WHEN 2 THEN 'seller pending' WHEN 3 THEN 'buyer pending'
               WHEN 4 THEN 'complete' ELSE 'cancelled'
           END AS status_label
    FROM transactions t JOIN items i ON i.id = t.item_id
    WHERE t.buyer_id = $1
    ORDER BY t.id DESC
"#;

pub const LIST_SALES: &str = r#"
    SELECT t.id AS pk, t.item_id AS item_pk, i.name AS item_name,
           t.buyer_id AS buyer_pk, i.seller_id AS seller_pk, t.status,
           CASE t.status
               WHEN 0 THEN 'initiated' WHEN 1 THEN 'acknowledged'
               WHEN 2 THEN 'seller pending' WHEN 3 THEN 'buyer pending'
               WHEN 4 THEN 'complete' ELSE 'cancelled'
           END AS status_label
    FROM transactions t JOIN items i ON i.id = t.item_id
    WHERE i.seller_id = $1
    ORDER BY t.id DESC
"#;

// endregion: --- Rows
