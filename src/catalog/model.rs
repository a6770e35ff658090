// region:    --- Imports
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Enums

/// Listings may be posted at most this far into the future.
pub const MAX_DEADLINE_DAYS: i64 = 365;

/// Item lifecycle status; a projection of the active transaction's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Available,
    Frozen,
    Complete,
}

impl ItemStatus {
    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            0 => Some(ItemStatus::Available),
            1 => Some(ItemStatus::Frozen),
            2 => Some(ItemStatus::Complete),
            _ => None,
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            ItemStatus::Available => 0,
            ItemStatus::Frozen => 1,
            ItemStatus::Complete => 2,
        }
    }
}

/// Five-level condition ordinal shared by items and item requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    New,
    LikeNew,
    GentlyLoved,
    WellLoved,
    Poor,
}

impl Condition {
    pub fn from_index(v: i64) -> Option<Self> {
        match v {
            0 => Some(Condition::New),
            1 => Some(Condition::LikeNew),
            2 => Some(Condition::GentlyLoved),
            3 => Some(Condition::WellLoved),
            4 => Some(Condition::Poor),
            _ => None,
        }
    }
}

// endregion: --- Enums

// region:    --- Rows

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub posted_date: DateTime<Utc>,
    pub deadline: NaiveDate,
    /// Price in cents.
    pub price: i64,
    pub negotiable: bool,
    pub condition: i16,
    pub description: String,
    pub image: String,
    pub status: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemRequest {
    pub id: i64,
    pub requester_id: i64,
    pub name: String,
    pub posted_date: DateTime<Utc>,
    pub deadline: NaiveDate,
    pub price: i64,
    pub negotiable: bool,
    pub condition: i16,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Row shape consumed by the pagination pipeline, shared by items and item
/// requests. `rank` is the database-computed full-text relevance of the
/// current search string; `album` stays empty for item requests.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub name: String,
    pub posted_date: DateTime<Utc>,
    pub deadline: NaiveDate,
    pub price: i64,
    pub negotiable: bool,
    pub condition: i16,
    pub description: String,
    pub image: String,
    pub rank: f32,
    pub categories: Vec<i64>,
    pub album: Vec<String>,
    pub contact: String,
    pub email: String,
}

/// Wire form of a gallery entry.
#[derive(Debug, Serialize)]
pub struct ListingSummary {
    pub pk: i64,
    pub name: String,
    pub posted_date: DateTime<Utc>,
    pub deadline: NaiveDate,
    pub price: i64,
    pub negotiable: bool,
    pub condition_index: i16,
    pub description: String,
    pub image: String,
    pub album: Vec<String>,
    pub contact: String,
    pub email: String,
}

impl From<ListingRow> for ListingSummary {
    fn from(row: ListingRow) -> Self {
        Self {
            pk: row.id,
            name: row.name,
            posted_date: row.posted_date,
            deadline: row.deadline,
            price: row.price,
            negotiable: row.negotiable,
            condition_index: row.condition,
            description: row.description,
            image: row.image,
            album: row.album,
            contact: row.contact,
            email: row.email,
        }
    }
}

// endregion: --- Rows
