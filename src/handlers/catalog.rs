/// Listing gallery, detail and owner CRUD endpoints.
// region:    --- Imports
use crate::auth::AuthAccount;
use crate::catalog::commands::{self, ListingOutcome, ListingPayload};
use crate::catalog::model::{Category, Item, ItemRequest, ListingRow, ListingSummary};
use crate::catalog::pages::{select_page, ListingFilter, ListingOrder};
use crate::catalog::queries;
use crate::error::{Error, Result};
use crate::paging::{self, SortType};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Gallery Paging

#[derive(Debug, Deserialize)]
pub struct GalleryParams {
    pub count: Option<i64>,
    pub direction: Option<String>,
    pub base_item_pk: Option<i64>,
    pub base_item_request_pk: Option<i64>,
    pub search_string: Option<String>,
    pub sort_type: Option<String>,
    /// Comma-separated condition ordinals.
    pub condition_indexes: Option<String>,
    /// Comma-separated category pks.
    pub category_pks: Option<String>,
}

fn gallery_filter(params: &GalleryParams) -> Result<ListingFilter> {
    let csv = |raw: &Option<String>| -> Result<Vec<i64>> {
        match raw {
            Some(raw) => {
                paging::parse_csv_ints(raw).map_err(|e| Error::validation(e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    };
    Ok(ListingFilter {
        conditions: csv(&params.condition_indexes)?,
        categories: csv(&params.category_pks)?,
    })
}

fn gallery_order(params: &GalleryParams) -> Result<ListingOrder> {
    match &params.sort_type {
        None => Ok(ListingOrder::Relevance),
        Some(raw) => SortType::parse(raw)
            .map(ListingOrder::Explicit)
            .map_err(|e| Error::validation(e.to_string())),
    }
}

async fn gallery_page(
    state: &AppState,
    sql: &str,
    params: &GalleryParams,
    base_pk: Option<i64>,
) -> Result<Vec<ListingSummary>> {
    let req = super::page_request(params.count, params.direction.as_deref(), base_pk)?;
    let filter = gallery_filter(params)?;
    let order = gallery_order(params)?;

    let rows = sqlx::query_as::<_, ListingRow>(sql)
        .bind(params.search_string.as_deref().unwrap_or(""))
        .fetch_all(&*state.db.pool())
        .await?;

    let page = select_page(rows, &filter, order, &req)
        .map_err(|e| Error::validation(e.to_string()))?;
    Ok(page.into_iter().map(ListingSummary::from).collect())
}

/// `GET /items/get_relative`
pub async fn items_get_relative(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GalleryParams>,
) -> Result<Json<Vec<ListingSummary>>> {
    let page = gallery_page(
        &state,
        queries::SELECT_AVAILABLE_LISTINGS,
        &params,
        params.base_item_pk,
    )
    .await?;
    Ok(Json(page))
}

/// `GET /item_requests/get_relative`
pub async fn item_requests_get_relative(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GalleryParams>,
) -> Result<Json<Vec<ListingSummary>>> {
    let page = gallery_page(
        &state,
        queries::SELECT_ITEM_REQUEST_LISTINGS,
        &params,
        params.base_item_request_pk,
    )
    .await?;
    Ok(Json(page))
}

// endregion: --- Gallery Paging

// region:    --- Detail & Own Listings

#[derive(Debug, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub album: Vec<String>,
    pub category_pks: Vec<i64>,
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(item_pk): Path<i64>,
) -> Result<Json<ItemDetail>> {
    let pool = state.db.pool();
    let item = sqlx::query_as::<_, Item>(queries::GET_ITEM)
        .bind(item_pk)
        .fetch_optional(&*pool)
        .await?
        .ok_or_else(|| Error::validation("no such item"))?;
    let album: Vec<String> =
        sqlx::query_scalar("SELECT image FROM album_images WHERE item_id = $1 ORDER BY id")
            .bind(item.id)
            .fetch_all(&*pool)
            .await?;
    let category_pks: Vec<i64> =
        sqlx::query_scalar("SELECT category_id FROM item_categories WHERE item_id = $1")
            .bind(item.id)
            .fetch_all(&*pool)
            .await?;
    Ok(Json(ItemDetail {
        item,
        album,
        category_pks,
    }))
}

pub async fn get_item_request(
    State(state): State<Arc<AppState>>,
    Path(item_request_pk): Path<i64>,
) -> Result<Json<ItemRequest>> {
    let item_request = sqlx::query_as::<_, ItemRequest>(queries::GET_ITEM_REQUEST)
        .bind(item_request_pk)
        .fetch_optional(&*state.db.pool())
        .await?
        .ok_or_else(|| Error::validation("no such item request"))?;
    Ok(Json(item_request))
}

pub async fn list_own_items(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<Vec<Item>>> {
    let items = sqlx::query_as::<_, Item>(queries::LIST_OWN_ITEMS)
        .bind(account.id)
        .fetch_all(&*state.db.pool())
        .await?;
    Ok(Json(items))
}

pub async fn list_own_item_requests(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<Vec<ItemRequest>>> {
    let item_requests = sqlx::query_as::<_, ItemRequest>(queries::LIST_OWN_ITEM_REQUESTS)
        .bind(account.id)
        .fetch_all(&*state.db.pool())
        .await?;
    Ok(Json(item_requests))
}

pub async fn list_categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Category>>> {
    let categories = sqlx::query_as::<_, Category>(queries::LIST_CATEGORIES)
        .fetch_all(&*state.db.pool())
        .await?;
    Ok(Json(categories))
}

// endregion: --- Detail & Own Listings

// region:    --- Owner CRUD

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Json(payload): Json<ListingPayload>,
) -> Result<Json<Item>> {
    let item = commands::create_item(&state, &account, payload).await?;
    Ok(Json(item))
}

pub async fn edit_item(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(item_pk): Path<i64>,
    Json(payload): Json<ListingPayload>,
) -> Result<Json<Value>> {
    match commands::edit_item(&state, &account, item_pk, payload).await? {
        ListingOutcome::Done(item) => Ok(Json(json!({ "message": "Item edited.", "item": item }))),
        ListingOutcome::Refused(warning) => Ok(Json(json!({ "warning": warning }))),
    }
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(item_pk): Path<i64>,
) -> Result<Json<Value>> {
    match commands::delete_item(&state, &account, item_pk).await? {
        ListingOutcome::Done(()) => Ok(Json(json!({ "message": "Item deleted." }))),
        ListingOutcome::Refused(warning) => Ok(Json(json!({ "warning": warning }))),
    }
}

pub async fn create_item_request(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Json(payload): Json<ListingPayload>,
) -> Result<Json<ItemRequest>> {
    let item_request = commands::create_item_request(&state, &account, payload).await?;
    Ok(Json(item_request))
}

pub async fn edit_item_request(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(item_request_pk): Path<i64>,
    Json(payload): Json<ListingPayload>,
) -> Result<Json<ItemRequest>> {
    let item_request =
        commands::edit_item_request(&state, &account, item_request_pk, payload).await?;
    Ok(Json(item_request))
}

pub async fn delete_item_request(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(item_request_pk): Path<i64>,
) -> Result<Json<Value>> {
    commands::delete_item_request(&state, &account, item_request_pk).await?;
    Ok(Json(json!({ "message": "Item request deleted." })))
}

// endregion: --- Owner CRUD

// region:    --- Flags

#[derive(Debug, Deserialize)]
pub struct FlagPayload {
    pub text: String,
}

pub async fn flag_item(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(item_pk): Path<i64>,
    Json(payload): Json<FlagPayload>,
) -> Result<Json<Value>> {
    commands::flag_item(&state, &account, item_pk, &payload.text).await?;
    Ok(Json(json!({ "message": "Item reported to the admins." })))
}

pub async fn flag_item_request(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(item_request_pk): Path<i64>,
    Json(payload): Json<FlagPayload>,
) -> Result<Json<Value>> {
    commands::flag_item_request(&state, &account, item_request_pk, &payload.text).await?;
    Ok(Json(json!({ "message": "Item request reported to the admins." })))
}

// endregion: --- Flags
