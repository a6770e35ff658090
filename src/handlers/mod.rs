/// HTTP handlers, one module per domain.
// region:    --- Modules
pub mod account;
pub mod admin;
pub mod auth;
pub mod catalog;
pub mod messaging;
pub mod notify;
pub mod trade;

use crate::error::{Error, Result};
use crate::paging::{Direction, PageRequest};

// endregion: --- Modules

// region:    --- Helpers

/// Assemble a validated page request from the three mandatory query params.
pub(crate) fn page_request(
    count: Option<i64>,
    direction: Option<&str>,
    base_pk: Option<i64>,
) -> Result<PageRequest> {
    let count = count.ok_or_else(|| Error::validation("count is required"))?;
    let direction = direction.ok_or_else(|| Error::validation("direction is required"))?;
    let direction = Direction::parse(direction).map_err(|e| Error::validation(e.to_string()))?;
    let base_pk = base_pk.ok_or_else(|| Error::validation("base pk is required"))?;
    PageRequest::new(count, direction, base_pk).map_err(|e| Error::validation(e.to_string()))
}

// endregion: --- Helpers
