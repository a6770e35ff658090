// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

// endregion: --- Imports

// region:    --- Error

/// Request-level error taxonomy.
///
/// State-machine precondition violations are deliberately NOT here: those are
/// user-facing warnings returned with a 200, not failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing parameters, unknown cursor, invalid payload.
    #[error("{0}")]
    Validation(String),

    /// No valid session.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but not the owning party (or not an admin).
    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            Error::Db(e) => {
                error!("{:<12} --> database error: {:?}", "Error", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// endregion: --- Error
