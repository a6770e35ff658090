/// CAS login, bearer-token sessions, and the request extractors that gate
/// authenticated and admin endpoints.
// region:    --- Imports
use crate::account::{self, Account};
use crate::error::{Error, Result};
use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

// endregion: --- Imports

// region:    --- Session Store

/// In-process bearer-token sessions, token -> username.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, username: &str) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        self.sessions
            .lock()
            .unwrap()
            .insert(token.clone(), username.to_string());
        token
    }

    pub fn username_for(&self, token: &str) -> Option<String> {
        self.sessions.lock().unwrap().get(token).cloned()
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// endregion: --- Session Store

// region:    --- CAS

/// Validate a CAS v1 service ticket; the response body is `yes\n<netid>` on
/// success and `no` otherwise. With no CAS server configured the ticket is
/// taken as the netid itself, for local development.
async fn validate_ticket(state: &AppState, ticket: &str, service: &str) -> Result<String> {
    if state.config.cas_url.is_empty() {
        return Ok(ticket.to_string());
    }

    let url = format!(
        "{}/validate?service={}&ticket={}",
        state.config.cas_url, service, ticket
    );
    let body = state
        .http
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::validation(format!("ticket validation unreachable: {e}")))?
        .text()
        .await
        .map_err(|e| Error::validation(format!("ticket validation unreadable: {e}")))?;

    let mut lines = body.lines();
    match (lines.next(), lines.next()) {
        (Some("yes"), Some(netid)) if !netid.is_empty() => Ok(netid.trim().to_string()),
        _ => Err(Error::Unauthenticated),
    }
}

/// Exchange a CAS ticket for a session token, creating the account on first
/// login.
pub async fn login(state: &AppState, ticket: &str, service: &str) -> Result<(String, Account)> {
    let username = validate_ticket(state, ticket, service).await?;
    let pool = state.db.pool();
    let email = format!("{}@{}", username, state.config.email_domain);
    let account = account::ensure_account(&pool, &username, &username, &email).await?;
    let token = state.sessions.issue(&account.username);
    info!("{:<12} --> {} logged in", "Auth", account.username);
    Ok((token, account))
}

pub fn logout(state: &AppState, token: &str) {
    state.sessions.revoke(token);
}

// endregion: --- CAS

// region:    --- Extractors

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The logged-in account, resolved from the bearer token.
pub struct AuthAccount(pub Account);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthAccount {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self> {
        let token = bearer_token(parts).ok_or(Error::Unauthenticated)?;
        let username = state
            .sessions
            .username_for(token)
            .ok_or(Error::Unauthenticated)?;
        let account = account::get_by_username(&state.db.pool(), &username)
            .await?
            .ok_or(Error::Unauthenticated)?;
        Ok(AuthAccount(account))
    }
}

/// Same as [`AuthAccount`] but only for configured admins.
pub struct AdminAccount(pub Account);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAccount {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self> {
        let AuthAccount(account) = AuthAccount::from_request_parts(parts, state).await?;
        if !state.config.is_admin(&account.username) {
            return Err(Error::Forbidden);
        }
        Ok(AdminAccount(account))
    }
}

// endregion: --- Extractors

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trip() {
        let store = SessionStore::new();
        let token = store.issue("tiger01");
        assert_eq!(store.username_for(&token).as_deref(), Some("tiger01"));
        store.revoke(&token);
        assert!(store.username_for(&token).is_none());
    }

    #[test]
    fn unknown_token_has_no_session() {
        let store = SessionStore::new();
        assert!(store.username_for("nope").is_none());
    }
}

// endregion: --- Tests
