/// Account profile endpoints. A changed email is not applied directly: it is
/// parked behind a one-time token and takes effect when the verification link
/// is followed.
// region:    --- Imports
use crate::account::{self, Account, AccountUpdate, ActivityEntry};
use crate::auth::AuthAccount;
use crate::error::{Error, Result};
use crate::mailer;
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

// endregion: --- Imports

pub async fn get_account(AuthAccount(account): AuthAccount) -> Json<Account> {
    Json(account)
}

/// Full payload validation; nothing may be persisted before every field
/// passes. Returns whether the email is changing.
fn validate_update(update: &AccountUpdate, current_email: &str) -> Result<bool> {
    if update.name.is_empty() || update.name.len() > 50 {
        return Err(Error::validation("name must be 1-50 characters"));
    }
    if update.contact.len() > 200 {
        return Err(Error::validation("contact must be at most 200 characters"));
    }
    let email_changed = update.email != current_email;
    if email_changed && !update.email.contains('@') {
        return Err(Error::validation("invalid email address"));
    }
    Ok(email_changed)
}

/// `PUT /account`
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Json(update): Json<AccountUpdate>,
) -> Result<Json<Value>> {
    let email_changed = validate_update(&update, &account.email)?;

    account::update_profile(&state.db.pool(), &account, &update).await?;

    // an email change only lands after the verification link is followed
    if email_changed {
        let token = state.tokens.issue(&account.username, &update.email);
        let link = format!("{}/account/verify_email?token={}", state.config.public_url, token);
        mailer::send_mail(
            state.mailer.as_ref(),
            "Verify Your Email",
            &format!(
                "Follow this link to confirm your new email address: {link}\n\nThe link expires shortly; request the change again if it does."
            ),
            &[update.email.clone()],
        )
        .await;
        return Ok(Json(json!({
            "message": "Profile updated. Check your new email address for a verification link."
        })));
    }

    Ok(Json(json!({ "message": "Profile updated." })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub token: Option<String>,
}

/// `GET /account/verify_email`
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<Value>> {
    let token = params
        .token
        .ok_or_else(|| Error::validation("token is required"))?;
    let pending = state
        .tokens
        .redeem(&token)
        .ok_or_else(|| Error::validation("invalid or expired token"))?;
    let pool = state.db.pool();
    let account = account::get_by_username(&pool, &pending.username)
        .await?
        .ok_or_else(|| Error::validation("no such account"))?;
    account::set_email(&pool, account.id, &pending.email).await?;
    Ok(Json(json!({ "message": "Email verified." })))
}

pub async fn activity(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<Vec<ActivityEntry>>> {
    let entries = account::activity(&state.db.pool(), account.id).await?;
    Ok(Json(entries))
}

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn update(name: &str, contact: &str, email: &str) -> AccountUpdate {
        AccountUpdate {
            name: name.into(),
            contact: contact.into(),
            email: email.into(),
            email_activity: true,
            email_unread_notification: true,
        }
    }

    #[test]
    fn malformed_changed_email_is_rejected_before_anything_persists() {
        // the validator gates the whole payload up front, so a bad email
        // fails the request before update_profile runs
        let err = validate_update(&update("Tiger", "", "not-an-address"), "tiger01@example.edu");
        assert!(err.is_err());
    }

    #[test]
    fn unchanged_email_skips_the_format_check() {
        let email_changed =
            validate_update(&update("Tiger", "", "legacy-no-at"), "legacy-no-at").unwrap();
        assert!(!email_changed);
    }

    #[test]
    fn changed_valid_email_is_flagged_for_verification() {
        let email_changed =
            validate_update(&update("Tiger", "", "new@example.edu"), "old@example.edu").unwrap();
        assert!(email_changed);
    }

    #[test]
    fn name_and_contact_limits() {
        assert!(validate_update(&update("", "", "a@b"), "a@b").is_err());
        assert!(validate_update(&update(&"x".repeat(51), "", "a@b"), "a@b").is_err());
        assert!(validate_update(&update("ok", &"x".repeat(201), "a@b"), "a@b").is_err());
    }
}

// endregion: --- Tests
