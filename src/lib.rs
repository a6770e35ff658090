// region:    --- Modules
pub mod account;
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod messaging;
pub mod notify;
pub mod paging;
pub mod scheduler;
pub mod trade;

use crate::account::TokenStore;
use crate::auth::SessionStore;
use crate::config::Config;
use crate::database::DatabaseManager;
use crate::mailer::Mailer;

// endregion: --- Modules

// region:    --- App State

/// Shared service state handed to every handler.
pub struct AppState {
    pub db: DatabaseManager,
    pub config: Config,
    pub mailer: Box<dyn Mailer>,
    pub sessions: SessionStore,
    pub tokens: TokenStore,
    pub http: reqwest::Client,
}

impl AppState {
    pub async fn new(config: Config) -> Self {
        let db = DatabaseManager::new(&config.database_url).await;
        let mailer = mailer::build(&config);
        let tokens = TokenStore::new(config.verification_token_ttl);
        Self {
            db,
            config,
            mailer,
            sessions: SessionStore::new(),
            tokens,
            http: reqwest::Client::new(),
        }
    }
}

// endregion: --- App State
