// region:    --- Imports
use std::env;
use std::time::Duration;

// endregion: --- Imports

// region:    --- Config

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Base URL advertised in notification/email links.
    pub public_url: String,
    /// External mail relay endpoint; empty disables email entirely.
    pub mail_relay_url: String,
    /// CAS server base URL; empty switches login to unvalidated dev mode.
    pub cas_url: String,
    /// Domain appended to a netid for the account's initial email.
    pub email_domain: String,
    pub email_from: String,
    pub admin_usernames: Vec<String>,
    pub admin_emails: Vec<String>,
    /// Expired listings are removed this many days after their deadline.
    pub expiration_buffer_days: i64,
    /// Album images allowed per item.
    pub album_limit: usize,
    /// Identical unseen notifications within this window are not re-created.
    pub notification_cooldown: Duration,
    /// Delay before the "unread notifications" email fires.
    pub unread_email_delay: Duration,
    /// Email verification tokens expire after this long.
    pub verification_token_ttl: Duration,
    /// Scheduler tick period.
    pub sweep_interval: Duration,
}

impl Config {
    /// Build from environment variables; only DATABASE_URL is mandatory.
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            public_url: var_or("PUBLIC_URL", "http://localhost:3000"),
            mail_relay_url: var_or("MAIL_RELAY_URL", ""),
            cas_url: var_or("CAS_URL", ""),
            email_domain: var_or("EMAIL_DOMAIN", "example.edu"),
            email_from: var_or("EMAIL_FROM", "marketplace@localhost"),
            admin_usernames: csv(&var_or("ADMIN_USERNAMES", "")),
            admin_emails: csv(&var_or("ADMIN_EMAILS", "")),
            expiration_buffer_days: int_or("EXPIRATION_BUFFER_DAYS", 14),
            album_limit: int_or("ALBUM_LIMIT", 5) as usize,
            notification_cooldown: Duration::from_secs(int_or("NOTIFICATION_COOLDOWN_SECS", 300) as u64),
            unread_email_delay: Duration::from_secs(int_or("UNREAD_EMAIL_DELAY_SECS", 300) as u64),
            verification_token_ttl: Duration::from_secs(int_or("VERIFICATION_TOKEN_TTL_SECS", 900) as u64),
            sweep_interval: Duration::from_secs(int_or("SWEEP_INTERVAL_SECS", 60) as u64),
        }
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admin_usernames.iter().any(|u| u == username)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn int_or(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// endregion: --- Config
