//! Runtime configuration read from `SMARTLOCK_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use smartlock_access::{KeypadConfig, LockoutPolicy};
use smartlock_core::UserId;
use smartlock_core::constants::{DEFAULT_LOCKOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS};

pub const ENV_AUTHORIZED_USER: &str = "SMARTLOCK_AUTHORIZED_USER";
pub const ENV_CODES_FILE: &str = "SMARTLOCK_CODES_FILE";
pub const ENV_KEY_FILE: &str = "SMARTLOCK_KEY_FILE";
pub const ENV_MAX_ATTEMPTS: &str = "SMARTLOCK_MAX_ATTEMPTS";
pub const ENV_LOCKOUT_SECS: &str = "SMARTLOCK_LOCKOUT_SECS";
pub const ENV_POLL_MS: &str = "SMARTLOCK_POLL_MS";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// The only remote caller allowed to issue commands
    pub authorized_user: UserId,

    /// Encrypted credential file
    pub codes_file: PathBuf,

    /// Key file, generated on first start
    pub key_file: PathBuf,

    /// Consecutive failures before the keypad locks out
    pub max_attempts: u32,

    /// Lockout length in seconds
    pub lockout_secs: i64,

    /// Keypad poll interval
    pub poll_interval: Duration,
}

impl AppConfig {
    /// Configuration with defaults for everything but the operator.
    pub fn new(authorized_user: UserId) -> Self {
        Self {
            authorized_user,
            codes_file: PathBuf::from("codes.json.enc"),
            key_file: PathBuf::from("secret.key"),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_secs: DEFAULT_LOCKOUT_SECS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Read the process environment.
    ///
    /// # Errors
    ///
    /// Fails when the authorized user is missing or any set variable does
    /// not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let authorized_user = lookup(ENV_AUTHORIZED_USER)
            .with_context(|| format!("{ENV_AUTHORIZED_USER} is not set"))?
            .parse::<UserId>()
            .with_context(|| format!("{ENV_AUTHORIZED_USER} must be a numeric user id"))?;

        let mut config = Self::new(authorized_user);

        if let Some(path) = lookup(ENV_CODES_FILE) {
            config = config.codes_file(path);
        }
        if let Some(path) = lookup(ENV_KEY_FILE) {
            config = config.key_file(path);
        }
        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            let attempts = value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("{ENV_MAX_ATTEMPTS}: invalid number {value:?}"))?;
            config = config.max_attempts(attempts);
        }
        if let Some(value) = lookup(ENV_LOCKOUT_SECS) {
            let secs = value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("{ENV_LOCKOUT_SECS}: invalid number {value:?}"))?;
            config = config.lockout_secs(i64::from(secs));
        }
        if let Some(value) = lookup(ENV_POLL_MS) {
            let ms = value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_POLL_MS}: invalid number {value:?}"))?;
            config = config.poll_interval(Duration::from_millis(ms.max(1)));
        }

        Ok(config)
    }

    pub fn codes_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.codes_file = path.into();
        self
    }

    pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = path.into();
        self
    }

    /// Set the lockout threshold. Zero is raised to one.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn lockout_secs(mut self, secs: i64) -> Self {
        self.lockout_secs = secs;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(self.max_attempts, chrono::Duration::seconds(self.lockout_secs))
    }

    pub fn keypad_config(&self) -> KeypadConfig {
        KeypadConfig::default().with_poll_interval(self.poll_interval)
    }
}
