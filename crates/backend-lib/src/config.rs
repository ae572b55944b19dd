// ============================
// spendtrack-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroize;

/// Default bearer-token lifetime: 1 hour.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;

/// The symmetric token-signing secret.
///
/// Wrapped so it can never end up in logs via `Debug`, and so the key
/// material is wiped from memory when the value is dropped.
#[derive(Clone, Deserialize)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

impl Drop for SigningSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Application settings
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// SQLite database path
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Bearer token TTL in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Token signing secret. Required; sourced from config or the
    /// `SPENDTRACK_SIGNING_SECRET` environment variable, never from code.
    pub signing_secret: SigningSecret,
}

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:3000".parse().unwrap()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("spendtrack.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

impl Settings {
    /// Load settings from `config.toml` and `SPENDTRACK_`-prefixed
    /// environment variables (environment wins).
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings from an explicit config file path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Settings = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SPENDTRACK_"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate field values beyond what deserialization enforces.
    pub fn validate(&self) -> Result<()> {
        if self.signing_secret.is_empty() {
            bail!("signing_secret must not be empty");
        }
        if self.token_ttl_secs == 0 {
            bail!("token_ttl_secs must be greater than zero");
        }
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {},
            other => bail!("invalid log level: {other}"),
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}
