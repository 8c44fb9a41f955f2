//! Connection settings for the invoice store.
//!
//! Values are read once at startup, from the process environment and a `.env`
//! file in the working directory (variables already set win). Missing
//! variables fall back to the empty string without complaint; a misconfigured
//! store only shows up when the first query fails.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::debug;

/// Environment variable naming the store endpoint (a database path for the
/// SQLite backend).
pub const STORE_URL_VAR: &str = "DASHBOARD_STORE_URL";
/// Environment variable holding the store access key.
pub const STORE_KEY_VAR: &str = "DASHBOARD_STORE_KEY";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: String,
    /// Credential for hosted backends. The embedded SQLite store has no
    /// notion of access keys and ignores it.
    pub key: String,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }

    /// Read both parameters from the process environment after loading
    /// `.env` from the working directory, if there is one.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded .env from {}", path.display()),
            Err(err) => debug!("No .env loaded: {err}"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit env file, which is
    /// read without touching the process environment. A missing or malformed
    /// file is an error.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, dotenvy::Error> {
        let file = dotenvy::from_path_iter(path.as_ref())?
            .collect::<Result<HashMap<String, String>, _>>()?;
        Ok(Self::from_lookup(|name| {
            std::env::var(name).ok().or_else(|| file.get(name).cloned())
        }))
    }

    /// Build the config from an arbitrary variable lookup, falling back to
    /// empty strings for anything `lookup` does not know.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            url: lookup(STORE_URL_VAR).unwrap_or_default(),
            key: lookup(STORE_KEY_VAR).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.key.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("key", &key)
            .finish()
    }
}
