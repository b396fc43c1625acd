//! Client configuration for the remote services.
//!
//! Provides a unified `ClientConfig` used by the CLI to reach the notes
//! service and the read-only Pokémon reference API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

const DEFAULT_NOTES_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_POKEDEX_BASE_URL: &str = "https://pokeapi.co/api/v2";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Endpoints and timeouts for the remote collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the notes REST service.
    pub notes_base_url: String,
    /// Base URL of the Pokémon reference API.
    pub pokedex_base_url: String,
    /// Per-request timeout in seconds, applied to both clients.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            notes_base_url: DEFAULT_NOTES_BASE_URL.to_string(),
            pokedex_base_url: DEFAULT_POKEDEX_BASE_URL.to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment, falling back to defaults.
    ///
    /// Reads `MEMO_API_URL` and `MEMO_POKEDEX_URL`.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides().normalized()
    }

    /// Apply `MEMO_API_URL` / `MEMO_POKEDEX_URL` on top of the current
    /// values. Callers normalize afterwards.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = normalize_text_option(std::env::var("MEMO_API_URL").ok()) {
            self.notes_base_url = url;
        }
        if let Some(url) = normalize_text_option(std::env::var("MEMO_POKEDEX_URL").ok()) {
            self.pokedex_base_url = url;
        }
        self
    }

    /// Validate and normalize both base URLs.
    pub fn normalized(mut self) -> Result<Self> {
        self.notes_base_url = normalize_base_url(&self.notes_base_url, "notes service URL")?;
        self.pokedex_base_url = normalize_base_url(&self.pokedex_base_url, "pokedex API URL")?;
        Ok(self)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn normalize_base_url(raw: &str, what: &str) -> Result<String> {
    let url = normalize_text_option(Some(raw.to_string()))
        .ok_or_else(|| Error::InvalidConfiguration(format!("{what} must not be empty")))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidConfiguration(format!(
            "{what} must include http:// or https://"
        )))
    }
}
