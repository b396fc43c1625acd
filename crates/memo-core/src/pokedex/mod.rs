//! Read-only client for the Pokémon reference API.
//!
//! The consumption pattern here is fetch-the-list-then-fan-out: one list
//! call, then parallel per-item detail calls joined back in list order.
//! Responses are cached for a few minutes; when a refresh fails, an expired
//! entry is served rather than nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::api::error_from_response;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// A name/url pair, the API's universal reference shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// One page of the pokemon list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonList {
    pub count: u64,
    pub results: Vec<NamedResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

/// Per-pokemon detail payload, reduced to the fields the panel displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u64,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeList {
    pub results: Vec<NamedResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TypePokemonEntry {
    pokemon: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TypeDetail {
    pokemon: Vec<TypePokemonEntry>,
}

/// Sort key for the panel's client-side ordering, independent of the notes
/// list (which always keeps server order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PokemonSortKey {
    Id,
    Name,
    Height,
    Weight,
}

/// Sort a detail list in place by the user-chosen key.
pub fn sort_pokemon(list: &mut [Pokemon], key: PokemonSortKey) {
    match key {
        PokemonSortKey::Id => list.sort_by_key(|pokemon| pokemon.id),
        PokemonSortKey::Name => list.sort_by(|a, b| a.name.cmp(&b.name)),
        PokemonSortKey::Height => list.sort_by_key(|pokemon| pokemon.height),
        PokemonSortKey::Weight => list.sort_by_key(|pokemon| pokemon.weight),
    }
}

struct CacheEntry {
    fetched_at: Instant,
    payload: serde_json::Value,
}

/// Client for the Pokémon reference API (read-only, no write path).
#[derive(Clone)]
pub struct PokedexClient {
    base_url: String,
    client: reqwest::Client,
    cache_ttl: Duration,
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl PokedexClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            base_url: config.pokedex_base_url.clone(),
            client,
            cache_ttl: CACHE_TTL,
            cache: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Override the cache lifetime; tests use short values.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub async fn list(&self, limit: u32, offset: u32) -> Result<PokemonList> {
        self.get_cached(&format!("/pokemon?limit={limit}&offset={offset}"))
            .await
    }

    pub async fn details(&self, name_or_id: &str) -> Result<Pokemon> {
        self.get_cached(&format!("/pokemon/{}", urlencoding::encode(name_or_id)))
            .await
    }

    pub async fn types(&self) -> Result<TypeList> {
        self.get_cached("/type").await
    }

    /// Names of the pokemon belonging to a type, for filtering.
    pub async fn by_type(&self, type_name: &str) -> Result<Vec<NamedResource>> {
        let detail: TypeDetail = self
            .get_cached(&format!("/type/{}", urlencoding::encode(type_name)))
            .await?;
        Ok(detail
            .pokemon
            .into_iter()
            .map(|entry| entry.pokemon)
            .collect())
    }

    /// Fetch one list page and fan out the per-item detail calls in
    /// parallel, returning details in list order. Fails fast on the first
    /// detail error.
    pub async fn list_with_details(&self, limit: u32, offset: u32) -> Result<Vec<Pokemon>> {
        let list = self.list(limit, offset).await?;

        let mut tasks = JoinSet::new();
        for (index, entry) in list.results.iter().enumerate() {
            let client = self.clone();
            let name = entry.name.clone();
            tasks.spawn(async move { (index, client.details(&name).await) });
        }

        let mut details: Vec<Option<Pokemon>> = (0..list.results.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) =
                joined.map_err(|error| Error::Other(format!("detail fetch failed: {error}")))?;
            details[index] = Some(outcome?);
        }

        Ok(details.into_iter().flatten().collect())
    }

    async fn get_cached<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);

        if let Some(payload) = self.cached_payload(&url, false).await {
            return decode(payload);
        }

        match self.fetch_json(&url).await {
            Ok(payload) => {
                let mut cache = self.cache.lock().await;
                cache.insert(
                    url,
                    CacheEntry {
                        fetched_at: Instant::now(),
                        payload: payload.clone(),
                    },
                );
                decode(payload)
            }
            Err(error) => {
                // A stale answer beats no answer for reference data.
                if let Some(payload) = self.cached_payload(&url, true).await {
                    tracing::debug!("serving expired cache entry for {url}: {error}");
                    return decode(payload);
                }
                Err(error)
            }
        }
    }

    async fn cached_payload(&self, url: &str, allow_expired: bool) -> Option<serde_json::Value> {
        let cache = self.cache.lock().await;
        let entry = cache.get(url)?;
        if allow_expired || entry.fetched_at.elapsed() < self.cache_ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<serde_json::Value>().await?)
    }
}

fn decode<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|error| Error::Other(format!("invalid response payload: {error}")))
}
