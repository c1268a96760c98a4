//! Album artwork and store links from the iTunes Search API.

mod cache;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use cache::ArtworkCache;

use crate::config::{AppConfig, ArtworkConfig};
use crate::error::CoreError;
use crate::models::TrackInfo;

const SEARCH_URL: &str = "https://itunes.apple.com/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a track whose lookup failed is left alone before retrying.
const FAILURE_BACKOFF: Duration = Duration::from_secs(10 * 60);

/// What a lookup found. Both fields empty means the store had no match;
/// that outcome is cached too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkInfo {
    pub artwork_url: Option<String>,
    pub collection_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    result_count: usize,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    collection_name: String,
    artwork_url100: Option<String>,
    collection_view_url: Option<String>,
}

impl From<&SearchResult> for ArtworkInfo {
    fn from(result: &SearchResult) -> Self {
        Self {
            artwork_url: result.artwork_url100.clone(),
            collection_url: result.collection_view_url.clone(),
        }
    }
}

/// Cached, blocking artwork lookup.
///
/// Failed lookups are not cached, but the track is skipped for
/// [`FAILURE_BACKOFF`] so an unreachable store costs one request timeout
/// per track rather than one per tick.
pub struct ArtworkLookup {
    client: reqwest::blocking::Client,
    search_url: String,
    country: String,
    cache: ArtworkCache,
    failed: HashMap<String, Instant>,
    backoff: Duration,
}

impl ArtworkLookup {
    pub fn new(country: impl Into<String>, cache: ArtworkCache) -> Result<Self, CoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tunecast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            search_url: SEARCH_URL.to_string(),
            country: country.into(),
            cache,
            failed: HashMap::new(),
            backoff: FAILURE_BACKOFF,
        })
    }

    /// Lookup backed by the on-disk cache, or `None` when disabled.
    pub fn from_config(config: &ArtworkConfig) -> Result<Option<Self>, CoreError> {
        if !config.enabled {
            return Ok(None);
        }
        let cache = ArtworkCache::open(AppConfig::artwork_cache_path(), config.cache_limit)?;
        Ok(Some(Self::new(&config.country, cache)?))
    }

    /// Artwork for `track`. Failures are logged and yield `None` so the
    /// caller's tick goes on.
    pub fn lookup(&mut self, track: &TrackInfo) -> Option<ArtworkInfo> {
        let key = ArtworkCache::key(track);
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit.clone());
        }
        if let Some(failed_at) = self.failed.get(&key) {
            if failed_at.elapsed() < self.backoff {
                return None;
            }
        }

        match self.fetch(track) {
            Ok(info) => {
                self.failed.remove(&key);
                debug!(title = %track.title, found = info.artwork_url.is_some(), "Artwork fetched");
                self.cache.insert(key, info.clone());
                if let Err(e) = self.cache.save() {
                    warn!(error = %e, "Failed to save artwork cache");
                }
                Some(info)
            }
            Err(e) => {
                warn!(
                    title = %track.title,
                    error = %e,
                    retry_secs = self.backoff.as_secs(),
                    "Artwork lookup failed"
                );
                self.failed.insert(key, Instant::now());
                None
            }
        }
    }

    fn fetch(&self, track: &TrackInfo) -> Result<ArtworkInfo, CoreError> {
        let response = self.search(&track.title, &track.artist, &track.album)?;
        if let Some(result) = select_result(&response, &track.title, &track.album) {
            return Ok(result.into());
        }

        // "Album (Deluxe Edition)" is often listed as plain "Album".
        if let Some(album) = strip_parenthetical(&track.album) {
            let response = self.search(&track.title, &track.artist, album)?;
            if let Some(result) = select_result(&response, &track.title, album) {
                return Ok(result.into());
            }
        }

        Ok(ArtworkInfo::default())
    }

    fn search(&self, title: &str, artist: &str, album: &str) -> Result<SearchResponse, CoreError> {
        let term = format!("{title} {artist} {album}");
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("media", "music"),
                ("entity", "song"),
                ("term", term.as_str()),
                ("country", self.country.as_str()),
            ])
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }
}

/// Pick the result describing this track: the only one, or the first whose
/// album and track names contain ours.
fn select_result<'a>(
    response: &'a SearchResponse,
    title: &str,
    album: &str,
) -> Option<&'a SearchResult> {
    match response.result_count {
        0 => None,
        1 => response.results.first(),
        _ => {
            let album = album.to_lowercase();
            let title = title.to_lowercase();
            response.results.iter().find(|r| {
                r.collection_name.to_lowercase().contains(&album)
                    && r.track_name.to_lowercase().contains(&title)
            })
        }
    }
}

/// `"Album (Deluxe)"` → `"Album"`. `None` when there is no trailing
/// parenthetical or nothing would remain.
fn strip_parenthetical(album: &str) -> Option<&str> {
    let trimmed = album.trim_end();
    if !trimmed.ends_with(')') {
        return None;
    }
    let open = trimmed.find('(')?;
    let stripped = trimmed[..open].trim();
    (!stripped.is_empty()).then_some(stripped)
}
