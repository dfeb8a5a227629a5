//! Batch enrichment of a roster with per-member war stars
//!
//! The member roster endpoint does not include war stars, so the application
//! backfills them by fetching individual player profiles. Profiles are
//! fetched in small concurrent groups with a fixed pause between groups to
//! stay under the API's rate limit. Results merge key-wise into one shared
//! cache entry, so a member is fetched at most once per TTL window and a
//! partial round never wipes out what earlier rounds collected.

use super::{encode_tag, normalize_tag, ClanMember, Player};
use crate::api::{ApiClient, ApiError};
use crate::cache::{CacheStore, ResourceKind};
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;

/// Mapping from canonical `#`-prefixed player tag to war-star count
pub type WarStarsMap = HashMap<String, u32>;

/// Player fetches issued concurrently per group
const FETCH_GROUP_SIZE: usize = 5;

/// Pause between fetch groups
const GROUP_PACING: Duration = Duration::from_millis(500);

/// Collects war-star counts for a roster via grouped player fetches
#[derive(Debug, Clone)]
pub struct WarStarsClient {
    api: ApiClient,
    cache: Option<CacheStore>,
}

impl WarStarsClient {
    /// Creates a client using the default XDG cache location
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            cache: CacheStore::new(),
        }
    }

    /// Creates a client backed by a specific cache store
    #[allow(dead_code)]
    pub fn with_cache(api: ApiClient, cache: CacheStore) -> Self {
        Self {
            api,
            cache: Some(cache),
        }
    }

    /// Builds the war-stars map for the given roster
    ///
    /// Members already present in the fresh cached map are not re-fetched;
    /// the rest are fetched in groups of [`FETCH_GROUP_SIZE`] with
    /// [`GROUP_PACING`] between groups (never after the last). A member
    /// whose fetch fails is logged and omitted from the result, so callers
    /// must treat an absent tag as unknown, never as zero. The only failure
    /// that aborts the whole run is a missing API token.
    ///
    /// Safe to re-invoke at any time: a rerun fetches exactly the members
    /// still missing from the cache.
    pub async fn collect(&self, members: &[ClanMember]) -> Result<WarStarsMap, ApiError> {
        let cached = self.cached_map();

        let mut result = WarStarsMap::new();
        let mut missing: Vec<String> = Vec::new();
        for member in members {
            let tag = normalize_tag(&member.tag);
            match cached.get(&tag) {
                Some(stars) => {
                    result.insert(tag, *stars);
                }
                None => missing.push(tag),
            }
        }

        if missing.is_empty() {
            tracing::debug!(members = members.len(), "war stars fully cached");
            return Ok(result);
        }
        tracing::debug!(
            members = members.len(),
            to_fetch = missing.len(),
            "fetching war stars"
        );

        let mut fetched = WarStarsMap::new();
        let groups: Vec<&[String]> = missing.chunks(FETCH_GROUP_SIZE).collect();
        let group_count = groups.len();
        for (index, group) in groups.into_iter().enumerate() {
            let calls = group.iter().map(|tag| self.fetch_stars(tag));
            for outcome in join_all(calls).await {
                match outcome {
                    Ok((tag, stars)) => {
                        fetched.insert(tag, stars);
                    }
                    // Without a token every remaining fetch is doomed;
                    // surface it instead of returning a map that merely
                    // looks sparsely cached
                    Err(ApiError::MissingToken) => return Err(ApiError::MissingToken),
                    // Individual failures were logged in fetch_stars
                    Err(_) => {}
                }
            }
            if index + 1 < group_count {
                tokio::time::sleep(GROUP_PACING).await;
            }
        }

        if !fetched.is_empty() {
            self.merge_into_cache(&fetched);
        }

        result.extend(fetched);
        Ok(result)
    }

    /// Fetches one player's war stars, logging failures
    async fn fetch_stars(&self, tag: &str) -> Result<(String, u32), ApiError> {
        let path = format!("players/{}", encode_tag(tag));
        match self.api.get::<Player>(&path).await {
            Ok(player) => Ok((tag.to_string(), player.war_stars)),
            Err(err) => {
                if !matches!(err, ApiError::MissingToken) {
                    tracing::warn!(tag, error = %err, "failed to fetch war stars");
                }
                Err(err)
            }
        }
    }

    /// The fresh war-stars map currently in the cache, or empty
    fn cached_map(&self) -> WarStarsMap {
        match self.cache {
            Some(ref cache) => cache
                .get(&war_stars_key(), ResourceKind::WarStars.ttl())
                .unwrap_or_default(),
            None => WarStarsMap::new(),
        }
    }

    /// Merges freshly fetched pairs into the shared cache entry
    ///
    /// Read-modify-write per key: entries for members not in this round are
    /// preserved, so a partial batch or a concurrent run never clobbers
    /// them.
    fn merge_into_cache(&self, fetched: &WarStarsMap) {
        if let Some(ref cache) = self.cache {
            let key = war_stars_key();
            let mut map: WarStarsMap = cache
                .get(&key, ResourceKind::WarStars.ttl())
                .unwrap_or_default();
            for (tag, stars) in fetched {
                map.insert(tag.clone(), *stars);
            }
            cache.set(&key, &map);
        }
    }
}

/// Cache key of the shared war-stars map
fn war_stars_key() -> String {
    ResourceKind::WarStars.cache_key("")
}
