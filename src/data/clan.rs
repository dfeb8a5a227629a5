//! Cache-or-fetch access to clan and player resources
//!
//! Every accessor follows the same flow: read the cache, else fetch from the
//! API, else write the result through to the cache. Failed fetches are never
//! cached, so the next call retries against the network. Two endpoints
//! translate an upstream 404 into a legitimate empty value instead of an
//! error: a clan outside Clan War League has no league group, and a clan
//! that never raided has no capital raid seasons.

use super::{
    encode_tag, normalize_tag, CapitalRaidSeason, Clan, ClanMember, CurrentWar, LeagueGroup,
    Player, WarLog,
};
use crate::api::{ApiClient, ApiError};
use crate::cache::{CacheStore, ResourceKind};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Number of war log entries requested per fetch
const WAR_LOG_LIMIT: u32 = 50;

/// Number of raid weekends requested per fetch
const CAPITAL_RAID_LIMIT: u32 = 10;

/// Failure of a resource accessor, annotated with what was being fetched
#[derive(Debug, Error)]
#[error("failed to fetch {resource} for {subject}: {source}")]
pub struct ClanDataError {
    /// Which resource the accessor was serving
    pub resource: ResourceKind,
    /// The clan or player tag involved
    pub subject: String,
    #[source]
    pub source: ApiError,
}

impl ClanDataError {
    fn new(resource: ResourceKind, subject: &str, source: ApiError) -> Self {
        Self {
            resource,
            subject: subject.to_string(),
            source,
        }
    }

    /// Whether retrying later could plausibly succeed
    #[allow(dead_code)]
    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }
}

/// Collection envelope used by the list endpoints
#[derive(Debug, Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

/// Cache-or-fetch client for one clan's resources
///
/// Holds the API client, an optional cache store (the viewer still works
/// when no cache directory is available), and the canonical clan tag. All
/// cache keys are scoped by that tag, so pointing the client at a different
/// clan can never serve another clan's data.
#[derive(Debug, Clone)]
pub struct ClanClient {
    api: ApiClient,
    cache: Option<CacheStore>,
    /// Canonical `#`-prefixed clan tag
    clan_tag: String,
    /// When set, cache reads are skipped; write-through still happens
    bypass_cache: bool,
}

impl ClanClient {
    /// Creates a client using the default XDG cache location
    pub fn new(api: ApiClient, clan_tag: &str) -> Self {
        Self {
            api,
            cache: CacheStore::new(),
            clan_tag: normalize_tag(clan_tag),
            bypass_cache: false,
        }
    }

    /// Creates a client backed by a specific cache store
    #[allow(dead_code)]
    pub fn with_cache(api: ApiClient, cache: CacheStore, clan_tag: &str) -> Self {
        Self {
            api,
            cache: Some(cache),
            clan_tag: normalize_tag(clan_tag),
            bypass_cache: false,
        }
    }

    /// Creates a client that never touches a cache medium
    #[allow(dead_code)]
    pub fn without_cache(api: ApiClient, clan_tag: &str) -> Self {
        Self {
            api,
            cache: None,
            clan_tag: normalize_tag(clan_tag),
            bypass_cache: false,
        }
    }

    /// Returns a handle that refetches unconditionally
    ///
    /// The handle skips cache reads but keeps writing results through, so a
    /// forced refresh that fails leaves the previous entry intact.
    pub fn force_refresh(&self) -> Self {
        Self {
            bypass_cache: true,
            ..self.clone()
        }
    }

    /// The canonical tag of the clan this client serves
    pub fn clan_tag(&self) -> &str {
        &self.clan_tag
    }

    /// Clan profile
    pub async fn clan_info(&self) -> Result<Clan, ClanDataError> {
        let path = format!("clans/{}", encode_tag(&self.clan_tag));
        self.get_or_fetch(ResourceKind::ClanInfo, &self.clan_tag, || async {
            self.api.get::<Clan>(&path).await
        })
        .await
    }

    /// Member roster, unwrapped from the endpoint's `items` envelope
    pub async fn members(&self) -> Result<Vec<ClanMember>, ClanDataError> {
        let path = format!("clans/{}/members", encode_tag(&self.clan_tag));
        self.get_or_fetch(ResourceKind::Members, &self.clan_tag, || async {
            Ok(self.api.get::<Items<ClanMember>>(&path).await?.items)
        })
        .await
    }

    /// The war currently in progress (or the most recently finished one)
    pub async fn current_war(&self) -> Result<CurrentWar, ClanDataError> {
        let path = format!("clans/{}/currentwar", encode_tag(&self.clan_tag));
        self.get_or_fetch(ResourceKind::CurrentWar, &self.clan_tag, || async {
            self.api.get::<CurrentWar>(&path).await
        })
        .await
    }

    /// Recent war results
    pub async fn war_log(&self) -> Result<WarLog, ClanDataError> {
        let path = format!(
            "clans/{}/warlog?limit={}",
            encode_tag(&self.clan_tag),
            WAR_LOG_LIMIT
        );
        self.get_or_fetch(ResourceKind::WarLog, &self.clan_tag, || async {
            self.api.get::<WarLog>(&path).await
        })
        .await
    }

    /// Clan War League group for the current season
    ///
    /// `Ok(None)` means the clan is not enrolled in a league right now; the
    /// upstream signals this with a 404 and the absence is cached like any
    /// other value.
    pub async fn league_group(&self) -> Result<Option<LeagueGroup>, ClanDataError> {
        let path = format!(
            "clans/{}/currentwar/leaguegroup",
            encode_tag(&self.clan_tag)
        );
        self.get_or_fetch(ResourceKind::LeagueGroup, &self.clan_tag, || async {
            match self.api.get::<LeagueGroup>(&path).await {
                Ok(group) => Ok(Some(group)),
                Err(ApiError::NotFound { .. }) => Ok(None),
                Err(err) => Err(err),
            }
        })
        .await
    }

    /// Capital raid weekend history, newest first
    ///
    /// A clan that never raided gets a 404 upstream; that becomes an empty,
    /// cacheable list.
    pub async fn capital_raid_seasons(&self) -> Result<Vec<CapitalRaidSeason>, ClanDataError> {
        let path = format!(
            "clans/{}/capitalraidseasons?limit={}",
            encode_tag(&self.clan_tag),
            CAPITAL_RAID_LIMIT
        );
        self.get_or_fetch(ResourceKind::CapitalRaids, &self.clan_tag, || async {
            match self.api.get::<Items<CapitalRaidSeason>>(&path).await {
                Ok(page) => Ok(page.items),
                Err(ApiError::NotFound { .. }) => Ok(Vec::new()),
                Err(err) => Err(err),
            }
        })
        .await
    }

    /// Individual player profile, cached per player tag
    pub async fn player(&self, tag: &str) -> Result<Player, ClanDataError> {
        let tag = normalize_tag(tag);
        let path = format!("players/{}", encode_tag(&tag));
        self.get_or_fetch(ResourceKind::Player, &tag, || async {
            self.api.get::<Player>(&path).await
        })
        .await
    }

    /// When the given clan-scoped resource was last cached
    pub fn cached_at(&self, kind: ResourceKind) -> Option<DateTime<Utc>> {
        self.cache
            .as_ref()?
            .timestamp_of(&kind.cache_key(&self.clan_tag))
    }

    /// When the given player's profile was last cached
    pub fn player_cached_at(&self, tag: &str) -> Option<DateTime<Utc>> {
        self.cache
            .as_ref()?
            .timestamp_of(&ResourceKind::Player.cache_key(&normalize_tag(tag)))
    }

    /// Removes every cached entry, all kinds and subjects
    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    /// The cache-read, fetch, write-through flow shared by every accessor
    async fn get_or_fetch<T, F, Fut>(
        &self,
        kind: ResourceKind,
        subject: &str,
        fetch: F,
    ) -> Result<T, ClanDataError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let key = kind.cache_key(subject);

        if !self.bypass_cache {
            if let Some(ref cache) = self.cache {
                if let Some(value) = cache.get::<T>(&key, kind.ttl()) {
                    tracing::debug!(%key, "cache hit");
                    return Ok(value);
                }
            }
        }

        let value = fetch()
            .await
            .map_err(|source| ClanDataError::new(kind, subject, source))?;

        if let Some(ref cache) = self.cache {
            cache.set(&key, &value);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{any, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CLAN_TAG: &str = "#2GQLU8YLP";

    fn test_client(server: &MockServer) -> (ClanClient, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let api = ApiClient::new(Some("test-token".to_string())).with_base_url(server.uri());
        let store = CacheStore::with_dir(temp_dir.path().to_path_buf());
        (ClanClient::with_cache(api, store, CLAN_TAG), temp_dir)
    }

    fn clan_json(name: &str) -> serde_json::Value {
        json!({
            "tag": CLAN_TAG,
            "name": name,
            "clanLevel": 18,
            "clanPoints": 41000,
            "requiredTrophies": 2000,
            "warWinStreak": 3,
            "warWins": 250,
            "isWarLogPublic": true,
            "members": 47
        })
    }

    fn member_json(tag: &str, name: &str, rank: u32) -> serde_json::Value {
        json!({
            "tag": tag,
            "name": name,
            "role": "member",
            "expLevel": 100,
            "trophies": 3000,
            "clanRank": rank,
            "previousClanRank": rank,
            "donations": 100,
            "donationsReceived": 50
        })
    }

    #[tokio::test]
    async fn test_second_read_hits_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP/members"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [member_json("#P1", "Alice", 1)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _temp_dir) = test_client(&server);
        let first = client.members().await.expect("First fetch should succeed");
        let second = client.members().await.expect("Second read should succeed");

        assert_eq!(first.len(), 1);
        assert_eq!(second[0].name, "Alice");
    }

    #[tokio::test]
    async fn test_tag_is_normalized_into_the_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP"))
            .respond_with(ResponseTemplate::new(200).set_body_json(clan_json("Reddit Omega")))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let api = ApiClient::new(Some("test-token".to_string())).with_base_url(server.uri());
        let store = CacheStore::with_dir(temp_dir.path().to_path_buf());
        // Lowercase, no hash: still reaches the canonical path
        let client = ClanClient::with_cache(api, store, "2gqlu8ylp");
        assert_eq!(client.clan_tag(), CLAN_TAG);

        let clan = client.clan_info().await.expect("Should fetch clan");
        assert_eq!(clan.name, "Reddit Omega");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP"))
            .respond_with(ResponseTemplate::new(200).set_body_json(clan_json("Recovered")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _temp_dir) = test_client(&server);

        let first = client.clan_info().await;
        assert!(first.is_err(), "First call should surface the 500");

        // The failure was not written through, so this retries the network
        let second = client.clan_info().await.expect("Retry should succeed");
        assert_eq!(second.name, "Recovered");
    }

    #[tokio::test]
    async fn test_error_is_annotated_with_resource_and_subject() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (client, _temp_dir) = test_client(&server);
        let err = client.current_war().await.expect_err("Should fail");

        assert_eq!(err.resource, ResourceKind::CurrentWar);
        assert_eq!(err.subject, CLAN_TAG);
        assert!(err.is_transient());
        assert!(err.to_string().contains("current war"));
        assert!(err.to_string().contains(CLAN_TAG));
    }

    #[tokio::test]
    async fn test_league_group_404_becomes_cached_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP/currentwar/leaguegroup"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _temp_dir) = test_client(&server);

        let first = client.league_group().await.expect("404 is not an error here");
        assert!(first.is_none());

        // Second read comes from cache: the mock's expect(1) enforces it
        let second = client.league_group().await.expect("Cached read should succeed");
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_capital_raids_404_becomes_cached_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP/capitalraidseasons"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _temp_dir) = test_client(&server);

        let first = client.capital_raid_seasons().await.expect("404 maps to empty");
        assert!(first.is_empty());

        let second = client.capital_raid_seasons().await.expect("Cached read");
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_player_404_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/players/%23NOPE"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let (client, _temp_dir) = test_client(&server);

        let first = client.player("#NOPE").await.expect_err("Should propagate 404");
        assert!(matches!(first.source, ApiError::NotFound { .. }));

        // Not a domain-empty resource: the failure was not cached either
        let second = client.player("#NOPE").await.expect_err("Should fetch and fail again");
        assert_eq!(second.resource, ResourceKind::Player);
    }

    #[tokio::test]
    async fn test_force_refresh_skips_cache_read_but_writes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP"))
            .respond_with(ResponseTemplate::new(200).set_body_json(clan_json("Reddit Omega")))
            .expect(2)
            .mount(&server)
            .await;

        let (client, _temp_dir) = test_client(&server);

        client.clan_info().await.expect("Initial fetch");
        let before = client.cached_at(ResourceKind::ClanInfo).expect("Should be cached");

        client.force_refresh().clan_info().await.expect("Forced refetch");
        let after = client.cached_at(ResourceKind::ClanInfo).expect("Still cached");
        assert!(after >= before, "Write-through should refresh the timestamp");

        // Plain client sees the refreshed entry; request count stays at 2
        client.clan_info().await.expect("Cached read");
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_exactly_one_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP"))
            .respond_with(ResponseTemplate::new(200).set_body_json(clan_json("Fresh")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, temp_dir) = test_client(&server);
        let key_path = temp_dir.path().join("clan_info_2GQLU8YLP.json");

        // Entry aged 299s: still fresh under the 300s TTL, no request issued
        let aged = |secs: i64| {
            json!({
                "cached_at": (Utc::now() - Duration::seconds(secs)).to_rfc3339(),
                "data": clan_json("Stale")
            })
        };
        fs::write(&key_path, aged(299).to_string()).expect("Should write entry");
        let hit = client.clan_info().await.expect("Should hit cache");
        assert_eq!(hit.name, "Stale");

        // Entry aged 301s: expired, one request, fresh write-through
        fs::write(&key_path, aged(301).to_string()).expect("Should write entry");
        let refetched = client.clan_info().await.expect("Should refetch");
        assert_eq!(refetched.name, "Fresh");

        let age = Utc::now() - client.cached_at(ResourceKind::ClanInfo).expect("Cached");
        assert!(age < Duration::seconds(10), "Entry should have been rewritten");
    }

    #[tokio::test]
    async fn test_cached_at_and_clear_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clans/%232GQLU8YLP/members"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [member_json("#P1", "Alice", 1)]
            })))
            .mount(&server)
            .await;

        let (client, _temp_dir) = test_client(&server);
        assert!(client.cached_at(ResourceKind::Members).is_none());

        client.members().await.expect("Should fetch");
        assert!(client.cached_at(ResourceKind::Members).is_some());

        client.clear_cache();
        assert!(client.cached_at(ResourceKind::Members).is_none());
    }

    #[tokio::test]
    async fn test_client_without_cache_fetches_every_time() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(clan_json("Uncached")))
            .expect(2)
            .mount(&server)
            .await;

        let api = ApiClient::new(Some("test-token".to_string())).with_base_url(server.uri());
        let client = ClanClient::without_cache(api, CLAN_TAG);

        client.clan_info().await.expect("First fetch");
        client.clan_info().await.expect("Second fetch");
        assert!(client.cached_at(ResourceKind::ClanInfo).is_none());
    }
}
