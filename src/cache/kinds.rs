//! Resource kinds and their cache policies
//!
//! Every piece of remote data the application caches belongs to one of these
//! kinds. The TTL is a pure function of the kind, fixed at compile time, and
//! the cache key embeds the subject tag so entries for different clans or
//! players never collide.

use chrono::Duration;
use std::fmt;

/// The categories of cached data, each with its own freshness window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Clan profile (name, level, league, description)
    ClanInfo,
    /// Full member roster of a clan
    Members,
    /// The clan's war currently in progress (or most recent)
    CurrentWar,
    /// Recent war results
    WarLog,
    /// Clan War League group for the current season
    LeagueGroup,
    /// Capital raid weekend history
    CapitalRaids,
    /// Individual player profile
    Player,
    /// Shared tag-to-war-stars map built by the enrichment engine
    WarStars,
}

impl ResourceKind {
    /// How long a cached entry of this kind stays fresh
    pub fn ttl(self) -> Duration {
        match self {
            ResourceKind::ClanInfo => Duration::minutes(5),
            ResourceKind::Members => Duration::minutes(5),
            ResourceKind::CurrentWar => Duration::minutes(2),
            ResourceKind::WarLog => Duration::minutes(10),
            ResourceKind::LeagueGroup => Duration::minutes(5),
            ResourceKind::CapitalRaids => Duration::minutes(30),
            ResourceKind::Player => Duration::minutes(30),
            ResourceKind::WarStars => Duration::minutes(60),
        }
    }

    /// Builds the cache key for this kind and subject tag
    ///
    /// The subject is the clan tag for clan-scoped kinds and the player tag
    /// for `Player`. Tags are embedded without their `#` so keys stay
    /// filesystem-safe. `WarStars` is a single shared entry (war stars are a
    /// player attribute, valid across clans) and ignores the subject.
    pub fn cache_key(self, subject: &str) -> String {
        let slug = subject.trim_start_matches('#').to_uppercase();
        match self {
            ResourceKind::ClanInfo => format!("clan_info_{}", slug),
            ResourceKind::Members => format!("members_{}", slug),
            ResourceKind::CurrentWar => format!("current_war_{}", slug),
            ResourceKind::WarLog => format!("war_log_{}", slug),
            ResourceKind::LeagueGroup => format!("league_group_{}", slug),
            ResourceKind::CapitalRaids => format!("capital_raids_{}", slug),
            ResourceKind::Player => format!("player_{}", slug),
            ResourceKind::WarStars => "war_stars".to_string(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::ClanInfo => "clan info",
            ResourceKind::Members => "member roster",
            ResourceKind::CurrentWar => "current war",
            ResourceKind::WarLog => "war log",
            ResourceKind::LeagueGroup => "league group",
            ResourceKind::CapitalRaids => "capital raids",
            ResourceKind::Player => "player profile",
            ResourceKind::WarStars => "war stars",
        };
        write!(f, "{}", name)
    }
}
