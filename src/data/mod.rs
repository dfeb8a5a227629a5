//! Core data models for the Clash of Clans API
//!
//! This module contains the domain types the application caches and displays:
//! clan profiles, member rosters, wars, league groups, capital raids, and
//! player profiles. All payloads use the API's camelCase field names; unknown
//! fields are ignored so upstream additions never break decoding.

pub mod clan;
pub mod war_stars;

pub use clan::{ClanClient, ClanDataError};
pub use war_stars::{WarStarsClient, WarStarsMap};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonicalizes a clan or player tag to the `#`-prefixed uppercase form
///
/// Accepts user input with or without the leading `#` and in any case.
pub fn normalize_tag(tag: &str) -> String {
    format!("#{}", tag.trim().trim_start_matches('#').to_uppercase())
}

/// Percent-encodes a tag for use in an API path (`#` becomes `%23`)
pub fn encode_tag(tag: &str) -> String {
    normalize_tag(tag).replace('#', "%23")
}

/// Clan profile as returned by `/clans/{tag}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clan {
    pub tag: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<Location>,
    /// Clan experience level
    pub clan_level: u32,
    pub clan_points: u32,
    pub clan_capital_points: Option<u32>,
    pub required_trophies: u32,
    pub war_frequency: Option<String>,
    pub war_win_streak: u32,
    pub war_wins: u32,
    /// Absent when the clan's war log is private
    pub war_ties: Option<u32>,
    /// Absent when the clan's war log is private
    pub war_losses: Option<u32>,
    pub is_war_log_public: bool,
    pub war_league: Option<League>,
    /// Member count
    pub members: u32,
    /// Full roster; present on the clan endpoint but not cached from it
    pub member_list: Option<Vec<ClanMember>>,
}

/// Geographic location of a clan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: u32,
    pub name: String,
    pub is_country: bool,
}

/// One member as returned by `/clans/{tag}/members`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanMember {
    pub tag: String,
    pub name: String,
    pub role: Role,
    pub exp_level: u32,
    pub league: Option<League>,
    pub trophies: u32,
    /// Position within the clan by trophies (1-based)
    pub clan_rank: u32,
    pub previous_clan_rank: u32,
    pub donations: u32,
    pub donations_received: u32,
    pub town_hall_level: Option<u32>,
}

/// Member role within a clan
///
/// The API calls elders `admin`; the display name follows the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Leader,
    CoLeader,
    Admin,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Leader => "Leader",
            Role::CoLeader => "Co-Leader",
            Role::Admin => "Elder",
            Role::Member => "Member",
        };
        write!(f, "{}", name)
    }
}

/// Trophy league of a player or war league of a clan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub id: u32,
    pub name: String,
}

/// Player profile as returned by `/players/{tag}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub tag: String,
    pub name: String,
    pub exp_level: u32,
    pub trophies: u32,
    pub best_trophies: u32,
    /// Lifetime war stars; the value the enrichment engine collects
    pub war_stars: u32,
    pub attack_wins: u32,
    pub defense_wins: u32,
    pub role: Option<String>,
    pub war_preference: Option<WarPreference>,
    pub donations: u32,
    pub donations_received: u32,
    pub town_hall_level: u32,
    pub clan_capital_contributions: Option<u64>,
    pub league: Option<League>,
    pub clan: Option<PlayerClan>,
}

/// The clan block embedded in a player profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerClan {
    pub tag: String,
    pub name: String,
    pub clan_level: u32,
}

/// Whether a player opted into wars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarPreference {
    In,
    Out,
}

/// Current war as returned by `/clans/{tag}/currentwar`
///
/// When the clan is not at war the API returns only `{"state": "notInWar"}`,
/// so everything besides the state is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWar {
    pub state: WarState,
    pub team_size: Option<u32>,
    pub attacks_per_member: Option<u32>,
    pub preparation_start_time: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub clan: Option<WarClan>,
    pub opponent: Option<WarClan>,
}

/// Phase of a clan war
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarState {
    NotInWar,
    Preparation,
    InWar,
    WarEnded,
}

/// One side of a war
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarClan {
    pub tag: String,
    pub name: String,
    pub clan_level: u32,
    /// Attacks used so far
    pub attacks: u32,
    pub stars: u32,
    pub destruction_percentage: f64,
}

/// War log as returned by `/clans/{tag}/warlog`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarLog {
    pub items: Vec<WarLogEntry>,
}

/// One finished war in the log
///
/// League war entries hide the opponent and carry no result, so those
/// fields are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarLogEntry {
    pub result: Option<WarResult>,
    pub end_time: String,
    pub team_size: u32,
    pub clan: WarLogClan,
    pub opponent: WarLogClan,
}

/// One side of a logged war
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarLogClan {
    pub tag: Option<String>,
    pub name: Option<String>,
    pub stars: u32,
    pub destruction_percentage: f64,
}

/// Outcome of a finished war
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarResult {
    Win,
    Lose,
    Tie,
}

/// Clan War League group as returned by `/clans/{tag}/currentwar/leaguegroup`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueGroup {
    pub state: LeagueGroupState,
    /// Season identifier, e.g. "2026-08"
    pub season: String,
    pub clans: Vec<LeagueClan>,
    pub rounds: Vec<LeagueRound>,
}

/// Phase of a league group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeagueGroupState {
    NotInWar,
    Preparation,
    InWar,
    Ended,
}

/// A clan participating in a league group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueClan {
    pub tag: String,
    pub name: String,
    pub clan_level: u32,
}

/// One round of league wars
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueRound {
    pub war_tags: Vec<String>,
}

/// One raid weekend as returned by `/clans/{tag}/capitalraidseasons`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalRaidSeason {
    pub state: String,
    pub start_time: String,
    pub end_time: String,
    pub capital_total_loot: u64,
    pub raids_completed: u32,
    pub total_attacks: u32,
    pub enemy_districts_destroyed: u32,
    pub offensive_reward: u32,
    pub defensive_reward: u32,
    pub members: Option<Vec<CapitalRaidMember>>,
}

/// A member's contribution to a raid weekend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalRaidMember {
    pub tag: String,
    pub name: String,
    pub attacks: u32,
    pub attack_limit: u32,
    pub bonus_attack_limit: u32,
    pub capital_resources_looted: u64,
}
