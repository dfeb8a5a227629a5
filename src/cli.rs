//! Command-line interface parsing for the Clash of Clans viewer
//!
//! This module defines the clap surface: one subcommand per view, a global
//! `--refresh` flag that bypasses cache reads, and a global `--clan` override
//! for the followed clan. Tag arguments are validated and canonicalized at
//! parse time so the data layer only ever sees well-formed tags.

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::data::normalize_tag;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The given tag is not a plausible clan or player tag
    #[error("Invalid tag: '{0}'. Tags are '#' followed by letters and digits, e.g. #2GQLU8YLP")]
    InvalidTag(String),
}

/// Clash of Clans clan viewer
#[derive(Parser, Debug)]
#[command(name = "clashview")]
#[command(about = "Clash of Clans clan statistics with a local response cache")]
#[command(version)]
pub struct Cli {
    /// Refetch from the API even when a fresh cache entry exists
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Clan tag to inspect, overriding CLASHVIEW_CLAN_TAG
    #[arg(long, global = true, value_name = "TAG", value_parser = parse_tag_arg)]
    pub clan: Option<String>,

    /// View to show; defaults to the clan profile
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// The available views
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the clan profile
    Clan,
    /// List the member roster
    Members {
        /// Sort order for the roster
        #[arg(long, value_enum, default_value_t = MemberSort::Rank)]
        sort: MemberSort,
        /// Skip the per-member war-star fetches
        #[arg(long)]
        no_stars: bool,
    },
    /// Show the war currently in progress
    War,
    /// Show recent war results
    Warlog,
    /// Show the Clan War League group
    League,
    /// Show capital raid weekends
    Capital,
    /// Show one player's profile
    Player {
        /// Player tag, e.g. #ABC123
        #[arg(value_parser = parse_tag_arg)]
        tag: String,
    },
    /// Delete every cached API response
    ClearCache,
}

/// Roster orderings for the members view
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSort {
    /// In-clan ranking, the API's own order
    Rank,
    /// Current trophies, highest first
    Trophies,
    /// Troops donated this season, highest first
    Donations,
    /// Town Hall level, highest first
    TownHall,
    /// War stars, highest first (forces enrichment)
    Stars,
}

/// Validates a tag argument and canonicalizes it to `#UPPERCASE` form
///
/// # Arguments
/// * `s` - The raw tag from the command line, with or without `#`
///
/// # Returns
/// * `Ok(String)` holding the canonical tag
/// * `Err(CliError::InvalidTag)` if the tag is empty or has other characters
pub fn parse_tag_arg(s: &str) -> Result<String, CliError> {
    let tag = normalize_tag(s);
    let body = tag.trim_start_matches('#');
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CliError::InvalidTag(s.to_string()));
    }
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_arg_canonicalizes() {
        assert_eq!(parse_tag_arg("#2GQLU8YLP").unwrap(), "#2GQLU8YLP");
        assert_eq!(parse_tag_arg("2gqlu8ylp").unwrap(), "#2GQLU8YLP");
        assert_eq!(parse_tag_arg("  #abc123 ").unwrap(), "#ABC123");
    }

    #[test]
    fn test_parse_tag_arg_rejects_bad_input() {
        assert!(parse_tag_arg("").is_err());
        assert!(parse_tag_arg("#").is_err());
        assert!(parse_tag_arg("#TAG WITH SPACES").is_err());
        assert!(parse_tag_arg("#TAG!").is_err());

        let err = parse_tag_arg("#no/slash").unwrap_err();
        assert!(err.to_string().contains("Invalid tag"));
        assert!(err.to_string().contains("no/slash"));
    }

    #[test]
    fn test_cli_parse_no_args_defaults() {
        let cli = Cli::parse_from(["clashview"]);
        assert!(cli.command.is_none());
        assert!(!cli.refresh);
        assert!(cli.clan.is_none());
    }

    #[test]
    fn test_cli_parse_members_with_sort() {
        let cli = Cli::parse_from(["clashview", "members", "--sort", "donations"]);
        match cli.command {
            Some(Command::Members { sort, no_stars }) => {
                assert_eq!(sort, MemberSort::Donations);
                assert!(!no_stars);
            }
            other => panic!("Expected members command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_members_sort_default_is_rank() {
        let cli = Cli::parse_from(["clashview", "members"]);
        match cli.command {
            Some(Command::Members { sort, .. }) => assert_eq!(sort, MemberSort::Rank),
            other => panic!("Expected members command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_rejects_unknown_sort() {
        let result = Cli::try_parse_from(["clashview", "members", "--sort", "height"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_player_normalizes_tag() {
        let cli = Cli::parse_from(["clashview", "player", "abc123"]);
        match cli.command {
            Some(Command::Player { tag }) => assert_eq!(tag, "#ABC123"),
            other => panic!("Expected player command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_player_rejects_invalid_tag() {
        let result = Cli::try_parse_from(["clashview", "player", "not a tag"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_refresh_is_global() {
        let cli = Cli::parse_from(["clashview", "war", "--refresh"]);
        assert!(cli.refresh);
        assert!(matches!(cli.command, Some(Command::War)));
    }

    #[test]
    fn test_cli_clan_override_is_normalized() {
        let cli = Cli::parse_from(["clashview", "members", "--clan", "2pp"]);
        assert_eq!(cli.clan.as_deref(), Some("#2PP"));
    }

    #[test]
    fn test_cli_parse_clear_cache() {
        let cli = Cli::parse_from(["clashview", "clear-cache"]);
        assert!(matches!(cli.command, Some(Command::ClearCache)));
    }
}
