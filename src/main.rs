//! clashview - Clash of Clans clan statistics in the terminal
//!
//! Prints summaries of a clan's profile, roster, wars, league group, and
//! capital raids. Responses are cached on disk with per-resource TTLs, so
//! repeated invocations stay fast and polite to the API; `--refresh` forces
//! a refetch and `clear-cache` wipes the store.

mod api;
mod cache;
mod cli;
mod config;
mod data;

use std::process::ExitCode;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use api::{ApiClient, ApiError};
use cache::ResourceKind;
use cli::{Cli, Command, MemberSort};
use config::Settings;
use data::{
    normalize_tag, ClanClient, ClanDataError, ClanMember, LeagueGroupState, WarPreference,
    WarResult, WarState, WarStarsClient, WarStarsMap,
};

/// Failure of one CLI invocation
#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Data(#[from] ClanDataError),
    #[error("failed to collect war stars: {0}")]
    Stars(#[from] ApiError),
}

impl AppError {
    /// The underlying API failure, for hint selection
    fn api(&self) -> &ApiError {
        match self {
            AppError::Data(err) => &err.source,
            AppError::Stars(err) => err,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let api = match settings.api_url {
        Some(ref url) => ApiClient::new(settings.api_token.clone()).with_base_url(url.clone()),
        None => ApiClient::new(settings.api_token.clone()),
    };
    let clan_tag = cli.clan.clone().unwrap_or_else(|| settings.clan_tag.clone());

    let client = ClanClient::new(api.clone(), &clan_tag);
    let client = if cli.refresh {
        client.force_refresh()
    } else {
        client
    };
    tracing::debug!(clan = client.clan_tag(), refresh = cli.refresh, "resolved target clan");

    let outcome = match cli.command.unwrap_or(Command::Clan) {
        Command::Clan => show_clan(&client).await,
        Command::Members { sort, no_stars } => show_members(&client, &api, sort, no_stars).await,
        Command::War => show_war(&client).await,
        Command::Warlog => show_war_log(&client).await,
        Command::League => show_league(&client).await,
        Command::Capital => show_capital(&client).await,
        Command::Player { tag } => show_player(&client, &tag).await,
        Command::ClearCache => {
            client.clear_cache();
            println!("Cache cleared.");
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Routes diagnostics to stderr, filtered by RUST_LOG (default: warnings)
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clashview=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints a failure and a hint matched to its cause
fn report_error(err: &AppError) {
    eprintln!("Error: {}", err);
    match err.api() {
        ApiError::MissingToken => {
            eprintln!(
                "Set {} to a Clash of Clans API token from https://developer.clashofclans.com.",
                config::TOKEN_ENV
            );
        }
        ApiError::NotFound { .. } => {
            eprintln!("Check the tag; the API knows no such clan or player.");
        }
        api if api.is_transient() => {
            eprintln!("The API did not answer; try again in a moment.");
        }
        _ => {}
    }
}

async fn show_clan(client: &ClanClient) -> Result<(), AppError> {
    let clan = client.clan_info().await?;

    println!("{}  {}", clan.name, clan.tag);
    if let Some(ref description) = clan.description {
        if !description.is_empty() {
            println!("{}", description);
        }
    }
    println!();
    println!(
        "Level {}   {} points   {}/50 members",
        clan.clan_level, clan.clan_points, clan.members
    );
    if let Some(ref location) = clan.location {
        println!("Location: {}", location.name);
    }
    if let Some(ref league) = clan.war_league {
        println!("War league: {}", league.name);
    }
    let mut record = format!("War record: {} wins", clan.war_wins);
    if let (Some(ties), Some(losses)) = (clan.war_ties, clan.war_losses) {
        record.push_str(&format!(", {} ties, {} losses", ties, losses));
    }
    println!("{} (streak {})", record, clan.war_win_streak);
    if let Some(points) = clan.clan_capital_points {
        println!("Capital points: {}", points);
    }

    print_age_footer(client.cached_at(ResourceKind::ClanInfo));
    Ok(())
}

async fn show_members(
    client: &ClanClient,
    api: &ApiClient,
    sort: MemberSort,
    no_stars: bool,
) -> Result<(), AppError> {
    let mut members = client.members().await?;
    let stars = if no_stars {
        WarStarsMap::new()
    } else {
        WarStarsClient::new(api.clone()).collect(&members).await?
    };

    sort_members(&mut members, sort, &stars);

    println!(
        "{:>3}  {:<18} {:<10} {:>8} {:>4} {:>9} {:>7}",
        "#", "Name", "Role", "Trophies", "TH", "Donated", "Stars"
    );
    for member in &members {
        let town_hall = member
            .town_hall_level
            .map_or_else(|| "-".to_string(), |th| th.to_string());
        let war_stars = stars
            .get(&normalize_tag(&member.tag))
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        println!(
            "{:>3}  {:<18} {:<10} {:>8} {:>4} {:>9} {:>7}",
            member.clan_rank,
            member.name,
            member.role.to_string(),
            member.trophies,
            town_hall,
            member.donations,
            war_stars
        );
    }

    print_age_footer(client.cached_at(ResourceKind::Members));
    Ok(())
}

async fn show_war(client: &ClanClient) -> Result<(), AppError> {
    let war = client.current_war().await?;

    if war.state == WarState::NotInWar {
        println!("Not currently in a war.");
        print_age_footer(client.cached_at(ResourceKind::CurrentWar));
        return Ok(());
    }

    let phase = match war.state {
        WarState::Preparation => "Preparation day",
        WarState::InWar => "Battle day",
        WarState::WarEnded => "War ended",
        WarState::NotInWar => "Not in war",
    };
    match (war.clan, war.opponent) {
        (Some(us), Some(them)) => {
            println!("{} vs {}  [{}]", us.name, them.name, phase);
            if let Some(size) = war.team_size {
                println!("Team size: {0}v{0}", size);
            }
            println!("Stars:       {:>5} - {}", us.stars, them.stars);
            println!(
                "Destruction: {:>4.1}% - {:.1}%",
                us.destruction_percentage, them.destruction_percentage
            );
            println!("Attacks:     {:>5} - {}", us.attacks, them.attacks);
        }
        _ => println!("War in progress, details unavailable  [{}]", phase),
    }

    print_age_footer(client.cached_at(ResourceKind::CurrentWar));
    Ok(())
}

async fn show_war_log(client: &ClanClient) -> Result<(), AppError> {
    let log = client.war_log().await?;

    if log.items.is_empty() {
        println!("War log is empty.");
        print_age_footer(client.cached_at(ResourceKind::WarLog));
        return Ok(());
    }

    let (mut wins, mut losses, mut ties) = (0u32, 0u32, 0u32);
    for entry in &log.items {
        let verdict = match entry.result {
            Some(WarResult::Win) => {
                wins += 1;
                "W"
            }
            Some(WarResult::Lose) => {
                losses += 1;
                "L"
            }
            Some(WarResult::Tie) => {
                ties += 1;
                "T"
            }
            None => "-",
        };
        let opponent = entry.opponent.name.as_deref().unwrap_or("(league war)");
        let when = parse_api_time(&entry.end_time)
            .map_or_else(|| entry.end_time.clone(), |t| t.format("%Y-%m-%d").to_string());
        println!(
            "{}  {}  {:<20} {:>3} - {:<3} stars  ({}v{})",
            verdict, when, opponent, entry.clan.stars, entry.opponent.stars, entry.team_size, entry.team_size
        );
    }
    println!();
    println!(
        "{} wins, {} losses, {} ties over the last {} wars",
        wins,
        losses,
        ties,
        log.items.len()
    );

    print_age_footer(client.cached_at(ResourceKind::WarLog));
    Ok(())
}

async fn show_league(client: &ClanClient) -> Result<(), AppError> {
    match client.league_group().await? {
        None => println!("Not enrolled in a Clan War League group."),
        Some(group) => {
            let phase = match group.state {
                LeagueGroupState::Preparation => "preparation",
                LeagueGroupState::InWar => "in war",
                LeagueGroupState::Ended => "ended",
                LeagueGroupState::NotInWar => "idle",
            };
            println!("Season {}  [{}]", group.season, phase);
            println!("{} clans in the group:", group.clans.len());
            for clan in &group.clans {
                println!("  {}  (level {})", clan.name, clan.clan_level);
            }
            // Unscheduled rounds carry the placeholder war tag "#0"
            let scheduled = group
                .rounds
                .iter()
                .filter(|round| round.war_tags.iter().any(|tag| tag != "#0"))
                .count();
            println!("Rounds scheduled: {} of {}", scheduled, group.rounds.len());
        }
    }

    print_age_footer(client.cached_at(ResourceKind::LeagueGroup));
    Ok(())
}

async fn show_capital(client: &ClanClient) -> Result<(), AppError> {
    let seasons = client.capital_raid_seasons().await?;

    if seasons.is_empty() {
        println!("No capital raid weekends recorded.");
        print_age_footer(client.cached_at(ResourceKind::CapitalRaids));
        return Ok(());
    }

    println!(
        "{:<12} {:>10} {:>6} {:>8} {:>9}",
        "Weekend", "Loot", "Raids", "Attacks", "Medals"
    );
    for season in &seasons {
        let weekend = parse_api_time(&season.start_time)
            .map_or_else(|| season.start_time.clone(), |t| t.format("%Y-%m-%d").to_string());
        let medals = format!("{}+{}", season.offensive_reward, season.defensive_reward);
        println!(
            "{:<12} {:>10} {:>6} {:>8} {:>9}",
            weekend, season.capital_total_loot, season.raids_completed, season.total_attacks, medals
        );
    }

    print_age_footer(client.cached_at(ResourceKind::CapitalRaids));
    Ok(())
}

async fn show_player(client: &ClanClient, tag: &str) -> Result<(), AppError> {
    let player = client.player(tag).await?;

    println!("{}  {}", player.name, player.tag);
    if let Some(ref clan) = player.clan {
        let role = player.role.as_deref().unwrap_or("member");
        println!("{} of {} (level {})", role, clan.name, clan.clan_level);
    }
    println!();
    println!(
        "Town Hall {}   Experience level {}",
        player.town_hall_level, player.exp_level
    );
    println!("Trophies: {} (best {})", player.trophies, player.best_trophies);
    if let Some(ref league) = player.league {
        println!("League: {}", league.name);
    }
    println!("War stars: {}", player.war_stars);
    if let Some(preference) = player.war_preference {
        let label = match preference {
            WarPreference::In => "opted in",
            WarPreference::Out => "opted out",
        };
        println!("War preference: {}", label);
    }
    println!(
        "Attacks won: {}   Defenses won: {}",
        player.attack_wins, player.defense_wins
    );
    println!(
        "Donations: {} given, {} received",
        player.donations, player.donations_received
    );
    if let Some(contributions) = player.clan_capital_contributions {
        println!("Capital contributions: {}", contributions);
    }

    print_age_footer(client.player_cached_at(tag));
    Ok(())
}

/// Orders the roster for display; ties fall back to the clan ranking
fn sort_members(members: &mut [ClanMember], sort: MemberSort, stars: &WarStarsMap) {
    match sort {
        MemberSort::Rank => members.sort_by_key(|m| m.clan_rank),
        MemberSort::Trophies => members.sort_by(|a, b| {
            b.trophies
                .cmp(&a.trophies)
                .then(a.clan_rank.cmp(&b.clan_rank))
        }),
        MemberSort::Donations => members.sort_by(|a, b| {
            b.donations
                .cmp(&a.donations)
                .then(a.clan_rank.cmp(&b.clan_rank))
        }),
        MemberSort::TownHall => members.sort_by(|a, b| {
            b.town_hall_level
                .cmp(&a.town_hall_level)
                .then(a.clan_rank.cmp(&b.clan_rank))
        }),
        MemberSort::Stars => members.sort_by(|a, b| {
            let stars_of = |m: &ClanMember| stars.get(&normalize_tag(&m.tag)).copied();
            // Unknown counts sort last, not as zero
            stars_of(b)
                .cmp(&stars_of(a))
                .then(a.clan_rank.cmp(&b.clan_rank))
        }),
    }
}

/// Prints how old the displayed data is, when it went through the cache
fn print_age_footer(cached_at: Option<DateTime<Utc>>) {
    if let Some(at) = cached_at {
        println!();
        println!("Updated {}", format_age(Utc::now() - at));
    }
}

/// Renders a cache age like "just now", "3m ago", or "2h 10m ago"
fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else {
        format!("{}h {}m ago", minutes / 60, minutes % 60)
    }
}

/// Parses the API's compact timestamp format, e.g. "20260814T070000.000Z"
fn parse_api_time(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S%.3fZ")
        .ok()
        .map(|naive| naive.and_utc())
}
