//! Runtime configuration from the environment
//!
//! All settings come from environment variables so the binary works in
//! scripts and CI without a config file. A missing API token is not an error
//! here; it surfaces as a typed failure the moment a fetch is attempted.

use std::env;

/// Environment variable holding the API bearer token
pub const TOKEN_ENV: &str = "CLASHVIEW_API_TOKEN";

/// Environment variable selecting the clan to follow
pub const CLAN_TAG_ENV: &str = "CLASHVIEW_CLAN_TAG";

/// Environment variable overriding the API base URL (self-hosted proxies)
pub const API_URL_ENV: &str = "CLASHVIEW_API_URL";

/// Clan shown when nothing is configured
pub const DEFAULT_CLAN_TAG: &str = "#2GQLU8YLP";

/// Runtime settings resolved from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bearer token for the API, if configured
    pub api_token: Option<String>,
    /// Clan the viewer follows
    pub clan_tag: String,
    /// Base URL override, if any
    pub api_url: Option<String>,
}

impl Settings {
    /// Reads settings from the process environment
    ///
    /// Empty variables count as unset.
    pub fn from_env() -> Self {
        Self {
            api_token: non_empty_var(TOKEN_ENV),
            clan_tag: non_empty_var(CLAN_TAG_ENV).unwrap_or_else(|| DEFAULT_CLAN_TAG.to_string()),
            api_url: non_empty_var(API_URL_ENV),
        }
    }
}

/// Reads an environment variable, treating empty values as unset
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
