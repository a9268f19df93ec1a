use std::{env, path::PathBuf, time::Duration};

use url::Url;

use crate::runtime_paths;

pub const DEFAULT_DEEP_LINK_SCHEME: &str = "towerdefense";
pub const DEFAULT_DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
pub const DEFAULT_DISCORD_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
pub const DEFAULT_DISCORD_PROFILE_URL: &str = "https://discord.com/api/users/@me";
pub const DEFAULT_DISCORD_SCOPES: &str = "identify";
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_LAUNCH_EXIT_DELAY: Duration = Duration::from_millis(1000);
pub const STARTUP_UPDATE_CHECK_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct DiscordOAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: Url,
    pub authorize_url: Url,
    pub token_url: Url,
    pub profile_url: Url,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub root_dir: Option<PathBuf>,
    pub game_dir_override: Option<PathBuf>,
    pub deep_link_scheme: String,
    pub discord: DiscordOAuthConfig,
    pub login_timeout: Duration,
    pub launch_exit_delay: Duration,
    pub startup_update_check: bool,
    pub install_on_quit: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl LauncherConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let deep_link_scheme =
            normalize_scheme(value("TOWER_LAUNCHER_DEEP_LINK_SCHEME").as_deref());
        let default_redirect = format!("{deep_link_scheme}://auth/callback");

        let discord = DiscordOAuthConfig {
            client_id: value("TOWER_LAUNCHER_DISCORD_CLIENT_ID").unwrap_or_default(),
            client_secret: value("TOWER_LAUNCHER_DISCORD_CLIENT_SECRET"),
            redirect_uri: normalize_url(
                value("TOWER_LAUNCHER_DISCORD_REDIRECT_URI").as_deref(),
                &default_redirect,
            ),
            authorize_url: normalize_url(
                value("TOWER_LAUNCHER_DISCORD_AUTHORIZE_URL").as_deref(),
                DEFAULT_DISCORD_AUTHORIZE_URL,
            ),
            token_url: normalize_url(
                value("TOWER_LAUNCHER_DISCORD_TOKEN_URL").as_deref(),
                DEFAULT_DISCORD_TOKEN_URL,
            ),
            profile_url: normalize_url(
                value("TOWER_LAUNCHER_DISCORD_PROFILE_URL").as_deref(),
                DEFAULT_DISCORD_PROFILE_URL,
            ),
            scopes: value("TOWER_LAUNCHER_DISCORD_SCOPES")
                .unwrap_or_else(|| DEFAULT_DISCORD_SCOPES.to_string())
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        };

        Self {
            root_dir: value("TOWER_LAUNCHER_ROOT")
                .map(PathBuf::from)
                .or_else(runtime_paths::default_root_dir),
            game_dir_override: value("TOWER_LAUNCHER_GAME_DIR").map(PathBuf::from),
            deep_link_scheme,
            discord,
            login_timeout: parse_duration_ms(
                value("TOWER_LAUNCHER_LOGIN_TIMEOUT_MS").as_deref(),
                DEFAULT_LOGIN_TIMEOUT,
            ),
            launch_exit_delay: parse_duration_ms(
                value("TOWER_LAUNCHER_LAUNCH_EXIT_DELAY_MS").as_deref(),
                DEFAULT_LAUNCH_EXIT_DELAY,
            ),
            startup_update_check: parse_flag(
                value("TOWER_LAUNCHER_AUTO_UPDATE_CHECK").as_deref(),
                true,
            ),
            install_on_quit: parse_flag(value("TOWER_LAUNCHER_INSTALL_ON_QUIT").as_deref(), true),
        }
    }
}

fn built_in_url(raw: &str) -> Url {
    Url::parse(raw).unwrap_or_else(|error| panic!("built-in URL {raw} is invalid: {error}"))
}

fn normalize_url(raw: Option<&str>, default_url: &str) -> Url {
    let Some(raw) = raw else {
        return built_in_url(default_url);
    };

    match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!("ignoring invalid URL '{raw}': {error}; using {default_url}");
            built_in_url(default_url)
        }
    }
}

pub(crate) fn normalize_scheme(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return DEFAULT_DEEP_LINK_SCHEME.to_string();
    };

    let lowered = raw.trim().trim_end_matches("://").to_ascii_lowercase();
    let mut chars = lowered.chars();
    let valid = chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        lowered
    } else {
        tracing::warn!("ignoring invalid deep-link scheme '{raw}'");
        DEFAULT_DEEP_LINK_SCHEME.to_string()
    }
}

fn parse_duration_ms(raw: Option<&str>, default: Duration) -> Duration {
    raw.and_then(|value| value.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "on" | "yes") => true,
        Some("0" | "false" | "off" | "no") => false,
        _ => default,
    }
}
