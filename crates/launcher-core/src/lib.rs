//! Orchestration core of the TowerDefense launcher: update lifecycle, game
//! process launch, Discord login correlation and deep-link routing. The
//! windowing shell plugs in through [`ShellHost`] and [`UpdateSource`].

pub mod app_types;
pub mod config;
pub mod discord_token;
pub mod error;
pub mod host;
pub mod instance_arbiter;
pub mod launch_target;
pub mod launcher_facade;
pub mod login_types;
pub mod oauth_callback;
pub mod oauth_correlator;
pub mod process_launcher;
pub mod runtime_paths;
pub mod shell_locale;
pub mod system_browser;
pub mod update_coordinator;
pub mod update_status;

#[cfg(test)]
mod test_support;

pub use app_types::CheckUpdatesResult;
pub use config::{DiscordOAuthConfig, LauncherConfig, STARTUP_UPDATE_CHECK_DELAY};
pub use discord_token::{DiscordTokenClient, TokenExchange};
pub use error::{ConfigError, ExchangeError, LaunchError, LoginError, UpdateError};
pub use host::ShellHost;
pub use instance_arbiter::{
    extract_deep_link, CallbackDisposition, DeepLinkTarget, InstanceArbiter,
};
pub use launch_target::{LaunchTarget, Platform};
pub use launcher_facade::LauncherFacade;
pub use login_types::{DiscordProfile, DiscordSession, LoginFailure, LoginResult};
pub use process_launcher::{DetachedSpawner, GameLauncher, ProcessSpawner};
pub use update_coordinator::{ProgressCallback, RemoteRelease, UpdateCoordinator, UpdateSource};
pub use update_status::{UpdateStage, UpdateStatus};
