//! The request/response surface the UI talks to. Each operation delegates to
//! one component; long-running work reports through the host's channels.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};

use crate::{
    app_types::CheckUpdatesResult,
    config::LauncherConfig,
    discord_token::TokenExchange,
    error::{ConfigError, LaunchError, LoginError},
    host::ShellHost,
    instance_arbiter::InstanceArbiter,
    launch_target::LaunchTarget,
    login_types::LoginResult,
    oauth_correlator::OAuthCorrelator,
    process_launcher::{DetachedSpawner, GameLauncher, ProcessSpawner},
    shell_locale::{self, ShellTexts, DEFAULT_SHELL_LOCALE},
    update_coordinator::{UpdateCoordinator, UpdateSource},
    update_status::UpdateStage,
};

pub struct LauncherFacade<S: UpdateSource, P: ProcessSpawner = DetachedSpawner> {
    app_version: String,
    root_dir: Option<PathBuf>,
    launch_exit_delay: Duration,
    install_on_quit: bool,
    locale: RwLock<&'static str>,
    host: Arc<dyn ShellHost>,
    updates: Arc<UpdateCoordinator<S>>,
    launcher: GameLauncher<P>,
    game_launched: AtomicBool,
    login: Arc<OAuthCorrelator>,
    arbiter: InstanceArbiter,
}

impl<S: UpdateSource, P: ProcessSpawner> LauncherFacade<S, P> {
    pub fn new(
        config: &LauncherConfig,
        app_version: String,
        locale: &'static str,
        host: Arc<dyn ShellHost>,
        exchange: Arc<dyn TokenExchange>,
        launcher: GameLauncher<P>,
    ) -> Self {
        let texts = shell_locale::shell_texts_for_locale(locale);
        let login = Arc::new(OAuthCorrelator::new(
            config.discord.clone(),
            config.login_timeout,
            Arc::clone(&host),
            exchange,
        ));
        let arbiter = InstanceArbiter::new(
            &config.deep_link_scheme,
            Arc::clone(&host),
            Arc::clone(&login) as _,
        );

        Self {
            app_version,
            root_dir: config.root_dir.clone(),
            launch_exit_delay: config.launch_exit_delay,
            install_on_quit: config.install_on_quit,
            locale: RwLock::new(locale),
            updates: Arc::new(UpdateCoordinator::new(Arc::clone(&host), texts)),
            host,
            launcher,
            game_launched: AtomicBool::new(false),
            login,
            arbiter,
        }
    }

    pub fn version(&self) -> &str {
        &self.app_version
    }

    pub fn locale(&self) -> &'static str {
        *self
            .locale
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn texts(&self) -> ShellTexts {
        shell_locale::shell_texts_for_locale(self.locale())
    }

    pub fn arbiter(&self) -> &InstanceArbiter {
        &self.arbiter
    }

    pub fn update_stage(&self) -> UpdateStage {
        self.updates.stage()
    }

    /// Acknowledges that a check was started; the outcome streams through
    /// `update-status`.
    pub fn check_updates(&self, source: S) -> CheckUpdatesResult {
        match self.updates.check_for_updates(source, self.texts()) {
            Ok(()) => CheckUpdatesResult::started(),
            Err(error) => {
                tracing::warn!("update check not started: {error}");
                CheckUpdatesResult::failed(error.to_string())
            }
        }
    }

    /// Installs the downloaded update and asks the shell to restart into it.
    pub fn install_update(&self) -> Result<String, String> {
        let version = self.updates.install_update().map_err(|error| {
            tracing::warn!("install_update refused: {error}");
            error.to_string()
        })?;
        tracing::info!("update {version} installed; restarting launcher");
        self.host.request_restart();
        Ok(version)
    }

    /// Spawns the game and schedules the launcher's exit after the grace
    /// period. Failures go to `game-error` and leave the launcher open. Once a
    /// spawn succeeded every later call is refused.
    pub fn launch_game(&self) -> Result<LaunchTarget, LaunchError> {
        if self
            .game_launched
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("launch_game ignored: game already started");
            return Err(LaunchError::AlreadyLaunched);
        }

        match self.launcher.launch() {
            Ok(target) => {
                let host = Arc::clone(&self.host);
                let deadline = tokio::time::Instant::now() + self.launch_exit_delay;
                tokio::spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    tracing::info!("game started; closing launcher");
                    host.request_exit();
                });
                Ok(target)
            }
            Err(error) => {
                self.game_launched.store(false, Ordering::Release);
                tracing::error!("{error}");
                let texts = self.texts();
                let message = if matches!(error, LaunchError::SpawnFailed { .. }) {
                    texts.game_spawn_failed
                } else {
                    texts.game_not_found
                };
                self.host.emit_game_error(message);
                Err(error)
            }
        }
    }

    /// Opens the provider in the browser and waits for the redirect or the
    /// expiry, whichever comes first.
    pub async fn discord_login(&self) -> Result<LoginResult, LoginError> {
        let handle = self.login.start_login()?;
        Ok(handle.wait().await)
    }

    /// Persists the UI locale and switches texts for later events. Returns
    /// the locale now in effect.
    pub fn set_locale(&self, locale: Option<&str>) -> Result<&'static str, ConfigError> {
        let cached = shell_locale::write_cached_shell_locale(locale, self.root_dir.as_deref())?;
        let effective = cached.unwrap_or(DEFAULT_SHELL_LOCALE);
        *self
            .locale
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = effective;
        tracing::info!("shell locale set to {effective}");
        Ok(effective)
    }

    /// Called once while the application exits.
    pub fn shutdown(&self) {
        if self.install_on_quit {
            self.updates.install_pending_on_quit();
        }
    }
}
