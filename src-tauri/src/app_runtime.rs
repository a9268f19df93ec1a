use std::{
    error::Error,
    path::{Path, PathBuf},
    sync::Arc,
};

use tauri::{AppHandle, Manager, RunEvent};
use tauri_plugin_deep_link::DeepLinkExt;
use tower_launcher_core::{
    config::DEFAULT_DEEP_LINK_SCHEME,
    runtime_paths,
    shell_locale::{self, DEFAULT_SHELL_LOCALE},
    DetachedSpawner, DiscordTokenClient, GameLauncher, LauncherConfig, LauncherFacade, Platform,
    STARTUP_UPDATE_CHECK_DELAY,
};
use url::Url;

use crate::{
    logging, tauri_host::TauriHost, tauri_updater::TauriUpdateSource, window_actions,
    LauncherState,
};

fn is_packaged() -> bool {
    !cfg!(debug_assertions)
}

fn workspace_root_dir() -> PathBuf {
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..");
    candidate.canonicalize().unwrap_or(candidate)
}

pub(crate) fn run() {
    let config = LauncherConfig::from_env();
    let log_dir = runtime_paths::resolve_log_dir(config.root_dir.as_deref());
    let _log_guard = logging::init_logging(&log_dir);

    tracing::info!("launcher process starting");
    tracing::info!(
        "launcher log path: {}",
        logging::resolve_log_path(&log_dir).display()
    );

    // single-instance must be registered first so a second process exits
    // before any other plugin initializes.
    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app_handle, args, cwd| {
            forward_secondary_invocation(app_handle, args, cwd);
        }))
        .plugin(tauri_plugin_deep_link::init())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .plugin(tauri_plugin_process::init())
        .invoke_handler(tauri::generate_handler![
            crate::launcher_bridge_commands::get_app_version,
            crate::launcher_bridge_commands::check_updates,
            crate::launcher_bridge_commands::install_update,
            crate::launcher_bridge_commands::launch_game,
            crate::launcher_bridge_commands::discord_login,
            crate::launcher_bridge_commands::set_shell_locale,
            crate::launcher_bridge_commands::close_app,
            crate::launcher_bridge_commands::minimize_app,
            crate::launcher_bridge_commands::maximize_app,
        ])
        .setup(move |app| {
            let app_handle = app.handle().clone();
            let launcher = build_launcher(&app_handle, &config)?;
            app.manage(launcher);

            setup_deep_links(&app_handle, &config.deep_link_scheme);

            if config.startup_update_check && is_packaged() {
                spawn_startup_update_check(app_handle);
            } else {
                tracing::info!("startup update check skipped");
            }
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            if let RunEvent::Exit = event {
                if let Some(state) = app_handle.try_state::<LauncherState>() {
                    state.shutdown();
                }
                tracing::info!("launcher exiting");
            }
        });
}

fn build_launcher(
    app_handle: &AppHandle,
    config: &LauncherConfig,
) -> Result<LauncherState, Box<dyn Error>> {
    let locale =
        shell_locale::resolve_shell_locale(DEFAULT_SHELL_LOCALE, config.root_dir.as_deref());
    let resource_dir = app_handle.path().resource_dir().ok();
    let game_dir = runtime_paths::resolve_game_dir(
        config.game_dir_override.as_deref(),
        resource_dir.as_deref(),
        is_packaged(),
        &workspace_root_dir(),
    );
    tracing::info!("game directory: {} (locale {locale})", game_dir.display());

    if config.discord.client_id.is_empty() {
        tracing::warn!("TOWER_LAUNCHER_DISCORD_CLIENT_ID is not set; Discord will reject logins");
    }
    let exchange = DiscordTokenClient::new(config.discord.clone())?;

    Ok(LauncherFacade::new(
        config,
        app_handle.package_info().version.to_string(),
        locale,
        Arc::new(TauriHost::new(app_handle.clone())),
        Arc::new(exchange),
        GameLauncher::new(Platform::current(), game_dir, DetachedSpawner),
    ))
}

/// Runs in the primary process when another launch was redirected to it.
fn forward_secondary_invocation(app_handle: &AppHandle, args: Vec<String>, cwd: String) {
    let app_handle = app_handle.clone();
    tauri::async_runtime::spawn(async move {
        let Some(state) = app_handle.try_state::<LauncherState>() else {
            tracing::warn!("second instance arrived before the launcher was ready");
            window_actions::show_main_window(&app_handle);
            return;
        };
        state
            .arbiter()
            .handle_secondary_invocation(&args, Path::new(&cwd))
            .await;
    });
}

fn forward_open_urls(app_handle: &AppHandle, urls: Vec<Url>) {
    let urls: Vec<String> = urls.into_iter().map(String::from).collect();
    let app_handle = app_handle.clone();
    tauri::async_runtime::spawn(async move {
        let Some(state) = app_handle.try_state::<LauncherState>() else {
            tracing::warn!("deep link arrived before the launcher was ready");
            return;
        };
        state.arbiter().handle_open_urls(&urls).await;
    });
}

/// Scheme that `tauri.conf.json` does not already register, if any.
fn runtime_scheme(configured: &str) -> Option<&str> {
    (!configured.eq_ignore_ascii_case(DEFAULT_DEEP_LINK_SCHEME)).then_some(configured)
}

/// Windows and Linux deliver links as arguments of a second process, which
/// the single-instance callback forwards. macOS delivers them as open-url
/// events to the running process.
fn setup_deep_links(app_handle: &AppHandle, scheme: &str) {
    #[cfg(any(windows, target_os = "linux"))]
    {
        if let Err(error) = app_handle.deep_link().register_all() {
            tracing::warn!("failed to register deep-link schemes: {error}");
        }
        if let Some(extra) = runtime_scheme(scheme) {
            match app_handle.deep_link().register(extra) {
                Ok(()) => tracing::info!("registered deep-link scheme {extra}"),
                Err(error) => {
                    tracing::warn!("failed to register deep-link scheme {extra}: {error}")
                }
            }
        }
    }

    // Bundles declare their schemes in Info.plist; nothing can be added at runtime.
    #[cfg(target_os = "macos")]
    if let Some(extra) = runtime_scheme(scheme) {
        tracing::warn!(
            "deep-link scheme {extra} is not in the bundle; login callbacks will not arrive"
        );
    }

    match app_handle.deep_link().get_current() {
        Ok(Some(urls)) => forward_open_urls(app_handle, urls),
        Ok(None) => {}
        Err(error) => tracing::warn!("failed to read startup deep links: {error}"),
    }

    #[cfg(target_os = "macos")]
    {
        let handle = app_handle.clone();
        app_handle.deep_link().on_open_url(move |event| {
            forward_open_urls(&handle, event.urls());
        });
    }
}

fn spawn_startup_update_check(app_handle: AppHandle) {
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(STARTUP_UPDATE_CHECK_DELAY).await;
        let Some(state) = app_handle.try_state::<LauncherState>() else {
            return;
        };

        match TauriUpdateSource::from_app(&app_handle) {
            Ok(source) => {
                let result = state.check_updates(source);
                if let Some(error) = result.error {
                    tracing::warn!("startup update check not started: {error}");
                }
            }
            Err(error) => tracing::warn!("startup update check skipped: {error}"),
        }
    });
}
