use tauri::{AppHandle, Manager, State};
use tower_launcher_core::{CheckUpdatesResult, LoginResult};

use crate::{
    tauri_updater::TauriUpdateSource, window_actions, LauncherBridgeResult, LauncherState,
    GAME_ERROR_EVENT,
};

fn launcher_state(app_handle: &AppHandle) -> Result<State<'_, LauncherState>, String> {
    app_handle
        .try_state::<LauncherState>()
        .ok_or_else(|| "Launcher is still starting.".to_string())
}

#[tauri::command]
pub(crate) fn get_app_version(app_handle: AppHandle) -> String {
    match app_handle.try_state::<LauncherState>() {
        Some(state) => state.version().to_string(),
        None => app_handle.package_info().version.to_string(),
    }
}

#[tauri::command]
pub(crate) async fn check_updates(app_handle: AppHandle) -> CheckUpdatesResult {
    let state = match launcher_state(&app_handle) {
        Ok(state) => state,
        Err(error) => return CheckUpdatesResult::failed(error),
    };

    match TauriUpdateSource::from_app(&app_handle) {
        Ok(source) => state.check_updates(source),
        Err(error) => {
            tracing::error!("{error}");
            CheckUpdatesResult::failed(error.to_string())
        }
    }
}

#[tauri::command]
pub(crate) async fn install_update(app_handle: AppHandle) -> LauncherBridgeResult {
    let state = match launcher_state(&app_handle) {
        Ok(state) => state,
        Err(error) => return LauncherBridgeResult::failed(error),
    };
    state.install_update().map(|_| ()).into()
}

#[tauri::command]
pub(crate) async fn launch_game(app_handle: AppHandle) {
    let Ok(state) = launcher_state(&app_handle) else {
        tracing::warn!("launch_game ignored: launcher is still starting");
        return;
    };
    if let Err(error) = state.launch_game() {
        tracing::debug!("launch_game failed ({error}); the UI is told through {GAME_ERROR_EVENT}");
    }
}

#[tauri::command]
pub(crate) async fn discord_login(app_handle: AppHandle) -> Result<LoginResult, String> {
    let state = launcher_state(&app_handle)?;
    state
        .discord_login()
        .await
        .map_err(|error| error.to_string())
}

#[tauri::command]
pub(crate) fn set_shell_locale(
    app_handle: AppHandle,
    locale: Option<String>,
) -> LauncherBridgeResult {
    let state = match launcher_state(&app_handle) {
        Ok(state) => state,
        Err(error) => return LauncherBridgeResult::failed(error),
    };

    match state.set_locale(locale.as_deref()) {
        Ok(_) => LauncherBridgeResult::ok(),
        Err(error) => {
            tracing::error!("failed to persist shell locale: {error}");
            LauncherBridgeResult::failed(error.to_string())
        }
    }
}

#[tauri::command]
pub(crate) fn close_app(app_handle: AppHandle) {
    window_actions::close_main_window(&app_handle);
}

#[tauri::command]
pub(crate) fn minimize_app(app_handle: AppHandle) {
    window_actions::minimize_main_window(&app_handle);
}

#[tauri::command]
pub(crate) fn maximize_app(app_handle: AppHandle) {
    window_actions::toggle_maximize_main_window(&app_handle);
}
