use tauri::{AppHandle, Emitter};
use tower_launcher_core::{system_browser, ShellHost, UpdateStatus};
use url::Url;

use crate::{window_actions, GAME_ERROR_EVENT, UPDATE_STATUS_EVENT};

/// `ShellHost` over the running Tauri application.
pub(crate) struct TauriHost {
    app_handle: AppHandle,
}

impl TauriHost {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl ShellHost for TauriHost {
    fn emit_update_status(&self, status: &UpdateStatus) {
        if let Err(error) = self.app_handle.emit(UPDATE_STATUS_EVENT, status) {
            tracing::error!("failed to emit {UPDATE_STATUS_EVENT}: {error}");
        }
    }

    fn emit_game_error(&self, message: &str) {
        if let Err(error) = self.app_handle.emit(GAME_ERROR_EVENT, message) {
            tracing::error!("failed to emit {GAME_ERROR_EVENT}: {error}");
        }
    }

    fn open_external_url(&self, url: &Url) -> Result<(), String> {
        system_browser::open_in_system_browser(url)
    }

    fn focus_main_window(&self) {
        window_actions::show_main_window(&self.app_handle);
    }

    fn request_exit(&self) {
        self.app_handle.exit(0);
    }

    fn request_restart(&self) {
        self.app_handle.request_restart();
    }
}
