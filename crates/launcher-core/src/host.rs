use url::Url;

use crate::update_status::UpdateStatus;

/// Everything the core needs from the windowing shell. The Tauri binary
/// implements this over its `AppHandle`; tests use a recording fake.
pub trait ShellHost: Send + Sync + 'static {
    /// Pushes a status value onto the `update-status` channel.
    fn emit_update_status(&self, status: &UpdateStatus);

    /// Pushes a message onto the `game-error` channel.
    fn emit_game_error(&self, message: &str);

    /// Opens `url` in the user's default browser.
    fn open_external_url(&self, url: &Url) -> Result<(), String>;

    /// Restores, shows and focuses the main window.
    fn focus_main_window(&self);

    /// Asks the application to exit.
    fn request_exit(&self);

    /// Asks the application to restart after an installed update.
    fn request_restart(&self);
}
