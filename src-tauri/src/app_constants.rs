pub(crate) const MAIN_WINDOW_LABEL: &str = "main";

pub(crate) const UPDATE_STATUS_EVENT: &str = "update-status";
pub(crate) const GAME_ERROR_EVENT: &str = "game-error";

pub(crate) const LAUNCHER_LOG_FILE: &str = "launcher.log";
pub(crate) const DEFAULT_LOG_FILTER: &str = "info";
