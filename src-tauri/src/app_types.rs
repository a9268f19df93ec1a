use tower_launcher_core::LauncherFacade;

use crate::tauri_updater::TauriUpdateSource;

/// Managed application state: the orchestration facade wired to Tauri.
pub(crate) type LauncherState = LauncherFacade<TauriUpdateSource>;

#[derive(Debug, serde::Serialize)]
pub(crate) struct LauncherBridgeResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
}

impl LauncherBridgeResult {
    pub(crate) fn ok() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub(crate) fn failed(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

impl From<Result<(), String>> for LauncherBridgeResult {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(reason) => Self::failed(reason),
        }
    }
}
