use tauri::{AppHandle, Manager, WebviewWindow};

use crate::MAIN_WINDOW_LABEL;

fn main_window(app_handle: &AppHandle, action: &str) -> Option<WebviewWindow> {
    let window = app_handle.get_webview_window(MAIN_WINDOW_LABEL);
    if window.is_none() {
        tracing::warn!("{action} skipped: main window not found");
    }
    window
}

pub fn show_main_window(app_handle: &AppHandle) {
    let Some(window) = main_window(app_handle, "show_main_window") else {
        return;
    };

    if let Err(error) = window.unminimize() {
        tracing::warn!("failed to unminimize main window: {error}");
    }
    if let Err(error) = window.show() {
        tracing::warn!("failed to show main window: {error}");
    }
    if let Err(error) = window.set_focus() {
        tracing::warn!("failed to focus main window: {error}");
    }
}

pub fn close_main_window(app_handle: &AppHandle) {
    let Some(window) = main_window(app_handle, "close_main_window") else {
        return;
    };
    if let Err(error) = window.close() {
        tracing::error!("failed to close main window: {error}");
    }
}

pub fn minimize_main_window(app_handle: &AppHandle) {
    let Some(window) = main_window(app_handle, "minimize_main_window") else {
        return;
    };
    if let Err(error) = window.minimize() {
        tracing::warn!("failed to minimize main window: {error}");
    }
}

pub fn toggle_maximize_main_window(app_handle: &AppHandle) {
    let Some(window) = main_window(app_handle, "toggle_maximize_main_window") else {
        return;
    };

    let result = match window.is_maximized() {
        Ok(true) => window.unmaximize(),
        Ok(false) => window.maximize(),
        Err(error) => {
            tracing::warn!("failed to read main window maximized state: {error}");
            return;
        }
    };
    if let Err(error) = result {
        tracing::warn!("failed to toggle main window maximize: {error}");
    }
}
