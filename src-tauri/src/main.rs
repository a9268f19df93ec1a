#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod launcher_bridge_commands;
mod logging;
mod tauri_host;
mod tauri_updater;
mod window_actions;

pub(crate) use app_constants::*;
pub(crate) use app_types::{LauncherBridgeResult, LauncherState};

fn main() {
    app_runtime::run();
}
