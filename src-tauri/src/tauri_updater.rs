use async_trait::async_trait;
use tauri::AppHandle;
use tauri_plugin_updater::{Update, Updater, UpdaterExt};
use tower_launcher_core::{ProgressCallback, RemoteRelease, UpdateError, UpdateSource};

/// `UpdateSource` backed by the Tauri updater plugin.
pub(crate) struct TauriUpdateSource {
    updater: Updater,
    current_version: String,
}

impl TauriUpdateSource {
    pub(crate) fn from_app(app_handle: &AppHandle) -> Result<Self, UpdateError> {
        let updater = app_handle
            .updater()
            .map_err(|error| UpdateError::Unavailable(error.to_string()))?;
        Ok(Self {
            updater,
            current_version: app_handle.package_info().version.to_string(),
        })
    }
}

#[async_trait]
impl UpdateSource for TauriUpdateSource {
    type Package = Update;

    fn current_version(&self) -> String {
        self.current_version.clone()
    }

    async fn check(&self) -> Result<Option<RemoteRelease<Update>>, UpdateError> {
        let update = self
            .updater
            .check()
            .await
            .map_err(|error| UpdateError::CheckFailed(error.to_string()))?;
        Ok(update.map(|update| RemoteRelease {
            version: update.version.clone(),
            package: update,
        }))
    }

    async fn download(
        &self,
        package: &Update,
        mut on_progress: ProgressCallback,
    ) -> Result<Vec<u8>, UpdateError> {
        let mut downloaded: u64 = 0;
        package
            .download(
                move |chunk_length, content_length| {
                    downloaded = downloaded.saturating_add(chunk_length as u64);
                    if let Some(percent) = percent_of(downloaded, content_length) {
                        on_progress(percent);
                    }
                },
                || tracing::info!("update download finished"),
            )
            .await
            .map_err(|error| UpdateError::DownloadFailed {
                version: package.version.clone(),
                message: error.to_string(),
            })
    }

    fn install(&self, package: &Update, bytes: &[u8]) -> Result<(), UpdateError> {
        package
            .install(bytes)
            .map_err(|error| UpdateError::InstallFailed {
                version: package.version.clone(),
                message: error.to_string(),
            })
    }
}

/// Unknown or zero content length yields no percentage.
fn percent_of(downloaded: u64, content_length: Option<u64>) -> Option<f64> {
    let total = content_length.filter(|total| *total > 0)?;
    Some((downloaded as f64 / total as f64 * 100.0).min(100.0))
}
