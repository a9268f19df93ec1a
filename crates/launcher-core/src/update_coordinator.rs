use std::sync::{atomic::AtomicBool, Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{
    app_types::AtomicFlagGuard,
    error::UpdateError,
    host::ShellHost,
    shell_locale::ShellTexts,
    update_status::{UpdateEvent, UpdateStage, UpdateStateMachine, UpdateStatus},
};

pub type ProgressCallback = Box<dyn FnMut(f64) + Send>;

#[derive(Debug, Clone)]
pub struct RemoteRelease<P> {
    pub version: String,
    pub package: P,
}

/// The update transport: check, download and install primitives. The
/// coordinator never calls `install` before it has observed `Downloaded`.
#[async_trait]
pub trait UpdateSource: Send + Sync + 'static {
    type Package: Send + Sync + 'static;

    fn current_version(&self) -> String;

    async fn check(&self) -> Result<Option<RemoteRelease<Self::Package>>, UpdateError>;

    /// Downloads the package, reporting percentages in `0.0..=100.0`.
    async fn download(
        &self,
        package: &Self::Package,
        on_progress: ProgressCallback,
    ) -> Result<Vec<u8>, UpdateError>;

    fn install(&self, package: &Self::Package, bytes: &[u8]) -> Result<(), UpdateError>;
}

struct ReadyUpdate<S: UpdateSource> {
    source: Arc<S>,
    version: String,
    package: S::Package,
    bytes: Vec<u8>,
}

pub struct UpdateCoordinator<S: UpdateSource> {
    host: Arc<dyn ShellHost>,
    machine: Mutex<UpdateStateMachine>,
    ready: Mutex<Option<ReadyUpdate<S>>>,
    installing: AtomicBool,
}

impl<S: UpdateSource> UpdateCoordinator<S> {
    pub fn new(host: Arc<dyn ShellHost>, texts: ShellTexts) -> Self {
        Self {
            host,
            machine: Mutex::new(UpdateStateMachine::new(texts)),
            ready: Mutex::new(None),
            installing: AtomicBool::new(false),
        }
    }

    pub fn stage(&self) -> UpdateStage {
        self.lock_machine().stage()
    }

    /// Starts a new cycle in the background and returns once `Checking` has
    /// been emitted. Results arrive as `update-status` events.
    pub fn check_for_updates(
        self: &Arc<Self>,
        source: S,
        texts: ShellTexts,
    ) -> Result<(), UpdateError> {
        {
            let mut machine = self.lock_machine();
            if !machine.stage().is_cycle_finished() {
                return Err(UpdateError::CheckInProgress);
            }
            machine.set_texts(texts);
            let status = machine
                .apply(UpdateEvent::CheckStarted)
                .map_err(|_| UpdateError::CheckInProgress)?;
            self.host.emit_update_status(&status);
        }

        if let Some(stale) = self.lock_ready().take() {
            tracing::info!(
                "discarding downloaded update {} for a new check",
                stale.version
            );
        }

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.run_cycle(Arc::new(source)).await;
        });
        Ok(())
    }

    async fn run_cycle(self: Arc<Self>, source: Arc<S>) {
        let current_version = source.current_version();
        tracing::info!("checking for updates, current_version={current_version}");

        let release = match source.check().await {
            Ok(Some(release)) => release,
            Ok(None) => {
                tracing::info!("no update available");
                self.advance(UpdateEvent::NotAvailable { current_version });
                return;
            }
            Err(error) => {
                self.advance(UpdateEvent::Failed {
                    detail: error.to_string(),
                });
                return;
            }
        };

        if !is_newer_version(&release.version, &current_version) {
            tracing::warn!(
                "updater offered {} which is not newer than {current_version}; ignoring",
                release.version
            );
            self.advance(UpdateEvent::NotAvailable { current_version });
            return;
        }

        let version = release.version.clone();
        tracing::info!("update {version} available, downloading");
        if self
            .advance(UpdateEvent::Available {
                version: version.clone(),
            })
            .is_none()
        {
            return;
        }
        self.advance(UpdateEvent::Progress { percent: 0.0 });

        let progress_target = Arc::clone(&self);
        let on_progress: ProgressCallback = Box::new(move |percent| {
            progress_target.advance(UpdateEvent::Progress { percent });
        });

        match source.download(&release.package, on_progress).await {
            Ok(bytes) => {
                tracing::info!("update {version} downloaded ({} bytes)", bytes.len());
                *self.lock_ready() = Some(ReadyUpdate {
                    source: Arc::clone(&source),
                    version: version.clone(),
                    package: release.package,
                    bytes,
                });
                self.advance(UpdateEvent::Downloaded { version });
            }
            Err(error) => {
                self.advance(UpdateEvent::Failed {
                    detail: error.to_string(),
                });
            }
        }
    }

    /// Installs the package downloaded by the last cycle. Returns the
    /// installed version.
    pub fn install_update(&self) -> Result<String, UpdateError> {
        let _guard =
            AtomicFlagGuard::try_set(&self.installing).ok_or(UpdateError::InstallInProgress)?;

        if self.stage() != UpdateStage::Downloaded {
            return Err(UpdateError::NotDownloaded);
        }
        let ready = self.lock_ready().take().ok_or(UpdateError::NotDownloaded)?;

        tracing::info!("installing update {}", ready.version);
        if let Err(error) = ready.source.install(&ready.package, &ready.bytes) {
            self.advance(UpdateEvent::Failed {
                detail: error.to_string(),
            });
            return Err(error);
        }
        Ok(ready.version)
    }

    /// Installs a downloaded-but-not-installed package while the app exits.
    pub fn install_pending_on_quit(&self) {
        if self.stage() != UpdateStage::Downloaded {
            return;
        }
        match self.install_update() {
            Ok(version) => tracing::info!("installed update {version} on quit"),
            Err(UpdateError::NotDownloaded) => {}
            Err(error) => tracing::error!("failed to install update on quit: {error}"),
        }
    }

    /// Applies `event` and emits the resulting status while still holding the
    /// machine lock so observers see statuses in production order.
    fn advance(&self, event: UpdateEvent) -> Option<UpdateStatus> {
        let mut machine = self.lock_machine();
        match machine.apply(event) {
            Ok(status) => {
                self.host.emit_update_status(&status);
                Some(status)
            }
            Err(rejected) => {
                tracing::warn!("dropping update event: {rejected}");
                None
            }
        }
    }

    fn lock_machine(&self) -> MutexGuard<'_, UpdateStateMachine> {
        self.machine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_ready(&self) -> MutexGuard<'_, Option<ReadyUpdate<S>>> {
        self.ready
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Trusts the collaborator unless both versions parse as semver.
fn is_newer_version(candidate: &str, current: &str) -> bool {
    let parse = |raw: &str| semver::Version::parse(raw.trim().trim_start_matches('v')).ok();
    match (parse(candidate), parse(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => true,
    }
}
