//! Fakes for the core's seams, shared by the unit tests.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;
use url::Url;

use crate::{
    error::{ExchangeError, UpdateError},
    host::ShellHost,
    instance_arbiter::{CallbackDisposition, DeepLinkTarget},
    launch_target::LaunchTarget,
    login_types::{DiscordProfile, DiscordSession},
    process_launcher::ProcessSpawner,
    update_coordinator::{ProgressCallback, RemoteRelease, UpdateSource},
    update_status::{UpdateStage, UpdateStatus},
};

/// Lets spawned tasks on the current-thread test runtime run to completion.
pub(crate) async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
pub(crate) struct RecordingHost {
    statuses: Mutex<Vec<UpdateStatus>>,
    game_errors: Mutex<Vec<String>>,
    opened_urls: Mutex<Vec<Url>>,
    pub(crate) focus_requests: AtomicUsize,
    pub(crate) exit_requests: AtomicUsize,
    pub(crate) restart_requests: AtomicUsize,
    pub(crate) browser_broken: AtomicBool,
}

impl RecordingHost {
    pub(crate) fn statuses(&self) -> Vec<UpdateStatus> {
        self.statuses.lock().expect("statuses lock").clone()
    }

    pub(crate) fn stages(&self) -> Vec<UpdateStage> {
        self.statuses().iter().map(|status| status.stage).collect()
    }

    pub(crate) fn game_errors(&self) -> Vec<String> {
        self.game_errors.lock().expect("game errors lock").clone()
    }

    pub(crate) fn opened_urls(&self) -> Vec<Url> {
        self.opened_urls.lock().expect("opened urls lock").clone()
    }

    pub(crate) fn exits(&self) -> usize {
        self.exit_requests.load(Ordering::SeqCst)
    }
}

impl ShellHost for RecordingHost {
    fn emit_update_status(&self, status: &UpdateStatus) {
        self.statuses
            .lock()
            .expect("statuses lock")
            .push(status.clone());
    }

    fn emit_game_error(&self, message: &str) {
        self.game_errors
            .lock()
            .expect("game errors lock")
            .push(message.to_string());
    }

    fn open_external_url(&self, url: &Url) -> Result<(), String> {
        if self.browser_broken.load(Ordering::SeqCst) {
            return Err("no browser available".to_string());
        }
        self.opened_urls
            .lock()
            .expect("opened urls lock")
            .push(url.clone());
        Ok(())
    }

    fn focus_main_window(&self) {
        self.focus_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn request_exit(&self) {
        self.exit_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn request_restart(&self) {
        self.restart_requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct CountingSpawner {
    spawned: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingSpawner {
    pub(crate) fn failing() -> Self {
        Self {
            spawned: Arc::default(),
            fail: true,
        }
    }

    pub(crate) fn spawned(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.spawned)
    }
}

impl ProcessSpawner for CountingSpawner {
    fn spawn_detached(&self, _target: &LaunchTarget) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "exec format error",
            ));
        }
        self.spawned.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct ScriptedUpdateSource {
    current_version: String,
    offered: Option<String>,
    progress: Vec<f64>,
    fail_check: bool,
    fail_download: bool,
    check_gate: Option<Arc<Notify>>,
    installs: Arc<AtomicUsize>,
}

impl ScriptedUpdateSource {
    pub(crate) fn up_to_date(current_version: &str) -> Self {
        Self {
            current_version: current_version.to_string(),
            offered: None,
            progress: Vec::new(),
            fail_check: false,
            fail_download: false,
            check_gate: None,
            installs: Arc::default(),
        }
    }

    pub(crate) fn offering(current_version: &str, offered: &str) -> Self {
        Self {
            offered: Some(offered.to_string()),
            progress: vec![50.0, 100.0],
            ..Self::up_to_date(current_version)
        }
    }

    pub(crate) fn failing_check(current_version: &str) -> Self {
        Self {
            fail_check: true,
            ..Self::up_to_date(current_version)
        }
    }

    pub(crate) fn with_progress(mut self, progress: Vec<f64>) -> Self {
        self.progress = progress;
        self
    }

    pub(crate) fn failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    /// Holds `check` until the returned gate is notified.
    pub(crate) fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.check_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub(crate) fn install_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.installs)
    }
}

#[async_trait]
impl UpdateSource for ScriptedUpdateSource {
    type Package = String;

    fn current_version(&self) -> String {
        self.current_version.clone()
    }

    async fn check(&self) -> Result<Option<RemoteRelease<String>>, UpdateError> {
        if let Some(gate) = &self.check_gate {
            gate.notified().await;
        }
        if self.fail_check {
            return Err(UpdateError::CheckFailed("offline".to_string()));
        }
        Ok(self.offered.as_ref().map(|version| RemoteRelease {
            version: version.clone(),
            package: format!("package-{version}"),
        }))
    }

    async fn download(
        &self,
        package: &String,
        mut on_progress: ProgressCallback,
    ) -> Result<Vec<u8>, UpdateError> {
        for percent in &self.progress {
            on_progress(*percent);
            tokio::task::yield_now().await;
        }
        if self.fail_download {
            return Err(UpdateError::DownloadFailed {
                version: package.clone(),
                message: "connection reset".to_string(),
            });
        }
        Ok(package.as_bytes().to_vec())
    }

    fn install(&self, _package: &String, _bytes: &[u8]) -> Result<(), UpdateError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Copy)]
pub(crate) enum ExchangeScript {
    Succeed,
    Fail,
}

pub(crate) struct ScriptedExchange {
    script: ExchangeScript,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    codes: Mutex<Vec<String>>,
}

impl ScriptedExchange {
    pub(crate) fn new(script: ExchangeScript) -> Self {
        Self {
            script,
            delay: None,
            calls: Arc::default(),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn delayed(script: ExchangeScript, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(script)
        }
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub(crate) fn codes(&self) -> Vec<String> {
        self.codes.lock().expect("codes lock").clone()
    }
}

#[async_trait]
impl crate::discord_token::TokenExchange for ScriptedExchange {
    async fn exchange(&self, code: &str) -> Result<DiscordSession, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.codes
            .lock()
            .expect("codes lock")
            .push(code.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.script {
            ExchangeScript::Succeed => Ok(session_for(code)),
            ExchangeScript::Fail => Err(ExchangeError::Rejected(
                "invalid_grant: unreachable provider".to_string(),
            )),
        }
    }
}

pub(crate) fn session_for(code: &str) -> DiscordSession {
    DiscordSession {
        access_token: format!("token-for-{code}"),
        token_type: "Bearer".to_string(),
        expires_in: Some(604800),
        refresh_token: Some("refresh".to_string()),
        scope: Some("identify".to_string()),
        profile: DiscordProfile {
            id: "80351110224678912".to_string(),
            username: "towerbuilder".to_string(),
            global_name: Some("Tower Builder".to_string()),
            avatar: None,
        },
    }
}

#[derive(Default)]
pub(crate) struct CountingDeepLinkTarget {
    pub(crate) delivered: Mutex<Vec<String>>,
}

impl CountingDeepLinkTarget {
    pub(crate) fn delivered(&self) -> Vec<String> {
        self.delivered.lock().expect("delivered lock").clone()
    }
}

#[async_trait]
impl DeepLinkTarget for CountingDeepLinkTarget {
    async fn deliver_callback(&self, url: &str) -> CallbackDisposition {
        self.delivered
            .lock()
            .expect("delivered lock")
            .push(url.to_string());
        CallbackDisposition::NoPendingLogin
    }
}
