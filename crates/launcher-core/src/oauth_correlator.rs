//! Matches an OAuth redirect delivered through the OS back to the login
//! request that opened the browser.
//!
//! The correlator owns a single slot that moves `Idle → Pending → Resolved`.
//! A pending attempt completes exactly once, by whichever comes first: the
//! redirect (denied, malformed, or exchanged code) or the expiry timer.
//! Everything that arrives for an attempt that already completed is dropped.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, Weak,
    },
    time::Duration,
};

use tokio::{sync::oneshot, time::Instant};
use url::Url;

use crate::{
    config::DiscordOAuthConfig,
    discord_token::TokenExchange,
    error::LoginError,
    host::ShellHost,
    instance_arbiter::{CallbackDisposition, DeepLinkTarget},
    login_types::{LoginFailure, LoginResult},
    oauth_callback::{parse_callback, CallbackParams},
};

struct PendingLogin {
    attempt: u64,
    created_at: Instant,
    responder: oneshot::Sender<LoginResult>,
    exchanging: bool,
}

enum LoginSlot {
    Idle,
    Pending(PendingLogin),
    Resolved { attempt: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginSlotState {
    Idle,
    Pending,
    Resolved,
}

/// The caller's side of a started login.
#[derive(Debug)]
pub struct PendingLoginHandle {
    attempt: u64,
    receiver: oneshot::Receiver<LoginResult>,
}

impl PendingLoginHandle {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub async fn wait(self) -> LoginResult {
        match self.receiver.await {
            Ok(result) => result,
            // Only happens when the correlator itself is torn down.
            Err(_) => LoginResult::failure_with_detail(
                LoginFailure::Expired,
                "login was abandoned before completing",
            ),
        }
    }
}

pub struct OAuthCorrelator {
    config: DiscordOAuthConfig,
    expiry: Duration,
    host: Arc<dyn ShellHost>,
    exchange: Arc<dyn TokenExchange>,
    slot: Mutex<LoginSlot>,
    next_attempt: AtomicU64,
}

impl OAuthCorrelator {
    pub fn new(
        config: DiscordOAuthConfig,
        expiry: Duration,
        host: Arc<dyn ShellHost>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        Self {
            config,
            expiry,
            host,
            exchange,
            slot: Mutex::new(LoginSlot::Idle),
            next_attempt: AtomicU64::new(1),
        }
    }

    pub fn state(&self) -> LoginSlotState {
        match &*self.lock_slot() {
            LoginSlot::Idle => LoginSlotState::Idle,
            LoginSlot::Pending(_) => LoginSlotState::Pending,
            LoginSlot::Resolved { .. } => LoginSlotState::Resolved,
        }
    }

    pub fn authorize_url(&self) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "));
        url
    }

    /// Opens the provider's authorize page and arms the expiry timer. Fails
    /// without touching the pending attempt when one already exists.
    pub fn start_login(self: &Arc<Self>) -> Result<PendingLoginHandle, LoginError> {
        let authorize_url = self.authorize_url();
        if authorize_url.cannot_be_a_base() {
            return Err(LoginError::InvalidAuthorizeUrl(authorize_url.to_string()));
        }

        let (responder, receiver) = oneshot::channel();
        let attempt = {
            let mut slot = self.lock_slot();
            if matches!(*slot, LoginSlot::Pending(_)) {
                tracing::warn!("login requested while another login is pending; rejecting");
                return Err(LoginError::AlreadyPending);
            }
            let attempt = self.next_attempt.fetch_add(1, Ordering::Relaxed);
            *slot = LoginSlot::Pending(PendingLogin {
                attempt,
                created_at: Instant::now(),
                responder,
                exchanging: false,
            });
            attempt
        };

        if let Err(error) = self.host.open_external_url(&authorize_url) {
            tracing::error!("failed to open browser for login attempt {attempt}: {error}");
            let mut slot = self.lock_slot();
            if matches!(&*slot, LoginSlot::Pending(pending) if pending.attempt == attempt) {
                *slot = LoginSlot::Idle;
            }
            return Err(LoginError::BrowserUnavailable(error));
        }

        tracing::info!(
            "login attempt {attempt} started, expires in {}s",
            self.expiry.as_secs()
        );
        self.arm_expiry(attempt);
        Ok(PendingLoginHandle { attempt, receiver })
    }

    fn arm_expiry(self: &Arc<Self>, attempt: u64) {
        let correlator: Weak<Self> = Arc::downgrade(self);
        let deadline = Instant::now() + self.expiry;
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(correlator) = correlator.upgrade() {
                if correlator.resolve(attempt, LoginResult::failure(LoginFailure::Expired)) {
                    tracing::warn!("login attempt {attempt} expired without a callback");
                }
            }
        });
    }

    /// Routes a redirect URL to the pending attempt, if any.
    pub async fn deliver_callback(&self, raw_url: &str) -> CallbackDisposition {
        let parsed = parse_callback(raw_url);

        let attempt = {
            let mut slot = self.lock_slot();
            let pending = match &mut *slot {
                LoginSlot::Pending(pending) => pending,
                LoginSlot::Resolved { attempt } => {
                    tracing::info!("dropping login callback: attempt {attempt} already completed");
                    return CallbackDisposition::NoPendingLogin;
                }
                LoginSlot::Idle => {
                    tracing::info!("dropping login callback: no login is pending");
                    return CallbackDisposition::NoPendingLogin;
                }
            };
            if pending.exchanging {
                tracing::warn!(
                    "dropping login callback: attempt {} is already exchanging a code",
                    pending.attempt
                );
                return CallbackDisposition::ExchangeInFlight;
            }
            if matches!(parsed, Ok(CallbackParams::Code(_))) {
                pending.exchanging = true;
            }
            pending.attempt
        };

        let result = match parsed {
            Err(error) => {
                tracing::warn!("login attempt {attempt}: {error}");
                LoginResult::failure_with_detail(LoginFailure::MalformedCallback, error.0)
            }
            Ok(CallbackParams::Denied { error, description }) => {
                tracing::info!(
                    "login attempt {attempt} cancelled: error={} description={}",
                    error.as_deref().unwrap_or("<none>"),
                    description.as_deref().unwrap_or("<none>")
                );
                match error {
                    Some(error) => {
                        LoginResult::failure_with_detail(LoginFailure::UserCancelled, error)
                    }
                    None => LoginResult::failure(LoginFailure::UserCancelled),
                }
            }
            Ok(CallbackParams::Code(code)) => match self.exchange.exchange(&code).await {
                Ok(session) => LoginResult::Success(session),
                Err(error) => {
                    tracing::error!("login attempt {attempt}: code exchange failed: {error}");
                    LoginResult::failure_with_detail(LoginFailure::ProviderError, error.to_string())
                }
            },
        };

        if self.resolve(attempt, result) {
            CallbackDisposition::Resolved
        } else {
            tracing::warn!("login attempt {attempt} completed after it had already expired");
            CallbackDisposition::Superseded
        }
    }

    /// Completes `attempt` if it is still the pending one. Returns whether
    /// this call was the one that completed it.
    fn resolve(&self, attempt: u64, result: LoginResult) -> bool {
        let pending = {
            let mut slot = self.lock_slot();
            match &*slot {
                LoginSlot::Pending(pending) if pending.attempt == attempt => {}
                _ => return false,
            }
            match std::mem::replace(&mut *slot, LoginSlot::Resolved { attempt }) {
                LoginSlot::Pending(pending) => pending,
                _ => return false,
            }
        };

        tracing::info!(
            "login attempt {attempt} resolved after {}ms: success={}",
            pending.created_at.elapsed().as_millis(),
            result.is_success()
        );
        if pending.responder.send(result).is_err() {
            tracing::debug!("login attempt {attempt} resolved but nobody is waiting");
        }
        true
    }

    fn lock_slot(&self) -> MutexGuard<'_, LoginSlot> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl DeepLinkTarget for OAuthCorrelator {
    async fn deliver_callback(&self, url: &str) -> CallbackDisposition {
        OAuthCorrelator::deliver_callback(self, url).await
    }
}
