//! Routes OS deep-link invocations into the running launcher.
//!
//! A second launcher process forwards its arguments here and exits; on
//! macOS the URLs arrive through the open-url event instead. Either way at
//! most one callback URL reaches the login correlator per invocation.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;

use crate::{config::normalize_scheme, host::ShellHost};

/// What happened to a callback URL handed to the login correlator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackDisposition {
    /// No login was waiting; the URL was logged and dropped.
    NoPendingLogin,
    /// A code for the pending login is already being exchanged.
    ExchangeInFlight,
    Resolved,
    /// The attempt completed (expired) while this URL was being processed.
    Superseded,
}

#[async_trait]
pub trait DeepLinkTarget: Send + Sync + 'static {
    async fn deliver_callback(&self, url: &str) -> CallbackDisposition;
}

/// Returns the first argument that is a URL with `scheme`, compared
/// case-insensitively.
pub fn extract_deep_link<S: AsRef<str>>(args: &[S], scheme: &str) -> Option<String> {
    args.iter()
        .map(|arg| arg.as_ref().trim())
        .find(|arg| {
            arg.get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
                && arg[scheme.len()..]
                    .strip_prefix(':')
                    .is_some_and(|rest| !rest.is_empty())
        })
        .map(str::to_string)
}

pub struct InstanceArbiter {
    scheme: String,
    host: Arc<dyn ShellHost>,
    target: Arc<dyn DeepLinkTarget>,
}

impl InstanceArbiter {
    pub fn new(scheme: &str, host: Arc<dyn ShellHost>, target: Arc<dyn DeepLinkTarget>) -> Self {
        Self {
            scheme: normalize_scheme(Some(scheme)),
            host,
            target,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Called in the primary instance with the argv of a rejected second
    /// launch. Always brings the window forward.
    pub async fn handle_secondary_invocation<S: AsRef<str>>(
        &self,
        args: &[S],
        cwd: &Path,
    ) -> Option<CallbackDisposition> {
        tracing::info!(
            "second launcher instance forwarded {} argument(s) from {}",
            args.len(),
            cwd.display()
        );
        self.host.focus_main_window();

        let Some(url) = extract_deep_link(args, &self.scheme) else {
            tracing::debug!("second instance carried no {}:// link", self.scheme);
            return None;
        };
        Some(self.deliver(&url).await)
    }

    /// URLs handed over by the OS open-url event or present at cold start.
    pub async fn handle_open_urls<S: AsRef<str>>(
        &self,
        urls: &[S],
    ) -> Option<CallbackDisposition> {
        let url = extract_deep_link(urls, &self.scheme)?;
        self.host.focus_main_window();
        Some(self.deliver(&url).await)
    }

    async fn deliver(&self, url: &str) -> CallbackDisposition {
        let disposition = self.target.deliver_callback(url).await;
        tracing::info!("deep link delivered: {disposition:?}");
        disposition
    }
}
