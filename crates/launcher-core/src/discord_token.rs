use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::DiscordOAuthConfig,
    error::ExchangeError,
    login_types::{DiscordProfile, DiscordSession},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Turns an authorization code into a session.
#[async_trait]
pub trait TokenExchange: Send + Sync + 'static {
    async fn exchange(&self, code: &str) -> Result<DiscordSession, ExchangeError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Authorization-code exchange against Discord's token endpoint followed by
/// a profile lookup with the fresh token.
pub struct DiscordTokenClient {
    http: reqwest::Client,
    config: DiscordOAuthConfig,
}

impl DiscordTokenClient {
    pub fn new(config: DiscordOAuthConfig) -> Result<Self, ExchangeError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tower-launcher/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    fn token_form(&self, code: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", self.config.redirect_uri.to_string()),
            ("client_id", self.config.client_id.clone()),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.clone()));
        }
        form
    }

    async fn request_token(&self, code: &str) -> Result<TokenResponse, ExchangeError> {
        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&self.token_form(code))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(provider_error) = serde_json::from_str::<ProviderErrorBody>(&body) {
                return Err(ExchangeError::Rejected(match provider_error.error_description {
                    Some(description) => format!("{}: {description}", provider_error.error),
                    None => provider_error.error,
                }));
            }
            return Err(ExchangeError::Status {
                endpoint: "token",
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }

    async fn fetch_profile(&self, token: &TokenResponse) -> Result<DiscordProfile, ExchangeError> {
        let response = self
            .http
            .get(self.config.profile_url.clone())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", token.token_type, token.access_token),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Status {
                endpoint: "profile",
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        Ok(response.json::<DiscordProfile>().await?)
    }
}

#[async_trait]
impl TokenExchange for DiscordTokenClient {
    async fn exchange(&self, code: &str) -> Result<DiscordSession, ExchangeError> {
        let token = self.request_token(code).await?;
        let profile = self.fetch_profile(&token).await?;
        tracing::info!("discord login exchanged for user {}", profile.id);

        Ok(DiscordSession {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            refresh_token: token.refresh_token,
            scope: token.scope,
            profile,
        })
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
