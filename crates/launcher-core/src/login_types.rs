use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Tokens and profile of a completed login. Only ever held in memory.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordSession {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub profile: DiscordProfile,
}

impl fmt::Debug for DiscordSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordSession")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginFailure {
    UserCancelled,
    ProviderError,
    Expired,
    MalformedCallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "LoginResultWire")]
pub enum LoginResult {
    Success(DiscordSession),
    Failure {
        reason: LoginFailure,
        detail: Option<String>,
    },
}

impl LoginResult {
    pub fn failure(reason: LoginFailure) -> Self {
        Self::Failure {
            reason,
            detail: None,
        }
    }

    pub fn failure_with_detail(reason: LoginFailure, detail: impl Into<String>) -> Self {
        Self::Failure {
            reason,
            detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure_reason(&self) -> Option<LoginFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Serialize)]
struct LoginResultWire {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<DiscordSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<LoginFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl From<LoginResult> for LoginResultWire {
    fn from(result: LoginResult) -> Self {
        match result {
            LoginResult::Success(session) => Self {
                success: true,
                session: Some(session),
                reason: None,
                detail: None,
            },
            LoginResult::Failure { reason, detail } => Self {
                success: false,
                session: None,
                reason: Some(reason),
                detail,
            },
        }
    }
}
