use thiserror::Error;
use url::Url;

/// What an OAuth redirect carried back to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackParams {
    Code(String),
    /// The provider sent an `error`, or no usable `code` arrived.
    Denied {
        error: Option<String>,
        description: Option<String>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed callback URL: {0}")]
pub struct MalformedCallback(pub String);

/// Reads `code`, `error` and `error_description` from the redirect query.
/// An `error` always wins over a `code`; an empty `code` counts as absent.
pub fn parse_callback(raw_url: &str) -> Result<CallbackParams, MalformedCallback> {
    let url = Url::parse(raw_url.trim()).map_err(|error| MalformedCallback(error.to_string()))?;

    let mut code = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if code.is_none() => code = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            "error_description" if description.is_none() => {
                description = Some(value.into_owned())
            }
            _ => {}
        }
    }

    match (error, code) {
        (None, Some(code)) if !code.trim().is_empty() => Ok(CallbackParams::Code(code)),
        (error, _) => Ok(CallbackParams::Denied { error, description }),
    }
}
