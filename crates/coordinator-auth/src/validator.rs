//! Remote token validation.
//!
//! The coordinator never verifies tokens locally; a token is only as good as
//! the authority's answer. Being unable to reach the authority is a distinct
//! outcome from a rejection and must never clear a session.

use crate::AuthResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Profile payload the authority returns alongside a valid token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedSession {
    /// Account email
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    #[serde(default)]
    pub picture: String,
    /// Whether the account has an uploaded resume
    #[serde(default)]
    pub has_resume: bool,
}

/// Outcome of asking the remote authority about a token.
#[derive(Debug, Clone)]
pub enum TokenValidity {
    /// Definitive yes, with the account payload.
    Valid(ValidatedSession),
    /// Definitive no.
    Invalid,
    /// The authority could not be reached. Not a rejection.
    Unreachable,
}

/// Asks the remote authority whether a token is still good.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> AuthResult<TokenValidity>;
}

/// Validator backed by `GET {api}/auth/validate`.
pub struct HttpTokenValidator {
    api_base_url: String,
    http_client: Client,
}

impl HttpTokenValidator {
    /// Create a new validator against the given API base URL.
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl TokenValidator for HttpTokenValidator {
    async fn validate(&self, token: &str) -> AuthResult<TokenValidity> {
        let validate_url = format!("{}/auth/validate", self.api_base_url);

        debug!(url = %validate_url, "Validating token with authority");

        let response = match self
            .http_client
            .get(&validate_url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                warn!(error = %e, "Token authority unreachable");
                return Ok(TokenValidity::Unreachable);
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();

        if status.is_server_error() {
            // The authority answered but is not functioning; that is not a
            // verdict on the token.
            warn!(status = %status, "Token authority returned server error");
            return Ok(TokenValidity::Unreachable);
        }

        if !status.is_success() {
            debug!(status = %status, "Token rejected by authority");
            return Ok(TokenValidity::Invalid);
        }

        let payload: ValidatedSession = response.json().await?;
        debug!(email = %payload.email, "Token validated");

        Ok(TokenValidity::Valid(payload))
    }
}
