//! Backend session endpoints: token exchange and revocation.

use crate::provider::ProviderProfile;
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Session grant issued by the backend after a successful exchange.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeGrant {
    /// Backend-issued session token
    pub token: String,
    /// Whether the account has an uploaded resume
    #[serde(default)]
    pub has_resume: bool,
}

/// Backend endpoints consumed by the sign-in flows.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange a provider token plus profile for a backend session token.
    async fn exchange_google(
        &self,
        provider_token: &str,
        profile: &ProviderProfile,
    ) -> AuthResult<ExchangeGrant>;

    /// Revoke a session token. Best-effort; callers log and move on.
    async fn revoke(&self, token: &str) -> AuthResult<()>;
}

/// Gateway backed by the Worklens API.
pub struct HttpAuthGateway {
    api_base_url: String,
    http_client: Client,
}

impl HttpAuthGateway {
    /// Create a new gateway against the given API base URL.
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn exchange_google(
        &self,
        provider_token: &str,
        profile: &ProviderProfile,
    ) -> AuthResult<ExchangeGrant> {
        let exchange_url = format!("{}/auth/google", self.api_base_url);

        debug!(url = %exchange_url, email = %profile.email, "Exchanging provider token");

        let response = self
            .http_client
            .post(&exchange_url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "token": provider_token,
                "email": profile.email,
                "name": profile.name,
                "picture": profile.picture,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Token exchange failed");
            return Err(AuthError::Exchange(format!("HTTP {}: {}", status, body)));
        }

        let grant: ExchangeGrant = response.json().await?;

        if grant.token.is_empty() {
            return Err(AuthError::Exchange(
                "Backend issued an empty session token".to_string(),
            ));
        }

        debug!("Token exchange succeeded");
        Ok(grant)
    }

    async fn revoke(&self, token: &str) -> AuthResult<()> {
        let logout_url = format!("{}/auth/logout", self.api_base_url);

        debug!(url = %logout_url, "Revoking session token");

        let response = self
            .http_client
            .post(&logout_url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuthError::Backend(format!(
                "Revoke rejected: HTTP {}",
                status
            )));
        }

        Ok(())
    }
}
