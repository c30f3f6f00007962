//! Sign-in flow drivers.
//!
//! Each driver produces a candidate [`Session`] or a typed error and has no
//! side effects of its own; only the coordinator persists results. A failed
//! flow therefore leaves whatever session already exists untouched.

use crate::gateway::AuthGateway;
use crate::provider::IdentityBroker;
use crate::validator::{TokenValidator, TokenValidity};
use crate::{AuthError, AuthResult};
use coordinator_storage::{Session, UserProfile};
use tracing::debug;

/// Which driver produced (or is producing) a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Native identity-provider flow.
    Native,
    /// Token handed off by a trusted web origin.
    ExternalHandoff,
}

/// Run the native identity-provider flow.
///
/// Steps: provider token, provider profile, backend exchange, assemble.
pub async fn run_native_flow(
    broker: &dyn IdentityBroker,
    gateway: &dyn AuthGateway,
    interactive: bool,
) -> AuthResult<Session> {
    let provider_token = broker.acquire_token(interactive).await?;
    debug!("Provider token acquired");

    let profile = broker.fetch_profile(&provider_token).await?;
    debug!(email = %profile.email, "Provider profile fetched");

    let grant = gateway.exchange_google(&provider_token, &profile).await?;

    Ok(Session {
        token: grant.token,
        profile: UserProfile {
            email: profile.email,
            name: profile.name,
            picture: profile.picture,
            has_resume: grant.has_resume,
        },
    })
}

/// Run the external handoff flow for a token that already passed the trust
/// filter.
///
/// Only the validator's answer establishes the session; the message's
/// self-reported fields are never trusted for authorization.
pub async fn run_handoff_flow(
    validator: &dyn TokenValidator,
    token: &str,
) -> AuthResult<Session> {
    match validator.validate(token).await? {
        TokenValidity::Valid(payload) => Ok(Session {
            token: token.to_string(),
            profile: UserProfile {
                email: payload.email,
                name: payload.name,
                picture: payload.picture,
                has_resume: payload.has_resume,
            },
        }),
        TokenValidity::Invalid => Err(AuthError::InvalidHandoffToken),
        TokenValidity::Unreachable => Err(AuthError::ValidatorUnavailable),
    }
}
