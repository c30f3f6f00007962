//! Authentication handlers.

use crate::app::CoordinatorState;
use coordinator_auth::AuthError;
use coordinator_ipc::{error_codes, Action, IpcServer, Response};
use tracing::warn;

/// Map a flow error onto its wire code.
fn auth_error_code(error: &AuthError) -> i32 {
    match error {
        AuthError::Provider(_) => error_codes::PROVIDER_ERROR,
        AuthError::Exchange(_) => error_codes::EXCHANGE_ERROR,
        AuthError::InvalidHandoffToken => error_codes::INVALID_HANDOFF_TOKEN,
        AuthError::ValidatorUnavailable => error_codes::VALIDATOR_UNAVAILABLE,
        AuthError::Storage(_) => error_codes::STORAGE_ERROR,
        _ => error_codes::INTERNAL_ERROR,
    }
}

/// Register all authentication handlers.
pub async fn register(server: &IpcServer, state: CoordinatorState) {
    // Native identity-provider flow
    {
        let state = state.clone();
        server
            .register_handler(Action::InitiateGoogleAuth, move |req| {
                let coordinator = state.coordinator.clone();
                async move {
                    match coordinator.sign_in_with_google(true).await {
                        Ok(()) => {
                            Response::success(&req.id, serde_json::json!({ "success": true }))
                        }
                        Err(error) => {
                            Response::error(&req.id, auth_error_code(&error), &error.to_string())
                        }
                    }
                }
            })
            .await;
    }

    // Status query; views fall back to a signed-out presentation on any
    // failure rather than seeing raw error kinds.
    {
        let state = state.clone();
        server
            .register_handler(Action::CheckAuthStatus, move |req| {
                let coordinator = state.coordinator.clone();
                async move {
                    let authenticated = match coordinator.check_status().await {
                        Ok(authenticated) => authenticated,
                        Err(error) => {
                            warn!(error = %error, "Status check failed");
                            false
                        }
                    };
                    let snapshot = coordinator.status_snapshot().ok();
                    let profile = if authenticated {
                        snapshot.as_ref().and_then(|s| s.profile.clone())
                    } else {
                        None
                    };
                    Response::success(
                        &req.id,
                        serde_json::json!({
                            "isAuthenticated": authenticated,
                            "state": snapshot.map(|s| s.state),
                            "profile": profile,
                        }),
                    )
                }
            })
            .await;
    }

    // Token relayed from the companion web app by the extension's own
    // content script; already inside the trust boundary.
    {
        let state = state.clone();
        server
            .register_handler(Action::LogWebAuth, move |req| {
                let coordinator = state.coordinator.clone();
                async move {
                    let token = req
                        .params
                        .as_ref()
                        .and_then(|p| p.get("token"))
                        .and_then(|v| v.as_str())
                        .map(String::from);

                    let Some(token) = token.filter(|t| !t.is_empty()) else {
                        return Response::error(
                            &req.id,
                            error_codes::MALFORMED_MESSAGE,
                            "token is required",
                        );
                    };

                    match coordinator.handoff(&token).await {
                        Ok(()) => {
                            Response::success(&req.id, serde_json::json!({ "success": true }))
                        }
                        Err(error) => {
                            Response::error(&req.id, auth_error_code(&error), &error.to_string())
                        }
                    }
                }
            })
            .await;
    }

    // Logout
    {
        let state = state.clone();
        server
            .register_handler(Action::Logout, move |req| {
                let coordinator = state.coordinator.clone();
                async move {
                    match coordinator.logout().await {
                        Ok(()) => {
                            Response::success(&req.id, serde_json::json!({ "success": true }))
                        }
                        Err(error) => {
                            Response::error(&req.id, auth_error_code(&error), &error.to_string())
                        }
                    }
                }
            })
            .await;
    }
}
