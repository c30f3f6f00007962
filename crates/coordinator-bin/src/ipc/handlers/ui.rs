//! View navigation handlers.
//!
//! The coordinator resolves target URLs; the requesting context does the
//! actual window or tab opening.

use crate::app::CoordinatorState;
use coordinator_ipc::{Action, IpcServer, Response};

/// Register view navigation handlers.
pub async fn register(server: &IpcServer, state: CoordinatorState) {
    {
        let state = state.clone();
        server
            .register_handler(Action::OpenLogin, move |req| {
                let web_app_url = state.config.web_app_url.clone();
                async move {
                    Response::success(
                        &req.id,
                        serde_json::json!({
                            "success": true,
                            "url": format!("{}/login", web_app_url.trim_end_matches('/')),
                        }),
                    )
                }
            })
            .await;
    }

    {
        let state = state.clone();
        server
            .register_handler(Action::OpenOptions, move |req| {
                let web_app_url = state.config.web_app_url.clone();
                async move {
                    Response::success(
                        &req.id,
                        serde_json::json!({
                            "success": true,
                            "url": format!("{}/settings", web_app_url.trim_end_matches('/')),
                        }),
                    )
                }
            })
            .await;
    }
}
