//! Settings relay handler.
//!
//! Settings semantics live in the options view; the coordinator only relays
//! the change notification to the other contexts.

use crate::app::CoordinatorState;
use coordinator_ipc::{error_codes, Action, Event, EventKind, IpcServer, Response};

/// Register the settings relay handler.
pub async fn register(server: &IpcServer, state: CoordinatorState) {
    server
        .register_handler(Action::SettingsUpdated, move |req| {
            let notifier = state.notifier.clone();
            async move {
                let settings = req.params.as_ref().and_then(|p| p.get("settings")).cloned();

                let Some(settings) = settings else {
                    return Response::error(
                        &req.id,
                        error_codes::MALFORMED_MESSAGE,
                        "settings is required",
                    );
                };

                notifier.notify(Event::new(
                    EventKind::SettingsUpdated,
                    serde_json::json!({ "settings": settings }),
                ));

                Response::success(&req.id, serde_json::json!({ "success": true }))
            }
        })
        .await;
}
