//! Health and shutdown handlers.

use coordinator_ipc::{Action, IpcServer, Response};
use tracing::info;

/// Register health and shutdown handlers.
pub async fn register(server: &IpcServer) {
    // Health check
    server
        .register_handler(Action::Health, |req| async move {
            Response::success(
                &req.id,
                serde_json::json!({
                    "status": "ok",
                    "version": env!("CARGO_PKG_VERSION"),
                }),
            )
        })
        .await;

    // Shutdown
    let shutdown_tx = server.shutdown_sender();
    server
        .register_handler(Action::Shutdown, move |req| {
            let tx = shutdown_tx.clone();
            async move {
                let _ = tx.send(());
                Response::success(&req.id, serde_json::json!({ "status": "shutting_down" }))
            }
        })
        .await;

    info!("Registered health handlers");
}
