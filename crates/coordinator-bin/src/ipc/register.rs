//! Handler registration for the IPC server.

use crate::app::CoordinatorState;
use crate::ipc::handlers;
use coordinator_ipc::IpcServer;
use tracing::info;

/// Register all IPC handlers.
pub async fn register_handlers(server: &IpcServer, state: CoordinatorState) {
    handlers::health::register(server).await;
    handlers::auth::register(server, state.clone()).await;
    handlers::ui::register(server, state.clone()).await;
    handlers::settings::register(server, state).await;

    info!("All IPC handlers registered");
}
