//! Coordinator startup: build the components, wire the broadcast path,
//! revalidate any restored session, and serve.

use crate::app::{lifecycle, CoordinatorState};
use crate::external;
use crate::ipc::register_handlers;
use coordinator_auth::{
    AuthCoordinator, GoogleIdentityBroker, HttpAuthGateway, HttpTokenValidator, TrustFilter,
};
use coordinator_config_and_utils::{Config, Paths};
use coordinator_ipc::{Event, EventKind, IpcServer};
use std::sync::Arc;
use tracing::{info, warn};

/// Run the coordinator until shutdown.
pub async fn run_coordinator(
    config: Config,
    paths: Paths,
) -> Result<(), Box<dyn std::error::Error>> {
    paths.ensure_dirs()?;
    lifecycle::write_pid_file(&paths)?;

    // Persistent session store; the coordinator is its only writer.
    let store = coordinator_storage::create_session_store(&paths)?;

    let coordinator = Arc::new(AuthCoordinator::new(
        store,
        Arc::new(HttpTokenValidator::new(&config.api_base_url)),
        Arc::new(GoogleIdentityBroker::with_defaults(&config.web_app_url)),
        Arc::new(HttpAuthGateway::new(&config.api_base_url)),
        TrustFilter::new(&config.trusted_web_origin),
    ));

    let server = IpcServer::new(
        paths
            .socket_file()
            .to_str()
            .ok_or("Socket path is not valid UTF-8")?,
    );

    // Wire the broadcast notifier: every store mutation fans out an
    // authStatusChanged event after the write has landed.
    let notifier = server.notifier().clone();
    {
        let notifier = notifier.clone();
        coordinator.set_status_callback(Box::new(move |payload| {
            match serde_json::to_value(&payload) {
                Ok(data) => notifier.notify(Event::new(EventKind::AuthStatusChanged, data)),
                Err(e) => warn!(error = %e, "Failed to encode status payload"),
            }
        }));
    }

    let state = CoordinatorState {
        config: Arc::new(config),
        paths: Arc::new(paths.clone()),
        coordinator: coordinator.clone(),
        notifier,
    };

    register_handlers(&server, state).await;

    // Initialize state from the store, then confirm the token with the
    // remote authority. An unreachable authority keeps the session.
    match coordinator.validate_session_on_startup().await {
        Ok(true) => info!("Startup session check: signed in"),
        Ok(false) => info!("Startup session check: signed out"),
        Err(e) => warn!(error = %e, "Startup session check failed"),
    }

    // External ingress for messages from the companion web origin.
    let external_socket = paths
        .external_socket_file()
        .to_str()
        .ok_or("External socket path is not valid UTF-8")?
        .to_string();
    let external_task = tokio::spawn(external::run_external_ingress(
        external_socket,
        coordinator.clone(),
        server.shutdown_receiver(),
    ));

    let result = server.run().await;

    external_task.abort();
    lifecycle::remove_pid_file(&paths);

    result?;
    Ok(())
}
