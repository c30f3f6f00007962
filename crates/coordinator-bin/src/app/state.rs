//! Coordinator state definition.

use coordinator_auth::AuthCoordinator;
use coordinator_config_and_utils::{Config, Paths};
use coordinator_ipc::Notifier;
use std::sync::Arc;

/// Shared coordinator state (thread-safe).
#[derive(Clone)]
pub struct CoordinatorState {
    pub config: Arc<Config>,
    #[allow(dead_code)]
    pub paths: Arc<Paths>,
    /// The auth coordinator; exclusive owner of the session store.
    pub coordinator: Arc<AuthCoordinator>,
    /// Broadcast notifier for status-change events.
    pub notifier: Notifier,
}
