//! The auth coordinator: single owner of sign-in state.
//!
//! The coordinator is the exclusive writer of the session store. Both flow
//! drivers hand their candidate sessions here; commits are serialized and
//! applied strictly in completion order (last writer wins, never a field
//! merge), and every store mutation broadcasts only after the write has
//! landed, so any context that re-reads in response to a broadcast sees the
//! new state.

use crate::flows::{run_handoff_flow, run_native_flow, FlowKind};
use crate::gateway::AuthGateway;
use crate::machine::{
    AuthState, AuthStatusChangedPayload, StatusMachine, StatusMachineInput,
};
use crate::provider::IdentityBroker;
use crate::trust::{ExternalMessage, TrustFilter};
use crate::validator::{TokenValidator, TokenValidity};
use crate::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use coordinator_storage::{Session, SessionStore, UserProfile};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Callback type for auth status change broadcasts.
pub type StatusCallback = Box<dyn Fn(AuthStatusChangedPayload) + Send + Sync>;

/// An in-flight flow. In-memory only; dropped when the flow settles.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Correlation id for logs.
    pub id: Uuid,
    /// Which driver is running.
    pub kind: FlowKind,
    /// Whether a session existed when the flow started.
    pub started_authenticated: bool,
    /// When the flow started.
    pub started_at: DateTime<Utc>,
}

/// Snapshot of authentication state for IPC/status reporting.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub authenticated: bool,
    pub state: AuthState,
    pub profile: Option<UserProfile>,
}

/// Owns the session store, the state machine, and both flow drivers.
pub struct AuthCoordinator {
    store: SessionStore,
    validator: Arc<dyn TokenValidator>,
    broker: Arc<dyn IdentityBroker>,
    gateway: Arc<dyn AuthGateway>,
    trust: TrustFilter,
    /// Internal FSM for tracking sign-in state transitions.
    fsm: Mutex<StatusMachine>,
    /// Flows currently in flight.
    pending: Mutex<Vec<PendingRequest>>,
    /// Optional callback for status change broadcasts.
    status_callback: Mutex<Option<StatusCallback>>,
    /// Serializes persist+broadcast sections so completions land in order.
    commit_lock: Mutex<()>,
}

impl AuthCoordinator {
    /// Create a new coordinator.
    pub fn new(
        store: SessionStore,
        validator: Arc<dyn TokenValidator>,
        broker: Arc<dyn IdentityBroker>,
        gateway: Arc<dyn AuthGateway>,
        trust: TrustFilter,
    ) -> Self {
        Self {
            store,
            validator,
            broker,
            gateway,
            trust,
            fsm: Mutex::new(StatusMachine::new()),
            pending: Mutex::new(Vec::new()),
            status_callback: Mutex::new(None),
            commit_lock: Mutex::new(()),
        }
    }

    /// Set a callback to be notified of status changes.
    ///
    /// This is how the broadcast notifier gets wired in.
    pub fn set_status_callback(&self, callback: StatusCallback) {
        let mut cb = self.status_callback.lock().unwrap();
        *cb = Some(callback);
    }

    /// Get the current auth state.
    pub fn state(&self) -> AuthState {
        let fsm = self.fsm.lock().unwrap();
        AuthState::from(fsm.state())
    }

    /// Read the persisted session.
    pub fn current_session(&self) -> AuthResult<Option<Session>> {
        Ok(self.store.read()?)
    }

    /// Current status snapshot for IPC handlers.
    pub fn status_snapshot(&self) -> AuthResult<AuthSnapshot> {
        let session = self.store.read()?;
        Ok(AuthSnapshot {
            authenticated: session.is_some(),
            state: self.state(),
            profile: session.map(|s| s.profile),
        })
    }

    /// Initialize state from the persistent store, once at process start.
    ///
    /// Returns true if a persisted session was restored. No other component
    /// holds a cached copy; views re-query through `check_status`.
    pub fn initialize(&self) -> AuthResult<bool> {
        match self.store.read()? {
            Some(session) => {
                info!(email = %session.profile.email, "Restored persisted session");
                self.transition(&StatusMachineInput::SessionRestored)?;
                Ok(true)
            }
            None => {
                debug!("No persisted session found");
                Ok(false)
            }
        }
    }

    /// Validate a restored session against the remote authority on startup.
    ///
    /// Returns:
    /// - `Ok(true)` if a session exists and was not rejected
    /// - `Ok(false)` if no session exists, or the authority rejected it
    ///
    /// An unreachable authority keeps the session (never downgrade on
    /// network failure).
    pub async fn validate_session_on_startup(&self) -> AuthResult<bool> {
        if !self.initialize()? {
            info!("No existing session found on startup");
            return Ok(false);
        }
        self.check_status().await
    }

    /// Run the native identity-provider flow and commit the result.
    pub async fn sign_in_with_google(&self, interactive: bool) -> AuthResult<()> {
        let request = self.begin_flow(FlowKind::Native)?;
        let result = run_native_flow(self.broker.as_ref(), self.gateway.as_ref(), interactive).await;
        self.settle_flow(request, result)
    }

    /// Handle a message from outside the trust boundary.
    ///
    /// Returns `None` when the trust filter drops the message: no state
    /// change, no broadcast, and the sender gets no response. A message that
    /// passes the filter runs the handoff flow and returns its outcome.
    pub async fn handle_external(
        &self,
        message: &ExternalMessage,
        sender_origin: &str,
    ) -> Option<AuthResult<()>> {
        if !self.trust.accept(message, sender_origin) {
            return None;
        }
        Some(self.handoff(&message.token).await)
    }

    /// Run the external handoff flow for a token already inside the trust
    /// boundary (relayed over the internal message channel).
    pub async fn handoff(&self, token: &str) -> AuthResult<()> {
        let request = self.begin_flow(FlowKind::ExternalHandoff)?;
        let result = run_handoff_flow(self.validator.as_ref(), token).await;
        self.settle_flow(request, result)
    }

    /// Answer a status query, re-validating any persisted token.
    ///
    /// `Invalid` clears the store and broadcasts; `Unreachable` leaves the
    /// session untouched and reports the locally persisted state.
    pub async fn check_status(&self) -> AuthResult<bool> {
        let session = match self.store.read()? {
            Some(session) => session,
            None => return Ok(false),
        };

        match self.validator.validate(&session.token).await? {
            TokenValidity::Valid(_) => Ok(true),
            TokenValidity::Invalid => {
                info!("Persisted token rejected by authority, clearing session");
                self.commit_clear(&StatusMachineInput::TokenRejected)?;
                Ok(false)
            }
            TokenValidity::Unreachable => {
                warn!("Token authority unreachable, keeping persisted session");
                Ok(true)
            }
        }
    }

    /// Log out: best-effort remote revoke, then unconditional local clear.
    pub async fn logout(&self) -> AuthResult<()> {
        if let Some(session) = self.store.read()? {
            if let Err(e) = self.gateway.revoke(&session.token).await {
                warn!(error = %e, "Token revoke failed, continuing with local logout");
            }
        }

        self.commit_clear(&StatusMachineInput::LogoutRequested)?;
        info!("Logged out");
        Ok(())
    }

    // ==========================================
    // Flow lifecycle
    // ==========================================

    fn begin_flow(&self, kind: FlowKind) -> AuthResult<PendingRequest> {
        let request = PendingRequest {
            id: Uuid::new_v4(),
            kind,
            started_authenticated: self.store.read()?.is_some(),
            started_at: Utc::now(),
        };

        self.transition(&StatusMachineInput::FlowStarted)?;

        let mut pending = self.pending.lock().unwrap();
        pending.push(request.clone());
        debug!(
            flow_id = %request.id,
            kind = ?request.kind,
            in_flight = pending.len(),
            "Flow started"
        );

        Ok(request)
    }

    fn settle_flow(&self, request: PendingRequest, result: AuthResult<Session>) -> AuthResult<()> {
        let outcome = match result {
            Ok(session) => {
                self.commit_session(&session)?;
                info!(flow_id = %request.id, kind = ?request.kind, "Flow succeeded");
                Ok(())
            }
            Err(e) => {
                self.abandon_flow(&request, &e);
                Err(e)
            }
        };

        let mut pending = self.pending.lock().unwrap();
        pending.retain(|p| p.id != request.id);

        outcome
    }

    /// Record a failed flow. Commits nothing and broadcasts nothing; the
    /// FSM lands wherever the surviving store contents say it should.
    fn abandon_flow(&self, request: &PendingRequest, error: &AuthError) {
        let _guard = self.commit_lock.lock().unwrap();

        let session_kept = self.store.read().ok().flatten().is_some();
        let input = if session_kept {
            StatusMachineInput::FlowFailedSessionKept
        } else {
            StatusMachineInput::FlowFailed
        };
        self.transition_tolerant(&input);

        warn!(
            flow_id = %request.id,
            kind = ?request.kind,
            error = %error,
            session_kept,
            "Flow failed"
        );
    }

    // ==========================================
    // Commits
    // ==========================================

    /// Persist a session and broadcast. The store write strictly precedes
    /// the broadcast.
    fn commit_session(&self, session: &Session) -> AuthResult<()> {
        let _guard = self.commit_lock.lock().unwrap();

        self.store.write(session)?;
        self.transition_tolerant(&StatusMachineInput::FlowSucceeded);
        self.notify_status_changed();
        Ok(())
    }

    /// Clear the store and broadcast.
    fn commit_clear(&self, input: &StatusMachineInput) -> AuthResult<()> {
        let _guard = self.commit_lock.lock().unwrap();

        self.store.clear()?;
        self.transition_tolerant(input);
        self.notify_status_changed();
        Ok(())
    }

    // ==========================================
    // FSM plumbing
    // ==========================================

    /// Transition the FSM, failing on an illegal input.
    fn transition(&self, input: &StatusMachineInput) -> AuthResult<AuthState> {
        let mut fsm = self.fsm.lock().unwrap();
        let old_state = AuthState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = AuthState::from(fsm.state());
        if old_state != new_state {
            debug!(?old_state, ?new_state, "Auth state transition");
        }

        Ok(new_state)
    }

    /// Transition where racing completions make some inputs arrive late;
    /// an illegal input is logged and ignored.
    fn transition_tolerant(&self, input: &StatusMachineInput) {
        if let Err(e) = self.transition(input) {
            debug!(error = %e, "Ignoring out-of-order FSM input");
        }
    }

    /// Invoke the status callback with the post-commit state.
    ///
    /// Called only after the store mutation has landed.
    fn notify_status_changed(&self) {
        let cb = self.status_callback.lock().unwrap();
        if let Some(callback) = cb.as_ref() {
            let session = self.store.read().ok().flatten();
            callback(AuthStatusChangedPayload {
                is_authenticated: session.is_some(),
                state: self.state(),
                email: session.map(|s| s.profile.email),
            });
        }
    }
}
