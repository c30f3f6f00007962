//! Authentication state machine using rust-fsm.
//!
//! This module defines an explicit finite state machine for the sign-in
//! state, replacing implicit state derivation from storage checks.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐  SessionRestored   ┌─────────────────┐
//! │ Unauthenticated │ ─────────────────► │  Authenticated  │
//! └────────┬────────┘                    └────────┬────────┘
//!          │ FlowStarted                          │ FlowStarted
//!          ▼                                      ▼
//! ┌─────────────────┐  FlowSucceeded     ┌─────────────────┐
//! │  Authenticating │ ─────────────────► │  Authenticated  │
//! └────────┬────────┘                    └────────┬────────┘
//!          │ FlowFailed                           │ TokenRejected /
//!          │ (FlowFailedSessionKept keeps         │ LogoutRequested
//!          │  Authenticated when a persisted      ▼
//!          ▼  session survived)              Unauthenticated
//!     Unauthenticated
//! ```
//!
//! Racing flows are legal: a second `FlowStarted` while already
//! `Authenticating` is a self-transition, and a late completion lands on the
//! absorbing `Authenticated` arms. Completions apply in completion order.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Define the FSM using rust-fsm's declarative macro
// This generates a module `status_machine` with:
// - status_machine::State (enum)
// - status_machine::Input (enum)
// - status_machine::StateMachine (type alias)
// - status_machine::Impl (trait impl)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub status_machine(Unauthenticated)

    Unauthenticated => {
        FlowStarted => Authenticating,
        SessionRestored => Authenticated,
        // A racing flow may fail after another already failed
        FlowFailed => Unauthenticated
    },
    Authenticating => {
        // A second concurrent flow is a new independent flow
        FlowStarted => Authenticating,
        FlowSucceeded => Authenticated,
        FlowFailed => Unauthenticated,
        // Failure while a persisted session survived (re-auth attempt)
        FlowFailedSessionKept => Authenticated
    },
    Authenticated => {
        FlowStarted => Authenticating,
        // Late completion of a racing flow; session replaced wholesale
        FlowSucceeded => Authenticated,
        FlowFailedSessionKept => Authenticated,
        TokenRejected => Unauthenticated,
        LogoutRequested => Unauthenticated
    }
}

// Re-export the generated types with clearer names
pub use status_machine::Input as StatusMachineInput;
pub use status_machine::State as StatusMachineState;
pub use status_machine::StateMachine as StatusMachine;

/// Simplified authentication state for IPC and view consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No session.
    Unauthenticated,
    /// A sign-in flow is in flight.
    Authenticating,
    /// A persisted session exists.
    Authenticated,
}

impl AuthState {
    /// Returns true if a session exists (Authenticated state only).
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    /// Returns true if a sign-in flow is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, AuthState::Authenticating)
    }
}

impl From<&StatusMachineState> for AuthState {
    fn from(state: &StatusMachineState) -> Self {
        match state {
            StatusMachineState::Unauthenticated => AuthState::Unauthenticated,
            StatusMachineState::Authenticating => AuthState::Authenticating,
            StatusMachineState::Authenticated => AuthState::Authenticated,
        }
    }
}

/// Payload for auth status change broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatusChangedPayload {
    /// Whether a persisted session exists after the change.
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    /// Current auth state.
    pub state: AuthState,
    /// Signed-in email if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
