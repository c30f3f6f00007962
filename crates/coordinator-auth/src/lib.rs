//! Authentication coordination for the Worklens extension coordinator.
//!
//! This crate provides:
//! - Explicit FSM-based sign-in state management
//! - The two sign-in flow drivers (native identity provider, external
//!   handoff from a trusted web origin)
//! - Remote token validation with an unreachable/invalid distinction
//! - The origin trust filter for externally-sourced messages
//! - The `AuthCoordinator`, sole owner and writer of the persisted session

mod coordinator;
mod error;
mod flows;
mod gateway;
mod machine;
mod provider;
mod trust;
mod validator;

pub use coordinator::{AuthCoordinator, AuthSnapshot, PendingRequest, StatusCallback};
pub use error::{AuthError, AuthResult};
pub use flows::{run_handoff_flow, run_native_flow, FlowKind};
pub use gateway::{AuthGateway, ExchangeGrant, HttpAuthGateway};
pub use machine::status_machine;
pub use machine::{
    AuthState, AuthStatusChangedPayload, StatusMachine, StatusMachineInput, StatusMachineState,
};
pub use provider::{
    GoogleIdentityBroker, IdentityBroker, ProviderProfile, DEFAULT_CALLBACK_PORT,
    DEFAULT_CALLBACK_TIMEOUT_SECS,
};
pub use trust::{ExternalMessage, TrustFilter, EXTERNAL_HANDOFF_ACTION};
pub use validator::{HttpTokenValidator, TokenValidity, TokenValidator, ValidatedSession};
