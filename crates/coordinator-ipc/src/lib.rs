//! IPC layer for the Worklens coordinator.
//!
//! View contexts (popup, options) talk to the background coordinator over a
//! Unix domain socket with newline-delimited JSON, one response per request,
//! and receive status-change events pushed on the same connection.

mod error;
mod protocol;
mod server;

pub use error::{IpcError, IpcResult};
pub use protocol::{error_codes, Action, ErrorInfo, Event, EventKind, Request, Response};
pub use server::{HandlerFn, IpcClient, IpcServer, Notifier};
