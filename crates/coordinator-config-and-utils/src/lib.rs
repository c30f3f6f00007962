//! Shared configuration, paths, and logging for the Worklens coordinator.
//!
//! Every other crate in the workspace pulls its runtime environment from
//! here: where files live, how logging is initialized, and which remote
//! endpoints and origins the coordinator trusts.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_TRUSTED_WEB_ORIGIN,
    DEFAULT_WEB_APP_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
