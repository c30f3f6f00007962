//! File system paths for the coordinator.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// IPC socket filename under the base runtime directory.
const SOCKET_NAME: &str = "coordinator.sock";
/// External (web origin) ingress socket filename.
const EXTERNAL_SOCKET_NAME: &str = "external.sock";
/// PID filename under the base runtime directory.
const PID_NAME: &str = "coordinator.pid";

/// Manages file system paths for the coordinator.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for coordinator runtime files (~/.worklens)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.worklens`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".worklens"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.worklens).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.worklens/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the persisted session store path (~/.worklens/session-store.json).
    pub fn session_store_file(&self) -> PathBuf {
        self.base_dir.join("session-store.json")
    }

    /// Get the IPC socket path (~/.worklens/coordinator.sock).
    pub fn socket_file(&self) -> PathBuf {
        self.base_dir.join(SOCKET_NAME)
    }

    /// Get the external ingress socket path (~/.worklens/external.sock).
    pub fn external_socket_file(&self) -> PathBuf {
        self.base_dir.join(EXTERNAL_SOCKET_NAME)
    }

    /// Get the PID file path (~/.worklens/coordinator.pid).
    pub fn pid_file(&self) -> PathBuf {
        self.base_dir.join(PID_NAME)
    }

    /// Get the logs directory (~/.worklens/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new().expect("Failed to determine home directory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let base = PathBuf::from("/tmp/test-worklens");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), &base);
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.session_store_file(), base.join("session-store.json"));
        assert_eq!(paths.socket_file(), base.join("coordinator.sock"));
        assert_eq!(paths.external_socket_file(), base.join("external.sock"));
        assert_eq!(paths.pid_file(), base.join("coordinator.pid"));
        assert_eq!(paths.logs_dir(), base.join("logs"));
    }

    #[test]
    fn test_paths_default() {
        let paths = Paths::new().unwrap();
        let home = dirs::home_dir().unwrap();

        assert_eq!(paths.base_dir(), &home.join(".worklens"));
    }

    #[test]
    fn test_ensure_dirs_creates_directories() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("worklens");
        let paths = Paths::with_base_dir(base.clone());

        assert!(!base.exists());
        assert!(!paths.logs_dir().exists());

        paths.ensure_dirs().unwrap();

        assert!(base.is_dir());
        assert!(paths.logs_dir().is_dir());
    }

    #[test]
    fn test_ensure_dirs_idempotent() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();

        assert!(paths.base_dir().exists());
        assert!(paths.logs_dir().exists());
    }
}
