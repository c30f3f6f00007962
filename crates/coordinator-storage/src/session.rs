//! High-level API for the persisted authentication session.

use crate::{StorageArea, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Profile of the signed-in user, as persisted and as sent to views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Account email
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    pub picture: String,
    /// Whether the account has an uploaded resume
    pub has_resume: bool,
}

/// The persisted authentication session.
///
/// A session is only ever written whole: token and profile together, or
/// nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Backend-issued session token
    pub token: String,
    /// Profile of the signed-in user
    pub profile: UserProfile,
}

/// High-level store for the authentication session.
///
/// The auth coordinator is the exclusive writer; every other context is a
/// read-only observer that re-queries through the coordinator.
pub struct SessionStore {
    storage: Box<dyn StorageArea>,
}

impl SessionStore {
    /// Create a new session store with the given storage backend.
    pub fn new(storage: Box<dyn StorageArea>) -> Self {
        Self { storage }
    }

    /// Read the current session.
    ///
    /// Returns `None` for the empty state and for any inconsistent record
    /// (flag without token, token without profile); a partial record is
    /// logged and treated as empty rather than surfaced to callers.
    pub fn read(&self) -> StorageResult<Option<Session>> {
        let flag = self
            .storage
            .get(StorageKeys::IS_AUTHENTICATED)?
            .map(|v| v == "true")
            .unwrap_or(false);
        let token = self.storage.get(StorageKeys::AUTH_TOKEN)?;
        let profile_json = self.storage.get(StorageKeys::USER_PROFILE)?;

        let (token, profile_json) = match (flag, token, profile_json) {
            (true, Some(token), Some(profile)) if !token.is_empty() => (token, profile),
            (false, None, None) => return Ok(None),
            _ => {
                warn!("Session record is partially populated, treating as empty");
                return Ok(None);
            }
        };

        let profile: UserProfile = match serde_json::from_str(&profile_json) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Stored user profile is unreadable, treating as empty");
                return Ok(None);
            }
        };

        Ok(Some(Session { token, profile }))
    }

    /// Write a session, replacing any previous one wholesale.
    pub fn write(&self, session: &Session) -> StorageResult<()> {
        let profile_json = serde_json::to_string(&session.profile)
            .map_err(|e| crate::StorageError::Encoding(e.to_string()))?;

        self.storage.set(&[
            (StorageKeys::IS_AUTHENTICATED.to_string(), "true".to_string()),
            (StorageKeys::AUTH_TOKEN.to_string(), session.token.clone()),
            (StorageKeys::USER_PROFILE.to_string(), profile_json),
        ])
    }

    /// Clear the session. The empty state is valid; clearing twice is fine.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.remove(&[
            StorageKeys::IS_AUTHENTICATED,
            StorageKeys::AUTH_TOKEN,
            StorageKeys::USER_PROFILE,
        ])
    }

    /// Check whether a session exists.
    pub fn is_authenticated(&self) -> StorageResult<bool> {
        Ok(self.read()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn test_profile() -> UserProfile {
        UserProfile {
            email: "a@b.com".to_string(),
            name: "A".to_string(),
            picture: "https://img.example/a.png".to_string(),
            has_resume: true,
        }
    }

    fn test_store() -> SessionStore {
        SessionStore::new(Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_read_empty_store() {
        let store = test_store();
        assert!(store.read().unwrap().is_none());
        assert!(!store.is_authenticated().unwrap());
    }

    #[test]
    fn test_write_then_read() {
        let store = test_store();
        let session = Session {
            token: "jwt1".to_string(),
            profile: test_profile(),
        };

        store.write(&session).unwrap();

        let read = store.read().unwrap().unwrap();
        assert_eq!(read.token, "jwt1");
        assert_eq!(read.profile.email, "a@b.com");
        assert!(read.profile.has_resume);
        assert!(store.is_authenticated().unwrap());
    }

    #[test]
    fn test_write_replaces_wholesale() {
        let store = test_store();

        store
            .write(&Session {
                token: "first".to_string(),
                profile: test_profile(),
            })
            .unwrap();

        let mut other_profile = test_profile();
        other_profile.email = "c@d.com".to_string();
        other_profile.has_resume = false;
        store
            .write(&Session {
                token: "second".to_string(),
                profile: other_profile,
            })
            .unwrap();

        let read = store.read().unwrap().unwrap();
        assert_eq!(read.token, "second");
        assert_eq!(read.profile.email, "c@d.com");
        assert!(!read.profile.has_resume);
    }

    #[test]
    fn test_clear() {
        let store = test_store();
        store
            .write(&Session {
                token: "jwt".to_string(),
                profile: test_profile(),
            })
            .unwrap();

        store.clear().unwrap();
        assert!(store.read().unwrap().is_none());

        // Clearing the empty state is fine
        store.clear().unwrap();
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_partial_record_reads_as_empty() {
        let storage = MemoryStorage::new();
        // Flag without token or profile: inconsistent by construction
        storage
            .set(&[(StorageKeys::IS_AUTHENTICATED.to_string(), "true".to_string())])
            .unwrap();

        let store = SessionStore::new(Box::new(storage));
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_empty_token_reads_as_empty() {
        let storage = MemoryStorage::new();
        storage
            .set(&[
                (StorageKeys::IS_AUTHENTICATED.to_string(), "true".to_string()),
                (StorageKeys::AUTH_TOKEN.to_string(), String::new()),
                (
                    StorageKeys::USER_PROFILE.to_string(),
                    serde_json::to_string(&test_profile()).unwrap(),
                ),
            ])
            .unwrap();

        let store = SessionStore::new(Box::new(storage));
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_unreadable_profile_reads_as_empty() {
        let storage = MemoryStorage::new();
        storage
            .set(&[
                (StorageKeys::IS_AUTHENTICATED.to_string(), "true".to_string()),
                (StorageKeys::AUTH_TOKEN.to_string(), "jwt".to_string()),
                (StorageKeys::USER_PROFILE.to_string(), "{broken".to_string()),
            ])
            .unwrap();

        let store = SessionStore::new(Box::new(storage));
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_profile_wire_format_is_camel_case() {
        let json = serde_json::to_string(&test_profile()).unwrap();
        assert!(json.contains("\"hasResume\":true"));
        assert!(json.contains("\"email\""));
        assert!(json.contains("\"picture\""));
    }
}
