//! Trust boundary for externally-sourced messages.
//!
//! Web pages can hand the coordinator an auth token, but only one statically
//! configured origin is allowed to. Messages that fail this gate are dropped
//! before they can reach any mutation path; they get no response at all.

use serde::Deserialize;
use tracing::debug;

/// The one action tag accepted from external origins.
pub const EXTERNAL_HANDOFF_ACTION: &str = "webAuth";

/// A message arriving from outside the extension's trust boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalMessage {
    /// Action tag; only [`EXTERNAL_HANDOFF_ACTION`] is recognized.
    pub action: String,
    /// Handed-off session token.
    #[serde(default)]
    pub token: String,
}

/// Origin-based gate for external messages.
pub struct TrustFilter {
    allowed_origin: String,
}

impl TrustFilter {
    /// Create a filter that trusts exactly one origin.
    pub fn new(allowed_origin: &str) -> Self {
        Self {
            allowed_origin: allowed_origin.to_string(),
        }
    }

    /// Decide whether an external message may proceed.
    ///
    /// Requires an exact origin match, the recognized action tag, and a
    /// non-empty token. Everything else is rejected.
    pub fn accept(&self, message: &ExternalMessage, sender_origin: &str) -> bool {
        if sender_origin != self.allowed_origin {
            debug!(origin = %sender_origin, "Dropping external message from untrusted origin");
            return false;
        }

        if message.action != EXTERNAL_HANDOFF_ACTION {
            debug!(action = %message.action, "Dropping external message with unrecognized action");
            return false;
        }

        if message.token.is_empty() {
            debug!("Dropping external handoff with empty token");
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUSTED: &str = "http://localhost:3000";

    fn handoff(token: &str) -> ExternalMessage {
        ExternalMessage {
            action: EXTERNAL_HANDOFF_ACTION.to_string(),
            token: token.to_string(),
        }
    }

    #[test]
    fn test_accepts_trusted_origin_handoff() {
        let filter = TrustFilter::new(TRUSTED);
        assert!(filter.accept(&handoff("jwt2"), TRUSTED));
    }

    #[test]
    fn test_rejects_foreign_origin() {
        let filter = TrustFilter::new(TRUSTED);
        assert!(!filter.accept(&handoff("jwt2"), "http://evil.example"));
    }

    #[test]
    fn test_origin_match_is_exact() {
        let filter = TrustFilter::new(TRUSTED);

        // Prefixes, subdomains, and scheme changes do not match
        assert!(!filter.accept(&handoff("jwt2"), "http://localhost:3000.evil.example"));
        assert!(!filter.accept(&handoff("jwt2"), "https://localhost:3000"));
        assert!(!filter.accept(&handoff("jwt2"), "http://localhost:30000"));
        assert!(!filter.accept(&handoff("jwt2"), ""));
    }

    #[test]
    fn test_rejects_unrecognized_action() {
        let filter = TrustFilter::new(TRUSTED);
        let message = ExternalMessage {
            action: "settingsUpdated".to_string(),
            token: "jwt2".to_string(),
        };
        assert!(!filter.accept(&message, TRUSTED));
    }

    #[test]
    fn test_rejects_empty_token() {
        let filter = TrustFilter::new(TRUSTED);
        assert!(!filter.accept(&handoff(""), TRUSTED));
    }

    #[test]
    fn test_external_message_parses_wire_format() {
        let json = r#"{"action": "webAuth", "token": "jwt2"}"#;
        let message: ExternalMessage = serde_json::from_str(json).unwrap();

        assert_eq!(message.action, EXTERNAL_HANDOFF_ACTION);
        assert_eq!(message.token, "jwt2");
    }

    #[test]
    fn test_external_message_missing_token_parses_empty() {
        let json = r#"{"action": "webAuth"}"#;
        let message: ExternalMessage = serde_json::from_str(json).unwrap();

        assert!(message.token.is_empty());

        let filter = TrustFilter::new(TRUSTED);
        assert!(!filter.accept(&message, TRUSTED));
    }
}
