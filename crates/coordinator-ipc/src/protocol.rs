//! IPC protocol definitions.
//!
//! Newline-delimited JSON over a Unix domain socket. Every request gets
//! exactly one response; status-change events are pushed as separate lines
//! and carry a `type` field instead of an `id`.

use serde::{Deserialize, Serialize};

/// Actions a view context can request from the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Start the native identity-provider sign-in flow.
    InitiateGoogleAuth,
    /// Resolve the companion web app's login page.
    OpenLogin,
    /// Query sign-in state (re-validated against the remote authority).
    CheckAuthStatus,
    /// Hand off a token relayed from the companion web app.
    LogWebAuth,
    /// Sign out.
    Logout,
    /// Relay a settings change to the other contexts.
    SettingsUpdated,
    /// Resolve the options page.
    OpenOptions,

    // Transport lifecycle
    /// Liveness probe.
    Health,
    /// Ask the coordinator process to exit.
    Shutdown,
}

/// Events pushed by the coordinator to every connected context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// Sign-in state changed; re-query rather than trusting cached state.
    AuthStatusChanged,
    /// Settings changed in some context.
    SettingsUpdated,
}

/// Server-push event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: EventKind,
    /// Event payload.
    pub data: serde_json::Value,
}

impl Event {
    /// Create a new event.
    pub fn new(event_type: EventKind, data: serde_json::Value) -> Self {
        Self { event_type, data }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// IPC request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation.
    pub id: String,
    /// Action to invoke.
    pub action: Action,
    /// Action parameters (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl Request {
    /// Create a new request with auto-generated ID.
    pub fn new(action: Action) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            params: None,
        }
    }

    /// Create a new request with parameters.
    pub fn with_params(action: Action, params: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            params: Some(params),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// IPC response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID for correlation.
    pub id: String,
    /// Result data (if successful).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error information (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Error information in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
}

impl Response {
    /// Create a successful response.
    pub fn success(id: &str, result: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: &str, code: i32, message: &str) -> Self {
        Self {
            id: id.to_string(),
            result: None,
            error: Some(ErrorInfo {
                code,
                message: message.to_string(),
            }),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

// Standard error codes
pub mod error_codes {
    /// Unrecognized action or missing required field.
    pub const MALFORMED_MESSAGE: i32 = -32600;
    pub const ACTION_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const NOT_AUTHENTICATED: i32 = -32001;
    pub const PROVIDER_ERROR: i32 = -32010;
    pub const EXCHANGE_ERROR: i32 = -32011;
    pub const INVALID_HANDOFF_TOKEN: i32 = -32012;
    pub const VALIDATOR_UNAVAILABLE: i32 = -32013;
    pub const STORAGE_ERROR: i32 = -32014;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = Request::new(Action::Health);
        let json = request.to_json().unwrap();

        assert!(json.contains("\"action\":\"health\""));
        assert!(json.contains("\"id\":"));
    }

    #[test]
    fn test_request_with_params() {
        let request = Request::with_params(
            Action::LogWebAuth,
            serde_json::json!({ "token": "jwt2" }),
        );
        let json = request.to_json().unwrap();

        assert!(json.contains("\"action\":\"logWebAuth\""));
        assert!(json.contains("\"token\":\"jwt2\""));
    }

    #[test]
    fn test_all_actions_serialize_to_wire_names() {
        let actions = vec![
            (Action::InitiateGoogleAuth, "initiateGoogleAuth"),
            (Action::OpenLogin, "openLogin"),
            (Action::CheckAuthStatus, "checkAuthStatus"),
            (Action::LogWebAuth, "logWebAuth"),
            (Action::Logout, "logout"),
            (Action::SettingsUpdated, "settingsUpdated"),
            (Action::OpenOptions, "openOptions"),
            (Action::Health, "health"),
            (Action::Shutdown, "shutdown"),
        ];

        for (action, expected_name) in actions {
            let request = Request::new(action.clone());
            let json = request.to_json().unwrap();
            assert!(
                json.contains(&format!("\"action\":\"{}\"", expected_name)),
                "Action {:?} should serialize to {}",
                action,
                expected_name
            );
        }
    }

    #[test]
    fn test_event_kinds_serialize_to_wire_names() {
        let event = Event::new(EventKind::AuthStatusChanged, serde_json::json!({}));
        let json = event.to_json().unwrap();
        assert!(json.contains("\"type\":\"authStatusChanged\""));

        let event = Event::new(EventKind::SettingsUpdated, serde_json::json!({}));
        let json = event.to_json().unwrap();
        assert!(json.contains("\"type\":\"settingsUpdated\""));
    }

    #[test]
    fn test_response_success() {
        let response = Response::success("123", serde_json::json!({ "isAuthenticated": true }));
        let json = response.to_json().unwrap();

        assert!(json.contains("\"id\":\"123\""));
        assert!(json.contains("\"isAuthenticated\":true"));
        assert!(!json.contains("\"error\""));
        assert!(response.is_success());
    }

    #[test]
    fn test_response_error() {
        let response = Response::error("123", error_codes::ACTION_NOT_FOUND, "Unknown action");
        let json = response.to_json().unwrap();

        assert!(json.contains("\"id\":\"123\""));
        assert!(json.contains("\"code\":-32601"));
        assert!(json.contains("\"message\":\"Unknown action\""));
        assert!(!json.contains("\"result\""));
        assert!(!response.is_success());
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"id":"abc","action":"checkAuthStatus"}"#;
        let request: Request = Request::from_json(json).unwrap();

        assert_eq!(request.id, "abc");
        assert_eq!(request.action, Action::CheckAuthStatus);
    }

    #[test]
    fn test_unknown_action_fails_to_parse() {
        // The dispatch table is exhaustive; anything else is malformed
        let result = Request::from_json(r#"{"id":"123","action":"stealSession"}"#);
        assert!(result.is_err());

        let result = Request::from_json(r#"{"id":"123"}"#);
        assert!(result.is_err());

        let result = Request::from_json("not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_response_roundtrip() {
        let response = Response::success("test-id", serde_json::json!({"key": "value"}));
        let json = response.to_json().unwrap();

        let parsed: Response = Response::from_json(&json).unwrap();
        assert_eq!(parsed.id, "test-id");
        assert!(parsed.is_success());
        assert!(parsed.result.is_some());
    }

    #[test]
    fn test_event_roundtrip() {
        let event = Event::new(
            EventKind::AuthStatusChanged,
            serde_json::json!({"isAuthenticated": false}),
        );
        let json = event.to_json().unwrap();

        let parsed = Event::from_json(&json).unwrap();
        assert_eq!(parsed.event_type, EventKind::AuthStatusChanged);
        assert_eq!(parsed.data["isAuthenticated"], false);
    }

    #[test]
    fn test_request_id_uniqueness() {
        let req1 = Request::new(Action::Health);
        let req2 = Request::new(Action::Health);

        assert_ne!(req1.id, req2.id);
        assert!(!req1.id.is_empty());
    }

    #[test]
    fn test_events_and_responses_are_distinguishable() {
        // Responses carry "id"; events carry "type". A connection reading
        // both off one stream relies on this.
        let response_json = Response::success("1", serde_json::json!({})).to_json().unwrap();
        let event_json = Event::new(EventKind::AuthStatusChanged, serde_json::json!({}))
            .to_json()
            .unwrap();

        assert!(Response::from_json(&response_json).is_ok());
        assert!(Event::from_json(&event_json).is_ok());
        assert!(Event::from_json(&response_json).is_err());
        assert!(Response::from_json(&event_json).is_err());
    }
}
