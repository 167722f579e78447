//! WebSocket message protocol between browser clients and the relay.

use serde::{Deserialize, Serialize};

/// Acknowledgement text sent to every client right after the upgrade.
pub const CONNECTED_MESSAGE: &str = "<em><small>Connected to server</small></em>";

/// Payload sent from client to server.
///
/// Fields the client leaves out decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPayload {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub message: String,
}

impl ClientPayload {
    /// Decode a payload from a JSON text frame.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Decode a payload from a JSON binary frame.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn kind(&self) -> Action {
        Action::from(self.action.as_str())
    }
}

/// Client actions understood by the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Set or change the display name of the sending connection.
    Username,
    /// The client is leaving the page.
    Left,
    /// Chat message to relay to everybody.
    Broadcast,
    /// Anything else. Ignored by the server.
    Unknown(String),
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        match s {
            "username" => Action::Username,
            "left" => Action::Left,
            "broadcast" => Action::Broadcast,
            other => Action::Unknown(other.to_string()),
        }
    }
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Username => "username",
            Action::Left => "left",
            Action::Broadcast => "broadcast",
            Action::Unknown(s) => s,
        }
    }
}

/// Action tag of a server response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    /// Plain notice with no action tag (the connection acknowledgement).
    #[default]
    #[serde(rename = "")]
    Notice,
    /// Current roster of named users.
    ListUsers,
    /// Relayed chat message.
    Broadcast,
}

/// Response sent from server to client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub action: ResponseAction,
    #[serde(default)]
    pub message: String,
    /// Reserved; clients do not read it yet.
    #[serde(default)]
    pub message_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
}

impl Response {
    /// Acknowledgement sent once per connection before any event is handled.
    pub fn connected() -> Self {
        Self {
            message: CONNECTED_MESSAGE.to_string(),
            ..Default::default()
        }
    }

    /// Roster broadcast. `users` must already be sorted and free of empty names.
    pub fn list_users(users: Vec<String>) -> Self {
        Self {
            action: ResponseAction::ListUsers,
            users: Some(users),
            ..Default::default()
        }
    }

    /// Chat line attributed to `name`, rendered as an HTML fragment.
    pub fn chat(name: &str, message: &str) -> Self {
        Self {
            action: ResponseAction::Broadcast,
            message: format!("<strong>{}</strong>: {}", name, message),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
