use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Connecting,
    Connected,
    Error,
}

/// What the UI renders. A new snapshot replaces the previous one on every transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ConnectionSnapshot {
    pub fn idle() -> Self {
        Self {
            status: Status::Idle,
            account: None,
            chain_id: None,
            network_name: None,
            native_balance: None,
            error_message: None,
        }
    }

    /// Back to idle, but with a message for the user, e.g. after they cancelled a request.
    pub fn idle_with_notice(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::idle()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error_message: Some(message.into()),
            ..Self::idle()
        }
    }

    /// The in-flight state of a connection attempt keeps whatever was shown before.
    pub fn connecting(&self) -> Self {
        Self {
            status: Status::Connecting,
            error_message: None,
            ..self.clone()
        }
    }

    pub fn with_error_message(&self, message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..self.clone()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == Status::Connected
    }
}

impl Default for ConnectionSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}
