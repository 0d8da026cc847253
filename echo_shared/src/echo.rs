//! Echo records: what a player collects by defeating enemies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Echo type granted by the stock enemy.
pub const DEFAULT_ECHO_TYPE: &str = "Echo_Core";

/// Identity used when the client has no session of its own.
pub const DEFAULT_USER_ID: &str = "android_user";

/// One collected echo. Appended to a user's inventory, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoRecord {
    #[serde(rename = "type")]
    pub echo_type: String,
    pub collected_at: DateTime<Utc>,
}

impl EchoRecord {
    pub fn new(echo_type: impl Into<String>) -> Self {
        Self::at(echo_type, Utc::now())
    }

    pub fn at(echo_type: impl Into<String>, collected_at: DateTime<Utc>) -> Self {
        Self {
            echo_type: echo_type.into(),
            collected_at,
        }
    }
}
