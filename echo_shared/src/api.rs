//! HTTP wire types shared by the backend and the game client.
//!
//! Field names are camelCase on the wire. The save request accepts the echo
//! type under either `type` or `echoType`, since both spellings are in use
//! by deployed clients.

use serde::{Deserialize, Serialize};

use crate::echo::EchoRecord;

/// `POST` route recording one echo.
pub const SAVE_ECHO_PATH: &str = "/api/save-echo";

/// `GET` route listing a user's echoes (axum path syntax).
pub const INVENTORY_ROUTE: &str = "/api/inventory/{user_id}";

/// Prefix of [`INVENTORY_ROUTE`] for building request URLs.
pub const INVENTORY_PREFIX: &str = "/api/inventory";

/// Body of `POST /api/save-echo`. Fields are optional so the server can
/// answer a missing one with a 400 instead of a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEchoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(
        default,
        rename = "type",
        alias = "echoType",
        skip_serializing_if = "Option::is_none"
    )]
    pub echo_type: Option<String>,
}

impl SaveEchoRequest {
    pub fn new(user_id: impl Into<String>, echo_type: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            echo_type: Some(echo_type.into()),
        }
    }

    /// The user id as sent, if present and not blank.
    pub fn user_id(&self) -> Option<&str> {
        non_blank(self.user_id.as_deref())
    }

    /// The echo type as sent, if present and not blank.
    pub fn echo_type(&self) -> Option<&str> {
        non_blank(self.echo_type.as_deref())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Reply to a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEchoResponse {
    pub success: bool,
    /// Inventory length after the append.
    pub count: usize,
    pub inventory: Vec<EchoRecord>,
}

/// Reply to `GET /api/inventory/:userId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub user_id: String,
    pub items: Vec<EchoRecord>,
}

/// Error body for any non-2xx API reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
