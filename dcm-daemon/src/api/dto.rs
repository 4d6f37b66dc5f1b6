//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

/// Body of `DELETE /api/delete`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    pub name: String,
}

/// Envelope for every JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl BasicResponse {
    pub fn ok(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self { success: true, message: message.into(), data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), data: None }
    }
}
