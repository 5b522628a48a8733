//! Line-oriented wire protocol for the TCP surface.
//!
//! Requests are newline-terminated query strings; responses are a single
//! JSON line: `{"status": "success" | "error", "message": ..., "data":
//! [...]}` where `data` holds the result rows of a successful query.

use common::ResultRow;
use serde::{Deserialize, Serialize};

/// Outcome tag of a response line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// One response line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
    pub data: Vec<ResultRow>,
}

impl Response {
    pub fn success(message: impl Into<String>, data: Vec<ResultRow>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            data: Vec::new(),
        }
    }

    /// Encode as a single JSON line (no trailing newline).
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode one JSON line.
    pub fn decode(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
