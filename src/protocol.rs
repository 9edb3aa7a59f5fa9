//! Subscription messages sent once per websocket connection.
//!
//! The two update servers speak different dialects: `/updates` expects an
//! externally tagged `{"Subscribe":[ids]}` object, `/api/updates` expects a
//! `type`/`payload` envelope with topic names.

use serde::Serialize;

use crate::error::ProbeError;

/// Request understood by the `/updates` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UpdatesRequest {
    Subscribe(Vec<i64>),
}

/// Request understood by the `/api/updates` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ApiUpdatesRequest {
    Subscribe(Vec<String>),
}

/// The single subscription frame a subscriber sends after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    Updates(UpdatesRequest),
    ApiUpdates(ApiUpdatesRequest),
}

impl Subscription {
    #[must_use]
    pub fn updates(ids: Vec<i64>) -> Self {
        Self::Updates(UpdatesRequest::Subscribe(ids))
    }

    #[must_use]
    pub fn api_updates(topics: Vec<String>) -> Self {
        Self::ApiUpdates(ApiUpdatesRequest::Subscribe(topics))
    }

    /// Render the text frame body.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_text(&self) -> Result<String, ProbeError> {
        let text = match self {
            Self::Updates(request) => serde_json::to_string(request)?,
            Self::ApiUpdates(request) => serde_json::to_string(request)?,
        };
        Ok(text)
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
