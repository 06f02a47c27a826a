use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Metadata = HashMap<String, serde_json::Value>;

/// Payload keys the trackers use to attribute a signal to a content item,
/// in preference order.
pub(crate) const TARGET_ID_KEYS: [&str; 2] = ["targetId", "postId"];

/// One observed user action. Immutable once created; the session buffer is
/// append-only for the lifetime of the owning client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Event name, e.g. "view_post" or "map_interaction".
    pub signal_type: String,
    pub timestamp: DateTime<Utc>,
    /// Generated once per client instance, format `sess_<9 base36 chars>`.
    pub session_id: String,
    /// Free-form event payload. May carry a `targetId`/`postId` used by the
    /// store adapter to attribute the signal to a content item.
    pub data: Metadata,
}

impl Signal {
    pub fn new(signal_type: impl Into<String>, session_id: impl Into<String>, data: Metadata) -> Self {
        Self {
            signal_type: signal_type.into(),
            timestamp: Utc::now(),
            session_id: session_id.into(),
            data,
        }
    }

    /// The content item this signal is attributed to, when the payload
    /// carries one under either key the trackers use.
    pub fn target_id(&self) -> Option<&str> {
        TARGET_ID_KEYS
            .iter()
            .find_map(|key| self.data.get(*key).and_then(|value| value.as_str()))
    }
}
