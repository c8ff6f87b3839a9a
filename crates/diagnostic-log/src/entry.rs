use serde::{Deserialize, Serialize};

/// One diagnostic record as stored by the sinks in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEntry {
    pub id: uuid::Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub category: String,
    pub subject_id: String,
    pub payload: serde_json::Value,
}

impl DiagnosticEntry {
    /// Stamp a new entry with a v4 id and the current UTC time.
    pub fn new(
        category: impl Into<String>,
        subject_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            category: category.into(),
            subject_id: subject_id.into(),
            payload,
        }
    }

    /// Same category, subject and payload; id and timestamp are ignored.
    pub fn same_content(&self, other: &DiagnosticEntry) -> bool {
        self.category == other.category
            && self.subject_id == other.subject_id
            && self.payload == other.payload
    }
}
