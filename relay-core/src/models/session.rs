use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub journal_id: Uuid,
    #[sqlx(json)]
    pub metadata: SessionMetadata,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session with a new v4 id, stamped at `now`.
    pub fn new(journal_id: Uuid, metadata: SessionMetadata, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            journal_id,
            metadata,
            created_at: now,
        }
    }
}

/// Structured session metadata. The `schema` tag names the shape so stored
/// rows can be told apart when new shapes are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum SessionMetadata {
    /// The submitted base64 payload, stored verbatim.
    #[serde(rename = "base64_image/v1")]
    Base64ImageV1 { base64_image: String },
}

impl SessionMetadata {
    pub fn base64_image(data: impl Into<String>) -> Self {
        Self::Base64ImageV1 {
            base64_image: data.into(),
        }
    }

    pub fn schema(&self) -> &'static str {
        match self {
            Self::Base64ImageV1 { .. } => "base64_image/v1",
        }
    }
}
