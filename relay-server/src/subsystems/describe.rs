use std::sync::Arc;

use chrono::{DateTime, Utc};
use relay_core::{DescriptionClient, JournalStore, RelayError, Session, SessionMetadata};
use serde::Deserialize;
use uuid::Uuid;

/// Body of `POST /descriptions/base64`.
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionRequest {
    pub media_type: String,
    pub base64_data: String,
}

/// What a successful submission hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionReceipt {
    pub description: String,
    pub journal_id: Uuid,
    pub session_id: Uuid,
}

/// Records the request against today's journal, then asks the description
/// service about the payload.
#[derive(Clone)]
pub struct Relay {
    store: Arc<dyn JournalStore>,
    describer: DescriptionClient,
}

impl Relay {
    pub fn new(store: Arc<dyn JournalStore>, describer: DescriptionClient) -> Self {
        Self { store, describer }
    }

    pub async fn submit(&self, request: DescriptionRequest) -> Result<DescriptionReceipt, RelayError> {
        self.submit_at(request, Utc::now()).await
    }

    /// Submit with an explicit clock reading. The journal day is the UTC date of `now`.
    ///
    /// The journal and session rows are written before the upstream call and
    /// are kept if that call fails.
    pub async fn submit_at(
        &self,
        request: DescriptionRequest,
        now: DateTime<Utc>,
    ) -> Result<DescriptionReceipt, RelayError> {
        let day = relay_core::Journal::day_of(now);
        let resolved = self.store.resolve_journal(Uuid::new_v4(), day).await?;
        let journal_id = resolved.journal.id;
        if resolved.created {
            tracing::info!(%journal_id, %day, "Created journal");
        }

        let DescriptionRequest {
            media_type,
            base64_data,
        } = request;

        let session = Session::new(journal_id, SessionMetadata::base64_image(base64_data), now);
        self.store.insert_session(&session).await?;
        tracing::info!(
            session_id = %session.id,
            %journal_id,
            %media_type,
            schema = session.metadata.schema(),
            "Recorded session"
        );

        let SessionMetadata::Base64ImageV1 { base64_image } = &session.metadata;
        let description = self.describer.describe(&media_type, base64_image).await?;

        Ok(DescriptionReceipt {
            description: description.into_inner(),
            journal_id,
            session_id: session.id,
        })
    }
}
