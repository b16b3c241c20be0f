//! Shared helpers for relay integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use relay_core::config::{HttpConfig, DEFAULT_BODY_LIMIT_BYTES};
use relay_core::{DescriptionClient, Journal, JournalStore, RelayError, ResolvedJournal, Session};
use relay_server::http::{build_router, HttpState};
use relay_server::subsystems::describe::Relay;
use tokio::sync::Mutex;
use uuid::Uuid;
use wiremock::MockServer;

#[derive(Default)]
struct Tables {
    journals: HashMap<NaiveDate, Journal>,
    sessions: Vec<Session>,
}

/// In-memory `JournalStore`. One lock covers the find-or-create, which gives
/// the same one-journal-per-day guarantee as the unique constraint.
#[derive(Default)]
pub struct MemoryJournalStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryJournalStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every call fail as if the database were down.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub async fn journal_count(&self) -> usize {
        self.tables.lock().await.journals.len()
    }

    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }

    fn check(&self) -> Result<(), RelayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RelayError::Other("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl JournalStore for MemoryJournalStore {
    async fn resolve_journal(
        &self,
        candidate: Uuid,
        day: NaiveDate,
    ) -> Result<ResolvedJournal, RelayError> {
        self.check()?;
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.journals.get(&day) {
            return Ok(ResolvedJournal {
                journal: existing.clone(),
                created: false,
            });
        }
        // Widen the window a concurrent caller would race through without the lock.
        tokio::task::yield_now().await;
        let journal = Journal {
            id: candidate,
            journal_day: day,
            created_at: Utc::now(),
        };
        tables.journals.insert(day, journal.clone());
        Ok(ResolvedJournal {
            journal,
            created: true,
        })
    }

    async fn insert_session(&self, session: &Session) -> Result<(), RelayError> {
        self.check()?;
        let mut tables = self.tables.lock().await;
        if !tables.journals.values().any(|j| j.id == session.journal_id) {
            return Err(RelayError::Other(format!(
                "foreign key violation: journal {} does not exist",
                session.journal_id
            )));
        }
        tables.sessions.push(session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, RelayError> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn sessions_for_journal(&self, journal_id: Uuid) -> Result<Vec<Session>, RelayError> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .iter()
            .filter(|s| s.journal_id == journal_id)
            .cloned()
            .collect())
    }
}

pub fn test_http_config() -> HttpConfig {
    HttpConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
    }
}

pub fn make_relay(store: Arc<MemoryJournalStore>, base_url: String, timeout: Duration) -> Relay {
    let describer =
        DescriptionClient::with_base_url(base_url, timeout).expect("Failed to create client");
    Relay::new(store, describer)
}

pub fn relay_for(store: Arc<MemoryJournalStore>, server: &MockServer) -> Relay {
    make_relay(store, server.uri(), Duration::from_secs(5))
}

pub fn router_for(relay: Relay) -> axum::Router {
    build_router(Arc::new(HttpState {
        relay,
        http: test_http_config(),
    }))
}

/// A base URL nothing is listening on.
pub fn unreachable_base_url() -> String {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    format!("http://127.0.0.1:{}", port)
}

pub async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
