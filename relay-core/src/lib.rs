pub mod config;
pub mod db;
pub mod describer;
pub mod error;
pub mod models;
pub mod store;

pub use config::RelayConfig;
pub use describer::{DescribeError, DescriptionClient, Description, DESCRIPTIONS_PATH};
pub use error::RelayError;
pub use models::{Journal, Session, SessionMetadata};
pub use store::{JournalStore, PgJournalStore, ResolvedJournal};
