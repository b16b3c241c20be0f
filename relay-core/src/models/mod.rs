pub mod journal;
pub mod session;

pub use journal::Journal;
pub use session::{Session, SessionMetadata};
