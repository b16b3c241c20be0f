use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One UTC calendar day of activity. Sessions hang off it by `journal_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Journal {
    pub id: Uuid,
    pub journal_day: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Journal {
    /// The journal day a clock reading belongs to. Days are cut in UTC.
    pub fn day_of(now: DateTime<Utc>) -> NaiveDate {
        now.date_naive()
    }
}
