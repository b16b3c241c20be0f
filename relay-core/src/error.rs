use thiserror::Error;

use crate::describer::DescribeError;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] DescribeError),

    #[error("Other error: {0}")]
    Other(String),
}
