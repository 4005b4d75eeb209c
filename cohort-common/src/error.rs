//! Errors shared by the cohort crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session, course or student missing from the database
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected setting or request value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
