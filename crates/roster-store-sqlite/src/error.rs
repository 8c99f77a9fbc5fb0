//! Error type for `roster-store-sqlite`.

use roster_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  /// Lost connections, I/O and corruption problems, lock timeouts, and any
  /// constraint violation that an `ON CONFLICT` clause did not absorb.
  /// Decoding problems only affect the row being read.
  fn is_fatal(&self) -> bool {
    match self {
      Self::Database(e) => database_fatal(e),
      _ => false,
    }
  }
}

fn database_fatal(e: &tokio_rusqlite::Error) -> bool {
  match e {
    tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => true,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, _)) => matches!(
      failure.code,
      ErrorCode::SystemIoFailure
        | ErrorCode::DatabaseCorrupt
        | ErrorCode::DiskFull
        | ErrorCode::ReadOnly
        | ErrorCode::CannotOpen
        | ErrorCode::NotADatabase
        | ErrorCode::ConstraintViolation
        | ErrorCode::DatabaseBusy
        | ErrorCode::DatabaseLocked
    ),
    // Errors raised inside a `call` closure are boxed store errors.
    tokio_rusqlite::Error::Other(inner) => inner
      .downcast_ref::<Error>()
      .is_some_and(StoreError::is_fatal),
    _ => false,
  }
}
