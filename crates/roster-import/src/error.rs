//! Error types for `roster-import`.

use roster_core::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Everything that can go wrong while importing one row.
///
/// Generic over the backend's error so a fatal store failure keeps its
/// concrete type all the way out of a run.
#[derive(Debug, Error)]
pub enum Error<E: StoreError> {
  #[error("store error: {0}")]
  Store(#[source] E),

  /// A visa-case row named a person the tenant does not have.
  #[error("Person not found: {0}")]
  PersonNotFound(String),

  #[error("organization not found: {0}")]
  OrganizationNotFound(Uuid),

  #[error(transparent)]
  MalformedDates(#[from] MalformedDates),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),
}

impl<E: StoreError> Error<E> {
  /// Whether the error must abort the run instead of being charged to the
  /// current row.
  pub fn is_fatal(&self) -> bool {
    match self {
      Self::Store(e) => e.is_fatal(),
      _ => false,
    }
  }
}

/// Every date cell of a row was filled in and none of them parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no parseable date in {}", .columns.join(", "))]
pub struct MalformedDates {
  pub columns: Vec<String>,
}

pub type Result<T, E> = std::result::Result<T, Error<E>>;
