//! Error types for `roster-core`.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown {kind} code: {value:?}")]
  UnknownCode { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parse a stored enum code, naming the enum in the error.
pub fn parse_code<T: FromStr>(kind: &'static str, value: &str) -> Result<T> {
  value.parse().map_err(|_| Error::UnknownCode {
    kind,
    value: value.to_owned(),
  })
}
