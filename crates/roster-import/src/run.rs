//! Import runs: stream a CSV through a row handler and tally the outcome.
//!
//! Rows are processed one at a time, in file order, because a later row may
//! depend on an organization or alias an earlier row created. Each row's
//! writes are durable as soon as the handler returns; a failing row never
//! rolls back the ones before it.

use std::fmt;

use roster_core::store::RosterStore;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  error::Error,
  row::{CsvRow, index_headers},
};

/// Shown in full in the text report; the rest are counted.
const REPORTED_ERRORS: usize = 5;

// ─── Row handling ────────────────────────────────────────────────────────────

/// What happened to one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
  Created,
  Merged,
  /// Nothing to write: blank key field, or the record already exists.
  Skipped,
}

/// One import dialect: turns a row into store writes.
pub trait RowHandler {
  type Store: RosterStore;

  async fn handle(
    &self,
    tenant_id: Uuid,
    row: &CsvRow,
  ) -> Result<RowOutcome, Error<<Self::Store as RosterStore>::Error>>;

  /// A human-readable label for the row in error messages, usually the
  /// person's name.
  fn identify(&self, row: &CsvRow) -> Option<String>;
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Counts and messages for a finished (or aborted) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
  pub success_count:   usize,
  pub update_count:    usize,
  pub skip_count:      usize,
  pub errors:          Vec<String>,
  pub total_processed: usize,
}

impl ImportSummary {
  fn tally(&mut self, outcome: RowOutcome) {
    match outcome {
      RowOutcome::Created => self.success_count += 1,
      RowOutcome::Merged => self.update_count += 1,
      RowOutcome::Skipped => self.skip_count += 1,
    }
    self.total_processed += 1;
  }

  /// Record a row failure. The row counts as skipped.
  fn fail(&mut self, number: usize, ident: Option<&str>, message: impl fmt::Display) {
    let line = match ident {
      Some(ident) => format!("Row {number} ({ident}): {message}"),
      None => format!("Row {number}: {message}"),
    };
    warn!("{line}");
    self.errors.push(line);
    self.tally(RowOutcome::Skipped);
  }
}

impl fmt::Display for ImportSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "{} created, {} updated, {} skipped ({} processed)",
      self.success_count, self.update_count, self.skip_count, self.total_processed
    )?;
    if self.errors.is_empty() {
      return Ok(());
    }
    writeln!(f, "{} error(s):", self.errors.len())?;
    for line in self.errors.iter().take(REPORTED_ERRORS) {
      writeln!(f, "  {line}")?;
    }
    if self.errors.len() > REPORTED_ERRORS {
      writeln!(f, "  ... and {} more", self.errors.len() - REPORTED_ERRORS)?;
    }
    Ok(())
  }
}

/// A run stopped by a fatal store error. Rows before `row` are committed and
/// counted in `summary`.
#[derive(Debug, thiserror::Error)]
#[error(
  "import aborted{}: {source}",
  .row.map(|n| format!(" at row {n}")).unwrap_or_default()
)]
pub struct RunAborted<E: roster_core::store::StoreError> {
  pub summary: ImportSummary,
  pub row:     Option<usize>,
  #[source]
  pub source:  Error<E>,
}

// ─── Run ─────────────────────────────────────────────────────────────────────

/// Drive every data row of `csv_text` through `handler`.
///
/// Non-fatal row failures are recorded in the summary and the run moves on;
/// a fatal store error stops it.
pub async fn run<H: RowHandler>(
  csv_text: &str,
  tenant_id: Uuid,
  handler: &H,
) -> Result<ImportSummary, RunAborted<<H::Store as RosterStore>::Error>> {
  let text = csv_text.strip_prefix('\u{feff}').unwrap_or(csv_text);
  let mut reader = csv::ReaderBuilder::new()
    .flexible(true)
    .from_reader(text.as_bytes());

  let mut summary = ImportSummary::default();

  let headers = match reader.headers() {
    Ok(headers) => index_headers(headers),
    Err(e) => {
      return Err(RunAborted {
        summary,
        row: None,
        source: Error::Csv(e),
      });
    }
  };

  for (index, record) in reader.records().enumerate() {
    let number = index + 1;
    let record = match record {
      Ok(record) => record,
      Err(e) => {
        summary.fail(number, None, Error::<<H::Store as RosterStore>::Error>::Csv(e));
        continue;
      }
    };

    let row = CsvRow::new(number, headers.clone(), record);
    match handler.handle(tenant_id, &row).await {
      Ok(outcome) => summary.tally(outcome),
      Err(e) if e.is_fatal() => {
        error!(row = number, error = %e, "aborting import");
        return Err(RunAborted {
          summary,
          row: Some(number),
          source: e,
        });
      }
      Err(e) => summary.fail(number, handler.identify(&row).as_deref(), e),
    }
  }

  info!(
    created = summary.success_count,
    updated = summary.update_count,
    skipped = summary.skip_count,
    errors = summary.errors.len(),
    "import finished"
  );
  Ok(summary)
}
