//! Header-addressed access to one CSV record.

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use csv::StringRecord;

use crate::{date, error::MalformedDates};

/// Column name to position, shared by every row of a run.
pub type HeaderIndex = Arc<HashMap<String, usize>>;

/// Build a [`HeaderIndex`]. Names are trimmed and a stray BOM is dropped; the
/// first of two identically named columns wins.
pub fn index_headers(headers: &StringRecord) -> HeaderIndex {
  let mut index = HashMap::with_capacity(headers.len());
  for (position, name) in headers.iter().enumerate() {
    let name = name.trim_start_matches('\u{feff}').trim();
    index.entry(name.to_owned()).or_insert(position);
  }
  Arc::new(index)
}

/// A data row. Cells are looked up by column name so exports may reorder or
/// drop columns freely.
#[derive(Debug, Clone)]
pub struct CsvRow {
  /// 1-based position among data rows; the header is not counted.
  pub number: usize,
  headers:    HeaderIndex,
  record:     StringRecord,
}

impl CsvRow {
  pub fn new(number: usize, headers: HeaderIndex, record: StringRecord) -> Self {
    Self {
      number,
      headers,
      record,
    }
  }

  pub fn has_column(&self, column: &str) -> bool { self.headers.contains_key(column) }

  /// The raw cell, if the column exists and the row is long enough.
  pub fn get(&self, column: &str) -> Option<&str> {
    self
      .headers
      .get(column)
      .and_then(|&position| self.record.get(position))
  }

  /// The cell with whitespace and surrounding quotes removed; blank is `None`.
  pub fn text(&self, column: &str) -> Option<&str> {
    self
      .get(column)
      .map(|cell| cell.trim().trim_matches('"').trim())
      .filter(|cell| !cell.is_empty())
  }

  /// A comma-separated cell as a list of non-blank items.
  pub fn list(&self, column: &str) -> Vec<String> {
    self
      .get(column)
      .map(|cell| {
        cell
          .split(',')
          .map(|item| item.trim().trim_matches('"').trim())
          .filter(|item| !item.is_empty())
          .map(str::to_owned)
          .collect()
      })
      .unwrap_or_default()
  }

  /// A checkbox column; only `true` (any case) counts as set.
  pub fn flag(&self, column: &str) -> bool {
    self
      .get(column)
      .is_some_and(|cell| cell.trim().eq_ignore_ascii_case("true"))
  }

  /// Parse a group of date columns at once.
  ///
  /// Unparseable cells become `None`, unless every listed column the file
  /// actually has is filled in and none of them parses: then the row is
  /// malformed.
  pub fn dates<const N: usize>(
    &self,
    columns: [&str; N],
  ) -> Result<[Option<NaiveDate>; N], MalformedDates> {
    let cells = columns.map(|column| self.text(column).map(date::parse));

    let present: Vec<_> = columns
      .iter()
      .zip(&cells)
      .filter(|(column, _)| self.has_column(column))
      .collect();

    let malformed = !present.is_empty()
      && present
        .iter()
        .all(|(_, cell)| matches!(cell, Some(None)));

    if malformed {
      return Err(MalformedDates {
        columns: present.iter().map(|(column, _)| (*column).to_string()).collect(),
      });
    }

    Ok(cells.map(Option::flatten))
  }
}
