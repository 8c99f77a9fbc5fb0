//! Lenient date parsing for spreadsheet cells.

use chrono::NaiveDate;

/// Accepted layouts, tried in order. `MM/DD/YYYY` precedes `DD/MM/YYYY`, so
/// an ambiguous value such as `03/04/2025` reads as March 4th.
const FORMATS: [&str; 5] = ["%Y/%m/%d", "%Y-%m-%d", "%Y年%m月%d日", "%m/%d/%Y", "%d/%m/%Y"];

/// Parse a cell into a date. Blank or unrecognised input is `None`; callers
/// treat that as "unknown", never as an error.
pub fn parse(raw: &str) -> Option<NaiveDate> {
  let cleaned = raw.trim().trim_matches('"').trim();
  if cleaned.is_empty() {
    return None;
  }
  FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
}
