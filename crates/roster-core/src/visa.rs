//! Residence statuses and visa-application cases.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::text::fold_width;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// A residence status (在留資格).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VisaType {
  #[serde(rename = "tokutei_gino_1")]
  #[strum(serialize = "tokutei_gino_1")]
  TokuteiGino1,
  #[serde(rename = "tokutei_gino_2")]
  #[strum(serialize = "tokutei_gino_2")]
  TokuteiGino2,
  Tokkatsu,
  #[serde(rename = "gino_jisshu_1")]
  #[strum(serialize = "gino_jisshu_1")]
  GinoJisshu1,
  #[serde(rename = "gino_jisshu_2")]
  #[strum(serialize = "gino_jisshu_2")]
  GinoJisshu2,
  #[serde(rename = "gino_jisshu_3")]
  #[strum(serialize = "gino_jisshu_3")]
  GinoJisshu3,
  EngineerSpecialist,
  SkilledLabor,
  DesignatedActivities,
  Student,
  Dependent,
  PermanentResident,
  OverseasWaiting,
  #[default]
  Other,
}

/// The kind of application or notification a case tracks.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaseType {
  NewDispatch,
  NewDirect,
  ChangeA,
  ChangeB,
  RenewalDispatch,
  RenewalDirect,
  RenewalSubcontract,
  /// Ad-hoc notification: change of dispatch destination.
  ZuitojiDispatch,
  /// Ad-hoc notification: end of contract.
  ZuitojiTermination,
  #[default]
  Notification,
}

// ─── Priority ────────────────────────────────────────────────────────────────

/// Case priority, always within `1..=5`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "i64", into = "i64")]
pub struct Priority(u8);

impl Priority {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  /// Clamp any integer into the valid range.
  pub fn clamped(value: i64) -> Self {
    Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
  }

  /// Parse a free-text cell; blank or non-numeric text gives the default.
  /// Full-width digits count.
  pub fn parse(raw: Option<&str>) -> Self {
    raw
      .map(|s| fold_width(s.trim()))
      .and_then(|s| s.parse::<i64>().ok())
      .map(Self::clamped)
      .unwrap_or_default()
  }

  pub fn get(self) -> u8 { self.0 }
}

impl Default for Priority {
  fn default() -> Self { Self(2) }
}

impl From<i64> for Priority {
  fn from(value: i64) -> Self { Self::clamped(value) }
}

impl From<Priority> for i64 {
  fn from(priority: Priority) -> Self { i64::from(priority.0) }
}

// ─── VisaCase ────────────────────────────────────────────────────────────────

/// One visa-application workflow instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaCase {
  pub case_id:          Uuid,
  pub tenant_id:        Uuid,
  pub person_id:        Uuid,
  pub client_org_id:    Option<Uuid>,
  /// The client name as written in the source, kept even when resolved.
  pub client_name_raw:  Option<String>,
  pub case_type:        CaseType,
  pub target_visa_type: Option<VisaType>,
  pub deadline:         Option<NaiveDate>,
  /// Ordered free-text progress labels.
  pub status_tags:      Vec<String>,
  pub priority:         Priority,
  pub is_completed:     bool,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::RosterStore::insert_visa_case`].
#[derive(Debug, Clone)]
pub struct NewVisaCase {
  pub tenant_id:        Uuid,
  pub person_id:        Uuid,
  pub client_org_id:    Option<Uuid>,
  pub client_name_raw:  Option<String>,
  pub case_type:        CaseType,
  pub target_visa_type: Option<VisaType>,
  pub deadline:         Option<NaiveDate>,
  pub status_tags:      Vec<String>,
  pub priority:         Priority,
  pub is_completed:     bool,
}

impl NewVisaCase {
  pub fn key(&self) -> CaseKey {
    CaseKey {
      tenant_id: self.tenant_id,
      person_id: self.person_id,
      case_type: self.case_type,
      deadline:  self.deadline,
    }
  }
}

/// The deduplication key of a case. Two cases with the same key are the
/// same case; an absent deadline compares equal to another absent deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaseKey {
  pub tenant_id: Uuid,
  pub person_id: Uuid,
  pub case_type: CaseType,
  pub deadline:  Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn priority_is_clamped() {
    assert_eq!(Priority::clamped(0).get(), 1);
    assert_eq!(Priority::clamped(3).get(), 3);
    assert_eq!(Priority::clamped(99).get(), 5);
    assert_eq!(Priority::clamped(-4).get(), 1);
  }

  #[test]
  fn priority_defaults_on_blank_or_garbage() {
    assert_eq!(Priority::parse(None).get(), 2);
    assert_eq!(Priority::parse(Some("")).get(), 2);
    assert_eq!(Priority::parse(Some("高")).get(), 2);
    assert_eq!(Priority::parse(Some(" 4 ")).get(), 4);
    assert_eq!(Priority::parse(Some("7")).get(), 5);
    assert_eq!(Priority::parse(Some("４")).get(), 4);
    assert_eq!(Priority::parse(Some("７")).get(), 5);
  }

  #[test]
  fn deserialized_priority_is_clamped() {
    let high: Priority = serde_json::from_str("9").unwrap();
    let low: Priority = serde_json::from_str("0").unwrap();
    assert_eq!(high.get(), 5);
    assert_eq!(low.get(), 1);
    assert_eq!(serde_json::to_string(&Priority::clamped(3)).unwrap(), "3");
  }

  #[test]
  fn visa_codes_keep_numeric_suffix_separator() {
    assert_eq!(VisaType::TokuteiGino1.as_ref(), "tokutei_gino_1");
    assert_eq!(
      "gino_jisshu_3".parse::<VisaType>().unwrap(),
      VisaType::GinoJisshu3
    );
    assert_eq!(
      serde_json::to_value(VisaType::TokuteiGino2).unwrap(),
      "tokutei_gino_2"
    );
  }
}
