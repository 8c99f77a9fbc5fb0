//! Person — the canonical worker record, and the merge rules applied when
//! several import sources describe the same person.
//!
//! A person is identified within a tenant by full name. Every import source
//! upserts against that key, so the same worker arriving from the staff roster
//! and from the HR export converges on one record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  merge::{JsonMap, merge_shallow},
  visa::VisaType,
};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Where a person currently stands in the placement lifecycle.
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
pub enum PersonStatus {
  #[default]
  Monitoring,
  Applying,
  Preparing,
  Received,
  Lost,
  Resigned,
  ResignedPlanned,
  OverseasWaiting,
}

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
pub enum Nationality {
  Vietnam,
  Indonesia,
  Philippines,
  Myanmar,
  China,
  Cambodia,
  Nepal,
  Thailand,
  SriLanka,
  #[default]
  Other,
}

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
pub enum EmploymentType {
  /// Regular full-time employee.
  Seishain,
  Executive,
  Contract,
  Dispatch,
  PartTime,
  Subcontract,
  #[default]
  Other,
}

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:            Uuid,
  pub tenant_id:            Uuid,
  /// Upsert key within the tenant; mirrors `names.full_name`.
  pub full_name:            String,
  pub names:                JsonMap,
  pub demographics:         JsonMap,
  pub contact_info:         JsonMap,
  /// Source-specific payloads such as document references or HR metadata.
  pub attributes:           JsonMap,
  pub nationality:          Option<Nationality>,
  pub current_status:       PersonStatus,
  pub current_status_notes: Option<serde_json::Value>,
  pub current_visa_type:    Option<VisaType>,
  pub visa_expiry_date:     Option<NaiveDate>,
  pub smarthr_crew_id:      Option<String>,
  pub smarthr_synced_at:    Option<DateTime<Utc>>,
  pub slack_hr_list_id:     Option<String>,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
  pub deleted_at:           Option<DateTime<Utc>>,
}

/// Scalar status fields. A source that carries them overwrites all of them
/// on merge, including with absent values.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusFields {
  pub current_status:    PersonStatus,
  pub status_notes:      Option<serde_json::Value>,
  pub nationality:       Nationality,
  pub current_visa_type: VisaType,
  pub visa_expiry_date:  Option<NaiveDate>,
}

/// External-system linkage. `None` means "not mentioned by this source":
/// a merge keeps whatever the record already has.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linkage {
  pub smarthr_crew_id:   Option<String>,
  pub smarthr_synced_at: Option<DateTime<Utc>>,
  pub slack_hr_list_id:  Option<String>,
}

/// Input to [`crate::store::RosterStore::upsert_person`].
#[derive(Debug, Clone)]
pub struct PersonUpsert {
  pub tenant_id:    Uuid,
  pub full_name:    String,
  pub names:        JsonMap,
  pub demographics: JsonMap,
  pub contact_info: JsonMap,
  pub attributes:   JsonMap,
  /// `None` for sources that do not carry status fields at all.
  pub status:       Option<StatusFields>,
  pub links:        Linkage,
}

impl Person {
  /// Build a fresh record from an upsert that hit no existing row.
  pub fn from_upsert(
    input: PersonUpsert,
    person_id: Uuid,
    now: DateTime<Utc>,
  ) -> Self {
    let mut person = Self {
      person_id,
      tenant_id: input.tenant_id,
      full_name: input.full_name,
      names: input.names,
      demographics: input.demographics,
      contact_info: input.contact_info,
      attributes: input.attributes,
      nationality: None,
      current_status: PersonStatus::default(),
      current_status_notes: None,
      current_visa_type: None,
      visa_expiry_date: None,
      smarthr_crew_id: input.links.smarthr_crew_id,
      smarthr_synced_at: input.links.smarthr_synced_at,
      slack_hr_list_id: input.links.slack_hr_list_id,
      created_at: now,
      updated_at: now,
      deleted_at: None,
    };
    if let Some(status) = input.status {
      person.set_status(status);
    }
    person
  }

  /// Merge an upsert into this record.
  ///
  /// - object columns are merged key-wise, incoming keys winning;
  /// - status fields are overwritten when the source carries them;
  /// - linkage ids are only replaced by present values.
  pub fn absorb(&mut self, input: PersonUpsert, now: DateTime<Utc>) {
    merge_shallow(&mut self.names, input.names);
    merge_shallow(&mut self.demographics, input.demographics);
    merge_shallow(&mut self.contact_info, input.contact_info);
    merge_shallow(&mut self.attributes, input.attributes);

    if let Some(status) = input.status {
      self.set_status(status);
    }

    let links = input.links;
    if links.smarthr_crew_id.is_some() {
      self.smarthr_crew_id = links.smarthr_crew_id;
    }
    if links.smarthr_synced_at.is_some() {
      self.smarthr_synced_at = links.smarthr_synced_at;
    }
    if links.slack_hr_list_id.is_some() {
      self.slack_hr_list_id = links.slack_hr_list_id;
    }

    self.updated_at = now;
  }

  fn set_status(&mut self, status: StatusFields) {
    self.current_status = status.current_status;
    self.current_status_notes = status.status_notes;
    self.nationality = Some(status.nationality);
    self.current_visa_type = Some(status.current_visa_type);
    self.visa_expiry_date = status.visa_expiry_date;
  }
}
