//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings in UTC with fixed microsecond precision,
//! so they sort lexically. Calendar dates are `YYYY-MM-DD`. Enum codes are
//! their snake_case names. Object columns are compact JSON.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use roster_core::{
  error::parse_code,
  organization::{Organization, OrganizationAlias},
  person::Person,
  tenant::Tenant,
  visa::{Priority, VisaCase},
};
use rusqlite::Row;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String> { Ok(serde_json::to_string(value)?) }

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> { Ok(serde_json::from_str(s)?) }

fn decode_code<T: FromStr>(kind: &'static str, s: &str) -> Result<T> { Ok(parse_code(kind, s)?) }

fn decode_opt<T>(s: Option<String>, f: impl FnOnce(&str) -> Result<T>) -> Result<Option<T>> {
  s.as_deref().map(f).transpose()
}

// ─── Tenant ──────────────────────────────────────────────────────────────────

pub const TENANT_COLUMNS: &str = "tenant_id, name, created_at";

pub struct RawTenant {
  pub tenant_id:  String,
  pub name:       String,
  pub created_at: String,
}

impl RawTenant {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tenant_id:  row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_tenant(self) -> Result<Tenant> {
    Ok(Tenant {
      tenant_id:  decode_uuid(&self.tenant_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Organization ────────────────────────────────────────────────────────────

pub const ORG_COLUMNS: &str = "org_id, tenant_id, name, name_kana, name_short, \
  corporate_number, org_type, business_division, address, settings, created_at, deleted_at";

pub struct RawOrganization {
  pub org_id:            String,
  pub tenant_id:         String,
  pub name:              String,
  pub name_kana:         Option<String>,
  pub name_short:        Option<String>,
  pub corporate_number:  Option<String>,
  pub org_type:          String,
  pub business_division: String,
  pub address:           String,
  pub settings:          String,
  pub created_at:        String,
  pub deleted_at:        Option<String>,
}

impl RawOrganization {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      org_id:            row.get(0)?,
      tenant_id:         row.get(1)?,
      name:              row.get(2)?,
      name_kana:         row.get(3)?,
      name_short:        row.get(4)?,
      corporate_number:  row.get(5)?,
      org_type:          row.get(6)?,
      business_division: row.get(7)?,
      address:           row.get(8)?,
      settings:          row.get(9)?,
      created_at:        row.get(10)?,
      deleted_at:        row.get(11)?,
    })
  }

  pub fn encode(org: &Organization) -> Result<Self> {
    Ok(Self {
      org_id:            encode_uuid(org.org_id),
      tenant_id:         encode_uuid(org.tenant_id),
      name:              org.name.clone(),
      name_kana:         org.name_kana.clone(),
      name_short:        org.name_short.clone(),
      corporate_number:  org.corporate_number.clone(),
      org_type:          org.org_type.as_ref().to_owned(),
      business_division: org.business_division.as_ref().to_owned(),
      address:           encode_json(&org.address)?,
      settings:          encode_json(&org.settings)?,
      created_at:        encode_dt(org.created_at),
      deleted_at:        org.deleted_at.map(encode_dt),
    })
  }

  pub fn into_organization(self) -> Result<Organization> {
    Ok(Organization {
      org_id:            decode_uuid(&self.org_id)?,
      tenant_id:         decode_uuid(&self.tenant_id)?,
      name:              self.name,
      name_kana:         self.name_kana,
      name_short:        self.name_short,
      corporate_number:  self.corporate_number,
      org_type:          decode_code("org type", &self.org_type)?,
      business_division: decode_code("business division", &self.business_division)?,
      address:           decode_json(&self.address)?,
      settings:          decode_json(&self.settings)?,
      created_at:        decode_dt(&self.created_at)?,
      deleted_at:        decode_opt(self.deleted_at, decode_dt)?,
    })
  }
}

// ─── Alias ───────────────────────────────────────────────────────────────────

pub const ALIAS_COLUMNS: &str = "alias_id, org_id, alias_name, source, created_at";

pub struct RawAlias {
  pub alias_id:   String,
  pub org_id:     String,
  pub alias_name: String,
  pub source:     String,
  pub created_at: String,
}

impl RawAlias {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      alias_id:   row.get(0)?,
      org_id:     row.get(1)?,
      alias_name: row.get(2)?,
      source:     row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_alias(self) -> Result<OrganizationAlias> {
    Ok(OrganizationAlias {
      alias_id:   decode_uuid(&self.alias_id)?,
      org_id:     decode_uuid(&self.org_id)?,
      alias_name: self.alias_name,
      source:     decode_code("alias source", &self.source)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

pub const PERSON_COLUMNS: &str = "person_id, tenant_id, full_name, names, demographics, \
  contact_info, attributes, nationality, current_status, current_status_notes, \
  current_visa_type, visa_expiry_date, smarthr_crew_id, smarthr_synced_at, \
  slack_hr_list_id, created_at, updated_at, deleted_at";

pub struct RawPerson {
  pub person_id:            String,
  pub tenant_id:            String,
  pub full_name:            String,
  pub names:                String,
  pub demographics:         String,
  pub contact_info:         String,
  pub attributes:           String,
  pub nationality:          Option<String>,
  pub current_status:       String,
  pub current_status_notes: Option<String>,
  pub current_visa_type:    Option<String>,
  pub visa_expiry_date:     Option<String>,
  pub smarthr_crew_id:      Option<String>,
  pub smarthr_synced_at:    Option<String>,
  pub slack_hr_list_id:     Option<String>,
  pub created_at:           String,
  pub updated_at:           String,
  pub deleted_at:           Option<String>,
}

impl RawPerson {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:            row.get(0)?,
      tenant_id:            row.get(1)?,
      full_name:            row.get(2)?,
      names:                row.get(3)?,
      demographics:         row.get(4)?,
      contact_info:         row.get(5)?,
      attributes:           row.get(6)?,
      nationality:          row.get(7)?,
      current_status:       row.get(8)?,
      current_status_notes: row.get(9)?,
      current_visa_type:    row.get(10)?,
      visa_expiry_date:     row.get(11)?,
      smarthr_crew_id:      row.get(12)?,
      smarthr_synced_at:    row.get(13)?,
      slack_hr_list_id:     row.get(14)?,
      created_at:           row.get(15)?,
      updated_at:           row.get(16)?,
      deleted_at:           row.get(17)?,
    })
  }

  pub fn encode(p: &Person) -> Result<Self> {
    Ok(Self {
      person_id:            encode_uuid(p.person_id),
      tenant_id:            encode_uuid(p.tenant_id),
      full_name:            p.full_name.clone(),
      names:                encode_json(&p.names)?,
      demographics:         encode_json(&p.demographics)?,
      contact_info:         encode_json(&p.contact_info)?,
      attributes:           encode_json(&p.attributes)?,
      nationality:          p.nationality.map(|n| n.as_ref().to_owned()),
      current_status:       p.current_status.as_ref().to_owned(),
      current_status_notes: p.current_status_notes.as_ref().map(encode_json).transpose()?,
      current_visa_type:    p.current_visa_type.map(|v| v.as_ref().to_owned()),
      visa_expiry_date:     p.visa_expiry_date.map(encode_date),
      smarthr_crew_id:      p.smarthr_crew_id.clone(),
      smarthr_synced_at:    p.smarthr_synced_at.map(encode_dt),
      slack_hr_list_id:     p.slack_hr_list_id.clone(),
      created_at:           encode_dt(p.created_at),
      updated_at:           encode_dt(p.updated_at),
      deleted_at:           p.deleted_at.map(encode_dt),
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:            decode_uuid(&self.person_id)?,
      tenant_id:            decode_uuid(&self.tenant_id)?,
      full_name:            self.full_name,
      names:                decode_json(&self.names)?,
      demographics:         decode_json(&self.demographics)?,
      contact_info:         decode_json(&self.contact_info)?,
      attributes:           decode_json(&self.attributes)?,
      nationality:          decode_opt(self.nationality, |s| decode_code("nationality", s))?,
      current_status:       decode_code("person status", &self.current_status)?,
      current_status_notes: decode_opt(self.current_status_notes, decode_json)?,
      current_visa_type:    decode_opt(self.current_visa_type, |s| decode_code("visa type", s))?,
      visa_expiry_date:     decode_opt(self.visa_expiry_date, decode_date)?,
      smarthr_crew_id:      self.smarthr_crew_id,
      smarthr_synced_at:    decode_opt(self.smarthr_synced_at, decode_dt)?,
      slack_hr_list_id:     self.slack_hr_list_id,
      created_at:           decode_dt(&self.created_at)?,
      updated_at:           decode_dt(&self.updated_at)?,
      deleted_at:           decode_opt(self.deleted_at, decode_dt)?,
    })
  }
}

// ─── VisaCase ────────────────────────────────────────────────────────────────

pub const CASE_COLUMNS: &str = "case_id, tenant_id, person_id, client_org_id, \
  client_name_raw, case_type, target_visa_type, deadline, status_tags, priority, \
  is_completed, created_at";

pub struct RawVisaCase {
  pub case_id:          String,
  pub tenant_id:        String,
  pub person_id:        String,
  pub client_org_id:    Option<String>,
  pub client_name_raw:  Option<String>,
  pub case_type:        String,
  pub target_visa_type: Option<String>,
  pub deadline:         Option<String>,
  pub status_tags:      String,
  pub priority:         i64,
  pub is_completed:     bool,
  pub created_at:       String,
}

impl RawVisaCase {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      case_id:          row.get(0)?,
      tenant_id:        row.get(1)?,
      person_id:        row.get(2)?,
      client_org_id:    row.get(3)?,
      client_name_raw:  row.get(4)?,
      case_type:        row.get(5)?,
      target_visa_type: row.get(6)?,
      deadline:         row.get(7)?,
      status_tags:      row.get(8)?,
      priority:         row.get(9)?,
      is_completed:     row.get(10)?,
      created_at:       row.get(11)?,
    })
  }

  pub fn encode(case: &VisaCase) -> Result<Self> {
    Ok(Self {
      case_id:          encode_uuid(case.case_id),
      tenant_id:        encode_uuid(case.tenant_id),
      person_id:        encode_uuid(case.person_id),
      client_org_id:    case.client_org_id.map(encode_uuid),
      client_name_raw:  case.client_name_raw.clone(),
      case_type:        case.case_type.as_ref().to_owned(),
      target_visa_type: case.target_visa_type.map(|v| v.as_ref().to_owned()),
      deadline:         case.deadline.map(encode_date),
      status_tags:      encode_json(&case.status_tags)?,
      priority:         i64::from(case.priority.get()),
      is_completed:     case.is_completed,
      created_at:       encode_dt(case.created_at),
    })
  }

  pub fn into_case(self) -> Result<VisaCase> {
    Ok(VisaCase {
      case_id:          decode_uuid(&self.case_id)?,
      tenant_id:        decode_uuid(&self.tenant_id)?,
      person_id:        decode_uuid(&self.person_id)?,
      client_org_id:    decode_opt(self.client_org_id, decode_uuid)?,
      client_name_raw:  self.client_name_raw,
      case_type:        decode_code("case type", &self.case_type)?,
      target_visa_type: decode_opt(self.target_visa_type, |s| decode_code("visa type", s))?,
      deadline:         decode_opt(self.deadline, decode_date)?,
      status_tags:      decode_json(&self.status_tags)?,
      priority:         Priority::clamped(self.priority),
      is_completed:     self.is_completed,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}
