//! Organizations and the aliases that resolve to them.
//!
//! An organization's canonical name is unique per tenant among non-deleted
//! rows. Alias text is unique globally, so an alias lookup never needs a
//! tenant filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::merge::JsonMap;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The role an organization plays for the tenant.
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
pub enum OrgType {
  DispatchAgency,
  #[default]
  ClientCompany,
  SupportOrg,
  /// Registered support organization.
  Rso,
  Government,
}

/// The line of business an organization, department or visa category falls
/// under.
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
pub enum BusinessDivision {
  #[default]
  Dispatch,
  Subcontracting,
  Direct,
  Support,
  It,
}

// ─── Organization ────────────────────────────────────────────────────────────

/// A structured postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub postal_code: Option<String>,
  pub prefecture:  Option<String>,
  pub city:        Option<String>,
  pub street:      Option<String>,
  pub building:    Option<String>,
}

/// Free-form organization settings. The import flags are typed; anything else
/// an operator stores survives a round trip through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgSettings {
  /// Created by an import run rather than by a person.
  #[serde(default)]
  pub imported:       bool,
  /// Pending human confirmation; set on every auto-created organization.
  #[serde(default)]
  pub needs_review:   bool,
  /// The raw company string that caused the organization to be created.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub original_input: Option<String>,
  #[serde(flatten)]
  pub extra:          JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
  pub org_id:            Uuid,
  pub tenant_id:         Uuid,
  pub name:              String,
  pub name_kana:         Option<String>,
  pub name_short:        Option<String>,
  /// Thirteen-digit corporate registration number.
  pub corporate_number:  Option<String>,
  pub org_type:          OrgType,
  pub business_division: BusinessDivision,
  pub address:           Address,
  pub settings:          OrgSettings,
  pub created_at:        DateTime<Utc>,
  pub deleted_at:        Option<DateTime<Utc>>,
}

/// Input to [`crate::store::RosterStore::create_organization`].
#[derive(Debug, Clone)]
pub struct NewOrganization {
  pub tenant_id:         Uuid,
  pub name:              String,
  pub org_type:          OrgType,
  pub business_division: BusinessDivision,
  pub settings:          OrgSettings,
}

impl NewOrganization {
  /// An organization created because an import could not resolve
  /// `original_input` to anything known. Always flagged for review.
  pub fn auto_created(
    tenant_id: Uuid,
    name: impl Into<String>,
    original_input: impl Into<String>,
  ) -> Self {
    Self {
      tenant_id,
      name: name.into(),
      org_type: OrgType::ClientCompany,
      business_division: BusinessDivision::Dispatch,
      settings: OrgSettings {
        imported:       true,
        needs_review:   true,
        original_input: Some(original_input.into()),
        extra:          JsonMap::new(),
      },
    }
  }
}

// ─── Alias ───────────────────────────────────────────────────────────────────

/// Where an alias row came from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AliasSource {
  /// Learned when a raw name matched an organization by substring.
  PartialMatch,
  /// Recorded alongside an auto-created organization.
  AutoGenerated,
  /// Registered by an operator.
  Manual,
}

/// An alternate spelling that resolves to exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationAlias {
  pub alias_id:   Uuid,
  pub org_id:     Uuid,
  pub alias_name: String,
  pub source:     AliasSource,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::RosterStore::insert_alias`].
#[derive(Debug, Clone)]
pub struct NewAlias {
  pub org_id:     Uuid,
  pub alias_name: String,
  pub source:     AliasSource,
}
