//! Tenant — the top-level isolation boundary. Every other entity belongs to
//! exactly one tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
  pub tenant_id:  Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}
