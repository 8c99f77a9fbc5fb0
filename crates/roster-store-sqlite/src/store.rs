//! [`SqliteStore`], the SQLite implementation of [`RosterStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, SubsecRound as _, Utc};
use roster_core::{
  organization::{Address, NewAlias, NewOrganization, Organization, OrganizationAlias},
  person::{Person, PersonUpsert},
  store::{RosterStore, UpsertOutcome, Upserted},
  tenant::Tenant,
  text::match_key,
  visa::{CaseKey, NewVisaCase, VisaCase},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ALIAS_COLUMNS, CASE_COLUMNS, ORG_COLUMNS, PERSON_COLUMNS, RawAlias, RawOrganization,
    RawPerson, RawTenant, RawVisaCase, TENANT_COLUMNS, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// How long a writer waits for another connection's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The current time at the precision timestamps are stored with, so returned
/// records equal what a later read decodes.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Box a store error so it can leave a `call` closure.
fn boxed(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A roster store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_organization(
    &self,
    filter: &'static str,
    a: String,
    b: Option<String>,
  ) -> Result<Option<Organization>> {
    let raw: Option<RawOrganization> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {ORG_COLUMNS} FROM organizations WHERE {filter}");
        let raw = match b {
          Some(b) => conn
            .query_row(&sql, rusqlite::params![a, b], RawOrganization::from_row)
            .optional()?,
          None => conn
            .query_row(&sql, rusqlite::params![a], RawOrganization::from_row)
            .optional()?,
        };
        Ok(raw)
      })
      .await?;

    raw.map(RawOrganization::into_organization).transpose()
  }

  /// The tenant's non-deleted organizations, oldest first.
  async fn live_organizations(&self, tenant_id: Uuid) -> Result<Vec<Organization>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawOrganization> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ORG_COLUMNS} FROM organizations
           WHERE tenant_id = ?1 AND deleted_at IS NULL
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], RawOrganization::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrganization::into_organization).collect()
  }
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  type Error = Error;

  // ── Tenants ───────────────────────────────────────────────────────────────

  async fn ensure_tenant(&self, name: String) -> Result<Tenant> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(now());

    let raw: RawTenant = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tenants (tenant_id, name, created_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (name) DO NOTHING",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE name = ?1"),
          rusqlite::params![name],
          RawTenant::from_row,
        )?)
      })
      .await?;

    raw.into_tenant()
  }

  // ── Organizations ─────────────────────────────────────────────────────────

  async fn find_organization_by_name(
    &self,
    tenant_id: Uuid,
    name: String,
  ) -> Result<Option<Organization>> {
    self
      .query_organization(
        "tenant_id = ?1 AND name = ?2 AND deleted_at IS NULL",
        encode_uuid(tenant_id),
        Some(name),
      )
      .await
  }

  async fn find_organization_containing(
    &self,
    tenant_id: Uuid,
    fragment: String,
  ) -> Result<Option<Organization>> {
    // SQLite's lower() folds ASCII only, so match on the decoded names.
    let needle = match_key(&fragment);
    let orgs = self.live_organizations(tenant_id).await?;
    Ok(orgs.into_iter().find(|org| match_key(&org.name).contains(&needle)))
  }

  async fn create_organization(&self, input: NewOrganization) -> Result<Organization> {
    let org = Organization {
      org_id:            Uuid::new_v4(),
      tenant_id:         input.tenant_id,
      name:              input.name,
      name_kana:         None,
      name_short:        None,
      corporate_number:  None,
      org_type:          input.org_type,
      business_division: input.business_division,
      address:           Address::default(),
      settings:          input.settings,
      created_at:        now(),
      deleted_at:        None,
    };
    let row = RawOrganization::encode(&org)?;

    // Insert, or fall back to whichever live row already holds the name.
    let raw: RawOrganization = self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO organizations ({ORG_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT DO NOTHING"
          ),
          rusqlite::params![
            row.org_id,
            row.tenant_id,
            row.name,
            row.name_kana,
            row.name_short,
            row.corporate_number,
            row.org_type,
            row.business_division,
            row.address,
            row.settings,
            row.created_at,
            row.deleted_at,
          ],
        )?;
        Ok(conn.query_row(
          &format!(
            "SELECT {ORG_COLUMNS} FROM organizations
             WHERE tenant_id = ?1 AND name = ?2 AND deleted_at IS NULL"
          ),
          rusqlite::params![row.tenant_id, row.name],
          RawOrganization::from_row,
        )?)
      })
      .await?;

    raw.into_organization()
  }

  async fn get_organization(&self, org_id: Uuid) -> Result<Option<Organization>> {
    self
      .query_organization("org_id = ?1", encode_uuid(org_id), None)
      .await
  }

  async fn list_organizations(&self, tenant_id: Uuid) -> Result<Vec<Organization>> {
    self.live_organizations(tenant_id).await
  }

  // ── Aliases ───────────────────────────────────────────────────────────────

  async fn find_alias(&self, alias_name: String) -> Result<Option<OrganizationAlias>> {
    let raw: Option<RawAlias> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ALIAS_COLUMNS} FROM organization_aliases WHERE alias_name = ?1"),
            rusqlite::params![alias_name],
            RawAlias::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAlias::into_alias).transpose()
  }

  async fn insert_alias(&self, input: NewAlias) -> Result<Option<OrganizationAlias>> {
    let alias = OrganizationAlias {
      alias_id:   Uuid::new_v4(),
      org_id:     input.org_id,
      alias_name: input.alias_name,
      source:     input.source,
      created_at: now(),
    };

    let id_str     = encode_uuid(alias.alias_id);
    let org_str    = encode_uuid(alias.org_id);
    let name       = alias.alias_name.clone();
    let source_str = alias.source.as_ref().to_owned();
    let at_str     = encode_dt(alias.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!(
            "INSERT INTO organization_aliases ({ALIAS_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (alias_name) DO NOTHING"
          ),
          rusqlite::params![id_str, org_str, name, source_str, at_str],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(alias))
  }

  async fn list_aliases(&self, org_id: Uuid) -> Result<Vec<OrganizationAlias>> {
    let org_str = encode_uuid(org_id);

    let raws: Vec<RawAlias> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ALIAS_COLUMNS} FROM organization_aliases
           WHERE org_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![org_str], RawAlias::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlias::into_alias).collect()
  }

  // ── People ────────────────────────────────────────────────────────────────

  async fn upsert_person(&self, input: PersonUpsert) -> Result<Upserted<Person>> {
    let upserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let at = now();

        let existing = tx
          .query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM people WHERE tenant_id = ?1 AND full_name = ?2"),
            rusqlite::params![encode_uuid(input.tenant_id), input.full_name],
            RawPerson::from_row,
          )
          .optional()?;

        let (outcome, record) = match existing {
          Some(raw) => {
            let mut person = raw.into_person().map_err(boxed)?;
            person.absorb(input, at);
            (UpsertOutcome::Merged, person)
          }
          None => (
            UpsertOutcome::Created,
            Person::from_upsert(input, Uuid::new_v4(), at),
          ),
        };

        let row = RawPerson::encode(&record).map_err(boxed)?;
        tx.execute(
          &format!(
            "INSERT INTO people ({PERSON_COLUMNS}) VALUES (
               ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
             )
             ON CONFLICT (tenant_id, full_name) DO UPDATE SET
               names                = excluded.names,
               demographics         = excluded.demographics,
               contact_info         = excluded.contact_info,
               attributes           = excluded.attributes,
               nationality          = excluded.nationality,
               current_status       = excluded.current_status,
               current_status_notes = excluded.current_status_notes,
               current_visa_type    = excluded.current_visa_type,
               visa_expiry_date     = excluded.visa_expiry_date,
               smarthr_crew_id      = COALESCE(excluded.smarthr_crew_id, people.smarthr_crew_id),
               smarthr_synced_at    = COALESCE(excluded.smarthr_synced_at, people.smarthr_synced_at),
               slack_hr_list_id     = COALESCE(excluded.slack_hr_list_id, people.slack_hr_list_id),
               updated_at           = excluded.updated_at"
          ),
          rusqlite::params![
            row.person_id,
            row.tenant_id,
            row.full_name,
            row.names,
            row.demographics,
            row.contact_info,
            row.attributes,
            row.nationality,
            row.current_status,
            row.current_status_notes,
            row.current_visa_type,
            row.visa_expiry_date,
            row.smarthr_crew_id,
            row.smarthr_synced_at,
            row.slack_hr_list_id,
            row.created_at,
            row.updated_at,
            row.deleted_at,
          ],
        )?;
        tx.commit()?;

        Ok(Upserted { outcome, record })
      })
      .await?;

    Ok(upserted)
  }

  async fn find_person_by_name(&self, tenant_id: Uuid, full_name: String) -> Result<Option<Person>> {
    let tenant_str = encode_uuid(tenant_id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PERSON_COLUMNS} FROM people
               WHERE tenant_id = ?1 AND full_name = ?2 AND deleted_at IS NULL"
            ),
            rusqlite::params![tenant_str, full_name],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn get_person(&self, person_id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(person_id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM people WHERE person_id = ?1"),
            rusqlite::params![id_str],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_people(&self, tenant_id: Uuid) -> Result<Vec<Person>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM people
           WHERE tenant_id = ?1 AND deleted_at IS NULL
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  // ── Visa cases ────────────────────────────────────────────────────────────

  async fn find_visa_case(&self, key: CaseKey) -> Result<Option<VisaCase>> {
    let tenant_str   = encode_uuid(key.tenant_id);
    let person_str   = encode_uuid(key.person_id);
    let type_str     = key.case_type.as_ref().to_owned();
    let deadline_str = key.deadline.map(encode_date);

    let raw: Option<RawVisaCase> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {CASE_COLUMNS} FROM visa_cases
               WHERE tenant_id = ?1 AND person_id = ?2 AND case_type = ?3
                 AND IFNULL(deadline, '') = IFNULL(?4, '')"
            ),
            rusqlite::params![tenant_str, person_str, type_str, deadline_str],
            RawVisaCase::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVisaCase::into_case).transpose()
  }

  async fn insert_visa_case(&self, input: NewVisaCase) -> Result<Option<VisaCase>> {
    let case = VisaCase {
      case_id:          Uuid::new_v4(),
      tenant_id:        input.tenant_id,
      person_id:        input.person_id,
      client_org_id:    input.client_org_id,
      client_name_raw:  input.client_name_raw,
      case_type:        input.case_type,
      target_visa_type: input.target_visa_type,
      deadline:         input.deadline,
      status_tags:      input.status_tags,
      priority:         input.priority,
      is_completed:     input.is_completed,
      created_at:       now(),
    };
    let row = RawVisaCase::encode(&case)?;

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!(
            "INSERT INTO visa_cases ({CASE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT DO NOTHING"
          ),
          rusqlite::params![
            row.case_id,
            row.tenant_id,
            row.person_id,
            row.client_org_id,
            row.client_name_raw,
            row.case_type,
            row.target_visa_type,
            row.deadline,
            row.status_tags,
            row.priority,
            row.is_completed,
            row.created_at,
          ],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(case))
  }

  async fn list_visa_cases(&self, tenant_id: Uuid) -> Result<Vec<VisaCase>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawVisaCase> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CASE_COLUMNS} FROM visa_cases
           WHERE tenant_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], RawVisaCase::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVisaCase::into_case).collect()
  }
}
