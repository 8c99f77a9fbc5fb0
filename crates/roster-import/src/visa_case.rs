//! Visa-case imports.
//!
//! A case row annotates an existing person; it never creates one. The client
//! company, on the other hand, is resolved with auto-creation like anywhere
//! else.

use std::sync::Arc;

use roster_core::{
  store::RosterStore,
  visa::{NewVisaCase, Priority},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
  date,
  error::{Error, Result},
  mapping::{FieldMapper, MappingTables},
  org::OrganizationResolver,
  row::CsvRow,
  run::{RowHandler, RowOutcome},
};

const NAME: &str = "名前";
const ACCEPTING_COMPANY: &str = "受入れ企業";
const COMPANY_NAME: &str = "会社名";
const APPLICATION_TYPE: &str = "申請種類";
const DEADLINE: &str = "期限日";
const COMPLETED: &str = "完了済み";
const PRIORITY: &str = "優先度";
const CREATION_STATUS: &str = "作成状況";
const TARGET_VISA: &str = "申請の在留資格";

pub struct CaseUpsertEngine<S> {
  store:    Arc<S>,
  mapper:   FieldMapper,
  resolver: OrganizationResolver<S>,
}

impl<S: RosterStore> CaseUpsertEngine<S> {
  pub fn new(store: Arc<S>, tables: Arc<MappingTables>) -> Self {
    Self {
      resolver: OrganizationResolver::new(Arc::clone(&store), Arc::clone(&tables)),
      mapper: FieldMapper::new(tables),
      store,
    }
  }

  /// Insert the case a row describes unless its `(person, case type,
  /// deadline)` key is already taken.
  pub async fn upsert_visa_case(&self, tenant_id: Uuid, row: &CsvRow) -> Result<RowOutcome, S::Error> {
    let Some(name) = row.text(NAME) else {
      return Ok(RowOutcome::Skipped);
    };

    let person = self
      .store
      .find_person_by_name(tenant_id, name.to_owned())
      .await
      .map_err(Error::Store)?
      .ok_or_else(|| Error::PersonNotFound(name.to_owned()))?;

    // An unparseable deadline (`未定` and the like) is just unknown.
    let deadline = row.text(DEADLINE).and_then(date::parse);

    let client_name_raw = row.text(ACCEPTING_COMPANY).or_else(|| row.text(COMPANY_NAME));
    let client_org_id = match client_name_raw {
      Some(raw) => self.resolver.resolve(raw, tenant_id).await?,
      None => None,
    };

    let input = NewVisaCase {
      tenant_id,
      person_id: person.person_id,
      client_org_id,
      client_name_raw: client_name_raw.map(str::to_owned),
      case_type: self.mapper.case_type(row.text(APPLICATION_TYPE)),
      target_visa_type: row
        .text(TARGET_VISA)
        .map(|raw| self.mapper.visa_type(Some(raw))),
      deadline,
      status_tags: row.list(CREATION_STATUS),
      priority: Priority::parse(row.text(PRIORITY)),
      is_completed: row.flag(COMPLETED),
    };

    let existing = self
      .store
      .find_visa_case(input.key())
      .await
      .map_err(Error::Store)?;
    if existing.is_some() {
      debug!(person = name, case_type = %input.case_type, "case already recorded");
      return Ok(RowOutcome::Skipped);
    }

    let inserted = self
      .store
      .insert_visa_case(input)
      .await
      .map_err(Error::Store)?;
    Ok(match inserted {
      Some(_) => RowOutcome::Created,
      None => RowOutcome::Skipped,
    })
  }
}

impl<S: RosterStore> RowHandler for CaseUpsertEngine<S> {
  type Store = S;

  async fn handle(&self, tenant_id: Uuid, row: &CsvRow) -> Result<RowOutcome, S::Error> {
    self.upsert_visa_case(tenant_id, row).await
  }

  fn identify(&self, row: &CsvRow) -> Option<String> { row.text(NAME).map(str::to_owned) }
}
