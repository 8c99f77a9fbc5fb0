//! Person imports from the staff roster and from the HR export.
//!
//! Both dialects upsert against `(tenant, full name)`, so a worker listed in
//! either file converges on one record. The roster carries status, visa and
//! document columns; the HR export carries identity and employment details
//! only, and never touches status fields.

use std::sync::Arc;

use chrono::Utc;
use roster_core::{
  merge::{JsonMap, into_map},
  person::{Linkage, PersonUpsert, StatusFields},
  store::{RosterStore, UpsertOutcome},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  mapping::{FieldMapper, MappingTables},
  org::OrganizationResolver,
  row::CsvRow,
  run::{RowHandler, RowOutcome},
};

/// Staff roster columns.
mod roster {
  pub const NAME: &str = "名前";
  pub const COMPANY: &str = "受入れ企業";
  pub const NATIONALITY: &str = "国籍";
  pub const CURRENT_VISA: &str = "現在の在留資格";
  pub const EXPIRY: &str = "期限日";
  pub const STATUS: &str = "現在の状況";
  pub const APPLICATION_VISA: &str = "申請の在留資格";
  pub const VISA_CATEGORY: &str = "ビザ種類";
  pub const GENDER: &str = "性別";
  pub const EMAIL: &str = "メールアドレス";
  pub const RETIREMENT_NOTICE: &str = "随時届け（退職）";
  pub const ADDRESS: &str = "最新年度の住所";
  pub const APPLICATION_STATUS: &str = "申請状況";
  pub const APPLICATION_MEMO: &str = "申請状況(メモ)";
  pub const TAX_MAIL_DATE: &str = "課税・納税証明書申請の郵送日";
  pub const HEALTH_CHECK_DATE: &str = "健康診断受診日";
  pub const COMPLETED: &str = "完了済み";
  pub const ASSIGNED_STAFF: &str = "担当者";
  pub const INSURANCE_DATE: &str = "社保資格取得日";

  /// Document columns and the key each is stored under.
  pub const DOCUMENTS: [(&str, &str); 8] = [
    ("在留カード", "residence_card"),
    ("顔写真", "photo"),
    ("マイナンバー", "mynumber"),
    ("運転免許", "driving_license"),
    ("健康診断", "health_check"),
    ("納税課税証明書", "tax_certificate"),
    ("源泉徴収票", "withholding_slip"),
    ("申請完了PDF", "application_pdf"),
  ];
}

/// HR export columns.
mod smarthr {
  pub const EMPLOYEE_NUMBER: &str = "社員番号";
  pub const LAST_NAME: &str = "姓";
  pub const FIRST_NAME: &str = "名";
  pub const DEPARTMENT: &str = "部署1 部署";
  pub const POSITION: &str = "役職1 役職";
  pub const EMPLOYMENT_TYPE: &str = "雇用形態";
  pub const HIRE_DATE: &str = "入社年月日";
  pub const BIRTH_DATE: &str = "生年月日";
}

/// Which export a [`PersonUpsertEngine`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonSource {
  StaffRoster,
  SmartHr,
}

/// Builds a person from one row and upserts it.
pub struct PersonUpsertEngine<S> {
  store:    Arc<S>,
  mapper:   FieldMapper,
  resolver: OrganizationResolver<S>,
  source:   PersonSource,
}

impl<S: RosterStore> PersonUpsertEngine<S> {
  pub fn new(store: Arc<S>, tables: Arc<MappingTables>, source: PersonSource) -> Self {
    Self {
      resolver: OrganizationResolver::new(Arc::clone(&store), Arc::clone(&tables)),
      mapper: FieldMapper::new(tables),
      store,
      source,
    }
  }

  pub fn staff_roster(store: Arc<S>, tables: Arc<MappingTables>) -> Self {
    Self::new(store, tables, PersonSource::StaffRoster)
  }

  pub fn smarthr(store: Arc<S>, tables: Arc<MappingTables>) -> Self {
    Self::new(store, tables, PersonSource::SmartHr)
  }

  /// Upsert the person a row describes. A row without a name is skipped.
  pub async fn upsert_from_row(&self, tenant_id: Uuid, row: &CsvRow) -> Result<RowOutcome, S::Error> {
    let input = match self.source {
      PersonSource::StaffRoster => self.roster_upsert(tenant_id, row).await?,
      PersonSource::SmartHr => smarthr_upsert(tenant_id, row, &self.mapper)?,
    };
    let Some(input) = input else {
      return Ok(RowOutcome::Skipped);
    };

    let upserted = self
      .store
      .upsert_person(input)
      .await
      .map_err(Error::Store)?;
    Ok(match upserted.outcome {
      UpsertOutcome::Created => RowOutcome::Created,
      UpsertOutcome::Merged => RowOutcome::Merged,
    })
  }

  async fn roster_upsert(&self, tenant_id: Uuid, row: &CsvRow) -> Result<Option<PersonUpsert>, S::Error> {
    use self::roster as col;

    let Some(full_name) = row.text(col::NAME) else {
      return Ok(None);
    };

    let [visa_expiry, health_check_date, insurance_date, tax_mail_date] = row.dates([
      col::EXPIRY,
      col::HEALTH_CHECK_DATE,
      col::INSURANCE_DATE,
      col::TAX_MAIL_DATE,
    ])?;

    let m = &self.mapper;
    let nationality = m.nationality(row.text(col::NATIONALITY));
    let (current_status, status_tags) = m.status(row.text(col::STATUS));
    let current_visa_type = m.visa_type(row.text(col::CURRENT_VISA));
    let application_visa_type = m.visa_type(row.text(col::APPLICATION_VISA));
    let visa_category = m.visa_category(row.text(col::VISA_CATEGORY));

    let companies = row.list(col::COMPANY);
    let mut org_ids = Vec::with_capacity(companies.len());
    for company in &companies {
      if let Some(org_id) = self.resolver.resolve(company, tenant_id).await? {
        if !org_ids.contains(&org_id) {
          org_ids.push(org_id);
        }
      }
    }

    let mut names = into_map(json!({ "full_name": full_name }));
    if let Some(gender) = row.text(col::GENDER) {
      names.insert("gender".into(), gender.into());
    }

    let demographics = into_map(json!({ "nationality": nationality }));

    let mut contact_info = JsonMap::new();
    if let Some(email) = row.text(col::EMAIL) {
      contact_info.insert("email".into(), email.into());
    }
    if let Some(address) = row.text(col::ADDRESS) {
      contact_info.insert("address".into(), address.into());
    }

    let documents: JsonMap = col::DOCUMENTS
      .iter()
      .map(|(column, key)| ((*key).to_owned(), json!(file_ids(row, column))))
      .collect();
    let attributes = into_map(json!({ "documents": documents }));

    let status_notes = json!({
      "status": row.text(col::APPLICATION_STATUS).unwrap_or_default(),
      "memo": row.text(col::APPLICATION_MEMO).unwrap_or_default(),
      "is_completed": row.flag(col::COMPLETED),
      "is_retired_notification": row.flag(col::RETIREMENT_NOTICE),
      "status_tags": status_tags,
      "visa_category": visa_category,
      "application_visa_type": application_visa_type,
      "tax_mail_date": tax_mail_date,
      "health_check_date": health_check_date,
      "insurance_start_date": insurance_date,
      "assigned_staff": row.text(col::ASSIGNED_STAFF).unwrap_or_default(),
      "companies": companies,
      "org_ids": org_ids,
    });

    Ok(Some(PersonUpsert {
      tenant_id,
      full_name: full_name.to_owned(),
      names,
      demographics,
      contact_info,
      attributes,
      status: Some(StatusFields {
        current_status,
        status_notes: Some(status_notes),
        nationality,
        current_visa_type,
        visa_expiry_date: visa_expiry,
      }),
      links: Linkage {
        // Provisional until the chat workspace export carries real ids.
        slack_hr_list_id: Some(format!("slack_row_{}", row.number)),
        ..Linkage::default()
      },
    }))
  }
}

fn smarthr_upsert<E: roster_core::store::StoreError>(
  tenant_id: Uuid,
  row: &CsvRow,
  mapper: &FieldMapper,
) -> Result<Option<PersonUpsert>, E> {
  use self::smarthr as col;

  let last_name = name_part(row, col::LAST_NAME);
  let first_name = name_part(row, col::FIRST_NAME);
  let Some(full_name) = join_name(&last_name, &first_name) else {
    return Ok(None);
  };

  let [hire_date, birth_date] = row
    .dates([col::HIRE_DATE, col::BIRTH_DATE])
    .map_err(Error::MalformedDates)?;

  let department = row.text(col::DEPARTMENT);
  let employment_raw = row.text(col::EMPLOYMENT_TYPE);

  let names = into_map(json!({
    "full_name": full_name,
    "last_name": last_name,
    "first_name": first_name,
  }));

  let mut demographics = JsonMap::new();
  if let Some(birth_date) = birth_date {
    demographics.insert("birth_date".into(), json!(birth_date));
  }

  let attributes = into_map(json!({
    "smarthr": {
      "department": department.unwrap_or_default(),
      "position": row.text(col::POSITION).unwrap_or_default(),
      "employment_type_raw": employment_raw.unwrap_or_default(),
      "employment_type": mapper.employment_type(employment_raw),
      "business_division": mapper.department(department),
      "hire_date": hire_date,
    }
  }));

  Ok(Some(PersonUpsert {
    tenant_id,
    full_name,
    names,
    demographics,
    contact_info: JsonMap::new(),
    attributes,
    status: None,
    links: Linkage {
      smarthr_crew_id:   row.text(col::EMPLOYEE_NUMBER).map(str::to_owned),
      smarthr_synced_at: Some(Utc::now()),
      slack_hr_list_id:  None,
    },
  }))
}

/// `"last first"`, or whichever part is present.
fn join_name(last: &str, first: &str) -> Option<String> {
  match (last.is_empty(), first.is_empty()) {
    (false, false) => Some(format!("{last} {first}")),
    (false, true) => Some(last.to_owned()),
    (true, false) => Some(first.to_owned()),
    (true, true) => None,
  }
}

/// A name cell with full-width spaces folded to ASCII spaces.
fn name_part(row: &CsvRow, column: &str) -> String {
  row
    .text(column)
    .map(|s| s.replace('\u{3000}', " ").trim().to_owned())
    .unwrap_or_default()
}

/// Document references: chat file ids, which always start with `F`.
fn file_ids(row: &CsvRow, column: &str) -> Vec<String> {
  row
    .list(column)
    .into_iter()
    .filter(|id| id.starts_with('F'))
    .collect()
}

impl<S: RosterStore> RowHandler for PersonUpsertEngine<S> {
  type Store = S;

  async fn handle(&self, tenant_id: Uuid, row: &CsvRow) -> Result<RowOutcome, S::Error> {
    self.upsert_from_row(tenant_id, row).await
  }

  fn identify(&self, row: &CsvRow) -> Option<String> {
    match self.source {
      PersonSource::StaffRoster => row.text(roster::NAME).map(str::to_owned),
      PersonSource::SmartHr => join_name(
        &name_part(row, smarthr::LAST_NAME),
        &name_part(row, smarthr::FIRST_NAME),
      ),
    }
  }
}
