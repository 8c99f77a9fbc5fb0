//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use roster_core::{
  merge::{JsonMap, into_map},
  organization::{AliasSource, NewAlias, NewOrganization},
  person::{Linkage, Nationality, PersonStatus, PersonUpsert, StatusFields},
  store::{RosterStore, UpsertOutcome},
  visa::{CaseType, NewVisaCase, Priority, VisaType},
};
use serde_json::json;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn tenant(s: &SqliteStore) -> Uuid {
  s.ensure_tenant("acme".into()).await.unwrap().tenant_id
}

// ─── Tenants ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_tenant_is_idempotent() {
  let s = store().await;
  let a = s.ensure_tenant("acme".into()).await.unwrap();
  let b = s.ensure_tenant("acme".into()).await.unwrap();
  let c = s.ensure_tenant("other".into()).await.unwrap();

  assert_eq!(a.tenant_id, b.tenant_id);
  assert_ne!(a.tenant_id, c.tenant_id);
}

// ─── Organizations ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_organization_returns_existing_on_name_clash() {
  let s = store().await;
  let t = tenant(&s).await;

  let first = s
    .create_organization(NewOrganization::auto_created(t, "新口農園", "新口農園-派遣"))
    .await
    .unwrap();
  let second = s
    .create_organization(NewOrganization::auto_created(t, "新口農園", "新口農園"))
    .await
    .unwrap();

  assert_eq!(first.org_id, second.org_id);
  assert_eq!(second.settings.original_input.as_deref(), Some("新口農園-派遣"));
  assert!(second.settings.needs_review);
  assert_eq!(s.list_organizations(t).await.unwrap().len(), 1);
}

#[tokio::test]
async fn find_organization_by_exact_name() {
  let s = store().await;
  let t = tenant(&s).await;
  let org = s
    .create_organization(NewOrganization::auto_created(t, "ABC物流", "ABC物流"))
    .await
    .unwrap();

  let hit = s.find_organization_by_name(t, "ABC物流".into()).await.unwrap();
  assert_eq!(hit.map(|o| o.org_id), Some(org.org_id));

  let miss = s.find_organization_by_name(t, "ABC".into()).await.unwrap();
  assert!(miss.is_none());

  let other = s.ensure_tenant("other".into()).await.unwrap().tenant_id;
  let cross = s.find_organization_by_name(other, "ABC物流".into()).await.unwrap();
  assert!(cross.is_none());
}

#[tokio::test]
async fn substring_search_is_case_insensitive_and_oldest_first() {
  let s = store().await;
  let t = tenant(&s).await;
  let older = s
    .create_organization(NewOrganization::auto_created(t, "Tokyo Foods", "Tokyo Foods"))
    .await
    .unwrap();
  s.create_organization(NewOrganization::auto_created(t, "Tokyo Foods East", "x"))
    .await
    .unwrap();

  let hit = s.find_organization_containing(t, "tokyo food".into()).await.unwrap();
  assert_eq!(hit.map(|o| o.org_id), Some(older.org_id));

  let none = s.find_organization_containing(t, "osaka".into()).await.unwrap();
  assert!(none.is_none());
}

#[tokio::test]
async fn substring_search_folds_full_width_latin() {
  let s = store().await;
  let t = tenant(&s).await;
  let org = s
    .create_organization(NewOrganization::auto_created(t, "ＡＢＣ物流株式会社", "x"))
    .await
    .unwrap();

  let hit = s.find_organization_containing(t, "abc物流".into()).await.unwrap();
  assert_eq!(hit.map(|o| o.org_id), Some(org.org_id));

  let hit = s.find_organization_containing(t, "ａｂｃ".into()).await.unwrap();
  assert_eq!(hit.map(|o| o.org_id), Some(org.org_id));
}

#[tokio::test]
async fn get_organization_missing_returns_none() {
  let s = store().await;
  assert!(s.get_organization(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Aliases ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn alias_text_is_unique() {
  let s = store().await;
  let t = tenant(&s).await;
  let a = s
    .create_organization(NewOrganization::auto_created(t, "A社", "A社"))
    .await
    .unwrap();
  let b = s
    .create_organization(NewOrganization::auto_created(t, "B社", "B社"))
    .await
    .unwrap();

  let first = s
    .insert_alias(NewAlias {
      org_id:     a.org_id,
      alias_name: "エー".into(),
      source:     AliasSource::Manual,
    })
    .await
    .unwrap();
  assert!(first.is_some());

  let clash = s
    .insert_alias(NewAlias {
      org_id:     b.org_id,
      alias_name: "エー".into(),
      source:     AliasSource::PartialMatch,
    })
    .await
    .unwrap();
  assert!(clash.is_none());

  let found = s.find_alias("エー".into()).await.unwrap().unwrap();
  assert_eq!(found.org_id, a.org_id);
  assert_eq!(found.source, AliasSource::Manual);

  assert_eq!(s.list_aliases(a.org_id).await.unwrap().len(), 1);
  assert!(s.list_aliases(b.org_id).await.unwrap().is_empty());
}

// ─── People ──────────────────────────────────────────────────────────────────

fn hr_upsert(t: Uuid) -> PersonUpsert {
  PersonUpsert {
    tenant_id:    t,
    full_name:    "NGUYEN VAN A".into(),
    names:        into_map(json!({ "full_name": "NGUYEN VAN A", "last_name": "NGUYEN" })),
    demographics: into_map(json!({ "birth_date": "1999-01-02" })),
    contact_info: JsonMap::new(),
    attributes:   into_map(json!({ "smarthr": { "position": "staff" } })),
    status:       None,
    links:        Linkage {
      smarthr_crew_id: Some("E123".into()),
      ..Linkage::default()
    },
  }
}

fn roster_upsert(t: Uuid) -> PersonUpsert {
  PersonUpsert {
    tenant_id:    t,
    full_name:    "NGUYEN VAN A".into(),
    names:        into_map(json!({ "full_name": "NGUYEN VAN A" })),
    demographics: into_map(json!({ "nationality": "vietnam" })),
    contact_info: into_map(json!({ "email": "a@example.com" })),
    attributes:   JsonMap::new(),
    status:       Some(StatusFields {
      current_status:    PersonStatus::Received,
      status_notes:      Some(json!({ "memo": "ok" })),
      nationality:       Nationality::Vietnam,
      current_visa_type: VisaType::TokuteiGino1,
      visa_expiry_date:  NaiveDate::from_ymd_opt(2026, 5, 1),
    }),
    links:        Linkage {
      slack_hr_list_id: Some("slack_row_1".into()),
      ..Linkage::default()
    },
  }
}

#[tokio::test]
async fn upsert_creates_then_merges() {
  let s = store().await;
  let t = tenant(&s).await;

  let created = s.upsert_person(hr_upsert(t)).await.unwrap();
  assert_eq!(created.outcome, UpsertOutcome::Created);

  let merged = s.upsert_person(roster_upsert(t)).await.unwrap();
  assert_eq!(merged.outcome, UpsertOutcome::Merged);
  assert_eq!(merged.record.person_id, created.record.person_id);

  let stored = s.get_person(created.record.person_id).await.unwrap().unwrap();
  assert_eq!(stored, merged.record);
  assert_eq!(stored.smarthr_crew_id.as_deref(), Some("E123"));
  assert_eq!(stored.slack_hr_list_id.as_deref(), Some("slack_row_1"));
  assert_eq!(stored.current_status, PersonStatus::Received);
  assert_eq!(stored.current_status_notes, Some(json!({ "memo": "ok" })));
  assert_eq!(stored.names["last_name"], "NGUYEN");
  assert_eq!(stored.demographics["birth_date"], "1999-01-02");
  assert_eq!(stored.demographics["nationality"], "vietnam");
  assert_eq!(stored.created_at, created.record.created_at);

  assert_eq!(s.list_people(t).await.unwrap().len(), 1);
}

#[tokio::test]
async fn find_person_by_name_is_tenant_scoped() {
  let s = store().await;
  let t = tenant(&s).await;
  let other = s.ensure_tenant("other".into()).await.unwrap().tenant_id;
  s.upsert_person(hr_upsert(t)).await.unwrap();

  assert!(s.find_person_by_name(t, "NGUYEN VAN A".into()).await.unwrap().is_some());
  assert!(s.find_person_by_name(other, "NGUYEN VAN A".into()).await.unwrap().is_none());
}

// ─── Visa cases ──────────────────────────────────────────────────────────────

fn new_case(t: Uuid, person_id: Uuid, deadline: Option<NaiveDate>) -> NewVisaCase {
  NewVisaCase {
    tenant_id: t,
    person_id,
    client_org_id: None,
    client_name_raw: Some("ABC物流".into()),
    case_type: CaseType::RenewalDispatch,
    target_visa_type: Some(VisaType::TokuteiGino1),
    deadline,
    status_tags: vec!["書類待ち".into()],
    priority: Priority::clamped(9),
    is_completed: false,
  }
}

#[tokio::test]
async fn visa_case_is_deduplicated_on_key() {
  let s = store().await;
  let t = tenant(&s).await;
  let person = s.upsert_person(hr_upsert(t)).await.unwrap().record;
  let deadline = NaiveDate::from_ymd_opt(2026, 3, 31);

  let first = s.insert_visa_case(new_case(t, person.person_id, deadline)).await.unwrap();
  let first = first.expect("first insert");
  assert_eq!(first.priority.get(), 5);

  let dup = s.insert_visa_case(new_case(t, person.person_id, deadline)).await.unwrap();
  assert!(dup.is_none());

  let found = s.find_visa_case(new_case(t, person.person_id, deadline).key()).await.unwrap();
  assert_eq!(found, Some(first));

  let later = NaiveDate::from_ymd_opt(2026, 9, 30);
  let other = s.insert_visa_case(new_case(t, person.person_id, later)).await.unwrap();
  assert!(other.is_some());

  assert_eq!(s.list_visa_cases(t).await.unwrap().len(), 2);
}

#[tokio::test]
async fn missing_deadlines_compare_equal() {
  let s = store().await;
  let t = tenant(&s).await;
  let person = s.upsert_person(hr_upsert(t)).await.unwrap().record;

  let key = new_case(t, person.person_id, None).key();
  assert!(s.find_visa_case(key).await.unwrap().is_none());

  let first = s.insert_visa_case(new_case(t, person.person_id, None)).await.unwrap();
  assert!(first.is_some());
  let dup = s.insert_visa_case(new_case(t, person.person_id, None)).await.unwrap();
  assert!(dup.is_none());

  let found = s.find_visa_case(key).await.unwrap().unwrap();
  assert_eq!(found.deadline, None);
  assert_eq!(found.status_tags, vec!["書類待ち".to_owned()]);
}
