//! End-to-end import runs against an in-memory SQLite store.

use std::sync::Arc;

use roster_core::{
  organization::{AliasSource, NewOrganization},
  person::PersonStatus,
  store::RosterStore,
  visa::CaseType,
};
use roster_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{
  CaseUpsertEngine, Error, MappingTables, OrganizationResolver, PersonUpsertEngine, run,
  mapping::MappingTable,
};

struct Fixture {
  store:  Arc<SqliteStore>,
  tables: Arc<MappingTables>,
  tenant: Uuid,
}

async fn fixture_with(tables: MappingTables) -> Fixture {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  let tenant = store.ensure_tenant("acme".into()).await.unwrap().tenant_id;
  Fixture {
    store: Arc::new(store),
    tables: Arc::new(tables),
    tenant,
  }
}

async fn fixture() -> Fixture { fixture_with(MappingTables::default()).await }

impl Fixture {
  fn roster(&self) -> PersonUpsertEngine<SqliteStore> {
    PersonUpsertEngine::staff_roster(Arc::clone(&self.store), Arc::clone(&self.tables))
  }

  fn smarthr(&self) -> PersonUpsertEngine<SqliteStore> {
    PersonUpsertEngine::smarthr(Arc::clone(&self.store), Arc::clone(&self.tables))
  }

  fn cases(&self) -> CaseUpsertEngine<SqliteStore> {
    CaseUpsertEngine::new(Arc::clone(&self.store), Arc::clone(&self.tables))
  }

  fn resolver(&self) -> OrganizationResolver<SqliteStore> {
    OrganizationResolver::new(Arc::clone(&self.store), Arc::clone(&self.tables))
  }
}

const ROSTER: &str = "\
名前,受入れ企業,国籍,現在の在留資格,期限日,現在の状況
NGUYEN VAN A,派遣-スグクル(株),ベトナム,特定技能1号,2026/05/01,申請中
TRAN THI B,スグクル(株)-委託,ベトナム,特定技能１号,2026-06-30,\"監理・管理中,要確認\"
SITI C,\"片平-派遣, (有)片平農産\",インドネシア,技能実習2号,,退職予定
";

// ─── Person imports ──────────────────────────────────────────────────────────

#[tokio::test]
async fn roster_import_is_idempotent() {
  let f = fixture().await;

  let first = run(ROSTER, f.tenant, &f.roster()).await.unwrap();
  assert_eq!(first.success_count, 3);
  assert_eq!(first.update_count, 0);
  assert!(first.errors.is_empty());

  let second = run(ROSTER, f.tenant, &f.roster()).await.unwrap();
  assert_eq!(second.success_count, 0);
  assert_eq!(second.update_count, 3);
  assert_eq!(second.total_processed, 3);

  assert_eq!(f.store.list_people(f.tenant).await.unwrap().len(), 3);
  assert_eq!(f.store.list_organizations(f.tenant).await.unwrap().len(), 2);
}

#[tokio::test]
async fn roster_row_maps_status_and_visa_fields() {
  let f = fixture().await;
  run(ROSTER, f.tenant, &f.roster()).await.unwrap();

  let b = f
    .store
    .find_person_by_name(f.tenant, "TRAN THI B".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(b.current_status, PersonStatus::Monitoring);
  assert_eq!(b.visa_expiry_date.map(|d| d.to_string()).as_deref(), Some("2026-06-30"));
  assert_eq!(b.slack_hr_list_id.as_deref(), Some("slack_row_2"));

  let notes = b.current_status_notes.unwrap();
  assert_eq!(notes["status_tags"], serde_json::json!(["要確認"]));
  assert_eq!(notes["org_ids"].as_array().map(Vec::len), Some(1));

  let c = f
    .store
    .find_person_by_name(f.tenant, "SITI C".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(c.current_status, PersonStatus::ResignedPlanned);
  assert_eq!(c.visa_expiry_date, None);
}

#[tokio::test]
async fn spellings_of_one_company_converge_on_one_organization() {
  let f = fixture().await;
  run(ROSTER, f.tenant, &f.roster()).await.unwrap();

  let org = f
    .store
    .find_organization_by_name(f.tenant, "スグクル株式会社".into())
    .await
    .unwrap()
    .expect("canonical organization");

  let alias = f.store.find_alias("派遣-スグクル(株)".into()).await.unwrap().unwrap();
  assert_eq!(alias.org_id, org.org_id);
  assert_eq!(alias.source, AliasSource::AutoGenerated);

  for name in ["NGUYEN VAN A", "TRAN THI B"] {
    let person = f
      .store
      .find_person_by_name(f.tenant, name.into())
      .await
      .unwrap()
      .unwrap();
    let notes = person.current_status_notes.unwrap();
    assert_eq!(notes["org_ids"], serde_json::json!([org.org_id]));
  }
}

#[tokio::test]
async fn spellings_converge_without_curated_aliases() {
  let tables = MappingTables {
    known_aliases: MappingTable::default(),
    ..MappingTables::default()
  };
  let f = fixture_with(tables).await;

  let csv = "名前,受入れ企業\nA,スグクル(株)-委託\nB,スグクル(株)\nC,派遣-スグクル(株)\n";
  let summary = run(csv, f.tenant, &f.roster()).await.unwrap();
  assert_eq!(summary.success_count, 3);

  let orgs = f.store.list_organizations(f.tenant).await.unwrap();
  assert_eq!(orgs.len(), 1);
  assert_eq!(orgs[0].name, "スグクル(株)");
}

#[tokio::test]
async fn spellings_converge_in_every_order() {
  const SPELLINGS: [&str; 3] = ["派遣-スグクル(株)", "スグクル(株)-委託", "スグクル(株)"];
  const ORDERS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
  ];

  for curated in [true, false] {
    for order in ORDERS {
      let tables = if curated {
        MappingTables::default()
      } else {
        MappingTables {
          known_aliases: MappingTable::default(),
          ..MappingTables::default()
        }
      };
      let f = fixture_with(tables).await;

      let mut csv = String::from("名前,受入れ企業\n");
      for (n, &i) in order.iter().enumerate() {
        csv.push_str(&format!("P{n},{}\n", SPELLINGS[i]));
      }
      let summary = run(&csv, f.tenant, &f.roster()).await.unwrap();
      assert_eq!(summary.success_count, 3, "order {order:?}, curated {curated}");

      let orgs = f.store.list_organizations(f.tenant).await.unwrap();
      assert_eq!(orgs.len(), 1, "order {order:?}, curated {curated}");

      for spelling in SPELLINGS {
        let resolved = f.resolver().resolve(spelling, f.tenant).await.unwrap();
        assert_eq!(resolved, Some(orgs[0].org_id), "{spelling} in order {order:?}");
      }
    }
  }
}

#[tokio::test]
async fn multiple_companies_resolving_alike_are_linked_once() {
  let f = fixture().await;
  run(ROSTER, f.tenant, &f.roster()).await.unwrap();

  let c = f
    .store
    .find_person_by_name(f.tenant, "SITI C".into())
    .await
    .unwrap()
    .unwrap();
  let notes = c.current_status_notes.unwrap();
  assert_eq!(notes["companies"].as_array().map(Vec::len), Some(2));
  assert_eq!(notes["org_ids"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn malformed_row_does_not_stop_the_run() {
  let f = fixture().await;
  let csv = "\
名前,期限日
A,2026/01/01
B,2026/02/01
C,not a date
D,2026/04/01
E,
";
  let summary = run(csv, f.tenant, &f.roster()).await.unwrap();

  assert_eq!(summary.success_count, 4);
  assert_eq!(summary.skip_count, 1);
  assert_eq!(summary.total_processed, 5);
  assert_eq!(summary.errors.len(), 1);
  assert!(summary.errors[0].starts_with("Row 3 (C):"), "{}", summary.errors[0]);
  assert_eq!(f.store.list_people(f.tenant).await.unwrap().len(), 4);
}

#[tokio::test]
async fn rows_without_a_name_are_skipped() {
  let f = fixture().await;
  let csv = "名前,国籍\n,ベトナム\n  ,ネパール\nA,ネパール\n";
  let summary = run(csv, f.tenant, &f.roster()).await.unwrap();

  assert_eq!(summary.success_count, 1);
  assert_eq!(summary.skip_count, 2);
  assert!(summary.errors.is_empty());
}

#[tokio::test]
async fn hr_then_roster_keeps_crew_id_and_identity() {
  let f = fixture().await;
  let hr = "\u{feff}社員番号,姓,名,生年月日,雇用形態\nE100,NGUYEN,VAN A,1999/01/02,派遣社員\n";

  let first = run(hr, f.tenant, &f.smarthr()).await.unwrap();
  assert_eq!(first.success_count, 1);

  let second = run(ROSTER, f.tenant, &f.roster()).await.unwrap();
  assert_eq!(second.update_count, 1);
  assert_eq!(second.success_count, 2);

  let a = f
    .store
    .find_person_by_name(f.tenant, "NGUYEN VAN A".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(a.smarthr_crew_id.as_deref(), Some("E100"));
  assert!(a.smarthr_synced_at.is_some());
  assert_eq!(a.demographics["birth_date"], "1999-01-02");
  assert_eq!(a.demographics["nationality"], "vietnam");
  assert_eq!(a.names["last_name"], "NGUYEN");
  assert_eq!(a.attributes["smarthr"]["employment_type"], "dispatch");
  assert_eq!(a.current_status, PersonStatus::Applying);
}

#[tokio::test]
async fn hr_import_folds_full_width_spaces() {
  let f = fixture().await;
  let hr = "\u{feff}社員番号,姓,名\nE7,グエン,ヴァン\u{3000}アン\n";
  run(hr, f.tenant, &f.smarthr()).await.unwrap();

  let person = f
    .store
    .find_person_by_name(f.tenant, "グエン ヴァン アン".into())
    .await
    .unwrap();
  assert_eq!(person.and_then(|p| p.smarthr_crew_id).as_deref(), Some("E7"));
}

// ─── Visa cases ──────────────────────────────────────────────────────────────

const CASES: &str = "\
名前,受入れ企業,申請種類,期限日,優先度,作成状況,完了済み,申請の在留資格
NGUYEN VAN A,派遣-スグクル(株),更新-派遣,2026/04/15,9,\"書類待ち,確認中\",false,特定技能1号
TRAN THI B,,新規-派遣,,,,TRUE,
";

#[tokio::test]
async fn visa_cases_are_created_once() {
  let f = fixture().await;
  run(ROSTER, f.tenant, &f.roster()).await.unwrap();

  let first = run(CASES, f.tenant, &f.cases()).await.unwrap();
  assert_eq!(first.success_count, 2);
  assert!(first.errors.is_empty());

  let second = run(CASES, f.tenant, &f.cases()).await.unwrap();
  assert_eq!(second.success_count, 0);
  assert_eq!(second.skip_count, 2);

  let cases = f.store.list_visa_cases(f.tenant).await.unwrap();
  assert_eq!(cases.len(), 2);

  let renewal = &cases[0];
  assert_eq!(renewal.case_type, CaseType::RenewalDispatch);
  assert_eq!(renewal.priority.get(), 5);
  assert_eq!(renewal.status_tags, vec!["書類待ち".to_owned(), "確認中".to_owned()]);
  assert!(!renewal.is_completed);
  assert_eq!(renewal.client_name_raw.as_deref(), Some("派遣-スグクル(株)"));
  assert!(renewal.client_org_id.is_some());

  let fresh = &cases[1];
  assert_eq!(fresh.case_type, CaseType::NewDispatch);
  assert_eq!(fresh.priority.get(), 2);
  assert_eq!(fresh.deadline, None);
  assert_eq!(fresh.client_org_id, None);
  assert_eq!(fresh.target_visa_type, None);
  assert!(fresh.is_completed);
}

#[tokio::test]
async fn unparseable_deadline_is_stored_as_unknown() {
  let f = fixture().await;
  run(ROSTER, f.tenant, &f.roster()).await.unwrap();

  let csv = "名前,申請種類,期限日\nNGUYEN VAN A,更新-派遣,未定\n";
  let summary = run(csv, f.tenant, &f.cases()).await.unwrap();
  assert_eq!(summary.success_count, 1);
  assert!(summary.errors.is_empty(), "{:?}", summary.errors);

  let cases = f.store.list_visa_cases(f.tenant).await.unwrap();
  assert_eq!(cases.len(), 1);
  assert_eq!(cases[0].deadline, None);
  assert_eq!(cases[0].case_type, CaseType::RenewalDispatch);
}

#[tokio::test]
async fn unknown_person_is_reported_before_the_deadline() {
  let f = fixture().await;
  let csv = "名前,申請種類,期限日\nNOBODY,更新-派遣,未定\n";
  let summary = run(csv, f.tenant, &f.cases()).await.unwrap();

  assert_eq!(summary.errors, vec!["Row 1 (NOBODY): Person not found: NOBODY".to_owned()]);
}

#[tokio::test]
async fn case_for_unknown_person_is_a_row_error() {
  let f = fixture().await;
  let csv = "名前,申請種類\nNOBODY,更新-派遣\n,更新-派遣\n";
  let summary = run(csv, f.tenant, &f.cases()).await.unwrap();

  assert_eq!(summary.skip_count, 2);
  assert_eq!(summary.errors.len(), 1);
  assert!(summary.errors[0].contains("Person not found: NOBODY"));
  assert!(f.store.list_visa_cases(f.tenant).await.unwrap().is_empty());
}

// ─── Organization resolution ─────────────────────────────────────────────────

#[tokio::test]
async fn unknown_company_is_created_for_review() {
  let f = fixture().await;
  let resolver = f.resolver();

  let id = resolver
    .resolve("新口農園-派遣", f.tenant)
    .await
    .unwrap()
    .unwrap();
  let org = f.store.get_organization(id).await.unwrap().unwrap();

  assert_eq!(org.name, "新口農園");
  assert!(org.settings.imported);
  assert!(org.settings.needs_review);
  assert_eq!(org.settings.original_input.as_deref(), Some("新口農園-派遣"));

  let again = resolver.resolve("新口農園", f.tenant).await.unwrap();
  assert_eq!(again, Some(id));
  assert!(resolver.resolve("  ", f.tenant).await.unwrap().is_none());
}

#[tokio::test]
async fn substring_match_is_remembered_as_alias() {
  let f = fixture().await;
  let org = f
    .store
    .create_organization(NewOrganization::auto_created(f.tenant, "ABC物流株式会社", "seed"))
    .await
    .unwrap();

  let id = f.resolver().resolve("派遣-ABC物流", f.tenant).await.unwrap();
  assert_eq!(id, Some(org.org_id));

  let alias = f.store.find_alias("派遣-ABC物流".into()).await.unwrap().unwrap();
  assert_eq!(alias.org_id, org.org_id);
  assert_eq!(alias.source, AliasSource::PartialMatch);
  assert_eq!(f.store.list_organizations(f.tenant).await.unwrap().len(), 1);
}

#[tokio::test]
async fn manual_alias_registration() {
  let f = fixture().await;
  let resolver = f.resolver();
  let org = f
    .store
    .create_organization(NewOrganization::auto_created(f.tenant, "(株)芝原", "(株)芝原"))
    .await
    .unwrap();

  assert!(resolver.register_alias(org.org_id, "シバハラ").await.unwrap());
  assert!(!resolver.register_alias(org.org_id, "シバハラ").await.unwrap());
  assert!(!resolver.register_alias(org.org_id, " ").await.unwrap());

  let aliases = f.store.list_aliases(org.org_id).await.unwrap();
  assert_eq!(aliases.len(), 1);
  assert_eq!(aliases[0].source, AliasSource::Manual);

  assert_eq!(resolver.resolve("シバハラ", f.tenant).await.unwrap(), Some(org.org_id));

  let missing = resolver.register_alias(Uuid::new_v4(), "x").await;
  assert!(matches!(missing, Err(Error::OrganizationNotFound(_))));
}
