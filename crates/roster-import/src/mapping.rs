//! Free-text to code mapping.
//!
//! Spreadsheet cells are hand-edited, so a categorical value is looked up in
//! three steps: exact match on the normalised text, then the first table key
//! contained in it, then a caller-supplied default. Tables are ordered lists
//! rather than maps because the substring step resolves ties by position.
//!
//! [`MappingTables::default`] holds the curated tables the importers ship
//! with. A TOML file may replace any of them:
//!
//! ```toml
//! [nationality]
//! entries = [["ベトナム", "vietnam"], ["VN", "vietnam"]]
//! empty   = "other"
//! ```

use std::sync::Arc;

use roster_core::{
  organization::BusinessDivision,
  person::{EmploymentType, Nationality, PersonStatus},
  text::fold_width,
  visa::{CaseType, VisaType},
};
use serde::{Deserialize, Serialize};

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Trim, then fold full-width Latin letters and digits to ASCII.
pub fn normalize(raw: &str) -> String { fold_width(raw.trim()) }

// ─── MappingTable ────────────────────────────────────────────────────────────

/// An ordered lookup table from raw text to a code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingTable<T> {
  #[serde(default = "Vec::new")]
  pub entries: Vec<(String, T)>,
  /// Code for absent or blank input.
  #[serde(default = "Option::default")]
  pub empty:   Option<T>,
}

impl<T> Default for MappingTable<T> {
  fn default() -> Self {
    Self {
      entries: Vec::new(),
      empty:   None,
    }
  }
}

impl<T> MappingTable<T> {
  fn from_pairs(pairs: &[(&str, T)], empty: Option<T>) -> Self
  where
    T: Clone,
  {
    Self {
      entries: pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect(),
      empty,
    }
  }

  /// Exact lookup, no normalisation or fallback.
  pub fn exact(&self, key: &str) -> Option<&T> {
    self
      .entries
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v)
  }
}

impl<T: Clone> MappingTable<T> {
  /// Map a raw cell to a code. Never fails: anything unrecognised becomes
  /// `default`.
  pub fn map(&self, raw: Option<&str>, default: T) -> T {
    let normalized = raw.map(normalize).unwrap_or_default();
    if normalized.is_empty() {
      return self.empty.clone().unwrap_or(default);
    }
    if let Some(code) = self.exact(&normalized) {
      return code.clone();
    }
    self
      .entries
      .iter()
      .find(|(key, _)| !key.is_empty() && normalized.contains(key.as_str()))
      .map(|(_, code)| code.clone())
      .unwrap_or(default)
  }
}

// ─── MappingTables ───────────────────────────────────────────────────────────

/// Every table the importers consult. Loaded once and shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingTables {
  pub status:          MappingTable<PersonStatus>,
  pub nationality:     MappingTable<Nationality>,
  pub visa_type:       MappingTable<VisaType>,
  /// Roster "visa kind" column, which really names a line of business.
  pub visa_category:   MappingTable<BusinessDivision>,
  pub case_type:       MappingTable<CaseType>,
  pub employment_type: MappingTable<EmploymentType>,
  /// HR department to line of business.
  pub department:      MappingTable<BusinessDivision>,
  /// Curated spellings of client companies and their canonical names.
  pub known_aliases:   MappingTable<String>,
}

impl MappingTables {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> { toml::from_str(s) }
}

impl Default for MappingTables {
  fn default() -> Self {
    use BusinessDivision as B;
    use CaseType as C;
    use EmploymentType as E;
    use Nationality as N;
    use PersonStatus as P;
    use VisaType as V;

    Self {
      status:          MappingTable::from_pairs(
        &[
          ("監理・管理中", P::Monitoring),
          ("管理中", P::Monitoring),
          ("申請中", P::Applying),
          ("申請準備中", P::Preparing),
          ("受領登録完了", P::Received),
          ("失注", P::Lost),
          ("退職", P::Resigned),
          ("退職予定", P::ResignedPlanned),
          ("一時帰国中", P::Monitoring),
          ("海外待機", P::OverseasWaiting),
          ("入国待ち", P::OverseasWaiting),
          ("内定", P::Preparing),
          ("稼働中", P::Monitoring),
          ("休職中", P::Monitoring),
          ("審査完了メール有", P::Applying),
          ("随時届完了", P::Monitoring),
        ],
        Some(P::Monitoring),
      ),
      nationality:     MappingTable::from_pairs(
        &[
          ("ベトナム", N::Vietnam),
          ("VN", N::Vietnam),
          ("インドネシア", N::Indonesia),
          ("ID", N::Indonesia),
          ("フィリピン", N::Philippines),
          ("PH", N::Philippines),
          ("ミャンマー", N::Myanmar),
          ("MM", N::Myanmar),
          ("中国", N::China),
          ("CN", N::China),
          ("カンボジア", N::Cambodia),
          ("KH", N::Cambodia),
          ("ネパール", N::Nepal),
          ("NP", N::Nepal),
          ("タイ", N::Thailand),
          ("TH", N::Thailand),
          ("スリランカ", N::SriLanka),
          ("LK", N::SriLanka),
        ],
        Some(N::Other),
      ),
      visa_type:       MappingTable::from_pairs(
        &[
          ("特定技能1号", V::TokuteiGino1),
          ("特定技能１号", V::TokuteiGino1),
          ("特定技能2号", V::TokuteiGino2),
          ("特定技能２号", V::TokuteiGino2),
          ("特技1号更新", V::TokuteiGino1),
          ("特定技能1号更新", V::TokuteiGino1),
          ("技能実習1号", V::GinoJisshu1),
          ("技能実習１号", V::GinoJisshu1),
          ("技能実習1号ロ", V::GinoJisshu1),
          ("技能実習１号ロ", V::GinoJisshu1),
          ("技能実習2号", V::GinoJisshu2),
          ("技能実習２号", V::GinoJisshu2),
          ("技能実習2号ロ", V::GinoJisshu2),
          ("技能実習２号ロ", V::GinoJisshu2),
          ("技能実習3号", V::GinoJisshu3),
          ("技能実習３号", V::GinoJisshu3),
          ("技能実習", V::GinoJisshu1),
          ("特定活動", V::Tokkatsu),
          ("留学", V::Student),
          ("家族滞在", V::Dependent),
          ("永住者", V::PermanentResident),
          ("定住者", V::Other),
          ("日本人の配偶者等", V::Other),
          ("技術・人文知識・国際業務", V::EngineerSpecialist),
          ("海外待機", V::OverseasWaiting),
        ],
        Some(V::Other),
      ),
      visa_category:   MappingTable::from_pairs(
        &[
          ("農業派遣", B::Dispatch),
          ("畜産派遣", B::Dispatch),
          ("請負・受託", B::Subcontracting),
          ("直接雇用", B::Direct),
        ],
        Some(B::Dispatch),
      ),
      case_type:       MappingTable::from_pairs(
        &[
          ("新規-派遣", C::NewDispatch),
          ("新規－派遣", C::NewDispatch),
          ("新規-直接", C::NewDirect),
          ("新規－直接", C::NewDirect),
          ("変更申請A", C::ChangeA),
          ("変更申請Ａ", C::ChangeA),
          ("変更申請B", C::ChangeB),
          ("変更申請Ｂ", C::ChangeB),
          ("更新-派遣", C::RenewalDispatch),
          ("更新-直接", C::RenewalDirect),
          ("更新申請", C::RenewalDispatch),
          ("随時届（派遣先変更）", C::ZuitojiDispatch),
          ("随時届出（派遣先変更）", C::ZuitojiDispatch),
          ("随時届（終了）", C::ZuitojiTermination),
          ("随時届出（終了）", C::ZuitojiTermination),
        ],
        Some(C::Notification),
      ),
      employment_type: MappingTable::from_pairs(
        &[
          ("正社員", E::Seishain),
          ("役員", E::Executive),
          ("契約社員", E::Contract),
          ("派遣社員", E::Dispatch),
          ("派遣雇用", E::Dispatch),
          ("パート", E::PartTime),
          ("アルバイト", E::PartTime),
          ("業務委託", E::Subcontract),
          ("業務委託雇用", E::Subcontract),
          ("その他", E::Other),
        ],
        Some(E::Other),
      ),
      department:      MappingTable::from_pairs(
        &[
          ("農業派遣事業部", B::Dispatch),
          ("畜産派遣事業部", B::Dispatch),
          ("顧客・サービス開発部門", B::It),
          ("総務部門", B::Support),
        ],
        Some(B::Dispatch),
      ),
      known_aliases:   MappingTable::from_pairs(
        &[
          ("派遣-スグクル(株)", "スグクル株式会社".to_owned()),
          ("スグクル(株)-委託", "スグクル株式会社".to_owned()),
          ("スグクル(株)", "スグクル株式会社".to_owned()),
          ("片平-派遣", "(有)片平農産".to_owned()),
          ("(有)片平農産", "(有)片平農産".to_owned()),
          ("芝原-派遣", "(株)芝原".to_owned()),
          ("(株)芝原", "(株)芝原".to_owned()),
          ("新保農園-派遣", "(株)新保農園".to_owned()),
          ("(株)新保農園", "(株)新保農園".to_owned()),
          ("新口農園-派遣", "新口農園".to_owned()),
          ("あずま園-派遣", "あずま園".to_owned()),
          ("サングリーン-派遣", "サングリーン".to_owned()),
          ("竹下商店-派遣", "竹下商店".to_owned()),
          ("くしまアオイファーム-派遣", "くしまアオイファーム".to_owned()),
          ("JA物流かごしま-派遣", "JA物流かごしま".to_owned()),
          ("ALL農事-派遣", "ALL農事".to_owned()),
          ("今隈製茶-派遣", "今隈製茶".to_owned()),
          ("南原農園-派遣", "南原農園".to_owned()),
          ("榎原秀志-派遣", "榎原秀志".to_owned()),
          ("鳥越秀一-派遣", "鳥越秀一".to_owned()),
          ("かめい-派遣", "(有)かめい".to_owned()),
          ("浦産業-派遣", "浦産業".to_owned()),
          ("(有)青山養鶏場", "(有)青山養鶏場".to_owned()),
          ("(有)川辺フーズ", "(有)川辺フーズ".to_owned()),
          ("(有)かめい", "(有)かめい".to_owned()),
          ("(有)東馬場農場", "(有)東馬場農場".to_owned()),
          ("WinWin(株)", "WinWin株式会社".to_owned()),
          ("開屋本舗(株)", "開屋本舗株式会社".to_owned()),
          ("かじや農産(株)", "かじや農産株式会社".to_owned()),
          ("(株)SBF", "(株)SBF".to_owned()),
          ("(株)松田工業", "(株)松田工業".to_owned()),
          ("(株)蒼天産業", "(株)蒼天産業".to_owned()),
          ("植松裕補", "植松裕補".to_owned()),
          ("加藤秀文", "加藤秀文".to_owned()),
          ("末吉利也", "末吉利也".to_owned()),
          ("谷口理恵", "谷口理恵".to_owned()),
          ("市囿庄一", "市囿庄一".to_owned()),
        ],
        None,
      ),
    }
  }
}

// ─── FieldMapper ─────────────────────────────────────────────────────────────

/// Maps roster and HR cells to codes using shared [`MappingTables`].
#[derive(Debug, Clone)]
pub struct FieldMapper {
  tables: Arc<MappingTables>,
}

impl FieldMapper {
  pub fn new(tables: Arc<MappingTables>) -> Self { Self { tables } }

  pub fn tables(&self) -> &MappingTables { &self.tables }

  /// Split a possibly comma-joined status cell. The first token is mapped to
  /// the primary status; the rest are kept verbatim as tags.
  pub fn status(&self, raw: Option<&str>) -> (PersonStatus, Vec<String>) {
    let mut parts = raw
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty());

    let Some(primary) = parts.next() else {
      return (PersonStatus::Monitoring, Vec::new());
    };
    let status = self.tables.status.map(Some(primary), PersonStatus::Monitoring);
    (status, parts.map(str::to_owned).collect())
  }

  pub fn nationality(&self, raw: Option<&str>) -> Nationality {
    self.tables.nationality.map(raw, Nationality::Other)
  }

  pub fn visa_type(&self, raw: Option<&str>) -> VisaType {
    self.tables.visa_type.map(raw, VisaType::Other)
  }

  pub fn visa_category(&self, raw: Option<&str>) -> BusinessDivision {
    self.tables.visa_category.map(raw, BusinessDivision::Dispatch)
  }

  pub fn case_type(&self, raw: Option<&str>) -> CaseType {
    self.tables.case_type.map(raw, CaseType::Notification)
  }

  pub fn employment_type(&self, raw: Option<&str>) -> EmploymentType {
    self.tables.employment_type.map(raw, EmploymentType::Other)
  }

  pub fn department(&self, raw: Option<&str>) -> BusinessDivision {
    self.tables.department.map(raw, BusinessDivision::Dispatch)
  }

  /// Curated canonical name for a company spelling, if there is one.
  pub fn canonical_company(&self, name: &str) -> Option<&str> {
    self.tables.known_aliases.exact(name).map(String::as_str)
  }
}
