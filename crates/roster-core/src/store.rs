//! The `RosterStore` trait — the storage interface the import engines need.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! The import engines and the CLI depend on this abstraction, not on any
//! concrete backend.
//!
//! Every write is atomic on its own. Uniqueness rules (full name per tenant,
//! organization name per tenant, alias text globally, the visa-case dedup
//! key) are enforced by the backend and are the only concurrency control
//! between import runs.

use std::future::Future;

use uuid::Uuid;

use crate::{
  organization::{NewAlias, NewOrganization, Organization, OrganizationAlias},
  person::{Person, PersonUpsert},
  tenant::Tenant,
  visa::{CaseKey, NewVisaCase, VisaCase},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Whether an upsert inserted a new row or merged into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Created,
  Merged,
}

/// An upserted record and how it got there.
#[derive(Debug, Clone)]
pub struct Upserted<T> {
  pub outcome: UpsertOutcome,
  pub record:  T,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Classification a backend error must provide.
///
/// A fatal error (lost connection, I/O failure, a constraint violation
/// outside the upsert paths) aborts an import run. Anything else is charged
/// to the row that caused it.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_fatal(&self) -> bool;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a roster store backend.
///
/// The import core never deletes: it inserts, or merges in place.
pub trait RosterStore: Send + Sync {
  type Error: StoreError;

  // ── Tenants ───────────────────────────────────────────────────────────

  /// Return the tenant with this name, creating it if it does not exist.
  fn ensure_tenant(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Tenant, Self::Error>> + Send + '_;

  // ── Organizations ─────────────────────────────────────────────────────

  /// Exact canonical-name match among the tenant's non-deleted
  /// organizations.
  fn find_organization_by_name(
    &self,
    tenant_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + '_;

  /// The oldest non-deleted organization of the tenant whose name contains
  /// `fragment`, compared by [`crate::text::match_key`] (case and
  /// full-width insensitive).
  fn find_organization_containing(
    &self,
    tenant_id: Uuid,
    fragment: String,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + '_;

  /// Insert an organization. If a concurrent writer already created one with
  /// the same name in the tenant, that organization is returned instead.
  fn create_organization(
    &self,
    input: NewOrganization,
  ) -> impl Future<Output = Result<Organization, Self::Error>> + Send + '_;

  fn get_organization(
    &self,
    org_id: Uuid,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + '_;

  /// All non-deleted organizations of the tenant, oldest first.
  fn list_organizations(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Organization>, Self::Error>> + Send + '_;

  // ── Aliases ───────────────────────────────────────────────────────────

  /// Exact alias-text match. Alias text is globally unique.
  fn find_alias(
    &self,
    alias_name: String,
  ) -> impl Future<Output = Result<Option<OrganizationAlias>, Self::Error>>
  + Send
  + '_;

  /// Insert an alias. Returns `None` when the alias text is already taken,
  /// which includes losing a race against a concurrent run.
  fn insert_alias(
    &self,
    input: NewAlias,
  ) -> impl Future<Output = Result<Option<OrganizationAlias>, Self::Error>>
  + Send
  + '_;

  fn list_aliases(
    &self,
    org_id: Uuid,
  ) -> impl Future<Output = Result<Vec<OrganizationAlias>, Self::Error>> + Send + '_;

  // ── People ────────────────────────────────────────────────────────────

  /// Atomic insert-or-merge keyed by `(tenant_id, full_name)`.
  ///
  /// On merge the rules of [`Person::absorb`] apply.
  fn upsert_person(
    &self,
    input: PersonUpsert,
  ) -> impl Future<Output = Result<Upserted<Person>, Self::Error>> + Send + '_;

  fn find_person_by_name(
    &self,
    tenant_id: Uuid,
    full_name: String,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    person_id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn list_people(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  // ── Visa cases ────────────────────────────────────────────────────────

  fn find_visa_case(
    &self,
    key: CaseKey,
  ) -> impl Future<Output = Result<Option<VisaCase>, Self::Error>> + Send + '_;

  /// Insert a case unless one with the same [`CaseKey`] exists, in which
  /// case `None` is returned and nothing is written.
  fn insert_visa_case(
    &self,
    input: NewVisaCase,
  ) -> impl Future<Output = Result<Option<VisaCase>, Self::Error>> + Send + '_;

  fn list_visa_cases(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<VisaCase>, Self::Error>> + Send + '_;
}
