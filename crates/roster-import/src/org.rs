//! Company-name resolution.
//!
//! Source spreadsheets spell the same client many ways: with role markers
//! (`派遣-スグクル(株)`, `スグクル(株)-委託`), abbreviated legal forms, or as a
//! comma-joined list. [`OrganizationResolver::resolve`] turns any one
//! spelling into an organization id, creating the organization when nothing
//! matches, and records aliases as it goes so the next lookup is exact.

use std::sync::Arc;

use roster_core::{
  organization::{AliasSource, NewAlias, NewOrganization},
  store::{RosterStore, StoreError as _},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  mapping::{FieldMapper, MappingTables},
};

/// Strip the source system's role markers: a leading `派遣-`, then a trailing
/// `-派遣`, then a trailing `-委託`.
pub fn normalize_company(raw: &str) -> &str {
  let name = raw.trim();
  let name = name.strip_prefix("派遣-").unwrap_or(name);
  let name = name.strip_suffix("-派遣").unwrap_or(name);
  let name = name.strip_suffix("-委託").unwrap_or(name);
  name.trim()
}

/// Resolves raw company strings to organization ids within a tenant.
pub struct OrganizationResolver<S> {
  store:  Arc<S>,
  mapper: FieldMapper,
}

impl<S> Clone for OrganizationResolver<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      mapper: self.mapper.clone(),
    }
  }
}

impl<S: RosterStore> OrganizationResolver<S> {
  pub fn new(store: Arc<S>, tables: Arc<MappingTables>) -> Self {
    Self {
      store,
      mapper: FieldMapper::new(tables),
    }
  }

  /// Resolve `raw` to an organization id, creating the organization if
  /// nothing matches. Returns `None` only for blank input.
  ///
  /// Lookup order, stopping at the first hit:
  /// 1. exact organization name, for the raw, normalised and curated
  ///    canonical spellings;
  /// 2. exact alias, for the same spellings;
  /// 3. an organization whose name contains the normalised spelling, in
  ///    which case `raw` is remembered as an alias of it;
  /// 4. a new organization flagged for review, named after the canonical,
  ///    normalised or raw spelling, with `raw` as its alias if different.
  pub async fn resolve(&self, raw: &str, tenant_id: Uuid) -> Result<Option<Uuid>, S::Error> {
    let raw = raw.trim();
    if raw.is_empty() {
      return Ok(None);
    }

    let normalized = normalize_company(raw);
    let canonical = self
      .mapper
      .canonical_company(raw)
      .or_else(|| self.mapper.canonical_company(normalized));

    let mut candidates = vec![raw];
    for name in [Some(normalized), canonical].into_iter().flatten() {
      if !name.is_empty() && !candidates.contains(&name) {
        candidates.push(name);
      }
    }

    for name in &candidates {
      let found = self
        .store
        .find_organization_by_name(tenant_id, (*name).to_owned())
        .await
        .map_err(Error::Store)?;
      if let Some(org) = found {
        debug!(input = raw, matched = *name, org_id = %org.org_id, "organization name hit");
        return Ok(Some(org.org_id));
      }
    }

    for name in &candidates {
      let found = self
        .store
        .find_alias((*name).to_owned())
        .await
        .map_err(Error::Store)?;
      if let Some(alias) = found {
        debug!(input = raw, matched = *name, org_id = %alias.org_id, "alias hit");
        return Ok(Some(alias.org_id));
      }
    }

    if !normalized.is_empty() {
      let found = self
        .store
        .find_organization_containing(tenant_id, normalized.to_owned())
        .await
        .map_err(Error::Store)?;
      if let Some(org) = found {
        debug!(input = raw, name = %org.name, org_id = %org.org_id, "substring hit");
        self.remember(org.org_id, raw, AliasSource::PartialMatch).await?;
        return Ok(Some(org.org_id));
      }
    }

    let name = canonical.unwrap_or(if normalized.is_empty() { raw } else { normalized });
    let org = self
      .store
      .create_organization(NewOrganization::auto_created(tenant_id, name, raw))
      .await
      .map_err(Error::Store)?;
    info!(org_name = name, input = raw, org_id = %org.org_id, "created organization pending review");

    if name != raw {
      self.remember(org.org_id, raw, AliasSource::AutoGenerated).await?;
    }
    Ok(Some(org.org_id))
  }

  /// Register an operator-supplied alias. Returns `false` if the alias text
  /// is blank or already taken.
  pub async fn register_alias(&self, org_id: Uuid, alias: &str) -> Result<bool, S::Error> {
    let alias = alias.trim();
    if alias.is_empty() {
      return Ok(false);
    }

    let org = self
      .store
      .get_organization(org_id)
      .await
      .map_err(Error::Store)?;
    if org.is_none() {
      return Err(Error::OrganizationNotFound(org_id));
    }

    let inserted = self
      .store
      .insert_alias(NewAlias {
        org_id,
        alias_name: alias.to_owned(),
        source: AliasSource::Manual,
      })
      .await
      .map_err(Error::Store)?;
    Ok(inserted.is_some())
  }

  /// Persist a learned alias. Losing a race to another writer, or any other
  /// non-fatal store error, leaves the mapping as it is.
  async fn remember(&self, org_id: Uuid, alias: &str, source: AliasSource) -> Result<(), S::Error> {
    let input = NewAlias {
      org_id,
      alias_name: alias.to_owned(),
      source,
    };
    match self.store.insert_alias(input).await {
      Ok(Some(_)) => debug!(alias, %org_id, %source, "persisted alias"),
      Ok(None) => warn!(alias, %org_id, "alias already taken, keeping existing mapping"),
      Err(e) if e.is_fatal() => return Err(Error::Store(e)),
      Err(e) => warn!(alias, %org_id, error = %e, "could not persist alias"),
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::normalize_company;

  #[test]
  fn role_markers_are_stripped() {
    assert_eq!(normalize_company("派遣-スグクル(株)"), "スグクル(株)");
    assert_eq!(normalize_company("スグクル(株)-委託"), "スグクル(株)");
    assert_eq!(normalize_company(" 片平-派遣 "), "片平");
    assert_eq!(normalize_company("(株)芝原"), "(株)芝原");
  }

  #[test]
  fn markers_are_stripped_once_in_order() {
    assert_eq!(normalize_company("派遣-ABC-派遣-派遣"), "ABC-派遣");
    assert_eq!(normalize_company("ABC-委託-派遣"), "ABC");
    assert_eq!(normalize_company("派遣-"), "");
  }
}
