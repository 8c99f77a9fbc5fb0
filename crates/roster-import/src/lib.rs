//! CSV import pipeline for the roster store.
//!
//! Three dialects are supported: the staff roster and the HR export (both
//! upserting people, see [`person`]) and the visa-request list (see
//! [`visa_case`]). Company names in any of them go through
//! [`org::OrganizationResolver`]. [`run::run`] drives a whole file through
//! one dialect and returns an [`ImportSummary`].
//!
//! Everything here is generic over [`roster_core::store::RosterStore`].

#![allow(async_fn_in_trait)]

pub mod date;
pub mod error;
pub mod mapping;
pub mod org;
pub mod person;
pub mod row;
pub mod run;
pub mod visa_case;

pub use error::{Error, MalformedDates, Result};
pub use mapping::{FieldMapper, MappingTables};
pub use org::OrganizationResolver;
pub use person::{PersonSource, PersonUpsertEngine};
pub use run::{ImportSummary, RowHandler, RowOutcome, RunAborted, run};
pub use visa_case::CaseUpsertEngine;

#[cfg(test)]
mod tests;
