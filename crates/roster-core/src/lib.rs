//! Core types and trait definitions for the roster import system.
//!
//! This crate has no CSV, database, or CLI dependencies.
//! The import engines and the storage backends both depend on it.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// store trait where they matter.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod merge;
pub mod organization;
pub mod person;
pub mod store;
pub mod tenant;
pub mod text;
pub mod visa;

pub use error::{Error, Result};
