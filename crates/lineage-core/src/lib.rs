//! Core types, the storage trait, and the schema/instance engine for Lineage.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The engine is split into four stages:
//!
//! - [`flatten`] cascades a template's attribute/metric schema down from its
//!   parent at creation time.
//! - [`validate`] checks and type-coerces untyped instance values against a
//!   flattened schema.
//! - [`link`] checks relationship declarations against the tenant catalog and
//!   propagates inverse links into target instances.
//! - [`assemble`] drives an inbound instance payload through the above and
//!   persists it.

pub mod assemble;
pub mod dropdown;
pub mod error;
pub mod flatten;
pub mod form;
pub mod instance;
pub mod link;
pub mod relationship;
pub mod store;
pub mod template;
pub mod validate;
pub mod value;

#[cfg(test)]
mod memory;

pub use error::{Error, Result, ValidationError};
