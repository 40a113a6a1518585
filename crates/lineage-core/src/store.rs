//! The `CatalogStore` trait: the two collaborator capabilities the engine
//! consumes: fetching documents by tenant and external id, and persisting or
//! replacing whole documents.
//!
//! The trait is implemented by storage backends (e.g. `lineage-store-sqlite`).
//! Higher layers (`lineage-api`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  Error,
  dropdown::{Dropdown, TypeCatalog},
  instance::{Instance, Versioned},
  relationship::RelationshipDefinition,
  template::Template,
};

/// Result of inserting a document keyed by `(tenant_id, external_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
  Inserted,
  /// A document with the same key already exists; nothing was written.
  Duplicate,
}

/// Result of a compare-and-swap replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replace {
  Replaced,
  /// The stored version no longer matches (or the document is gone).
  Conflict,
}

/// Abstraction over a document store holding templates, instances and the
/// relationship catalog.
///
/// Absence is reported as `Ok(None)`; uniqueness and version conflicts are
/// reported through [`Insert`] and [`Replace`]. `Self::Error` is reserved for
/// transport and storage failures.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Templates ─────────────────────────────────────────────────────────

  fn get_template<'a>(
    &'a self,
    tenant_id: &'a str,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<Template>, Self::Error>> + Send + 'a;

  /// All templates of a tenant, ordered by external id.
  fn list_templates<'a>(
    &'a self,
    tenant_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Template>, Self::Error>> + Send + 'a;

  fn insert_template<'a>(
    &'a self,
    template: &'a Template,
  ) -> impl Future<Output = Result<Insert, Self::Error>> + Send + 'a;

  /// Overwrite an existing template. Returns `false` if there was none.
  fn replace_template<'a>(
    &'a self,
    template: &'a Template,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Instances ─────────────────────────────────────────────────────────

  fn get_instance<'a>(
    &'a self,
    tenant_id: &'a str,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<Versioned<Instance>>, Self::Error>>
  + Send
  + 'a;

  /// All instances of a tenant, ordered by external id.
  fn list_instances<'a>(
    &'a self,
    tenant_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Instance>, Self::Error>> + Send + 'a;

  fn insert_instance<'a>(
    &'a self,
    instance: &'a Instance,
  ) -> impl Future<Output = Result<Insert, Self::Error>> + Send + 'a;

  /// Replace the whole document if its stored version is still
  /// `expected_version`, bumping the version on success.
  fn replace_instance<'a>(
    &'a self,
    instance: &'a Instance,
    expected_version: u64,
  ) -> impl Future<Output = Result<Replace, Self::Error>> + Send + 'a;

  // ── Catalogs ──────────────────────────────────────────────────────────

  fn relationship_catalog<'a>(
    &'a self,
    tenant_id: &'a str,
  ) -> impl Future<Output = Result<Vec<RelationshipDefinition>, Self::Error>>
  + Send
  + 'a;

  fn insert_relationship<'a>(
    &'a self,
    tenant_id: &'a str,
    definition: &'a RelationshipDefinition,
  ) -> impl Future<Output = Result<Insert, Self::Error>> + Send + 'a;

  fn type_options(
    &self,
    catalog: TypeCatalog,
  ) -> impl Future<Output = Result<Vec<Dropdown>, Self::Error>> + Send + '_;
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

/// Fetch a template, turning absence into [`Error::NotFound`].
pub async fn require_template<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  external_id: &str,
) -> crate::Result<Template> {
  store
    .get_template(tenant_id, external_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::template_not_found(external_id))
}

/// Fetch an instance, turning absence into [`Error::NotFound`].
pub async fn require_instance<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  external_id: &str,
) -> crate::Result<Versioned<Instance>> {
  store
    .get_instance(tenant_id, external_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::instance_not_found(external_id))
}
