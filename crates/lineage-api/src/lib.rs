//! JSON REST API for Lineage.
//!
//! Exposes an axum [`Router`] backed by any [`lineage_core::store::CatalogStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", lineage_api::api_router(store.clone()))
//! ```

pub mod catalog;
pub mod error;
pub mod instances;
pub mod templates;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use lineage_core::store::CatalogStore;
use serde::Serialize;

pub use error::ApiError;

/// Body of every successful response: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
  pub data: T,
}

pub(crate) fn data<T: Serialize>(data: T) -> Json<Data<T>> { Json(Data { data }) }

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CatalogStore + 'static,
{
  Router::new()
    // Type catalogs
    .route("/attribute-types", get(catalog::attribute_types::<S>))
    .route("/metric-types", get(catalog::metric_types::<S>))
    .route("/units", get(catalog::units::<S>))
    // Relationship catalog
    .route(
      "/tenants/{tenant}/relationships",
      get(catalog::list_relationships::<S>).post(catalog::define::<S>),
    )
    // Templates
    .route(
      "/tenants/{tenant}/templates",
      get(templates::list::<S>).post(templates::create::<S>),
    )
    .route("/tenants/{tenant}/templates/parent", get(templates::parent_options::<S>))
    .route(
      "/tenants/{tenant}/templates/{id}",
      get(templates::get_one::<S>).put(templates::update::<S>),
    )
    // Instances
    .route(
      "/tenants/{tenant}/instances",
      get(instances::list::<S>).post(instances::create::<S>),
    )
    .route("/tenants/{tenant}/instances/form/{parent}", get(instances::form::<S>))
    .route("/tenants/{tenant}/instances/{id}", get(instances::get_one::<S>))
    .with_state(store)
}
