//! Handlers for the type catalogs and the relationship catalog.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/attribute-types`, `/metric-types`, `/units` | read-only |
//! | `GET`  | `/tenants/{tenant}/relationships` | |
//! | `POST` | `/tenants/{tenant}/relationships` | 409 on a duplicate id |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lineage_core::{
  dropdown::{Dropdown, TypeCatalog},
  relationship::{RelationshipDefinition, define_relationship},
  store::CatalogStore,
};

use crate::{Data, data, error::ApiError};

async fn options<S: CatalogStore>(
  store: &S,
  catalog: TypeCatalog,
) -> Result<Json<Data<Vec<Dropdown>>>, ApiError> {
  let options = store.type_options(catalog).await.map_err(ApiError::store)?;
  Ok(data(options))
}

/// `GET /attribute-types`
pub async fn attribute_types<S: CatalogStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Data<Vec<Dropdown>>>, ApiError> {
  options(store.as_ref(), TypeCatalog::AttributeTypes).await
}

/// `GET /metric-types`
pub async fn metric_types<S: CatalogStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Data<Vec<Dropdown>>>, ApiError> {
  options(store.as_ref(), TypeCatalog::MetricTypes).await
}

/// `GET /units`
pub async fn units<S: CatalogStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Data<Vec<Dropdown>>>, ApiError> {
  options(store.as_ref(), TypeCatalog::Units).await
}

/// `GET /tenants/{tenant}/relationships`
pub async fn list_relationships<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(tenant): Path<String>,
) -> Result<Json<Data<Vec<RelationshipDefinition>>>, ApiError> {
  let definitions = store
    .relationship_catalog(&tenant)
    .await
    .map_err(ApiError::store)?;
  Ok(data(definitions))
}

/// `POST /tenants/{tenant}/relationships`
pub async fn define<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(tenant): Path<String>,
  Json(body): Json<RelationshipDefinition>,
) -> Result<impl IntoResponse, ApiError> {
  let definition = define_relationship(store.as_ref(), &tenant, body).await?;
  Ok((StatusCode::CREATED, data(definition)))
}
