//! Handlers for `/tenants/{tenant}/templates` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/templates` | ordered by external id |
//! | `POST` | `/templates` | flattened against the parent; 409 on duplicate |
//! | `GET`  | `/templates/parent` | dropdown of candidate parents |
//! | `GET`  | `/templates/{id}` | 404 if not found |
//! | `PUT`  | `/templates/{id}` | replaces the field lists |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lineage_core::{
  dropdown::{ParentTemplateOption, parent_template_options},
  flatten::{create_template, update_template},
  store::{CatalogStore, require_template},
  template::Template,
};

use crate::{Data, data, error::ApiError};

/// `GET /tenants/{tenant}/templates`
pub async fn list<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(tenant): Path<String>,
) -> Result<Json<Data<Vec<Template>>>, ApiError> {
  let templates = store.list_templates(&tenant).await.map_err(ApiError::store)?;
  Ok(data(templates))
}

/// `POST /tenants/{tenant}/templates`
pub async fn create<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(tenant): Path<String>,
  Json(body): Json<Template>,
) -> Result<impl IntoResponse, ApiError> {
  let template = create_template(store.as_ref(), &tenant, body).await?;
  Ok((StatusCode::CREATED, data(template)))
}

/// `GET /tenants/{tenant}/templates/parent`
pub async fn parent_options<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(tenant): Path<String>,
) -> Result<Json<Data<Vec<ParentTemplateOption>>>, ApiError> {
  let templates = store.list_templates(&tenant).await.map_err(ApiError::store)?;
  Ok(data(parent_template_options(&templates)))
}

/// `GET /tenants/{tenant}/templates/{id}`
pub async fn get_one<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path((tenant, id)): Path<(String, String)>,
) -> Result<Json<Data<Template>>, ApiError> {
  let template = require_template(store.as_ref(), &tenant, &id.to_lowercase()).await?;
  Ok(data(template))
}

/// `PUT /tenants/{tenant}/templates/{id}`
pub async fn update<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path((tenant, id)): Path<(String, String)>,
  Json(body): Json<Template>,
) -> Result<Json<Data<Template>>, ApiError> {
  let template = update_template(store.as_ref(), &tenant, &id, body).await?;
  Ok(data(template))
}
