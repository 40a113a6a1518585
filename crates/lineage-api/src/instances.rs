//! Handlers for `/tenants/{tenant}/instances` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lineage_core::{
  assemble::create_instance,
  form::{InstanceForm, instance_form},
  instance::{Instance, NewInstance},
  store::{CatalogStore, require_instance},
};

use crate::{Data, data, error::ApiError};

/// `GET /tenants/{tenant}/instances`
pub async fn list<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(tenant): Path<String>,
) -> Result<Json<Data<Vec<Instance>>>, ApiError> {
  let instances = store.list_instances(&tenant).await.map_err(ApiError::store)?;
  Ok(data(instances))
}

/// `POST /tenants/{tenant}/instances`: validate, link and store.
pub async fn create<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path(tenant): Path<String>,
  Json(body): Json<NewInstance>,
) -> Result<impl IntoResponse, ApiError> {
  let instance = create_instance(store.as_ref(), &tenant, body).await?;
  Ok((StatusCode::CREATED, data(instance)))
}

/// `GET /tenants/{tenant}/instances/{id}`
pub async fn get_one<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path((tenant, id)): Path<(String, String)>,
) -> Result<Json<Data<Instance>>, ApiError> {
  let instance = require_instance(store.as_ref(), &tenant, &id.to_lowercase()).await?;
  Ok(data(instance.document))
}

/// `GET /tenants/{tenant}/instances/form/{parent}`
pub async fn form<S: CatalogStore>(
  State(store): State<Arc<S>>,
  Path((tenant, parent)): Path<(String, String)>,
) -> Result<Json<Data<InstanceForm>>, ApiError> {
  let form = instance_form(store.as_ref(), &tenant, &parent).await?;
  Ok(data(form))
}
