//! The instance assembler.
//!
//! An inbound payload moves through `Pending → Validated → Linked → Persisted`;
//! each stage is its own type so a stage can only be reached through the one
//! before it. Any failed check rejects the payload with an error.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result, ValidationError,
  instance::{Instance, InstanceBasicInformation, NewInstance},
  link::{self, PendingLink},
  relationship::RelationshipCatalog,
  store::{CatalogStore, Insert, require_template},
  template::Template,
  validate::{validate_attributes, validate_metrics},
};

/// A payload whose top-level fields are present and normalised.
#[derive(Debug)]
pub struct Pending {
  tenant_id: String,
  payload:   NewInstance,
}

/// Attributes and metrics are typed; relationships are not yet checked.
#[derive(Debug)]
pub struct Validated {
  instance: Instance,
}

/// Relationships are checked and their inverse links written.
#[derive(Debug)]
pub struct Linked {
  instance: Instance,
}

impl Pending {
  pub fn new(tenant_id: &str, mut payload: NewInstance) -> Result<Self, ValidationError> {
    let info = &mut payload.basic_information;
    if info.name.is_empty() {
      return Err(ValidationError::MissingBasicField("Name"));
    }
    if info.external_id.is_empty() {
      return Err(ValidationError::MissingBasicField("External Id"));
    }
    if info.parent.is_empty() {
      return Err(ValidationError::MissingBasicField("Parent"));
    }
    info.external_id = info.external_id.to_lowercase();
    info.parent = info.parent.to_lowercase();

    Ok(Self { tenant_id: tenant_id.to_owned(), payload })
  }

  /// External id of the template the payload names as its parent.
  pub fn parent(&self) -> &str { &self.payload.basic_information.parent }

  /// Check and coerce the payload's fields against `template`'s flattened
  /// schema.
  pub fn validate(self, template: &Template) -> Result<Validated, ValidationError> {
    let attributes = validate_attributes(&self.payload.attributes, &template.attributes)?;
    let metrics = validate_metrics(&self.payload.metrics, &template.metrics)?;
    let info = self.payload.basic_information;

    Ok(Validated {
      instance: Instance {
        tenant_id: self.tenant_id,
        basic_information: InstanceBasicInformation {
          name:          info.name,
          external_id:   info.external_id,
          parent:        template.external_id().to_owned(),
          is_custom:     true,
          root_template: template.resolved_root().to_owned(),
        },
        attributes,
        metrics,
        relationships: self.payload.relationships,
      },
    })
  }
}

impl Validated {
  pub fn instance(&self) -> &Instance { &self.instance }

  /// Check every declared relationship, then write the inverse links.
  pub async fn link<S: CatalogStore>(
    mut self,
    store: &S,
    catalog: &RelationshipCatalog,
  ) -> Result<Linked> {
    let pending: Vec<PendingLink> = link::plan(store, catalog, &mut self.instance).await?;
    link::propagate(store, &self.instance.tenant_id, &pending).await?;

    for relationship in &mut self.instance.relationships {
      if relationship.id.is_empty() {
        relationship.id = Uuid::new_v4().to_string();
      }
    }
    debug!(
      instance = self.instance.external_id(),
      inverse_links = pending.len(),
      "linked instance"
    );
    Ok(Linked { instance: self.instance })
  }
}

impl Linked {
  pub fn instance(&self) -> &Instance { &self.instance }

  pub async fn persist<S: CatalogStore>(self, store: &S) -> Result<Instance> {
    match store.insert_instance(&self.instance).await.map_err(Error::store)? {
      Insert::Inserted => Ok(self.instance),
      Insert::Duplicate => {
        Err(Error::DuplicateExternalId(self.instance.external_id().to_owned()))
      }
    }
  }
}

/// Validate, link and store a new instance for `tenant_id`.
pub async fn create_instance<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  payload: NewInstance,
) -> Result<Instance> {
  let pending = Pending::new(tenant_id, payload)?;
  let template = require_template(store, tenant_id, pending.parent()).await?;
  let validated = pending.validate(&template)?;

  let external_id = validated.instance().external_id();
  if store
    .get_instance(tenant_id, external_id)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::DuplicateExternalId(external_id.to_owned()));
  }

  let catalog: RelationshipCatalog = store
    .relationship_catalog(tenant_id)
    .await
    .map_err(Error::store)?
    .into_iter()
    .collect();

  let instance = validated.link(store, &catalog).await?.persist(store).await?;
  info!(tenant_id, instance = instance.external_id(), "created instance");
  Ok(instance)
}
