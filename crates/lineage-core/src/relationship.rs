//! The tenant-wide relationship catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result, ValidationError,
  store::{CatalogStore, Insert},
};

/// A relationship type, e.g. "feeds" from a `pump` root to `tank` roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDefinition {
  /// Generated on definition when left empty.
  #[serde(default)]
  pub id:          String,
  pub name:        String,
  /// Root-template external id an instance must resolve to in order to
  /// declare this relationship.
  pub source:      String,
  /// Root-template external ids accepted as targets.
  pub target:      Vec<String>,
  /// `one-to-one`, `one-to-many`, `many-to-many`, ...
  pub cardinality: String,
  /// Id of the relationship written back onto each target; empty for none.
  #[serde(default)]
  pub inverse:     String,
}

impl RelationshipDefinition {
  pub fn is_many(&self) -> bool { self.cardinality.ends_with("many") }

  pub fn inverse_id(&self) -> Option<&str> {
    Some(self.inverse.as_str()).filter(|id| !id.is_empty())
  }

  pub fn accepts_target(&self, root_template: &str) -> bool {
    self.target.iter().any(|t| t == root_template)
  }
}

/// The catalog indexed by id, built once per request.
#[derive(Debug, Clone, Default)]
pub struct RelationshipCatalog {
  by_id: HashMap<String, RelationshipDefinition>,
}

impl RelationshipCatalog {
  pub fn new(definitions: impl IntoIterator<Item = RelationshipDefinition>) -> Self {
    Self {
      by_id: definitions.into_iter().map(|d| (d.id.clone(), d)).collect(),
    }
  }

  pub fn get(&self, id: &str) -> Option<&RelationshipDefinition> {
    self.by_id.get(id)
  }

  pub fn resolve(&self, id: &str) -> Result<&RelationshipDefinition, ValidationError> {
    self
      .get(id)
      .ok_or_else(|| ValidationError::RelationshipTypeNotFound(id.to_owned()))
  }

  pub fn len(&self) -> usize { self.by_id.len() }

  pub fn is_empty(&self) -> bool { self.by_id.is_empty() }
}

impl FromIterator<RelationshipDefinition> for RelationshipCatalog {
  fn from_iter<I: IntoIterator<Item = RelationshipDefinition>>(iter: I) -> Self {
    Self::new(iter)
  }
}

/// Add a relationship type to `tenant_id`'s catalog.
///
/// Source and target root ids are stored lowercased, like the external ids
/// they are compared against.
pub async fn define_relationship<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  mut definition: RelationshipDefinition,
) -> Result<RelationshipDefinition> {
  if definition.name.is_empty() {
    return Err(ValidationError::MissingBasicField("Name").into());
  }
  if definition.source.is_empty() {
    return Err(ValidationError::MissingBasicField("Source").into());
  }
  if definition.cardinality.is_empty() {
    return Err(ValidationError::MissingBasicField("Cardinality").into());
  }
  if definition.id.is_empty() {
    definition.id = Uuid::new_v4().to_string();
  }
  if definition.target.is_empty() {
    return Err(ValidationError::EmptyRelationshipTarget(definition.id).into());
  }

  definition.source = definition.source.to_lowercase();
  for target in &mut definition.target {
    *target = target.to_lowercase();
  }

  match store
    .insert_relationship(tenant_id, &definition)
    .await
    .map_err(Error::store)?
  {
    Insert::Inserted => {
      info!(tenant_id, relationship = %definition.id, "defined relationship");
      Ok(definition)
    }
    Insert::Duplicate => Err(Error::DuplicateExternalId(definition.id)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::MemoryStore;

  fn definition(id: &str, cardinality: &str, inverse: &str) -> RelationshipDefinition {
    RelationshipDefinition {
      id:          id.into(),
      name:        id.into(),
      source:      "pump".into(),
      target:      vec!["tank".into()],
      cardinality: cardinality.into(),
      inverse:     inverse.into(),
    }
  }

  #[test]
  fn cardinality_suffix_decides_fan_out() {
    assert!(definition("a", "one-to-many", "").is_many());
    assert!(definition("a", "*-to-many", "").is_many());
    assert!(!definition("a", "one-to-one", "").is_many());
    assert!(!definition("a", "many-to-one", "").is_many());
  }

  #[test]
  fn empty_inverse_means_none() {
    assert_eq!(definition("a", "one-to-one", "").inverse_id(), None);
    assert_eq!(definition("a", "one-to-one", "b").inverse_id(), Some("b"));
  }

  #[test]
  fn catalog_resolves_by_id() {
    let catalog: RelationshipCatalog =
      [definition("feeds", "one-to-many", ""), definition("fed-by", "many-to-one", "")]
        .into_iter()
        .collect();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.resolve("feeds").unwrap().id, "feeds");
    assert_eq!(
      catalog.resolve("drains").unwrap_err(),
      ValidationError::RelationshipTypeNotFound("drains".into())
    );
  }

  #[tokio::test]
  async fn defining_normalises_and_assigns_an_id() {
    let store = MemoryStore::default();
    let mut body = definition("", "one-to-many", "");
    body.name = "Feeds".into();
    body.source = "Pump".into();
    body.target = vec!["TANK".into()];

    let defined = define_relationship(&store, "t1", body).await.unwrap();
    assert!(!defined.id.is_empty());
    assert_eq!(defined.source, "pump");
    assert_eq!(defined.target, ["tank"]);
    assert_eq!(store.relationship_catalog("t1").await.unwrap(), [defined]);
  }

  #[tokio::test]
  async fn defining_without_targets_fails() {
    let store = MemoryStore::default();
    let mut body = definition("feeds", "one-to-many", "");
    body.target.clear();

    let err = define_relationship(&store, "t1", body).await.unwrap_err();
    assert!(matches!(
      err,
      Error::Validation(ValidationError::EmptyRelationshipTarget(id)) if id == "feeds"
    ));
  }
}
