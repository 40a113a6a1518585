//! In-memory [`CatalogStore`] used by the engine's unit tests.

use std::{
  collections::BTreeMap,
  convert::Infallible,
  sync::{
    Mutex,
    atomic::{AtomicU32, Ordering},
  },
};

use crate::{
  dropdown::{Dropdown, TypeCatalog},
  instance::{Instance, Versioned},
  relationship::RelationshipDefinition,
  store::{CatalogStore, Insert, Replace},
  template::Template,
};

type Key = (String, String);

#[derive(Default)]
pub struct MemoryStore {
  templates:        Mutex<BTreeMap<Key, Template>>,
  instances:        Mutex<BTreeMap<Key, Versioned<Instance>>>,
  relationships:    Mutex<Vec<(String, RelationshipDefinition)>>,
  /// Replaces that will lose to a simulated concurrent writer.
  forced_conflicts: AtomicU32,
}

fn key(tenant_id: &str, external_id: &str) -> Key {
  (tenant_id.to_owned(), external_id.to_owned())
}

impl MemoryStore {
  pub fn put(&self, instance: Instance) {
    let k = key(&instance.tenant_id, instance.external_id());
    self
      .instances
      .lock()
      .unwrap()
      .insert(k, Versioned { version: 1, document: instance });
  }

  pub fn put_template(&self, template: Template) {
    let k = key(&template.tenant_id, template.external_id());
    self.templates.lock().unwrap().insert(k, template);
  }

  pub fn put_relationship(&self, tenant_id: &str, definition: RelationshipDefinition) {
    self
      .relationships
      .lock()
      .unwrap()
      .push((tenant_id.to_owned(), definition));
  }

  /// The stored document for `external_id` in tenant `t1`.
  pub fn document(&self, external_id: &str) -> Instance {
    self.instances.lock().unwrap()[&key("t1", external_id)]
      .document
      .clone()
  }

  pub fn contains(&self, external_id: &str) -> bool {
    self.instances.lock().unwrap().contains_key(&key("t1", external_id))
  }

  pub fn fail_next_replaces(&self, count: u32) {
    self.forced_conflicts.store(count, Ordering::SeqCst);
  }
}

impl CatalogStore for MemoryStore {
  type Error = Infallible;

  async fn get_template(
    &self,
    tenant_id: &str,
    external_id: &str,
  ) -> Result<Option<Template>, Infallible> {
    Ok(self.templates.lock().unwrap().get(&key(tenant_id, external_id)).cloned())
  }

  async fn list_templates(&self, tenant_id: &str) -> Result<Vec<Template>, Infallible> {
    Ok(
      self
        .templates
        .lock()
        .unwrap()
        .iter()
        .filter(|((t, _), _)| t == tenant_id)
        .map(|(_, v)| v.clone())
        .collect(),
    )
  }

  async fn insert_template(&self, template: &Template) -> Result<Insert, Infallible> {
    let mut templates = self.templates.lock().unwrap();
    let k = key(&template.tenant_id, template.external_id());
    if templates.contains_key(&k) {
      return Ok(Insert::Duplicate);
    }
    templates.insert(k, template.clone());
    Ok(Insert::Inserted)
  }

  async fn replace_template(&self, template: &Template) -> Result<bool, Infallible> {
    let mut templates = self.templates.lock().unwrap();
    match templates.get_mut(&key(&template.tenant_id, template.external_id())) {
      Some(slot) => {
        *slot = template.clone();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn get_instance(
    &self,
    tenant_id: &str,
    external_id: &str,
  ) -> Result<Option<Versioned<Instance>>, Infallible> {
    Ok(self.instances.lock().unwrap().get(&key(tenant_id, external_id)).cloned())
  }

  async fn list_instances(&self, tenant_id: &str) -> Result<Vec<Instance>, Infallible> {
    Ok(
      self
        .instances
        .lock()
        .unwrap()
        .iter()
        .filter(|((t, _), _)| t == tenant_id)
        .map(|(_, v)| v.document.clone())
        .collect(),
    )
  }

  async fn insert_instance(&self, instance: &Instance) -> Result<Insert, Infallible> {
    let mut instances = self.instances.lock().unwrap();
    let k = key(&instance.tenant_id, instance.external_id());
    if instances.contains_key(&k) {
      return Ok(Insert::Duplicate);
    }
    instances.insert(k, Versioned { version: 1, document: instance.clone() });
    Ok(Insert::Inserted)
  }

  async fn replace_instance(
    &self,
    instance: &Instance,
    expected_version: u64,
  ) -> Result<Replace, Infallible> {
    let mut instances = self.instances.lock().unwrap();
    let Some(slot) = instances.get_mut(&key(&instance.tenant_id, instance.external_id()))
    else {
      return Ok(Replace::Conflict);
    };

    let forced = self
      .forced_conflicts
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if forced {
      slot.version += 1;
      return Ok(Replace::Conflict);
    }

    if slot.version != expected_version {
      return Ok(Replace::Conflict);
    }
    *slot = Versioned { version: expected_version + 1, document: instance.clone() };
    Ok(Replace::Replaced)
  }

  async fn relationship_catalog(
    &self,
    tenant_id: &str,
  ) -> Result<Vec<RelationshipDefinition>, Infallible> {
    Ok(
      self
        .relationships
        .lock()
        .unwrap()
        .iter()
        .filter(|(t, _)| t == tenant_id)
        .map(|(_, d)| d.clone())
        .collect(),
    )
  }

  async fn insert_relationship(
    &self,
    tenant_id: &str,
    definition: &RelationshipDefinition,
  ) -> Result<Insert, Infallible> {
    let mut relationships = self.relationships.lock().unwrap();
    if relationships.iter().any(|(t, d)| t == tenant_id && d.id == definition.id) {
      return Ok(Insert::Duplicate);
    }
    relationships.push((tenant_id.to_owned(), definition.clone()));
    Ok(Insert::Inserted)
  }

  async fn type_options(&self, catalog: TypeCatalog) -> Result<Vec<Dropdown>, Infallible> {
    let options = match catalog {
      TypeCatalog::AttributeTypes | TypeCatalog::MetricTypes => vec![
        Dropdown { label: "Integer".into(), value: "integer".into(), symbol: String::new() },
        Dropdown { label: "String".into(), value: "string".into(), symbol: String::new() },
      ],
      TypeCatalog::Units => vec![],
    };
    Ok(options)
  }
}
