//! Schema flattening.
//!
//! A new template's attribute and metric lists become its parent's
//! (already flattened) lists followed by its own. The snapshot is taken once,
//! at creation; later changes to the parent never cascade.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result, ValidationError,
  store::{CatalogStore, Insert, require_template},
  template::{Template, TemplateAttribute, TemplateMetric, is_identity_attribute},
};

/// The parts of an attribute or metric the flattener touches.
trait SchemaField: Clone {
  fn id(&self) -> &str;
  fn id_mut(&mut self) -> &mut String;
  fn owning_template(&self) -> &str;
  fn owning_template_mut(&mut self) -> &mut String;
  /// Whether an id supplied by the caller survives creation.
  fn keeps_supplied_id(&self) -> bool;
  /// Take the editable properties of `edit`. Id, owner and declared type
  /// stay as stored.
  fn apply_edit(&mut self, edit: Self);
}

impl SchemaField for TemplateAttribute {
  fn id(&self) -> &str { &self.id }

  fn id_mut(&mut self) -> &mut String { &mut self.id }

  fn owning_template(&self) -> &str { &self.owning_template }

  fn owning_template_mut(&mut self) -> &mut String { &mut self.owning_template }

  fn keeps_supplied_id(&self) -> bool { is_identity_attribute(&self.id) }

  fn apply_edit(&mut self, edit: Self) {
    self.name = edit.name;
    self.is_required = edit.is_required;
    self.is_hidden = edit.is_hidden;
  }
}

impl SchemaField for TemplateMetric {
  fn id(&self) -> &str { &self.id }

  fn id_mut(&mut self) -> &mut String { &mut self.id }

  fn owning_template(&self) -> &str { &self.owning_template }

  fn owning_template_mut(&mut self) -> &mut String { &mut self.owning_template }

  fn keeps_supplied_id(&self) -> bool { false }

  fn apply_edit(&mut self, edit: Self) {
    self.name = edit.name;
    self.unit = edit.unit;
    self.is_manual = edit.is_manual;
    self.is_calculated = edit.is_calculated;
    self.is_sourced = edit.is_sourced;
    self.value = edit.value;
  }
}

fn fresh_id() -> String { Uuid::new_v4().to_string() }

/// Give every newly declared field a fresh id and an owner.
///
/// Only the reserved identity attribute ids are kept as supplied (root
/// templates declare them this way); they must not collide with anything
/// inherited or declared alongside them.
fn claim_new_fields<F: SchemaField>(
  inherited: &[F],
  own: &mut [F],
  owner: &str,
) -> Result<(), ValidationError> {
  let mut taken: HashSet<String> =
    inherited.iter().map(|f| f.id().to_owned()).collect();

  for field in own.iter_mut() {
    if !field.keeps_supplied_id() {
      *field.id_mut() = fresh_id();
    }
    if !taken.insert(field.id().to_owned()) {
      return Err(ValidationError::DuplicateFieldId(field.id().to_owned()));
    }
    *field.owning_template_mut() = owner.to_owned();
  }
  Ok(())
}

/// Merge an edited field list into `existing`.
///
/// Every stored field stays, in stored order. Edits apply only to fields
/// `owner` declared; inherited ones are kept as snapshotted. Fields without
/// an id are appended as new. Any other id must already be stored.
fn merge_fields<F: SchemaField>(
  existing: &[F],
  edits: Vec<F>,
  owner: &str,
) -> Result<Vec<F>, ValidationError> {
  let mut edited: HashMap<String, F> = HashMap::new();
  let mut added = Vec::new();

  for mut field in edits {
    if field.id().is_empty() {
      *field.id_mut() = fresh_id();
      *field.owning_template_mut() = owner.to_owned();
      added.push(field);
      continue;
    }
    if !existing.iter().any(|f| f.id() == field.id()) {
      return Err(ValidationError::UnknownField(field.id().to_owned()));
    }
    let id = field.id().to_owned();
    if edited.insert(id.clone(), field).is_some() {
      return Err(ValidationError::DuplicateFieldId(id));
    }
  }

  let merged = existing
    .iter()
    .map(|stored| {
      let mut kept = stored.clone();
      if stored.owning_template() == owner {
        if let Some(edit) = edited.remove(stored.id()) {
          kept.apply_edit(edit);
        }
      }
      kept
    })
    .chain(added)
    .collect();
  Ok(merged)
}

/// The `rootTemplate` a child of `parent` gets.
///
/// Always exactly one hop from the literal root, whatever the depth.
pub fn resolve_root(parent: &Template) -> String {
  parent.resolved_root().to_owned()
}

/// Build the stored form of `template` from its `parent`.
///
/// `None` makes a root template: no parent, empty `rootTemplate`, only its own
/// fields.
pub fn flatten(
  parent: Option<&Template>,
  mut template: Template,
) -> Result<Template, ValidationError> {
  let owner = template.basic_information.external_id.clone();

  let Some(parent) = parent else {
    template.basic_information.parent.clear();
    template.basic_information.root_template.clear();
    claim_new_fields::<TemplateAttribute>(&[], &mut template.attributes, &owner)?;
    claim_new_fields::<TemplateMetric>(&[], &mut template.metrics, &owner)?;
    return Ok(template);
  };

  claim_new_fields(&parent.attributes, &mut template.attributes, &owner)?;
  claim_new_fields(&parent.metrics, &mut template.metrics, &owner)?;

  template.basic_information.parent = parent.external_id().to_owned();
  template.basic_information.root_template = resolve_root(parent);
  template.attributes = parent
    .attributes
    .iter()
    .cloned()
    .chain(template.attributes)
    .collect();
  template.metrics = parent
    .metrics
    .iter()
    .cloned()
    .chain(template.metrics)
    .collect();

  Ok(template)
}

/// Apply an edited field list to `existing`, keeping its identity and
/// ancestry. Stored fields are never dropped, reordered or re-owned, so the
/// inherited prefix and every id instances refer to survive.
pub fn update_schema(
  existing: &Template,
  payload: Template,
) -> Result<Template, ValidationError> {
  let owner = existing.external_id();
  let mut updated = Template {
    tenant_id:         existing.tenant_id.clone(),
    basic_information: existing.basic_information.clone(),
    attributes:        merge_fields(&existing.attributes, payload.attributes, owner)?,
    metrics:           merge_fields(&existing.metrics, payload.metrics, owner)?,
  };
  if !payload.basic_information.name.is_empty() {
    updated.basic_information.name = payload.basic_information.name;
  }
  updated.basic_information.is_custom = payload.basic_information.is_custom;
  Ok(updated)
}

// ─── Store-backed operations ─────────────────────────────────────────────────

/// Create a template for `tenant_id`, flattening it against its parent.
pub async fn create_template<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  mut payload: Template,
) -> Result<Template> {
  let info = &mut payload.basic_information;
  if info.name.is_empty() {
    return Err(ValidationError::MissingBasicField("Name").into());
  }
  if info.external_id.is_empty() {
    return Err(ValidationError::MissingBasicField("External Id").into());
  }
  info.external_id = info.external_id.to_lowercase();
  info.parent = info.parent.to_lowercase();
  payload.tenant_id = tenant_id.to_owned();

  let parent = if payload.basic_information.is_root() {
    None
  } else {
    Some(require_template(store, tenant_id, &payload.basic_information.parent).await?)
  };

  let template = flatten(parent.as_ref(), payload)?;
  debug!(
    template = template.external_id(),
    attributes = template.attributes.len(),
    metrics = template.metrics.len(),
    "flattened template"
  );

  match store.insert_template(&template).await.map_err(Error::store)? {
    Insert::Inserted => {
      info!(tenant_id, template = template.external_id(), "created template");
      Ok(template)
    }
    Insert::Duplicate => {
      Err(Error::DuplicateExternalId(template.external_id().to_owned()))
    }
  }
}

/// Apply edits to the field lists of an existing template.
pub async fn update_template<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  external_id: &str,
  payload: Template,
) -> Result<Template> {
  let external_id = external_id.to_lowercase();
  let existing = require_template(store, tenant_id, &external_id).await?;
  let updated = update_schema(&existing, payload)?;

  if !store.replace_template(&updated).await.map_err(Error::store)? {
    return Err(Error::template_not_found(external_id));
  }
  info!(tenant_id, template = updated.external_id(), "updated template");
  Ok(updated)
}
