//! Form metadata for creating an instance of a template.
//!
//! Derived purely from the flattened schema and the attribute-type catalog.

use serde::Serialize;
use serde_json::Value;

use crate::{
  Error, Result,
  dropdown::{Dropdown, TypeCatalog},
  instance::MetricBehaviour,
  store::{CatalogStore, require_template},
  template::{
    ASSET_EXTERNAL_ID_ATTRIBUTE_ID, ASSET_NAME_ATTRIBUTE_ID, SPACE_EXTERNAL_ID_ATTRIBUTE_ID,
    SPACE_NAME_ATTRIBUTE_ID, Template, TemplateAttribute, TemplateMetric, is_identity_attribute,
  },
  value::DataType,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
  pub id:              String,
  pub label:           String,
  pub info_text:       String,
  pub type_label:      String,
  #[serde(rename = "type")]
  pub data_type:       Option<DataType>,
  pub is_required:     bool,
  pub is_hidden:       bool,
  pub dropdown_values: Vec<MetricBehaviour>,
  pub manual_value:    Value,
  pub unit:            String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormSection {
  pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceForm {
  pub basic_information: FormSection,
  pub attributes:        FormSection,
  pub metrics:           FormSection,
}

/// Identity attributes in the order their form fields are emitted.
const BASIC_FIELDS: [(&str, &str, &str); 4] = [
  (ASSET_NAME_ATTRIBUTE_ID, "Name", "This will be the name of your instance."),
  (SPACE_NAME_ATTRIBUTE_ID, "Name", "This will be the name of your instance."),
  (ASSET_EXTERNAL_ID_ATTRIBUTE_ID, "External ID", "A unique identifier for your instance."),
  (SPACE_EXTERNAL_ID_ATTRIBUTE_ID, "External ID", "A unique identifier for your instance."),
];

fn basic_field(id: &str, label: &str, info_text: &str) -> FormField {
  FormField {
    id: id.to_owned(),
    label: label.to_owned(),
    info_text: info_text.to_owned(),
    type_label: "String".to_owned(),
    data_type: Some(DataType::String),
    is_required: true,
    ..Default::default()
  }
}

fn attribute_field(attribute: &TemplateAttribute, attribute_types: &[Dropdown]) -> FormField {
  let raw = attribute.data_type.to_string();
  let type_label = attribute_types
    .iter()
    .find(|d| d.value == raw)
    .map_or(raw.clone(), |d| d.label.clone());

  FormField {
    id: attribute.id.clone(),
    label: attribute.name.clone(),
    type_label,
    data_type: Some(attribute.data_type),
    is_required: attribute.is_required,
    is_hidden: attribute.is_hidden,
    ..Default::default()
  }
}

fn metric_field(metric: &TemplateMetric) -> FormField {
  let dropdown_values = [
    (metric.is_calculated, MetricBehaviour::Calculated),
    (metric.is_sourced, MetricBehaviour::Sourced),
    (metric.is_manual, MetricBehaviour::Manual),
  ]
  .into_iter()
  .filter_map(|(allowed, behaviour)| allowed.then_some(behaviour))
  .collect();

  FormField {
    id: metric.id.clone(),
    label: metric.name.clone(),
    data_type: Some(metric.metric_type),
    dropdown_values,
    manual_value: metric.value.clone(),
    unit: metric.unit.clone(),
    ..Default::default()
  }
}

/// Describe the fields a client must fill in to create an instance of
/// `template`.
pub fn build_instance_form(template: &Template, attribute_types: &[Dropdown]) -> InstanceForm {
  let basic_information = BASIC_FIELDS
    .iter()
    .filter(|(id, ..)| template.attribute(id).is_some())
    .map(|(id, label, info)| basic_field(id, label, info))
    .collect();

  let attributes = template
    .attributes
    .iter()
    .filter(|a| !is_identity_attribute(&a.id))
    .map(|a| attribute_field(a, attribute_types))
    .collect();

  let metrics = template.metrics.iter().map(metric_field).collect();

  InstanceForm {
    basic_information: FormSection { fields: basic_information },
    attributes:        FormSection { fields: attributes },
    metrics:           FormSection { fields: metrics },
  }
}

/// Load `parent` and the attribute-type catalog, then build its form.
pub async fn instance_form<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  parent: &str,
) -> Result<InstanceForm> {
  let template = require_template(store, tenant_id, &parent.to_lowercase()).await?;
  let attribute_types = store
    .type_options(TypeCatalog::AttributeTypes)
    .await
    .map_err(Error::store)?;
  Ok(build_instance_form(&template, &attribute_types))
}
