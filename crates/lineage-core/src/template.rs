//! Templates: inheritable type definitions that instances are created from.
//!
//! A stored template is a denormalised snapshot: its `attributes` and
//! `metrics` already contain every ancestor's fields, in ancestor-to-descendant
//! order, followed by its own. Parents are never re-read once a child exists.

use serde::{Deserialize, Serialize};

use crate::value::DataType;

/// Attribute ids that carry an instance's name and external id. They are
/// declared on root templates but supplied out-of-band in the instance's
/// basic information, so the validator never requires them as attributes.
pub const ASSET_NAME_ATTRIBUTE_ID: &str = "c2134cea-ddd2-43f7-a775-e4d12742ef79";
pub const SPACE_NAME_ATTRIBUTE_ID: &str = "39a04903-435e-4f91-9c68-4772292dca4a";
pub const ASSET_EXTERNAL_ID_ATTRIBUTE_ID: &str =
  "a25aefe5-b5aa-44b9-9ddf-1f911d1af502";
pub const SPACE_EXTERNAL_ID_ATTRIBUTE_ID: &str =
  "2bf69f85-50b0-4c31-a329-9bf4121a9045";

pub const IDENTITY_ATTRIBUTE_IDS: [&str; 4] = [
  ASSET_NAME_ATTRIBUTE_ID,
  SPACE_NAME_ATTRIBUTE_ID,
  ASSET_EXTERNAL_ID_ATTRIBUTE_ID,
  SPACE_EXTERNAL_ID_ATTRIBUTE_ID,
];

pub fn is_identity_attribute(id: &str) -> bool {
  IDENTITY_ATTRIBUTE_IDS.contains(&id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateBasicInformation {
  pub name:          String,
  /// External id of the parent template; empty for a root template.
  #[serde(default)]
  pub parent:        String,
  /// Stored lowercased; unique per tenant.
  pub external_id:   String,
  /// External id of the ultimate ancestor; empty on a root template itself.
  #[serde(default)]
  pub root_template: String,
  #[serde(default)]
  pub is_custom:     bool,
}

impl TemplateBasicInformation {
  pub fn is_root(&self) -> bool { self.parent.is_empty() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAttribute {
  /// Generated once and never reassigned, so instances can reference it.
  #[serde(default)]
  pub id:              String,
  pub name:            String,
  pub data_type:       DataType,
  #[serde(default)]
  pub is_required:     bool,
  #[serde(default)]
  pub is_hidden:       bool,
  #[serde(default)]
  pub owning_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetric {
  #[serde(default)]
  pub id:              String,
  pub name:            String,
  pub metric_type:     DataType,
  #[serde(default)]
  pub unit:            String,
  #[serde(default)]
  pub is_manual:       bool,
  #[serde(default)]
  pub is_calculated:   bool,
  #[serde(default)]
  pub is_sourced:      bool,
  /// Default shown to users for manually entered values.
  #[serde(default)]
  pub value:           serde_json::Value,
  #[serde(default)]
  pub owning_template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
  #[serde(default)]
  pub tenant_id:         String,
  pub basic_information: TemplateBasicInformation,
  #[serde(default)]
  pub attributes:        Vec<TemplateAttribute>,
  #[serde(default)]
  pub metrics:           Vec<TemplateMetric>,
}

impl Template {
  pub fn external_id(&self) -> &str { &self.basic_information.external_id }

  /// The root template every descendant of this template resolves to.
  ///
  /// A root template's own `rootTemplate` is empty, so the answer is its own
  /// external id; anything deeper already carries the root.
  pub fn resolved_root(&self) -> &str {
    if self.basic_information.root_template.is_empty() {
      &self.basic_information.external_id
    } else {
      &self.basic_information.root_template
    }
  }

  pub fn attribute(&self, id: &str) -> Option<&TemplateAttribute> {
    self.attributes.iter().find(|a| a.id == id)
  }

  pub fn metric(&self, id: &str) -> Option<&TemplateMetric> {
    self.metrics.iter().find(|m| m.id == id)
  }
}
