//! Instances: concrete objects created from a template.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::value::FieldValue;

// ─── Stored document ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceBasicInformation {
  pub name:          String,
  /// Stored lowercased; unique per tenant.
  pub external_id:   String,
  /// External id of the template this instance was created from.
  pub parent:        String,
  pub is_custom:     bool,
  pub root_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceAttribute {
  /// References a [`TemplateAttribute`](crate::template::TemplateAttribute) id.
  pub id:    String,
  /// `None` when an optional attribute was supplied empty.
  pub value: Option<FieldValue>,
}

/// Where a metric's value comes from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
pub enum MetricBehaviour {
  Manual,
  Calculated,
  Sourced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMetric {
  pub id:               String,
  pub metric_behaviour: MetricBehaviour,
  /// Only manual metrics carry a value here; the others are produced elsewhere.
  pub value:            Option<FieldValue>,
}

/// One or many target instance external ids.
///
/// Declared relationships always arrive as a list. Inverse entries written for
/// a "many" relationship hold a single id; those written for a singular one
/// hold the growing list of sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipTarget {
  One(String),
  Many(Vec<String>),
}

impl RelationshipTarget {
  pub fn ids(&self) -> &[String] {
    match self {
      Self::One(id) => std::slice::from_ref(id),
      Self::Many(ids) => ids,
    }
  }

  /// Add `id`, widening a single target into a list.
  pub fn push(&mut self, id: String) {
    match self {
      Self::One(existing) => {
        *self = Self::Many(vec![std::mem::take(existing), id]);
      }
      Self::Many(ids) => ids.push(id),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRelationship {
  /// Generated on creation when the caller leaves it empty.
  #[serde(default)]
  pub id:                       String,
  pub target:                   RelationshipTarget,
  pub relationship_template_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
  pub tenant_id:         String,
  pub basic_information: InstanceBasicInformation,
  pub attributes:        Vec<InstanceAttribute>,
  pub metrics:           Vec<InstanceMetric>,
  pub relationships:     Vec<InstanceRelationship>,
}

impl Instance {
  pub fn external_id(&self) -> &str { &self.basic_information.external_id }

  pub fn root_template(&self) -> &str { &self.basic_information.root_template }
}

/// A stored document together with the version it was read at.
///
/// Pass `version` back to a compare-and-swap replace to detect writers that
/// got there first.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
  pub version:  u64,
  pub document: T,
}

// ─── Inbound payload ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBasicInformation {
  #[serde(default)]
  pub name:        String,
  #[serde(default)]
  pub external_id: String,
  #[serde(default)]
  pub parent:      String,
}

/// An attribute as supplied by a client, before coercion.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAttribute {
  pub id:    String,
  #[serde(default)]
  pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetric {
  pub id:               String,
  pub metric_behaviour: MetricBehaviour,
  #[serde(default)]
  pub value:            serde_json::Value,
}

/// Body accepted by instance creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstance {
  pub basic_information: NewBasicInformation,
  #[serde(default)]
  pub attributes:        Vec<RawAttribute>,
  #[serde(default)]
  pub metrics:           Vec<RawMetric>,
  #[serde(default)]
  pub relationships:     Vec<InstanceRelationship>,
}
