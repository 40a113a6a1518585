//! Read-through lookup catalogs used to populate UI pickers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::template::Template;

/// One entry of a type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dropdown {
  pub label:  String,
  pub value:  String,
  #[serde(default)]
  pub symbol: String,
}

/// The read-only catalogs a store serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TypeCatalog {
  AttributeTypes,
  MetricTypes,
  Units,
}

/// A template offered as a parent when creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentTemplateOption {
  pub label:         String,
  pub value:         String,
  pub root_template: String,
}

/// Every template offered as a parent, sorted case-insensitively by name.
///
/// `rootTemplate` is the root a child of the option would inherit from.
pub fn parent_template_options(templates: &[Template]) -> Vec<ParentTemplateOption> {
  let mut options: Vec<_> = templates
    .iter()
    .map(|t| ParentTemplateOption {
      label:         t.basic_information.name.clone(),
      value:         t.external_id().to_owned(),
      root_template: t.resolved_root().to_owned(),
    })
    .collect();
  options.sort_by_cached_key(|o| o.label.to_lowercase());
  options
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::template::TemplateBasicInformation;

  fn template(name: &str, external_id: &str, root: &str) -> Template {
    Template {
      basic_information: TemplateBasicInformation {
        name: name.into(),
        external_id: external_id.into(),
        root_template: root.into(),
        ..Default::default()
      },
      ..Default::default()
    }
  }

  #[test]
  fn options_sort_by_label_ignoring_case() {
    let options = parent_template_options(&[
      template("pump", "pump", "asset"),
      template("Asset", "asset", ""),
      template("Building", "building", "space"),
    ]);

    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["Asset", "Building", "pump"]);
    assert_eq!(options[0].root_template, "asset");
    assert_eq!(options[2].root_template, "asset");
  }

  #[test]
  fn catalog_names_parse() {
    assert_eq!("metric_types".parse::<TypeCatalog>().unwrap(), TypeCatalog::MetricTypes);
    assert_eq!(TypeCatalog::AttributeTypes.to_string(), "attribute_types");
  }
}
