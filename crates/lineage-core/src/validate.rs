//! Attribute and metric validation.
//!
//! Stateless: takes the raw values from an instance payload and the
//! flattened template schema, and returns typed values or the first
//! violation found. Nothing here touches storage.

use std::{
  collections::{HashMap, HashSet},
  sync::LazyLock,
};

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::{
  ValidationError,
  instance::{InstanceAttribute, InstanceMetric, MetricBehaviour, RawAttribute, RawMetric},
  template::{TemplateAttribute, TemplateMetric, is_identity_attribute},
  value::{DataType, FieldValue},
};

static PLAIN_TEXT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s]*$").expect("valid pattern"));

/// Read the textual form of an untyped input value.
///
/// Strings are the expected shape; numbers and booleans are accepted by their
/// JSON text and `null` reads as empty.
fn raw_text(field: &str, value: &Value, expected: DataType) -> Result<String, ValidationError> {
  match value {
    Value::Null => Ok(String::new()),
    Value::String(s) => Ok(s.clone()),
    Value::Number(n) => Ok(n.to_string()),
    Value::Bool(b) => Ok(b.to_string()),
    Value::Array(_) | Value::Object(_) => Err(ValidationError::TypeMismatch {
      field: field.to_owned(),
      expected,
    }),
  }
}

fn parse_bool(text: &str) -> Option<bool> {
  match text.to_lowercase().as_str() {
    "1" | "t" | "true" => Some(true),
    "0" | "f" | "false" => Some(false),
    _ => None,
  }
}

/// Coerce non-empty `text` to `data_type`.
///
/// Strings outside the plain alphanumeric set are logged but still accepted.
/// Non-finite floats are rejected; they have no JSON representation.
pub fn coerce(field: &str, text: &str, data_type: DataType) -> Result<FieldValue, ValidationError> {
  let mismatch = || ValidationError::TypeMismatch {
    field:    field.to_owned(),
    expected: data_type,
  };

  match data_type {
    DataType::Integer => text.parse().map(FieldValue::Integer).map_err(|_| mismatch()),
    DataType::Float => text
      .parse()
      .ok()
      .filter(|f: &f64| f.is_finite())
      .map(FieldValue::Float)
      .ok_or_else(mismatch),
    DataType::Bool => parse_bool(text).map(FieldValue::Bool).ok_or_else(mismatch),
    DataType::String => {
      if !PLAIN_TEXT.is_match(text) {
        warn!(field, "value is not a plain alphanumeric string");
      }
      Ok(FieldValue::String(text.to_owned()))
    }
  }
}

/// Reject a payload that names the same field twice.
fn reject_repeats<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<(), ValidationError> {
  let mut seen = HashSet::new();
  for id in ids {
    if !seen.insert(id) {
      return Err(ValidationError::DuplicateFieldId(id.to_owned()));
    }
  }
  Ok(())
}

/// Check `supplied` against `schema` and coerce every value.
///
/// Required attributes other than the identity ones must be present and
/// non-empty; every supplied id must exist in the schema and appear once. An
/// empty optional value is stored as `None`.
pub fn validate_attributes(
  supplied: &[RawAttribute],
  schema: &[TemplateAttribute],
) -> Result<Vec<InstanceAttribute>, ValidationError> {
  reject_repeats(supplied.iter().map(|s| s.id.as_str()))?;

  for attribute in schema {
    if attribute.is_required
      && !is_identity_attribute(&attribute.id)
      && !supplied.iter().any(|s| s.id == attribute.id)
    {
      return Err(ValidationError::RequiredFieldMissing(attribute.name.clone()));
    }
  }

  let by_id: HashMap<&str, &TemplateAttribute> =
    schema.iter().map(|a| (a.id.as_str(), a)).collect();

  supplied
    .iter()
    .map(|raw| {
      let declared = by_id
        .get(raw.id.as_str())
        .ok_or_else(|| ValidationError::UnknownField(raw.id.clone()))?;

      let text = raw_text(&declared.name, &raw.value, declared.data_type)?;
      if text.is_empty() {
        if declared.is_required {
          return Err(ValidationError::RequiredFieldEmpty(declared.name.clone()));
        }
        return Ok(InstanceAttribute { id: raw.id.clone(), value: None });
      }

      let value = coerce(&declared.name, &text, declared.data_type)?;
      Ok(InstanceAttribute { id: raw.id.clone(), value: Some(value) })
    })
    .collect()
}

/// Check and coerce manual metric values.
///
/// Calculated and sourced metrics are produced elsewhere; they are kept with
/// their behaviour and no value.
pub fn validate_metrics(
  supplied: &[RawMetric],
  schema: &[TemplateMetric],
) -> Result<Vec<InstanceMetric>, ValidationError> {
  reject_repeats(supplied.iter().map(|m| m.id.as_str()))?;

  let by_id: HashMap<&str, &TemplateMetric> =
    schema.iter().map(|m| (m.id.as_str(), m)).collect();

  supplied
    .iter()
    .map(|raw| {
      if raw.metric_behaviour != MetricBehaviour::Manual {
        return Ok(InstanceMetric {
          id:               raw.id.clone(),
          metric_behaviour: raw.metric_behaviour,
          value:            None,
        });
      }

      let declared = by_id
        .get(raw.id.as_str())
        .ok_or_else(|| ValidationError::UnknownField(raw.id.clone()))?;

      let text = raw_text(&declared.name, &raw.value, declared.metric_type)?;
      let value = if text.is_empty() {
        None
      } else {
        Some(coerce(&declared.name, &text, declared.metric_type)?)
      };

      Ok(InstanceMetric {
        id: raw.id.clone(),
        metric_behaviour: MetricBehaviour::Manual,
        value,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::template::ASSET_NAME_ATTRIBUTE_ID;

  fn attribute(id: &str, name: &str, data_type: DataType, is_required: bool) -> TemplateAttribute {
    TemplateAttribute {
      id: id.into(),
      name: name.into(),
      data_type,
      is_required,
      is_hidden: false,
      owning_template: "asset".into(),
    }
  }

  fn metric(id: &str, metric_type: DataType) -> TemplateMetric {
    TemplateMetric {
      id: id.into(),
      name: id.into(),
      metric_type,
      unit: String::new(),
      is_manual: true,
      is_calculated: true,
      is_sourced: false,
      value: Value::Null,
      owning_template: "asset".into(),
    }
  }

  fn raw(id: &str, value: Value) -> RawAttribute {
    RawAttribute { id: id.into(), value }
  }

  fn raw_metric(id: &str, behaviour: MetricBehaviour, value: Value) -> RawMetric {
    RawMetric { id: id.into(), metric_behaviour: behaviour, value }
  }

  #[test]
  fn integer_text_coerces_to_integer() {
    let schema = [attribute("count", "count", DataType::Integer, false)];
    let out = validate_attributes(&[raw("count", json!("42"))], &schema).unwrap();
    assert_eq!(out[0].value, Some(FieldValue::Integer(42)));
  }

  #[test]
  fn non_numeric_text_for_integer_is_a_type_mismatch() {
    let schema = [attribute("count", "count", DataType::Integer, false)];
    let err = validate_attributes(&[raw("count", json!("abc"))], &schema).unwrap_err();
    assert_eq!(
      err,
      ValidationError::TypeMismatch { field: "count".into(), expected: DataType::Integer }
    );
  }

  #[test]
  fn float_and_bool_coerce() {
    let schema = [
      attribute("range", "range", DataType::Float, false),
      attribute("active", "active", DataType::Bool, false),
    ];
    let out = validate_attributes(
      &[raw("range", json!("12.5")), raw("active", json!("TRUE"))],
      &schema,
    )
    .unwrap();
    assert_eq!(out[0].value, Some(FieldValue::Float(12.5)));
    assert_eq!(out[1].value, Some(FieldValue::Bool(true)));
  }

  #[test]
  fn bool_rejects_words_outside_the_accepted_set() {
    assert_eq!(parse_bool("F"), Some(false));
    assert_eq!(parse_bool("1"), Some(true));
    assert_eq!(parse_bool("yes"), None);
  }

  #[test]
  fn json_numbers_are_read_by_their_text() {
    let schema = [attribute("count", "count", DataType::Integer, false)];
    let out = validate_attributes(&[raw("count", json!(7))], &schema).unwrap();
    assert_eq!(out[0].value, Some(FieldValue::Integer(7)));
  }

  #[test]
  fn structured_values_are_rejected() {
    let schema = [attribute("serial", "serial", DataType::String, false)];
    let err = validate_attributes(&[raw("serial", json!(["a"]))], &schema).unwrap_err();
    assert!(matches!(err, ValidationError::TypeMismatch { .. }));
  }

  #[test]
  fn strings_outside_the_plain_set_are_still_accepted() {
    let schema = [attribute("serial", "serial", DataType::String, false)];
    let out = validate_attributes(&[raw("serial", json!("A-1/β"))], &schema).unwrap();
    assert_eq!(out[0].value, Some(FieldValue::String("A-1/β".into())));
  }

  #[test]
  fn missing_required_attribute_is_reported_by_name() {
    let schema = [attribute("s1", "serial", DataType::String, true)];
    let err = validate_attributes(&[], &schema).unwrap_err();
    assert_eq!(err, ValidationError::RequiredFieldMissing("serial".into()));
  }

  #[test]
  fn identity_attributes_are_not_required() {
    let schema = [attribute(ASSET_NAME_ATTRIBUTE_ID, "Name", DataType::String, true)];
    assert!(validate_attributes(&[], &schema).unwrap().is_empty());
  }

  #[test]
  fn empty_required_attribute_is_rejected() {
    let schema = [attribute("s1", "serial", DataType::String, true)];
    let err = validate_attributes(&[raw("s1", json!(""))], &schema).unwrap_err();
    assert_eq!(err, ValidationError::RequiredFieldEmpty("serial".into()));
  }

  #[test]
  fn empty_optional_attribute_has_no_value() {
    let schema = [attribute("count", "count", DataType::Integer, false)];
    let out = validate_attributes(&[raw("count", Value::Null)], &schema).unwrap();
    assert_eq!(out[0].value, None);
  }

  #[test]
  fn unknown_attribute_is_rejected() {
    let schema = [attribute("s1", "serial", DataType::String, false)];
    let err = validate_attributes(&[raw("nope", json!("x"))], &schema).unwrap_err();
    assert_eq!(err, ValidationError::UnknownField("nope".into()));
  }

  #[test]
  fn manual_metrics_are_coerced() {
    let schema = [metric("temp", DataType::Float)];
    let out = validate_metrics(
      &[raw_metric("temp", MetricBehaviour::Manual, json!("21.5"))],
      &schema,
    )
    .unwrap();
    assert_eq!(out[0].value, Some(FieldValue::Float(21.5)));

    let err = validate_metrics(
      &[raw_metric("temp", MetricBehaviour::Manual, json!("warm"))],
      &schema,
    )
    .unwrap_err();
    assert!(matches!(err, ValidationError::TypeMismatch { .. }));
  }

  #[test]
  fn calculated_and_sourced_metrics_skip_coercion() {
    let schema = [metric("temp", DataType::Float)];
    let out = validate_metrics(
      &[
        raw_metric("temp", MetricBehaviour::Calculated, json!("not a number")),
        raw_metric("other", MetricBehaviour::Sourced, json!("x")),
      ],
      &schema,
    )
    .unwrap();
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|m| m.value.is_none()));
    assert_eq!(out[1].metric_behaviour, MetricBehaviour::Sourced);
  }

  #[test]
  fn unknown_manual_metric_is_rejected() {
    let err = validate_metrics(
      &[raw_metric("ghost", MetricBehaviour::Manual, json!("1"))],
      &[],
    )
    .unwrap_err();
    assert_eq!(err, ValidationError::UnknownField("ghost".into()));
  }

  #[test]
  fn non_finite_floats_are_a_type_mismatch() {
    let schema = [attribute("range", "range", DataType::Float, false)];
    for text in ["NaN", "inf", "-infinity"] {
      let err = validate_attributes(&[raw("range", json!(text))], &schema).unwrap_err();
      assert_eq!(
        err,
        ValidationError::TypeMismatch { field: "range".into(), expected: DataType::Float }
      );
    }

    let metrics = [metric("temp", DataType::Float)];
    let err = validate_metrics(
      &[raw_metric("temp", MetricBehaviour::Manual, json!("inf"))],
      &metrics,
    )
    .unwrap_err();
    assert!(matches!(err, ValidationError::TypeMismatch { .. }));
  }

  #[test]
  fn repeated_attribute_id_is_rejected() {
    let schema = [attribute("count", "count", DataType::Integer, false)];
    let err = validate_attributes(
      &[raw("count", json!("1")), raw("count", json!("2"))],
      &schema,
    )
    .unwrap_err();
    assert_eq!(err, ValidationError::DuplicateFieldId("count".into()));
  }

  #[test]
  fn repeated_metric_id_is_rejected() {
    let schema = [metric("temp", DataType::Float)];
    let err = validate_metrics(
      &[
        raw_metric("temp", MetricBehaviour::Manual, json!("1")),
        raw_metric("temp", MetricBehaviour::Calculated, Value::Null),
      ],
      &schema,
    )
    .unwrap_err();
    assert_eq!(err, ValidationError::DuplicateFieldId("temp".into()));
  }
}
