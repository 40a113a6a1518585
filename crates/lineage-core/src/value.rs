//! Declared data types and the typed values the validator produces.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The declared type of a template attribute or metric.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
  Integer,
  Float,
  Bool,
  String,
}

/// A coerced attribute or metric value.
///
/// Inbound payloads carry untyped JSON; nothing downstream of the validator
/// ever sees the raw input again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
  Integer(i64),
  Float(f64),
  Bool(bool),
  String(String),
}

impl FieldValue {
  pub fn data_type(&self) -> DataType {
    match self {
      Self::Integer(_) => DataType::Integer,
      Self::Float(_) => DataType::Float,
      Self::Bool(_) => DataType::Bool,
      Self::String(_) => DataType::String,
    }
  }
}
