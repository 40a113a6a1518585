//! Error types for `lineage-core`.

use strum::Display;
use thiserror::Error;

use crate::value::DataType;

/// The kind of document a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Entity {
  Template,
  Instance,
}

/// Rejections raised while checking a template or instance payload.
///
/// These are always the caller's fault and map to a 400 at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("{0} is required but not provided")]
  MissingBasicField(&'static str),

  #[error("attribute {0} is required but not provided")]
  RequiredFieldMissing(String),

  #[error("attribute {0} marked as required is empty")]
  RequiredFieldEmpty(String),

  #[error("{field} is not a valid {expected} value")]
  TypeMismatch { field: String, expected: DataType },

  #[error("field {0} is not defined by the template")]
  UnknownField(String),

  #[error("field id {0} is declared more than once")]
  DuplicateFieldId(String),

  #[error("relationship type not found: {0}")]
  RelationshipTypeNotFound(String),

  #[error("relationship {relationship} starts at {expected}, not at {root}")]
  RelationshipSourceMismatch {
    relationship: String,
    expected:     String,
    root:         String,
  },

  #[error("relationship {relationship} does not accept target {target}")]
  RelationshipTargetMismatch { relationship: String, target: String },

  #[error("relationship target not found: {0}")]
  RelationshipTargetNotFound(String),

  #[error("relationship {0} has no target")]
  EmptyRelationshipTarget(String),

  #[error("relationship {relationship} allows a single target, got {count}")]
  CardinalityViolation { relationship: String, count: usize },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: String },

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("external id already exists: {0}")]
  DuplicateExternalId(String),

  /// Gave up appending an inverse link after repeated version conflicts.
  #[error("instance {id} kept changing while linking ({attempts} attempts)")]
  LinkConflict { id: String, attempts: u32 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn template_not_found(id: impl Into<String>) -> Self {
    Self::NotFound { entity: Entity::Template, id: id.into() }
  }

  pub(crate) fn instance_not_found(id: impl Into<String>) -> Self {
    Self::NotFound { entity: Entity::Instance, id: id.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
