//! Relationship linking.
//!
//! Relationships are stored as denormalised arrays inside instance documents,
//! so declaring one on a new instance means writing its inverse into every
//! target. Linking runs in two phases: [`plan`] resolves every declaration and
//! checks every target without writing anything, then [`propagate`] applies
//! the inverse links one target at a time.
//!
//! There is no transaction spanning targets. Each target is updated with a
//! compare-and-swap on its version and retried on conflict, so concurrent
//! creations never lose each other's links; a storage failure part-way
//! through leaves the links already written in place.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result, ValidationError,
  instance::{Instance, InstanceRelationship, RelationshipTarget},
  relationship::RelationshipCatalog,
  store::{CatalogStore, Replace, require_instance},
};

/// How many times a target is re-read after losing a version race.
pub const MAX_LINK_ATTEMPTS: u32 = 5;

/// A reciprocal relationship entry to write onto one target instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InverseLink {
  /// Add a fresh entry pointing at `source`; used when the declared
  /// relationship is "many".
  Append { relationship_id: String, source: String },
  /// Add `source` to the target's existing entry for `relationship_id`,
  /// creating the entry on first link; used for singular relationships.
  Merge { relationship_id: String, source: String },
}

impl InverseLink {
  /// Apply this link to `target` in memory.
  pub fn apply(&self, target: &mut Instance) {
    match self {
      Self::Append { relationship_id, source } => {
        target.relationships.push(InstanceRelationship {
          id:                       Uuid::new_v4().to_string(),
          target:                   RelationshipTarget::One(source.clone()),
          relationship_template_id: relationship_id.clone(),
        });
      }
      Self::Merge { relationship_id, source } => {
        let existing = target
          .relationships
          .iter_mut()
          .find(|r| &r.relationship_template_id == relationship_id);
        match existing {
          Some(entry) => entry.target.push(source.clone()),
          None => target.relationships.push(InstanceRelationship {
            id:                       Uuid::new_v4().to_string(),
            target:                   RelationshipTarget::Many(vec![source.clone()]),
            relationship_template_id: relationship_id.clone(),
          }),
        }
      }
    }
  }
}

/// An inverse link bound to the target instance it belongs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLink {
  pub target: String,
  pub link:   InverseLink,
}

/// Check every relationship `instance` declares and work out the inverse
/// links to write. Reads targets but writes nothing.
///
/// Target ids are normalised to lowercase in `instance` as a side effect.
pub async fn plan<S: CatalogStore>(
  store: &S,
  catalog: &RelationshipCatalog,
  instance: &mut Instance,
) -> Result<Vec<PendingLink>> {
  let mut pending = Vec::new();
  let source = instance.external_id().to_owned();
  let root = instance.root_template().to_owned();
  let tenant_id = instance.tenant_id.clone();

  for declared in &mut instance.relationships {
    let definition = catalog.resolve(&declared.relationship_template_id)?;

    if definition.source != root {
      return Err(
        ValidationError::RelationshipSourceMismatch {
          relationship: definition.id.clone(),
          expected:     definition.source.clone(),
          root:         root.clone(),
        }
        .into(),
      );
    }

    let inverse = match definition.inverse_id() {
      Some(id) => Some(catalog.resolve(id)?),
      None => None,
    };

    let targets: Vec<String> =
      declared.target.ids().iter().map(|id| id.to_lowercase()).collect();
    if targets.is_empty() {
      return Err(ValidationError::EmptyRelationshipTarget(definition.id.clone()).into());
    }
    if !definition.is_many() && targets.len() > 1 {
      return Err(
        ValidationError::CardinalityViolation {
          relationship: definition.id.clone(),
          count:        targets.len(),
        }
        .into(),
      );
    }

    for target in &targets {
      let found = store
        .get_instance(&tenant_id, target)
        .await
        .map_err(Error::store)?
        .ok_or_else(|| ValidationError::RelationshipTargetNotFound(target.clone()))?;

      if !definition.accepts_target(found.document.root_template()) {
        return Err(
          ValidationError::RelationshipTargetMismatch {
            relationship: definition.id.clone(),
            target:       target.clone(),
          }
          .into(),
        );
      }

      if let Some(inverse) = inverse {
        let relationship_id = inverse.id.clone();
        let source = source.clone();
        let link = if definition.is_many() {
          InverseLink::Append { relationship_id, source }
        } else {
          InverseLink::Merge { relationship_id, source }
        };
        pending.push(PendingLink { target: target.clone(), link });
      }
    }

    declared.target = match targets.len() {
      1 if matches!(declared.target, RelationshipTarget::One(_)) => {
        RelationshipTarget::One(targets[0].clone())
      }
      _ => RelationshipTarget::Many(targets),
    };
  }

  Ok(pending)
}

/// Write one inverse link onto `target`, re-reading and retrying when another
/// writer changed the document in between.
pub async fn apply_inverse_link<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  target: &str,
  link: &InverseLink,
) -> Result<()> {
  for attempt in 1..=MAX_LINK_ATTEMPTS {
    let current = require_instance(store, tenant_id, target).await?;
    let mut document = current.document;
    link.apply(&mut document);

    match store
      .replace_instance(&document, current.version)
      .await
      .map_err(Error::store)?
    {
      Replace::Replaced => {
        debug!(tenant_id, target, attempt, "applied inverse link");
        return Ok(());
      }
      Replace::Conflict => {
        warn!(tenant_id, target, attempt, "instance changed while linking; retrying");
      }
    }
  }

  Err(Error::LinkConflict { id: target.to_owned(), attempts: MAX_LINK_ATTEMPTS })
}

/// Apply every pending link in order. Stops at the first failure without
/// undoing earlier writes.
pub async fn propagate<S: CatalogStore>(
  store: &S,
  tenant_id: &str,
  pending: &[PendingLink],
) -> Result<()> {
  for PendingLink { target, link } in pending {
    apply_inverse_link(store, tenant_id, target, link).await?;
  }
  Ok(())
}
