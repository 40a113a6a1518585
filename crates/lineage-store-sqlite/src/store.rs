//! [`SqliteStore`], the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension as _};
use serde::de::DeserializeOwned;
use tracing::debug;

use lineage_core::{
  dropdown::{Dropdown, TypeCatalog},
  instance::{Instance, Versioned},
  relationship::RelationshipDefinition,
  store::{CatalogStore, Insert, Replace},
  template::Template,
};

use crate::{Error, Result, schema::SCHEMA};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn now() -> String { Utc::now().to_rfc3339() }

fn decode<T: DeserializeOwned>(document: &str) -> Result<T> {
  Ok(serde_json::from_str(document)?)
}

/// Run an INSERT, reporting a primary-key collision as [`Insert::Duplicate`].
fn insert_unique(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Insert> {
  match conn.execute(sql, params) {
    Ok(_) => Ok(Insert::Inserted),
    Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
      Ok(Insert::Duplicate)
    }
    Err(e) => Err(e),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lineage catalog backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read every `document` column a query returns.
  async fn documents(&self, sql: &'static str, tenant_id: &str) -> Result<Vec<String>> {
    let tenant_id = tenant_id.to_owned();
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Templates ─────────────────────────────────────────────────────────────

  async fn get_template(&self, tenant_id: &str, external_id: &str) -> Result<Option<Template>> {
    let tenant_id = tenant_id.to_owned();
    let external_id = external_id.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT document FROM templates WHERE tenant_id = ?1 AND external_id = ?2",
              rusqlite::params![tenant_id, external_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.as_deref().map(decode).transpose()
  }

  async fn list_templates(&self, tenant_id: &str) -> Result<Vec<Template>> {
    self
      .documents(
        "SELECT document FROM templates WHERE tenant_id = ?1 ORDER BY external_id",
        tenant_id,
      )
      .await?
      .iter()
      .map(|d| decode(d))
      .collect()
  }

  async fn insert_template(&self, template: &Template) -> Result<Insert> {
    let tenant_id = template.tenant_id.clone();
    let external_id = template.external_id().to_owned();
    let document = serde_json::to_string(template)?;
    let at = now();

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          "INSERT INTO templates (tenant_id, external_id, document, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![tenant_id, external_id, document, at],
        )?)
      })
      .await?;
    Ok(outcome)
  }

  async fn replace_template(&self, template: &Template) -> Result<bool> {
    let tenant_id = template.tenant_id.clone();
    let external_id = template.external_id().to_owned();
    let document = serde_json::to_string(template)?;
    let at = now();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE templates SET document = ?1, updated_at = ?2
           WHERE tenant_id = ?3 AND external_id = ?4",
          rusqlite::params![document, at, tenant_id, external_id],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Instances ─────────────────────────────────────────────────────────────

  async fn get_instance(
    &self,
    tenant_id: &str,
    external_id: &str,
  ) -> Result<Option<Versioned<Instance>>> {
    let tenant_id = tenant_id.to_owned();
    let external_id = external_id.to_owned();

    let raw: Option<(i64, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT version, document FROM instances
               WHERE tenant_id = ?1 AND external_id = ?2",
              rusqlite::params![tenant_id, external_id],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(version, document)| {
        Ok(Versioned { version: version as u64, document: decode(&document)? })
      })
      .transpose()
  }

  async fn list_instances(&self, tenant_id: &str) -> Result<Vec<Instance>> {
    self
      .documents(
        "SELECT document FROM instances WHERE tenant_id = ?1 ORDER BY external_id",
        tenant_id,
      )
      .await?
      .iter()
      .map(|d| decode(d))
      .collect()
  }

  async fn insert_instance(&self, instance: &Instance) -> Result<Insert> {
    let tenant_id = instance.tenant_id.clone();
    let external_id = instance.external_id().to_owned();
    let document = serde_json::to_string(instance)?;
    let at = now();

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          "INSERT INTO instances (tenant_id, external_id, document, version, created_at, updated_at)
           VALUES (?1, ?2, ?3, 1, ?4, ?4)",
          rusqlite::params![tenant_id, external_id, document, at],
        )?)
      })
      .await?;
    Ok(outcome)
  }

  async fn replace_instance(&self, instance: &Instance, expected_version: u64) -> Result<Replace> {
    let tenant_id = instance.tenant_id.clone();
    let external_id = instance.external_id().to_owned();
    let document = serde_json::to_string(instance)?;
    let at = now();
    let expected = expected_version as i64;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE instances SET document = ?1, version = version + 1, updated_at = ?2
           WHERE tenant_id = ?3 AND external_id = ?4 AND version = ?5",
          rusqlite::params![document, at, tenant_id, external_id, expected],
        )?)
      })
      .await?;

    if changed == 0 {
      debug!(external_id = instance.external_id(), expected_version, "stale instance version");
      return Ok(Replace::Conflict);
    }
    Ok(Replace::Replaced)
  }

  // ── Catalogs ──────────────────────────────────────────────────────────────

  async fn relationship_catalog(&self, tenant_id: &str) -> Result<Vec<RelationshipDefinition>> {
    self
      .documents(
        "SELECT document FROM relationships WHERE tenant_id = ?1 ORDER BY relationship_id",
        tenant_id,
      )
      .await?
      .iter()
      .map(|d| decode(d))
      .collect()
  }

  async fn insert_relationship(
    &self,
    tenant_id: &str,
    definition: &RelationshipDefinition,
  ) -> Result<Insert> {
    let tenant_id = tenant_id.to_owned();
    let relationship_id = definition.id.clone();
    let document = serde_json::to_string(definition)?;

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          "INSERT INTO relationships (tenant_id, relationship_id, document) VALUES (?1, ?2, ?3)",
          rusqlite::params![tenant_id, relationship_id, document],
        )?)
      })
      .await?;
    Ok(outcome)
  }

  async fn type_options(&self, catalog: TypeCatalog) -> Result<Vec<Dropdown>> {
    let catalog = catalog.to_string();

    let options = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT label, value, symbol FROM type_options WHERE catalog = ?1 ORDER BY position",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![catalog], |row| {
            Ok(Dropdown {
              label:  row.get(0)?,
              value:  row.get(1)?,
              symbol: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(options)
  }
}
