//! SQL schema for the Lineage SQLite store.
//!
//! Executed once at connection startup. Documents are opaque JSON to SQLite;
//! only the keys and the instance version live in their own columns.

/// Full schema DDL plus the built-in type catalogs; idempotent.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS templates (
    tenant_id   TEXT NOT NULL,
    external_id TEXT NOT NULL,
    document    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (tenant_id, external_id)
);

-- `version` is bumped on every replace and compared by writers.
CREATE TABLE IF NOT EXISTS instances (
    tenant_id   TEXT    NOT NULL,
    external_id TEXT    NOT NULL,
    document    TEXT    NOT NULL,
    version     INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL,
    PRIMARY KEY (tenant_id, external_id)
);

CREATE TABLE IF NOT EXISTS relationships (
    tenant_id       TEXT NOT NULL,
    relationship_id TEXT NOT NULL,
    document        TEXT NOT NULL,
    PRIMARY KEY (tenant_id, relationship_id)
);

CREATE TABLE IF NOT EXISTS type_options (
    catalog  TEXT    NOT NULL,   -- 'attribute_types' | 'metric_types' | 'units'
    value    TEXT    NOT NULL,
    label    TEXT    NOT NULL,
    symbol   TEXT    NOT NULL DEFAULT '',
    position INTEGER NOT NULL,
    PRIMARY KEY (catalog, value)
);

INSERT OR IGNORE INTO type_options (catalog, value, label, symbol, position) VALUES
    ('attribute_types', 'integer', 'Integer', '', 1),
    ('attribute_types', 'float',   'Float',   '', 2),
    ('attribute_types', 'bool',    'Boolean', '', 3),
    ('attribute_types', 'string',  'String',  '', 4),
    ('metric_types',    'integer', 'Integer', '', 1),
    ('metric_types',    'float',   'Float',   '', 2),
    ('metric_types',    'bool',    'Boolean', '', 3),
    ('metric_types',    'string',  'String',  '', 4),
    ('units', 'celsius',    'Celsius',    '°C',  1),
    ('units', 'fahrenheit', 'Fahrenheit', '°F',  2),
    ('units', 'percent',    'Percent',    '%',   3),
    ('units', 'kilowatt',   'Kilowatt',   'kW',  4),
    ('units', 'kwh',        'Kilowatt-hour', 'kWh', 5),
    ('units', 'metre',      'Metre',      'm',   6),
    ('units', 'bar',        'Bar',        'bar', 7);

PRAGMA user_version = 1;
";
