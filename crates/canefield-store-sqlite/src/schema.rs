//! SQL schema for the Canefield SQLite mirror.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS farms (
    farm_id       INTEGER PRIMARY KEY,
    name          TEXT NOT NULL,
    owner         TEXT NOT NULL,
    document      TEXT NOT NULL,
    document_kind TEXT NOT NULL,   -- 'personal' | 'corporate'
    location      TEXT NOT NULL,
    created_at    TEXT NOT NULL    -- ISO 8601 UTC
);

-- Plot order within a farm is registration order.
CREATE TABLE IF NOT EXISTS plots (
    farm_id       INTEGER NOT NULL REFERENCES farms(farm_id),
    position      INTEGER NOT NULL,
    code          TEXT NOT NULL,
    area          REAL NOT NULL,
    variety       TEXT NOT NULL,
    planting_year INTEGER NOT NULL,
    status        TEXT NOT NULL DEFAULT 'active',
    latitude      REAL NOT NULL DEFAULT 0,
    longitude     REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (farm_id, code)
);

CREATE TABLE IF NOT EXISTS harvests (
    harvest_id     INTEGER PRIMARY KEY,
    farm_id        INTEGER NOT NULL,
    farm_name      TEXT NOT NULL,
    plot_code      TEXT NOT NULL,
    harvest_date   TEXT NOT NULL,  -- YYYY-MM-DD
    registered_at  TEXT NOT NULL,  -- ISO 8601 UTC
    method         TEXT NOT NULL,
    harvested_area REAL NOT NULL,
    variety        TEXT NOT NULL,
    quantity       REAL NOT NULL,
    productivity   REAL NOT NULL,
    total_loss_pct REAL NOT NULL,
    lost_quantity  REAL NOT NULL,
    severity       TEXT NOT NULL
);

-- One row per loss-summary entry; position 0 is the largest loss.
CREATE TABLE IF NOT EXISTS harvest_losses (
    harvest_id INTEGER NOT NULL REFERENCES harvests(harvest_id),
    position   INTEGER NOT NULL,
    category   TEXT NOT NULL,
    pct        REAL NOT NULL,
    PRIMARY KEY (harvest_id, position)
);

CREATE INDEX IF NOT EXISTS harvests_farm_idx ON harvests(farm_id, plot_code);

PRAGMA user_version = 1;
";
