//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs are stored as strings; record ids are
//! the resource UUID so `meta::id(id)` round-trips to the domain id.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration bookkeeping
// -----------------------------------------------------------------------

const LEDGER_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct AppliedRow {
    version: u32,
}

/// One forward-only schema step. Versions are strictly increasing.
struct Step {
    version: u32,
    name: &'static str,
    ddl: &'static str,
}

static STEPS: &[Step] = &[Step {
    version: 1,
    name: "flaggable_resources",
    ddl: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Resumes (owner scope, at most one active per owner)
-- =======================================================================
DEFINE TABLE resume SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE resume TYPE string;
DEFINE FIELD name ON TABLE resume TYPE string;
DEFINE FIELD is_active ON TABLE resume TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE resume TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resume TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resume_owner ON TABLE resume COLUMNS owner_id;

-- =======================================================================
-- Email templates (owner scope, at most one default per owner)
-- =======================================================================
DEFINE TABLE template SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE template TYPE string;
DEFINE FIELD name ON TABLE template TYPE string;
DEFINE FIELD is_default ON TABLE template TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE template TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE template TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_template_owner ON TABLE template COLUMNS owner_id;
";

// -----------------------------------------------------------------------
// Runner
// -----------------------------------------------------------------------

/// Bring the schema up to date and return the versions applied by this
/// call (empty when already current).
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<Vec<u32>, DbError> {
    db.query(LEDGER_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("migration ledger: {e}")))?;

    let current = applied_version(db).await?;
    let mut applied = Vec::new();
    for step in STEPS.iter().filter(|s| s.version > current) {
        apply(db, step).await?;
        applied.push(step.version);
    }

    if applied.is_empty() {
        debug!(version = current, "Schema up to date");
    }
    Ok(applied)
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let rows: Vec<AppliedRow> = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?
        .take(0)?;
    Ok(rows.first().map_or(0, |r| r.version))
}

/// Run a step's DDL and its ledger entry in one transaction, so a
/// failed step leaves neither behind.
async fn apply<C: Connection>(db: &Surreal<C>, step: &Step) -> Result<(), DbError> {
    info!(version = step.version, name = step.name, "Applying migration");

    let query = format!(
        "BEGIN TRANSACTION;\n{}\nCREATE _migration SET version = $version, name = $name;\nCOMMIT TRANSACTION;",
        step.ddl
    );
    db.query(query)
        .bind(("version", step.version))
        .bind(("name", step.name))
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("v{} {}: {e}", step.version, step.name)))?;

    info!(version = step.version, "Migration applied");
    Ok(())
}

/// Raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
