//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- IMPORTED RECORDS
        -- Raw laboratory data, one row per oil
        -- ============================================
        CREATE TABLE imported_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            adios_oil_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            location TEXT,
            field_name TEXT,
            product_type TEXT,
            oil_class TEXT,
            api REAL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_imported_records_name ON imported_records(name);

        -- Measurement tables share one shape: value, reference temperature, weathering.
        -- Temperature and weathering may be missing in the source data.
        CREATE TABLE imported_densities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            imported_record_id INTEGER NOT NULL REFERENCES imported_records(id) ON DELETE CASCADE,
            kg_m_3 REAL NOT NULL,
            ref_temp_k REAL,
            weathering REAL
        );

        CREATE TABLE imported_kvis (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            imported_record_id INTEGER NOT NULL REFERENCES imported_records(id) ON DELETE CASCADE,
            m_2_s REAL NOT NULL,
            ref_temp_k REAL,
            weathering REAL
        );

        CREATE TABLE imported_dvis (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            imported_record_id INTEGER NOT NULL REFERENCES imported_records(id) ON DELETE CASCADE,
            kg_ms REAL NOT NULL,
            ref_temp_k REAL,
            weathering REAL
        );

        CREATE TABLE imported_cuts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            imported_record_id INTEGER NOT NULL REFERENCES imported_records(id) ON DELETE CASCADE,
            vapor_temp_k REAL NOT NULL,
            liquid_temp_k REAL,
            fraction REAL NOT NULL
        );

        CREATE TABLE imported_molecular_weights (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            imported_record_id INTEGER NOT NULL REFERENCES imported_records(id) ON DELETE CASCADE,
            ref_temp_k REAL NOT NULL,
            saturate REAL NOT NULL,
            aromatic REAL NOT NULL
        );

        CREATE TABLE imported_sara_fractions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            imported_record_id INTEGER NOT NULL REFERENCES imported_records(id) ON DELETE CASCADE,
            sara_type TEXT NOT NULL CHECK(sara_type IN ('saturates', 'aromatics', 'resins', 'asphaltenes')),
            fraction REAL NOT NULL
        );

        CREATE INDEX idx_imported_densities_record ON imported_densities(imported_record_id);
        CREATE INDEX idx_imported_kvis_record ON imported_kvis(imported_record_id);
        CREATE INDEX idx_imported_dvis_record ON imported_dvis(imported_record_id);
        CREATE INDEX idx_imported_cuts_record ON imported_cuts(imported_record_id);
        CREATE INDEX idx_imported_mw_record ON imported_molecular_weights(imported_record_id);
        CREATE INDEX idx_imported_sara_record ON imported_sara_fractions(imported_record_id);

        -- ============================================
        -- CATEGORIES
        -- Tree of oil categories, walked through parent_id
        -- ============================================
        CREATE TABLE categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            parent_id INTEGER REFERENCES categories(id) ON DELETE SET NULL
        );

        CREATE TABLE imported_record_categories (
            imported_record_id INTEGER NOT NULL REFERENCES imported_records(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            PRIMARY KEY (imported_record_id, category_id)
        );

        -- ============================================
        -- OILS
        -- Derived records, one-to-one with imported records
        -- ============================================
        CREATE TABLE oils (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            imported_record_id INTEGER NOT NULL UNIQUE REFERENCES imported_records(id) ON DELETE CASCADE,
            adios_oil_id TEXT NOT NULL,
            name TEXT NOT NULL,
            api REAL NOT NULL,
            density_15c_kg_m_3 REAL NOT NULL,
            reconstructed_density_kg_m_3 REAL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE oil_densities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            oil_id INTEGER NOT NULL REFERENCES oils(id) ON DELETE CASCADE,
            kg_m_3 REAL NOT NULL,
            ref_temp_k REAL NOT NULL,
            weathering REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE oil_kvis (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            oil_id INTEGER NOT NULL REFERENCES oils(id) ON DELETE CASCADE,
            m_2_s REAL NOT NULL,
            ref_temp_k REAL NOT NULL,
            weathering REAL NOT NULL DEFAULT 0,
            UNIQUE(oil_id, ref_temp_k, weathering)
        );

        CREATE TABLE oil_trial_densities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            oil_id INTEGER NOT NULL REFERENCES oils(id) ON DELETE CASCADE,
            sara_type TEXT NOT NULL CHECK(sara_type IN ('saturates', 'aromatics')),
            kg_m_3 REAL NOT NULL,
            fraction REAL NOT NULL,
            vapor_temp_k REAL NOT NULL
        );

        CREATE TABLE oil_sa_fractions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            oil_id INTEGER NOT NULL REFERENCES oils(id) ON DELETE CASCADE,
            vapor_temp_k REAL NOT NULL,
            saturate REAL NOT NULL,
            aromatic REAL NOT NULL
        );

        CREATE INDEX idx_oil_densities_oil ON oil_densities(oil_id);
        CREATE INDEX idx_oil_kvis_oil ON oil_kvis(oil_id);
        CREATE INDEX idx_oil_trial_densities_oil ON oil_trial_densities(oil_id);
        CREATE INDEX idx_oil_sa_fractions_oil ON oil_sa_fractions(oil_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
