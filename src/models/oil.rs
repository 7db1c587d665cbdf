//! Oil model
//!
//! The derived record built by the estimation core from one imported record.
//! It is persisted one-to-one with its source through `imported_record_id`.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::measurement::Measurement;
use crate::db::{DbError, DbResult};
use crate::estimation::{SaSplit, TrialDensity};

/// A derived oil record, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedOilRecord {
    pub imported_record_id: i64,
    pub adios_oil_id: String,
    pub name: String,
    pub api: f64,
    /// Density of fresh oil at 15C (kg/m^3), measured or estimated
    pub density_15c_kg_m_3: f64,
    /// Densities ordered by weathering then temperature; always holds a 15C entry
    pub densities: Vec<Measurement>,
    /// Kinematic viscosities, unique per (temperature, weathering)
    pub kvis: Vec<Measurement>,
    pub saturate_trial_densities: Vec<TrialDensity>,
    pub aromatic_trial_densities: Vec<TrialDensity>,
    pub sa_fractions: Vec<SaSplit>,
    /// Average density rebuilt from the cuts and heavy fractions, when cuts exist
    pub reconstructed_density_kg_m_3: Option<f64>,
}

/// A persisted oil
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oil {
    pub id: i64,
    pub created_at: String,
    #[serde(flatten)]
    pub record: DerivedOilRecord,
}

struct Header {
    id: i64,
    imported_record_id: i64,
    adios_oil_id: String,
    name: String,
    api: f64,
    density_15c_kg_m_3: f64,
    reconstructed_density_kg_m_3: Option<f64>,
    created_at: String,
}

impl Header {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            imported_record_id: row.get("imported_record_id")?,
            adios_oil_id: row.get("adios_oil_id")?,
            name: row.get("name")?,
            api: row.get("api")?,
            density_15c_kg_m_3: row.get("density_15c_kg_m_3")?,
            reconstructed_density_kg_m_3: row.get("reconstructed_density_kg_m_3")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl Oil {
    /// Persist a derived record
    ///
    /// An existing oil for the same imported record is replaced.
    pub fn create(conn: &Connection, data: &DerivedOilRecord) -> DbResult<Self> {
        let tx = conn.unchecked_transaction()?;

        for table in ["oil_densities", "oil_kvis", "oil_trial_densities", "oil_sa_fractions"] {
            tx.execute(
                &format!(
                    "DELETE FROM {} WHERE oil_id IN (SELECT id FROM oils WHERE imported_record_id = ?1)",
                    table
                ),
                [data.imported_record_id],
            )?;
        }
        tx.execute(
            "DELETE FROM oils WHERE imported_record_id = ?1",
            [data.imported_record_id],
        )?;

        tx.execute(
            r#"
            INSERT INTO oils
                (imported_record_id, adios_oil_id, name, api, density_15c_kg_m_3, reconstructed_density_kg_m_3)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                data.imported_record_id,
                data.adios_oil_id,
                data.name,
                data.api,
                data.density_15c_kg_m_3,
                data.reconstructed_density_kg_m_3,
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO oil_densities (oil_id, kg_m_3, ref_temp_k, weathering) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for d in &data.densities {
                stmt.execute(params![id, d.value, d.ref_temp_k, d.weathering])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO oil_kvis (oil_id, m_2_s, ref_temp_k, weathering) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for k in &data.kvis {
                stmt.execute(params![id, k.value, k.ref_temp_k, k.weathering])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO oil_trial_densities (oil_id, sara_type, kg_m_3, fraction, vapor_temp_k)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let trials = data
                .saturate_trial_densities
                .iter()
                .map(|t| ("saturates", t))
                .chain(data.aromatic_trial_densities.iter().map(|t| ("aromatics", t)));
            for (sara_type, t) in trials {
                stmt.execute(params![id, sara_type, t.density, t.fraction, t.vapor_temp_k])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO oil_sa_fractions (oil_id, vapor_temp_k, saturate, aromatic) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for s in &data.sa_fractions {
                stmt.execute(params![id, s.vapor_temp_k, s.saturate, s.aromatic])?;
            }
        }

        tx.commit()?;

        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM oils WHERE id = ?1")?;

        match stmt.query_row([id], Header::from_row) {
            Ok(header) => Self::load(conn, header).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_by_adios_id(conn: &Connection, adios_oil_id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM oils WHERE adios_oil_id = ?1")?;

        match stmt.query_row([adios_oil_id], Header::from_row) {
            Ok(header) => Self::load(conn, header).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The oil derived from an imported record, if estimation accepted it
    pub fn get_for_imported(conn: &Connection, imported_record_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM oils WHERE imported_record_id = ?1")?;

        match stmt.query_row([imported_record_id], Header::from_row) {
            Ok(header) => Self::load(conn, header).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All oils ordered by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM oils ORDER BY name, id")?;
        let headers = stmt
            .query_map([], Header::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        headers.into_iter().map(|h| Self::load(conn, h)).collect()
    }

    fn load(conn: &Connection, header: Header) -> DbResult<Self> {
        let id = header.id;

        let densities = load_measurements(conn, "oil_densities", "kg_m_3", id)?;
        let kvis = load_measurements(conn, "oil_kvis", "m_2_s", id)?;

        let mut saturate_trial_densities = Vec::new();
        let mut aromatic_trial_densities = Vec::new();
        let mut stmt = conn.prepare(
            "SELECT sara_type, kg_m_3, fraction, vapor_temp_k FROM oil_trial_densities
             WHERE oil_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    TrialDensity {
                        density: row.get(1)?,
                        fraction: row.get(2)?,
                        vapor_temp_k: row.get(3)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (sara_type, trial) in rows {
            match sara_type.as_str() {
                "saturates" => saturate_trial_densities.push(trial),
                "aromatics" => aromatic_trial_densities.push(trial),
                _ => return Err(DbError::InvalidSaraType(sara_type)),
            }
        }

        let mut stmt = conn.prepare(
            "SELECT vapor_temp_k, saturate, aromatic FROM oil_sa_fractions WHERE oil_id = ?1 ORDER BY id",
        )?;
        let sa_fractions = stmt
            .query_map([id], |row| {
                Ok(SaSplit {
                    vapor_temp_k: row.get(0)?,
                    saturate: row.get(1)?,
                    aromatic: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            created_at: header.created_at,
            record: DerivedOilRecord {
                imported_record_id: header.imported_record_id,
                adios_oil_id: header.adios_oil_id,
                name: header.name,
                api: header.api,
                density_15c_kg_m_3: header.density_15c_kg_m_3,
                densities,
                kvis,
                saturate_trial_densities,
                aromatic_trial_densities,
                sa_fractions,
                reconstructed_density_kg_m_3: header.reconstructed_density_kg_m_3,
            },
        })
    }
}

fn load_measurements(conn: &Connection, table: &str, column: &str, oil_id: i64) -> DbResult<Vec<Measurement>> {
    let sql = format!(
        "SELECT {}, ref_temp_k, weathering FROM {} WHERE oil_id = ?1 ORDER BY weathering, ref_temp_k, id",
        column, table
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([oil_id], |row| {
            Ok(Measurement {
                value: row.get(0)?,
                ref_temp_k: row.get(1)?,
                weathering: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
