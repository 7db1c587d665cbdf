//! Imported record model
//!
//! The raw laboratory data for one oil, as loaded from the source library.
//! This is the read-only input of the estimation core.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::measurement::{
    DistillationCut, ImportedMeasurement, MolecularWeightSample, SaraFraction, SaraType,
};
use crate::db::{DbError, DbResult};

/// An imported oil record with all of its measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedRecord {
    pub id: i64,
    pub adios_oil_id: String,
    pub name: String,
    pub location: Option<String>,
    pub field_name: Option<String>,
    pub product_type: Option<String>,
    pub oil_class: Option<String>,
    pub api: Option<f64>,
    pub densities: Vec<ImportedMeasurement>,
    pub kvis: Vec<ImportedMeasurement>,
    pub dvis: Vec<ImportedMeasurement>,
    pub cuts: Vec<DistillationCut>,
    pub molecular_weights: Vec<MolecularWeightSample>,
    pub sara_fractions: Vec<SaraFraction>,
}

/// Data for creating a new imported record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportedRecordCreate {
    pub adios_oil_id: String,
    pub name: String,
    pub location: Option<String>,
    pub field_name: Option<String>,
    pub product_type: Option<String>,
    pub oil_class: Option<String>,
    pub api: Option<f64>,
    pub densities: Vec<ImportedMeasurement>,
    pub kvis: Vec<ImportedMeasurement>,
    pub dvis: Vec<ImportedMeasurement>,
    pub cuts: Vec<DistillationCut>,
    pub molecular_weights: Vec<MolecularWeightSample>,
    pub sara_fractions: Vec<SaraFraction>,
    /// Category paths such as `Crude-Medium`; created on demand
    pub categories: Vec<String>,
}

/// Header columns of `imported_records`
struct Header {
    id: i64,
    adios_oil_id: String,
    name: String,
    location: Option<String>,
    field_name: Option<String>,
    product_type: Option<String>,
    oil_class: Option<String>,
    api: Option<f64>,
}

impl Header {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            adios_oil_id: row.get("adios_oil_id")?,
            name: row.get("name")?,
            location: row.get("location")?,
            field_name: row.get("field_name")?,
            product_type: row.get("product_type")?,
            oil_class: row.get("oil_class")?,
            api: row.get("api")?,
        })
    }
}

/// Column holding the measured value in each measurement table
const MEASUREMENT_TABLES: [(&str, &str); 3] = [
    ("imported_densities", "kg_m_3"),
    ("imported_kvis", "m_2_s"),
    ("imported_dvis", "kg_ms"),
];

impl ImportedRecord {
    /// Create an imported record with all of its child rows
    pub fn create(conn: &Connection, data: &ImportedRecordCreate) -> DbResult<Self> {
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO imported_records
                (adios_oil_id, name, location, field_name, product_type, oil_class, api)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.adios_oil_id,
                data.name,
                data.location,
                data.field_name,
                data.product_type,
                data.oil_class,
                data.api,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let lists = [&data.densities, &data.kvis, &data.dvis];
        for ((table, column), list) in MEASUREMENT_TABLES.iter().zip(lists) {
            let sql = format!(
                "INSERT INTO {} (imported_record_id, {}, ref_temp_k, weathering) VALUES (?1, ?2, ?3, ?4)",
                table, column
            );
            let mut stmt = tx.prepare(&sql)?;
            for m in list {
                stmt.execute(params![id, m.value, m.ref_temp_k, m.weathering])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO imported_cuts (imported_record_id, vapor_temp_k, liquid_temp_k, fraction)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for c in &data.cuts {
                stmt.execute(params![id, c.vapor_temp_k, c.liquid_temp_k, c.fraction])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO imported_molecular_weights (imported_record_id, ref_temp_k, saturate, aromatic)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for mw in &data.molecular_weights {
                stmt.execute(params![id, mw.ref_temp_k, mw.saturate, mw.aromatic])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO imported_sara_fractions (imported_record_id, sara_type, fraction)
                 VALUES (?1, ?2, ?3)",
            )?;
            for f in &data.sara_fractions {
                stmt.execute(params![id, f.sara_type.as_str(), f.fraction])?;
            }
        }

        for path in &data.categories {
            let category = super::Category::get_or_create_path(&tx, path)?;
            tx.execute(
                "INSERT OR IGNORE INTO imported_record_categories (imported_record_id, category_id)
                 VALUES (?1, ?2)",
                params![id, category.id],
            )?;
        }

        tx.commit()?;

        Self::get_by_id(conn, id)?.ok_or(DbError::RecordNotFound(id))
    }

    /// Get an imported record by ID, with all measurements loaded
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM imported_records WHERE id = ?1")?;

        let header = match stmt.query_row([id], Header::from_row) {
            Ok(h) => h,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Self::load(conn, header).map(Some)
    }

    /// Get an imported record by its ADIOS oil id
    pub fn get_by_adios_id(conn: &Connection, adios_oil_id: &str) -> DbResult<Option<Self>> {
        let result: Result<i64, _> = conn.query_row(
            "SELECT id FROM imported_records WHERE adios_oil_id = ?1",
            [adios_oil_id],
            |row| row.get(0),
        );
        match result {
            Ok(id) => Self::get_by_id(conn, id),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All imported record IDs, in insertion order
    pub fn list_ids(conn: &Connection) -> DbResult<Vec<i64>> {
        let mut stmt = conn.prepare("SELECT id FROM imported_records ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn load(conn: &Connection, header: Header) -> DbResult<Self> {
        let id = header.id;

        let [densities, kvis, dvis] =
            MEASUREMENT_TABLES.map(|(table, column)| load_measurements(conn, table, column, id));

        let mut stmt = conn.prepare(
            "SELECT vapor_temp_k, liquid_temp_k, fraction FROM imported_cuts
             WHERE imported_record_id = ?1 ORDER BY fraction, id",
        )?;
        let cuts = stmt
            .query_map([id], |row| {
                Ok(DistillationCut {
                    vapor_temp_k: row.get(0)?,
                    liquid_temp_k: row.get(1)?,
                    fraction: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT ref_temp_k, saturate, aromatic FROM imported_molecular_weights
             WHERE imported_record_id = ?1 ORDER BY id",
        )?;
        let molecular_weights = stmt
            .query_map([id], |row| {
                Ok(MolecularWeightSample {
                    ref_temp_k: row.get(0)?,
                    saturate: row.get(1)?,
                    aromatic: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT sara_type, fraction FROM imported_sara_fractions
             WHERE imported_record_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        let sara_fractions = rows
            .into_iter()
            .map(|(name, fraction)| {
                SaraType::from_str(&name)
                    .map(|sara_type| SaraFraction {
                        sara_type,
                        fraction,
                    })
                    .ok_or(DbError::InvalidSaraType(name))
            })
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Self {
            id,
            adios_oil_id: header.adios_oil_id,
            name: header.name,
            location: header.location,
            field_name: header.field_name,
            product_type: header.product_type,
            oil_class: header.oil_class,
            api: header.api,
            densities: densities?,
            kvis: kvis?,
            dvis: dvis?,
            cuts,
            molecular_weights,
            sara_fractions,
        })
    }
}

fn load_measurements(
    conn: &Connection,
    table: &str,
    column: &str,
    imported_record_id: i64,
) -> DbResult<Vec<ImportedMeasurement>> {
    let sql = format!(
        "SELECT {}, ref_temp_k, weathering FROM {} WHERE imported_record_id = ?1 ORDER BY id",
        column, table
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([imported_record_id], |row| {
            Ok(ImportedMeasurement {
                value: row.get(0)?,
                ref_temp_k: row.get(1)?,
                weathering: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
