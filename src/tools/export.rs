//! Library export
//!
//! Writes every derived oil, with its category paths, as one JSON document.

use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use crate::build_info::BuildInfo;
use crate::db::{Database, DbResult};
use crate::models::{Category, ImportedRecord, Oil};

#[derive(Debug, Clone, Serialize)]
pub struct ExportedOil {
    #[serde(flatten)]
    pub oil: Oil,
    pub location: Option<String>,
    pub field_name: Option<String>,
    pub product_type: Option<String>,
    pub oil_class: Option<String>,
    /// Category paths root first, e.g. `Crude-Medium`
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LibraryExport {
    pub build: BuildInfo,
    pub exported_at: String,
    pub oil_count: usize,
    pub oils: Vec<ExportedOil>,
}

/// Collect every derived oil with its categories and source descriptors
pub fn collect_export(database: &Database) -> DbResult<LibraryExport> {
    let oils = database.with_conn(|conn| {
        Oil::list(conn)?
            .into_iter()
            .map(|oil| {
                let imported_id = oil.record.imported_record_id;
                let categories = Category::paths_for_imported(conn, imported_id)?;
                let source = ImportedRecord::get_by_id(conn, imported_id)?;
                let (location, field_name, product_type, oil_class) = match source {
                    Some(r) => (r.location, r.field_name, r.product_type, r.oil_class),
                    None => (None, None, None, None),
                };
                Ok(ExportedOil {
                    oil,
                    location,
                    field_name,
                    product_type,
                    oil_class,
                    categories,
                })
            })
            .collect::<DbResult<Vec<_>>>()
    })?;

    Ok(LibraryExport {
        build: BuildInfo::current(),
        exported_at: Utc::now().to_rfc3339(),
        oil_count: oils.len(),
        oils,
    })
}

pub fn write_export<W: Write>(export: &LibraryExport, writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::estimation::{process_all, EstimationConfig};
    use crate::models::{ImportedRecord, ImportedRecordCreate};

    #[test]
    fn test_export_includes_categories() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("export.db")).unwrap();
        db.with_conn(run_migrations).unwrap();
        db.with_conn(|conn| {
            ImportedRecord::create(
                conn,
                &ImportedRecordCreate {
                    adios_oil_id: "AD00010".to_string(),
                    name: "EXPORT CRUDE".to_string(),
                    location: Some("Gulf of Mexico".to_string()),
                    product_type: Some("Crude".to_string()),
                    oil_class: Some("Group 3".to_string()),
                    api: Some(25.0),
                    categories: vec!["Crude-Heavy".to_string()],
                    ..Default::default()
                },
            )
        })
        .unwrap();
        process_all(&db, &EstimationConfig::default()).unwrap();

        let export = collect_export(&db).unwrap();
        assert_eq!(export.oil_count, 1);
        assert_eq!(export.oils[0].categories, vec!["Crude-Heavy"]);

        let mut bytes = Vec::new();
        write_export(&export, &mut bytes).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["oils"][0]["adios_oil_id"], "AD00010");
        assert_eq!(value["oils"][0]["categories"][0], "Crude-Heavy");
        assert_eq!(value["oils"][0]["location"], "Gulf of Mexico");
        assert_eq!(value["oils"][0]["product_type"], "Crude");
        assert_eq!(value["oils"][0]["oil_class"], "Group 3");
        assert!(value["oils"][0]["field_name"].is_null());
    }
}
