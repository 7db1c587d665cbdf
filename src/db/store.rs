//! SQLite-backed record store

use tracing::debug;

use super::connection::{Database, DbError};
use crate::estimation::OilRecordStore;
use crate::models::{DerivedOilRecord, ImportedRecord, Oil};

impl OilRecordStore for Database {
    type Error = DbError;

    fn imported_record_ids(&self) -> Result<Vec<i64>, DbError> {
        self.with_conn(ImportedRecord::list_ids)
    }

    fn load_imported(&self, id: i64) -> Result<Option<ImportedRecord>, DbError> {
        self.with_conn(|conn| ImportedRecord::get_by_id(conn, id))
    }

    fn save_derived(&self, record: &DerivedOilRecord) -> Result<i64, DbError> {
        let oil = self.with_conn(|conn| Oil::create(conn, record))?;
        debug!("Saved oil {} for {}", oil.id, oil.record.adios_oil_id);
        Ok(oil.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{ImportedMeasurement, ImportedRecordCreate};

    fn setup() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("oil_library.db")).unwrap();
        db.with_conn(run_migrations).unwrap();
        (dir, db)
    }

    #[test]
    fn test_store_round_trip() {
        let (_dir, db) = setup();
        let imported = db
            .with_conn(|conn| {
                ImportedRecord::create(
                    conn,
                    &ImportedRecordCreate {
                        adios_oil_id: "AD01234".to_string(),
                        name: "ALASKA NORTH SLOPE".to_string(),
                        api: Some(30.0),
                        densities: vec![ImportedMeasurement::new(876.0, Some(288.15), None)],
                        ..Default::default()
                    },
                )
            })
            .unwrap();

        assert_eq!(db.imported_record_ids().unwrap(), vec![imported.id]);
        let loaded = db.load_imported(imported.id).unwrap().unwrap();
        assert_eq!(loaded, imported);
        assert!(db.load_imported(imported.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_save_derived_replaces() {
        let (_dir, db) = setup();
        let imported = db
            .with_conn(|conn| {
                ImportedRecord::create(
                    conn,
                    &ImportedRecordCreate {
                        adios_oil_id: "AD00001".to_string(),
                        name: "TEST".to_string(),
                        api: Some(30.0),
                        ..Default::default()
                    },
                )
            })
            .unwrap();

        let derived = crate::estimation::assemble(&imported, &Default::default())
            .into_result()
            .unwrap();
        db.save_derived(&derived).unwrap();
        db.save_derived(&derived).unwrap();

        let oils = db.with_conn(Oil::list).unwrap();
        assert_eq!(oils.len(), 1);
        assert_eq!(oils[0].record, derived);
    }
}
