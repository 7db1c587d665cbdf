//! Record store seam
//!
//! The estimation core reads imported records and writes derived ones through
//! this trait only. The SQLite implementation lives in `crate::db`.

use crate::models::{DerivedOilRecord, ImportedRecord};

pub trait OilRecordStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Ids of every imported record, in processing order
    fn imported_record_ids(&self) -> Result<Vec<i64>, Self::Error>;

    fn load_imported(&self, id: i64) -> Result<Option<ImportedRecord>, Self::Error>;

    /// Persist a derived record, replacing any earlier one for the same
    /// imported record; returns the stored id
    fn save_derived(&self, record: &DerivedOilRecord) -> Result<i64, Self::Error>;
}
