//! Batch estimation over a record store
//!
//! Records are assembled in parallel on the rayon pool. Persistence stays on
//! the calling thread so the store sees one writer.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::assembler::{assemble, Rejection};
use super::config::EstimationConfig;
use super::diagnostic::Diagnostic;
use super::store::OilRecordStore;

/// Diagnostics raised while assembling one oil
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OilDiagnostics {
    pub adios_oil_id: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// A rejected record, flattened for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub imported_record_id: i64,
    pub adios_oil_id: String,
    pub reason: String,
}

impl From<Rejection> for SkippedRecord {
    fn from(rejection: Rejection) -> Self {
        Self {
            imported_record_id: rejection.imported_record_id,
            adios_oil_id: rejection.adios_oil_id,
            reason: rejection.reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: Vec<SkippedRecord>,
    pub diagnostics: Vec<OilDiagnostics>,
}

/// Assemble and persist every imported record in the store
///
/// A rejected record is skipped; the store keeps whatever it held for it.
/// Store errors abort the batch.
pub fn process_all<S>(store: &S, config: &EstimationConfig) -> Result<BatchReport, S::Error>
where
    S: OilRecordStore,
{
    let ids = store.imported_record_ids()?;
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        match store.load_imported(id)? {
            Some(record) => records.push(record),
            None => warn!("Imported record {} vanished before estimation", id),
        }
    }

    info!("Estimating {} imported records", records.len());

    let assemblies: Vec<_> = records
        .par_iter()
        .map(|record| (record.adios_oil_id.clone(), assemble(record, config)))
        .collect();

    let mut report = BatchReport::default();
    for (adios_oil_id, assembly) in assemblies {
        if !assembly.diagnostics.is_empty() {
            report.diagnostics.push(OilDiagnostics {
                adios_oil_id,
                diagnostics: assembly.diagnostics.clone(),
            });
        }

        match assembly.into_result() {
            Ok(derived) => {
                store.save_derived(&derived)?;
                report.processed += 1;
            }
            Err(rejection) => report.skipped.push(rejection.into()),
        }
    }

    info!(
        "Estimation finished: {} processed, {} skipped",
        report.processed,
        report.skipped.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::fmt;

    use crate::models::{DerivedOilRecord, ImportedMeasurement, ImportedRecord};

    #[derive(Debug)]
    struct NeverFails;

    impl fmt::Display for NeverFails {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "never")
        }
    }

    impl std::error::Error for NeverFails {}

    #[derive(Default)]
    struct MemoryStore {
        imported: BTreeMap<i64, ImportedRecord>,
        derived: RefCell<BTreeMap<i64, DerivedOilRecord>>,
    }

    impl OilRecordStore for MemoryStore {
        type Error = NeverFails;

        fn imported_record_ids(&self) -> Result<Vec<i64>, Self::Error> {
            Ok(self.imported.keys().copied().collect())
        }

        fn load_imported(&self, id: i64) -> Result<Option<ImportedRecord>, Self::Error> {
            Ok(self.imported.get(&id).cloned())
        }

        fn save_derived(&self, record: &DerivedOilRecord) -> Result<i64, Self::Error> {
            self.derived
                .borrow_mut()
                .insert(record.imported_record_id, record.clone());
            Ok(record.imported_record_id)
        }
    }

    fn record(id: i64, api: Option<f64>, densities: Vec<ImportedMeasurement>) -> ImportedRecord {
        ImportedRecord {
            id,
            adios_oil_id: format!("AD{:05}", id),
            name: format!("OIL {}", id),
            location: None,
            field_name: None,
            product_type: None,
            oil_class: None,
            api,
            densities,
            kvis: vec![ImportedMeasurement::new(1e-5, None, None)],
            dvis: Vec::new(),
            cuts: Vec::new(),
            molecular_weights: Vec::new(),
            sara_fractions: Vec::new(),
        }
    }

    #[test]
    fn test_process_all_skips_rejected() {
        let mut store = MemoryStore::default();
        store.imported.insert(1, record(1, Some(30.0), Vec::new()));
        store.imported.insert(2, record(2, None, Vec::new()));
        store.imported.insert(
            3,
            record(3, None, vec![ImportedMeasurement::new(900.0, Some(288.15), None)]),
        );

        let report = process_all(&store, &EstimationConfig::default()).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].adios_oil_id, "AD00002");

        let derived = store.derived.borrow();
        assert!(derived.contains_key(&1));
        assert!(!derived.contains_key(&2));
        assert!(derived.contains_key(&3));
    }

    #[test]
    fn test_process_all_collects_diagnostics() {
        let mut store = MemoryStore::default();
        store.imported.insert(1, record(1, Some(30.0), Vec::new()));

        let report = process_all(&store, &EstimationConfig::default()).unwrap();

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(
            report.diagnostics[0].diagnostics,
            vec![Diagnostic::MissingTemperature { quantity: "kvis" }]
        );
    }
}
