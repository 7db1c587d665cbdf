//! Data models
//!
//! Owned record shapes consumed and produced by the estimation core, with
//! their SQLite row mapping.

mod category;
mod imported_record;
mod measurement;
mod oil;

pub use category::{Category, PATH_SEPARATOR};
pub use imported_record::{ImportedRecord, ImportedRecordCreate};
pub use measurement::{
    nearly_equal, normalize, DistillationCut, ImportedMeasurement, Measurement,
    MolecularWeightSample, SaraFraction, SaraType,
};
pub use oil::{DerivedOilRecord, Oil};
