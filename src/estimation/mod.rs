//! Oil property estimation
//!
//! Turns imported laboratory records into derived oil records: unit
//! conversion, viscosity reconciliation, trial densities from distillation
//! cuts and the assembly state machine that ties them together.

pub mod api;
pub mod assembler;
pub mod batch;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod store;
pub mod trial_density;
pub mod units;
pub mod viscosity;

pub use assembler::{assemble, Assembly, AssemblyState, OilAssembler, Rejection, ResolvedDensities};
pub use batch::{process_all, BatchReport, OilDiagnostics, SkippedRecord};
pub use config::{ConfigError, EstimationConfig};
pub use diagnostic::Diagnostic;
pub use error::{EstimationError, EstimationResult};
pub use store::OilRecordStore;
pub use trial_density::{
    estimate_average_density, reconstruct_density, saturate_aromatic_split,
    saturate_aromatic_split_with, trial_densities, watson_trial_density, DensityReconstruction,
    SaSplit, TrialDensity,
};
pub use units::{convert, QuantityKind};
pub use viscosity::{kvis_at_temperature, reconcile_kvis, KvisReconciliation};
