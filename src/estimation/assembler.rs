//! Oil property assembly
//!
//! Builds a [`DerivedOilRecord`] from one [`ImportedRecord`]. Assembly is a
//! small state machine:
//!
//! ```text
//! Start -> DensitiesResolved -> ViscositiesResolved -> Complete
//!   |
//!   +----> Rejected
//! ```
//!
//! Densities are resolved first: the API gravity and the fresh 15C density
//! must both end up present and consistent with each other. A record where
//! neither is known, or where they disagree beyond the configured tolerance,
//! is rejected and nothing is emitted for it.

use std::fmt;

use tracing::{debug, warn};

use super::api::{
    api_from_density, density_at_temperature, density_from_api, is_valid_api, is_valid_density,
    relative_difference, REFERENCE_TEMP_K,
};
use super::config::EstimationConfig;
use super::diagnostic::Diagnostic;
use super::error::EstimationError;
use super::trial_density::reconstruct_density;
use super::viscosity::reconcile_kvis;
use crate::models::{nearly_equal, normalize, DerivedOilRecord, ImportedRecord, Measurement};

/// API gravity and densities agreed on for an oil
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDensities {
    pub api: f64,
    pub density_15c: f64,
    /// Measured densities plus the 15C anchor, ordered by weathering then temperature
    pub densities: Vec<Measurement>,
}

/// Why an oil was not assembled
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub imported_record_id: i64,
    pub adios_oil_id: String,
    pub reason: EstimationError,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.adios_oil_id, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyState {
    Start,
    DensitiesResolved(ResolvedDensities),
    ViscositiesResolved {
        densities: ResolvedDensities,
        kvis: Vec<Measurement>,
    },
    Complete(Box<DerivedOilRecord>),
    Rejected(Rejection),
}

impl AssemblyState {
    pub fn name(&self) -> &'static str {
        match self {
            AssemblyState::Start => "start",
            AssemblyState::DensitiesResolved(_) => "densities_resolved",
            AssemblyState::ViscositiesResolved { .. } => "viscosities_resolved",
            AssemblyState::Complete(_) => "complete",
            AssemblyState::Rejected(_) => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AssemblyState::Complete(_) | AssemblyState::Rejected(_))
    }
}

/// The terminal state of an assembly and the diagnostics it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub state: AssemblyState,
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    pub fn is_complete(&self) -> bool {
        matches!(self.state, AssemblyState::Complete(_))
    }

    pub fn into_result(self) -> Result<DerivedOilRecord, Rejection> {
        match self.state {
            AssemblyState::Complete(record) => Ok(*record),
            AssemblyState::Rejected(rejection) => Err(rejection),
            other => Err(Rejection {
                imported_record_id: -1,
                adios_oil_id: String::new(),
                reason: EstimationError::InconsistentInput(format!(
                    "assembly stopped in state {}",
                    other.name()
                )),
            }),
        }
    }
}

/// Drives one imported record through the assembly states
pub struct OilAssembler<'a> {
    record: &'a ImportedRecord,
    config: &'a EstimationConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> OilAssembler<'a> {
    pub fn new(record: &'a ImportedRecord, config: &'a EstimationConfig) -> Self {
        Self {
            record,
            config,
            diagnostics: Vec::new(),
        }
    }

    /// Advance one state; terminal states are returned unchanged
    pub fn step(&mut self, state: AssemblyState) -> AssemblyState {
        let next = match state {
            AssemblyState::Start => match self.resolve_densities() {
                Ok(densities) => AssemblyState::DensitiesResolved(densities),
                Err(reason) => AssemblyState::Rejected(self.reject(reason)),
            },
            AssemblyState::DensitiesResolved(densities) => {
                let kvis = self.resolve_viscosities();
                AssemblyState::ViscositiesResolved { densities, kvis }
            }
            AssemblyState::ViscositiesResolved { densities, kvis } => {
                AssemblyState::Complete(Box::new(self.complete(densities, kvis)))
            }
            terminal => return terminal,
        };

        debug!("{}: -> {}", self.record.adios_oil_id, next.name());
        next
    }

    /// Run to a terminal state
    pub fn run(mut self) -> Assembly {
        let mut state = AssemblyState::Start;
        while !state.is_terminal() {
            state = self.step(state);
        }

        Assembly {
            state,
            diagnostics: self.diagnostics,
        }
    }

    fn reject(&self, reason: EstimationError) -> Rejection {
        warn!("Rejecting {}: {}", self.record.adios_oil_id, reason);
        Rejection {
            imported_record_id: self.record.id,
            adios_oil_id: self.record.adios_oil_id.clone(),
            reason,
        }
    }

    fn measured_densities(&mut self) -> Vec<Measurement> {
        let measured = normalize(&self.record.densities);
        let dropped = self.record.densities.len() - measured.len();
        for _ in 0..dropped {
            self.diagnostics
                .push(Diagnostic::MissingTemperature { quantity: "density" });
        }
        measured
    }

    /// Fresh oil density at 15C, corrected from the closest fresh measurement
    fn fresh_density_at_15c(&self, densities: &[Measurement]) -> Option<f64> {
        let nearest = densities
            .iter()
            .filter(|d| nearly_equal(d.weathering, 0.0, self.config.weathering_epsilon))
            .min_by(|a, b| {
                (a.ref_temp_k - REFERENCE_TEMP_K)
                    .abs()
                    .total_cmp(&(b.ref_temp_k - REFERENCE_TEMP_K).abs())
            })?;

        if nearly_equal(nearest.ref_temp_k, REFERENCE_TEMP_K, self.config.temperature_epsilon_k) {
            Some(nearest.value)
        } else {
            Some(density_at_temperature(nearest.value, nearest.ref_temp_k, REFERENCE_TEMP_K))
        }
    }

    fn resolve_densities(&mut self) -> Result<ResolvedDensities, EstimationError> {
        let mut densities = self.measured_densities();

        if let Some(bad) = densities.iter().find(|d| !is_valid_density(d.value)) {
            return Err(EstimationError::InconsistentInput(format!(
                "invalid density {} kg/m^3 at {:.2}K",
                bad.value, bad.ref_temp_k
            )));
        }

        if let Some(api) = self.record.api.filter(|api| !is_valid_api(*api)) {
            return Err(EstimationError::InconsistentInput(format!(
                "invalid API gravity {}",
                api
            )));
        }

        let (api, density_15c) = match (self.record.api, self.fresh_density_at_15c(&densities)) {
            (None, None) => {
                return Err(EstimationError::InconsistentInput(
                    "no API gravity and no fresh oil density to derive one from".to_string(),
                ))
            }
            (Some(api), None) => (api, density_from_api(api)),
            (None, Some(density)) => (api_from_density(density), density),
            (Some(api), Some(density)) => {
                let from_api = density_from_api(api);
                let difference = relative_difference(from_api, density);
                if difference > self.config.api_density_tolerance {
                    return Err(EstimationError::InconsistentInput(format!(
                        "API {} implies {:.1} kg/m^3 at 15C but the measured density is {:.1} kg/m^3 ({:.1}% apart)",
                        api,
                        from_api,
                        density,
                        difference * 100.0
                    )));
                }
                (api, density)
            }
        };

        if !is_valid_density(density_15c) || !is_valid_api(api) {
            return Err(EstimationError::InconsistentInput(format!(
                "no valid 15C anchor: density {} kg/m^3, API {}",
                density_15c, api
            )));
        }

        let has_anchor = densities.iter().any(|d| {
            d.occupies(
                REFERENCE_TEMP_K,
                0.0,
                self.config.temperature_epsilon_k,
                self.config.weathering_epsilon,
            )
        });
        if !has_anchor {
            densities.push(Measurement::fresh(density_15c, REFERENCE_TEMP_K));
        }
        densities.sort_by(Measurement::cmp_weathering_then_temp);

        Ok(ResolvedDensities {
            api,
            density_15c,
            densities,
        })
    }

    /// Kinematic viscosities; dynamic ones are converted with measured densities only
    fn resolve_viscosities(&mut self) -> Vec<Measurement> {
        let measured = normalize(&self.record.densities);
        let reconciled = reconcile_kvis(&self.record.kvis, &self.record.dvis, &measured, self.config);
        self.diagnostics.extend(reconciled.diagnostics);
        reconciled.kvis
    }

    fn complete(&mut self, densities: ResolvedDensities, kvis: Vec<Measurement>) -> DerivedOilRecord {
        let record = self.record;

        let mut derived = DerivedOilRecord {
            imported_record_id: record.id,
            adios_oil_id: record.adios_oil_id.clone(),
            name: record.name.clone(),
            api: densities.api,
            density_15c_kg_m_3: densities.density_15c,
            densities: densities.densities,
            kvis,
            saturate_trial_densities: Vec::new(),
            aromatic_trial_densities: Vec::new(),
            sa_fractions: Vec::new(),
            reconstructed_density_kg_m_3: None,
        };

        if record.cuts.is_empty() {
            return derived;
        }

        let reconstruction = reconstruct_density(
            &record.cuts,
            &record.molecular_weights,
            &record.sara_fractions,
            self.config,
        );
        self.diagnostics.extend(reconstruction.diagnostics);

        // only a reconstruction covering the whole oil is comparable to its bulk density
        let coverage = reconstruction.trial_fraction_sum + reconstruction.heavy_fraction_sum;
        let reconstructed = reconstruction.refined_average_density;
        if (coverage - 1.0).abs() <= self.config.api_density_tolerance
            && relative_difference(reconstructed, densities.density_15c)
                > self.config.api_density_tolerance
        {
            warn!(
                "{}: reconstructed density {:.1} kg/m^3 vs measured {:.1} kg/m^3",
                record.adios_oil_id, reconstructed, densities.density_15c
            );
            self.diagnostics.push(Diagnostic::DensityMismatch {
                measured_kg_m_3: densities.density_15c,
                reconstructed_kg_m_3: reconstructed,
            });
        }

        derived.saturate_trial_densities = reconstruction.saturate;
        derived.aromatic_trial_densities = reconstruction.aromatic;
        derived.sa_fractions = reconstruction.splits;
        derived.reconstructed_density_kg_m_3 = Some(reconstructed);
        derived
    }
}

/// Assemble one imported record
pub fn assemble(record: &ImportedRecord, config: &EstimationConfig) -> Assembly {
    OilAssembler::new(record, config).run()
}
