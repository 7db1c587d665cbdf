//! Non-fatal estimation diagnostics
//!
//! A diagnostic marks a unit of data (one cut, one measurement) that could not
//! be used. Processing of the rest of the oil continues.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No molecular weight sample near a cut's vapor temperature
    MissingMolecularWeight { vapor_temp_k: f64 },
    /// A dynamic viscosity had no density at the same weathering
    MissingDensityForWeathering { ref_temp_k: f64, weathering: f64 },
    /// An imported measurement had no reference temperature
    MissingTemperature { quantity: &'static str },
    /// A measured kinematic viscosity duplicated an earlier entry
    DuplicateViscosity { ref_temp_k: f64, weathering: f64 },
    /// Density reconstructed from cuts disagrees with the measured density
    DensityMismatch {
        measured_kg_m_3: f64,
        reconstructed_kg_m_3: f64,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingMolecularWeight { vapor_temp_k } => {
                write!(f, "no molecular weight at {:.2}K", vapor_temp_k)
            }
            Diagnostic::MissingDensityForWeathering {
                ref_temp_k,
                weathering,
            } => write!(
                f,
                "no density at weathering {} for dynamic viscosity at {:.2}K",
                weathering, ref_temp_k
            ),
            Diagnostic::MissingTemperature { quantity } => {
                write!(f, "{} entry without a reference temperature dropped", quantity)
            }
            Diagnostic::DuplicateViscosity {
                ref_temp_k,
                weathering,
            } => write!(
                f,
                "duplicate kinematic viscosity at {:.2}K, weathering {} dropped",
                ref_temp_k, weathering
            ),
            Diagnostic::DensityMismatch {
                measured_kg_m_3,
                reconstructed_kg_m_3,
            } => write!(
                f,
                "density reconstructed from cuts ({:.1} kg/m^3) does not match measured density ({:.1} kg/m^3)",
                reconstructed_kg_m_3, measured_kg_m_3
            ),
        }
    }
}
