//! Measurement model
//!
//! Laboratory observations attached to an oil: densities, viscosities,
//! distillation cuts, molecular weights and SARA fractions.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A normalized observation `(value, reference temperature, weathering)`
///
/// Weathering is a fraction in `[0, 1]`; `0.0` is fresh oil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub ref_temp_k: f64,
    pub weathering: f64,
}

impl Measurement {
    pub fn new(value: f64, ref_temp_k: f64, weathering: f64) -> Self {
        Self {
            value,
            ref_temp_k,
            weathering,
        }
    }

    /// A measurement taken on fresh (unweathered) oil
    pub fn fresh(value: f64, ref_temp_k: f64) -> Self {
        Self::new(value, ref_temp_k, 0.0)
    }

    /// Whether this measurement occupies the given `(temperature, weathering)` slot
    pub fn occupies(&self, ref_temp_k: f64, weathering: f64, temp_epsilon: f64, weathering_epsilon: f64) -> bool {
        nearly_equal(self.ref_temp_k, ref_temp_k, temp_epsilon)
            && nearly_equal(self.weathering, weathering, weathering_epsilon)
    }

    /// Ordering by `(weathering, reference temperature)`
    pub fn cmp_weathering_then_temp(&self, other: &Self) -> Ordering {
        self.weathering
            .total_cmp(&other.weathering)
            .then(self.ref_temp_k.total_cmp(&other.ref_temp_k))
    }
}

/// A raw observation as it was imported; temperature and weathering may be absent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportedMeasurement {
    pub value: f64,
    pub ref_temp_k: Option<f64>,
    pub weathering: Option<f64>,
}

impl ImportedMeasurement {
    pub fn new(value: f64, ref_temp_k: Option<f64>, weathering: Option<f64>) -> Self {
        Self {
            value,
            ref_temp_k,
            weathering,
        }
    }

    /// Normalize to a [`Measurement`]
    ///
    /// Returns `None` when the reference temperature is missing. A missing
    /// weathering value means fresh oil.
    pub fn to_measurement(&self) -> Option<Measurement> {
        let ref_temp_k = self.ref_temp_k?;
        Some(Measurement::new(
            self.value,
            ref_temp_k,
            self.weathering.unwrap_or(0.0),
        ))
    }
}

/// Normalize a list of imported observations, dropping those without a temperature
pub fn normalize(measurements: &[ImportedMeasurement]) -> Vec<Measurement> {
    measurements
        .iter()
        .filter_map(ImportedMeasurement::to_measurement)
        .collect()
}

/// A distillation cut
///
/// `fraction` is the cumulative mass fraction boiled off at `vapor_temp_k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistillationCut {
    pub vapor_temp_k: f64,
    pub liquid_temp_k: Option<f64>,
    pub fraction: f64,
}

impl DistillationCut {
    pub fn new(vapor_temp_k: f64, fraction: f64) -> Self {
        Self {
            vapor_temp_k,
            liquid_temp_k: None,
            fraction,
        }
    }
}

/// Molecular weights of the saturate and aromatic components at a temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MolecularWeightSample {
    pub ref_temp_k: f64,
    pub saturate: f64,
    pub aromatic: f64,
}

/// SARA component type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaraType {
    Saturates,
    Aromatics,
    Resins,
    Asphaltenes,
}

impl SaraType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaraType::Saturates => "saturates",
            SaraType::Aromatics => "aromatics",
            SaraType::Resins => "resins",
            SaraType::Asphaltenes => "asphaltenes",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "saturates" | "saturate" | "sat" => Some(SaraType::Saturates),
            "aromatics" | "aromatic" | "arom" => Some(SaraType::Aromatics),
            "resins" | "resin" => Some(SaraType::Resins),
            "asphaltenes" | "asphaltene" | "asph" => Some(SaraType::Asphaltenes),
            _ => None,
        }
    }

    /// Resins and asphaltenes are not characterized by distillation cuts
    pub fn is_heavy(&self) -> bool {
        matches!(self, SaraType::Resins | SaraType::Asphaltenes)
    }
}

/// Measured mass fraction of one SARA component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaraFraction {
    pub sara_type: SaraType,
    pub fraction: f64,
}

/// Absolute-tolerance float comparison
pub fn nearly_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_measurement_defaults_weathering() {
        let m = ImportedMeasurement::new(850.0, Some(288.15), None);
        assert_eq!(m.to_measurement(), Some(Measurement::fresh(850.0, 288.15)));
    }

    #[test]
    fn test_to_measurement_requires_temperature() {
        let m = ImportedMeasurement::new(850.0, None, Some(0.1));
        assert_eq!(m.to_measurement(), None);
    }

    #[test]
    fn test_normalize_drops_missing_temperatures() {
        let raw = vec![
            ImportedMeasurement::new(1.0, Some(273.15), None),
            ImportedMeasurement::new(2.0, None, None),
            ImportedMeasurement::new(3.0, Some(293.15), Some(0.2)),
        ];
        let normalized = normalize(&raw);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[1].weathering, 0.2);
    }

    #[test]
    fn test_occupies_uses_tolerance() {
        let m = Measurement::new(1e-5, 288.15, 0.0);
        assert!(m.occupies(288.155, 0.0, 0.01, 1e-6));
        assert!(!m.occupies(288.2, 0.0, 0.01, 1e-6));
        assert!(!m.occupies(288.15, 0.1, 0.01, 1e-6));
    }

    #[test]
    fn test_sara_type_parsing() {
        assert_eq!(SaraType::from_str("Resins"), Some(SaraType::Resins));
        assert_eq!(SaraType::from_str("asphaltene"), Some(SaraType::Asphaltenes));
        assert_eq!(SaraType::from_str("wax"), None);
        assert!(SaraType::Resins.is_heavy());
        assert!(!SaraType::Saturates.is_heavy());
    }
}
