//! Numeric policy for the estimation core

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Watson characterization factor for the saturate-dominant regime
pub const WATSON_SATURATE: f64 = 12.0;
/// Watson characterization factor for the aromatic-dominant regime
pub const WATSON_AROMATIC: f64 = 10.0;
/// Nominal density of resins and asphaltenes (kg/m^3)
pub const RESIN_ASPHALTENE_DENSITY: f64 = 1100.0;
/// Upper vapor temperature bound of the saturate/aromatic correlation (K)
pub const CORRELATION_MAX_TEMP_K: f64 = 530.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read estimation config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid estimation config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tolerances and correlation constants used while assembling an oil
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Relative disagreement allowed between API gravity and the 15C density
    pub api_density_tolerance: f64,
    /// Two reference temperatures closer than this are the same temperature (K)
    pub temperature_epsilon_k: f64,
    /// Two weathering fractions closer than this are the same weathering
    pub weathering_epsilon: f64,
    pub watson_saturate: f64,
    pub watson_aromatic: f64,
    pub resin_asphaltene_density: f64,
    pub correlation_max_temp_k: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            api_density_tolerance: 0.05,
            temperature_epsilon_k: 0.01,
            weathering_epsilon: 1.0e-6,
            watson_saturate: WATSON_SATURATE,
            watson_aromatic: WATSON_AROMATIC,
            resin_asphaltene_density: RESIN_ASPHALTENE_DENSITY,
            correlation_max_temp_k: CORRELATION_MAX_TEMP_K,
        }
    }
}

impl EstimationConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}
