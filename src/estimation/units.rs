//! Unit conversion
//!
//! Converts measurement values between the unit systems found in the oil
//! library. Units are recognized by their common spellings, case-insensitive.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{EstimationError, EstimationResult};

/// The physical quantity being converted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    KinematicViscosity,
    DynamicViscosity,
    Density,
    Temperature,
    MassFraction,
}

impl QuantityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityKind::KinematicViscosity => "kinematic_viscosity",
            QuantityKind::DynamicViscosity => "dynamic_viscosity",
            QuantityKind::Density => "density",
            QuantityKind::Temperature => "temperature",
            QuantityKind::MassFraction => "mass_fraction",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "kinematic_viscosity" | "kvis" => Some(QuantityKind::KinematicViscosity),
            "dynamic_viscosity" | "dvis" => Some(QuantityKind::DynamicViscosity),
            "density" => Some(QuantityKind::Density),
            "temperature" | "temp" => Some(QuantityKind::Temperature),
            "mass_fraction" | "fraction" => Some(QuantityKind::MassFraction),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            QuantityKind::KinematicViscosity => "Kinematic Viscosity",
            QuantityKind::DynamicViscosity => "Dynamic Viscosity",
            QuantityKind::Density => "Density",
            QuantityKind::Temperature => "Temperature",
            QuantityKind::MassFraction => "Mass Fraction",
        }
    }

    /// The SI unit all values of this kind are stored in
    pub fn canonical_unit(&self) -> &'static str {
        match self {
            QuantityKind::KinematicViscosity => "m^2/s",
            QuantityKind::DynamicViscosity => "kg/ms",
            QuantityKind::Density => "kg/m^3",
            QuantityKind::Temperature => "K",
            QuantityKind::MassFraction => "fraction",
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Linear Conversion Factors (to the canonical unit)
// ============================================================================

/// Square meters per second per centistoke
pub const M2_S_PER_CST: f64 = 1.0e-6;
/// Square meters per second per stoke
pub const M2_S_PER_ST: f64 = 1.0e-4;
/// Pascal seconds per centipoise
pub const PA_S_PER_CP: f64 = 1.0e-3;
/// Pascal seconds per poise
pub const PA_S_PER_P: f64 = 0.1;
/// Kilograms per cubic meter per gram per cubic centimeter
pub const KG_M3_PER_G_CM3: f64 = 1000.0;
/// Kilograms per cubic meter per pound per cubic foot
pub const KG_M3_PER_LB_FT3: f64 = 16.018463;

/// Kelvin offset of the Celsius scale
pub const KELVIN_OFFSET: f64 = 273.15;

fn normalize_unit(unit: &str) -> String {
    unit.trim().to_lowercase()
}

/// Factor that converts a value in `unit` to the canonical unit of `kind`
///
/// Returns `None` for unknown units and for temperature, which is not linear.
pub fn factor_to_canonical(kind: QuantityKind, unit: &str) -> Option<f64> {
    let unit = normalize_unit(unit);
    let unit = unit.as_str();

    match kind {
        QuantityKind::KinematicViscosity => match unit {
            "m^2/s" | "m2/s" | "m^2 s^-1" => Some(1.0),
            "cst" | "centistokes" | "centistoke" | "mm^2/s" | "mm2/s" => Some(M2_S_PER_CST),
            "st" | "stokes" | "stoke" | "cm^2/s" | "cm2/s" => Some(M2_S_PER_ST),
            _ => None,
        },
        QuantityKind::DynamicViscosity => match unit {
            "kg/ms" | "kg/(m s)" | "pa s" | "pa.s" | "pas" => Some(1.0),
            "cp" | "centipoise" | "mpa s" | "mpa.s" => Some(PA_S_PER_CP),
            "p" | "poise" => Some(PA_S_PER_P),
            _ => None,
        },
        QuantityKind::Density => match unit {
            "kg/m^3" | "kg/m3" => Some(1.0),
            "g/cm^3" | "g/cm3" | "g/ml" | "g/cc" => Some(KG_M3_PER_G_CM3),
            "lb/ft^3" | "lb/ft3" => Some(KG_M3_PER_LB_FT3),
            _ => None,
        },
        QuantityKind::MassFraction => match unit {
            "fraction" | "1" => Some(1.0),
            "%" | "percent" => Some(0.01),
            "ppm" => Some(1.0e-6),
            _ => None,
        },
        QuantityKind::Temperature => None,
    }
}

fn kelvin_from(unit: &str, value: f64) -> Option<f64> {
    match normalize_unit(unit).as_str() {
        "k" | "kelvin" => Some(value),
        "c" | "celsius" | "degc" => Some(value + KELVIN_OFFSET),
        "f" | "fahrenheit" | "degf" => Some((value - 32.0) * 5.0 / 9.0 + KELVIN_OFFSET),
        _ => None,
    }
}

fn kelvin_to(unit: &str, kelvin: f64) -> Option<f64> {
    match normalize_unit(unit).as_str() {
        "k" | "kelvin" => Some(kelvin),
        "c" | "celsius" | "degc" => Some(kelvin - KELVIN_OFFSET),
        "f" | "fahrenheit" | "degf" => Some((kelvin - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0),
        _ => None,
    }
}

/// Convert `value` of quantity `kind` from `from_unit` to `to_unit`
///
/// Fails with [`EstimationError::UnsupportedConversion`] when either unit is
/// not defined for `kind`.
pub fn convert(kind: QuantityKind, from_unit: &str, to_unit: &str, value: f64) -> EstimationResult<f64> {
    let unsupported = || EstimationError::UnsupportedConversion {
        kind,
        from: from_unit.to_string(),
        to: to_unit.to_string(),
    };

    if kind == QuantityKind::Temperature {
        let kelvin = kelvin_from(from_unit, value).ok_or_else(unsupported)?;
        return kelvin_to(to_unit, kelvin).ok_or_else(unsupported);
    }

    let from = factor_to_canonical(kind, from_unit).ok_or_else(unsupported)?;
    let to = factor_to_canonical(kind, to_unit).ok_or_else(unsupported)?;

    Ok(value * from / to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_kvis_m2_s_to_cst() {
        let cst = convert(QuantityKind::KinematicViscosity, "m^2/s", "cSt", 1.5e-5).unwrap();
        assert!((cst - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_kvis_cst_to_m2_s() {
        let m2s = convert(QuantityKind::KinematicViscosity, "cSt", "m^2/s", 200.0).unwrap();
        assert!((m2s - 2.0e-4).abs() < 1e-15);
    }

    #[test]
    fn test_dvis_cp_to_kg_ms() {
        let v = convert(QuantityKind::DynamicViscosity, "cP", "kg/ms", 10.0).unwrap();
        assert!((v - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_density_g_cm3() {
        let v = convert(QuantityKind::Density, "g/cm^3", "kg/m^3", 0.876).unwrap();
        assert!((v - 876.0).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_affine() {
        let k = convert(QuantityKind::Temperature, "C", "K", 15.0).unwrap();
        assert!((k - 288.15).abs() < 1e-9);
        let f = convert(QuantityKind::Temperature, "K", "F", 273.15).unwrap();
        assert!((f - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_unit_pair() {
        let err = convert(QuantityKind::KinematicViscosity, "m^2/s", "kg/m^3", 1.0).unwrap_err();
        assert_eq!(
            err,
            EstimationError::UnsupportedConversion {
                kind: QuantityKind::KinematicViscosity,
                from: "m^2/s".to_string(),
                to: "kg/m^3".to_string(),
            }
        );
    }

    #[test]
    fn test_unsupported_temperature_unit() {
        assert!(convert(QuantityKind::Temperature, "R", "K", 500.0).is_err());
    }

    #[test]
    fn test_quantity_kind_from_str() {
        assert_eq!(
            QuantityKind::from_str("Kinematic Viscosity"),
            Some(QuantityKind::KinematicViscosity)
        );
        assert_eq!(QuantityKind::from_str("dvis"), Some(QuantityKind::DynamicViscosity));
        assert_eq!(QuantityKind::from_str("pressure"), None);
    }

    const PAIRS: &[(QuantityKind, &str, &str)] = &[
        (QuantityKind::KinematicViscosity, "m^2/s", "cSt"),
        (QuantityKind::KinematicViscosity, "St", "cSt"),
        (QuantityKind::DynamicViscosity, "kg/ms", "cP"),
        (QuantityKind::DynamicViscosity, "P", "Pa s"),
        (QuantityKind::Density, "kg/m^3", "g/cm^3"),
        (QuantityKind::Density, "lb/ft^3", "kg/m^3"),
        (QuantityKind::MassFraction, "fraction", "%"),
        (QuantityKind::Temperature, "K", "C"),
        (QuantityKind::Temperature, "F", "K"),
        (QuantityKind::Temperature, "C", "F"),
    ];

    proptest! {
        #[test]
        fn test_round_trip_every_supported_pair(idx in 0usize..PAIRS.len(), x in -1.0e4f64..1.0e4) {
            let (kind, a, b) = PAIRS[idx];
            let there = convert(kind, b, a, x).unwrap();
            let back = convert(kind, a, b, there).unwrap();
            prop_assert!((back - x).abs() <= 1e-9 * x.abs().max(1.0));
        }
    }
}
