//! Viscosity reconciliation
//!
//! Builds the canonical kinematic viscosity list of an oil from its measured
//! kinematic viscosities and the dynamic viscosities that can be converted
//! with a density at the same weathering.

use tracing::{debug, warn};

use super::config::EstimationConfig;
use super::diagnostic::Diagnostic;
use crate::models::{nearly_equal, ImportedMeasurement, Measurement};

/// Andrade viscosity/temperature constant (K)
pub const ANDRADE_K_V2: f64 = 5000.0;

/// Kinematic viscosities of one oil, unique per `(temperature, weathering)`,
/// ordered by weathering then temperature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvisReconciliation {
    pub kvis: Vec<Measurement>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Measured kinematic viscosities with a reference temperature
///
/// Entries without a temperature are dropped; a repeated
/// `(temperature, weathering)` slot keeps its first entry.
pub fn measured_kvis(
    kvis: &[ImportedMeasurement],
    config: &EstimationConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Measurement> {
    let mut out: Vec<Measurement> = Vec::with_capacity(kvis.len());

    for raw in kvis {
        let Some(m) = raw.to_measurement() else {
            diagnostics.push(Diagnostic::MissingTemperature { quantity: "kvis" });
            continue;
        };

        if is_occupied(&out, &m, config) {
            diagnostics.push(Diagnostic::DuplicateViscosity {
                ref_temp_k: m.ref_temp_k,
                weathering: m.weathering,
            });
            continue;
        }

        out.push(m);
    }

    out
}

/// Convert dynamic viscosities to kinematic using the oil's densities
///
/// A dynamic viscosity is divided by the density at the same weathering whose
/// reference temperature is closest to its own. The density is not corrected
/// for the temperature offset. Entries with no density at their weathering
/// are skipped.
pub fn dvis_to_kvis(
    dvis: &[ImportedMeasurement],
    densities: &[Measurement],
    config: &EstimationConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Measurement> {
    let mut out = Vec::new();

    for raw in dvis {
        let Some(dv) = raw.to_measurement() else {
            diagnostics.push(Diagnostic::MissingTemperature { quantity: "dvis" });
            continue;
        };

        let nearest = densities
            .iter()
            .filter(|d| nearly_equal(d.weathering, dv.weathering, config.weathering_epsilon))
            .min_by(|a, b| {
                (a.ref_temp_k - dv.ref_temp_k)
                    .abs()
                    .total_cmp(&(b.ref_temp_k - dv.ref_temp_k).abs())
            });

        let Some(density) = nearest else {
            warn!(
                "No density at weathering {} for dynamic viscosity at {:.2}K",
                dv.weathering, dv.ref_temp_k
            );
            diagnostics.push(Diagnostic::MissingDensityForWeathering {
                ref_temp_k: dv.ref_temp_k,
                weathering: dv.weathering,
            });
            continue;
        };

        debug!(
            "dvis {} kg/ms at {:.2}K using density {} kg/m^3 at {:.2}K",
            dv.value, dv.ref_temp_k, density.value, density.ref_temp_k
        );

        out.push(Measurement::new(
            dv.value / density.value,
            dv.ref_temp_k,
            dv.weathering,
        ));
    }

    out
}

/// Merge measured and derived kinematic viscosities
///
/// Measured entries take precedence: a derived entry is only added when its
/// `(temperature, weathering)` slot is still free.
pub fn reconcile_kvis(
    kvis: &[ImportedMeasurement],
    dvis: &[ImportedMeasurement],
    densities: &[Measurement],
    config: &EstimationConfig,
) -> KvisReconciliation {
    let mut diagnostics = Vec::new();
    let mut merged = measured_kvis(kvis, config, &mut diagnostics);

    for derived in dvis_to_kvis(dvis, densities, config, &mut diagnostics) {
        if is_occupied(&merged, &derived, config) {
            continue;
        }
        merged.push(derived);
    }

    merged.sort_by(Measurement::cmp_weathering_then_temp);

    KvisReconciliation {
        kvis: merged,
        diagnostics,
    }
}

fn is_occupied(list: &[Measurement], m: &Measurement, config: &EstimationConfig) -> bool {
    list.iter().any(|existing| {
        existing.occupies(
            m.ref_temp_k,
            m.weathering,
            config.temperature_epsilon_k,
            config.weathering_epsilon,
        )
    })
}

/// Kinematic viscosity of fresh oil at `temp_k` (m^2/s)
///
/// Extrapolates from the fresh entry with the closest reference temperature.
pub fn kvis_at_temperature(kvis: &[Measurement], temp_k: f64, config: &EstimationConfig) -> Option<f64> {
    let reference = kvis
        .iter()
        .filter(|k| nearly_equal(k.weathering, 0.0, config.weathering_epsilon))
        .min_by(|a, b| {
            (a.ref_temp_k - temp_k)
                .abs()
                .total_cmp(&(b.ref_temp_k - temp_k).abs())
        })?;

    Some(reference.value * (ANDRADE_K_V2 / temp_k - ANDRADE_K_V2 / reference.ref_temp_k).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(value: f64, t: f64, w: Option<f64>) -> ImportedMeasurement {
        ImportedMeasurement::new(value, Some(t), w)
    }

    #[test]
    fn test_dvis_skipped_without_matching_weathering() {
        let config = EstimationConfig::default();
        let mut diagnostics = Vec::new();
        let densities = vec![Measurement::fresh(850.0, 288.15)];
        let dvis = vec![raw(0.01, 288.15, Some(0.1))];

        let out = dvis_to_kvis(&dvis, &densities, &config, &mut diagnostics);

        assert!(out.is_empty());
        assert_eq!(
            diagnostics,
            vec![Diagnostic::MissingDensityForWeathering {
                ref_temp_k: 288.15,
                weathering: 0.1
            }]
        );
    }

    #[test]
    fn test_dvis_uses_nearest_density_temperature() {
        let config = EstimationConfig::default();
        let mut diagnostics = Vec::new();
        let densities = vec![
            Measurement::fresh(900.0, 273.15),
            Measurement::fresh(850.0, 303.15),
            Measurement::new(950.0, 300.0, 0.2),
        ];
        let dvis = vec![raw(0.085, 298.15, None)];

        let out = dvis_to_kvis(&dvis, &densities, &config, &mut diagnostics);

        assert_eq!(out.len(), 1);
        assert!((out[0].value - 0.085 / 850.0).abs() < 1e-15);
        assert_eq!(out[0].ref_temp_k, 298.15);
        assert_eq!(out[0].weathering, 0.0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_measured_kvis_drops_missing_temperature() {
        let config = EstimationConfig::default();
        let mut diagnostics = Vec::new();
        let kvis = vec![
            raw(1e-5, 288.15, None),
            ImportedMeasurement::new(2e-5, None, None),
        ];

        let out = measured_kvis(&kvis, &config, &mut diagnostics);

        assert_eq!(out, vec![Measurement::fresh(1e-5, 288.15)]);
        assert_eq!(diagnostics, vec![Diagnostic::MissingTemperature { quantity: "kvis" }]);
    }

    #[test]
    fn test_measured_preferred_over_derived() {
        let config = EstimationConfig::default();
        let kvis = vec![raw(1e-5, 288.15, None)];
        let dvis = vec![raw(0.017, 288.15, Some(0.0)), raw(0.0085, 311.15, None)];
        let densities = vec![Measurement::fresh(850.0, 288.15)];

        let result = reconcile_kvis(&kvis, &dvis, &densities, &config);

        assert_eq!(result.kvis.len(), 2);
        assert_eq!(result.kvis[0], Measurement::fresh(1e-5, 288.15));
        assert!((result.kvis[1].value - 1e-5).abs() < 1e-15);
        assert_eq!(result.kvis[1].ref_temp_k, 311.15);
    }

    #[test]
    fn test_reconciled_ordering() {
        let config = EstimationConfig::default();
        let kvis = vec![
            raw(3e-5, 273.15, Some(0.2)),
            raw(2e-5, 311.15, None),
            raw(1e-5, 273.15, None),
        ];

        let result = reconcile_kvis(&kvis, &[], &[], &config);
        let keys: Vec<(f64, f64)> = result.kvis.iter().map(|k| (k.weathering, k.ref_temp_k)).collect();

        assert_eq!(keys, vec![(0.0, 273.15), (0.0, 311.15), (0.2, 273.15)]);
    }

    #[test]
    fn test_kvis_at_temperature() {
        let config = EstimationConfig::default();
        let kvis = vec![Measurement::fresh(1e-5, 311.15), Measurement::new(5e-5, 311.15, 0.3)];

        let same = kvis_at_temperature(&kvis, 311.15, &config).unwrap();
        assert!((same - 1e-5).abs() < 1e-15);

        let colder = kvis_at_temperature(&kvis, 288.15, &config).unwrap();
        assert!(colder > 1e-5);

        assert_eq!(kvis_at_temperature(&kvis[1..], 288.15, &config), None);
    }

    #[test]
    fn test_kvis_at_temperature_fresh_within_tolerance() {
        let config = EstimationConfig::default();
        // weathering stored as 1e-9 after a unit round trip is still fresh oil
        let kvis = vec![Measurement::new(1e-5, 311.15, 1e-9)];

        let v = kvis_at_temperature(&kvis, 311.15, &config).unwrap();
        assert!((v - 1e-5).abs() < 1e-15);
    }

    fn slot() -> impl Strategy<Value = (f64, Option<f64>)> {
        (
            prop::sample::select(vec![273.15, 288.15, 311.15, 323.15]),
            prop::sample::select(vec![None, Some(0.0), Some(0.1), Some(0.25)]),
        )
    }

    proptest! {
        #[test]
        fn test_reconciled_slots_are_unique(
            kvis in prop::collection::vec(slot(), 0..8),
            dvis in prop::collection::vec(slot(), 0..8),
        ) {
            let config = EstimationConfig::default();
            let kvis: Vec<_> = kvis.into_iter().map(|(t, w)| raw(1e-5, t, w)).collect();
            let dvis: Vec<_> = dvis.into_iter().map(|(t, w)| raw(0.02, t, w)).collect();
            let densities = vec![Measurement::fresh(850.0, 288.15), Measurement::new(900.0, 288.15, 0.1)];

            let result = reconcile_kvis(&kvis, &dvis, &densities, &config);

            for (i, a) in result.kvis.iter().enumerate() {
                for b in &result.kvis[i + 1..] {
                    prop_assert!(!(a.ref_temp_k == b.ref_temp_k && a.weathering == b.weathering));
                }
            }
            for m in kvis.iter().filter_map(ImportedMeasurement::to_measurement) {
                let kept = result.kvis.iter().find(|k| k.ref_temp_k == m.ref_temp_k && k.weathering == m.weathering);
                prop_assert_eq!(kept.map(|k| k.value), Some(1e-5));
            }
        }
    }
}
