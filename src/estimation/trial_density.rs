//! Density and SARA trial estimation over distillation cuts
//!
//! Each cut gets a trial density from its vapor temperature through the
//! Watson characterization factor:
//!
//! ```text
//! P_try = 1000 * T^(1/3) / K
//! ```
//!
//! Below the correlation limit the cut's mass is split into saturates and
//! aromatics from the saturate molecular weight and the saturate trial
//! density; above it the cut is split evenly. The splits are fed back into a
//! second pass of trial densities, and together with the resin and asphaltene
//! fractions they reconstruct an average density for the whole oil.

use std::iter::Enumerate;
use std::slice;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::EstimationConfig;
use super::diagnostic::Diagnostic;
use crate::models::{DistillationCut, MolecularWeightSample, SaraFraction};

/// A trial density for one distillation cut
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialDensity {
    /// Trial density (kg/m^3)
    pub density: f64,
    /// Mass fraction weighting this density
    pub fraction: f64,
    pub vapor_temp_k: f64,
}

/// Saturate and aromatic mass fractions of one cut
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaSplit {
    pub vapor_temp_k: f64,
    pub saturate: f64,
    pub aromatic: f64,
}

/// Watson characterization trial density (kg/m^3)
pub fn watson_trial_density(vapor_temp_k: f64, watson_factor: f64) -> f64 {
    1000.0 * vapor_temp_k.cbrt() / watson_factor
}

/// Lazy sequence of trial densities, one per cut in cut order
///
/// Created by [`trial_densities`].
#[derive(Debug, Clone)]
pub struct TrialDensities<'a> {
    cuts: Enumerate<slice::Iter<'a, DistillationCut>>,
    watson_factor: f64,
    overrides: Option<&'a [f64]>,
    previous_fraction: f64,
}

/// Trial densities for `cuts` under `watson_factor`
///
/// The fraction of each entry is the cut's increment over the previous
/// cumulative fraction, unless `overrides` has a value at that index, which
/// then replaces it as is.
pub fn trial_densities<'a>(
    cuts: &'a [DistillationCut],
    watson_factor: f64,
    overrides: Option<&'a [f64]>,
) -> TrialDensities<'a> {
    TrialDensities {
        cuts: cuts.iter().enumerate(),
        watson_factor,
        overrides,
        previous_fraction: 0.0,
    }
}

impl Iterator for TrialDensities<'_> {
    type Item = TrialDensity;

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, cut) = self.cuts.next()?;

        let mut fraction = cut.fraction - self.previous_fraction;
        self.previous_fraction = cut.fraction;

        if let Some(&f) = self.overrides.and_then(|o| o.get(idx)) {
            fraction = f;
        }

        Some(TrialDensity {
            density: watson_trial_density(cut.vapor_temp_k, self.watson_factor),
            fraction,
            vapor_temp_k: cut.vapor_temp_k,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cuts.size_hint()
    }
}

impl ExactSizeIterator for TrialDensities<'_> {}

/// Lazy sequence of saturate/aromatic splits, one per qualifying cut
///
/// Cuts below the correlation limit with no molecular weight at their vapor
/// temperature are skipped and recorded as diagnostics, retrievable with
/// [`SaturateAromaticSplit::take_diagnostics`].
#[derive(Debug, Clone)]
pub struct SaturateAromaticSplit<'a> {
    trials: TrialDensities<'a>,
    molecular_weights: &'a [MolecularWeightSample],
    temperature_epsilon_k: f64,
    correlation_max_temp_k: f64,
    diagnostics: Vec<Diagnostic>,
}

/// Saturate/aromatic splits with the default correlation settings
pub fn saturate_aromatic_split<'a>(
    cuts: &'a [DistillationCut],
    molecular_weights: &'a [MolecularWeightSample],
) -> SaturateAromaticSplit<'a> {
    saturate_aromatic_split_with(cuts, molecular_weights, &EstimationConfig::default())
}

pub fn saturate_aromatic_split_with<'a>(
    cuts: &'a [DistillationCut],
    molecular_weights: &'a [MolecularWeightSample],
    config: &EstimationConfig,
) -> SaturateAromaticSplit<'a> {
    SaturateAromaticSplit {
        trials: trial_densities(cuts, config.watson_saturate, None),
        molecular_weights,
        temperature_epsilon_k: config.temperature_epsilon_k,
        correlation_max_temp_k: config.correlation_max_temp_k,
        diagnostics: Vec::new(),
    }
}

impl SaturateAromaticSplit<'_> {
    /// Diagnostics collected so far; drains them
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn molecular_weight_at(&self, temp_k: f64) -> Option<&MolecularWeightSample> {
        self.molecular_weights
            .iter()
            .filter(|mw| (mw.ref_temp_k - temp_k).abs() <= self.temperature_epsilon_k)
            .min_by(|a, b| {
                (a.ref_temp_k - temp_k)
                    .abs()
                    .total_cmp(&(b.ref_temp_k - temp_k).abs())
            })
    }
}

impl Iterator for SaturateAromaticSplit<'_> {
    type Item = SaSplit;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let trial = self.trials.next()?;
            let f_i = trial.fraction;

            if trial.vapor_temp_k >= self.correlation_max_temp_k {
                return Some(SaSplit {
                    vapor_temp_k: trial.vapor_temp_k,
                    saturate: f_i / 2.0,
                    aromatic: f_i / 2.0,
                });
            }

            let Some(mw) = self.molecular_weight_at(trial.vapor_temp_k) else {
                warn!("No molecular weight at {:.2}K", trial.vapor_temp_k);
                self.diagnostics.push(Diagnostic::MissingMolecularWeight {
                    vapor_temp_k: trial.vapor_temp_k,
                });
                continue;
            };

            let sg = trial.density / 1000.0;
            let mut f_sat = f_i * (2.2843 - 1.98138 * sg - 0.009108 * mw.saturate);

            if f_sat >= f_i {
                f_sat = f_i;
            } else if f_sat < 0.0 {
                f_sat = 0.0;
            }

            // the larger share is subtracted from f_i exactly, so the pair sums to f_i
            let f_arom = f_i - f_sat;
            if f_arom >= f_i / 2.0 {
                f_sat = f_i - f_arom;
            }

            return Some(SaSplit {
                vapor_temp_k: trial.vapor_temp_k,
                saturate: f_sat,
                aromatic: f_arom,
            });
        }
    }
}

/// Result of reconstructing an oil's density from its cuts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DensityReconstruction {
    /// First-pass trial densities under the saturate factor
    pub initial_saturate: Vec<TrialDensity>,
    /// First-pass trial densities under the aromatic factor
    pub initial_aromatic: Vec<TrialDensity>,
    pub splits: Vec<SaSplit>,
    /// Refined trial densities, saturate fractions under the saturate factor
    pub saturate: Vec<TrialDensity>,
    /// Refined trial densities, aromatic fractions under the aromatic factor
    pub aromatic: Vec<TrialDensity>,
    /// Average density assuming every cut splits evenly (kg/m^3)
    pub initial_average_density: f64,
    /// Average density from the refined trials (kg/m^3)
    pub refined_average_density: f64,
    /// Sum of the refined trial fractions
    pub trial_fraction_sum: f64,
    /// Sum of the measured resin and asphaltene fractions
    pub heavy_fraction_sum: f64,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resin and asphaltene contribution to the average density
fn heavy_contribution(sara: &[SaraFraction], resin_asphaltene_density: f64) -> (f64, f64) {
    let fraction: f64 = sara
        .iter()
        .filter(|f| f.sara_type.is_heavy())
        .map(|f| f.fraction)
        .sum();

    (resin_asphaltene_density * fraction, fraction)
}

/// Fraction-weighted average of trial densities plus the resin/asphaltene term
pub fn estimate_average_density(
    trials: &[TrialDensity],
    sara: &[SaraFraction],
    resin_asphaltene_density: f64,
) -> f64 {
    let (heavy, _) = heavy_contribution(sara, resin_asphaltene_density);
    trials.iter().map(|t| t.density * t.fraction).sum::<f64>() + heavy
}

/// Run both trial passes over an oil's cuts
pub fn reconstruct_density(
    cuts: &[DistillationCut],
    molecular_weights: &[MolecularWeightSample],
    sara: &[SaraFraction],
    config: &EstimationConfig,
) -> DensityReconstruction {
    let initial_aromatic: Vec<_> = trial_densities(cuts, config.watson_aromatic, None).collect();
    let initial_saturate: Vec<_> = trial_densities(cuts, config.watson_saturate, None).collect();

    let (heavy, heavy_fraction_sum) = heavy_contribution(sara, config.resin_asphaltene_density);

    let initial_average_density = initial_aromatic
        .iter()
        .chain(initial_saturate.iter())
        .map(|t| t.density * t.fraction * 0.5)
        .sum::<f64>()
        + heavy;

    let mut split = saturate_aromatic_split_with(cuts, molecular_weights, config);
    let splits: Vec<SaSplit> = split.by_ref().collect();
    let diagnostics = split.take_diagnostics();

    let sat_fractions: Vec<f64> = splits.iter().map(|s| s.saturate).collect();
    let arom_fractions: Vec<f64> = splits.iter().map(|s| s.aromatic).collect();

    let saturate: Vec<_> =
        trial_densities(cuts, config.watson_saturate, Some(&sat_fractions)).collect();
    let aromatic: Vec<_> =
        trial_densities(cuts, config.watson_aromatic, Some(&arom_fractions)).collect();

    let refined: f64 = saturate
        .iter()
        .chain(aromatic.iter())
        .map(|t| t.density * t.fraction)
        .sum();
    let trial_fraction_sum = saturate
        .iter()
        .chain(aromatic.iter())
        .map(|t| t.fraction)
        .sum();

    debug!(
        "Reconstructed density: initial {:.1}, refined {:.1} kg/m^3",
        initial_average_density,
        refined + heavy
    );

    DensityReconstruction {
        initial_saturate,
        initial_aromatic,
        splits,
        saturate,
        aromatic,
        initial_average_density,
        refined_average_density: refined + heavy,
        trial_fraction_sum,
        heavy_fraction_sum,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SaraType;
    use proptest::prelude::*;

    fn cuts(pairs: &[(f64, f64)]) -> Vec<DistillationCut> {
        pairs.iter().map(|&(t, f)| DistillationCut::new(t, f)).collect()
    }

    #[test]
    fn test_trial_densities_scenario() {
        let cuts = cuts(&[(400.0, 0.2), (450.0, 0.5), (500.0, 0.8)]);
        let trials: Vec<_> = trial_densities(&cuts, 12.0, None).collect();

        assert_eq!(trials.len(), 3);
        let expected = [(400.0, 0.2), (450.0, 0.3), (500.0, 0.3)];
        for (trial, (t, f)) in trials.iter().zip(expected) {
            assert!((trial.density - 1000.0 * f64::powf(t, 1.0 / 3.0) / 12.0).abs() < 1e-9);
            assert!((trial.fraction - f).abs() < 1e-12);
            assert_eq!(trial.vapor_temp_k, t);
        }
    }

    #[test]
    fn test_trial_densities_override_replaces_fraction() {
        let cuts = cuts(&[(400.0, 0.2), (450.0, 0.5), (500.0, 0.8)]);
        let overrides = [0.05, 1.7];
        let trials: Vec<_> = trial_densities(&cuts, 10.0, Some(&overrides)).collect();

        assert_eq!(trials[0].fraction, 0.05);
        // not clamped at this stage
        assert_eq!(trials[1].fraction, 1.7);
        assert!((trials[2].fraction - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_trial_densities_recomputable() {
        let cuts = cuts(&[(400.0, 0.2), (450.0, 0.5)]);
        let first: Vec<_> = trial_densities(&cuts, 12.0, None).collect();
        let second: Vec<_> = trial_densities(&cuts, 12.0, None).collect();
        assert_eq!(first, second);
        assert_eq!(trial_densities(&cuts, 12.0, None).len(), 2);
    }

    #[test]
    fn test_split_even_above_correlation_limit() {
        let cuts = cuts(&[(530.0, 0.4), (600.0, 0.9)]);
        let splits: Vec<_> = saturate_aromatic_split(&cuts, &[]).collect();

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].saturate, 0.2);
        assert_eq!(splits[0].aromatic, 0.2);
        assert!((splits[1].saturate - 0.25).abs() < 1e-12);
        assert_eq!(splits[1].saturate, splits[1].aromatic);
    }

    #[test]
    fn test_split_skips_missing_molecular_weight() {
        let cuts = cuts(&[(400.0, 0.2), (450.0, 0.5)]);
        let mws = [MolecularWeightSample {
            ref_temp_k: 450.0,
            saturate: 150.0,
            aromatic: 120.0,
        }];

        let mut split = saturate_aromatic_split(&cuts, &mws);
        let splits: Vec<_> = split.by_ref().collect();

        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].vapor_temp_k, 450.0);
        assert_eq!(
            split.take_diagnostics(),
            vec![Diagnostic::MissingMolecularWeight { vapor_temp_k: 400.0 }]
        );
    }

    #[test]
    fn test_split_correlation_value() {
        let cuts = cuts(&[(400.0, 0.2)]);
        let mws = [MolecularWeightSample {
            ref_temp_k: 400.004,
            saturate: 100.0,
            aromatic: 90.0,
        }];

        let splits: Vec<_> = saturate_aromatic_split(&cuts, &mws).collect();

        let sg = 400.0_f64.cbrt() / 12.0;
        let expected = 0.2 * (2.2843 - 1.98138 * sg - 0.009108 * 100.0);
        assert!(expected > 0.0 && expected < 0.2);
        assert!((splits[0].saturate - expected).abs() < 1e-12);
        assert_eq!(splits[0].saturate + splits[0].aromatic, 0.2);
    }

    #[test]
    fn test_split_clamps_to_zero() {
        let cuts = cuts(&[(400.0, 0.2)]);
        let mws = [MolecularWeightSample {
            ref_temp_k: 400.0,
            saturate: 400.0,
            aromatic: 300.0,
        }];

        let splits: Vec<_> = saturate_aromatic_split(&cuts, &mws).collect();

        assert_eq!(splits[0].saturate, 0.0);
        assert_eq!(splits[0].aromatic, 0.2);
    }

    #[test]
    fn test_estimate_average_density_includes_heavy_fractions() {
        let trials = [TrialDensity {
            density: 800.0,
            fraction: 0.5,
            vapor_temp_k: 400.0,
        }];
        let sara = [
            SaraFraction {
                sara_type: SaraType::Resins,
                fraction: 0.1,
            },
            SaraFraction {
                sara_type: SaraType::Asphaltenes,
                fraction: 0.05,
            },
            SaraFraction {
                sara_type: SaraType::Saturates,
                fraction: 0.6,
            },
        ];

        let avg = estimate_average_density(&trials, &sara, 1100.0);
        assert!((avg - (400.0 + 1100.0 * 0.15)).abs() < 1e-9);
    }

    #[test]
    fn test_reconstruct_density_uses_both_regimes() {
        let cuts = cuts(&[(550.0, 0.4), (600.0, 0.8)]);
        let config = EstimationConfig::default();

        let r = reconstruct_density(&cuts, &[], &[], &config);

        assert_eq!(r.splits.len(), 2);
        assert_eq!(r.saturate.len(), 2);
        assert_eq!(r.aromatic.len(), 2);
        assert!((r.trial_fraction_sum - 0.8).abs() < 1e-12);
        // even splits make both passes agree
        assert!((r.initial_average_density - r.refined_average_density).abs() < 1e-9);
        assert!(r.diagnostics.is_empty());
    }

    #[test]
    fn test_split_sums_to_fraction_exactly() {
        for temp in [350.0, 400.0, 450.0] {
            for mw in [60.0, 90.0, 120.0, 150.0] {
                for i in 1..2000 {
                    let f_i = i as f64 / 2000.0;
                    let cuts = cuts(&[(temp, f_i)]);
                    let mws = [MolecularWeightSample {
                        ref_temp_k: temp,
                        saturate: mw,
                        aromatic: mw,
                    }];

                    let splits: Vec<_> = saturate_aromatic_split(&cuts, &mws).collect();

                    assert_eq!(splits.len(), 1);
                    let s = splits[0];
                    assert_eq!(s.saturate + s.aromatic, f_i, "f_i={} mw={} t={}", f_i, mw, temp);
                    assert!(s.saturate >= 0.0 && s.saturate <= f_i);
                }
            }
        }
    }

    fn increasing_cuts() -> impl Strategy<Value = Vec<DistillationCut>> {
        prop::collection::vec((300.0f64..800.0, 0.001f64..0.2), 1..12).prop_map(|steps| {
            let mut cumulative = 0.0;
            steps
                .into_iter()
                .map(|(t, step)| {
                    cumulative += step / 2.0;
                    DistillationCut::new(t, cumulative)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_incremental_fractions_sum_to_final(cuts in increasing_cuts(), k in 9.0f64..13.0) {
            let total: f64 = trial_densities(&cuts, k, None).map(|t| t.fraction).sum();
            let last = cuts.last().unwrap().fraction;
            prop_assert!((total - last).abs() <= 1e-9);
        }

        #[test]
        fn test_split_bounds(
            cuts in increasing_cuts(),
            mw in prop::collection::vec(50.0f64..400.0, 12),
        ) {
            let mws: Vec<_> = cuts
                .iter()
                .zip(mw)
                .map(|(c, m)| MolecularWeightSample { ref_temp_k: c.vapor_temp_k, saturate: m, aromatic: m })
                .collect();
            let increments: Vec<_> = trial_densities(&cuts, 12.0, None).map(|t| t.fraction).collect();
            let splits: Vec<_> = saturate_aromatic_split(&cuts, &mws).collect();

            prop_assert_eq!(splits.len(), cuts.len());
            for (s, f_i) in splits.iter().zip(increments) {
                prop_assert!(s.saturate >= 0.0 && s.saturate <= f_i);
                prop_assert_eq!(s.saturate + s.aromatic, f_i);
                if s.vapor_temp_k >= 530.0 {
                    prop_assert_eq!(s.saturate, f_i / 2.0);
                    prop_assert_eq!(s.aromatic, f_i / 2.0);
                }
            }
        }
    }
}
