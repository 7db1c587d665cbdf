//! Distillation cut audit
//!
//! Re-runs the trial density passes for each derived oil and compares the
//! reconstructed bulk density with the oil's 15C density.

use std::fmt::Write as _;

use serde::Serialize;

use crate::db::Database;
use crate::estimation::{
    convert, kvis_at_temperature, reconstruct_density, DensityReconstruction, EstimationConfig,
    EstimationResult, QuantityKind,
};
use crate::models::{ImportedRecord, Oil};

/// Reference temperature for the reported viscosity (100F)
pub const AUDIT_VISCOSITY_TEMP_K: f64 = 311.15;

#[derive(Debug, Clone, Serialize)]
pub struct CutAudit {
    pub adios_oil_id: String,
    pub name: String,
    pub api: f64,
    pub density_15c_kg_m_3: f64,
    /// Fresh oil kinematic viscosity at 38C, in cSt
    pub kvis_38c_cst: Option<f64>,
    /// Reconstructed vs measured 15C density, in percent
    pub density_difference_pct: f64,
    pub reconstruction: DensityReconstruction,
}

fn signed_difference_pct(value: f64, reference: f64) -> f64 {
    (value - reference) / reference * 100.0
}

/// Audit one oil against the cuts of its imported record
pub fn audit_oil(
    imported: &ImportedRecord,
    oil: &Oil,
    config: &EstimationConfig,
) -> EstimationResult<CutAudit> {
    let reconstruction = reconstruct_density(
        &imported.cuts,
        &imported.molecular_weights,
        &imported.sara_fractions,
        config,
    );

    let kvis_kind = QuantityKind::KinematicViscosity;
    let kvis_38c_cst = kvis_at_temperature(&oil.record.kvis, AUDIT_VISCOSITY_TEMP_K, config)
        .map(|v| convert(kvis_kind, kvis_kind.canonical_unit(), "cSt", v))
        .transpose()?;

    Ok(CutAudit {
        adios_oil_id: oil.record.adios_oil_id.clone(),
        name: oil.record.name.clone(),
        api: oil.record.api,
        density_15c_kg_m_3: oil.record.density_15c_kg_m_3,
        kvis_38c_cst,
        density_difference_pct: signed_difference_pct(
            reconstruction.refined_average_density,
            oil.record.density_15c_kg_m_3,
        ),
        reconstruction,
    })
}

/// Audit every derived oil whose imported record has distillation cuts
pub fn audit_all(database: &Database, config: &EstimationConfig) -> Result<Vec<CutAudit>, String> {
    let pairs = database
        .with_conn(|conn| {
            let mut pairs = Vec::new();
            for oil in Oil::list(conn)? {
                if let Some(imported) = ImportedRecord::get_by_id(conn, oil.record.imported_record_id)? {
                    if !imported.cuts.is_empty() {
                        pairs.push((imported, oil));
                    }
                }
            }
            Ok(pairs)
        })
        .map_err(|e| e.to_string())?;

    pairs
        .iter()
        .map(|(imported, oil)| audit_oil(imported, oil, config).map_err(|e| e.to_string()))
        .collect()
}

/// Plain text rendering of an audit
pub fn render_audit(audit: &CutAudit) -> String {
    let mut out = String::new();
    let r = &audit.reconstruction;

    let _ = writeln!(out, "{} ({})", audit.name, audit.adios_oil_id);
    let _ = writeln!(
        out,
        "  API {:.1}, density {:.1} kg/m^3 at 15C",
        audit.api, audit.density_15c_kg_m_3
    );
    match audit.kvis_38c_cst {
        Some(cst) => {
            let _ = writeln!(out, "  viscosity {:.2} cSt at 38C", cst);
        }
        None => {
            let _ = writeln!(out, "  viscosity unknown");
        }
    }

    let _ = writeln!(out, "  {:>10} {:>10} {:>10} {:>10}", "T (K)", "sat", "arom", "f_i");
    for split in &r.splits {
        let _ = writeln!(
            out,
            "  {:>10.2} {:>10.4} {:>10.4} {:>10.4}",
            split.vapor_temp_k,
            split.saturate,
            split.aromatic,
            split.saturate + split.aromatic
        );
    }

    let _ = writeln!(
        out,
        "  initial {:.1} kg/m^3, refined {:.1} kg/m^3 ({:+.1}%)",
        r.initial_average_density, r.refined_average_density, audit.density_difference_pct
    );
    let _ = writeln!(
        out,
        "  fractions: trials {:.3}, resins+asphaltenes {:.3}",
        r.trial_fraction_sum, r.heavy_fraction_sum
    );
    for diagnostic in &r.diagnostics {
        let _ = writeln!(out, "  ! {}", diagnostic);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::assemble;
    use crate::models::{DistillationCut, ImportedMeasurement, MolecularWeightSample};

    fn imported() -> ImportedRecord {
        ImportedRecord {
            id: 1,
            adios_oil_id: "AD00003".to_string(),
            name: "AUDIT CRUDE".to_string(),
            location: None,
            field_name: None,
            product_type: None,
            oil_class: None,
            api: Some(32.0),
            densities: Vec::new(),
            kvis: vec![ImportedMeasurement::new(1.0e-5, Some(311.15), None)],
            dvis: Vec::new(),
            cuts: vec![DistillationCut::new(400.0, 0.3), DistillationCut::new(500.0, 0.7)],
            molecular_weights: vec![MolecularWeightSample {
                ref_temp_k: 400.0,
                saturate: 120.0,
                aromatic: 100.0,
            }],
            sara_fractions: Vec::new(),
        }
    }

    #[test]
    fn test_audit_reports_viscosity_in_cst() {
        let config = EstimationConfig::default();
        let rec = imported();
        let derived = assemble(&rec, &config).into_result().unwrap();
        let oil = Oil {
            id: 1,
            created_at: String::new(),
            record: derived,
        };

        let audit = audit_oil(&rec, &oil, &config).unwrap();

        assert!((audit.kvis_38c_cst.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(audit.reconstruction.splits.len(), 1);
        assert_eq!(audit.reconstruction.diagnostics.len(), 1);

        let text = render_audit(&audit);
        assert!(text.contains("AUDIT CRUDE (AD00003)"));
        assert!(text.contains("10.00 cSt"));
    }
}
