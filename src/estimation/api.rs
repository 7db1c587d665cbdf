//! API gravity and density relations

/// Reference temperature for API gravity and the canonical density (15C)
pub const REFERENCE_TEMP_K: f64 = 288.15;

/// Volumetric thermal expansion coefficient of crude oil (1/K)
pub const THERMAL_EXPANSION_COEFF: f64 = 0.0008;

/// Density at 15C (kg/m^3) for an API gravity
pub fn density_from_api(api: f64) -> f64 {
    141.5 / (api + 131.5) * 1000.0
}

/// API gravity for a density at 15C (kg/m^3)
pub fn api_from_density(density_kg_m_3: f64) -> f64 {
    141.5 / (density_kg_m_3 / 1000.0) - 131.5
}

/// Whether an API gravity can be turned into a positive, finite density
pub fn is_valid_api(api: f64) -> bool {
    api.is_finite() && api > -131.5
}

pub fn is_valid_density(density_kg_m_3: f64) -> bool {
    density_kg_m_3.is_finite() && density_kg_m_3 > 0.0
}

/// Bring a density measured at `ref_temp_k` to `temp_k`
pub fn density_at_temperature(density_kg_m_3: f64, ref_temp_k: f64, temp_k: f64) -> f64 {
    density_kg_m_3 / (1.0 - THERMAL_EXPANSION_COEFF * (ref_temp_k - temp_k))
}

/// `|a - b| / |b|`
pub fn relative_difference(a: f64, b: f64) -> f64 {
    (a - b).abs() / b.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_from_api() {
        // API 10 is the density of water
        assert!((density_from_api(10.0) - 1000.0).abs() < 1e-9);
        assert!((density_from_api(30.0) - 876.16).abs() < 0.01);
    }

    #[test]
    fn test_api_density_inverse() {
        for api in [-5.0, 10.0, 22.3, 30.0, 45.7] {
            let back = api_from_density(density_from_api(api));
            assert!((back - api).abs() < 1e-9);
        }
    }

    #[test]
    fn test_density_at_temperature() {
        // colder oil is denser
        let d = density_at_temperature(850.0, 298.15, REFERENCE_TEMP_K);
        assert!(d > 850.0);
        assert!((d - 850.0 / (1.0 - 0.0008 * 10.0)).abs() < 1e-9);
        assert_eq!(density_at_temperature(850.0, 288.15, 288.15), 850.0);
    }

    #[test]
    fn test_validity() {
        assert!(is_valid_api(30.0));
        assert!(!is_valid_api(-131.5));
        assert!(!is_valid_api(f64::NAN));
        assert!(is_valid_density(850.0));
        assert!(!is_valid_density(0.0));
    }

    #[test]
    fn test_relative_difference() {
        assert!((relative_difference(105.0, 100.0) - 0.05).abs() < 1e-12);
    }
}
