//! Viscosity chart
//!
//! Renders an oil's fresh kinematic viscosities against temperature as a PNG,
//! with the Andrade curve through the measurements.

use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;

use crate::estimation::{convert, kvis_at_temperature, EstimationConfig, EstimationResult, QuantityKind};
use crate::models::{nearly_equal, Oil};

/// Curve samples across the plotted temperature range
const CURVE_POINTS: usize = 60;

fn to_cst(m_2_s: f64) -> EstimationResult<f64> {
    let kind = QuantityKind::KinematicViscosity;
    convert(kind, kind.canonical_unit(), "cSt", m_2_s)
}

/// Fresh oil viscosities as (temperature in C, viscosity in cSt)
pub fn viscosity_points(oil: &Oil, config: &EstimationConfig) -> EstimationResult<Vec<(f64, f64)>> {
    oil.record
        .kvis
        .iter()
        .filter(|k| nearly_equal(k.weathering, 0.0, config.weathering_epsilon))
        .map(|k| {
            Ok((
                convert(QuantityKind::Temperature, "K", "C", k.ref_temp_k)?,
                to_cst(k.value)?,
            ))
        })
        .collect()
}

/// Andrade curve sampled between `min_c` and `max_c`, in (C, cSt)
pub fn viscosity_curve(
    oil: &Oil,
    min_c: f64,
    max_c: f64,
    config: &EstimationConfig,
) -> EstimationResult<Vec<(f64, f64)>> {
    let mut curve = Vec::with_capacity(CURVE_POINTS);
    for i in 0..CURVE_POINTS {
        let temp_c = min_c + (max_c - min_c) * i as f64 / (CURVE_POINTS - 1) as f64;
        let temp_k = convert(QuantityKind::Temperature, "C", "K", temp_c)?;
        if let Some(v) = kvis_at_temperature(&oil.record.kvis, temp_k, config) {
            curve.push((temp_c, to_cst(v)?));
        }
    }
    Ok(curve)
}

/// Generate the viscosity chart as PNG bytes
///
/// The y axis is log10 of the viscosity in cSt.
pub fn generate_viscosity_chart(
    oil: &Oil,
    config: &EstimationConfig,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    let points = viscosity_points(oil, config).map_err(|e| e.to_string())?;
    if points.is_empty() {
        return Err(format!("No fresh oil viscosities for {}", oil.record.adios_oil_id));
    }

    let x_min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min) - 10.0;
    let x_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max) + 10.0;
    let curve = viscosity_curve(oil, x_min, x_max, config).map_err(|e| e.to_string())?;

    let log_points: Vec<(f64, f64)> = points.iter().map(|(t, v)| (*t, v.log10())).collect();
    let log_curve: Vec<(f64, f64)> = curve.iter().map(|(t, v)| (*t, v.log10())).collect();

    let y_min = log_points
        .iter()
        .chain(log_curve.iter())
        .map(|p| p.1)
        .fold(f64::INFINITY, f64::min)
        .floor();
    let y_max = log_points
        .iter()
        .chain(log_curve.iter())
        .map(|p| p.1)
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .max(y_min + 1.0);

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let caption = format!("{} ({})", oil.record.name, oil.record.adios_oil_id);
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_desc("Temperature (C)")
            .y_desc("Viscosity (cSt)")
            .y_label_formatter(&|y| format!("{:.0}", 10f64.powf(*y)))
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(LineSeries::new(log_curve, BLUE.stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label("Andrade fit")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        chart
            .draw_series(log_points.iter().map(|(x, y)| Circle::new((*x, *y), 4, RED.filled())))
            .map_err(|e| e.to_string())?
            .label("Measured")
            .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    // Convert RGB buffer to PNG
    let img = RgbImage::from_raw(width, height, buffer).ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}
