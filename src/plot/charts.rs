//! SVG chart rendering.
//!
//! Two outputs, both written with Plotters' SVG backend (no native font
//! dependencies):
//!
//! - `yields.svg`: one panel per cohort entity, yield vs. year, one
//!   line+point series per crop
//! - `volcano.svg`: one panel per crop, slope estimate vs. −log10 of the
//!   adjusted p-value, with a reference line at slope 0 and a label per point
//!
//! All series data and bounds are computed before drawing; the draw functions
//! only format and scale.

use std::collections::BTreeMap;
use std::path::Path;

use plotters::prelude::*;

use crate::domain::{Observation, SlopeRecord};
use crate::error::AppError;

/// Fixed series colors, assigned by crop position in the configured subset.
const CROP_COLORS: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

fn crop_color(crops: &[String], crop: &str) -> RGBColor {
    let idx = crops.iter().position(|c| c == crop).unwrap_or(0);
    CROP_COLORS[idx % CROP_COLORS.len()]
}

/// Panel grid shape: as close to square as fits `n` panels.
fn grid_shape(n: usize) -> (usize, usize) {
    let cols = (n as f64).sqrt().ceil().max(1.0) as usize;
    let rows = n.div_ceil(cols);
    (rows, cols)
}

/// Pad a value range so flat series still get a visible axis.
fn padded(min: f64, max: f64) -> (f64, f64) {
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span <= 0.0 {
        (min - 0.5, max + 0.5)
    } else {
        (min - 0.05 * span, max + 0.05 * span)
    }
}

/// Render one yield-vs-year panel per entity.
///
/// Panel order follows cohort order; entities without observations are
/// omitted rather than drawn empty.
pub fn render_yield_panels(
    path: &Path,
    observations: &[Observation],
    cohort: &[String],
    crops: &[String],
) -> Result<(), AppError> {
    let mut per_entity: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        per_entity.entry(obs.entity.as_str()).or_default().push(obs);
    }
    let entities: Vec<&str> = cohort
        .iter()
        .map(String::as_str)
        .filter(|e| per_entity.contains_key(e))
        .collect();
    if entities.is_empty() {
        return Err(AppError::no_data(
            "No observations to plot (empty tidy table).",
        ));
    }

    draw_yield_panels(path, &entities, &per_entity, crops).map_err(|e| {
        AppError::configuration(format!(
            "Failed to render '{}': {e}",
            path.display()
        ))
    })
}

fn draw_yield_panels(
    path: &Path,
    entities: &[&str],
    per_entity: &BTreeMap<&str, Vec<&Observation>>,
    crops: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let (rows, cols) = grid_shape(entities.len());
    let size = (cols as u32 * 320, rows as u32 * 240);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((rows, cols));

    for (entity, area) in entities.iter().zip(areas.iter()) {
        let obs = &per_entity[entity];

        let year_min = obs.iter().map(|o| o.year).min().unwrap_or(0) as f64;
        let year_max = obs.iter().map(|o| o.year).max().unwrap_or(1) as f64;
        let y_min = obs.iter().map(|o| o.yield_).fold(f64::INFINITY, f64::min);
        let y_max = obs
            .iter()
            .map(|o| o.yield_)
            .fold(f64::NEG_INFINITY, f64::max);
        let (x0, x1) = padded(year_min, year_max);
        let (y0, y1) = padded(y_min, y_max);

        let mut chart = ChartBuilder::on(area)
            .caption(*entity, ("sans-serif", 14))
            .margin(5)
            .set_label_area_size(LabelAreaPosition::Left, 35)
            .set_label_area_size(LabelAreaPosition::Bottom, 20)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(4)
            .y_labels(4)
            .x_label_formatter(&|v| format!("{v:.0}"))
            .label_style(("sans-serif", 10))
            .draw()?;

        for crop in crops {
            let mut series: Vec<(f64, f64)> = obs
                .iter()
                .filter(|o| &o.crop == crop)
                .map(|o| (o.year as f64, o.yield_))
                .collect();
            if series.is_empty() {
                continue;
            }
            series.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let color = crop_color(crops, crop);
            chart
                .draw_series(LineSeries::new(series.iter().copied(), &color))?
                .label(crop.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color)
                });
            chart.draw_series(
                series
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 2, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .border_style(BLACK.mix(0.3))
            .label_font(("sans-serif", 10))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Render one volcano panel per crop: slope estimate vs. −log10(adjusted p).
pub fn render_volcano(
    path: &Path,
    records: &[SlopeRecord],
    crops: &[String],
) -> Result<(), AppError> {
    let present: Vec<&str> = crops
        .iter()
        .map(String::as_str)
        .filter(|c| records.iter().any(|r| r.crop == *c))
        .collect();
    if present.is_empty() {
        return Err(AppError::no_data("No records to plot (empty batch)."));
    }

    draw_volcano(path, records, &present, crops).map_err(|e| {
        AppError::configuration(format!(
            "Failed to render '{}': {e}",
            path.display()
        ))
    })
}

/// Log-scale a p-value, clamping so p = 0 stays drawable.
fn neg_log10(p: f64) -> f64 {
    -(p.max(1e-300)).log10()
}

fn draw_volcano(
    path: &Path,
    records: &[SlopeRecord],
    panels: &[&str],
    crops: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let (rows, cols) = grid_shape(panels.len());
    let size = (cols as u32 * 420, rows as u32 * 340);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((rows, cols));

    for (crop, area) in panels.iter().zip(areas.iter()) {
        let points: Vec<(&str, f64, f64)> = records
            .iter()
            .filter(|r| r.crop == *crop)
            .map(|r| (r.entity.as_str(), r.estimate, neg_log10(r.p_value)))
            .collect();

        let est_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let est_max = points
            .iter()
            .map(|p| p.1)
            .fold(f64::NEG_INFINITY, f64::max);
        // Keep the zero reference line inside the panel.
        let (x0, x1) = padded(est_min.min(0.0), est_max.max(0.0));
        let y_max = points.iter().map(|p| p.2).fold(0.0, f64::max);
        let (_, y1) = padded(0.0, y_max.max(1.0));

        let mut chart = ChartBuilder::on(area)
            .caption(*crop, ("sans-serif", 16))
            .margin(8)
            .set_label_area_size(LabelAreaPosition::Left, 40)
            .set_label_area_size(LabelAreaPosition::Bottom, 28)
            .build_cartesian_2d(x0..x1, 0.0..y1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc("slope (t/ha per year)")
            .y_desc("-log10(adj p)")
            .x_labels(5)
            .y_labels(5)
            .label_style(("sans-serif", 10))
            .draw()?;

        chart.draw_series(LineSeries::new(
            [(0.0, 0.0), (0.0, y1)],
            BLACK.mix(0.4),
        ))?;

        let color = crop_color(crops, crop);
        chart.draw_series(
            points
                .iter()
                .map(|&(_, x, y)| Circle::new((x, y), 3, color.filled())),
        )?;
        chart.draw_series(points.iter().map(|&(entity, x, y)| {
            Text::new(entity.to_string(), (x, y), ("sans-serif", 9))
        }))?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_shape_is_compact() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(4), (2, 2));
        assert_eq!(grid_shape(5), (2, 3));
        assert_eq!(grid_shape(30), (5, 6));
    }

    #[test]
    fn neg_log10_clamps_zero() {
        assert!((neg_log10(0.01) - 2.0).abs() < 1e-12);
        assert!(neg_log10(0.0).is_finite());
    }

    #[test]
    fn renders_svg_files_for_a_tiny_run() {
        let observations = vec![
            Observation {
                entity: "India".to_string(),
                year: 2018,
                crop: "wheat".to_string(),
                yield_: 3.0,
            },
            Observation {
                entity: "India".to_string(),
                year: 2019,
                crop: "wheat".to_string(),
                yield_: 3.5,
            },
        ];
        let records = vec![SlopeRecord {
            entity: "India".to_string(),
            crop: "wheat".to_string(),
            estimate: 0.5,
            std_error: 0.1,
            t_value: 5.0,
            p_value: 0.01,
        }];
        let crops = vec!["wheat".to_string()];
        let cohort = vec!["India".to_string()];

        let dir = std::env::temp_dir();
        let yields_path = dir.join(format!("yt_yields_test_{}.svg", std::process::id()));
        let volcano_path = dir.join(format!("yt_volcano_test_{}.svg", std::process::id()));

        render_yield_panels(&yields_path, &observations, &cohort, &crops).unwrap();
        render_volcano(&volcano_path, &records, &crops).unwrap();

        let svg = std::fs::read_to_string(&yields_path).unwrap();
        assert!(svg.contains("<svg"));

        std::fs::remove_file(yields_path).ok();
        std::fs::remove_file(volcano_path).ok();
    }
}
