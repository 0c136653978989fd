use plotters::coord::types::RangedCoordf64;
use plotters::coord::cartesian::Cartesian2d;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use super::{file_safe, PlotError, Result};
use crate::analysis::describe::{values, Summary};
use crate::config::FigureConfig;
use crate::domain::{PatientRecord, Variable};

const HISTOGRAM_COLOR: RGBColor = RGBColor(0, 128, 128);
const BOX_COLOR: RGBColor = RGBColor(135, 206, 235);

/// Bin edges and counts over `[min, max]` of the data
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| (min + i as f64 * width, min + (i + 1) as f64 * width, count))
        .collect()
}

fn caption_lines(label: &str, summary: &Summary) -> Vec<String> {
    let fmt = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "n/a".to_string());
    vec![
        label.to_string(),
        format!("Mean: {}, Std Dev: {}", fmt(summary.mean), fmt(summary.std)),
        format!(
            "Median: {}, IQR: [{}, {}]",
            fmt(summary.median),
            fmt(summary.q25),
            fmt(summary.q75)
        ),
        format!("Count: {}", summary.count),
    ]
}

/// Histogram above a horizontal box plot on a shared x axis starting at 0,
/// with the descriptive statistics as caption. Writes
/// `Display Dist {label}.svg` into `output_dir`.
pub fn display_dist(
    records: &[PatientRecord],
    variable: Variable,
    output_dir: &Path,
    config: &FigureConfig,
) -> Result<PathBuf> {
    let data = values(records, variable);
    if data.is_empty() {
        return Err(PlotError::InvalidData(format!("{} has no values", variable)));
    }
    let summary = Summary::of(&data);
    let label = variable.column();
    let path = output_dir.join(format!("Display Dist {}.svg", file_safe(label)));
    render(&path, label, &data, &summary, config)?;
    Ok(path)
}

fn render(
    path: &Path,
    label: &str,
    data: &[f64],
    summary: &Summary,
    config: &FigureConfig,
) -> Result<()> {
    let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;
    let area = root
        .titled(&format!("Distribution of: {}", label), ("sans-serif", 22))
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let height = area.dim_in_pixel().1 as i32;
    let (upper, rest) = area.split_vertically(height * 11 / 20);
    let (middle, lower) = rest.split_vertically(height * 5 / 20);

    let bins = histogram(data, config.histogram_bins);
    let max_value = summary.max.unwrap_or(0.0);
    let x_max = if max_value > 0.0 { max_value * 1.05 } else { 1.0 };
    let y_max = bins.iter().map(|b| b.2).max().unwrap_or(0) as f64 + 1.0;

    let mut hist_chart = ChartBuilder::on(&upper)
        .margin(10)
        .x_label_area_size(25)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;
    hist_chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Count per bin")
        .label_style(("sans-serif", 12))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    hist_chart
        .draw_series(bins.iter().map(|&(lo, hi, count)| {
            Rectangle::new([(lo, 0.0), (hi, count as f64)], HISTOGRAM_COLOR.mix(0.7).filled())
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let mut box_chart = ChartBuilder::on(&middle)
        .margin(10)
        .x_label_area_size(25)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..x_max, 0f64..1f64)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;
    box_chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .label_style(("sans-serif", 12))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    draw_box(&mut box_chart, data, summary)?;

    for (i, line) in caption_lines(label, summary).iter().enumerate() {
        lower
            .draw(&Text::new(
                line.clone(),
                (60, 10 + i as i32 * 20),
                ("sans-serif", 15).into_font(),
            ))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Box from q25 to q75 with the median marked, whiskers to the furthest
/// points within 1.5 IQR and the remaining points drawn as outliers
fn draw_box<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    data: &[f64],
    summary: &Summary,
) -> Result<()> {
    let (Some(q1), Some(median), Some(q3)) = (summary.q25, summary.median, summary.q75) else {
        return Ok(());
    };
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let inside = data.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
    let whisker_lo = inside.clone().fold(q1, f64::min);
    let whisker_hi = inside.fold(q3, f64::max);
    let (top, bottom, mid) = (0.75, 0.25, 0.5);

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(q1, bottom), (q3, top)],
            BOX_COLOR.filled(),
        )))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let lines = vec![
        vec![(q1, bottom), (q3, bottom), (q3, top), (q1, top), (q1, bottom)],
        vec![(median, bottom), (median, top)],
        vec![(whisker_lo, mid), (q1, mid)],
        vec![(q3, mid), (whisker_hi, mid)],
        vec![(whisker_lo, 0.35), (whisker_lo, 0.65)],
        vec![(whisker_hi, 0.35), (whisker_hi, 0.65)],
    ];
    chart
        .draw_series(lines.into_iter().map(|points| PathElement::new(points, BLACK.stroke_width(1))))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(
            data.iter()
                .filter(|v| **v < lo_fence || **v > hi_fence)
                .map(|v| Circle::new((*v, mid), 3, BLACK.filled())),
        )
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_histogram_bins_cover_all_values() {
        let bins = histogram(&[1.0, 2.0, 3.0, 4.0, 5.0], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.2).sum::<usize>(), 5);
        assert_eq!(bins[3].2, 2);
        assert!((bins[0].0 - 1.0).abs() < 1e-12);
        assert!((bins[3].1 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_of_constant_values() {
        let bins = histogram(&[7.0, 7.0], 3);
        assert_eq!(bins[0].2, 2);
    }

    #[test]
    fn test_caption_lines() {
        let summary = Summary::of(&[2.0, 4.0]);
        let lines = caption_lines("LOS", &summary);
        assert_eq!(lines[0], "LOS");
        assert_eq!(lines[1], "Mean: 3.0, Std Dev: 1.4");
        assert_eq!(lines[2], "Median: 3.0, IQR: [2.5, 3.5]");
        assert_eq!(lines[3], "Count: 2");
    }

    #[test]
    fn test_display_dist_writes_svg() {
        let dir = TempDir::new().unwrap();
        let records: Vec<_> = [3u32, 5, 9, 12, 40]
            .iter()
            .enumerate()
            .map(|(i, los)| {
                let mut r = PatientRecord::blank(i.to_string(), 80);
                r.los = Some(*los);
                r
            })
            .collect();

        let path = display_dist(&records, Variable::Los, dir.path(), &FigureConfig::default()).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(path.ends_with("Display Dist LOS.svg"));
        assert!(svg.contains("Distribution of: LOS"));
        assert!(svg.contains("Count per bin"));
    }

    #[test]
    fn test_display_dist_without_values() {
        let dir = TempDir::new().unwrap();
        let records = vec![PatientRecord::blank("1", 80)];
        let result = display_dist(&records, Variable::Bmi, dir.path(), &FigureConfig::default());
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }
}
