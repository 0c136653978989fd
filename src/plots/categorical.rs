use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use super::{file_safe, PlotError, Result};
use crate::analysis::{value_counts, CategoryCount};
use crate::config::FigureConfig;
use crate::domain::{PatientRecord, Variable};
use crate::report::format::count_string;

const BAR_COLOR: RGBColor = RGBColor(88, 61, 114);
const PIE_COLORS: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// Bar chart of category counts, with a "Value counts:" listing and a pie of
/// the observed categories beneath. Writes `Display Cat {label}.svg` into `output_dir`.
pub fn display_cats(
    records: &[PatientRecord],
    variable: Variable,
    output_dir: &Path,
    config: &FigureConfig,
) -> Result<PathBuf> {
    let counts = value_counts(records, variable);
    if counts.is_empty() {
        return Err(PlotError::InvalidData(format!("{} has no categories", variable)));
    }
    let label = variable.column();
    let path = output_dir.join(format!("Display Cat {}.svg", file_safe(label)));
    let observed: usize = counts.iter().map(|c| c.count).sum();
    render(&path, label, &counts, observed, config)?;
    Ok(path)
}

fn render(
    path: &Path,
    label: &str,
    counts: &[CategoryCount],
    observed: usize,
    config: &FigureConfig,
) -> Result<()> {
    let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;
    let area = root
        .titled(&format!("Distribution of: {}", label), ("sans-serif", 22))
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let height = area.dim_in_pixel().1 as i32;
    let (upper, lower) = area.split_vertically(height * 3 / 5);

    let names: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
    let y_max = counts.iter().map(|c| c.count).max().unwrap_or(0) as u32 + 1;

    let mut chart = ChartBuilder::on(&upper)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d((0..names.len() as i32).into_segmented(), 0u32..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let label_of = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => names
            .get(*i as usize)
            .map(|s| s.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Count")
        .x_labels(names.len())
        .x_label_formatter(&label_of)
        .label_style(("sans-serif", 12))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, c)| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0),
                    (SegmentValue::Exact(i + 1), c.count as u32),
                ],
                BAR_COLOR.mix(0.8).filled(),
            );
            bar.set_margin(0, 0, 8, 8);
            bar
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let (listing_area, pie_area) = lower.split_horizontally(lower.dim_in_pixel().0 as i32 / 2);
    let listing = format!("Value counts:\n\n{}", count_string(counts, observed));
    for (i, line) in listing.lines().enumerate() {
        listing_area
            .draw(&Text::new(
                line.to_string(),
                (40, 10 + i as i32 * 18),
                ("sans-serif", 14).into_font(),
            ))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }
    draw_pie(&pie_area, counts)?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Pie of the non-empty categories with percentage labels
fn draw_pie<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    counts: &[CategoryCount],
) -> Result<()> {
    let observed: Vec<&CategoryCount> = counts.iter().filter(|c| c.count > 0).collect();
    if observed.is_empty() {
        return Ok(());
    }
    let sizes: Vec<f64> = observed.iter().map(|c| c.count as f64).collect();
    let labels: Vec<&str> = observed.iter().map(|c| c.label.as_str()).collect();
    let colors: Vec<RGBColor> = (0..observed.len())
        .map(|i| PIE_COLORS[i % PIE_COLORS.len()])
        .collect();

    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style(("sans-serif", 12));
    pie.percentages(("sans-serif", 11));
    area.draw(&pie)
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OxygenDelivery;
    use tempfile::TempDir;

    #[test]
    fn test_display_cats_lists_value_counts() {
        let dir = TempDir::new().unwrap();
        let records: Vec<_> = [OxygenDelivery::NasalCannula, OxygenDelivery::NasalCannula, OxygenDelivery::HighFlow]
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let mut r = PatientRecord::blank(i.to_string(), 80);
                r.oxygen_delivery = Some(*o);
                r
            })
            .collect();

        let path = display_cats(
            &records,
            Variable::OxygenDelivery,
            dir.path(),
            &FigureConfig::default(),
        )
        .unwrap();

        assert!(path.ends_with("Display Cat Oxygen Delivery.svg"));
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Value counts:"));
        assert!(svg.contains("NC = 2 (66.7%)"));
        assert!(svg.contains("None = 0 (0.0%)"));
        // Pie slices
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn test_free_text_without_values_is_skipped() {
        let dir = TempDir::new().unwrap();
        let records = vec![PatientRecord::blank("1", 80)];
        let result = display_cats(&records, Variable::Gender, dir.path(), &FigureConfig::default());
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }
}
