//! Renders projected time series to PNG line charts.

use anyhow::Result;
use chrono::FixedOffset;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use waterwatch_core::{
    catalog,
    projection::{TimeSeries, LEGAL_MAX_LABEL},
};

const SERIES_COLOR: RGBColor = RGBColor(75, 192, 192);

/// Draws `series` with its legal-limit overlays into `output_dir` and
/// returns the image path. The x axis is one category per sample.
pub fn plot_time_series(output_dir: &Path, series: &TimeSeries, offset: FixedOffset) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}_over_time.png", series.parameter.id().to_lowercase()));
    draw_chart(&path, series, offset)?;
    Ok(path)
}

fn draw_chart(path: &Path, series: &TimeSeries, offset: FixedOffset) -> Result<()> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<String> = series
        .points
        .iter()
        .map(|p| p.timestamp.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string())
        .collect();

    let (low, high) = series.value_bounds().unwrap_or((0.0, 1.0));
    let y_min = if low >= 0.0 { 0.0 } else { low * 1.1 };
    let y_max = if high > 0.0 { high * 1.1 } else { 1.0 };
    let x_max = series.points.len().saturating_sub(1).max(1) as u64;

    let title = catalog::label_with_unit(series.parameter);
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} over Time", title), ("sans-serif", 40).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0u64..x_max, y_min..y_max)?;

    let x_formatter = |x: &u64| labels.get(*x as usize).cloned().unwrap_or_default();
    chart
        .configure_mesh()
        .x_desc("Sample time")
        .y_desc(title.as_str())
        .x_labels(labels.len().clamp(2, 8))
        .x_label_formatter(&x_formatter)
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            series.points.iter().enumerate().map(|(i, p)| (i as u64, p.value)),
            SERIES_COLOR.stroke_width(2),
        ))?
        .label(series.parameter.display_name())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SERIES_COLOR.filled()));

    chart.draw_series(
        series
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| Circle::new((i as u64, p.value), 3, SERIES_COLOR.filled())),
    )?;

    for line in &series.reference_lines {
        let color = if line.label == LEGAL_MAX_LABEL { GREEN } else { RED };
        chart
            .draw_series(DashedLineSeries::new(
                line.data.iter().enumerate().map(|(i, v)| (i as u64, *v)),
                10,
                5,
                color.stroke_width(2),
            ))?
            .label(line.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
