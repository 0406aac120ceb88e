//! Chart rendering from the metric bundle.
//!
//! Produces four PNGs under `<output>/figures/`. Each chart renders
//! independently: a chart whose data is empty or degenerate is skipped
//! with a warning and the remaining charts still render.

use anyhow::{Context, Result, bail};
use plotters::prelude::*;
use std::path::Path;
use tracing::{info, warn};

use crate::analytics::types::MetricBundle;
use crate::config::Config;

const CHART_SIZE: (u32, u32) = (1000, 600);

/// Renders every chart the bundle has data for and returns how many were
/// written. The figures directory is created if absent.
pub fn render_all(bundle: &MetricBundle, config: &Config) -> Result<usize> {
    let figures_dir = config.figures_dir();
    std::fs::create_dir_all(&figures_dir)
        .with_context(|| format!("cannot create {}", figures_dir.display()))?;

    let charts: [(&str, fn(&MetricBundle, &Path) -> Result<()>); 4] = [
        ("trips_per_station.png", trips_per_station),
        ("monthly_trend.png", monthly_trend),
        ("duration_histogram.png", duration_histogram),
        ("duration_by_user_type.png", duration_by_user_type),
    ];

    let mut rendered = 0;
    for (file_name, draw) in charts {
        let path = figures_dir.join(file_name);
        match draw(bundle, &path) {
            Ok(()) => {
                info!(path = %path.display(), "Chart written");
                rendered += 1;
            }
            Err(e) => warn!(chart = file_name, error = %e, "Chart skipped"),
        }
    }

    Ok(rendered)
}

/// Bar chart of trip counts for the busiest start stations.
fn trips_per_station(bundle: &MetricBundle, path: &Path) -> Result<()> {
    let data = &bundle.station_counts;
    if data.is_empty() {
        bail!("no station counts");
    }

    let max_trips = data.iter().map(|s| s.trips).max().unwrap_or(0) as i32;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Trips per Station", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..data.len() as i32, 0i32..max_trips + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(data.len())
        .x_label_formatter(&|x| {
            data.get(*x as usize)
                .map(|s| s.station_id.clone())
                .unwrap_or_default()
        })
        .x_desc("Station")
        .y_desc("Trips")
        .draw()?;

    chart.draw_series(data.iter().enumerate().map(|(i, s)| {
        Rectangle::new([(i as i32, 0), (i as i32 + 1, s.trips as i32)], BLUE.filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Line chart of trips per calendar month.
fn monthly_trend(bundle: &MetricBundle, path: &Path) -> Result<()> {
    let data = &bundle.monthly_trend;
    if data.is_empty() {
        bail!("no monthly data");
    }

    let max_trips = data.iter().map(|m| m.trips).max().unwrap_or(0) as i32;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Trip Trend", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..data.len() as i32, 0i32..max_trips + 1)?;

    chart
        .configure_mesh()
        .x_labels(data.len())
        .x_label_formatter(&|x| {
            data.get(*x as usize)
                .map(|m| m.label())
                .unwrap_or_default()
        })
        .x_desc("Month")
        .y_desc("Trips")
        .draw()?;

    chart.draw_series(LineSeries::new(
        data.iter()
            .enumerate()
            .map(|(i, m)| (i as i32, m.trips as i32)),
        &RED,
    ))?;

    root.present()?;
    Ok(())
}

/// Histogram of the trip duration distribution, drawn from the bucket
/// counts the engine computed with the numerical helpers.
fn duration_histogram(bundle: &MetricBundle, path: &Path) -> Result<()> {
    let buckets = match &bundle.duration_histogram {
        Some(buckets) if !buckets.is_empty() => buckets,
        _ => bail!("no duration histogram"),
    };

    let mut x_min = buckets.first().map(|b| b.lower).unwrap_or(0.0);
    let mut x_max = buckets.last().map(|b| b.upper).unwrap_or(0.0);
    if x_min == x_max {
        // single distinct duration: pad so the lone bar is visible
        x_min -= 0.5;
        x_max += 0.5;
    }
    let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0) as i32;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Trip Duration Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0i32..max_count + 1)?;

    chart
        .configure_mesh()
        .x_desc("Duration (minutes)")
        .y_desc("Trips")
        .draw()?;

    chart.draw_series(buckets.iter().map(|b| {
        let (lo, hi) = if b.lower == b.upper {
            (x_min, x_max)
        } else {
            (b.lower, b.upper)
        };
        Rectangle::new([(lo, 0), (hi, b.count as i32)], BLUE.filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Box-style plot of trip duration per user type, drawn from the
/// five-number summaries in the bundle.
fn duration_by_user_type(bundle: &MetricBundle, path: &Path) -> Result<()> {
    let data = &bundle.duration_by_user_type;
    if data.is_empty() {
        bail!("no per-user-type durations");
    }

    let y_max = data
        .iter()
        .map(|d| d.summary.max)
        .fold(f64::MIN, f64::max)
        .max(1.0)
        * 1.05;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Trip Duration by User Type", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..data.len() as f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .x_desc("User type")
        .y_desc("Duration (minutes)")
        .draw()?;

    let colors = [BLUE, RED];
    for (i, entry) in data.iter().enumerate() {
        let s = &entry.summary;
        let color = colors[i % colors.len()];
        let center = i as f64 + 0.5;
        let (x0, x1) = (i as f64 + 0.25, i as f64 + 0.75);

        // whisker with caps
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(center, s.min), (center, s.max)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(center - 0.1, s.min), (center + 0.1, s.min)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(center - 0.1, s.max), (center + 0.1, s.max)],
            BLACK.stroke_width(1),
        )))?;

        // interquartile box, legend entry names the user type
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x0, s.p25), (x1, s.p75)],
                color.mix(0.35).filled(),
            )))?
            .label(entry.user_type.label())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.mix(0.35).filled())
            });
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x0, s.p25), (x1, s.p75)],
            color.stroke_width(1),
        )))?;

        // median line
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x0, s.median), (x1, s.median)],
            BLACK.stroke_width(2),
        )))?;
    }

    chart.configure_series_labels().border_style(BLACK).draw()?;

    root.present()?;
    Ok(())
}
