//! Density histogram with a Gaussian kernel density overlay.

use super::{ACCENT, BAR_FILL, FONT, Figure, padded_range, render_svg};
use crate::utils::{quantile_sorted, sample_std, sorted};
use anyhow::Result;
use plotters::prelude::*;

const MAX_BINS: usize = 50;
const KDE_POINTS: usize = 200;

/// One histogram bin, with its height already normalised to a density.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub density: f64,
}

/// Number of bins: Freedman-Diaconis, falling back to Sturges when the IQR
/// is zero. Always between 1 and 50.
pub fn bin_count(sorted_values: &[f64]) -> usize {
    let n = sorted_values.len();
    if n < 2 {
        return 1;
    }
    let range = sorted_values[n - 1] - sorted_values[0];
    if range <= 0.0 {
        return 1;
    }

    let sturges = ((n as f64).log2().ceil() as usize) + 1;
    let iqr = match (
        quantile_sorted(sorted_values, 0.25),
        quantile_sorted(sorted_values, 0.75),
    ) {
        (Some(q1), Some(q3)) => q3 - q1,
        _ => 0.0,
    };

    let bins = if iqr > 0.0 {
        let width = 2.0 * iqr / (n as f64).cbrt();
        (range / width).ceil() as usize
    } else {
        sturges
    };
    bins.clamp(1, MAX_BINS)
}

/// Split the values into equal-width bins whose areas sum to one.
pub fn compute_bins(values: &[f64]) -> Vec<Bin> {
    if values.is_empty() {
        return Vec::new();
    }
    let sorted_values = sorted(values);
    let n = sorted_values.len();
    let min = sorted_values[0];
    let max = sorted_values[n - 1];

    if max - min <= 0.0 {
        return vec![Bin {
            lower: min - 0.5,
            upper: max + 0.5,
            count: n,
            density: 1.0,
        }];
    }

    let bins = bin_count(&sorted_values);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &sorted_values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count,
            density: count as f64 / (n as f64 * width),
        })
        .collect()
}

/// Silverman's rule-of-thumb bandwidth, `None` for degenerate samples.
pub fn silverman_bandwidth(values: &[f64]) -> Option<f64> {
    let std = sample_std(values)?;
    let sorted_values = sorted(values);
    let iqr = quantile_sorted(&sorted_values, 0.75)? - quantile_sorted(&sorted_values, 0.25)?;
    let spread = if iqr > 0.0 { std.min(iqr / 1.34) } else { std };
    let h = 0.9 * spread * (values.len() as f64).powf(-0.2);
    (h > 0.0 && h.is_finite()).then_some(h)
}

/// Gaussian kernel density estimate evaluated at `x`.
pub fn kde_at(values: &[f64], bandwidth: f64, x: f64) -> f64 {
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth * values.len() as f64);
    values
        .iter()
        .map(|v| {
            let u = (x - v) / bandwidth;
            (-0.5 * u * u).exp()
        })
        .sum::<f64>()
        * norm
}

/// Render the histogram figure for one numeric column, saved as
/// `<stem>_histogram.svg`.
pub fn render(column: &str, stem: &str, values: &[f64]) -> Result<Figure> {
    let bins = compute_bins(values);
    let bandwidth = silverman_bandwidth(values);

    let (data_min, data_max) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first.lower, last.upper),
        _ => (0.0, 1.0),
    };
    let (x_lo, x_hi) = padded_range(data_min, data_max);

    let curve: Vec<(f64, f64)> = match bandwidth {
        Some(h) => (0..=KDE_POINTS)
            .map(|i| {
                let x = x_lo + (x_hi - x_lo) * i as f64 / KDE_POINTS as f64;
                (x, kde_at(values, h, x))
            })
            .collect(),
        None => Vec::new(),
    };

    let y_max = bins
        .iter()
        .map(|b| b.density)
        .chain(curve.iter().map(|(_, y)| *y))
        .fold(0.0_f64, f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let title = format!("Distribution of {}", column);
    let svg = render_svg((800, 500), |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&title, (FONT, 22).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_top)?;

        chart
            .configure_mesh()
            .x_desc(column)
            .y_desc("Density")
            .draw()?;

        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lower, 0.0), (b.upper, b.density)], BAR_FILL.mix(0.7).filled())
        }))?;

        if !curve.is_empty() {
            chart.draw_series(LineSeries::new(curve.iter().copied(), ACCENT.stroke_width(2)))?;
        }
        Ok(())
    })?;

    Ok(Figure {
        file_name: format!("{}_histogram.svg", stem),
        title,
        svg,
    })
}
