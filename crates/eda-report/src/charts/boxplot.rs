//! Before/after boxplot pair used as the outlier clipping diagnostic.

use super::{ACCENT, BOX_FILL, FONT, Figure, padded_range, render_svg};
use crate::utils::{quantile_sorted, sorted};
use anyhow::{Result, anyhow};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

/// Tukey box statistics for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value inside the lower fence.
    pub whisker_low: f64,
    /// Highest value inside the upper fence.
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let s = sorted(values);
        let q1 = quantile_sorted(&s, 0.25)?;
        let median = quantile_sorted(&s, 0.5)?;
        let q3 = quantile_sorted(&s, 0.75)?;
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside: Vec<f64> = s
            .iter()
            .copied()
            .filter(|v| *v >= lo_fence && *v <= hi_fence)
            .collect();
        let outliers = s
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low: inside.first().copied().unwrap_or(q1),
            whisker_high: inside.last().copied().unwrap_or(q3),
            outliers,
        })
    }

    fn extent(&self) -> (f64, f64) {
        self.outliers
            .iter()
            .fold((self.whisker_low, self.whisker_high), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
    }
}

/// Render boxes for the values before and after clipping side by side.
pub fn render(column: &str, stem: &str, before: &[f64], after: &[f64]) -> Result<Figure> {
    let before_stats = BoxStats::from_values(before)
        .ok_or_else(|| anyhow!("no values to plot for '{}'", column))?;
    let after_stats = BoxStats::from_values(after)
        .ok_or_else(|| anyhow!("no values to plot for '{}'", column))?;

    let (b_lo, b_hi) = before_stats.extent();
    let (a_lo, a_hi) = after_stats.extent();
    let (y_lo, y_hi) = padded_range(b_lo.min(a_lo), b_hi.max(a_hi));

    let title = format!("Outlier clipping: {}", column);
    let svg = render_svg((700, 500), |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&title, (FONT, 22).into_font())
            .margin(15)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..2.0, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(3)
            .x_label_formatter(&|x: &f64| {
                if (*x - 0.5).abs() < 0.25 {
                    "before".to_string()
                } else if (*x - 1.5).abs() < 0.25 {
                    "after".to_string()
                } else {
                    String::new()
                }
            })
            .y_desc(column)
            .draw()?;

        for (center, stats) in [(0.5, &before_stats), (1.5, &after_stats)] {
            draw_box(&mut chart, center, stats)?;
        }
        Ok(())
    })?;

    Ok(Figure {
        file_name: format!("{}_boxplot.svg", stem),
        title,
        svg,
    })
}

fn draw_box(
    chart: &mut ChartContext<'_, SVGBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    center: f64,
    stats: &BoxStats,
) -> Result<()> {
    let half = 0.25;
    let cap = 0.1;
    let line = BLACK.stroke_width(1);
    let corners = [(center - half, stats.q1), (center + half, stats.q3)];

    chart.draw_series(std::iter::once(Rectangle::new(corners, BOX_FILL.filled())))?;
    chart.draw_series(std::iter::once(Rectangle::new(corners, line)))?;

    let segments = [
        [(center - half, stats.median), (center + half, stats.median)],
        [(center, stats.q3), (center, stats.whisker_high)],
        [(center, stats.q1), (center, stats.whisker_low)],
        [(center - cap, stats.whisker_high), (center + cap, stats.whisker_high)],
        [(center - cap, stats.whisker_low), (center + cap, stats.whisker_low)],
    ];
    chart.draw_series(
        segments
            .into_iter()
            .map(|pts| PathElement::new(pts.to_vec(), line)),
    )?;

    chart.draw_series(
        stats
            .outliers
            .iter()
            .map(|v| Circle::new((center, *v), 3, ACCENT.filled())),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_stats_flags_outliers() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.whisker_high, 4.0);
        assert_eq!(stats.whisker_low, 1.0);
    }

    #[test]
    fn test_box_stats_empty() {
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_render_pair() {
        let before = [1.0, 2.0, 3.0, 4.0, 100.0];
        let after = [1.0, 2.0, 3.0, 4.0, 7.0];
        let figure = render("income", "income", &before, &after).unwrap();
        assert_eq!(figure.file_name, "income_boxplot.svg");
        assert!(figure.svg.contains("<svg"));
        assert!(figure.svg.contains("before"));
        assert!(figure.svg.contains("after"));
    }

    #[test]
    fn test_render_requires_values() {
        assert!(render("x", "x", &[], &[1.0]).is_err());
    }
}
