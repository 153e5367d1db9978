//! Category frequency bar chart.

use super::{BAR_FILL, FONT, Figure, render_svg};
use anyhow::Result;
use plotters::prelude::*;

/// Categories beyond this many are folded into a single "(other)" bar.
pub const MAX_BARS: usize = 30;
const LABEL_CHARS: usize = 24;
const ROW_HEIGHT: u32 = 22;

/// Keep the `MAX_BARS - 1` most frequent categories and sum the rest.
///
/// Expects `counts` in descending count order.
pub fn fold_tail(counts: &[(String, usize)]) -> Vec<(String, usize)> {
    if counts.len() <= MAX_BARS {
        return counts.to_vec();
    }
    let mut kept = counts[..MAX_BARS - 1].to_vec();
    let rest: usize = counts[MAX_BARS - 1..].iter().map(|(_, c)| c).sum();
    kept.push(("(other)".to_string(), rest));
    kept
}

fn short_label(label: &str) -> String {
    if label.chars().count() <= LABEL_CHARS {
        label.to_string()
    } else {
        let head: String = label.chars().take(LABEL_CHARS - 1).collect();
        format!("{}…", head)
    }
}

/// Render horizontal bars, most frequent category on top.
pub fn render(column: &str, stem: &str, counts: &[(String, usize)]) -> Result<Figure> {
    let bars = fold_tail(counts);
    let rows = bars.len().max(1);
    let max_count = bars.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let height = 120 + ROW_HEIGHT * rows as u32;

    let title = format!("Counts of {}", column);
    let svg = render_svg((800, height), |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&title, (FONT, 22).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(200)
            .build_cartesian_2d(0.0..max_count as f64 * 1.05, 0.0..rows as f64)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_label_formatter(&|_| String::new())
            .x_desc("Count")
            .draw()?;

        // Row 0 is drawn at the top.
        let top = rows as f64;
        chart.draw_series(bars.iter().enumerate().map(|(i, (_, count))| {
            let y_hi = top - i as f64 - 0.1;
            let y_lo = top - i as f64 - 0.9;
            Rectangle::new([(0.0, y_lo), (*count as f64, y_hi)], BAR_FILL.filled())
        }))?;

        let label_font = (FONT, 13).into_font();
        for (i, (label, count)) in bars.iter().enumerate() {
            let (_, y) = chart.backend_coord(&(0.0, top - i as f64 - 0.5));
            root.draw(&Text::new(
                format!("{} ({})", short_label(label), count),
                (20, y - 7),
                label_font.clone(),
            ))?;
        }
        Ok(())
    })?;

    Ok(Figure {
        file_name: format!("{}_countplot.svg", stem),
        title,
        svg,
    })
}
