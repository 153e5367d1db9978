//! Static chart rendering.
//!
//! Every chart function returns a [`Figure`]: an in-memory SVG document plus
//! the file name it should be saved under. Nothing is drawn to shared state;
//! the caller decides where (and whether) a figure is written.
//!
//! Charts:
//! - [`histogram`]: density histogram with a kernel density overlay
//! - [`boxplot`]: before/after boxplot pair for outlier clipping
//! - [`heatmap`]: correlation matrix heatmap
//! - [`bars`]: category frequency bar chart

pub mod bars;
pub mod boxplot;
pub mod heatmap;
pub mod histogram;

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub(crate) const FONT: &str = "sans-serif";
pub(crate) const BAR_FILL: RGBColor = RGBColor(91, 155, 213);
pub(crate) const ACCENT: RGBColor = RGBColor(237, 125, 49);
pub(crate) const BOX_FILL: RGBColor = RGBColor(189, 215, 238);
pub(crate) const GRID: RGBColor = RGBColor(200, 200, 200);

/// A rendered chart, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct Figure {
    /// File name including extension, e.g. `age_histogram.svg`.
    pub file_name: String,
    pub title: String,
    pub svg: String,
}

impl Figure {
    /// Write the figure into `dir`, returning the full path.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        fs::write(&path, self.svg.as_bytes())?;
        Ok(path)
    }
}

/// Render onto an in-memory SVG canvas of the given size.
pub(crate) fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

/// Padded axis range that never collapses to zero width.
pub(crate) fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.1 };
        return (min - pad, max + pad);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(0.0, 0.0), (-1.0, 1.0));
        assert_eq!(padded_range(10.0, 10.0), (9.0, 11.0));
        let (lo, hi) = padded_range(0.0, 100.0);
        assert_eq!((lo, hi), (-5.0, 105.0));
        assert_eq!(padded_range(f64::NAN, 1.0), (0.0, 1.0));
    }

    #[test]
    fn test_render_svg_produces_document() {
        let svg = render_svg((100, 80), |root| {
            root.draw(&Rectangle::new([(10, 10), (50, 50)], BAR_FILL.filled()))?;
            Ok(())
        })
        .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_figure_write_to() {
        let dir = std::env::temp_dir().join(format!("eda-fig-{}", rand::random::<u32>()));
        fs::create_dir_all(&dir).unwrap();
        let figure = Figure {
            file_name: "x.svg".to_string(),
            title: "x".to_string(),
            svg: "<svg></svg>".to_string(),
        };
        let path = figure.write_to(&dir).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<svg></svg>");
        fs::remove_dir_all(&dir).ok();
    }
}
